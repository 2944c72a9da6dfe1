use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::project::{read_json, write_json, ProjectError};

/// Which surface the form is driving. Only changes the hint shown under
/// optional parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    Rpc,
    #[default]
    Extrinsic,
}

fn default_estimate_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Explorer settings stored in the OS config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerSettings {
    pub version: u32,
    /// Base URL of the fee estimation service.
    #[serde(default = "default_estimate_base_url")]
    pub estimate_base_url: String,
    /// Schema snapshot to load. None = `metadata.json` next to the settings.
    #[serde(default)]
    pub metadata_path: Option<PathBuf>,
    #[serde(default)]
    pub interaction_mode: InteractionMode,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const SETTINGS_VERSION: u32 = 1;

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            estimate_base_url: default_estimate_base_url(),
            metadata_path: None,
            interaction_mode: InteractionMode::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ExplorerSettings {
    /// Resolve the schema snapshot path, falling back to the config dir default.
    pub fn metadata_path_or_default(&self, app_config_dir: &Path) -> PathBuf {
        self.metadata_path
            .clone()
            .unwrap_or_else(|| crate::paths::default_metadata_path(app_config_dir))
    }
}

/// Load settings from the app config directory. Returns None if no settings file exists.
pub fn load_settings(app_config_dir: &Path) -> Option<ExplorerSettings> {
    let path = crate::paths::settings_path(app_config_dir);
    if !path.exists() {
        return None;
    }
    match read_json::<ExplorerSettings>(&path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings: {e}");
            None
        }
    }
}

/// Save settings to the app config directory.
pub fn save_settings(app_config_dir: &Path, settings: &ExplorerSettings) -> Result<(), ProjectError> {
    std::fs::create_dir_all(app_config_dir)?;
    write_json(&crate::paths::settings_path(app_config_dir), settings)
}
