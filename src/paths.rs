//! Centralized path definitions for configuration files.
//!
//! Functions accept `&Path` so they work for both the CLI and embedding hosts.

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_ID: &str = "io.extrinsic.explorer";

// ── Leaf filenames ───────────────────────────────────────────────

pub const SETTINGS_FILE: &str = "settings.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Fixed path of the fee estimation service, relative to its base URL.
pub const FEE_ESTIMATE_PATH: &str = "/transaction/fee-estimate";

// ── Config-dir functions (take app_config_dir) ───────────────────

pub fn settings_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(SETTINGS_FILE)
}

/// Default location of the schema snapshot when settings don't name one.
pub fn default_metadata_path(app_config_dir: &Path) -> PathBuf {
    app_config_dir.join(METADATA_FILE)
}

/// Platform config directory for the explorer: `<config_dir>/io.extrinsic.explorer`.
pub fn default_config_dir() -> PathBuf {
    let base = if cfg!(target_os = "windows") {
        std::env::var("APPDATA")
            .map_or_else(|_| PathBuf::from("C:\\Users\\Default\\AppData\\Roaming"), PathBuf::from)
    } else if cfg!(target_os = "macos") {
        home_dir().join("Library/Application Support")
    } else {
        std::env::var("XDG_CONFIG_HOME").map_or_else(|_| home_dir().join(".config"), PathBuf::from)
    };
    base.join(APP_ID)
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
}

/// Join a base URL and the fee estimate path without doubling slashes.
pub fn fee_estimate_url(base_url: &str) -> String {
    format!("{}{FEE_ESTIMATE_PATH}", base_url.trim_end_matches('/'))
}
