use serde::Serialize;
use thiserror::Error;

/// Failure to coerce a single operator-entered argument into its declared type.
/// `index` is the argument's position in the operation's parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("argument {index} ({type_tag}): {reason}")]
pub struct EncodeError {
    pub index: usize,
    pub type_tag: String,
    pub reason: String,
}

/// Structured error type for the explorer. Serializes as `{code, detail}` so a
/// front end can match on the code and pick what to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "code", content = "detail")]
pub enum ExplorerError {
    #[error("Schema source not connected")]
    SchemaUnavailable,
    #[error("No group or operation selected")]
    IncompleteSelection,
    #[error("Unknown group: {group}")]
    UnknownGroup { group: String },
    #[error("Unknown operation: {group}.{operation}")]
    UnknownOperation { group: String, operation: String },
    #[error("Expected {expected} arguments, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("Coercion failed for {0}")]
    Coercion(EncodeError),
    #[error("Fee estimate failed: {message}")]
    Estimate { message: String },
    #[error("Dispatch failed: {message}")]
    Dispatch { message: String },
    #[error("A submission is already in progress")]
    SubmissionPending,
    #[error("I/O error: {message}")]
    Io { message: String },
    #[error("Invalid settings: {message}")]
    Settings { message: String },
}

impl ExplorerError {
    /// Errors raised before anything goes over the network. The session turns
    /// these into a silent decline instead of a displayed message.
    pub fn is_pre_network(&self) -> bool {
        matches!(
            self,
            ExplorerError::SchemaUnavailable
                | ExplorerError::IncompleteSelection
                | ExplorerError::UnknownGroup { .. }
                | ExplorerError::UnknownOperation { .. }
                | ExplorerError::ArityMismatch { .. }
                | ExplorerError::Coercion(_)
                | ExplorerError::SubmissionPending
        )
    }
}

impl From<EncodeError> for ExplorerError {
    fn from(e: EncodeError) -> Self {
        ExplorerError::Coercion(e)
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(e: std::io::Error) -> Self {
        ExplorerError::Io {
            message: e.to_string(),
        }
    }
}

impl From<crate::project::ProjectError> for ExplorerError {
    fn from(e: crate::project::ProjectError) -> Self {
        match e {
            crate::project::ProjectError::Io(io_err) => ExplorerError::Io {
                message: io_err.to_string(),
            },
            crate::project::ProjectError::Json(json_err) => ExplorerError::Settings {
                message: json_err.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(e: reqwest::Error) -> Self {
        ExplorerError::Estimate {
            message: e.to_string(),
        }
    }
}

/// Allow converting ExplorerError to String for display surfaces.
impl From<ExplorerError> for String {
    fn from(e: ExplorerError) -> String {
        e.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_code_and_detail() {
        let err = ExplorerError::ArityMismatch {
            expected: 2,
            actual: 1,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "ArityMismatch");
        assert_eq!(json["detail"]["expected"], 2);
    }

    #[test]
    fn pre_network_classification() {
        assert!(ExplorerError::SchemaUnavailable.is_pre_network());
        assert!(!ExplorerError::Estimate {
            message: "timeout".into()
        }
        .is_pre_network());
    }
}
