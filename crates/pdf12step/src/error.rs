//! Error types for pdf12step.
//!
//! This module defines all error types used throughout the pdf12step crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pdf12step operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Meeting Data Errors ===
    /// The meeting data file does not exist.
    #[error("meeting data file {path} not found, download it first")]
    MeetingsNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Filtering left nothing to render.
    #[error("no meetings left after filtering: {message}")]
    EmptySelection {
        /// Which filter produced the empty result.
        message: String,
    },

    // === Configuration Errors ===
    /// A named configuration file does not exist.
    #[error("configuration file {path} not found, use `pdf12step init` to create one")]
    ConfigNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Client Errors ===
    /// The HTTP request itself failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} answered with status {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The client was misused or the site answered unexpectedly.
    #[error("client error: {0}")]
    Client(String),

    /// A download section that the TSML API does not provide.
    #[error("section {0} not known")]
    UnknownSection(String),

    // === Rendering Errors ===
    /// Template loading or rendering failed.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// A stylesheet or template directory named in the configuration is missing.
    #[error("{kind} not found: {path}")]
    AssetNotFound {
        /// What was being looked up (stylesheet, template folder).
        kind: &'static str,
        /// Resolved path.
        path: PathBuf,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV export failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A specialized Result type for pdf12step operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new client error.
    #[must_use]
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client(message.into())
    }

    /// Create an empty selection error.
    #[must_use]
    pub fn empty_selection(message: impl Into<String>) -> Self {
        Self::EmptySelection {
            message: message.into(),
        }
    }

    /// Check if this error means the meeting data has not been downloaded.
    #[must_use]
    pub fn is_missing_data(&self) -> bool {
        matches!(self, Self::MeetingsNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meetings_not_found_display() {
        let err = Error::MeetingsNotFound {
            path: PathBuf::from("data/example.com-meetings.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("data/example.com-meetings.json"));
        assert!(msg.contains("download"));
        assert!(err.is_missing_data());
    }

    #[test]
    fn test_config_not_found_display() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("missing.yaml"),
        };
        assert!(err.to_string().contains("missing.yaml"));
        assert!(!err.is_missing_data());
    }

    #[test]
    fn test_client_error() {
        let err = Error::client("site URL required");
        assert_eq!(err.to_string(), "client error: site URL required");
    }

    #[test]
    fn test_empty_selection_error() {
        let err = Error::empty_selection("attendance_options [\"online\"]");
        assert!(err.to_string().contains("no meetings left"));
        assert!(err.to_string().contains("online"));
    }

    #[test]
    fn test_http_status_display() {
        let err = Error::HttpStatus {
            url: "https://example.com/meetings/".to_string(),
            status: 500,
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/meetings/"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn test_unknown_section_display() {
        let err = Error::UnknownSection("events".to_string());
        assert_eq!(err.to_string(), "section events not known");
    }

    #[test]
    fn test_asset_not_found_display() {
        let err = Error::AssetNotFound {
            kind: "CSS file",
            path: PathBuf::from("/tmp/missing.css"),
        };
        assert_eq!(err.to_string(), "CSS file not found: /tmp/missing.css");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "site_url is not a URL".to_string(),
        };
        assert!(err.to_string().contains("site_url"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
