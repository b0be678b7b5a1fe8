//! Error types for mdlift-core

use thiserror::Error;

/// Result type alias using mdlift-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mdlift-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Document or asset not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Required backend settings are missing; aborts the whole operation.
    #[error("{backend} configuration is incomplete. Missing: {}", missing.join(", "))]
    ConfigIncomplete {
        backend: &'static str,
        missing: Vec<&'static str>,
    },

    /// S3-compatible object storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// PicList upload error
    #[error("Upload error: {0}")]
    Upload(String),

    /// Note application kernel API error
    #[error("Host API error: {0}")]
    Host(String),

    /// Transport-level HTTP error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote Markdown rendering error
    #[error("Render error: {0}")]
    Render(String),

    /// ZIP packaging error
    #[error("Packaging error: {0}")]
    Packaging(String),

    /// Clipboard error
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Packaging(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_incomplete_lists_missing_fields() {
        let error = Error::ConfigIncomplete {
            backend: "S3",
            missing: vec!["bucket", "secretKey"],
        };
        assert_eq!(
            error.to_string(),
            "S3 configuration is incomplete. Missing: bucket, secretKey"
        );
    }
}
