//! Directory construction errors

use thiserror::Error;

/// Errors raised while building a directory source
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Required setting absent for the selected source
    #[error("missing directory setting '{field}'")]
    MissingSetting { field: String },

    /// HTTP client could not be built
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl DirectoryError {
    pub fn missing_setting(field: impl Into<String>) -> Self {
        Self::MissingSetting {
            field: field.into(),
        }
    }
}
