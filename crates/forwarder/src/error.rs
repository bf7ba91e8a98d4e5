//! Forwarder error types

use thiserror::Error;

/// Forwarder-specific errors
#[derive(Debug, Error)]
pub enum ForwarderError {
    /// Sender creation error
    #[error("failed to create sender '{name}': {message}")]
    SenderCreation { name: String, message: String },

    /// HTTP client construction error
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ForwarderError {
    /// Create a sender creation error
    pub fn sender_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SenderCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
