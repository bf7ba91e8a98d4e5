//! Layered error definitions
//!
//! Categorized by source: config / directory / ingestion

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Directory Errors =====
    /// Branch directory could not be enumerated
    #[error("branch directory '{source_name}' error: {message}")]
    Directory {
        source_name: String,
        message: String,
    },

    // ===== Ingestion Errors =====
    /// Downstream send failed (transport error or non-success status)
    #[error("sender '{sender}' failed for tenant '{tenant_id}': {message}")]
    SendFailed {
        sender: String,
        tenant_id: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create directory error
    pub fn directory(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Directory {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create send failure error
    pub fn send_failed(
        sender: impl Into<String>,
        tenant_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SendFailed {
            sender: sender.into(),
            tenant_id: tenant_id.into(),
            message: message.into(),
        }
    }
}
