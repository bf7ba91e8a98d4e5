//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration in {path}: {source}")]
    InvalidConfig {
        path: String,
        #[source]
        source: contracts::ContractError,
    },

    /// A runtime component could not be built from the configuration
    #[error("Failed to start {component}: {message}")]
    Startup { component: String, message: String },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn invalid_config(path: &Path, source: contracts::ContractError) -> Self {
        Self::InvalidConfig {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn startup(component: impl Into<String>, message: impl ToString) -> Self {
        Self::Startup {
            component: component.into(),
            message: message.to_string(),
        }
    }
}
