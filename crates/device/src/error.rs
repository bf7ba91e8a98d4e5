//! Device error types

use thiserror::Error;

/// Device specific error
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Session could not be opened
    #[error("failed to connect to terminal {address}: {message}")]
    Connection { address: String, message: String },

    /// Records could not be read back
    #[error("failed to retrieve records from terminal {address}: {message}")]
    Retrieval { address: String, message: String },

    /// Session could not be closed cleanly
    #[error("failed to disconnect from terminal {address}: {message}")]
    Disconnection { address: String, message: String },

    /// Unexpected or malformed protocol frame
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// A device operation exceeded its deadline
    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: &'static str, after_ms: u64 },

    /// Socket error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    /// Create connection error
    pub fn connection(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create retrieval error
    pub fn retrieval(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Retrieval {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create disconnection error
    pub fn disconnection(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Disconnection {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DeviceError>;
