//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for DeskPulse
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DeskPulseError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeskPulseError {
    /// Stable label suitable for metrics and structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Platform(_) => "platform",
            Self::Network(_) => "network",
            Self::Protocol(_) => "protocol",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for DeskPulse operations
pub type Result<T> = std::result::Result<T, DeskPulseError>;
