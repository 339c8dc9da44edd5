//! Error handling module
//!
//! Defines all error types and result types used in the batlog library.

use std::io;
use thiserror::Error;

/// Error types for the batlog library
#[derive(Error, Debug)]
pub enum BatlogError {
    /// I/O error, typically occurs when reading or appending the sample log
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Unsupported platform error
    #[error(
        "Unsupported platform: {platform}. Battery sampling only supports Linux and macOS for now."
    )]
    UnsupportedPlatform { platform: String },

    /// Output of a system command could not be understood
    #[error("Failed to parse system data: {detail}")]
    ParseError { detail: String },

    /// System resource access error
    #[error("Failed to access system resource: {resource}")]
    ResourceAccessError { resource: String },

    /// One persisted record could not be turned into a sample
    #[error("Malformed sample at record {line}: {detail}")]
    MalformedSample { line: usize, detail: String },

    /// Caller supplied bounds or settings that cannot be honored
    #[error("Invalid configuration: {detail}")]
    InvalidConfiguration { detail: String },

    /// Report could not be encoded in the requested output format
    #[error("Failed to serialize output: {detail}")]
    SerializationError { detail: String },
}

impl BatlogError {
    /// Create unsupported platform error
    pub(crate) fn unsupported_platform(platform: &str) -> Self {
        BatlogError::UnsupportedPlatform {
            platform: platform.to_string(),
        }
    }

    /// Create parsing error
    pub(crate) fn parse_error(detail: &str) -> Self {
        BatlogError::ParseError {
            detail: detail.to_string(),
        }
    }

    /// Create resource access error
    pub(crate) fn resource_access_error(resource: &str) -> Self {
        BatlogError::ResourceAccessError {
            resource: resource.to_string(),
        }
    }

    /// Create malformed sample error; `line` is 1-based
    pub(crate) fn malformed_sample(line: usize, detail: &str) -> Self {
        BatlogError::MalformedSample {
            line,
            detail: detail.to_string(),
        }
    }

    /// Create invalid configuration error
    pub(crate) fn invalid_configuration(detail: &str) -> Self {
        BatlogError::InvalidConfiguration {
            detail: detail.to_string(),
        }
    }
}

impl From<serde_json::Error> for BatlogError {
    fn from(e: serde_json::Error) -> Self {
        BatlogError::SerializationError {
            detail: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for BatlogError {
    fn from(e: serde_yaml::Error) -> Self {
        BatlogError::SerializationError {
            detail: e.to_string(),
        }
    }
}

/// Result type for the batlog library
pub type BatlogResult<T> = Result<T, BatlogError>;
