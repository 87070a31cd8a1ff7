//! Error types for eventual
//!
//! These cover everything that can go wrong *before* a wait starts:
//! building a [`WaitConfiguration`](crate::WaitConfiguration) and loading
//! named wait profiles. Failures of a running wait are reported through
//! [`RetryOutcome`](crate::RetryOutcome) and [`WaitError`](crate::WaitError).

use thiserror::Error;

/// Result type alias using eventual's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and profile errors
#[derive(Error, Debug)]
pub enum Error {
    /// A wait configuration violates its bounds
    #[error("Invalid wait configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Profile file not found
    #[error("Wait profile file not found: {path}")]
    ConfigNotFound { path: String },

    /// Requested profile does not exist
    #[error("Unknown wait profile: {profile}")]
    UnknownProfile { profile: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an unknown profile error
    pub fn unknown_profile(profile: impl Into<String>) -> Self {
        Self::UnknownProfile {
            profile: profile.into(),
        }
    }

    /// Check if this error came from configuration validation
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Error::InvalidConfiguration { .. })
    }
}
