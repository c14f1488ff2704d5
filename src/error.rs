//! Error types shared across the crate
//!
//! Loading settings or architectures and constructing layers return [`Error`].
//! The tuning integration has its own [`crate::callbacks::raytune::TuneError`]
//! because its failures never reach a caller.

/// Common error type for `kan_tune`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("invalid layer: {0}")]
    InvalidLayer(String),

    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    #[error("unknown callback event: {0}")]
    UnknownEvent(String),
}

impl Error {
    pub fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
