//! Error types for ezballot-rs.

use thiserror::Error;

/// Errors raised while building an election from configuration.
///
/// Ballot and registration failures are not errors in this sense; see
/// `CastError` and `ElectionSession::register_voter`.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration parsed but is not usable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result alias for fallible crate operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig(message.into())
    }
}
