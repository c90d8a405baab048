//! Error types shared across crates.

use thiserror::Error;

/// Errors in persisted world state that are not encoding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// World metadata or player state does not describe a playable world
    #[error("Invalid world metadata: {0}")]
    InvalidMetadata(String),
}

/// Result type alias for world state checks.
pub type WorldResult<T> = Result<T, WorldError>;
