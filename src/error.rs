//! Error types for Proofchain

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// The operating system could not supply 16 random bytes for an identifier.
    #[error("Randomness exhausted: {0}")]
    RandomnessExhausted(String),

    #[error("Invalid node identifier: {0}")]
    InvalidNodeId(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    /// The chain tip moved while a proof was being searched for.
    #[error("Stale chain tip: proof was solved against block {expected}, but the tip is now block {actual}")]
    StaleTip { expected: u64, actual: u64 },

    #[error("Mining did not finish within {0:?}")]
    MiningTimeout(Duration),

    /// A previous proof search, possibly one whose caller gave up, is still
    /// running.
    #[error("A proof search is already running")]
    MiningInProgress,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
