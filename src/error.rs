//! Error types for LedgerChain

use thiserror::Error;

/// Failures surfaced by the ledger.
///
/// Chain corruption is deliberately absent: a tampered or relinked chain is
/// reported by [`crate::blockchain::Blockchain::is_valid`], never raised.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Mining cancelled")]
    MiningCancelled,
    #[error("Mining gave up after {attempts} attempts")]
    MiningExhausted { attempts: u64 },
    #[error("Difficulty {0} exceeds the fingerprint length")]
    UnreachableDifficulty(u32),
    #[error("Chain is empty")]
    EmptyChain,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
