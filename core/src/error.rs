use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigIssue),
}

/// Reason a symbol set or fixed deck layout was rejected.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("symbol set is empty")]
    EmptySymbolSet,
    #[error("symbol set contains duplicates")]
    DuplicateSymbol,
    #[error("symbol label is empty")]
    EmptySymbol,
    #[error("too many symbols for a single deck")]
    TooManySymbols,
    #[error("deck layout must hold every symbol exactly twice")]
    InvalidLayout,
}

/// Failure reported by a [`ScoreStore`](crate::ScoreStore) backend.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage is unavailable")]
    Unavailable,
    #[error("Stored value is malformed")]
    Malformed,
}

pub type Result<T> = core::result::Result<T, GameError>;
