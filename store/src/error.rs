use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("concurrent modification: expected version {expected}, found {found}")]
    ConcurrentModification { expected: u64, found: u64 },

    #[error("store is corrupt: {0}")]
    Corrupt(String),

    #[error("invalid pagination token")]
    InvalidToken,

    #[error(transparent)]
    Sled(#[from] sled::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
