use thiserror::Error;

/// Failure raised by a key-value store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not valid JSON: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("failed to persist storage file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to the user by engine operations
#[derive(Debug, Error)]
pub enum StartpageError {
    /// A required field was empty or an argument was out of range
    #[error("{0}")]
    Validation(String),

    /// An import snapshot lacked `version` or `data`
    #[error("invalid backup format: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl StartpageError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, StartpageError>;
