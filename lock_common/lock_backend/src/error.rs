use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Redis connect error: {0}")]
    ConnectionError(#[from] redis::RedisError),

    #[error("Backend operation error: {0}")]
    OperationError(String),

    #[error("Backend is disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, BackendError>;
