use thiserror::Error;

/// Top-level error type for Courier.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A phone number with no usable digits.
    #[error("invalid phone number: {0:?}")]
    InvalidPhone(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
