use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("Remote service error: {0}")]
    RemoteService(String),
    #[error("Response shape error: {0}")]
    ResponseShape(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Multipart error: {0}")]
    Multipart(String),
}

impl RelayError {
    /// The bare message carried by the variant, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            RelayError::Validation(msg)
            | RelayError::Config(msg)
            | RelayError::Request(msg)
            | RelayError::RemoteService(msg)
            | RelayError::ResponseShape(msg)
            | RelayError::Serialization(msg)
            | RelayError::Multipart(msg) => msg,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RelayError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
