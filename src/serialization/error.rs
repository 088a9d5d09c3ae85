use thiserror::Error;

/// Failures while encoding or decoding an error chain
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed error payload: {0}")]
    Malformed(String),

    #[error("no decoder for error code discriminator '{0}'")]
    UnknownDiscriminator(String),

    #[error("error code has no serializer: {0}")]
    Unsupported(String),
}

impl SerializationError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
