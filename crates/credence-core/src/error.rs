/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    #[error("invalid packet hash: {0}")]
    InvalidHash(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
