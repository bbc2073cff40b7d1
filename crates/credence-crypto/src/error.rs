/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error(transparent)]
    Core(#[from] credence_core::CoreError),
}
