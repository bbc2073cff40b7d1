use credence_core::CoreError;
use credence_crypto::CryptoError;
use credence_graph::GraphError;
use credence_store::StoreError;

/// Engine-level errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no default key configured")]
    NoDefaultKey,

    #[error("packet {0} carries no verifying signature")]
    NoVerifyingSignature(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
