//! Credence Core — Fundamental types, canonical serialization, and
//! content hashing for the Credence attestation packet protocol.

pub mod canonical;
pub mod error;
pub mod types;

pub use canonical::{canonical_bytes, content_hash, validate, MAX_COMPONENT_LEN};
pub use error::CoreError;
pub use types::{
    CachedPath, Identifier, Packet, PacketHash, PacketSignature, PacketType, Side, SignedData,
};
