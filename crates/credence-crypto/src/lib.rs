//! Credence cryptographic layer: Ed25519 keypairs, packet signatures
//! over content hashes, key identifier derivation, and the local keyring.

pub mod error;
pub mod keyring;
pub mod keys;
pub mod signing;

pub use error::CryptoError;
pub use keyring::{KeyInfo, Keyring, StoredKey};
pub use keys::{key_id_of, KeyPair, PublicKey};
pub use signing::{sign_packet, verify_signature, Signature};
