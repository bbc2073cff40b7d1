use ed25519_dalek::{Signer, Verifier};

use credence_core::{Packet, PacketSignature};

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

/// Ed25519 signature (64 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

impl Signature {
    /// Get the raw bytes (64 bytes).
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }

    /// Create from raw bytes (64 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidInput(format!("signature must be 64 bytes, got {}", bytes.len()))
        })?;
        Ok(Self {
            inner: ed25519_dalek::Signature::from_bytes(&arr),
        })
    }

    /// Encode as hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Decode from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// Sign a packet's content hash with the given keypair.
///
/// Does not mutate the packet; the caller appends the returned signature.
pub fn sign_packet(packet: &Packet, keypair: &KeyPair) -> Result<PacketSignature, CryptoError> {
    let hash = packet.hash()?;
    let sig = keypair.signing_key().sign(hash.as_bytes());
    Ok(PacketSignature {
        signer: keypair.public_key().to_bs58(),
        signature: Signature { inner: sig }.to_hex(),
    })
}

/// Verify a detached packet signature against the packet's recomputed
/// content hash. Never mutates.
pub fn verify_signature(packet: &Packet, sig: &PacketSignature) -> Result<(), CryptoError> {
    let hash = packet.hash()?;
    let public = PublicKey::from_bs58(&sig.signer)?;
    let signature = Signature::from_hex(&sig.signature)?;
    public
        .verifying_key()
        .verify(hash.as_bytes(), &signature.inner)
        .map_err(|_| CryptoError::InvalidSignature)
}
