use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use credence_core::Identifier;

use crate::error::CryptoError;

/// The identifier predicate for derived key identifiers.
pub const KEY_ID_PREDICATE: &str = "keyID";

/// An Ed25519 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: VerifyingKey,
}

impl PublicKey {
    /// Raw key bytes (32 bytes).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Create from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        let inner = VerifyingKey::from_bytes(&arr)
            .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Encode as a bs58 string.
    pub fn to_bs58(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }

    /// Decode from a bs58 string.
    pub fn from_bs58(s: &str) -> Result<Self, CryptoError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.inner
    }
}

/// A local Ed25519 keypair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    signing: SigningKey,
}

impl KeyPair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(seed),
        }
    }

    /// Keypair from a variable-length seed slice (must be 32 bytes).
    pub fn from_seed_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let seed: Zeroizing<[u8; 32]> = Zeroizing::new(bytes.try_into().map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            }
        })?);
        Ok(Self::from_seed(&seed))
    }

    /// The secret seed bytes (32 bytes).
    pub fn seed(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing.to_bytes())
    }

    /// The public half.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.signing.verifying_key(),
        }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing
    }
}

/// Derive the key identifier for a public key: the bs58-encoded BLAKE3
/// digest of the key bytes, under the `keyID` predicate. Deterministic
/// and one-way.
pub fn key_id_of(public: &PublicKey) -> Identifier {
    let digest = blake3::hash(&public.to_bytes());
    Identifier::new(KEY_ID_PREDICATE, bs58::encode(digest.as_bytes()).into_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_distinct_keys() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public_key().to_bytes(), b.public_key().to_bytes());
    }

    #[test]
    fn test_from_seed_deterministic() {
        let a = KeyPair::from_seed(&[7u8; 32]);
        let b = KeyPair::from_seed(&[7u8; 32]);
        assert_eq!(a.public_key().to_bytes(), b.public_key().to_bytes());
    }

    #[test]
    fn test_seed_roundtrip() {
        let kp = KeyPair::generate();
        let seed = kp.seed();
        let restored = KeyPair::from_seed(&seed);
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn test_from_seed_bytes_wrong_length() {
        let result = KeyPair::from_seed_bytes(&[0u8; 16]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_public_key_bs58_roundtrip() {
        let kp = KeyPair::from_seed(&[1u8; 32]);
        let encoded = kp.public_key().to_bs58();
        let decoded = PublicKey::from_bs58(&encoded).unwrap();
        assert_eq!(decoded, kp.public_key());
    }

    #[test]
    fn test_public_key_from_invalid_bs58() {
        assert!(PublicKey::from_bs58("0OIl").is_err());
        assert!(PublicKey::from_bs58("abc").is_err());
    }

    #[test]
    fn test_key_id_deterministic() {
        let kp = KeyPair::from_seed(&[3u8; 32]);
        let id1 = key_id_of(&kp.public_key());
        let id2 = key_id_of(&kp.public_key());
        assert_eq!(id1, id2);
        assert_eq!(id1.predicate, "keyID");
        assert!(!id1.value.is_empty());
    }

    #[test]
    fn test_key_id_differs_per_key() {
        let a = key_id_of(&KeyPair::from_seed(&[1u8; 32]).public_key());
        let b = key_id_of(&KeyPair::from_seed(&[2u8; 32]).public_key());
        assert_ne!(a, b);
    }
}
