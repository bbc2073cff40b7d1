//! In-memory keyring: the set of locally held keypairs plus the default
//! signing key slot. Persistence of keys is the store's concern; the
//! keyring only deals in live key material.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use zeroize::Zeroizing;

use credence_core::Identifier;

use crate::error::CryptoError;
use crate::keys::{key_id_of, KeyPair};

/// A keypair in its storable form: bs58 public key plus hex seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredKey {
    pub public: String,
    pub seed: String,
}

impl StoredKey {
    pub fn from_keypair(keypair: &KeyPair) -> Self {
        Self {
            public: keypair.public_key().to_bs58(),
            seed: hex::encode(keypair.seed().as_slice()),
        }
    }

    pub fn to_keypair(&self) -> Result<KeyPair, CryptoError> {
        let bytes = Zeroizing::new(
            hex::decode(&self.seed).map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?,
        );
        KeyPair::from_seed_bytes(&bytes)
    }
}

/// Summary of one keyring entry.
#[derive(Debug, Clone, Serialize)]
pub struct KeyInfo {
    /// bs58-encoded public key.
    pub public: String,
    /// Derived key identifier (predicate `keyID`).
    pub key_id: Identifier,
    /// Whether this is the default signing key.
    pub default: bool,
}

/// Concurrent table of local keypairs, keyed by bs58 public key, with at
/// most one key marked default at a time. Default assignment is caller
/// state, never derived.
pub struct Keyring {
    keys: DashMap<String, KeyPair>,
    default: RwLock<Option<String>>,
}

impl Keyring {
    /// Create an empty keyring.
    pub fn new() -> Self {
        Self {
            keys: DashMap::new(),
            default: RwLock::new(None),
        }
    }

    /// Add a keypair. The first key added becomes the default.
    /// Returns the bs58 public key.
    pub fn insert(&self, keypair: KeyPair) -> String {
        let public = keypair.public_key().to_bs58();
        self.keys.insert(public.clone(), keypair);
        let mut default = self.default.write().expect("keyring lock poisoned");
        if default.is_none() {
            tracing::debug!(public = %public, "first key becomes default");
            *default = Some(public.clone());
        }
        public
    }

    /// Import a keypair from raw seed bytes (32 bytes).
    pub fn import_seed(&self, seed: &[u8]) -> Result<String, CryptoError> {
        let keypair = KeyPair::from_seed_bytes(seed)?;
        let public = self.insert(keypair);
        tracing::info!(public = %public, "imported key");
        Ok(public)
    }

    /// Look up a keypair by bs58 public key.
    pub fn get(&self, public: &str) -> Option<KeyPair> {
        self.keys.get(public).map(|k| k.clone())
    }

    /// Set the default signing key. Fails if the key is not present.
    pub fn set_default(&self, public: &str) -> Result<(), CryptoError> {
        if !self.keys.contains_key(public) {
            return Err(CryptoError::UnknownKey(public.into()));
        }
        *self.default.write().expect("keyring lock poisoned") = Some(public.into());
        tracing::debug!(public = %public, "default key set");
        Ok(())
    }

    /// The current default keypair, if any.
    pub fn default_key(&self) -> Option<KeyPair> {
        let public = self
            .default
            .read()
            .expect("keyring lock poisoned")
            .clone()?;
        self.get(&public)
    }

    /// The bs58 public key of the current default, if any.
    pub fn default_public(&self) -> Option<String> {
        self.default.read().expect("keyring lock poisoned").clone()
    }

    /// List all keys, flagging the default, sorted by public key for
    /// stable output.
    pub fn list(&self) -> Vec<KeyInfo> {
        let default = self.default_public();
        let mut infos: Vec<KeyInfo> = self
            .keys
            .iter()
            .map(|entry| KeyInfo {
                public: entry.key().clone(),
                key_id: key_id_of(&entry.value().public_key()),
                default: Some(entry.key().as_str()) == default.as_deref(),
            })
            .collect();
        infos.sort_by(|a, b| a.public.cmp(&b.public));
        infos
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for Keyring {
    fn default() -> Self {
        Self::new()
    }
}
