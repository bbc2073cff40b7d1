//! The engine orchestrator: a dependency-injected handle over the packet
//! store, keyring, and graph layers. A request layer calls these typed
//! operations; relaying published packets to peers is that caller's job.

use chrono::Utc;

use credence_core::{Identifier, Packet, PacketHash, PacketSignature, Side};
use credence_crypto::{sign_packet, verify_signature, KeyInfo, KeyPair, Keyring, StoredKey};
use credence_graph::{IdentifierResolver, PathSearch, SavedPaths};
use credence_store::{PacketStore, Page};

use crate::config::EngineConfig;
use crate::error::EngineError;

pub struct Engine {
    config: EngineConfig,
    store: PacketStore,
    keyring: Keyring,
}

impl Engine {
    /// Open the store, load persisted keys into the keyring, and restore
    /// the default key selection. On first open with no stored keys, a
    /// default key is generated and persisted.
    pub fn open(config: EngineConfig) -> Result<Self, EngineError> {
        let store = PacketStore::open(&config.storage.data_dir)?;
        let keyring = Keyring::new();

        for record in store.keys()? {
            let stored: StoredKey = serde_json::from_slice(&record)
                .map_err(credence_store::StoreError::Serialization)?;
            keyring.insert(stored.to_keypair()?);
        }
        if let Some(public) = store.default_key()? {
            keyring.set_default(&public)?;
        }

        let engine = Self {
            config,
            store,
            keyring,
        };

        if engine.keyring.is_empty() {
            let keypair = KeyPair::generate();
            let public = engine.keyring.insert(keypair);
            engine.persist_key(&public)?;
            engine.store.set_default_key(&public)?;
            tracing::info!(public = %public, "generated default key");
        }

        tracing::info!(
            packets = engine.store.count()?,
            keys = engine.keyring.len(),
            "engine ready"
        );
        Ok(engine)
    }

    fn persist_key(&self, public: &str) -> Result<(), EngineError> {
        let keypair = self
            .keyring
            .get(public)
            .ok_or_else(|| credence_crypto::CryptoError::UnknownKey(public.into()))?;
        let record = serde_json::to_vec(&StoredKey::from_keypair(&keypair))
            .map_err(credence_store::StoreError::Serialization)?;
        self.store.put_key(public, &record)?;
        Ok(())
    }

    fn default_keypair(&self) -> Result<KeyPair, EngineError> {
        self.keyring.default_key().ok_or(EngineError::NoDefaultKey)
    }

    // ---------------------------------------------------------------
    // Packet CRUD
    // ---------------------------------------------------------------

    /// Store a caller-built packet. When `sign` is set (or implied by
    /// `publish`), the default key signs it first; `publish` additionally
    /// requires a verifying signature and marks the packet for relay.
    pub fn save_packet(
        &self,
        mut packet: Packet,
        sign: bool,
        publish: bool,
    ) -> Result<PacketHash, EngineError> {
        if sign || publish {
            let sig = sign_packet(&packet, &self.default_keypair()?)?;
            packet.add_signature(sig);
        }
        if publish {
            self.ensure_verifying_signature(&packet)?;
            packet.set_published();
        }
        Ok(self.store.put(&packet)?)
    }

    /// Compose, sign, and store a `review` packet.
    pub fn save_review(
        &self,
        author: Identifier,
        recipient: Identifier,
        comment: Option<String>,
        rating: i32,
        publish: bool,
    ) -> Result<PacketHash, EngineError> {
        let packet = Packet::review(
            Side::single(author),
            Side::single(recipient),
            comment,
            rating,
            Utc::now().timestamp(),
        )?;
        self.save_packet(packet, true, publish)
    }

    /// Compose, sign, and store a `connection` packet joining `a` and `b`.
    pub fn save_connection(
        &self,
        author: Identifier,
        a: Identifier,
        b: Identifier,
        publish: bool,
    ) -> Result<PacketHash, EngineError> {
        let packet = Packet::connection(Side::single(author), a, b, Utc::now().timestamp())?;
        self.save_packet(packet, true, publish)
    }

    pub fn get_packet(&self, hash: &PacketHash) -> Result<Packet, EngineError> {
        Ok(self.store.get(hash)?)
    }

    /// Delete a packet from the local database. Idempotent.
    pub fn remove_packet(&self, hash: &PacketHash) -> Result<(), EngineError> {
        Ok(self.store.remove(hash)?)
    }

    pub fn packet_count(&self) -> Result<u64, EngineError> {
        Ok(self.store.count()?)
    }

    pub fn identifier_count(&self) -> Result<u64, EngineError> {
        Ok(self.store.identifier_count()?)
    }

    // ---------------------------------------------------------------
    // Signing and publication
    // ---------------------------------------------------------------

    /// Verify and append a third-party signature to a stored packet.
    pub fn add_signature(
        &self,
        hash: &PacketHash,
        signer: &str,
        signature: &str,
    ) -> Result<(), EngineError> {
        let mut packet = self.store.get(hash)?;
        let sig = PacketSignature {
            signer: signer.into(),
            signature: signature.into(),
        };
        verify_signature(&packet, &sig)?;
        if packet.add_signature(sig) {
            self.store.put(&packet)?;
        }
        Ok(())
    }

    /// Mark a stored packet as published and return it for relay. The
    /// packet must carry at least one verifying signature.
    pub fn publish(&self, hash: &PacketHash) -> Result<Packet, EngineError> {
        let mut packet = self.store.get(hash)?;
        self.ensure_verifying_signature(&packet)?;
        packet.set_published();
        self.store.put(&packet)?;
        tracing::info!(%hash, "packet published");
        Ok(packet)
    }

    fn ensure_verifying_signature(&self, packet: &Packet) -> Result<(), EngineError> {
        let verified = packet
            .signatures
            .iter()
            .any(|sig| verify_signature(packet, sig).is_ok());
        if !verified {
            return Err(EngineError::NoVerifyingSignature(
                packet.hash()?.to_hex(),
            ));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Indexed listing
    // ---------------------------------------------------------------

    pub fn packets_by_author(
        &self,
        id: &Identifier,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Packet>, EngineError> {
        Ok(self.store.by_author(id, Page::new(limit, offset)?)?)
    }

    pub fn packets_by_recipient(
        &self,
        id: &Identifier,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Packet>, EngineError> {
        Ok(self.store.by_recipient(id, Page::new(limit, offset)?)?)
    }

    /// Packets timestamped strictly after `t`, oldest-first.
    pub fn packets_after(&self, t: i64, limit: usize) -> Result<Vec<Packet>, EngineError> {
        Ok(self.store.after_timestamp(t, Page::new(limit, 0)?)?)
    }

    pub fn latest_packets(&self, limit: usize, offset: usize) -> Result<Vec<Packet>, EngineError> {
        Ok(self.store.latest(Page::new(limit, offset)?)?)
    }

    // ---------------------------------------------------------------
    // Graph queries
    // ---------------------------------------------------------------

    /// Fresh path search between two identifiers. `max_depth` defaults
    /// to the configured bound.
    pub fn find_path(
        &self,
        start: &Identifier,
        end: &Identifier,
        max_depth: Option<u32>,
    ) -> Result<Vec<Packet>, EngineError> {
        let depth = max_depth.unwrap_or(self.config.search.max_depth);
        Ok(PathSearch::new(&self.store).search(start, end, depth)?)
    }

    /// Cache-first path query.
    pub fn saved_path(
        &self,
        start: &Identifier,
        end: &Identifier,
        max_depth: Option<u32>,
    ) -> Result<Vec<Packet>, EngineError> {
        let depth = max_depth.unwrap_or(self.config.search.max_depth);
        Ok(SavedPaths::new(&self.store).get_saved(start, end, depth)?)
    }

    /// The preferred direct edge from `start` to `end`.
    pub fn trust_step(
        &self,
        start: &Identifier,
        end: &Identifier,
    ) -> Result<PacketHash, EngineError> {
        Ok(PathSearch::new(&self.store).single_step(start, end)?)
    }

    // ---------------------------------------------------------------
    // Identifier queries
    // ---------------------------------------------------------------

    /// One-hop lookup: find a directly linked identifier whose predicate
    /// matches one of the candidates, in candidate order.
    pub fn resolve_identifier<S: AsRef<str>>(
        &self,
        start: &Identifier,
        candidate_predicates: &[S],
    ) -> Result<Option<Identifier>, EngineError> {
        Ok(IdentifierResolver::new(&self.store).resolve(start, candidate_predicates)?)
    }

    /// Free-text search over stored identifier values.
    pub fn search_identifiers(
        &self,
        query: &str,
        predicate: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Identifier>, EngineError> {
        Ok(self
            .store
            .text_search(query, predicate, Page::new(limit, offset)?)?)
    }

    // ---------------------------------------------------------------
    // Key management
    // ---------------------------------------------------------------

    /// Import a private key from its 32-byte seed and persist it.
    pub fn import_key(&self, seed: &[u8]) -> Result<String, EngineError> {
        let public = self.keyring.import_seed(seed)?;
        self.persist_key(&public)?;
        if self.store.default_key()?.is_none() {
            self.store.set_default_key(&public)?;
        }
        Ok(public)
    }

    /// All local keys, flagging the default.
    pub fn list_keys(&self) -> Vec<KeyInfo> {
        self.keyring.list()
    }

    /// Select the default signing key; persists across reopen.
    pub fn set_default_key(&self, public: &str) -> Result<(), EngineError> {
        self.keyring.set_default(public)?;
        self.store.set_default_key(public)?;
        Ok(())
    }

    /// The bs58 public key of the default signing key.
    pub fn default_key(&self) -> Option<String> {
        self.keyring.default_public()
    }
}
