//! The RocksDB-backed packet store.
//!
//! The primary table is keyed by content hash; secondary indices cover
//! author identifiers, recipient identifiers, and time. Every `put` or
//! `remove` updates the primary table, all indices, the identifier
//! refcounts, the packet counter, and conservative path-cache
//! invalidation inside a single `WriteBatch`, so no reader ever observes
//! a packet present in the primary table but missing from an index or
//! vice versa.

use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use credence_core::{CachedPath, Identifier, Packet, PacketHash};

use crate::error::StoreError;
use crate::keyspace::{
    decode_identifier, encodable, entry_hash, identifier_key, index_entry_key, path_key,
    time_entry_key, ALL_CFS, CF_AUTHOR_INDEX, CF_IDENTIFIERS, CF_KEYS, CF_PACKETS, CF_PATHS,
    CF_RECIPIENT_INDEX, CF_STATE, CF_TIME_INDEX, STATE_DEFAULT_KEY, STATE_PACKET_COUNT,
};

/// A validated pagination window. A zero limit is rejected as
/// `InvalidRange`; callers wanting everything use [`Page::all`].
#[derive(Debug, Clone, Copy)]
pub struct Page {
    limit: usize,
    offset: usize,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Result<Self, StoreError> {
        if limit == 0 {
            return Err(StoreError::InvalidRange("limit must be positive".into()));
        }
        Ok(Self { limit, offset })
    }

    /// An unbounded window.
    pub fn all() -> Self {
        Self {
            limit: usize::MAX,
            offset: 0,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Durable, indexed storage for attestation packets.
pub struct PacketStore {
    db: DB,
    // Serializes read-merge-write cycles; readers never take it.
    write_lock: Mutex<()>,
}

impl PacketStore {
    /// Open or create the database at the given path with all column
    /// families.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;
        tracing::info!(path = %path.display(), "packet store opened");

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::MissingColumnFamily(name.into()))
    }

    // ---------------------------------------------------------------
    // Packet CRUD
    // ---------------------------------------------------------------

    /// Idempotent content-addressed upsert.
    ///
    /// If a packet with the same hash exists, incoming signatures are
    /// merged (union by distinct signer/signature pair, existing order
    /// preserved) and `published` becomes the OR of both values. New
    /// packets additionally update all secondary indices, the identifier
    /// refcounts, and the packet counter. Path-cache entries touching any
    /// of the packet's identifiers are dropped in the same batch.
    pub fn put(&self, packet: &Packet) -> Result<PacketHash, StoreError> {
        let hash = packet.hash()?;
        let _guard = self.write_lock.lock().expect("store write lock poisoned");

        let existing = self.read_packet(&hash)?;
        let is_new = existing.is_none();
        let merged = match existing {
            Some(mut old) => {
                for sig in &packet.signatures {
                    old.add_signature(sig.clone());
                }
                if packet.published {
                    old.set_published();
                }
                old
            }
            None => packet.clone(),
        };

        let ids = side_identifiers(&merged);
        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_PACKETS)?,
            hash.as_bytes(),
            serde_json::to_vec(&merged)?,
        );

        if is_new {
            let ts = merged.signed.timestamp;
            for id in merged.signed.author.identifiers() {
                batch.put_cf(self.cf(CF_AUTHOR_INDEX)?, index_entry_key(id, ts, &hash), []);
            }
            for id in merged.signed.recipient.identifiers() {
                batch.put_cf(
                    self.cf(CF_RECIPIENT_INDEX)?,
                    index_entry_key(id, ts, &hash),
                    [],
                );
            }
            batch.put_cf(self.cf(CF_TIME_INDEX)?, time_entry_key(ts, &hash), []);
            for id in &ids {
                let count = self.identifier_refcount(id)?;
                batch.put_cf(
                    self.cf(CF_IDENTIFIERS)?,
                    identifier_key(id),
                    (count + 1).to_be_bytes(),
                );
            }
            batch.put_cf(
                self.cf(CF_STATE)?,
                STATE_PACKET_COUNT,
                (self.count()? + 1).to_be_bytes(),
            );
        }

        let dropped = self.invalidate_paths(&mut batch, &ids, None)?;
        self.db.write(batch)?;
        tracing::debug!(%hash, new = is_new, cache_dropped = dropped, "packet stored");
        Ok(hash)
    }

    /// Fetch a packet by content hash.
    pub fn get(&self, hash: &PacketHash) -> Result<Packet, StoreError> {
        self.read_packet(hash)?
            .ok_or_else(|| StoreError::NotFound(hash.to_hex()))
    }

    /// Delete a packet and all derived entries. Deleting an absent hash
    /// is a no-op; path-cache entries touching the packet's identifiers
    /// or containing its hash are dropped.
    pub fn remove(&self, hash: &PacketHash) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().expect("store write lock poisoned");

        let Some(packet) = self.read_packet(hash)? else {
            return Ok(());
        };

        let ids = side_identifiers(&packet);
        let ts = packet.signed.timestamp;
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_PACKETS)?, hash.as_bytes());
        for id in packet.signed.author.identifiers() {
            batch.delete_cf(self.cf(CF_AUTHOR_INDEX)?, index_entry_key(id, ts, hash));
        }
        for id in packet.signed.recipient.identifiers() {
            batch.delete_cf(self.cf(CF_RECIPIENT_INDEX)?, index_entry_key(id, ts, hash));
        }
        batch.delete_cf(self.cf(CF_TIME_INDEX)?, time_entry_key(ts, hash));
        for id in &ids {
            let count = self.identifier_refcount(id)?;
            if count <= 1 {
                batch.delete_cf(self.cf(CF_IDENTIFIERS)?, identifier_key(id));
            } else {
                batch.put_cf(
                    self.cf(CF_IDENTIFIERS)?,
                    identifier_key(id),
                    (count - 1).to_be_bytes(),
                );
            }
        }
        batch.put_cf(
            self.cf(CF_STATE)?,
            STATE_PACKET_COUNT,
            self.count()?.saturating_sub(1).to_be_bytes(),
        );

        let dropped = self.invalidate_paths(&mut batch, &ids, Some(hash))?;
        self.db.write(batch)?;
        tracing::debug!(%hash, cache_dropped = dropped, "packet removed");
        Ok(())
    }

    /// Total stored packet count.
    pub fn count(&self) -> Result<u64, StoreError> {
        let value = self.db.get_cf(self.cf(CF_STATE)?, STATE_PACKET_COUNT)?;
        Ok(value
            .and_then(|v| v.try_into().ok())
            .map(u64::from_be_bytes)
            .unwrap_or(0))
    }

    /// Count of distinct identifiers across all stored packets.
    pub fn identifier_count(&self) -> Result<u64, StoreError> {
        let mut count = 0u64;
        for item in self.db.iterator_cf(self.cf(CF_IDENTIFIERS)?, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn read_packet(&self, hash: &PacketHash) -> Result<Option<Packet>, StoreError> {
        let value = self.db.get_cf(self.cf(CF_PACKETS)?, hash.as_bytes())?;
        match value {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn identifier_refcount(&self, id: &Identifier) -> Result<u64, StoreError> {
        let value = self.db.get_cf(self.cf(CF_IDENTIFIERS)?, identifier_key(id))?;
        Ok(value
            .and_then(|v| v.try_into().ok())
            .map(u64::from_be_bytes)
            .unwrap_or(0))
    }

    // ---------------------------------------------------------------
    // Indexed listing
    // ---------------------------------------------------------------

    /// Packets where the identifier appears in an author group,
    /// newest-first.
    pub fn by_author(&self, id: &Identifier, page: Page) -> Result<Vec<Packet>, StoreError> {
        self.by_index(CF_AUTHOR_INDEX, id, page)
    }

    /// Packets where the identifier appears in a recipient group,
    /// newest-first.
    pub fn by_recipient(&self, id: &Identifier, page: Page) -> Result<Vec<Packet>, StoreError> {
        self.by_index(CF_RECIPIENT_INDEX, id, page)
    }

    fn by_index(&self, cf_name: &str, id: &Identifier, page: Page) -> Result<Vec<Packet>, StoreError> {
        if !encodable(id) {
            return Ok(Vec::new());
        }
        let prefix = identifier_key(id);
        let mut packets = Vec::new();
        let mut skipped = 0usize;
        let iter = self.db.iterator_cf(
            self.cf(cf_name)?,
            IteratorMode::From(&prefix, Direction::Forward),
        );
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            if skipped < page.offset() {
                skipped += 1;
                continue;
            }
            if packets.len() >= page.limit() {
                break;
            }
            if let Some(hash) = entry_hash(&key) {
                if let Some(packet) = self.read_packet(&hash)? {
                    packets.push(packet);
                }
            }
        }
        Ok(packets)
    }

    /// Packets with a timestamp strictly greater than `t`, oldest-first.
    pub fn after_timestamp(&self, t: i64, page: Page) -> Result<Vec<Packet>, StoreError> {
        let from = (t.saturating_add(1).max(0) as u64).to_be_bytes();
        let mut packets = Vec::new();
        let mut skipped = 0usize;
        let iter = self.db.iterator_cf(
            self.cf(CF_TIME_INDEX)?,
            IteratorMode::From(&from, Direction::Forward),
        );
        for item in iter {
            let (key, _) = item?;
            if skipped < page.offset() {
                skipped += 1;
                continue;
            }
            if packets.len() >= page.limit() {
                break;
            }
            if let Some(hash) = entry_hash(&key) {
                if let Some(packet) = self.read_packet(&hash)? {
                    packets.push(packet);
                }
            }
        }
        Ok(packets)
    }

    /// The most recently timestamped packets, newest-first.
    pub fn latest(&self, page: Page) -> Result<Vec<Packet>, StoreError> {
        let mut packets = Vec::new();
        let mut skipped = 0usize;
        for item in self.db.iterator_cf(self.cf(CF_TIME_INDEX)?, IteratorMode::End) {
            let (key, _) = item?;
            if skipped < page.offset() {
                skipped += 1;
                continue;
            }
            if packets.len() >= page.limit() {
                break;
            }
            if let Some(hash) = entry_hash(&key) {
                if let Some(packet) = self.read_packet(&hash)? {
                    packets.push(packet);
                }
            }
        }
        Ok(packets)
    }

    // ---------------------------------------------------------------
    // Text search over the identifier index
    // ---------------------------------------------------------------

    /// Substring search over stored identifier values, optionally
    /// restricted to one predicate. Prefix matches rank before interior
    /// matches; each bucket keeps identifier-index key order, so results
    /// are stable and deterministic for identical inputs.
    pub fn text_search(
        &self,
        query: &str,
        predicate: Option<&str>,
        page: Page,
    ) -> Result<Vec<Identifier>, StoreError> {
        let mut prefix_matches = Vec::new();
        let mut interior_matches = Vec::new();
        for item in self.db.iterator_cf(self.cf(CF_IDENTIFIERS)?, IteratorMode::Start) {
            let (key, _) = item?;
            let Some((id, _)) = decode_identifier(&key) else {
                continue;
            };
            if let Some(p) = predicate {
                if id.predicate != p {
                    continue;
                }
            }
            if id.value.starts_with(query) {
                prefix_matches.push(id);
            } else if id.value.contains(query) {
                interior_matches.push(id);
            }
        }
        Ok(prefix_matches
            .into_iter()
            .chain(interior_matches)
            .skip(page.offset())
            .take(page.limit())
            .collect())
    }

    // ---------------------------------------------------------------
    // Path cache persistence
    // ---------------------------------------------------------------

    /// Look up the cached path between two identifiers, if any.
    pub fn saved_path(
        &self,
        start: &Identifier,
        end: &Identifier,
    ) -> Result<Option<CachedPath>, StoreError> {
        let value = self.db.get_cf(self.cf(CF_PATHS)?, path_key(start, end))?;
        match value {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist a resolved path.
    pub fn save_path(&self, path: &CachedPath) -> Result<(), StoreError> {
        self.db.put_cf(
            self.cf(CF_PATHS)?,
            path_key(&path.start, &path.end),
            serde_json::to_vec(path)?,
        )?;
        tracing::debug!(start = %path.start, end = %path.end, len = path.hashes.len(), "path cached");
        Ok(())
    }

    /// Drop a cached path.
    pub fn forget_path(&self, start: &Identifier, end: &Identifier) -> Result<(), StoreError> {
        self.db.delete_cf(self.cf(CF_PATHS)?, path_key(start, end))?;
        Ok(())
    }

    /// Conservative invalidation: queue deletion of every cached path
    /// whose start or end identifier is incident to the mutated packet,
    /// or whose chain contains a removed hash. Returns the number of
    /// entries dropped.
    fn invalidate_paths(
        &self,
        batch: &mut WriteBatch,
        ids: &BTreeSet<Identifier>,
        removed: Option<&PacketHash>,
    ) -> Result<usize, StoreError> {
        let mut dropped = 0usize;
        for item in self.db.iterator_cf(self.cf(CF_PATHS)?, IteratorMode::Start) {
            let (key, value) = item?;
            let stale = match serde_json::from_slice::<CachedPath>(&value) {
                Ok(entry) => {
                    ids.contains(&entry.start)
                        || ids.contains(&entry.end)
                        || removed.map(|h| entry.hashes.contains(h)).unwrap_or(false)
                }
                // Undecodable entries are dropped rather than served.
                Err(_) => true,
            };
            if stale {
                batch.delete_cf(self.cf(CF_PATHS)?, key);
                dropped += 1;
            }
        }
        Ok(dropped)
    }

    // ---------------------------------------------------------------
    // Stored keys and default key state
    // ---------------------------------------------------------------

    /// Persist a key record under its bs58 public key.
    pub fn put_key(&self, public: &str, record: &[u8]) -> Result<(), StoreError> {
        self.db.put_cf(self.cf(CF_KEYS)?, public.as_bytes(), record)?;
        Ok(())
    }

    /// All stored key records.
    pub fn keys(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        let mut records = Vec::new();
        for item in self.db.iterator_cf(self.cf(CF_KEYS)?, IteratorMode::Start) {
            let (_, value) = item?;
            records.push(value.to_vec());
        }
        Ok(records)
    }

    /// Persist the default key selection.
    pub fn set_default_key(&self, public: &str) -> Result<(), StoreError> {
        self.db
            .put_cf(self.cf(CF_STATE)?, STATE_DEFAULT_KEY, public.as_bytes())?;
        Ok(())
    }

    /// The persisted default key selection, if any.
    pub fn default_key(&self) -> Result<Option<String>, StoreError> {
        let value = self.db.get_cf(self.cf(CF_STATE)?, STATE_DEFAULT_KEY)?;
        Ok(value.and_then(|v| String::from_utf8(v).ok()))
    }
}

/// Every distinct identifier on either side of the packet.
fn side_identifiers(packet: &Packet) -> BTreeSet<Identifier> {
    packet
        .signed
        .author
        .identifiers()
        .chain(packet.signed.recipient.identifiers())
        .cloned()
        .collect()
}
