//! Path cache orchestration: consult the persisted cache before running
//! a fresh search, and write successful results back.
//!
//! Write-time invalidation in the store is conservative; this layer adds
//! a read-time backstop so a served chain never contains a deleted or
//! unpublished packet.

use chrono::Utc;

use credence_core::{CachedPath, Identifier, Packet};
use credence_store::{PacketStore, StoreError};

use crate::error::GraphError;
use crate::search::PathSearch;

pub struct SavedPaths<'a> {
    store: &'a PacketStore,
}

impl<'a> SavedPaths<'a> {
    pub fn new(store: &'a PacketStore) -> Self {
        Self { store }
    }

    /// Return the cached chain between `start` and `end` if it is still
    /// valid and fits within `max_depth`; otherwise drop it, run a fresh
    /// search, and cache a successful result. `NotFound` outcomes are
    /// never cached.
    pub fn get_saved(
        &self,
        start: &Identifier,
        end: &Identifier,
        max_depth: u32,
    ) -> Result<Vec<Packet>, GraphError> {
        if let Some(entry) = self.store.saved_path(start, end)? {
            if entry.hashes.len() as u32 <= max_depth {
                if let Some(packets) = self.revalidate(&entry)? {
                    tracing::debug!(start = %start, end = %end, "path cache hit");
                    return Ok(packets);
                }
            }
            self.store.forget_path(start, end)?;
            tracing::debug!(start = %start, end = %end, "stale path entry dropped");
        }

        let packets = PathSearch::new(self.store).search(start, end, max_depth)?;
        let hashes = packets
            .iter()
            .map(|p| p.hash())
            .collect::<Result<Vec<_>, _>>()?;
        self.store.save_path(&CachedPath {
            start: start.clone(),
            end: end.clone(),
            max_depth,
            hashes,
            created_at: Utc::now(),
        })?;
        Ok(packets)
    }

    /// Resolve every hash in the chain; `None` if any packet is missing
    /// or no longer published.
    fn revalidate(&self, entry: &CachedPath) -> Result<Option<Vec<Packet>>, GraphError> {
        let mut packets = Vec::with_capacity(entry.hashes.len());
        for hash in &entry.hashes {
            match self.store.get(hash) {
                Ok(p) if p.published => packets.push(p),
                Ok(_) => return Ok(None),
                Err(StoreError::NotFound(_)) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Some(packets))
    }
}
