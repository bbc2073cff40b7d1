//! Credence storage layer: a RocksDB-backed, content-addressed packet
//! store with secondary indices by author identifier, recipient
//! identifier, and timestamp, plus the persisted path cache, stored
//! keys, and engine state.

pub mod error;
pub mod keyspace;
pub mod store;

pub use error::StoreError;
pub use store::{PacketStore, Page};
