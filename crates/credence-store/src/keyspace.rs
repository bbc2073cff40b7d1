//! Column family names and key encodings.
//!
//! Identifier-derived keys use u16 big-endian length prefixes instead of
//! separator bytes, so predicates and values may contain any byte while
//! keeping the encoding injective and prefix-scannable.

use credence_core::{Identifier, PacketHash, MAX_COMPONENT_LEN};

/// Primary table: content hash (32 bytes) -> packet JSON.
pub const CF_PACKETS: &str = "packets";
/// Author index: identifier key + inverted timestamp + hash -> ().
pub const CF_AUTHOR_INDEX: &str = "author_index";
/// Recipient index: identifier key + inverted timestamp + hash -> ().
pub const CF_RECIPIENT_INDEX: &str = "recipient_index";
/// Time index: timestamp (big-endian) + hash -> ().
pub const CF_TIME_INDEX: &str = "time_index";
/// Distinct identifier index: identifier key -> refcount (u64 big-endian).
pub const CF_IDENTIFIERS: &str = "identifiers";
/// Path cache: start identifier key + end identifier key -> CachedPath JSON.
pub const CF_PATHS: &str = "paths";
/// Stored keys: bs58 public key -> stored key record.
pub const CF_KEYS: &str = "keys";
/// Engine state: packet counter, default key.
pub const CF_STATE: &str = "state";

pub const ALL_CFS: [&str; 8] = [
    CF_PACKETS,
    CF_AUTHOR_INDEX,
    CF_RECIPIENT_INDEX,
    CF_TIME_INDEX,
    CF_IDENTIFIERS,
    CF_PATHS,
    CF_KEYS,
    CF_STATE,
];

pub const STATE_PACKET_COUNT: &[u8] = b"packet_count";
pub const STATE_DEFAULT_KEY: &[u8] = b"default_key";

/// Whether both identifier components fit the length-prefixed encoding.
/// Validation rejects over-long components before they reach a write, so
/// this only guards lookups with arbitrary caller-supplied identifiers.
pub fn encodable(id: &Identifier) -> bool {
    id.predicate.len() <= MAX_COMPONENT_LEN && id.value.len() <= MAX_COMPONENT_LEN
}

/// Length-prefixed identifier key: len(predicate) + predicate +
/// len(value) + value.
pub fn identifier_key(id: &Identifier) -> Vec<u8> {
    let mut key = Vec::with_capacity(4 + id.predicate.len() + id.value.len());
    key.extend_from_slice(&(id.predicate.len() as u16).to_be_bytes());
    key.extend_from_slice(id.predicate.as_bytes());
    key.extend_from_slice(&(id.value.len() as u16).to_be_bytes());
    key.extend_from_slice(id.value.as_bytes());
    key
}

/// Decode an identifier from the front of `key`; returns the identifier
/// and the number of bytes consumed.
pub fn decode_identifier(key: &[u8]) -> Option<(Identifier, usize)> {
    let plen = u16::from_be_bytes(key.get(..2)?.try_into().ok()?) as usize;
    let predicate = std::str::from_utf8(key.get(2..2 + plen)?).ok()?;
    let voff = 2 + plen;
    let vlen = u16::from_be_bytes(key.get(voff..voff + 2)?.try_into().ok()?) as usize;
    let value = std::str::from_utf8(key.get(voff + 2..voff + 2 + vlen)?).ok()?;
    Some((Identifier::new(predicate, value), voff + 2 + vlen))
}

/// Author/recipient index entry: identifier key + inverted big-endian
/// timestamp + hash. Ascending prefix scans yield newest-first order.
pub fn index_entry_key(id: &Identifier, timestamp: i64, hash: &PacketHash) -> Vec<u8> {
    let mut key = identifier_key(id);
    key.extend_from_slice(&(u64::MAX - timestamp.max(0) as u64).to_be_bytes());
    key.extend_from_slice(hash.as_bytes());
    key
}

/// Time index entry: big-endian timestamp + hash. Ascending scans yield
/// oldest-first order.
pub fn time_entry_key(timestamp: i64, hash: &PacketHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(&(timestamp.max(0) as u64).to_be_bytes());
    key.extend_from_slice(hash.as_bytes());
    key
}

/// The trailing 32 bytes of an index entry key.
pub fn entry_hash(key: &[u8]) -> Option<PacketHash> {
    if key.len() < 32 {
        return None;
    }
    let bytes: [u8; 32] = key[key.len() - 32..].try_into().ok()?;
    Some(PacketHash::from_bytes(bytes))
}

/// Path cache entry key: start identifier key + end identifier key.
pub fn path_key(start: &Identifier, end: &Identifier) -> Vec<u8> {
    let mut key = identifier_key(start);
    key.extend_from_slice(&identifier_key(end));
    key
}
