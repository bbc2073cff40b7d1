//! Canonical packet serialization and content hashing.
//!
//! The canonical form of a packet is the JSON serialization of its
//! signed fields in declared order (`timestamp`, `author`, `recipient`,
//! `type`, `comment`, `rating`, `minRating`, `maxRating`), excluding
//! `signatures` and `published`. The content hash is the BLAKE3 digest
//! of those bytes. This form is fixed: interoperating implementations
//! must produce byte-identical output for identical signed fields.

use crate::error::CoreError;
use crate::types::{PacketHash, Side, SignedData};

/// Longest identifier predicate or value, in bytes. A protocol bound:
/// storage index keys encode component lengths as u16 prefixes, so
/// anything longer cannot be indexed and is rejected at validation.
pub const MAX_COMPONENT_LEN: usize = u16::MAX as usize;

/// Check the structural invariants of a packet's signed fields.
///
/// Fails with `MalformedPacket` on: empty author/recipient side, an
/// empty identifier group, an identifier with an empty or over-long
/// predicate or value, a negative timestamp, inverted rating bounds,
/// or a rating outside its declared bounds.
pub fn validate(signed: &SignedData) -> Result<(), CoreError> {
    if signed.timestamp < 0 {
        return Err(CoreError::MalformedPacket(format!(
            "negative timestamp: {}",
            signed.timestamp
        )));
    }
    validate_side(&signed.author, "author")?;
    validate_side(&signed.recipient, "recipient")?;
    if signed.min_rating > signed.max_rating {
        return Err(CoreError::MalformedPacket(format!(
            "minRating {} exceeds maxRating {}",
            signed.min_rating, signed.max_rating
        )));
    }
    if signed.rating < signed.min_rating || signed.rating > signed.max_rating {
        return Err(CoreError::MalformedPacket(format!(
            "rating {} outside [{}, {}]",
            signed.rating, signed.min_rating, signed.max_rating
        )));
    }
    Ok(())
}

fn validate_side(side: &Side, name: &str) -> Result<(), CoreError> {
    if side.groups.is_empty() {
        return Err(CoreError::MalformedPacket(format!("empty {} side", name)));
    }
    for group in &side.groups {
        if group.is_empty() {
            return Err(CoreError::MalformedPacket(format!(
                "empty identifier group on {} side",
                name
            )));
        }
        for id in group {
            if id.predicate.is_empty() || id.value.is_empty() {
                return Err(CoreError::MalformedPacket(format!(
                    "empty identifier component on {} side",
                    name
                )));
            }
            if id.predicate.len() > MAX_COMPONENT_LEN || id.value.len() > MAX_COMPONENT_LEN {
                return Err(CoreError::MalformedPacket(format!(
                    "identifier component on {} side exceeds {} bytes",
                    name, MAX_COMPONENT_LEN
                )));
            }
        }
    }
    Ok(())
}

/// Serialize the signed fields to their canonical byte form.
pub fn canonical_bytes(signed: &SignedData) -> Result<Vec<u8>, CoreError> {
    validate(signed)?;
    Ok(serde_json::to_vec(signed)?)
}

/// BLAKE3 digest of the canonical byte form.
pub fn content_hash(signed: &SignedData) -> Result<PacketHash, CoreError> {
    let bytes = canonical_bytes(signed)?;
    Ok(PacketHash::from_bytes(*blake3::hash(&bytes).as_bytes()))
}
