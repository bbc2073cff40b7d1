use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::canonical;
use crate::error::CoreError;

/// Rating bounds for a `review` packet.
pub const REVIEW_MIN_RATING: i32 = -10;
pub const REVIEW_MAX_RATING: i32 = 10;

/// Rating bounds for a `connection` packet.
pub const CONNECTION_MIN_RATING: i32 = -1;
pub const CONNECTION_MAX_RATING: i32 = 1;

/// An identifier: a (predicate, value) pair naming a real-world or
/// cryptographic entity, e.g. `("email", "alice@example.com")` or
/// `("keyID", "5dkq...")`.
///
/// Identifiers are never stored as free objects; they exist only as
/// endpoints referenced by packets. The canonical JSON form is a
/// two-element array `["predicate", "value"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    /// Open-ended tag: "email", "keyID", "nickname", "name", "url", ...
    pub predicate: String,
    /// The literal identifier value.
    pub value: String,
}

impl Identifier {
    /// Create a new identifier.
    pub fn new(predicate: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.predicate, self.value)
    }
}

// Canonical form is ["predicate", "value"], matching the packet wire shape.
impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.predicate, &self.value).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (predicate, value) = <(String, String)>::deserialize(deserializer)?;
        Ok(Self { predicate, value })
    }
}

/// One side of a packet: an ordered sequence of identifier groups.
///
/// Each group lists identifiers considered equivalent aliases of a single
/// party. The author side of a packet has one group; a `connection`
/// packet's recipient side has two (the identifiers being joined).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Side {
    pub groups: Vec<Vec<Identifier>>,
}

impl Side {
    /// A side with a single one-identifier group.
    pub fn single(id: Identifier) -> Self {
        Self {
            groups: vec![vec![id]],
        }
    }

    /// A side with one group of equivalent aliases.
    pub fn group(ids: Vec<Identifier>) -> Self {
        Self { groups: vec![ids] }
    }

    /// A side with two single-identifier groups (connection recipients).
    pub fn pair(a: Identifier, b: Identifier) -> Self {
        Self {
            groups: vec![vec![a], vec![b]],
        }
    }

    /// Iterate over every identifier on this side, in declared order.
    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.groups.iter().flatten()
    }

    /// Whether the given identifier appears in any group.
    pub fn contains(&self, id: &Identifier) -> bool {
        self.identifiers().any(|i| i == id)
    }
}

/// The kind of assertion a packet makes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PacketType {
    /// A rated statement about the recipient.
    Review,
    /// Joins the two recipient groups as aliases of one entity.
    Connection,
    /// Any other application-defined type.
    Other(String),
}

impl From<PacketType> for String {
    fn from(t: PacketType) -> String {
        match t {
            PacketType::Review => "review".into(),
            PacketType::Connection => "connection".into(),
            PacketType::Other(s) => s,
        }
    }
}

impl From<String> for PacketType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "review" => Self::Review,
            "connection" => Self::Connection,
            _ => Self::Other(s),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Review => write!(f, "review"),
            Self::Connection => write!(f, "connection"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// The signed, immutable portion of a packet.
///
/// Field order here is the canonical serialization order; changing it
/// changes every content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedData {
    /// Creation time, unix seconds. Set once.
    pub timestamp: i64,
    /// Author identifier groups.
    pub author: Side,
    /// Recipient identifier groups.
    pub recipient: Side,
    /// Packet type.
    #[serde(rename = "type")]
    pub packet_type: PacketType,
    /// Optional free-text comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Rating, bounded by `min_rating..=max_rating`.
    pub rating: i32,
    pub min_rating: i32,
    pub max_rating: i32,
}

/// A detached signature over a packet's content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketSignature {
    /// bs58-encoded Ed25519 public key of the signer.
    pub signer: String,
    /// hex-encoded Ed25519 signature over the 32-byte content hash.
    pub signature: String,
}

/// BLAKE3 content hash of a packet's signed fields (32 bytes).
///
/// A pure function of `SignedData`: packets that differ only in their
/// signature set or publication flag share a hash, which makes storage
/// content-addressed and insertion idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketHash([u8; 32]);

impl PacketHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode as a lowercase hex string (64 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHash(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidHash(format!("expected 32 bytes, got '{}'", s)))?;
        Ok(Self(arr))
    }
}

impl fmt::Display for PacketHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for PacketHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PacketHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The atomic unit of trust data: a signed assertion linking author
/// identifiers to recipient identifiers.
///
/// Signed fields are immutable after construction. The only legal
/// mutations are appending a signature and flipping `published` from
/// false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    #[serde(rename = "signedData")]
    pub signed: SignedData,
    /// Ordered, append-only signature list; distinct by (signer, signature).
    #[serde(default)]
    pub signatures: Vec<PacketSignature>,
    /// True once the packet has been (or is being) relayed externally.
    /// Monotone: never flips back to false.
    #[serde(default)]
    pub published: bool,
}

impl Packet {
    /// Construct a packet from signed data, validating the structural
    /// invariants (non-empty sides and groups, bounded identifier
    /// components, rating within its declared bounds).
    pub fn new(signed: SignedData) -> Result<Self, CoreError> {
        canonical::validate(&signed)?;
        Ok(Self {
            signed,
            signatures: Vec::new(),
            published: false,
        })
    }

    /// Build an unsigned `review` packet with the standard [-10, 10]
    /// rating bounds.
    pub fn review(
        author: Side,
        recipient: Side,
        comment: Option<String>,
        rating: i32,
        timestamp: i64,
    ) -> Result<Self, CoreError> {
        Self::new(SignedData {
            timestamp,
            author,
            recipient,
            packet_type: PacketType::Review,
            comment,
            rating,
            min_rating: REVIEW_MIN_RATING,
            max_rating: REVIEW_MAX_RATING,
        })
    }

    /// Build an unsigned `connection` packet asserting that `a` and `b`
    /// name the same entity.
    pub fn connection(
        author: Side,
        a: Identifier,
        b: Identifier,
        timestamp: i64,
    ) -> Result<Self, CoreError> {
        Self::new(SignedData {
            timestamp,
            author,
            recipient: Side::pair(a, b),
            packet_type: PacketType::Connection,
            comment: None,
            rating: 0,
            min_rating: CONNECTION_MIN_RATING,
            max_rating: CONNECTION_MAX_RATING,
        })
    }

    /// The content hash of the signed fields.
    pub fn hash(&self) -> Result<PacketHash, CoreError> {
        canonical::content_hash(&self.signed)
    }

    /// Append a signature if an identical (signer, signature) pair is not
    /// already present. Returns whether the signature was appended.
    pub fn add_signature(&mut self, sig: PacketSignature) -> bool {
        if self.signatures.contains(&sig) {
            return false;
        }
        self.signatures.push(sig);
        true
    }

    /// Mark the packet as published. Irreversible.
    pub fn set_published(&mut self) {
        self.published = true;
    }
}

/// A persisted path cache entry: the ordered packet chain previously
/// found between `start` and `end`, with the depth bound that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPath {
    pub start: Identifier,
    pub end: Identifier,
    /// The `max_depth` the search ran with.
    pub max_depth: u32,
    /// Ordered packet hashes along the chain, start to end.
    pub hashes: Vec<PacketHash>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}
