//! The identifier graph, computed lazily from the packet store's
//! author/recipient indices. Nothing here is materialized: an edge
//! exists between two identifiers exactly when a published packet has
//! one on its author side and the other on its recipient side.

use std::cmp::Ordering;
use std::collections::HashSet;

use credence_core::{Identifier, Packet, PacketHash, PacketType};
use credence_store::{PacketStore, Page};

use crate::error::GraphError;

/// A derived graph edge, backed by one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub hash: PacketHash,
    pub packet_type: PacketType,
    pub rating: i32,
    pub timestamp: i64,
}

/// One incident edge together with the identifier on the far side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub edge: Edge,
    pub other: Identifier,
}

/// Preference order for parallel edges: higher rating first, then more
/// recent, then lexicographically smaller hash. Total and stable, so
/// traversal output is reproducible for identical input graphs.
pub(crate) fn edge_order(a: &Edge, b: &Edge) -> Ordering {
    b.rating
        .cmp(&a.rating)
        .then(b.timestamp.cmp(&a.timestamp))
        .then(a.hash.cmp(&b.hash))
}

/// Read-only graph view over a packet store.
pub struct IdentifierGraph<'a> {
    store: &'a PacketStore,
}

impl<'a> IdentifierGraph<'a> {
    pub fn new(store: &'a PacketStore) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &'a PacketStore {
        self.store
    }

    /// All published packets incident to `id`, expanded to the cross
    /// product of the opposite side's identifiers. Self-loops (the same
    /// identifier on both sides of one packet) are excluded. The result
    /// is sorted by edge preference, then by the far identifier, so
    /// callers iterate in a deterministic order.
    pub fn neighbors(&self, id: &Identifier) -> Result<Vec<Neighbor>, GraphError> {
        let mut out = Vec::new();
        let mut seen: HashSet<(PacketHash, Identifier)> = HashSet::new();

        let incident = self
            .store
            .by_author(id, Page::all())?
            .into_iter()
            .chain(self.store.by_recipient(id, Page::all())?);

        for packet in incident {
            if !packet.published {
                continue;
            }
            let hash = packet.hash()?;
            let edge = Edge {
                hash,
                packet_type: packet.signed.packet_type.clone(),
                rating: packet.signed.rating,
                timestamp: packet.signed.timestamp,
            };
            push_far_side(&mut out, &mut seen, &edge, id, &packet);
        }

        out.sort_by(|a, b| edge_order(&a.edge, &b.edge).then_with(|| a.other.cmp(&b.other)));
        Ok(out)
    }
}

fn push_far_side(
    out: &mut Vec<Neighbor>,
    seen: &mut HashSet<(PacketHash, Identifier)>,
    edge: &Edge,
    id: &Identifier,
    packet: &Packet,
) {
    let mut push = |other: &Identifier| {
        if other == id {
            // Self-loop: degenerate zero-length edge, never traversed.
            return;
        }
        if seen.insert((edge.hash, other.clone())) {
            out.push(Neighbor {
                edge: edge.clone(),
                other: other.clone(),
            });
        }
    };
    if packet.signed.author.contains(id) {
        for other in packet.signed.recipient.identifiers() {
            push(other);
        }
    }
    if packet.signed.recipient.contains(id) {
        for other in packet.signed.author.identifiers() {
            push(other);
        }
        // A connection joins its recipient groups as aliases of one
        // entity, so members of the other groups are neighbors too.
        if packet.signed.packet_type == PacketType::Connection {
            for group in &packet.signed.recipient.groups {
                if group.iter().any(|i| i == id) {
                    continue;
                }
                for other in group {
                    push(other);
                }
            }
        }
    }
}
