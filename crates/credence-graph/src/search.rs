//! Bidirectional, depth-bounded path search.
//!
//! Two frontiers grow toward each other, one rooted at each endpoint;
//! each round expands the smaller one by a single hop. The search ends
//! the moment an identifier appears in both visited sets, or with
//! `NotFound` once the combined depth exceeds the bound. Expanding the
//! smaller side bounds work to roughly the square root of a one-sided
//! search of the same depth.

use std::collections::HashMap;

use credence_core::{Identifier, Packet, PacketHash};
use credence_store::PacketStore;

use crate::error::GraphError;
use crate::graph::{edge_order, IdentifierGraph};

/// Depth bound used when the caller does not supply one.
pub const DEFAULT_SEARCH_DEPTH: u32 = 3;

/// Hard ceiling on the depth bound; keeps worst-case latency bounded on
/// dense graphs.
pub const MAX_SEARCH_DEPTH: u32 = 16;

/// One search side: identifiers visited so far, each with the edge and
/// predecessor that first reached it (roots have neither), plus the
/// identifiers added in the most recent hop.
struct SearchSide {
    visited: HashMap<Identifier, Option<(PacketHash, Identifier)>>,
    frontier: Vec<Identifier>,
}

impl SearchSide {
    fn rooted_at(root: &Identifier) -> Self {
        let mut visited = HashMap::new();
        visited.insert(root.clone(), None);
        Self {
            visited,
            frontier: vec![root.clone()],
        }
    }

    /// Expand the frontier by one hop. Returns the meeting identifier as
    /// soon as a newly visited identifier is already known to `other`.
    fn expand(
        &mut self,
        other: &SearchSide,
        graph: &IdentifierGraph<'_>,
    ) -> Result<Option<Identifier>, GraphError> {
        let mut next = Vec::new();
        for id in std::mem::take(&mut self.frontier) {
            for neighbor in graph.neighbors(&id)? {
                if self.visited.contains_key(&neighbor.other) {
                    continue;
                }
                self.visited.insert(
                    neighbor.other.clone(),
                    Some((neighbor.edge.hash, id.clone())),
                );
                if other.visited.contains_key(&neighbor.other) {
                    return Ok(Some(neighbor.other));
                }
                next.push(neighbor.other);
            }
        }
        self.frontier = next;
        Ok(None)
    }

    /// Walk parent pointers from `from` back to this side's root,
    /// collecting edge hashes meeting-first.
    fn chain_to_root(&self, from: &Identifier) -> Vec<PacketHash> {
        let mut hashes = Vec::new();
        let mut current = from;
        while let Some(Some((hash, parent))) = self.visited.get(current) {
            hashes.push(*hash);
            current = parent;
        }
        hashes
    }
}

/// Bidirectional breadth-first path search over the identifier graph.
pub struct PathSearch<'a> {
    store: &'a PacketStore,
    graph: IdentifierGraph<'a>,
}

impl<'a> PathSearch<'a> {
    pub fn new(store: &'a PacketStore) -> Self {
        Self {
            store,
            graph: IdentifierGraph::new(store),
        }
    }

    /// Find an ordered packet chain connecting `start` and `end` within
    /// `max_depth` hops. `start == end` yields an empty chain; a depth
    /// bound above [`MAX_SEARCH_DEPTH`] is rejected.
    pub fn search(
        &self,
        start: &Identifier,
        end: &Identifier,
        max_depth: u32,
    ) -> Result<Vec<Packet>, GraphError> {
        if max_depth > MAX_SEARCH_DEPTH {
            return Err(GraphError::InvalidDepth(max_depth));
        }
        if start == end {
            return Ok(Vec::new());
        }

        let mut from_start = SearchSide::rooted_at(start);
        let mut from_end = SearchSide::rooted_at(end);

        for _round in 0..max_depth {
            // Expand the smaller side; ties go to the start side.
            let meeting = if from_start.frontier.len() <= from_end.frontier.len() {
                from_start.expand(&from_end, &self.graph)?
            } else {
                from_end.expand(&from_start, &self.graph)?
            };

            if let Some(meet) = meeting {
                let packets = self.reconstruct(&from_start, &from_end, &meet)?;
                tracing::debug!(
                    start = %start,
                    end = %end,
                    len = packets.len(),
                    "path found"
                );
                return Ok(packets);
            }

            if from_start.frontier.is_empty() || from_end.frontier.is_empty() {
                // One side exhausted its reachable set.
                break;
            }
        }

        tracing::debug!(start = %start, end = %end, max_depth, "no path");
        Err(GraphError::NotFound)
    }

    /// The first edge of a depth-1 search: the preferred direct edge
    /// between `start` and `end`.
    pub fn single_step(
        &self,
        start: &Identifier,
        end: &Identifier,
    ) -> Result<PacketHash, GraphError> {
        self.graph
            .neighbors(start)?
            .into_iter()
            .filter(|n| &n.other == end)
            .min_by(|a, b| edge_order(&a.edge, &b.edge))
            .map(|n| n.edge.hash)
            .ok_or(GraphError::NotFound)
    }

    /// Concatenate the two half-paths around the meeting identifier into
    /// start→end order and resolve hashes to packets.
    fn reconstruct(
        &self,
        from_start: &SearchSide,
        from_end: &SearchSide,
        meet: &Identifier,
    ) -> Result<Vec<Packet>, GraphError> {
        let mut hashes = from_start.chain_to_root(meet);
        hashes.reverse();
        hashes.extend(from_end.chain_to_root(meet));

        let mut packets = Vec::with_capacity(hashes.len());
        for hash in &hashes {
            packets.push(self.store.get(hash)?);
        }
        Ok(packets)
    }
}
