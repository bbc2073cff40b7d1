//! One-hop identifier resolution: find a display name (or any preferred
//! predicate) directly linked to a given identifier.

use credence_core::Identifier;
use credence_store::PacketStore;

use crate::error::GraphError;
use crate::graph::IdentifierGraph;

pub struct IdentifierResolver<'a> {
    graph: IdentifierGraph<'a>,
}

impl<'a> IdentifierResolver<'a> {
    pub fn new(store: &'a PacketStore) -> Self {
        Self {
            graph: IdentifierGraph::new(store),
        }
    }

    /// Among the direct neighbors of `start`, return the first whose
    /// predicate matches a candidate, trying candidates in the supplied
    /// order. Candidate order wins over discovery order; `None` when
    /// nothing matches.
    pub fn resolve<S: AsRef<str>>(
        &self,
        start: &Identifier,
        candidate_predicates: &[S],
    ) -> Result<Option<Identifier>, GraphError> {
        let neighbors = self.graph.neighbors(start)?;
        for predicate in candidate_predicates {
            let predicate = predicate.as_ref();
            if let Some(found) = neighbors.iter().find(|n| n.other.predicate == predicate) {
                return Ok(Some(found.other.clone()));
            }
        }
        Ok(None)
    }
}
