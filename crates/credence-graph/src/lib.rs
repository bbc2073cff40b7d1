//! Credence graph layer.
//!
//! Exposes the identifier graph induced by stored packets as a lazy,
//! read-only view, with bidirectional depth-bounded path search, a
//! persisted path cache consulted before fresh searches, and one-hop
//! identifier resolution.

pub mod cache;
pub mod error;
pub mod graph;
pub mod resolver;
pub mod search;

pub use cache::SavedPaths;
pub use error::GraphError;
pub use graph::{Edge, IdentifierGraph, Neighbor};
pub use resolver::IdentifierResolver;
pub use search::{PathSearch, DEFAULT_SEARCH_DEPTH, MAX_SEARCH_DEPTH};
