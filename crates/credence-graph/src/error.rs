use credence_core::CoreError;
use credence_store::StoreError;

use crate::search::MAX_SEARCH_DEPTH;

/// Graph layer errors.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// No path exists within the depth bound, or a direct edge is absent.
    #[error("no path found")]
    NotFound,

    #[error("search depth {0} exceeds the ceiling of {MAX_SEARCH_DEPTH}")]
    InvalidDepth(u32),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
