use thiserror::Error;
use vision_reconstruction_core::StoreError;

/// Batch-level failures of normal estimation.
///
/// Per-vertex problems (no neighbors, failed plane fit) never surface here;
/// they are counted in [`NormalsSummary`](super::NormalsSummary).
#[derive(Debug, Error)]
pub enum NormalsError {
    #[error("out of memory while allocating {what} for {count} vertices")]
    OutOfMemory { what: &'static str, count: usize },
    #[error("invalid normals config: {0}")]
    InvalidConfig(String),
    #[error("failed to write normal: {0}")]
    Store(#[from] StoreError),
}
