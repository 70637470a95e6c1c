//! Per-vertex surface normals from k-nearest-neighbor plane fits.
//!
//! For every reconstructed vertex the batch gathers its `k` nearest
//! reconstructed neighbors, fits a plane robustly, and orients the plane
//! normal toward a calibrated camera that observes the vertex.

mod config;
mod driver;
mod error;
mod neighborhood;
mod orientation;
mod spatial_index;

pub use config::NormalsConfig;
pub use driver::{
    CancelToken, LogProgress, NormalsBatch, NormalsSummary, ProgressSink, VertexOutcome,
    compute_normals,
};
pub use error::NormalsError;
pub use neighborhood::{Neighbor, NeighborhoodQuery};
pub use orientation::{OrientationPolicy, OrientedNormal, faces_away, resolve_orientation};
pub use spatial_index::SpatialIndex;
