//! Vertex normal estimation over a reconstructed point cloud.
//!
//! Two layers are provided:
//!
//! - [`normals`]: the batch itself. [`SpatialIndex`] compacts the
//!   reconstructed vertices into a k-d tree, [`NeighborhoodQuery`] returns
//!   their nearest neighbors, a [`PlaneFitter`](vision_reconstruction_linear::PlaneFitter)
//!   fits a plane robustly and [`resolve_orientation`] turns its normal
//!   toward a calibrated camera.
//! - [`session`] and [`normal_estimation`]: a serializable session driven by
//!   step functions, with the triangulator plugged in through
//!   [`triangulation::Triangulator`].
//!
//! ```no_run
//! use vision_reconstruction_pipeline::{
//!     NormalEstimationProblem, ReconstructionSession, step_compute_normals,
//! };
//! # fn main() -> anyhow::Result<()> {
//! # let store = unimplemented!();
//! let mut session = ReconstructionSession::<NormalEstimationProblem>::new();
//! session.set_input(store)?;
//! step_compute_normals(&mut session, None)?;
//! let export = session.export()?;
//! println!("{} normals", export.normals.len());
//! # Ok(())
//! # }
//! ```

pub mod normal_estimation;
pub mod normals;
pub mod session;
pub mod triangulation;

pub use crate::session::{
    ExportRecord, InvalidationPolicy, LogEntry, ProblemType, ReconstructionSession,
    SessionMetadata,
};

pub use crate::normals::{
    CancelToken, LogProgress, Neighbor, NeighborhoodQuery, NormalsBatch, NormalsConfig,
    NormalsError, NormalsSummary, OrientationPolicy, OrientedNormal, ProgressSink, SpatialIndex,
    VertexOutcome, compute_normals, resolve_orientation,
};

pub use crate::normal_estimation::{
    ComputeNormalsOptions, NormalEstimationOutput, NormalEstimationProblem, NormalEstimationState,
    NormalsExport, VertexNormalRecord, run_normals, step_clear_positions, step_compute_normals,
    step_triangulate,
};

pub use crate::triangulation::{TriangulationOptions, Triangulator};
