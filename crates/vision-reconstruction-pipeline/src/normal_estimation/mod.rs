//! Vertex normal estimation as a session problem.
//!
//! Steps operate on a [`ReconstructionSession<NormalEstimationProblem>`](crate::session::ReconstructionSession)
//! whose input is the point cloud store:
//!
//! - [`step_triangulate`]: refresh positions through an external triangulator
//! - [`step_clear_positions`]: forget all positions
//! - [`step_compute_normals`]: run the normals batch and record its output

mod problem;
mod state;
mod steps;

pub use problem::{
    NormalEstimationInput, NormalEstimationOutput, NormalEstimationProblem, NormalsExport,
    VertexNormalRecord,
};
pub use state::NormalEstimationState;
pub use steps::{
    ComputeNormalsOptions, run_normals, step_clear_positions, step_compute_normals,
    step_triangulate,
};
