//! High-level entry crate for vertex normal estimation on photogrammetric
//! point clouds.
//!
//! Given a store of triangulated vertices, the shots that observe them and
//! their incidence records, this crate estimates a unit surface normal per
//! reconstructed vertex: a k-nearest-neighbor plane is fitted robustly and
//! its normal is turned toward a calibrated camera observing the vertex.
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! # let store = unimplemented!();
//! use vision_reconstruction::prelude::*;
//!
//! let mut session = ReconstructionSession::<NormalEstimationProblem>::new();
//! session.set_input(store)?;
//! session.update_config(|c| c.k = 50)?;
//!
//! step_compute_normals(&mut session, None)?;
//!
//! let export = session.export()?;
//! for record in &export.normals {
//!     println!("{} {:?}", record.vertex, record.normal);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! For one-off batches without a session, use [`compute_normals`] directly
//! on a [`ReconstructionStore`].
//!
//! # Module Organization
//!
//! - [`session`]: session framework (`ReconstructionSession`, `ProblemType`)
//! - [`normal_estimation`]: the normal estimation problem and its steps
//! - [`normals`]: spatial index, neighborhood queries, orientation and the
//!   batch driver
//! - [`triangulation`]: boundary to the external triangulator
//! - [`core`]: math types, the point cloud store, RANSAC
//! - [`linear`]: closed-form and robust plane fitting
//! - [`synthetic`]: deterministic synthetic scenes for tests and examples
//!
//! # Steps
//!
//! | Step | Effect |
//! |------|--------|
//! | `step_triangulate` | positions from an external [`Triangulator`]; drops normal output |
//! | `step_clear_positions` | all vertices unreconstructed; drops normal output |
//! | `step_compute_normals` | normals written to the store, snapshot stored as output |

/// Session framework with JSON checkpointing.
pub mod session {
    pub use vision_reconstruction_pipeline::session::{
        ExportRecord, InvalidationPolicy, LogEntry, ProblemType, ReconstructionSession,
        SessionMetadata,
    };
}

/// Normal estimation problem type and step functions.
pub mod normal_estimation {
    pub use vision_reconstruction_pipeline::normal_estimation::*;
}

/// Batch normal estimation without the session layer.
pub mod normals {
    pub use vision_reconstruction_pipeline::normals::*;
}

/// Triangulator boundary and option presets.
pub mod triangulation {
    pub use vision_reconstruction_pipeline::triangulation::*;
}

/// Math types, the point cloud store and the RANSAC engine.
pub mod core {
    pub use vision_reconstruction_core::*;
}

/// Plane fitting.
pub mod linear {
    pub use vision_reconstruction_linear::*;
}

/// Deterministic synthetic scenes.
pub mod synthetic {
    pub use vision_reconstruction_core::synthetic::*;
}

pub use vision_reconstruction_core::{
    Plane, Pt3, Real, ReconstructionStore, Shot, ShotId, StoreError, Vec3, Vertex, VertexId,
};
pub use vision_reconstruction_linear::{
    PlaneFitError, PlaneFitOptions, PlaneFitter, RansacPlaneFitter,
};
pub use vision_reconstruction_pipeline::{
    CancelToken, ComputeNormalsOptions, NormalEstimationProblem, NormalsBatch, NormalsConfig,
    NormalsError, NormalsExport, NormalsSummary, OrientationPolicy, ProblemType,
    ReconstructionSession, TriangulationOptions, Triangulator, compute_normals, run_normals,
    step_clear_positions, step_compute_normals, step_triangulate,
};

/// Convenient re-exports for common use cases.
///
/// ```no_run
/// use vision_reconstruction::prelude::*;
/// ```
pub mod prelude {
    pub use crate::session::{ProblemType, ReconstructionSession};

    pub use crate::{
        NormalEstimationProblem, run_normals, step_clear_positions, step_compute_normals,
        step_triangulate,
    };

    pub use crate::{
        CancelToken, ComputeNormalsOptions, NormalsConfig, NormalsExport, NormalsSummary,
        OrientationPolicy, TriangulationOptions, Triangulator,
    };

    pub use crate::{Plane, Pt3, Real, ReconstructionStore, Shot, ShotId, Vec3, VertexId};
}
