//! Plane fitting over reconstructed point clouds.
//!
//! - [`PlaneSolver`]: closed-form least-squares plane through a point set
//!   (covariance eigen-decomposition) with degeneracy detection.
//! - [`PlaneEstimator`]: the minimal 3-point model plugged into the generic
//!   RANSAC engine of `vision-reconstruction-core`.
//! - [`PlaneFitter`]: the robust fitting contract used by normal estimation,
//!   with [`RansacPlaneFitter`] as the default implementation.
//!
//! # Example
//!
//! ```
//! use vision_reconstruction_core::Pt3;
//! use vision_reconstruction_linear::PlaneSolver;
//!
//! let points = [
//!     Pt3::new(0.0, 0.0, 1.0),
//!     Pt3::new(1.0, 0.0, 1.0),
//!     Pt3::new(0.0, 1.0, 1.0),
//!     Pt3::new(1.0, 1.0, 1.0),
//! ];
//! let est = PlaneSolver::from_points_3d(&points).unwrap();
//! assert!((est.plane.normal.z.abs() - 1.0).abs() < 1e-12);
//! assert!(est.rmse < 1e-12);
//! ```

mod error;
mod plane;
mod plane_ransac;

pub use error::PlaneFitError;
pub use plane::*;
pub use plane_ransac::*;

pub mod prelude {
    //! Common imports for plane fitting.
    pub use crate::{
        PlaneEstimate, PlaneEstimator, PlaneFitError, PlaneFitOptions, PlaneFitter, PlaneSolver,
        RansacPlaneFitter,
    };
}
