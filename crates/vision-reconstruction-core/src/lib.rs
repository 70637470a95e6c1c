//! Core types for multi-view point cloud reconstruction.
//!
//! This crate provides the foundational building blocks used by all other
//! crates in the workspace:
//!
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt3`, and friends),
//! - the [`Plane`] primitive shared by fitting and orientation code,
//! - the [`ReconstructionStore`]: index-stable arenas of vertices, shots,
//!   2D observations and per-vertex incidence records,
//! - a deterministic, model-agnostic RANSAC engine.
//!
//! # Modules
//!
//! - \[`math`\]: basic type aliases.
//! - \[`types`\]: geometric primitives.
//! - \[`store`\]: the point cloud store and its identifiers.
//! - \[`ransac`\]: generic robust estimation helpers.
//! - \[`synthetic`\]: deterministic synthetic scenes (tests/examples).
//!
//! # Example
//!
//! ```
//! use vision_reconstruction_core::{Pt3, ReconstructionStore, Shot, Vec3};
//!
//! let mut store = ReconstructionStore::new();
//! let shot = store
//!     .add_shot(Shot::calibrated(640, 480, Vec3::new(0.0, 0.0, 1.0)))
//!     .unwrap();
//! let v = store.add_vertex();
//! store.add_observation(shot, v, 0.5, 0.5).unwrap();
//! store.set_position(v, Pt3::new(0.1, 0.2, 0.0)).unwrap();
//!
//! assert_eq!(store.reconstructed_ids().count(), 1);
//! assert_eq!(store.incidence(v).unwrap().len(), 1);
//! ```

/// Linear algebra type aliases.
mod math;
/// Generic RANSAC engine and traits.
mod ransac;
/// Point cloud store: vertices, shots, observations and incidence.
pub mod store;
/// Deterministic synthetic data generation helpers.
///
/// Small, reusable building blocks for constructing synthetic point clouds
/// (planar patches, noise blobs, observing shots). Used in workspace
/// tests/examples and handy for regression testing.
pub mod synthetic;
/// Geometric primitives.
mod types;

pub use math::*;
pub use ransac::*;
pub use store::{
    IncidenceEntry, Observation, PointId, ReconstructionStore, Shot, ShotId, StoreError, Vertex,
    VertexId,
};
pub use types::*;
