//! Geometric primitives shared across the reconstruction workspace.

mod plane;

pub use plane::*;
