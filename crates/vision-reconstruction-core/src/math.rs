//! Scalar and vector type aliases used throughout the workspace.

use nalgebra::{Matrix3, Point2, Point3, Vector2, Vector3};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;

/// Tolerance used when checking that a vector has unit length.
pub const UNIT_NORM_TOL: Real = 1e-6;

/// Returns `true` if every component of `v` is finite.
#[inline]
pub fn is_finite_vec3(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Returns `true` if `v` is finite and has unit length within [`UNIT_NORM_TOL`].
#[inline]
pub fn is_unit_vec3(v: &Vec3) -> bool {
    is_finite_vec3(v) && (v.norm() - 1.0).abs() <= UNIT_NORM_TOL
}
