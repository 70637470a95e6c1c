use serde::{Deserialize, Serialize};

use crate::{Pt3, Real, Vec3};

/// Oriented plane `n · x = d` with unit normal `n`.
///
/// The coefficient form `(a, b, c, d)` satisfies `a·x + b·y + c·z = d`
/// for points on the plane. Flipping the normal also negates `d`, so the
/// point set described by the plane never changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Offset along the normal.
    pub d: Real,
}

impl Plane {
    /// Build a plane from a unit normal and offset.
    pub fn new(normal: Vec3, d: Real) -> Self {
        Self { normal, d }
    }

    /// Build a plane from `(a, b, c, d)` and rescale so `(a, b, c)` is unit length.
    ///
    /// Returns `None` for a zero or non-finite normal direction.
    pub fn from_coefficients(a: Real, b: Real, c: Real, d: Real) -> Option<Self> {
        let n = Vec3::new(a, b, c);
        let norm = n.norm();
        if !norm.is_finite() || norm <= Real::EPSILON || !d.is_finite() {
            return None;
        }
        Some(Self {
            normal: n / norm,
            d: d / norm,
        })
    }

    /// Plane through `point` with the given (not necessarily unit) normal.
    pub fn through_point(normal: Vec3, point: &Pt3) -> Option<Self> {
        let norm = normal.norm();
        if !norm.is_finite() || norm <= Real::EPSILON {
            return None;
        }
        let n = normal / norm;
        Some(Self {
            normal: n,
            d: n.dot(&point.coords),
        })
    }

    /// Coefficients `[a, b, c, d]`.
    pub fn coefficients(&self) -> [Real; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.d]
    }

    /// Signed distance `n · p − d`; positive on the side the normal points to.
    #[inline]
    pub fn signed_distance(&self, p: &Vec3) -> Real {
        self.normal.dot(p) - self.d
    }

    /// Absolute point-to-plane distance.
    #[inline]
    pub fn distance(&self, p: &Pt3) -> Real {
        self.signed_distance(&p.coords).abs()
    }

    /// Same plane with the opposite orientation.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }
}
