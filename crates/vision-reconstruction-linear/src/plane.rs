//! Closed-form least-squares plane fitting.
//!
//! # Algorithm
//!
//! 1. Compute the centroid of the points.
//! 2. Build the 3x3 scatter matrix of centered points.
//! 3. The eigenvector of the smallest eigenvalue is the plane normal.
//! 4. The offset is `d = n · centroid`, so the plane reads `n · x = d`.
//!
//! The eigenvalue spectrum also classifies degenerate inputs: a single
//! significant eigenvalue means the points lie on a line, none means they
//! all coincide.

use nalgebra::Matrix3;
use vision_reconstruction_core::{Plane, Pt3, Real, Vec3};

use crate::PlaneFitError;

/// Least-squares plane with fit statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneEstimate {
    /// Plane with unit normal; the sign of the normal is arbitrary.
    pub plane: Plane,
    /// Centroid of the input points.
    pub centroid: Pt3,
    /// Root mean square point-to-plane distance.
    pub rmse: Real,
}

/// Solver for plane estimation via closed-form methods.
pub struct PlaneSolver;

impl PlaneSolver {
    /// Ratio below which an eigenvalue counts as zero relative to the largest.
    pub const RANK_THRESHOLD: Real = 1e-8;

    /// Fit a plane to 3D points via covariance eigendecomposition.
    ///
    /// Requires at least 3 points that are neither coincident nor collinear.
    pub fn from_points_3d(points: &[Pt3]) -> Result<PlaneEstimate, PlaneFitError> {
        if points.len() < 3 {
            return Err(PlaneFitError::NotEnoughPoints(points.len()));
        }

        let n = points.len() as Real;
        let centroid: Vec3 = points.iter().map(|p| p.coords).sum::<Vec3>() / n;

        let mut cov = Matrix3::<Real>::zeros();
        for p in points {
            let centered = p.coords - centroid;
            cov += centered * centered.transpose();
        }

        let eigen = cov.symmetric_eigen();
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        let min_idx = order[0];
        let second = eigen.eigenvalues[order[1]];
        let max = eigen.eigenvalues[order[2]];

        // Round-off floor for points that all sit at one location.
        let floor = 1e-20 * n * (1.0 + centroid.norm_squared());
        if !max.is_finite() || max <= floor {
            return Err(PlaneFitError::Coincident);
        }
        if second / max < Self::RANK_THRESHOLD {
            return Err(PlaneFitError::Collinear);
        }

        let normal: Vec3 = eigen.eigenvectors.column(min_idx).into_owned();
        let norm = normal.norm();
        if !norm.is_finite() || norm <= Real::EPSILON {
            return Err(PlaneFitError::NonFinite(norm));
        }
        let normal = normal / norm;
        let plane = Plane::new(normal, normal.dot(&centroid));

        let sum_sq: Real = points
            .iter()
            .map(|p| plane.signed_distance(&p.coords).powi(2))
            .sum();

        Ok(PlaneEstimate {
            plane,
            centroid: Pt3::from(centroid),
            rmse: (sum_sq / n).sqrt(),
        })
    }

    /// Plane through three points, or `None` if they are (nearly) collinear.
    pub fn from_three_points(p0: &Pt3, p1: &Pt3, p2: &Pt3) -> Option<Plane> {
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let normal = e1.cross(&e2);
        let scale = e1.norm() * e2.norm();
        if !scale.is_finite() || normal.norm() <= Self::RANK_THRESHOLD * scale {
            return None;
        }
        Plane::through_point(normal, p0)
    }
}

/// Root mean square distance of `points` to their centroid.
pub fn rms_spread(points: &[Pt3]) -> Real {
    if points.is_empty() {
        return 0.0;
    }
    let n = points.len() as Real;
    let centroid: Vec3 = points.iter().map(|p| p.coords).sum::<Vec3>() / n;
    let ss: Real = points
        .iter()
        .map(|p| (p.coords - centroid).norm_squared())
        .sum();
    (ss / n).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_tilted_plane() {
        let truth = Plane::from_coefficients(0.2, -0.4, 1.0, 0.8).unwrap();
        let points: Vec<Pt3> = (0..5)
            .flat_map(|i| (0..5).map(move |j| (i as Real * 0.1, j as Real * 0.1)))
            .map(|(x, y)| {
                // Solve n · p = d for z.
                let z = (truth.d - truth.normal.x * x - truth.normal.y * y) / truth.normal.z;
                Pt3::new(x, y, z)
            })
            .collect();

        let est = PlaneSolver::from_points_3d(&points).unwrap();
        let dot = est.plane.normal.dot(&truth.normal);
        assert!((dot.abs() - 1.0).abs() < 1e-9, "dot {dot}");
        assert!(est.rmse < 1e-9);
        for p in &points {
            assert!(est.plane.distance(p) < 1e-9);
        }
    }

    #[test]
    fn rejects_too_few_points() {
        let err = PlaneSolver::from_points_3d(&[Pt3::origin(), Pt3::new(1.0, 0.0, 0.0)]);
        assert_eq!(err, Err(PlaneFitError::NotEnoughPoints(2)));
    }

    #[test]
    fn rejects_collinear_points() {
        let points: Vec<Pt3> = (0..6).map(|i| Pt3::new(i as Real, 2.0 * i as Real, 0.5)).collect();
        assert_eq!(
            PlaneSolver::from_points_3d(&points),
            Err(PlaneFitError::Collinear)
        );
    }

    #[test]
    fn rejects_coincident_points() {
        let points = vec![Pt3::new(3.0, 3.0, 3.0); 4];
        assert_eq!(
            PlaneSolver::from_points_3d(&points),
            Err(PlaneFitError::Coincident)
        );
    }

    #[test]
    fn three_point_plane() {
        let plane = PlaneSolver::from_three_points(
            &Pt3::new(0.0, 0.0, 2.0),
            &Pt3::new(1.0, 0.0, 2.0),
            &Pt3::new(0.0, 1.0, 2.0),
        )
        .unwrap();
        assert_eq!(plane.normal, Vec3::z());
        assert!((plane.d - 2.0).abs() < 1e-12);

        assert!(
            PlaneSolver::from_three_points(
                &Pt3::origin(),
                &Pt3::new(1.0, 1.0, 1.0),
                &Pt3::new(2.0, 2.0, 2.0)
            )
            .is_none()
        );
    }

    #[test]
    fn spread_of_square() {
        let points = [
            Pt3::new(-1.0, -1.0, 0.0),
            Pt3::new(1.0, -1.0, 0.0),
            Pt3::new(1.0, 1.0, 0.0),
            Pt3::new(-1.0, 1.0, 0.0),
        ];
        assert!((rms_spread(&points) - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(rms_spread(&[]), 0.0);
    }
}
