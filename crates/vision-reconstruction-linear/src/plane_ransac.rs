//! Robust plane fitting over store vertices.
//!
//! [`RansacPlaneFitter`] samples minimal 3-point planes, scores them by
//! point-to-plane distance and refits the best consensus set with
//! [`PlaneSolver`]. The inlier threshold is relative to the spread of the
//! candidate set, so the same options work for clouds in any unit.

use serde::{Deserialize, Serialize};
use vision_reconstruction_core::{
    Estimator, Plane, Pt3, RansacOptions, Real, ReconstructionStore, VertexId, is_unit_vec3,
    ransac,
};

use crate::{PlaneFitError, PlaneSolver, rms_spread};

/// 3-point plane model for the generic RANSAC engine.
pub struct PlaneEstimator;

impl Estimator for PlaneEstimator {
    type Datum = Pt3;
    type Model = Plane;

    const MIN_SAMPLES: usize = 3;

    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model> {
        let [a, b, c] = sample_indices else {
            return None;
        };
        PlaneSolver::from_three_points(&data[*a], &data[*b], &data[*c])
    }

    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64 {
        model.distance(datum)
    }

    fn is_degenerate(_data: &[Self::Datum], sample_indices: &[usize]) -> bool {
        sample_indices.len() != Self::MIN_SAMPLES
    }

    fn refit(data: &[Self::Datum], inliers: &[usize]) -> Option<Self::Model> {
        let points: Vec<Pt3> = inliers.iter().map(|&i| data[i]).collect();
        PlaneSolver::from_points_3d(&points).ok().map(|e| e.plane)
    }
}

/// Options for robust plane fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneFitOptions {
    /// Maximum number of RANSAC iterations.
    pub max_iters: usize,
    /// Inlier distance as a fraction of the candidate set's RMS spread.
    pub relative_threshold: Real,
    /// Minimum fraction of candidates that must support the plane.
    pub min_inlier_ratio: Real,
    /// Absolute minimum number of supporting candidates.
    pub min_inliers: usize,
    /// Desired RANSAC confidence in `[0, 1)`.
    pub confidence: Real,
    /// Base RNG seed.
    pub seed: u64,
}

impl Default for PlaneFitOptions {
    fn default() -> Self {
        Self {
            max_iters: 500,
            relative_threshold: 0.05,
            min_inlier_ratio: 0.5,
            min_inliers: 3,
            confidence: 0.99,
            seed: 0x5EED_B1A5,
        }
    }
}

impl PlaneFitOptions {
    /// Check option ranges.
    pub fn validate(&self) -> Result<(), PlaneFitError> {
        if !(self.relative_threshold.is_finite() && self.relative_threshold > 0.0) {
            return Err(PlaneFitError::InvalidOptions(format!(
                "relative_threshold must be positive, got {}",
                self.relative_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_inlier_ratio) {
            return Err(PlaneFitError::InvalidOptions(format!(
                "min_inlier_ratio must lie in [0, 1], got {}",
                self.min_inlier_ratio
            )));
        }
        if self.min_inliers < PlaneEstimator::MIN_SAMPLES {
            return Err(PlaneFitError::InvalidOptions(format!(
                "min_inliers must be at least {}, got {}",
                PlaneEstimator::MIN_SAMPLES,
                self.min_inliers
            )));
        }
        self.ransac_opts(1.0, PlaneEstimator::MIN_SAMPLES, self.seed)
            .validate()
            .map_err(|e| PlaneFitError::InvalidOptions(e.to_string()))
    }

    /// Required support for a candidate set of `n` points.
    pub fn required_inliers(&self, n: usize) -> usize {
        let by_ratio = (self.min_inlier_ratio * n as Real).ceil() as usize;
        by_ratio.max(self.min_inliers)
    }

    /// Convert to generic RANSAC options for a set with the given spread.
    pub fn ransac_opts(&self, spread: Real, n: usize, seed: u64) -> RansacOptions {
        RansacOptions {
            max_iters: self.max_iters,
            thresh: self.relative_threshold * spread,
            min_inliers: self.required_inliers(n),
            confidence: self.confidence,
            seed,
            refit_on_inliers: true,
        }
    }
}

/// Robust plane fitting contract.
///
/// Given the store and candidate vertex identifiers (the slice length is the
/// candidate count), return a plane `a·x + b·y + c·z = d` with unit normal,
/// or an error when no stable plane exists. Implementations must be safe to
/// call from several threads at once.
pub trait PlaneFitter: Sync {
    fn fit_plane(
        &self,
        store: &ReconstructionStore,
        candidates: &[VertexId],
    ) -> Result<Plane, PlaneFitError>;
}

impl<F> PlaneFitter for F
where
    F: Fn(&ReconstructionStore, &[VertexId]) -> Result<Plane, PlaneFitError> + Sync,
{
    fn fit_plane(
        &self,
        store: &ReconstructionStore,
        candidates: &[VertexId],
    ) -> Result<Plane, PlaneFitError> {
        self(store, candidates)
    }
}

/// Gather positions of reconstructed candidates.
pub fn candidate_points(
    store: &ReconstructionStore,
    candidates: &[VertexId],
) -> Result<Vec<Pt3>, PlaneFitError> {
    candidates
        .iter()
        .map(|&id| {
            let v = store.vertex(id).ok_or(PlaneFitError::UnknownVertex(id))?;
            if !v.reconstructed {
                return Err(PlaneFitError::NotReconstructed(id));
            }
            Ok(v.position)
        })
        .collect()
}

/// RANSAC-based [`PlaneFitter`].
///
/// The RNG seed mixes the configured seed with the first candidate, which
/// normal estimation passes as the query vertex itself. A vertex's fit is
/// therefore reproducible regardless of batch order or threading.
#[derive(Debug, Clone, Default)]
pub struct RansacPlaneFitter {
    pub opts: PlaneFitOptions,
}

impl RansacPlaneFitter {
    pub fn new(opts: PlaneFitOptions) -> Self {
        Self { opts }
    }

    fn seed_for(&self, candidates: &[VertexId]) -> u64 {
        let key = candidates.first().map_or(0, |v| v.index() as u64);
        self.opts.seed ^ key.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// Fit a plane to raw points with an explicit seed.
    pub fn fit_points(&self, points: &[Pt3], seed: u64) -> Result<Plane, PlaneFitError> {
        if points.len() < PlaneEstimator::MIN_SAMPLES {
            return Err(PlaneFitError::NotEnoughPoints(points.len()));
        }
        let spread = rms_spread(points);
        if !spread.is_finite() || spread <= 0.0 {
            return Err(PlaneFitError::Coincident);
        }

        let opts = self.opts.ransac_opts(spread, points.len(), seed);
        let res = ransac::<PlaneEstimator>(points, &opts);
        let Some(plane) = res.model.filter(|_| res.success) else {
            // Tell apart structural degeneracy from missing consensus.
            return match PlaneSolver::from_points_3d(points) {
                Err(e @ (PlaneFitError::Collinear | PlaneFitError::Coincident)) => Err(e),
                _ => Err(PlaneFitError::NoConsensus {
                    candidates: points.len(),
                    required: opts.min_inliers,
                }),
            };
        };

        if !is_unit_vec3(&plane.normal) || !plane.d.is_finite() {
            return Err(PlaneFitError::NonFinite(plane.normal.norm()));
        }
        log::trace!(
            "plane fit: {}/{} inliers after {} iterations, rms {:.3e}",
            res.inliers.len(),
            points.len(),
            res.iters,
            res.inlier_rms
        );
        Ok(plane)
    }
}

impl PlaneFitter for RansacPlaneFitter {
    fn fit_plane(
        &self,
        store: &ReconstructionStore,
        candidates: &[VertexId],
    ) -> Result<Plane, PlaneFitError> {
        let points = candidate_points(store, candidates)?;
        self.fit_points(&points, self.seed_for(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_reconstruction_core::Vec3;

    #[test]
    fn estimator_fits_minimal_sample() {
        let data = [
            Pt3::new(0.0, 0.0, 0.0),
            Pt3::new(1.0, 0.0, 0.0),
            Pt3::new(0.0, 1.0, 0.0),
            Pt3::new(0.0, 0.0, 5.0),
        ];
        let plane = PlaneEstimator::fit(&data, &[0, 1, 2]).unwrap();
        assert_eq!(plane.normal, Vec3::z());
        assert!((PlaneEstimator::residual(&plane, &data[3]) - 5.0).abs() < 1e-12);
        assert!(PlaneEstimator::fit(&data, &[0, 1]).is_none());
    }

    #[test]
    fn required_inliers_uses_ratio_and_floor() {
        let opts = PlaneFitOptions::default();
        assert_eq!(opts.required_inliers(3), 3);
        assert_eq!(opts.required_inliers(10), 5);
        assert_eq!(opts.required_inliers(11), 6);
    }

    #[test]
    fn options_validation() {
        assert!(PlaneFitOptions::default().validate().is_ok());
        let bad = PlaneFitOptions {
            relative_threshold: 0.0,
            ..PlaneFitOptions::default()
        };
        assert!(matches!(bad.validate(), Err(PlaneFitError::InvalidOptions(_))));
        let bad = PlaneFitOptions {
            max_iters: 0,
            ..PlaneFitOptions::default()
        };
        assert!(matches!(bad.validate(), Err(PlaneFitError::InvalidOptions(_))));
        let bad = PlaneFitOptions {
            min_inliers: 2,
            ..PlaneFitOptions::default()
        };
        assert!(matches!(bad.validate(), Err(PlaneFitError::InvalidOptions(_))));
    }

    #[test]
    fn options_json_roundtrip_fills_defaults() {
        let opts: PlaneFitOptions = serde_json::from_str(r#"{"max_iters": 50}"#).unwrap();
        assert_eq!(opts.max_iters, 50);
        assert_eq!(opts.relative_threshold, 0.05);

        let json = serde_json::to_string(&opts).unwrap();
        let restored: PlaneFitOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, opts);
    }

    #[test]
    fn fit_points_reports_collinear_sets() {
        let fitter = RansacPlaneFitter::default();
        let points: Vec<Pt3> = (0..8).map(|i| Pt3::new(i as Real, 0.0, 1.0)).collect();
        assert_eq!(fitter.fit_points(&points, 1), Err(PlaneFitError::Collinear));
    }

    #[test]
    fn closures_are_plane_fitters() {
        let store = ReconstructionStore::new();
        let fixed = |_: &ReconstructionStore, _: &[VertexId]| -> Result<Plane, PlaneFitError> {
            Ok(Plane::new(Vec3::x(), 1.0))
        };
        let plane = fixed.fit_plane(&store, &[]).unwrap();
        assert_eq!(plane.normal, Vec3::x());
    }
}
