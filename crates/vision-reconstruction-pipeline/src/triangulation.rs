//! Boundary to the multi-view triangulator that produces vertex positions.
//!
//! Triangulation itself lives outside this workspace. Callers plug an
//! implementation of [`Triangulator`] into
//! [`step_triangulate`](crate::normal_estimation::step_triangulate).

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use vision_reconstruction_core::{Real, ReconstructionStore, ShotId};

/// Inlier floor used by the [`all`](TriangulationOptions::all) preset.
pub const DEFAULT_MIN_INLIERS: usize = 2;
/// Measurement threshold in pixels used unless a preset overrides it.
pub const DEFAULT_MEASUREMENT_THRESHOLD: Real = 5.0;

/// Parameters of one triangulation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangulationOptions {
    /// Restrict triangulation to observations from these shots.
    pub shot_mask: Option<Vec<ShotId>>,
    /// Minimum inlier observations to accept a vertex.
    pub min_inliers: usize,
    /// Inlier floor for the weaker, second acceptance test.
    pub min_inliers_weaker: usize,
    /// Apply the stricter reprojection threshold.
    pub stricter_threshold: bool,
    /// Reprojection error bound in pixels.
    pub measurement_threshold: Real,
}

impl Default for TriangulationOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl TriangulationOptions {
    /// Every vertex from every shot with default thresholds.
    pub fn all() -> Self {
        Self {
            shot_mask: None,
            min_inliers: DEFAULT_MIN_INLIERS,
            min_inliers_weaker: DEFAULT_MIN_INLIERS,
            stricter_threshold: false,
            measurement_threshold: DEFAULT_MEASUREMENT_THRESHOLD,
        }
    }

    /// Hand-marked vertices: looser measurement bound, stricter acceptance.
    pub fn user_vertices() -> Self {
        Self {
            stricter_threshold: true,
            measurement_threshold: 50.0,
            ..Self::all()
        }
    }

    /// Only vertices backed by at least three consistent observations.
    pub fn trusted() -> Self {
        Self {
            min_inliers: 3,
            min_inliers_weaker: 3,
            ..Self::all()
        }
    }

    /// Default thresholds, restricted to the given shots.
    pub fn selected_shots(shots: impl IntoIterator<Item = ShotId>) -> Self {
        Self {
            shot_mask: Some(shots.into_iter().collect()),
            ..Self::all()
        }
    }

    /// Whether observations from `shot` take part.
    pub fn uses_shot(&self, shot: ShotId) -> bool {
        self.shot_mask
            .as_ref()
            .is_none_or(|mask| mask.contains(&shot))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_inliers >= 2,
            "min_inliers must be at least 2, got {}",
            self.min_inliers
        );
        ensure!(
            self.min_inliers_weaker >= 2,
            "min_inliers_weaker must be at least 2, got {}",
            self.min_inliers_weaker
        );
        ensure!(
            self.measurement_threshold.is_finite() && self.measurement_threshold > 0.0,
            "measurement_threshold must be positive, got {}",
            self.measurement_threshold
        );
        if let Some(mask) = &self.shot_mask {
            ensure!(!mask.is_empty(), "shot mask selects no shots");
        }
        Ok(())
    }
}

/// Producer of vertex positions from 2D observations.
///
/// Implementations write positions through
/// [`ReconstructionStore::set_position`] and return how many vertices are
/// reconstructed afterwards.
pub trait Triangulator {
    fn triangulate(
        &self,
        store: &mut ReconstructionStore,
        opts: &TriangulationOptions,
    ) -> Result<usize>;
}
