//! Intermediate state for normal estimation sessions.

use serde::{Deserialize, Serialize};

use crate::normals::NormalsSummary;

/// Bookkeeping kept between steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalEstimationState {
    /// Reconstructed vertex count reported by the last triangulation.
    pub triangulated: Option<usize>,
    /// Summary of the last normals batch, cancelled batches included.
    pub last_summary: Option<NormalsSummary>,
    /// Number of normals batches run since the input was set.
    pub batches: usize,
}

impl NormalEstimationState {
    /// Forget results derived from vertex positions.
    pub fn clear_normals(&mut self) {
        self.last_summary = None;
    }
}
