//! [`ProblemType`] implementation for vertex normal estimation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vision_reconstruction_core::{Pt3, ReconstructionStore, Vec3, VertexId};

use crate::normals::{NormalsConfig, NormalsSummary};
use crate::session::{InvalidationPolicy, ProblemType};

use super::state::NormalEstimationState;

/// Oriented normals for every reconstructed vertex of a store.
#[derive(Debug)]
pub struct NormalEstimationProblem;

/// Input type: the point cloud store, edited in place by the steps.
pub type NormalEstimationInput = ReconstructionStore;

/// Normal of one reconstructed vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexNormalRecord {
    pub vertex: VertexId,
    pub position: Pt3,
    pub normal: Vec3,
}

/// Result of the last completed normal estimation batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalEstimationOutput {
    /// Reconstructed vertices that carry a normal, in vertex order.
    pub normals: Vec<VertexNormalRecord>,
    pub summary: NormalsSummary,
}

impl NormalEstimationOutput {
    /// Snapshot the normals currently held by `store`.
    pub fn collect(store: &ReconstructionStore, summary: NormalsSummary) -> Self {
        let normals = store
            .vertices()
            .filter(|(_, v)| v.reconstructed)
            .filter_map(|(vertex, v)| {
                v.normal.map(|normal| VertexNormalRecord {
                    vertex,
                    position: v.position,
                    normal,
                })
            })
            .collect();
        Self { normals, summary }
    }
}

/// Export type for downstream meshing and rendering.
pub type NormalsExport = NormalEstimationOutput;

impl ProblemType for NormalEstimationProblem {
    type Config = NormalsConfig;
    type Input = NormalEstimationInput;
    type State = NormalEstimationState;
    type Output = NormalEstimationOutput;
    type Export = NormalsExport;

    fn name() -> &'static str {
        "normal_estimation_v1"
    }

    fn validate_input(input: &Self::Input) -> Result<()> {
        input.validate().context("inconsistent reconstruction store")
    }

    fn validate_config(config: &Self::Config) -> Result<()> {
        config.validate()?;
        Ok(())
    }

    /// Normals depend on every config field.
    fn on_config_change() -> InvalidationPolicy {
        InvalidationPolicy::CLEAR_COMPUTED
    }

    fn export(output: &Self::Output, _config: &Self::Config) -> Result<Self::Export> {
        Ok(output.clone())
    }
}
