use thiserror::Error;
use vision_reconstruction_core::{Real, VertexId};

/// Failure to produce a stable plane from a point subset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaneFitError {
    #[error("need at least 3 points to fit a plane, got {0}")]
    NotEnoughPoints(usize),
    #[error("coincident points: cannot fit plane to a single location")]
    Coincident,
    #[error("collinear points: cannot fit plane to points along a single line")]
    Collinear,
    #[error("no plane supported by {required} of {candidates} points")]
    NoConsensus { candidates: usize, required: usize },
    #[error("candidate {0} does not exist")]
    UnknownVertex(VertexId),
    #[error("candidate {0} is not reconstructed")]
    NotReconstructed(VertexId),
    #[error("invalid plane fit options: {0}")]
    InvalidOptions(String),
    #[error("fitted plane is not finite (normal norm {0})")]
    NonFinite(Real),
}
