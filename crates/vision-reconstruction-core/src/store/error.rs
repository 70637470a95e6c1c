use thiserror::Error;

use super::{PointId, ShotId, VertexId};
use crate::Real;

/// Errors raised by [`ReconstructionStore`](super::ReconstructionStore) mutators
/// and consistency checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("unknown {0}")]
    UnknownVertex(VertexId),
    #[error("unknown {0}")]
    UnknownShot(ShotId),
    #[error("unknown {0}")]
    UnknownObservation(PointId),
    #[error("shot must have a non-zero size, got {width}x{height}")]
    ZeroSizedShot { width: u32, height: u32 },
    #[error("shot reference point must be finite")]
    NonFiniteShot,
    #[error("non-finite position for {0}")]
    NonFinitePosition(VertexId),
    #[error("normalized observation ({x}, {y}) lies outside [0, 1]x[0, 1]")]
    ObservationOutOfRange { x: Real, y: Real },
    #[error("{0} is not reconstructed")]
    NotReconstructed(VertexId),
    #[error("normal for {vertex} must be unit length, got norm {norm}")]
    NonUnitNormal { vertex: VertexId, norm: Real },
    #[error("incidence table has {records} records for {vertices} vertices")]
    IncidenceLengthMismatch { vertices: usize, records: usize },
    #[error("incidence of {vertex} references {point} which does not observe it")]
    InconsistentIncidence { vertex: VertexId, point: PointId },
}
