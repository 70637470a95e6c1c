//! Session framework: a serializable container advanced by step functions.
//!
//! A [`ReconstructionSession`] owns the config, input, intermediate state and
//! output of one [`ProblemType`]. Steps such as
//! [`step_compute_normals`](crate::normal_estimation::step_compute_normals)
//! take `&mut ReconstructionSession<P>` and record their outcome in the
//! session log.

mod problem_type;
mod reconsession;
mod types;

pub use problem_type::{InvalidationPolicy, ProblemType};
pub use reconsession::ReconstructionSession;
pub use types::{ExportRecord, LogEntry, SessionMetadata, current_timestamp};
