//! Metadata, log and export records carried by a session.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Identity and timestamps of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// `ProblemType::name()` of the owning session.
    pub problem_type: String,
    pub schema_version: u32,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
    pub last_modified: u64,
    pub description: Option<String>,
}

impl SessionMetadata {
    pub fn new(problem_type: impl Into<String>, schema_version: u32) -> Self {
        let now = current_timestamp();
        Self {
            problem_type: problem_type.into(),
            schema_version,
            created_at: now,
            last_modified: now,
            description: None,
        }
    }

    pub fn with_description(
        problem_type: impl Into<String>,
        schema_version: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::new(problem_type, schema_version)
        }
    }

    pub fn touch(&mut self) {
        self.last_modified = current_timestamp();
    }
}

/// One step of the session audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: u64,
    /// Step name, e.g. `"compute_normals"`.
    pub operation: String,
    pub success: bool,
    /// Summary on success, error text on failure.
    pub notes: Option<String>,
}

impl LogEntry {
    fn record(operation: impl Into<String>, success: bool, notes: Option<String>) -> Self {
        Self {
            timestamp: current_timestamp(),
            operation: operation.into(),
            success,
            notes,
        }
    }

    pub fn success(operation: impl Into<String>) -> Self {
        Self::record(operation, true, None)
    }

    pub fn success_with_notes(operation: impl Into<String>, notes: impl Into<String>) -> Self {
        Self::record(operation, true, Some(notes.into()))
    }

    pub fn failure(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self::record(operation, false, Some(error.into()))
    }
}

/// An export produced by [`ReconstructionSession::export`](super::ReconstructionSession::export).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord<E> {
    pub timestamp: u64,
    pub export: E,
    pub notes: Option<String>,
}

impl<E> ExportRecord<E> {
    pub fn new(export: E) -> Self {
        Self {
            timestamp: current_timestamp(),
            export,
            notes: None,
        }
    }

    pub fn with_notes(export: E, notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Self::new(export)
        }
    }
}

/// Seconds since the Unix epoch, `0` if the clock is set before it.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
