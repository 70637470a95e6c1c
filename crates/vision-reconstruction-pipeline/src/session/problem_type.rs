//! Problem contract for [`ReconstructionSession`](super::ReconstructionSession).

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

/// Which computed session parts are dropped when input or config changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvalidationPolicy {
    pub clear_state: bool,
    pub clear_output: bool,
    pub clear_exports: bool,
}

impl InvalidationPolicy {
    pub const KEEP_ALL: Self = Self {
        clear_state: false,
        clear_output: false,
        clear_exports: false,
    };

    /// Drop state and output, keep previously generated exports.
    pub const CLEAR_COMPUTED: Self = Self {
        clear_state: true,
        clear_output: true,
        clear_exports: false,
    };

    pub const CLEAR_ALL: Self = Self {
        clear_state: true,
        clear_output: true,
        clear_exports: true,
    };
}

/// A reconstruction problem driven through a session by step functions.
///
/// The trait only fixes the data a session carries and its validation hooks;
/// the processing itself lives in free `step_*` functions taking
/// `&mut ReconstructionSession<Self>`.
pub trait ProblemType: Sized + 'static {
    /// Tunable parameters, defaulted when a session is created.
    type Config: Clone + Default + Serialize + DeserializeOwned + Debug;
    /// Data the steps operate on.
    type Input: Clone + Serialize + DeserializeOwned + Debug;
    /// Intermediate results between steps.
    type State: Clone + Default + Serialize + DeserializeOwned + Debug;
    /// Final result of a run.
    type Output: Clone + Serialize + DeserializeOwned + Debug;
    /// Format handed to downstream consumers.
    type Export: Clone + Serialize + DeserializeOwned + Debug;

    /// Stable snake_case identifier, stored in session files.
    fn name() -> &'static str;

    /// Sessions written with a newer schema are rejected on load.
    fn schema_version() -> u32 {
        1
    }

    fn validate_input(_input: &Self::Input) -> Result<()> {
        Ok(())
    }

    fn validate_config(_config: &Self::Config) -> Result<()> {
        Ok(())
    }

    fn validate_input_config(_input: &Self::Input, _config: &Self::Config) -> Result<()> {
        Ok(())
    }

    fn on_input_change() -> InvalidationPolicy {
        InvalidationPolicy::CLEAR_COMPUTED
    }

    fn on_config_change() -> InvalidationPolicy {
        InvalidationPolicy::KEEP_ALL
    }

    fn export(output: &Self::Output, config: &Self::Config) -> Result<Self::Export>;
}
