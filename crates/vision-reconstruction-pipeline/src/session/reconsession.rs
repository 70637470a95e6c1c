//! Generic session container mutated in place by step functions.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use super::problem_type::{InvalidationPolicy, ProblemType};
use super::types::{ExportRecord, LogEntry, SessionMetadata};

/// Config, input, intermediate state, output and exports of one problem.
///
/// Changing the input applies [`ProblemType::on_input_change`]; changing the
/// config applies [`ProblemType::on_config_change`]. Every mutation touches
/// the metadata timestamp.
///
/// ```no_run
/// use vision_reconstruction_pipeline::normal_estimation::{
///     NormalEstimationProblem, step_compute_normals,
/// };
/// use vision_reconstruction_pipeline::session::ReconstructionSession;
/// # fn main() -> anyhow::Result<()> {
/// # let store = unimplemented!();
/// let mut session = ReconstructionSession::<NormalEstimationProblem>::new();
/// session.set_input(store)?;
/// step_compute_normals(&mut session, None)?;
/// let export = session.export()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "P: ProblemType")]
pub struct ReconstructionSession<P: ProblemType> {
    pub metadata: SessionMetadata,
    pub config: P::Config,
    input: Option<P::Input>,
    pub state: P::State,
    output: Option<P::Output>,
    pub exports: Vec<ExportRecord<P::Export>>,
    pub log: Vec<LogEntry>,
}

impl<P: ProblemType> ReconstructionSession<P> {
    pub fn new() -> Self {
        Self::from_metadata(SessionMetadata::new(P::name(), P::schema_version()))
    }

    pub fn with_description(description: impl Into<String>) -> Self {
        Self::from_metadata(SessionMetadata::with_description(
            P::name(),
            P::schema_version(),
            description,
        ))
    }

    fn from_metadata(metadata: SessionMetadata) -> Self {
        Self {
            metadata,
            config: P::Config::default(),
            input: None,
            state: P::State::default(),
            output: None,
            exports: Vec::new(),
            log: Vec::new(),
        }
    }

    /// # Errors
    ///
    /// Fails if [`ProblemType::validate_input`] rejects `input`.
    pub fn with_input(input: P::Input) -> Result<Self> {
        let mut session = Self::new();
        session.set_input(input)?;
        Ok(session)
    }

    fn invalidate(&mut self, policy: InvalidationPolicy) {
        if policy.clear_state {
            self.state = P::State::default();
        }
        if policy.clear_output {
            self.output = None;
        }
        if policy.clear_exports {
            self.exports.clear();
        }
    }

    // Input

    /// Validate and replace the input.
    ///
    /// # Errors
    ///
    /// Fails if [`ProblemType::validate_input`] rejects `input`; the session
    /// is left unchanged in that case.
    pub fn set_input(&mut self, input: P::Input) -> Result<()> {
        P::validate_input(&input)?;
        self.invalidate(P::on_input_change());
        self.input = Some(input);
        self.metadata.touch();
        Ok(())
    }

    pub fn input(&self) -> Option<&P::Input> {
        self.input.as_ref()
    }

    /// Mutable input access for steps that edit it in place.
    ///
    /// Does not apply the invalidation policy; steps are expected to manage
    /// state and output themselves.
    pub fn require_input_mut(&mut self) -> Result<&mut P::Input> {
        self.metadata.touch();
        self.input.as_mut().ok_or_else(|| anyhow!("input not set"))
    }

    pub fn require_input(&self) -> Result<&P::Input> {
        self.input.as_ref().ok_or_else(|| anyhow!("input not set"))
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Take the input out of the session, applying the input-change policy.
    pub fn take_input(&mut self) -> Option<P::Input> {
        self.invalidate(P::on_input_change());
        self.metadata.touch();
        self.input.take()
    }

    // Config

    /// # Errors
    ///
    /// Fails if [`ProblemType::validate_config`] rejects `config`.
    pub fn set_config(&mut self, config: P::Config) -> Result<()> {
        P::validate_config(&config)?;
        self.invalidate(P::on_config_change());
        self.config = config;
        self.metadata.touch();
        Ok(())
    }

    /// Edit a copy of the config and apply it through [`set_config`](Self::set_config).
    pub fn update_config(&mut self, f: impl FnOnce(&mut P::Config)) -> Result<()> {
        let mut config = self.config.clone();
        f(&mut config);
        self.set_config(config)
    }

    // Output

    pub fn output(&self) -> Option<&P::Output> {
        self.output.as_ref()
    }

    pub fn require_output(&self) -> Result<&P::Output> {
        self.output
            .as_ref()
            .ok_or_else(|| anyhow!("output not computed"))
    }

    pub fn set_output(&mut self, output: P::Output) {
        self.output = Some(output);
        self.metadata.touch();
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    pub fn clear_output(&mut self) {
        self.output = None;
        self.metadata.touch();
    }

    // Export

    /// Convert the output and append it to [`exports`](Self::exports).
    pub fn export(&mut self) -> Result<P::Export> {
        let export = self.export_peek()?;
        self.exports.push(ExportRecord::new(export.clone()));
        self.metadata.touch();
        Ok(export)
    }

    pub fn export_with_notes(&mut self, notes: impl Into<String>) -> Result<P::Export> {
        let export = self.export_peek()?;
        self.exports
            .push(ExportRecord::with_notes(export.clone(), notes));
        self.metadata.touch();
        Ok(export)
    }

    /// Convert the output without recording it.
    pub fn export_peek(&self) -> Result<P::Export> {
        P::export(self.require_output()?, &self.config)
    }

    /// Run every validation hook against the current input and config.
    pub fn validate(&self) -> Result<()> {
        let input = self.require_input()?;
        P::validate_input(input)?;
        P::validate_config(&self.config)?;
        P::validate_input_config(input, &self.config)
    }

    // Log

    pub fn log_success(&mut self, operation: impl Into<String>) {
        self.log.push(LogEntry::success(operation));
        self.metadata.touch();
    }

    pub fn log_success_with_notes(
        &mut self,
        operation: impl Into<String>,
        notes: impl Into<String>,
    ) {
        self.log.push(LogEntry::success_with_notes(operation, notes));
        self.metadata.touch();
    }

    pub fn log_failure(&mut self, operation: impl Into<String>, error: impl Into<String>) {
        self.log.push(LogEntry::failure(operation, error));
        self.metadata.touch();
    }

    /// Drop everything except metadata and config.
    pub fn reset(&mut self) {
        self.input = None;
        self.invalidate(InvalidationPolicy::CLEAR_ALL);
        self.log.clear();
        self.metadata.touch();
    }

    // Persistence

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize session")
    }

    /// # Errors
    ///
    /// Fails on malformed JSON, on a session written for another problem
    /// type, or on a schema version newer than [`ProblemType::schema_version`].
    pub fn from_json(json: &str) -> Result<Self> {
        let session: Self = serde_json::from_str(json).context("failed to parse session")?;
        if session.metadata.problem_type != P::name() {
            bail!(
                "session holds problem type '{}', expected '{}'",
                session.metadata.problem_type,
                P::name()
            );
        }
        if session.metadata.schema_version > P::schema_version() {
            bail!(
                "session schema version {} is newer than supported version {}",
                session.metadata.schema_version,
                P::schema_version()
            );
        }
        Ok(session)
    }
}

impl<P: ProblemType> Default for ReconstructionSession<P> {
    fn default() -> Self {
        Self::new()
    }
}
