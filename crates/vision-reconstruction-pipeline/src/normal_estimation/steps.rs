//! Step functions for vertex normal estimation.

use anyhow::{Context, Result};
use vision_reconstruction_linear::RansacPlaneFitter;

use crate::normals::{CancelToken, LogProgress, NormalsBatch, NormalsConfig, NormalsSummary};
use crate::session::ReconstructionSession;
use crate::triangulation::{TriangulationOptions, Triangulator};

use super::problem::{NormalEstimationOutput, NormalEstimationProblem};

type Session = ReconstructionSession<NormalEstimationProblem>;

/// Per-call overrides for [`step_compute_normals`].
#[derive(Debug, Clone, Default)]
pub struct ComputeNormalsOptions {
    /// Override the neighborhood size.
    pub k: Option<usize>,
    /// Override sequential/parallel execution.
    pub parallel: Option<bool>,
    /// Token to stop the batch from another thread.
    pub cancel: Option<CancelToken>,
}

fn summary_notes(summary: &NormalsSummary) -> String {
    format!(
        "{}/{} oriented, {} flipped, {} skipped{}",
        summary.oriented,
        summary.reconstructed,
        summary.flipped,
        summary.skipped(),
        if summary.cancelled { ", cancelled" } else { "" }
    )
}

fn invalidate_normals(session: &mut Session) {
    session.state.clear_normals();
    session.clear_output();
}

/// Recompute vertex positions with an external triangulator.
///
/// Any previous normal output is dropped since positions may have moved.
pub fn step_triangulate(
    session: &mut Session,
    triangulator: &dyn Triangulator,
    opts: &TriangulationOptions,
) -> Result<()> {
    opts.validate().context("invalid triangulation options")?;
    let store = session.require_input_mut()?;

    match triangulator.triangulate(store, opts) {
        Ok(reconstructed) => {
            log::info!("triangulation: {} vertices reconstructed", reconstructed);
            session.state.triangulated = Some(reconstructed);
            invalidate_normals(session);
            session.log_success_with_notes(
                "triangulate",
                format!("{reconstructed} vertices reconstructed"),
            );
            Ok(())
        }
        Err(e) => {
            // The triangulator may have written some positions before failing.
            invalidate_normals(session);
            session.log_failure("triangulate", format!("{e:#}"));
            Err(e.context("triangulation failed"))
        }
    }
}

/// Forget every vertex position.
///
/// Normals stay on the vertices but are stale; the next batch skips them
/// until they are reconstructed again.
pub fn step_clear_positions(session: &mut Session) -> Result<()> {
    let cleared = session.require_input_mut()?.clear_positions();
    session.state.triangulated = Some(0);
    invalidate_normals(session);
    session.log_success_with_notes("clear_positions", format!("{cleared} vertices cleared"));
    Ok(())
}

/// Estimate oriented normals for every reconstructed vertex of the input.
///
/// Normals are written onto the input store; the output holds a snapshot of
/// them together with the batch summary. A cancelled batch still records its
/// summary in the state but produces no output.
pub fn step_compute_normals(
    session: &mut Session,
    opts: Option<ComputeNormalsOptions>,
) -> Result<()> {
    session.validate()?;
    let opts = opts.unwrap_or_default();

    let mut config: NormalsConfig = session.config.clone();
    if let Some(k) = opts.k {
        config.k = k;
    }
    if let Some(parallel) = opts.parallel {
        config.parallel = parallel;
    }
    let fitter = RansacPlaneFitter::new(config.plane_fit.clone());

    let mut batch = NormalsBatch::new(&config).with_progress(&LogProgress);
    if let Some(token) = opts.cancel {
        batch = batch.with_cancel(token);
    }

    let result = {
        let store = session.require_input_mut()?;
        batch
            .run(store, &fitter)
            .map(|summary| (NormalEstimationOutput::collect(store, summary.clone()), summary))
    };

    let (output, summary) = match result {
        Ok(done) => done,
        Err(e) => {
            session.log_failure("compute_normals", e.to_string());
            return Err(e).context("normal estimation failed");
        }
    };

    session.state.batches += 1;
    session.state.last_summary = Some(summary.clone());
    if summary.cancelled {
        session.clear_output();
        session.log_failure("compute_normals", summary_notes(&summary));
        return Ok(());
    }
    session.set_output(output);
    session.log_success_with_notes("compute_normals", summary_notes(&summary));
    Ok(())
}

/// Run normal estimation with an optional config replacement.
pub fn run_normals(session: &mut Session, config: Option<NormalsConfig>) -> Result<()> {
    if let Some(cfg) = config {
        session.set_config(cfg)?;
    }
    step_compute_normals(session, None)
}
