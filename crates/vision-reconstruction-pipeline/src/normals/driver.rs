//! Batch normal estimation over every reconstructed vertex.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use vision_reconstruction_core::{ReconstructionStore, VertexId};
use vision_reconstruction_linear::{PlaneFitError, PlaneFitter};

use super::{
    Neighbor, NeighborhoodQuery, NormalsConfig, NormalsError, OrientedNormal, SpatialIndex,
    resolve_orientation,
};

/// Receives coarse progress heartbeats from a batch.
pub trait ProgressSink: Sync {
    fn progress(&self, done: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Sync,
{
    fn progress(&self, done: usize, total: usize) {
        self(done, total)
    }
}

/// Progress sink that reports through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn progress(&self, done: usize, total: usize) {
        log::info!("normals: {}/{} vertices", done, total);
    }
}

/// Shared flag to stop a running batch between vertices.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Terminal state of one vertex in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexOutcome {
    Oriented(OrientedNormal),
    /// The vertex is alone in its neighborhood.
    NoNeighbors,
    PlaneFitFailed(PlaneFitError),
}

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalsSummary {
    /// Reconstructed vertices at batch start.
    pub reconstructed: usize,
    /// Vertices the batch reached.
    pub attempted: usize,
    /// Vertices that received a normal.
    pub oriented: usize,
    /// Oriented vertices whose fitted normal was negated.
    pub flipped: usize,
    /// Oriented vertices without a calibrated observer (fitted sign kept).
    pub without_calibrated_observer: usize,
    pub skipped_no_neighbors: usize,
    pub skipped_plane_fit: usize,
    /// Whether the batch stopped before reaching every vertex.
    pub cancelled: bool,
}

impl NormalsSummary {
    pub fn processed(&self) -> usize {
        self.oriented
    }

    pub fn skipped(&self) -> usize {
        self.skipped_no_neighbors + self.skipped_plane_fit
    }
}

/// Per-worker buffers reused across vertices.
#[derive(Default)]
struct Scratch {
    neighbors: Vec<Neighbor>,
    candidates: Vec<VertexId>,
}

impl Scratch {
    fn with_capacity(k: usize) -> Self {
        Self {
            neighbors: Vec::with_capacity(k),
            candidates: Vec::with_capacity(k),
        }
    }
}

/// Estimate the oriented normal of one indexed vertex.
///
/// The candidate list handed to the fitter starts with `target` itself,
/// followed by its other neighbors by increasing distance.
fn estimate_vertex(
    store: &ReconstructionStore,
    query: &NeighborhoodQuery<'_>,
    compact: usize,
    fitter: &dyn PlaneFitter,
    config: &NormalsConfig,
    scratch: &mut Scratch,
) -> (VertexId, VertexOutcome) {
    let index = query.index();
    let target = index.vertex_id(compact);
    query.query_into(index.position(compact), &mut scratch.neighbors);

    scratch.candidates.clear();
    scratch.candidates.push(target);
    scratch.candidates.extend(
        scratch
            .neighbors
            .iter()
            .map(|n| n.vertex)
            .filter(|&v| v != target)
            .take(query.k().saturating_sub(1)),
    );
    if scratch.candidates.len() < 2 {
        return (target, VertexOutcome::NoNeighbors);
    }

    let plane = match fitter.fit_plane(store, &scratch.candidates) {
        Ok(plane) => plane,
        Err(e) => return (target, VertexOutcome::PlaneFitFailed(e)),
    };
    let incidence = store.incidence(target).unwrap_or_default();
    let outcome = match resolve_orientation(&plane, incidence, store, config.orientation) {
        Some(oriented) => VertexOutcome::Oriented(oriented),
        None => VertexOutcome::PlaneFitFailed(PlaneFitError::NonFinite(plane.normal.norm())),
    };
    (target, outcome)
}

fn apply_outcome(
    store: &mut ReconstructionStore,
    target: VertexId,
    outcome: VertexOutcome,
    summary: &mut NormalsSummary,
) -> Result<(), NormalsError> {
    summary.attempted += 1;
    match outcome {
        VertexOutcome::Oriented(oriented) => {
            store.set_normal(target, oriented.normal)?;
            summary.oriented += 1;
            if oriented.flipped {
                summary.flipped += 1;
            }
            if oriented.reference.is_none() {
                summary.without_calibrated_observer += 1;
            }
        }
        VertexOutcome::NoNeighbors => {
            log::debug!("{}: no reconstructed neighbors, skipped", target);
            summary.skipped_no_neighbors += 1;
        }
        VertexOutcome::PlaneFitFailed(e) => {
            log::debug!("{}: plane fit failed: {}", target, e);
            summary.skipped_plane_fit += 1;
        }
    }
    Ok(())
}

/// One normal estimation pass over a store.
///
/// ```
/// use vision_reconstruction_linear::RansacPlaneFitter;
/// use vision_reconstruction_pipeline::normals::{LogProgress, NormalsBatch, NormalsConfig};
/// use vision_reconstruction_core::ReconstructionStore;
///
/// let mut store = ReconstructionStore::new();
/// let config = NormalsConfig::default();
/// let fitter = RansacPlaneFitter::new(config.plane_fit.clone());
/// let summary = NormalsBatch::new(&config)
///     .with_progress(&LogProgress)
///     .run(&mut store, &fitter)
///     .unwrap();
/// assert_eq!(summary.attempted, 0);
/// ```
pub struct NormalsBatch<'a> {
    config: &'a NormalsConfig,
    progress: Option<&'a dyn ProgressSink>,
    cancel: Option<CancelToken>,
}

impl<'a> NormalsBatch<'a> {
    pub fn new(config: &'a NormalsConfig) -> Self {
        Self {
            config,
            progress: None,
            cancel: None,
        }
    }

    pub fn with_progress(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn report(&self, done: usize, total: usize) {
        if let Some(sink) = self.progress {
            sink.progress(done, total);
        }
    }

    /// Estimate normals for every reconstructed vertex of `store`.
    ///
    /// Only index allocation failures and invalid configuration abort the
    /// batch. Vertices that cannot be fitted keep whatever normal they had.
    pub fn run(
        &self,
        store: &mut ReconstructionStore,
        fitter: &dyn PlaneFitter,
    ) -> Result<NormalsSummary, NormalsError> {
        self.config.validate()?;

        let index = SpatialIndex::build(store)?;
        let total = index.len();
        let mut summary = NormalsSummary {
            reconstructed: total,
            ..NormalsSummary::default()
        };
        if total == 0 {
            log::info!("normals: no reconstructed vertices");
            return Ok(summary);
        }

        log::info!(
            "normals: estimating {} vertices (k = {}, {})",
            total,
            self.config.k,
            if self.config.parallel {
                "parallel"
            } else {
                "sequential"
            }
        );
        let query = NeighborhoodQuery::new(&index, self.config.k);

        if self.config.parallel {
            self.run_parallel(store, &query, fitter, &mut summary)?;
        } else {
            self.run_sequential(store, &query, fitter, &mut summary)?;
        }

        if summary.cancelled {
            log::warn!(
                "normals: cancelled after {}/{} vertices",
                summary.attempted,
                total
            );
        }
        log::info!(
            "normals: {} oriented ({} flipped), {} skipped ({} without neighbors, {} failed fits)",
            summary.oriented,
            summary.flipped,
            summary.skipped(),
            summary.skipped_no_neighbors,
            summary.skipped_plane_fit
        );
        Ok(summary)
    }

    fn run_sequential(
        &self,
        store: &mut ReconstructionStore,
        query: &NeighborhoodQuery<'_>,
        fitter: &dyn PlaneFitter,
        summary: &mut NormalsSummary,
    ) -> Result<(), NormalsError> {
        let total = query.index().len();
        let interval = self.config.progress_interval;
        let mut scratch = Scratch::with_capacity(self.config.k);

        for compact in 0..total {
            if self.cancelled() {
                summary.cancelled = true;
                break;
            }
            let (target, outcome) =
                estimate_vertex(store, query, compact, fitter, self.config, &mut scratch);
            apply_outcome(store, target, outcome, summary)?;

            let done = compact + 1;
            if done % interval == 0 || done == total {
                self.report(done, total);
            }
        }
        Ok(())
    }

    fn run_parallel(
        &self,
        store: &mut ReconstructionStore,
        query: &NeighborhoodQuery<'_>,
        fitter: &dyn PlaneFitter,
        summary: &mut NormalsSummary,
    ) -> Result<(), NormalsError> {
        let total = query.index().len();
        let interval = self.config.progress_interval;
        let done = AtomicUsize::new(0);

        let outcomes: Vec<Option<(VertexId, VertexOutcome)>> = {
            let shared: &ReconstructionStore = store;
            (0..total)
                .into_par_iter()
                .map_init(
                    || Scratch::with_capacity(self.config.k),
                    |scratch, compact| {
                        if self.cancelled() {
                            return None;
                        }
                        let result =
                            estimate_vertex(shared, query, compact, fitter, self.config, scratch);
                        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                        if n % interval == 0 || n == total {
                            self.report(n, total);
                        }
                        Some(result)
                    },
                )
                .collect()
        };

        for item in outcomes {
            match item {
                Some((target, outcome)) => apply_outcome(store, target, outcome, summary)?,
                None => summary.cancelled = true,
            }
        }
        Ok(())
    }
}

/// Run a batch with default reporting through the `log` facade.
pub fn compute_normals(
    store: &mut ReconstructionStore,
    fitter: &dyn PlaneFitter,
    config: &NormalsConfig,
) -> Result<NormalsSummary, NormalsError> {
    NormalsBatch::new(config)
        .with_progress(&LogProgress)
        .run(store, fitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use vision_reconstruction_core::synthetic::{SceneBuilder, grid_on_plane};
    use vision_reconstruction_core::{Plane, Pt3, Shot, Vec3};
    use vision_reconstruction_linear::RansacPlaneFitter;

    fn patch_store(nx: usize, ny: usize) -> ReconstructionStore {
        let plane = Plane::new(Vec3::z(), 0.0);
        let points = grid_on_plane(&plane, &Pt3::origin(), nx, ny, 0.1);
        let mut scene = SceneBuilder::new();
        let shot = scene
            .shot(Shot::calibrated(640, 480, Vec3::new(0.0, 0.0, 5.0)))
            .unwrap();
        scene.reconstructed_points(&points, &[shot]).unwrap();
        scene.build()
    }

    fn fixed_fitter(_: &ReconstructionStore, _: &[VertexId]) -> Result<Plane, PlaneFitError> {
        Ok(Plane::new(-Vec3::z(), 0.0))
    }

    #[test]
    fn progress_is_reported_every_interval() {
        let mut store = patch_store(5, 5);
        let config = NormalsConfig {
            k: 8,
            progress_interval: 10,
            ..NormalsConfig::default()
        };
        let calls = Mutex::new(Vec::new());
        let sink = |done: usize, total: usize| calls.lock().unwrap().push((done, total));

        let summary = NormalsBatch::new(&config)
            .with_progress(&sink)
            .run(&mut store, &fixed_fitter)
            .unwrap();

        assert_eq!(summary.attempted, 25);
        assert_eq!(*calls.lock().unwrap(), vec![(10, 25), (20, 25), (25, 25)]);
    }

    #[test]
    fn fixed_plane_is_flipped_toward_camera() {
        let mut store = patch_store(4, 4);
        let config = NormalsConfig {
            k: 6,
            ..NormalsConfig::default()
        };
        let summary = NormalsBatch::new(&config)
            .run(&mut store, &fixed_fitter)
            .unwrap();

        assert_eq!(summary.oriented, 16);
        assert_eq!(summary.flipped, 16);
        for (_, v) in store.vertices() {
            assert_eq!(v.normal, Some(Vec3::z()));
        }
    }

    #[test]
    fn cancelled_batch_stops_between_vertices() {
        let mut store = patch_store(5, 5);
        let config = NormalsConfig {
            k: 8,
            ..NormalsConfig::default()
        };
        let token = CancelToken::new();
        let trigger = token.clone();
        let fitter = move |_: &ReconstructionStore, c: &[VertexId]| -> Result<Plane, PlaneFitError> {
            // Request cancellation while the fifth vertex is in flight.
            if c[0] == VertexId(4) {
                trigger.cancel();
            }
            Ok(Plane::new(Vec3::z(), 0.0))
        };

        let summary = NormalsBatch::new(&config)
            .with_cancel(token)
            .run(&mut store, &fitter)
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.attempted, 5);
        let written = store.vertices().filter(|(_, v)| v.normal.is_some()).count();
        assert_eq!(written, 5);
    }

    #[test]
    fn parallel_matches_sequential() {
        let config = NormalsConfig {
            k: 12,
            ..NormalsConfig::default()
        };
        let fitter = RansacPlaneFitter::new(config.plane_fit.clone());

        let mut seq = patch_store(6, 6);
        let seq_summary = NormalsBatch::new(&config).run(&mut seq, &fitter).unwrap();

        let par_config = NormalsConfig {
            parallel: true,
            ..config.clone()
        };
        let mut par = patch_store(6, 6);
        let par_summary = NormalsBatch::new(&par_config)
            .run(&mut par, &fitter)
            .unwrap();

        assert_eq!(seq_summary, par_summary);
        assert_eq!(seq, par);
    }

    #[test]
    fn invalid_config_aborts_before_work() {
        let mut store = patch_store(3, 3);
        let config = NormalsConfig {
            k: 1,
            ..NormalsConfig::default()
        };
        let err = compute_normals(&mut store, &fixed_fitter, &config).unwrap_err();
        assert!(matches!(err, NormalsError::InvalidConfig(_)));
        assert!(store.vertices().all(|(_, v)| v.normal.is_none()));
    }

    #[test]
    fn summary_helpers() {
        let summary = NormalsSummary {
            oriented: 4,
            skipped_no_neighbors: 1,
            skipped_plane_fit: 2,
            ..NormalsSummary::default()
        };
        assert_eq!(summary.processed(), 4);
        assert_eq!(summary.skipped(), 3);
    }
}
