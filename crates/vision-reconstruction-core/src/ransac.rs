//! Model-agnostic random sample consensus.
//!
//! A model type plugs in through [`Estimator`]; [`ransac`] draws minimal
//! samples from the data and keeps the hypothesis with the largest support.
//!
//! The loop never panics on failure: when consensus is not found, [`ransac`]
//! returns a [`RansacResult`] with `success == false` and `model == None`.
//! Runs are fully determined by `opts.seed`.

use rand::seq::index;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling and acceptance parameters for [`ransac`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RansacOptions {
    /// Hard cap on sampled hypotheses.
    pub max_iters: usize,
    /// Residual at or below which a datum supports a model.
    pub thresh: f64,
    /// Support needed before a hypothesis is considered.
    pub min_inliers: usize,
    /// Probability in `[0, 1)` of having drawn one all-inlier sample; drives early exit.
    pub confidence: f64,
    /// Seed for the sample generator.
    pub seed: u64,
    /// Re-estimate each accepted hypothesis from its full support.
    pub refit_on_inliers: bool,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            thresh: 2.0,
            min_inliers: 12,
            confidence: 0.99,
            seed: 1_234_567,
            refit_on_inliers: true,
        }
    }
}

/// Invalid [`RansacOptions`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RansacOptionsError {
    #[error("max_iters must be positive")]
    ZeroIterations,
    #[error("inlier threshold must be finite and non-negative, got {0}")]
    BadThreshold(f64),
    #[error("confidence must lie in [0, 1), got {0}")]
    BadConfidence(f64),
}

impl RansacOptions {
    /// Check option ranges.
    pub fn validate(&self) -> Result<(), RansacOptionsError> {
        if self.max_iters == 0 {
            return Err(RansacOptionsError::ZeroIterations);
        }
        if !self.thresh.is_finite() || self.thresh < 0.0 {
            return Err(RansacOptionsError::BadThreshold(self.thresh));
        }
        if !(0.0..1.0).contains(&self.confidence) {
            return Err(RansacOptionsError::BadConfidence(self.confidence));
        }
        Ok(())
    }
}

/// Best hypothesis of a run.
///
/// When [`success`](Self::success) is `false` there is no model and the
/// remaining fields carry no meaning.
#[derive(Debug, Clone)]
pub struct RansacResult<M> {
    /// A hypothesis reached `min_inliers`.
    pub success: bool,
    /// Winning model.
    pub model: Option<M>,
    /// Data indices supporting the model.
    pub inliers: Vec<usize>,
    /// RMS residual of the supporting data.
    pub inlier_rms: f64,
    /// Hypotheses drawn before stopping.
    pub iters: usize,
}

impl<M> Default for RansacResult<M> {
    fn default() -> Self {
        Self {
            success: false,
            model: None,
            inliers: Vec::new(),
            inlier_rms: f64::INFINITY,
            iters: 0,
        }
    }
}

impl<M> RansacResult<M> {
    /// Fraction of `total` data points that ended up as inliers.
    pub fn inlier_ratio(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        self.inliers.len() as f64 / total as f64
    }
}

/// A model that can be hypothesised from a minimal sample and scored per datum.
pub trait Estimator {
    type Datum;
    type Model;

    /// Sample size of one hypothesis.
    const MIN_SAMPLES: usize;

    /// Hypothesis from the sampled indices, `None` when they do not define one.
    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model>;

    /// Non-negative residual in the units of [`RansacOptions::thresh`].
    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64;

    /// Reject a sample before fitting.
    fn is_degenerate(_data: &[Self::Datum], _sample_indices: &[usize]) -> bool {
        false
    }

    /// Least-squares style re-estimate over a support set. `None` keeps the
    /// minimal-sample hypothesis.
    fn refit(_data: &[Self::Datum], _inliers: &[usize]) -> Option<Self::Model> {
        None
    }
}

fn rms(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::INFINITY;
    }
    let ss: f64 = vals.iter().map(|&v| v * v).sum();
    (ss / (vals.len() as f64)).sqrt()
}

/// Iterations still needed at the observed inlier ratio.
fn adaptive_iteration_bound(
    confidence: f64,
    inlier_ratio: f64,
    min_samples: usize,
    iters_so_far: usize,
    max_iters: usize,
) -> usize {
    if confidence <= 0.0 || inlier_ratio <= 0.0 {
        return max_iters;
    }

    let denom = (1.0 - inlier_ratio.powf(min_samples as f64))
        .max(1e-12)
        .ln();
    if denom >= 0.0 {
        return max_iters;
    }

    let n_iter = ((1.0 - confidence).ln() / denom).ceil() as usize;
    n_iter.clamp(iters_so_far, max_iters)
}

fn improves_on<M>(best: &RansacResult<M>, inlier_count: usize, inlier_rms: f64) -> bool {
    !best.success
        || inlier_count > best.inliers.len()
        || (inlier_count == best.inliers.len() && inlier_rms < best.inlier_rms)
}

/// Collect indices and residuals of all data within `thresh` of `model`.
fn score<E: Estimator>(
    data: &[E::Datum],
    model: &E::Model,
    thresh: f64,
    inliers: &mut Vec<usize>,
    residuals: &mut Vec<f64>,
) {
    inliers.clear();
    residuals.clear();
    for (i, datum) in data.iter().enumerate() {
        let r = E::residual(model, datum);
        if r <= thresh {
            inliers.push(i);
            residuals.push(r);
        }
    }
}

/// Search `data` for the model with the largest support.
///
/// Too little data, or no hypothesis reaching `min_inliers` within the
/// iteration budget, yields an unsuccessful result.
pub fn ransac<E: Estimator>(data: &[E::Datum], opts: &RansacOptions) -> RansacResult<E::Model> {
    let mut best: RansacResult<E::Model> = RansacResult::default();

    if data.len() < E::MIN_SAMPLES || E::MIN_SAMPLES == 0 {
        return best;
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut sample_idxs = Vec::with_capacity(E::MIN_SAMPLES);

    let mut inliers = Vec::with_capacity(data.len());
    let mut residuals = Vec::with_capacity(data.len());
    let mut refined_inliers = Vec::with_capacity(data.len());
    let mut refined_residuals = Vec::with_capacity(data.len());

    let mut dynamic_max_iters = opts.max_iters;
    let mut num_iters = 0;
    while num_iters < dynamic_max_iters {
        num_iters += 1;

        sample_idxs.clear();
        sample_idxs.extend(index::sample(&mut rng, data.len(), E::MIN_SAMPLES).iter());

        if E::is_degenerate(data, &sample_idxs) {
            continue;
        }
        let Some(model) = E::fit(data, &sample_idxs) else {
            continue;
        };

        score::<E>(data, &model, opts.thresh, &mut inliers, &mut residuals);
        if inliers.len() < opts.min_inliers {
            continue;
        }

        let mut candidate = model;
        let mut use_refined = false;
        if opts.refit_on_inliers {
            if let Some(refit) = E::refit(data, &inliers) {
                score::<E>(
                    data,
                    &refit,
                    opts.thresh,
                    &mut refined_inliers,
                    &mut refined_residuals,
                );
                // A refit that loses support is discarded.
                if refined_inliers.len() >= inliers.len() {
                    candidate = refit;
                    use_refined = true;
                }
            }
        }
        let (final_inliers, final_residuals) = if use_refined {
            (&refined_inliers, &refined_residuals)
        } else {
            (&inliers, &residuals)
        };

        let final_rms = rms(final_residuals);
        if improves_on(&best, final_inliers.len(), final_rms) {
            best.success = true;
            best.model = Some(candidate);
            best.inliers.clone_from(final_inliers);
            best.inlier_rms = final_rms;
        }

        let inlier_ratio = final_inliers.len() as f64 / data.len() as f64;
        dynamic_max_iters = adaptive_iteration_bound(
            opts.confidence,
            inlier_ratio,
            E::MIN_SAMPLES,
            num_iters,
            opts.max_iters,
        );
    }
    best.iters = num_iters;

    best
}
