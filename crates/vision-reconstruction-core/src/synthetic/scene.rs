//! Synthetic scenes: planar patches, noise blobs and observing shots.

use anyhow::{Context, Result};

use super::noise::{UniformPointNoise, unit_sample};
use crate::{Plane, Pt3, Real, ReconstructionStore, Shot, ShotId, Vec3, VertexId};

/// `nx × ny` grid with the given spacing, lying on `plane` and centred on the
/// projection of `center` onto it.
pub fn grid_on_plane(plane: &Plane, center: &Pt3, nx: usize, ny: usize, spacing: Real) -> Vec<Pt3> {
    let n = plane.normal;
    let helper = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    let u = n.cross(&helper).normalize();
    let v = n.cross(&u);

    let origin = center - n * plane.signed_distance(&center.coords);
    let half_x = (nx.saturating_sub(1)) as Real * spacing * 0.5;
    let half_y = (ny.saturating_sub(1)) as Real * spacing * 0.5;

    let mut points = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let a = i as Real * spacing - half_x;
            let b = j as Real * spacing - half_y;
            points.push(origin + u * a + v * b);
        }
    }
    points
}

/// `n` points scattered uniformly in a cube of half-size `radius` around `center`.
pub fn noise_blob(center: &Pt3, radius: Real, n: usize, seed: u64) -> Vec<Pt3> {
    let noise = UniformPointNoise::new(seed, radius);
    (0..n).map(|i| center + noise.sample(0, i)).collect()
}

/// Copy of `points` with a deterministic per-point offset applied.
///
/// Perfectly regular grids share coordinates along whole rows; a tiny jitter
/// keeps k-d tree buckets splittable.
pub fn jittered(points: &[Pt3], noise: &UniformPointNoise) -> Vec<Pt3> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| p + noise.sample(1, i))
        .collect()
}

/// Incrementally assemble a [`ReconstructionStore`].
///
/// Observations are given deterministic normalized image coordinates; only
/// their shot and vertex links matter to downstream geometry.
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    store: ReconstructionStore,
    seed: u64,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed for the synthetic image coordinates.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn shot(&mut self, shot: Shot) -> Result<ShotId> {
        self.store.add_shot(shot).context("invalid synthetic shot")
    }

    /// Add one reconstructed vertex per point, observed by `observers` in order.
    pub fn reconstructed_points(
        &mut self,
        points: &[Pt3],
        observers: &[ShotId],
    ) -> Result<Vec<VertexId>> {
        points
            .iter()
            .map(|p| {
                let v = self.observed_vertex(observers)?;
                self.store.set_position(v, *p)?;
                Ok(v)
            })
            .collect()
    }

    /// Add a vertex that has observations but no triangulated position.
    pub fn unreconstructed_vertex(&mut self, observers: &[ShotId]) -> Result<VertexId> {
        self.observed_vertex(observers)
    }

    pub fn store(&self) -> &ReconstructionStore {
        &self.store
    }

    pub fn build(self) -> ReconstructionStore {
        self.store
    }

    fn observed_vertex(&mut self, observers: &[ShotId]) -> Result<VertexId> {
        let v = self.store.add_vertex();
        for shot in observers {
            let x = unit_sample(self.seed, shot.index(), 2 * v.index());
            let y = unit_sample(self.seed, shot.index(), 2 * v.index() + 1);
            self.store
                .add_observation(*shot, v, x, y)
                .with_context(|| format!("failed to observe {v} from {shot}"))?;
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_points_lie_on_plane() {
        let plane = Plane::from_coefficients(0.3, -0.2, 1.0, 0.7).unwrap();
        let points = grid_on_plane(&plane, &Pt3::new(1.0, 2.0, 3.0), 5, 4, 0.1);
        assert_eq!(points.len(), 20);
        for p in &points {
            assert!(plane.distance(p) < 1e-12, "distance {}", plane.distance(p));
        }
        let spread = (points[0] - points[19]).norm();
        assert!((spread - (0.4f64.powi(2) + 0.3f64.powi(2)).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn noise_blob_is_bounded() {
        let center = Pt3::new(1.0, 1.0, 1.0);
        let blob = noise_blob(&center, 0.5, 50, 9);
        assert_eq!(blob.len(), 50);
        assert!(blob.iter().all(|p| (p - center).amax() <= 0.5));
    }

    #[test]
    fn builder_links_observations() -> Result<()> {
        let mut scene = SceneBuilder::new().with_seed(3);
        let s0 = scene.shot(Shot::calibrated(100, 100, Vec3::z()))?;
        let s1 = scene.shot(Shot::uncalibrated(100, 100))?;
        let ids = scene.reconstructed_points(&[Pt3::origin(), Pt3::new(1.0, 0.0, 0.0)], &[s1, s0])?;
        let hidden = scene.unreconstructed_vertex(&[s0])?;
        let store = scene.build();

        assert_eq!(ids.len(), 2);
        assert_eq!(store.num_observations(), 5);
        assert_eq!(store.incidence(ids[1]).unwrap()[0].shot, s1);
        assert!(!store.vertex(hidden).unwrap().reconstructed);
        assert!(store.validate().is_ok());
        Ok(())
    }
}
