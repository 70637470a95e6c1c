//! Point cloud store.
//!
//! A [`ReconstructionStore`] owns every vertex, shot and 2D observation of a
//! reconstruction, plus the per-vertex incidence records linking a vertex to
//! the observations it was triangulated from. All tables are append-only
//! arenas: identifiers handed out by `add_*` stay valid for the lifetime of
//! the store, however much it grows.
//!
//! Mutation is split by owner:
//! - the triangulator writes positions ([`ReconstructionStore::set_position`]),
//! - the normal estimator writes normals ([`ReconstructionStore::set_normal`]),
//! - the application resets reconstruction ([`ReconstructionStore::clear_positions`]).

mod error;
mod ids;

pub use error::StoreError;
pub use ids::{PointId, ShotId, VertexId};

use serde::{Deserialize, Serialize};

use crate::{Pt2, Pt3, Real, Vec3, is_finite_vec3, is_unit_vec3};

/// A 3D vertex of the reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Position; meaningful only when `reconstructed` is set.
    pub position: Pt3,
    /// Whether the triangulator produced a valid position.
    pub reconstructed: bool,
    /// Unit surface normal, `None` until estimated.
    pub normal: Option<Vec3>,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Pt3::origin(),
            reconstructed: false,
            normal: None,
        }
    }
}

/// A camera view.
///
/// Only `t` is used by geometry code in this workspace: it is the viewing
/// reference point normals are oriented towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Whether the camera has been calibrated.
    pub calibrated: bool,
    /// Viewing reference point.
    pub t: Vec3,
}

impl Shot {
    /// Calibrated shot with reference point `t`.
    pub fn calibrated(width: u32, height: u32, t: Vec3) -> Self {
        Self {
            width,
            height,
            calibrated: true,
            t,
        }
    }

    /// Uncalibrated shot; its reference point is unknown.
    pub fn uncalibrated(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calibrated: false,
            t: Vec3::zeros(),
        }
    }

    /// Scale a normalized observation to pixel coordinates.
    pub fn to_pixel(&self, obs: &Observation) -> Pt2 {
        Pt2::new(obs.x * self.width as Real, obs.y * self.height as Real)
    }

    /// Whether `px` lies within the image bounds.
    pub fn contains_pixel(&self, px: &Pt2) -> bool {
        (0.0..=self.width as Real).contains(&px.x) && (0.0..=self.height as Real).contains(&px.y)
    }
}

/// A 2D point marked in one shot, in normalized image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub shot: ShotId,
    pub vertex: VertexId,
    pub x: Real,
    pub y: Real,
}

/// One `(shot, observation)` pair fused into a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidenceEntry {
    pub shot: ShotId,
    pub point: PointId,
}

/// Owned store of vertices, shots, observations and incidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionStore {
    vertices: Vec<Vertex>,
    shots: Vec<Shot>,
    observations: Vec<Observation>,
    incidence: Vec<Vec<IncidenceEntry>>,
}

impl ReconstructionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Growth
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an unreconstructed vertex.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex::default());
        self.incidence.push(Vec::new());
        id
    }

    /// Append a shot.
    pub fn add_shot(&mut self, shot: Shot) -> Result<ShotId, StoreError> {
        if shot.width == 0 || shot.height == 0 {
            return Err(StoreError::ZeroSizedShot {
                width: shot.width,
                height: shot.height,
            });
        }
        if !is_finite_vec3(&shot.t) {
            return Err(StoreError::NonFiniteShot);
        }
        let id = ShotId(self.shots.len());
        self.shots.push(shot);
        Ok(id)
    }

    /// Record that `shot` observes `vertex` at normalized `(x, y)`.
    ///
    /// The observation is appended to the vertex's incidence record, so
    /// incidence order follows insertion order.
    pub fn add_observation(
        &mut self,
        shot: ShotId,
        vertex: VertexId,
        x: Real,
        y: Real,
    ) -> Result<PointId, StoreError> {
        self.shot(shot).ok_or(StoreError::UnknownShot(shot))?;
        self.vertex(vertex)
            .ok_or(StoreError::UnknownVertex(vertex))?;
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return Err(StoreError::ObservationOutOfRange { x, y });
        }

        let point = PointId(self.observations.len());
        self.observations.push(Observation { shot, vertex, x, y });
        self.incidence[vertex.index()].push(IncidenceEntry { shot, point });
        Ok(point)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutators
    // ─────────────────────────────────────────────────────────────────────────

    /// Write a triangulated position and mark the vertex reconstructed.
    pub fn set_position(&mut self, vertex: VertexId, position: Pt3) -> Result<(), StoreError> {
        if !is_finite_vec3(&position.coords) {
            return Err(StoreError::NonFinitePosition(vertex));
        }
        let v = self
            .vertices
            .get_mut(vertex.index())
            .ok_or(StoreError::UnknownVertex(vertex))?;
        v.position = position;
        v.reconstructed = true;
        Ok(())
    }

    /// Reset one vertex to the unreconstructed state.
    ///
    /// The normal is left in place; it is stale until the vertex is
    /// reconstructed and estimated again.
    pub fn clear_position(&mut self, vertex: VertexId) -> Result<(), StoreError> {
        let v = self
            .vertices
            .get_mut(vertex.index())
            .ok_or(StoreError::UnknownVertex(vertex))?;
        v.position = Pt3::origin();
        v.reconstructed = false;
        Ok(())
    }

    /// Reset every vertex to the unreconstructed state. Returns how many
    /// vertices were reconstructed before the reset.
    pub fn clear_positions(&mut self) -> usize {
        let mut cleared = 0;
        for v in &mut self.vertices {
            if v.reconstructed {
                cleared += 1;
            }
            v.position = Pt3::origin();
            v.reconstructed = false;
        }
        log::debug!("cleared {} reconstructed vertices", cleared);
        cleared
    }

    /// Write a unit normal onto a reconstructed vertex.
    pub fn set_normal(&mut self, vertex: VertexId, normal: Vec3) -> Result<(), StoreError> {
        let v = self
            .vertices
            .get_mut(vertex.index())
            .ok_or(StoreError::UnknownVertex(vertex))?;
        if !v.reconstructed {
            return Err(StoreError::NotReconstructed(vertex));
        }
        if !is_unit_vec3(&normal) {
            return Err(StoreError::NonUnitNormal {
                vertex,
                norm: normal.norm(),
            });
        }
        v.normal = Some(normal);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub fn shot(&self, id: ShotId) -> Option<&Shot> {
        self.shots.get(id.index())
    }

    pub fn observation(&self, id: PointId) -> Option<&Observation> {
        self.observations.get(id.index())
    }

    /// Ordered incidence record of a vertex.
    pub fn incidence(&self, id: VertexId) -> Option<&[IncidenceEntry]> {
        self.incidence.get(id.index()).map(Vec::as_slice)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_shots(&self) -> usize {
        self.shots.len()
    }

    pub fn num_observations(&self) -> usize {
        self.observations.len()
    }

    /// All vertices with their identifiers.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId(i), v))
    }

    /// All shots with their identifiers.
    pub fn shots(&self) -> impl Iterator<Item = (ShotId, &Shot)> + '_ {
        self.shots.iter().enumerate().map(|(i, s)| (ShotId(i), s))
    }

    /// Identifiers of reconstructed vertices, in ascending order.
    pub fn reconstructed_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.reconstructed)
            .map(|(i, _)| VertexId(i))
    }

    /// Observations marked in one shot.
    pub fn shot_observations(
        &self,
        shot: ShotId,
    ) -> impl Iterator<Item = (PointId, &Observation)> + '_ {
        self.observations
            .iter()
            .enumerate()
            .filter(move |(_, o)| o.shot == shot)
            .map(|(i, o)| (PointId(i), o))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Consistency
    // ─────────────────────────────────────────────────────────────────────────

    /// Check cross references between tables.
    ///
    /// `add_*` keep the store consistent; this is meant for stores loaded
    /// from external data.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.incidence.len() != self.vertices.len() {
            return Err(StoreError::IncidenceLengthMismatch {
                vertices: self.vertices.len(),
                records: self.incidence.len(),
            });
        }
        for shot in &self.shots {
            if shot.width == 0 || shot.height == 0 {
                return Err(StoreError::ZeroSizedShot {
                    width: shot.width,
                    height: shot.height,
                });
            }
            if !is_finite_vec3(&shot.t) {
                return Err(StoreError::NonFiniteShot);
            }
        }
        for (id, v) in self.vertices() {
            if v.reconstructed && !is_finite_vec3(&v.position.coords) {
                return Err(StoreError::NonFinitePosition(id));
            }
            if let Some(n) = v.normal.filter(|n| !is_unit_vec3(n)) {
                return Err(StoreError::NonUnitNormal {
                    vertex: id,
                    norm: n.norm(),
                });
            }
        }
        for obs in &self.observations {
            self.shot(obs.shot)
                .ok_or(StoreError::UnknownShot(obs.shot))?;
            self.vertex(obs.vertex)
                .ok_or(StoreError::UnknownVertex(obs.vertex))?;
        }
        for (v, entries) in self.incidence.iter().enumerate() {
            let vertex = VertexId(v);
            for entry in entries {
                let obs = self
                    .observation(entry.point)
                    .ok_or(StoreError::UnknownObservation(entry.point))?;
                if obs.vertex != vertex || obs.shot != entry.shot {
                    return Err(StoreError::InconsistentIncidence {
                        vertex,
                        point: entry.point,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_view_store() -> (ReconstructionStore, ShotId, ShotId, VertexId) {
        let mut store = ReconstructionStore::new();
        let s0 = store.add_shot(Shot::uncalibrated(640, 480)).unwrap();
        let s1 = store
            .add_shot(Shot::calibrated(640, 480, Vec3::new(0.0, 0.0, 2.0)))
            .unwrap();
        let v = store.add_vertex();
        store.add_observation(s0, v, 0.25, 0.5).unwrap();
        store.add_observation(s1, v, 0.75, 0.5).unwrap();
        (store, s0, s1, v)
    }

    #[test]
    fn ids_are_stable_while_growing() {
        let (mut store, _, _, v) = two_view_store();
        for _ in 0..100 {
            store.add_vertex();
        }
        assert_eq!(v, VertexId(0));
        assert_eq!(store.num_vertices(), 101);
        assert_eq!(store.incidence(v).unwrap().len(), 2);
    }

    #[test]
    fn incidence_keeps_insertion_order() {
        let (store, s0, s1, v) = two_view_store();
        let entries = store.incidence(v).unwrap();
        assert_eq!(entries[0].shot, s0);
        assert_eq!(entries[1].shot, s1);
        assert_eq!(store.observation(entries[1].point).unwrap().x, 0.75);
    }

    #[test]
    fn add_observation_validates_references() {
        let (mut store, s0, _, v) = two_view_store();
        assert_eq!(
            store.add_observation(ShotId(9), v, 0.5, 0.5),
            Err(StoreError::UnknownShot(ShotId(9)))
        );
        assert_eq!(
            store.add_observation(s0, VertexId(9), 0.5, 0.5),
            Err(StoreError::UnknownVertex(VertexId(9)))
        );
        assert!(matches!(
            store.add_observation(s0, v, 1.5, 0.5),
            Err(StoreError::ObservationOutOfRange { .. })
        ));
    }

    #[test]
    fn zero_sized_shot_rejected() {
        let mut store = ReconstructionStore::new();
        assert!(matches!(
            store.add_shot(Shot::uncalibrated(0, 480)),
            Err(StoreError::ZeroSizedShot { .. })
        ));
    }

    #[test]
    fn set_normal_requires_reconstruction_and_unit_length() {
        let (mut store, _, _, v) = two_view_store();
        assert_eq!(
            store.set_normal(v, Vec3::z()),
            Err(StoreError::NotReconstructed(v))
        );

        store.set_position(v, Pt3::new(1.0, 2.0, 3.0)).unwrap();
        assert!(matches!(
            store.set_normal(v, Vec3::new(0.0, 0.0, 2.0)),
            Err(StoreError::NonUnitNormal { .. })
        ));
        store.set_normal(v, Vec3::z()).unwrap();
        assert_eq!(store.vertex(v).unwrap().normal, Some(Vec3::z()));
    }

    #[test]
    fn clear_positions_leaves_stale_normals() {
        let (mut store, _, _, v) = two_view_store();
        store.set_position(v, Pt3::new(1.0, 2.0, 3.0)).unwrap();
        store.set_normal(v, Vec3::x()).unwrap();

        assert_eq!(store.clear_positions(), 1);
        let vertex = store.vertex(v).unwrap();
        assert!(!vertex.reconstructed);
        assert_eq!(vertex.position, Pt3::origin());
        assert_eq!(vertex.normal, Some(Vec3::x()));
        assert_eq!(store.reconstructed_ids().count(), 0);
    }

    #[test]
    fn non_finite_position_rejected() {
        let (mut store, _, _, v) = two_view_store();
        assert_eq!(
            store.set_position(v, Pt3::new(f64::NAN, 0.0, 0.0)),
            Err(StoreError::NonFinitePosition(v))
        );
        assert!(!store.vertex(v).unwrap().reconstructed);
    }

    #[test]
    fn shot_pixel_scaling() {
        let (store, s0, _, _) = two_view_store();
        let shot = store.shot(s0).unwrap();
        let (_, obs) = store.shot_observations(s0).next().unwrap();
        let px = shot.to_pixel(obs);
        assert_eq!(px, Pt2::new(160.0, 240.0));
        assert!(shot.contains_pixel(&px));
        assert!(!shot.contains_pixel(&Pt2::new(700.0, 10.0)));
    }

    #[test]
    fn json_roundtrip_validates() {
        let (mut store, _, _, v) = two_view_store();
        store.set_position(v, Pt3::new(0.5, 0.5, 0.0)).unwrap();

        let json = serde_json::to_string(&store).unwrap();
        let restored: ReconstructionStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, store);
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn validate_detects_dangling_incidence() {
        let (store, _, _, _) = two_view_store();
        let mut value = serde_json::to_value(&store).unwrap();
        value["incidence"][0][0]["point"] = serde_json::json!(42);
        let broken: ReconstructionStore = serde_json::from_value(value).unwrap();
        assert_eq!(
            broken.validate(),
            Err(StoreError::UnknownObservation(PointId(42)))
        );
    }
}
