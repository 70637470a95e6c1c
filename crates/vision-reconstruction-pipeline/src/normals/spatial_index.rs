//! Compact k-d tree over the reconstructed vertices of a store.

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use vision_reconstruction_core::{Pt3, Real, ReconstructionStore, VertexId};

use super::NormalsError;

/// Dense copy of reconstructed positions plus a k-d tree over them.
///
/// Compact position `i` maps back to `ids[i]`. The index owns its data and
/// holds no borrow of the store, so it can outlive writes to the store's
/// normals while a batch runs.
///
/// The tree is bulk-built once, so exactly coplanar clouds and coincident
/// positions are indexed like any other input.
pub struct SpatialIndex {
    points: Vec<Pt3>,
    ids: Vec<VertexId>,
    tree: Option<ImmutableKdTree<Real, 3>>,
}

impl SpatialIndex {
    /// Compact the reconstructed vertices of `store` and index them.
    ///
    /// An empty cloud yields an empty index whose queries return nothing.
    pub fn build(store: &ReconstructionStore) -> Result<Self, NormalsError> {
        let count = store.reconstructed_ids().count();

        let mut points: Vec<Pt3> = Vec::new();
        points
            .try_reserve_exact(count)
            .map_err(|_| NormalsError::OutOfMemory {
                what: "compact point array",
                count,
            })?;
        let mut ids: Vec<VertexId> = Vec::new();
        ids.try_reserve_exact(count)
            .map_err(|_| NormalsError::OutOfMemory {
                what: "compact index map",
                count,
            })?;

        let mut coords: Vec<[Real; 3]> = Vec::new();
        coords
            .try_reserve_exact(count)
            .map_err(|_| NormalsError::OutOfMemory {
                what: "k-d tree input",
                count,
            })?;

        for (id, vertex) in store.vertices().filter(|(_, v)| v.reconstructed) {
            let p = vertex.position;
            coords.push([p.x, p.y, p.z]);
            points.push(p);
            ids.push(id);
        }
        // Item `i` of the tree is compact position `i`.
        let tree = (!coords.is_empty()).then(|| ImmutableKdTree::new_from_slice(&coords));

        log::debug!("spatial index built over {} reconstructed vertices", count);
        Ok(Self { points, ids, tree })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Vertex identifier of a compact position.
    pub fn vertex_id(&self, compact: usize) -> VertexId {
        self.ids[compact]
    }

    /// Position stored at a compact position.
    pub fn position(&self, compact: usize) -> &Pt3 {
        &self.points[compact]
    }

    /// Compact-position to vertex map.
    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    /// Up to `k` nearest compact entries as `(compact, squared distance)`,
    /// closest first.
    pub(crate) fn nearest_n(&self, query: &Pt3, k: usize) -> Vec<(usize, Real)> {
        let (Some(tree), Some(k)) = (self.tree.as_ref(), std::num::NonZero::new(k)) else {
            return Vec::new();
        };
        tree.nearest_n::<SquaredEuclidean>(&[query.x, query.y, query.z], k)
            .into_iter()
            .map(|nn| (nn.item as usize, nn.distance))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_reconstruction_core::synthetic::SceneBuilder;

    #[test]
    fn only_reconstructed_vertices_are_indexed() {
        let mut scene = SceneBuilder::new();
        let ids = scene
            .reconstructed_points(&[Pt3::new(0.0, 0.0, 0.0), Pt3::new(1.0, 0.0, 0.0)], &[])
            .unwrap();
        let hidden = scene.unreconstructed_vertex(&[]).unwrap();
        let late = scene
            .reconstructed_points(&[Pt3::new(2.0, 0.0, 0.0)], &[])
            .unwrap();
        let store = scene.build();

        let index = SpatialIndex::build(&store).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.ids(), &[ids[0], ids[1], late[0]]);
        assert!(!index.ids().contains(&hidden));
        assert_eq!(index.position(2), &Pt3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn empty_store_gives_empty_index() {
        let store = ReconstructionStore::new();
        let index = SpatialIndex::build(&store).unwrap();
        assert!(index.is_empty());
        assert!(index.nearest_n(&Pt3::origin(), 10).is_empty());
    }

    #[test]
    fn coplanar_and_coincident_points_are_indexed() {
        let mut scene = SceneBuilder::new();
        let mut points: Vec<Pt3> = (0..40)
            .flat_map(|i| {
                (0..40).map(move |j| Pt3::new(0.25 * i as Real, 0.25 * j as Real, 0.0))
            })
            .collect();
        points.extend(std::iter::repeat_n(Pt3::new(1.0, 1.0, 0.0), 64));
        scene.reconstructed_points(&points, &[]).unwrap();
        let index = SpatialIndex::build(&scene.build()).unwrap();
        assert_eq!(index.len(), 1600 + 64);

        let hits = index.nearest_n(&Pt3::new(1.0, 1.0, 0.0), 70);
        assert_eq!(hits.len(), 70);
        // The stacked copies plus the grid node under them.
        assert_eq!(hits.iter().filter(|h| h.1 == 0.0).count(), 65);
        assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn nearest_are_sorted_and_truncated() {
        let mut scene = SceneBuilder::new();
        let points: Vec<Pt3> = (0..5).map(|i| Pt3::new(i as Real, 0.1 * i as Real, 0.0)).collect();
        scene.reconstructed_points(&points, &[]).unwrap();
        let index = SpatialIndex::build(&scene.build()).unwrap();

        let hits = index.nearest_n(&Pt3::new(0.9, 0.0, 0.0), 200);
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].0, 1);
        assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
    }
}
