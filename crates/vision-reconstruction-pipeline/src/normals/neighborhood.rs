use vision_reconstruction_core::{Pt3, Real, VertexId};

use super::SpatialIndex;

/// A reconstructed vertex near a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub vertex: VertexId,
    /// Euclidean distance to the query point.
    pub distance: Real,
}

/// K-nearest-neighbor queries against a [`SpatialIndex`].
///
/// Results are sorted by ascending distance and truncated to what the index
/// actually holds; a query never pads with placeholder entries. A vertex in
/// the index is its own nearest neighbor at distance zero.
#[derive(Clone, Copy)]
pub struct NeighborhoodQuery<'a> {
    index: &'a SpatialIndex,
    k: usize,
}

impl<'a> NeighborhoodQuery<'a> {
    pub fn new(index: &'a SpatialIndex, k: usize) -> Self {
        Self { index, k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn index(&self) -> &'a SpatialIndex {
        self.index
    }

    /// Fill `out` with up to `k` neighbors of `point`, reusing its allocation.
    pub fn query_into(&self, point: &Pt3, out: &mut Vec<Neighbor>) {
        out.clear();
        out.extend(
            self.index
                .nearest_n(point, self.k)
                .into_iter()
                .map(|(compact, d2)| Neighbor {
                    vertex: self.index.vertex_id(compact),
                    distance: d2.sqrt(),
                }),
        );
    }

    pub fn query(&self, point: &Pt3) -> Vec<Neighbor> {
        let mut out = Vec::with_capacity(self.k.min(self.index.len()));
        self.query_into(point, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_reconstruction_core::synthetic::SceneBuilder;

    fn line_index(n: usize) -> (SpatialIndex, Vec<VertexId>) {
        let mut scene = SceneBuilder::new();
        let points: Vec<Pt3> = (0..n)
            .map(|i| Pt3::new(i as Real, 0.01 * (i * i) as Real, 0.0))
            .collect();
        let ids = scene.reconstructed_points(&points, &[]).unwrap();
        (SpatialIndex::build(&scene.build()).unwrap(), ids)
    }

    #[test]
    fn returns_k_closest_in_order() {
        let (index, ids) = line_index(10);
        let query = NeighborhoodQuery::new(&index, 3);
        let hits = query.query(&Pt3::new(4.0, 0.16, 0.0));

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].vertex, ids[4]);
        assert_eq!(hits[0].distance, 0.0);
        assert!(hits[1].distance <= hits[2].distance);
        let rest: Vec<VertexId> = hits[1..].iter().map(|n| n.vertex).collect();
        assert!(rest.contains(&ids[3]) && rest.contains(&ids[5]));
    }

    #[test]
    fn shortfall_is_truncated_not_padded() {
        let (index, _) = line_index(4);
        let query = NeighborhoodQuery::new(&index, 200);
        let mut out = vec![
            Neighbor {
                vertex: VertexId(99),
                distance: -1.0,
            };
            7
        ];
        query.query_into(&Pt3::origin(), &mut out);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|n| n.vertex != VertexId(99)));
    }

    #[test]
    fn distances_are_euclidean() {
        let (index, ids) = line_index(2);
        let hits = NeighborhoodQuery::new(&index, 2).query(&Pt3::new(0.0, 0.0, 2.0));
        assert_eq!(hits[0].vertex, ids[0]);
        assert!((hits[0].distance - 2.0).abs() < 1e-12);
    }
}
