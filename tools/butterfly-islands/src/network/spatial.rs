//! Spatial index for bounding box queries over vertices

use rstar::{RTree, RTreeObject, AABB};

use super::{Bounds, VertexId};

/// Vertex position for the R-tree
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexedPoint {
    pub coords: [f64; 2], // [lon, lat]
    pub vertex: VertexId,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords)
    }
}

pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("points", &self.tree.size())
            .finish()
    }
}

impl SpatialIndex {
    pub fn build(points: Vec<IndexedPoint>) -> Self {
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Vertices inside `bounds`, in tree order
    pub fn within(&self, bounds: &Bounds) -> Vec<VertexId> {
        let envelope = AABB::from_corners(
            [bounds.min_lon, bounds.min_lat],
            [bounds.max_lon, bounds.max_lat],
        );
        self.tree
            .locate_in_envelope(&envelope)
            .map(|p| p.vertex)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
