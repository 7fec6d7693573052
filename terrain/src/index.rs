use rstar::{RTree, RTreeObject, AABB};

use misc::*;

use crate::coordinate::WorldRect;
use crate::triangle::{Triangle, TriangleId};

/// Triangle ids returned from an index query, in ascending order
pub type Candidates = SmallVec<[TriangleId; 32]>;

/// Read-only spatial index over the 2D bounds of a tile's triangles
pub struct TileIndex {
    rtree: RTree<IndexedTriangle>,
}

struct IndexedTriangle {
    id: TriangleId,
    envelope: AABB<[f32; 2]>,
}

impl RTreeObject for IndexedTriangle {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl TileIndex {
    pub fn new(triangles: &[Triangle]) -> Self {
        let entries = triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| IndexedTriangle {
                id: i as TriangleId,
                envelope: envelope(&tri.bounds_2d()),
            })
            .collect_vec();

        Self {
            rtree: RTree::bulk_load(entries),
        }
    }

    /// All triangles whose bounds come within `radius` of (x, y) along both axes
    pub fn close_to(&self, x: f32, y: f32, radius: f32) -> Candidates {
        self.in_rect(&WorldRect::around(vec2(x, y), radius))
    }

    /// All triangles whose bounds overlap the given rect
    pub fn in_rect(&self, rect: &WorldRect) -> Candidates {
        let mut ids = self
            .rtree
            .locate_in_envelope_intersecting(&envelope(rect))
            .map(|tri| tri.id)
            .collect::<Candidates>();

        // iteration order of the tree is an artifact of its layout
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn envelope(rect: &WorldRect) -> AABB<[f32; 2]> {
    AABB::from_corners(rect.min.into(), rect.max.into())
}
