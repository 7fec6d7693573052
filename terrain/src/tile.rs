use misc::*;

use crate::coordinate::{GridCoord, WorldRect, TILE_LOAD_MARGIN, TILE_Z_EXTENT};
use crate::index::{Candidates, TileIndex};
use crate::triangle::{Triangle, TriangleId};

/// 3D bounds of a tile
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileBounds {
    pub min: Vec3,
    pub max: Vec3,
}

/// Immutable triangle geometry for a single grid cell, with its spatial index
pub struct TriangleTile {
    coord: GridCoord,
    bounds: TileBounds,
    triangles: Vec<Triangle>,
    index: TileIndex,
}

impl TileBounds {
    /// The grid rectangle expanded by the load margin, unbounded vertically
    pub fn for_grid(coord: GridCoord) -> Self {
        let rect = coord.world_rect().expand(TILE_LOAD_MARGIN);
        Self {
            min: rect.min.extend(-TILE_Z_EXTENT),
            max: rect.max.extend(TILE_Z_EXTENT),
        }
    }

    pub fn rect(&self) -> WorldRect {
        WorldRect::new(self.min.truncate(), self.max.truncate())
    }
}

impl TriangleTile {
    pub fn new(coord: GridCoord, triangles: Vec<Triangle>) -> Self {
        let index = TileIndex::new(&triangles);
        Self {
            coord,
            bounds: TileBounds::for_grid(coord),
            triangles,
            index,
        }
    }

    pub fn coord(&self) -> GridCoord {
        self.coord
    }

    pub fn bounds(&self) -> &TileBounds {
        &self.bounds
    }

    /// Panics if the id did not come from this tile
    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id as usize]
    }

    pub fn triangles(&self) -> impl ExactSizeIterator<Item = (TriangleId, &Triangle)> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| (i as TriangleId, tri))
    }

    /// Resolves candidate ids from the index into triangles
    pub fn resolve<'a>(
        &'a self,
        candidates: &'a [TriangleId],
    ) -> impl Iterator<Item = &'a Triangle> + 'a {
        candidates.iter().map(move |id| self.triangle(*id))
    }

    pub fn index(&self) -> &TileIndex {
        &self.index
    }

    pub fn close_to(&self, x: f32, y: f32, radius: f32) -> Candidates {
        self.index.close_to(x, y, radius)
    }

    pub fn in_rect(&self, rect: &WorldRect) -> Candidates {
        self.index.in_rect(rect)
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

impl Debug for TriangleTile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "TriangleTile({:?}, {} triangles)", self.coord, self.len())
    }
}
