use misc::derive_more::{From, Into};
use misc::*;

/// Width and depth of a single tile in world units
pub const TILE_SIZE: f32 = 533.333_3;

/// World coordinate of the corner of grid [0, 0]. Grid indices grow as world coordinates shrink
pub const ZERO_POINT: f32 = 32.0 * TILE_SIZE;

/// Tiles hold geometry for their rectangle expanded by this much on each side
pub const TILE_LOAD_MARGIN: f32 = 1.0;

/// Vertical extent of every tile, effectively unbounded
pub const TILE_Z_EXTENT: f32 = 1.0e30;

/// Location of a tile in the world grid
#[derive(Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Into, From)]
pub struct GridCoord(pub i32, pub i32);

/// 2D axis aligned rectangle in world space, inclusive
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WorldRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl GridCoord {
    /// The tile owning the given world position
    pub fn from_world(x: f32, y: f32) -> Self {
        let grid = |coord: f32| ((ZERO_POINT - coord) / TILE_SIZE).floor() as i32;
        GridCoord(grid(x), grid(y))
    }

    pub const fn x(&self) -> i32 {
        self.0
    }

    pub const fn y(&self) -> i32 {
        self.1
    }

    /// The rectangle of world space covered by this tile, without any margin
    pub fn world_rect(&self) -> WorldRect {
        let max_x = ZERO_POINT - (self.0 as f32 * TILE_SIZE);
        let max_y = ZERO_POINT - (self.1 as f32 * TILE_SIZE);
        WorldRect::new(vec2(max_x - TILE_SIZE, max_y - TILE_SIZE), vec2(max_x, max_y))
    }
}

impl WorldRect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y, "inverted rect {:?}", (min, max));
        Self { min, max }
    }

    /// Bounding rect of the two given points, in any order
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self::new(a.min(b), a.max(b))
    }

    /// Square of half-size `radius` around the given point
    pub fn around(centre: Vec2, radius: f32) -> Self {
        let radius = radius.abs();
        Self::new(centre - Vec2::splat(radius), centre + Vec2::splat(radius))
    }

    pub fn expand(&self, margin: f32) -> Self {
        Self::new(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin))
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }

    pub fn intersects(&self, other: &WorldRect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Every tile whose grid rect overlaps this one
    pub fn grid_coords(&self) -> impl Iterator<Item = GridCoord> {
        // grid indices shrink as world coordinates grow
        let first = GridCoord::from_world(self.max.x, self.max.y);
        let last = GridCoord::from_world(self.min.x, self.min.y);
        (first.0..=last.0)
            .cartesian_product(first.1..=last.1)
            .map(|(x, y)| GridCoord(x, y))
    }
}

impl Debug for GridCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}, {}]", self.0, self.1)
    }
}

slog_value_debug!(GridCoord);
slog_kv_debug!(GridCoord, "grid");
