use std::sync::Arc;

use config::{Config, QueryConfig};
use misc::*;

use crate::cache::{CacheResult, ChunkCache};
use crate::coordinate::WorldRect;
use crate::geometry::lateral_offset;
use crate::index::Candidates;
use crate::source::GeometrySource;
use crate::tile::TriangleTile;
use crate::triangle::{Triangle, TriangleFlags, TriangleType};

/// Collision volume of an actor standing upright
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Capsule {
    pub height: f32,
    pub radius: f32,
}

/// Outcome of a search for ground to stand on
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Standable {
    /// Solid, unobstructed ground with support all around
    Ground { z: f32, flags: TriangleFlags },

    /// The highest unobstructed surface, but at least one side drops away within the cliff
    /// distance
    NearCliff { z: f32, flags: TriangleFlags },

    NotFound,
}

/// Which surfaces count as ground
#[derive(Copy, Clone, Debug)]
pub struct SurfaceFilter {
    /// Exactly [TriangleType::Terrain] accepts every surface type
    pub allowed: TriangleFlags,

    /// Accept surfaces steeper than the walkable slope
    pub ignore_gradient: bool,
}

/// Candidate triangles from every tile overlapping an area. Triangles within the load margin of
/// a tile edge may appear more than once
struct Nearby {
    tiles: SmallVec<[(Arc<TriangleTile>, Candidates); 4]>,
}

/// Answers navigability questions about the geometry supplied by a [GeometrySource]
pub struct QueryEngine {
    cache: ChunkCache,
    config: QueryConfig,
}

impl Capsule {
    pub const fn new(height: f32, radius: f32) -> Self {
        Self { height, radius }
    }

    fn foot(&self, pos: Vec3) -> Vec3 {
        pos + Vec3::Z * self.radius
    }

    fn head(&self, pos: Vec3) -> Vec3 {
        pos + Vec3::Z * (self.height - self.radius)
    }
}

impl Standable {
    /// Height of the surface found, even if it was rejected for being near a cliff
    pub fn z(&self) -> Option<f32> {
        match self {
            Standable::Ground { z, .. } | Standable::NearCliff { z, .. } => Some(*z),
            Standable::NotFound => None,
        }
    }

    pub fn is_ground(&self) -> bool {
        matches!(self, Standable::Ground { .. })
    }
}

impl SurfaceFilter {
    pub fn new(allowed: impl Into<TriangleFlags>, ignore_gradient: bool) -> Self {
        Self {
            allowed: allowed.into(),
            ignore_gradient,
        }
    }

    fn accepts(&self, flags: TriangleFlags) -> bool {
        self.allowed == TriangleType::Terrain || self.allowed.intersects(flags)
    }
}

impl Nearby {
    fn triangles(&self) -> impl Iterator<Item = &Triangle> + '_ {
        self.tiles
            .iter()
            .flat_map(|(tile, candidates)| tile.resolve(candidates))
    }
}

impl Default for SurfaceFilter {
    fn default() -> Self {
        Self::new(TriangleType::Terrain, false)
    }
}

impl QueryEngine {
    pub fn new(source: Arc<dyn GeometrySource>, config: &Config) -> Self {
        Self::with_cache(ChunkCache::new(source, &config.cache), config.query.clone())
    }

    pub fn with_cache(cache: ChunkCache, config: QueryConfig) -> Self {
        Self { cache, config }
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// True if the top of the capsule standing at `pos` touches any triangle
    pub fn is_spot_blocked(&self, pos: Vec3, capsule: Capsule) -> CacheResult<bool> {
        let tile = self.cache.tile_at(pos.x, pos.y)?;
        Ok(self.spot_blocked_in(&tile, pos, capsule))
    }

    /// Highest walkable surface between `min_z` and `max_z` at (x, y) that terrain-sized actors
    /// can stand on
    pub fn find_standable(
        &self,
        x: f32,
        y: f32,
        min_z: f32,
        max_z: f32,
        capsule: Capsule,
    ) -> CacheResult<Standable> {
        self.find_standable_at(x, y, min_z, max_z, capsule, SurfaceFilter::default())
    }

    /// Highest surface between `min_z` and `max_z` at (x, y) passing the filter, on which the
    /// capsule is not blocked. Equal heights resolve to the lowest triangle id
    pub fn find_standable_at(
        &self,
        x: f32,
        y: f32,
        min_z: f32,
        max_z: f32,
        capsule: Capsule,
        filter: SurfaceFilter,
    ) -> CacheResult<Standable> {
        let tile = self.cache.tile_at(x, y)?;
        let candidates = tile.close_to(x, y, self.config.standable_search_radius);
        let min_normal_z = self.config.walkable_normal_z();
        let (bottom, top) = (vec3(x, y, min_z), vec3(x, y, max_z));

        let mut best: Option<(f32, TriangleFlags)> = None;
        for tri in tile.resolve(&candidates) {
            if !filter.accepts(tri.flags) {
                continue;
            }

            if !filter.ignore_gradient && tri.normal().z.abs() <= min_normal_z {
                continue;
            }

            let hit = some_or_continue!(tri.intersect_segment(bottom, top));
            let higher = best.map_or(true, |(z, _)| hit.z > z);
            if higher && !self.spot_blocked_in(&tile, hit, capsule) {
                best = Some((hit.z, tri.flags));
            }
        }

        let (z, flags) = match best {
            Some(best) => best,
            None => return Ok(Standable::NotFound),
        };

        if self.near_cliff(&tile, &candidates, vec2(x, y), z) {
            trace!("standable point is too close to a cliff"; "x" => x, "y" => y, "z" => z);
            Ok(Standable::NearCliff { z, flags })
        } else {
            Ok(Standable::Ground { z, flags })
        }
    }

    /// True if the actor cannot take a single step between two nearby points
    pub fn is_step_blocked(&self, from: Vec3, to: Vec3, capsule: Capsule) -> CacheResult<bool> {
        // there must be ground under the middle of the step
        let step_length = from.distance(to);
        let mid = (from + to) / 2.0;
        let search = step_length.max(self.config.capsule_offset);
        let support_z = match self.find_standable(
            mid.x,
            mid.y,
            mid.z - search,
            mid.z + search,
            capsule,
        )? {
            Standable::Ground { z, .. } => z,
            _ => {
                trace!("step blocked, no support"; "from" => ?from, "to" => ?to);
                return Ok(true);
            }
        };

        // neither end may be far above or below that ground
        let too_steep = |z: f32| {
            let dz = (z - support_z).abs();
            dz > step_length / 2.0 && dz > self.config.max_step_height
        };
        if too_steep(from.z) || too_steep(to.z) {
            trace!("step blocked, too steep"; "from" => ?from, "to" => ?to, "support" => support_z);
            return Ok(true);
        }

        let offset = self.config.capsule_offset;
        let nearby = self.nearby(
            WorldRect::from_corners(from.truncate(), to.truncate()).expand(offset),
        )?;
        let collides = |a: Vec3, b: Vec3| {
            nearby
                .triangles()
                .any(|tri| tri.intersect_segment(a, b).is_some())
        };

        // diagonals through the body
        if collides(capsule.foot(from), capsule.head(to))
            || collides(capsule.head(from), capsule.foot(to))
        {
            trace!("step blocked, body collision"; "from" => ?from, "to" => ?to);
            return Ok(true);
        }

        // close to the ground, in the middle and at either side
        let lift = Vec3::Z * offset;
        let (low_from, low_to) = (from + lift, to + lift);
        let side = lateral_offset(from.truncate(), to.truncate(), offset).extend(0.0);

        let blocked = collides(low_from, low_to)
            || collides(low_from + side, low_to + side)
            || collides(low_from - side, low_to - side);

        if blocked {
            trace!("step blocked, ground collision"; "from" => ?from, "to" => ?to);
        }

        Ok(blocked)
    }

    /// True if a vertical segment at (x, y) crosses any water surface
    pub fn is_in_water(&self, x: f32, y: f32, min_z: f32, max_z: f32) -> CacheResult<bool> {
        let tile = self.cache.tile_at(x, y)?;
        let candidates = tile.close_to(x, y, self.config.standable_search_radius);
        let (bottom, top) = (vec3(x, y, min_z), vec3(x, y, max_z));

        let wet = tile
            .resolve(&candidates)
            .filter(|tri| tri.flags.contains(TriangleType::Water))
            .any(|tri| tri.intersect_segment(bottom, top).is_some());

        Ok(wet)
    }

    /// Coarse unevenness of pure terrain within `range` of the position, from 0 (flat) to the
    /// configured maximum. The height of `pos` is ignored
    pub fn gradient_score(&self, pos: Vec3, range: f32) -> CacheResult<u8> {
        let nearby = self.nearby(WorldRect::around(pos.truncate(), range))?;

        let heights = nearby
            .triangles()
            .filter(|tri| tri.flags == TriangleType::Terrain)
            .flat_map(|tri| tri.vertex_heights());

        let score = match heights.minmax() {
            MinMaxResult::MinMax(min, max) => {
                let max_gradient = self.config.max_gradient;
                (max - min).min(max_gradient as f32) as u8
            }
            MinMaxResult::OneElement(_) | MinMaxResult::NoElements => 0,
        };

        Ok(score)
    }

    /// True if a static object or model near the position has a vertex at roughly body height
    pub fn is_close_to_model(&self, pos: Vec3, range: f32) -> CacheResult<bool> {
        let nearby = self.nearby(WorldRect::around(pos.truncate(), range))?;
        let (lo, hi) = (
            pos.z + self.config.model_min_height,
            pos.z + self.config.model_max_height,
        );

        let close = nearby
            .triangles()
            .filter(|tri| {
                tri.flags
                    .intersects(TriangleType::Object | TriangleType::Model)
            })
            .any(|tri| tri.vertex_heights().any(|z| z > lo && z < hi));

        Ok(close)
    }

    /// True if no triangle crosses the segment between the two points, whichever tiles they
    /// are in
    pub fn line_of_sight(&self, a: Vec3, b: Vec3) -> CacheResult<bool> {
        // anything crossing the segment overlaps its bounding box
        let nearby = self.nearby(WorldRect::from_corners(a.truncate(), b.truncate()))?;
        let blocked = nearby
            .triangles()
            .any(|tri| tri.intersect_segment(a, b).is_some());

        Ok(!blocked)
    }

    /// Loads every tile overlapping the rect and collects their candidates within it
    fn nearby(&self, rect: WorldRect) -> CacheResult<Nearby> {
        let tiles = rect
            .grid_coords()
            .map(|coord| -> CacheResult<_> {
                let tile = self.cache.tile(coord)?;
                let candidates = tile.in_rect(&rect);
                Ok((tile, candidates))
            })
            .collect::<CacheResult<_>>()?;

        Ok(Nearby { tiles })
    }

    fn spot_blocked_in(&self, tile: &TriangleTile, pos: Vec3, capsule: Capsule) -> bool {
        let head = capsule.head(pos);
        let candidates = tile.close_to(pos.x, pos.y, capsule.radius);

        let blocked = tile
            .resolve(&candidates)
            .any(|tri| tri.distance_to(head) < capsule.radius);
        blocked
    }

    /// Samples the ground at the cliff distance in each direction around the point, true if any
    /// of them finds nothing
    fn near_cliff(&self, tile: &TriangleTile, candidates: &Candidates, at: Vec2, z: f32) -> bool {
        let d = self.config.min_cliff_distance;
        let samples = [vec2(d, 0.0), vec2(-d, 0.0), vec2(0.0, d), vec2(0.0, -d)];
        let mut supported = [false; 4];

        for tri in tile.resolve(candidates) {
            for (offset, found) in samples.iter().zip(supported.iter_mut()) {
                if !*found {
                    let ground = at + *offset;
                    let top = ground.extend(z + self.config.cliff_probe_above);
                    let bottom = ground.extend(z - self.config.cliff_probe_below);
                    *found = tri.intersect_segment(top, bottom).is_some();
                }
            }

            if supported.iter().all(|s| *s) {
                return false;
            }
        }

        true
    }
}
