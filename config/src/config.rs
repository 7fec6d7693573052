use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub query: QueryConfig,
    pub cache: CacheConfig,
}

/// Tuning values for the terrain queries. Fixed once an engine is constructed
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct QueryConfig {
    /// Steepest surface that still counts as walkable, measured from vertical
    pub walkable_slope_degrees: f32,

    /// Horizontal offset of the four cliff probes around a standable point
    pub min_cliff_distance: f32,

    /// Height of the near-ground collision segments, also their lateral offset
    pub capsule_offset: f32,

    /// Cliff probes start this far above the candidate height...
    pub cliff_probe_above: f32,

    /// ...and end this far below it
    pub cliff_probe_below: f32,

    /// Radius of the candidate search around a vertical probe
    pub standable_search_radius: f32,

    /// Endpoints further than this (and half the step length) from the support are too steep
    pub max_step_height: f32,

    /// Model vertices within (z + min, z + max) count as close to the body
    pub model_min_height: f32,
    pub model_max_height: f32,

    pub max_gradient: u8,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub initial_capacity: usize,
}

impl QueryConfig {
    /// Minimum `|normal.z|` of a walkable surface
    pub fn walkable_normal_z(&self) -> f32 {
        self.walkable_slope_degrees.to_radians().sin()
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            walkable_slope_degrees: 30.0,
            min_cliff_distance: 0.5,
            capsule_offset: 0.2,
            cliff_probe_above: 2.0,
            cliff_probe_below: 5.0,
            standable_search_radius: 1.0,
            max_step_height: 1.0,
            model_min_height: 0.75,
            model_max_height: 2.0,
            max_gradient: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 128,
        }
    }
}
