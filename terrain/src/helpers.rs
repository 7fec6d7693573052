//! Geometry builders for tests and benchmarks

use std::sync::Arc;

use config::Config;
use misc::*;

use crate::query::{Capsule, QueryEngine};
use crate::source::MemoryGeometrySource;
use crate::triangle::{Triangle, TriangleFlags, TriangleType};

/// A typical upright actor
pub const HUMAN: Capsule = Capsule::new(2.0, 0.5);

/// Horizontal rectangle at the given height, split into 2 triangles
pub fn quad(min: Vec2, max: Vec2, z: f32, flags: impl Into<TriangleFlags>) -> [Triangle; 2] {
    let flags = flags.into();
    let a = vec3(min.x, min.y, z);
    let b = vec3(max.x, min.y, z);
    let c = vec3(max.x, max.y, z);
    let d = vec3(min.x, max.y, z);
    [Triangle::new(a, b, c, flags), Triangle::new(a, c, d, flags)]
}

/// Vertical terrain wall in the plane `x`, spanning `y` and `z`
pub fn wall_at_x(x: f32, (y0, y1): (f32, f32), (z0, z1): (f32, f32)) -> [Triangle; 2] {
    let a = vec3(x, y0, z0);
    let b = vec3(x, y1, z0);
    let c = vec3(x, y1, z1);
    let d = vec3(x, y0, z1);
    [
        Triangle::new(a, b, c, TriangleType::Terrain),
        Triangle::new(a, c, d, TriangleType::Terrain),
    ]
}

/// Square grid of terrain cells starting at `origin`, each split into 2 triangles
pub fn heightfield(
    origin: Vec2,
    cells: usize,
    cell_size: f32,
    height: impl Fn(f32, f32) -> f32,
) -> Vec<Triangle> {
    let corner = |i: usize, j: usize| {
        let xy = origin + vec2(i as f32, j as f32) * cell_size;
        xy.extend(height(xy.x, xy.y))
    };

    (0..cells)
        .cartesian_product(0..cells)
        .flat_map(|(i, j)| {
            let (a, b) = (corner(i, j), corner(i + 1, j));
            let (c, d) = (corner(i + 1, j + 1), corner(i, j + 1));
            [
                Triangle::new(a, b, c, TriangleType::Terrain),
                Triangle::new(a, c, d, TriangleType::Terrain),
            ]
        })
        .collect()
}

/// Engine over an in-memory source with the default config
pub fn engine_from(triangles: impl IntoIterator<Item = Triangle>) -> QueryEngine {
    let source = triangles.into_iter().collect::<MemoryGeometrySource>();
    QueryEngine::new(Arc::new(source), &Config::default())
}
