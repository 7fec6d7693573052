use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Serialize};

use misc::*;

use crate::coordinate::WorldRect;
use crate::geometry;

/// Kind of surface a triangle belongs to. A triangle can carry several
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriangleType {
    Terrain = 1,
    Water = 2,
    Object = 4,
    Model = 8,
}

pub type TriangleFlags = BitFlags<TriangleType>;

/// Index of a triangle within its tile
pub type TriangleId = u32;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
    pub flags: TriangleFlags,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, flags: impl Into<TriangleFlags>) -> Self {
        Self {
            vertices: [v0, v1, v2],
            flags: flags.into(),
        }
    }

    pub fn normal(&self) -> Vec3 {
        let [v0, v1, v2] = self.vertices;
        geometry::triangle_normal(v0, v1, v2)
    }

    /// Intersection point of the segment p0->p1 with this triangle
    pub fn intersect_segment(&self, p0: Vec3, p1: Vec3) -> Option<Vec3> {
        let [v0, v1, v2] = self.vertices;
        geometry::segment_triangle_intersect(p0, p1, v0, v1, v2)
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        let [v0, v1, v2] = self.vertices;
        geometry::point_distance_to_triangle(point, v0, v1, v2)
    }

    /// Projection onto the xy plane
    pub fn bounds_2d(&self) -> WorldRect {
        let [v0, v1, v2] = self.vertices;
        WorldRect::new(
            v0.truncate().min(v1.truncate()).min(v2.truncate()),
            v0.truncate().max(v1.truncate()).max(v2.truncate()),
        )
    }

    pub fn vertex_heights(&self) -> impl Iterator<Item = f32> + '_ {
        self.vertices.iter().map(|v| v.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine() {
        let tri = Triangle::new(
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            TriangleType::Object | TriangleType::Model,
        );

        assert!(tri.flags.contains(TriangleType::Object));
        assert!(tri.flags.intersects(TriangleType::Model | TriangleType::Water));
        assert!(!tri.flags.contains(TriangleType::Terrain));
    }

    #[test]
    fn projected_bounds() {
        let tri = Triangle::new(
            vec3(3.0, -1.0, 10.0),
            vec3(-2.0, 4.0, 0.0),
            vec3(1.0, 1.0, -5.0),
            TriangleType::Terrain,
        );

        let rect = tri.bounds_2d();
        assert_eq!(rect.min, vec2(-2.0, -1.0));
        assert_eq!(rect.max, vec2(3.0, 4.0));
        assert_eq!(tri.vertex_heights().collect_vec(), vec![10.0, 0.0, -5.0]);
    }

    #[test]
    fn ron_dump() {
        let text = "(vertices: ((0.0, 0.0, 1.0), (4.0, 0.0, 1.0), (0.0, 4.0, 1.0)), flags: 3)";
        let tri: Triangle = ron::de::from_str(text).expect("triangle should parse");

        assert_eq!(tri.vertices[1], vec3(4.0, 0.0, 1.0));
        assert_eq!(tri.flags, TriangleType::Terrain | TriangleType::Water);

        // dumps written by this crate are readable by it
        let written = ron::ser::to_string(&tri).expect("triangle should serialize");
        let read: Triangle = ron::de::from_str(&written).expect("own dump should parse");
        assert_eq!(read, tri);
    }
}
