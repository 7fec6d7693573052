use std::path::Path;

use crate::coordinate::WorldRect;
use crate::source::{GeometrySource, GeometrySourceError};
use crate::triangle::Triangle;

/// Holds all geometry in memory. Used for testing and for triangle dumps
#[derive(Default)]
pub struct MemoryGeometrySource {
    triangles: Vec<Triangle>,
}

impl MemoryGeometrySource {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    /// Parses a ron list of triangles
    pub fn from_ron(text: &str) -> Result<Self, GeometrySourceError> {
        ron::de::from_str(text)
            .map(Self::new)
            .map_err(|e| GeometrySourceError::Parse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, GeometrySourceError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    pub fn push(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

impl GeometrySource for MemoryGeometrySource {
    fn triangles_in(&self, rect: WorldRect) -> Result<Vec<Triangle>, GeometrySourceError> {
        Ok(self
            .triangles
            .iter()
            .filter(|tri| tri.bounds_2d().intersects(&rect))
            .cloned()
            .collect())
    }
}

impl FromIterator<Triangle> for MemoryGeometrySource {
    fn from_iter<T: IntoIterator<Item = Triangle>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use misc::*;

    use super::*;
    use crate::triangle::TriangleType;

    #[test]
    fn filters_by_rect() {
        let src: MemoryGeometrySource = [(0.0, 0.0), (50.0, 50.0), (-50.0, 10.0)]
            .iter()
            .map(|&(x, y)| {
                Triangle::new(
                    vec3(x, y, 0.0),
                    vec3(x + 2.0, y, 0.0),
                    vec3(x, y + 2.0, 0.0),
                    TriangleType::Terrain,
                )
            })
            .collect();

        let found = src
            .triangles_in(WorldRect::from_corners(vec2(-1.0, -1.0), vec2(60.0, 60.0)))
            .expect("memory source cannot fail");
        assert_eq!(found.len(), 2);

        let found = src
            .triangles_in(WorldRect::around(vec2(-49.0, 11.0), 0.5))
            .expect("memory source cannot fail");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vertices[0], vec3(-50.0, 10.0, 0.0));
    }

    const DUMP: &str = "[
        (vertices: ((0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)), flags: 1),
        (vertices: ((0.0, 0.0, 2.0), (1.0, 0.0, 2.0), (0.0, 1.0, 2.0)), flags: 2),
    ]";

    #[test]
    fn ron_dump() {
        let src = MemoryGeometrySource::from_ron(DUMP).expect("dump should parse");
        assert_eq!(src.len(), 2);

        let found = src
            .triangles_in(WorldRect::around(vec2(0.5, 0.5), 1.0))
            .expect("memory source cannot fail");
        assert_eq!(found[1].flags, TriangleType::Water);
        assert_eq!(found[1].vertices[2], vec3(0.0, 1.0, 2.0));

        assert!(matches!(
            MemoryGeometrySource::from_ron("[(vertices: [])]"),
            Err(GeometrySourceError::Parse(_))
        ));
    }

    #[test]
    fn dump_file() {
        let path = std::env::temp_dir().join(format!("terrain-dump-{}.ron", std::process::id()));
        std::fs::write(&path, DUMP).expect("temp dir should be writable");
        let loaded = MemoryGeometrySource::from_file(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.expect("dump file should parse").len(), 2);

        assert!(matches!(
            MemoryGeometrySource::from_file(&path),
            Err(GeometrySourceError::Io(_))
        ));
    }
}
