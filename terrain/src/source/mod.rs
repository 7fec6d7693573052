pub use memory::MemoryGeometrySource;

use misc::*;

use crate::coordinate::WorldRect;
use crate::triangle::Triangle;

mod memory;

#[derive(Debug, Error)]
pub enum GeometrySourceError {
    #[error("Failed to read geometry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse geometry: {0}")]
    Parse(String),

    #[error("Geometry is unavailable: {0}")]
    Unavailable(String),
}

/// Supplier of raw world triangles, e.g. an extractor reading the game's world files
pub trait GeometrySource: Send + Sync {
    /// All triangles intersecting the given rect, unbounded vertically
    fn triangles_in(&self, rect: WorldRect) -> Result<Vec<Triangle>, GeometrySourceError>;

    /// Release any state held by the source. Called when the cache is closed
    fn clear(&self) {}
}
