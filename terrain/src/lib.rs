pub use self::cache::{
    CacheError, CacheResult, ChunkCache, LoadNotifier, TileListener, TileLoaded,
};
pub use self::coordinate::{GridCoord, WorldRect, TILE_SIZE, ZERO_POINT};
pub use self::index::{Candidates, TileIndex};
pub use self::query::{Capsule, QueryEngine, Standable, SurfaceFilter};
pub use self::source::{GeometrySource, GeometrySourceError, MemoryGeometrySource};
pub use self::tile::{TileBounds, TriangleTile};
pub use self::triangle::{Triangle, TriangleFlags, TriangleId, TriangleType};

mod cache;
mod coordinate;
pub mod geometry;
pub mod helpers;
mod index;
mod query;
mod source;
mod tile;
mod triangle;
