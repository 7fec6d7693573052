use std::sync::Arc;

use ahash::AHashMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use config::CacheConfig;
use misc::parking_lot::{Mutex, RwLock};
use misc::*;

use crate::coordinate::GridCoord;
use crate::source::{GeometrySource, GeometrySourceError};
use crate::tile::{TileBounds, TriangleTile};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to load tile {coord:?}: {source}")]
    Load {
        coord: GridCoord,
        source: GeometrySourceError,
    },
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Published once for every tile inserted into the cache
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileLoaded {
    pub coord: GridCoord,
}

#[derive(Clone)]
pub struct LoadNotifier(broadcast::Sender<TileLoaded>);

/// Will receive all tile notifications published while this is alive
pub struct TileListener(broadcast::Receiver<TileLoaded>);

/// Lazily loaded triangle tiles, keyed by grid coordinate.
///
/// Tiles are only ever added one at a time and removed all at once by [ChunkCache::evict_all].
/// The source is called without holding the tile map lock, so a slow load only stalls other
/// requests for the same tile.
pub struct ChunkCache {
    source: Arc<dyn GeometrySource>,
    tiles: RwLock<AHashMap<GridCoord, Arc<TriangleTile>>>,
    /// One lock per tile currently being loaded
    in_flight: Mutex<AHashMap<GridCoord, Arc<Mutex<()>>>>,
    notifier: LoadNotifier,
}

impl ChunkCache {
    pub fn new(source: Arc<dyn GeometrySource>, config: &CacheConfig) -> Self {
        Self {
            source,
            tiles: RwLock::new(AHashMap::with_capacity(config.initial_capacity)),
            in_flight: Mutex::new(AHashMap::new()),
            notifier: LoadNotifier::default(),
        }
    }

    pub fn subscribe(&self) -> TileListener {
        self.notifier.start_listening()
    }

    /// Loads the tile owning the given world position if it is not already loaded
    pub fn ensure_loaded(&self, x: f32, y: f32) -> CacheResult<GridCoord> {
        let coord = GridCoord::from_world(x, y);
        self.load_or_get(coord).map(|_| coord)
    }

    /// The tile owning the given world position, loading it first if necessary
    pub fn tile_at(&self, x: f32, y: f32) -> CacheResult<Arc<TriangleTile>> {
        self.load_or_get(GridCoord::from_world(x, y))
    }

    /// The tile at the given grid coordinate, loading it first if necessary
    pub fn tile(&self, coord: GridCoord) -> CacheResult<Arc<TriangleTile>> {
        self.load_or_get(coord)
    }

    /// The tile at the given grid coordinate, only if already loaded
    pub fn tile_at_grid(&self, coord: GridCoord) -> Option<Arc<TriangleTile>> {
        self.tiles.read().get(&coord).cloned()
    }

    pub fn is_loaded(&self, coord: GridCoord) -> bool {
        self.tiles.read().contains_key(&coord)
    }

    pub fn loaded_count(&self) -> usize {
        self.tiles.read().len()
    }

    /// Drops every tile. Tiles still held by in-flight queries are freed when they finish
    pub fn evict_all(&self) {
        let mut tiles = self.tiles.write();
        let count = tiles.len();
        tiles.clear();
        drop(tiles);

        info!("evicted all tiles"; "count" => count);
    }

    /// Evicts everything and releases the geometry source's own state
    pub fn close(&self) {
        self.source.clear();
        self.evict_all();
    }

    fn load_or_get(&self, coord: GridCoord) -> CacheResult<Arc<TriangleTile>> {
        if let Some(tile) = self.tile_at_grid(coord) {
            return Ok(tile);
        }

        let in_flight = Arc::clone(self.in_flight.lock().entry(coord).or_default());
        let _loading = in_flight.lock();

        // loaded by another thread while we waited for the lock
        if let Some(tile) = self.tile_at_grid(coord) {
            return Ok(tile);
        }

        // inserted before the in-flight entry goes, so late arrivals find the tile
        let result = self.load(coord).map(|tile| {
            let tile = Arc::new(tile);
            let mut tiles = self.tiles.write();
            tiles.insert(coord, Arc::clone(&tile));
            (tile, tiles.len())
        });
        self.in_flight.lock().remove(&coord);
        let (tile, count) = result?;

        debug!("loaded tile"; coord, "bounds" => ?tile.bounds().rect(),
            "triangles" => tile.len(), "loaded" => count);

        self.notifier.notify(coord);
        Ok(tile)
    }

    fn load(&self, coord: GridCoord) -> CacheResult<TriangleTile> {
        let rect = TileBounds::for_grid(coord).rect();
        let triangles = self.source.triangles_in(rect).map_err(|source| {
            warn!("failed to load tile"; coord, "error" => %source);
            CacheError::Load { coord, source }
        })?;

        Ok(TriangleTile::new(coord, triangles))
    }
}

impl Default for LoadNotifier {
    fn default() -> Self {
        let (send, _) = broadcast::channel(4096);
        Self(send)
    }
}

impl LoadNotifier {
    pub fn start_listening(&self) -> TileListener {
        TileListener(self.0.subscribe())
    }

    pub fn notify(&self, coord: GridCoord) {
        // no listeners is fine
        let _ = self.0.send(TileLoaded { coord });
    }
}

impl TileListener {
    /// Next pending notification without blocking
    pub fn try_next(&mut self) -> Option<GridCoord> {
        loop {
            match self.0.try_recv() {
                Ok(TileLoaded { coord }) => break Some(coord),
                Err(TryRecvError::Lagged(n)) => {
                    warn!("tile notifications are lagging"; "skipped" => n);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break None,
            }
        }
    }

    /// All pending notifications
    pub fn drain(&mut self) -> impl Iterator<Item = GridCoord> + '_ {
        std::iter::from_fn(move || self.try_next())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    use super::*;
    use crate::coordinate::{WorldRect, TILE_SIZE};
    use crate::source::MemoryGeometrySource;
    use crate::triangle::{Triangle, TriangleType};

    /// Counts requests and optionally fails them
    struct CountingSource {
        inner: MemoryGeometrySource,
        requests: AtomicUsize,
        cleared: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Arc<Self> {
            let inner = (0..4)
                .map(|i| {
                    let x = i as f32 * TILE_SIZE + 10.0;
                    Triangle::new(
                        vec3(x, 10.0, 0.0),
                        vec3(x + 5.0, 10.0, 0.0),
                        vec3(x, 15.0, 0.0),
                        TriangleType::Terrain,
                    )
                })
                .collect();

            Arc::new(Self {
                inner,
                requests: AtomicUsize::new(0),
                cleared: AtomicUsize::new(0),
                fail,
            })
        }

        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    impl GeometrySource for CountingSource {
        fn triangles_in(&self, rect: WorldRect) -> Result<Vec<Triangle>, GeometrySourceError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(GeometrySourceError::Unavailable("nope".to_owned()))
            } else {
                self.inner.triangles_in(rect)
            }
        }

        fn clear(&self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Holds up the load of a single tile until released
    struct GatedSource {
        gated: GridCoord,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl GeometrySource for GatedSource {
        fn triangles_in(&self, rect: WorldRect) -> Result<Vec<Triangle>, GeometrySourceError> {
            let gated = self.gated.world_rect();
            if rect.contains((gated.min + gated.max) / 2.0) {
                let _ = self.entered.lock().send(());
                let _ = self.release.lock().recv();
            }

            Ok(Vec::new())
        }
    }

    fn cache(src: &Arc<CountingSource>) -> ChunkCache {
        logging::for_tests();
        ChunkCache::new(src.clone(), &CacheConfig::default())
    }

    #[test]
    fn loads_once() {
        let src = CountingSource::new(false);
        let cache = cache(&src);

        let coord = GridCoord::from_world(1.0, 1.0);
        assert!(!cache.is_loaded(coord));
        assert!(cache.tile_at_grid(coord).is_none());

        assert_eq!(cache.ensure_loaded(1.0, 1.0).expect("load"), coord);
        assert_eq!(cache.ensure_loaded(2.0, 3.0).expect("load"), coord);
        let tile = cache.tile_at(1.0, 1.0).expect("load");

        assert_eq!(src.requests(), 1);
        assert_eq!(cache.loaded_count(), 1);
        assert_eq!(tile.coord(), coord);
        assert_eq!(tile.len(), 1);
        assert!(tile.bounds().rect().contains(vec2(1.0, 1.0)));
        assert!(cache.in_flight.lock().is_empty());
        assert!(Arc::ptr_eq(
            &tile,
            &cache.tile_at_grid(coord).expect("should be loaded")
        ));
    }

    #[test]
    fn failure_leaves_no_entry() {
        let src = CountingSource::new(true);
        let cache = cache(&src);

        let err = cache.tile_at(1.0, 1.0).expect_err("source fails");
        let CacheError::Load { coord, source } = err;
        assert_eq!(coord, GridCoord::from_world(1.0, 1.0));
        assert!(matches!(source, GeometrySourceError::Unavailable(_)));

        assert_eq!(cache.loaded_count(), 0);
        assert!(cache.in_flight.lock().is_empty());

        // retried rather than cached
        assert!(cache.ensure_loaded(1.0, 1.0).is_err());
        assert_eq!(src.requests(), 2);
    }

    #[test]
    fn notifications() {
        let src = CountingSource::new(false);
        let cache = cache(&src);
        let mut listener = cache.subscribe();

        assert!(listener.try_next().is_none());

        let a = cache.ensure_loaded(1.0, 1.0).expect("load");
        let b = cache.ensure_loaded(TILE_SIZE + 1.0, 1.0).expect("load");
        cache.ensure_loaded(1.0, 1.0).expect("load");
        assert_ne!(a, b);

        assert_eq!(listener.drain().collect_vec(), vec![a, b]);

        // reloaded after eviction, exactly once each
        cache.evict_all();
        assert_eq!(cache.loaded_count(), 0);
        cache.ensure_loaded(1.0, 1.0).expect("load");
        cache.ensure_loaded(2.0, 2.0).expect("load");
        assert_eq!(listener.drain().collect_vec(), vec![a]);
        assert_eq!(src.requests(), 3);
    }

    #[test]
    fn evicted_tiles_outlive_their_holders() {
        let src = CountingSource::new(false);
        let cache = cache(&src);

        let tile = cache.tile_at(1.0, 1.0).expect("load");
        cache.close();

        assert_eq!(src.cleared.load(Ordering::SeqCst), 1);
        assert_eq!(cache.loaded_count(), 0);
        assert_eq!(tile.len(), 1);

        let reloaded = cache.tile_at(1.0, 1.0).expect("load");
        assert!(!Arc::ptr_eq(&tile, &reloaded));
    }

    #[test]
    fn concurrent_loads() {
        let src = CountingSource::new(false);
        let cache = cache(&src);
        let mut listener = cache.subscribe();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for i in 0..4 {
                        let x = i as f32 * TILE_SIZE + 1.0;
                        cache.tile_at(x, 1.0).expect("load");
                    }
                });
            }
        });

        assert_eq!(src.requests(), 4);
        assert_eq!(cache.loaded_count(), 4);
        assert_eq!(listener.drain().count(), 4);
    }

    #[test]
    fn margin_geometry_is_loaded() {
        logging::for_tests();
        let source = MemoryGeometrySource::new(vec![
            // just outside the tile's own rect, within the load margin
            Triangle::new(
                vec3(-0.5, 10.0, 0.0),
                vec3(-0.2, 10.0, 0.0),
                vec3(-0.5, 12.0, 0.0),
                TriangleType::Terrain,
            ),
            // beyond the margin
            Triangle::new(
                vec3(-5.0, 10.0, 0.0),
                vec3(-4.0, 10.0, 0.0),
                vec3(-5.0, 12.0, 0.0),
                TriangleType::Terrain,
            ),
        ]);
        let cache = ChunkCache::new(Arc::new(source), &CacheConfig::default());

        let tile = cache.tile_at(1.0, 1.0).expect("load");
        assert_eq!(tile.len(), 1);
        assert_eq!(tile.triangle(0).vertices[1], vec3(-0.2, 10.0, 0.0));
    }

    #[test]
    fn slow_load_does_not_block_other_tiles() {
        logging::for_tests();
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();

        let slow = GridCoord::from_world(TILE_SIZE + 1.0, 1.0);
        let source = GatedSource {
            gated: slow,
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let cache = ChunkCache::new(Arc::new(source), &CacheConfig::default());
        let fast = cache.ensure_loaded(1.0, 1.0).expect("load");
        assert_ne!(fast, slow);

        std::thread::scope(|scope| {
            let loader = scope.spawn(|| cache.tile(slow).map(|tile| tile.coord()));
            entered_rx.recv().expect("loader should reach the source");

            // the slow tile is mid-load
            assert!(cache.tile_at_grid(fast).is_some());
            assert_eq!(cache.tile(fast).expect("loaded").coord(), fast);
            assert!(!cache.is_loaded(slow));

            release_tx.send(()).expect("loader is waiting");
            let loaded = loader.join().expect("loader panicked").expect("load");
            assert_eq!(loaded, slow);
        });

        assert_eq!(cache.loaded_count(), 2);
    }
}
