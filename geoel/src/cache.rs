//! Per-provider tile caches.
//!
//! A provider resolves every grid corner through a [`TileCache`]. The cache
//! hands out shared [`TileFile`] handles and runs the provider's loader at
//! most once per key, so a missing tile is fetched once and a failed tile
//! stays a tombstone until the cache is cleared.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use moka::sync::Cache;
use once_cell::sync::OnceCell;

use crate::tile::{TileFile, TileKey};

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of tiles currently in the cache, tombstones included.
    pub entry_count: u64,
    /// Number of lookups served from the cache.
    pub hit_count: u64,
    /// Number of lookups that ran the loader.
    pub miss_count: u64,
    /// Maximum number of entries, `None` when unbounded.
    pub capacity: Option<u64>,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Map from tile key to an open tile.
pub trait TileCache: Send + Sync {
    /// Return the cached tile for `key`, running `load` on a miss.
    fn get_or_load(&self, key: TileKey, load: &dyn Fn() -> TileFile) -> Arc<TileFile>;

    /// Current counters.
    fn stats(&self) -> CacheStats;

    /// Drop every entry, closing the tiles.
    fn clear(&self);
}

/// Cache that keeps every tile for the lifetime of the provider.
///
/// Each key owns a slot that is initialised once. The map lock only guards
/// slot lookup, so a slow fetch blocks lookups of that tile and nothing else,
/// and concurrent lookups of the same missing tile trigger a single fetch.
#[derive(Default)]
pub struct UnboundedTileCache {
    tiles: Mutex<HashMap<TileKey, Arc<OnceCell<Arc<TileFile>>>>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl UnboundedTileCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: TileKey) -> Arc<OnceCell<Arc<TileFile>>> {
        let mut tiles = self.tiles.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(tiles.entry(key).or_default())
    }
}

impl TileCache for UnboundedTileCache {
    fn get_or_load(&self, key: TileKey, load: &dyn Fn() -> TileFile) -> Arc<TileFile> {
        let slot = self.slot(key);

        let mut loaded = false;
        let tile = slot.get_or_init(|| {
            loaded = true;
            Arc::new(load())
        });

        if loaded {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        }
        Arc::clone(tile)
    }

    fn stats(&self) -> CacheStats {
        let tiles = self.tiles.lock().unwrap_or_else(|e| e.into_inner());
        CacheStats {
            entry_count: tiles.values().filter(|slot| slot.get().is_some()).count() as u64,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            capacity: None,
        }
    }

    fn clear(&self) {
        let mut tiles = self.tiles.lock().unwrap_or_else(|e| e.into_inner());
        for tile in tiles.values().filter_map(|slot| slot.get()) {
            tile.close();
        }
        tiles.clear();
    }
}

/// Bounded cache evicting the least recently used tiles.
///
/// An evicted tile is unmapped when its last handle drops and is reopened
/// from disk on the next lookup. Evicted tombstones are forgotten, so a tile
/// that failed may be retried after eviction.
pub struct LruTileCache {
    tiles: Cache<TileKey, Arc<TileFile>>,
    capacity: u64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl LruTileCache {
    /// Create a cache holding at most `capacity` tiles.
    pub fn new(capacity: u64) -> Self {
        Self {
            tiles: Cache::builder().max_capacity(capacity).build(),
            capacity,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }
}

impl TileCache for LruTileCache {
    fn get_or_load(&self, key: TileKey, load: &dyn Fn() -> TileFile) -> Arc<TileFile> {
        let mut loaded = false;
        let tile = self.tiles.get_with(key, || {
            loaded = true;
            Arc::new(load())
        });

        if loaded {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        }
        tile
    }

    fn stats(&self) -> CacheStats {
        self.tiles.run_pending_tasks();
        CacheStats {
            entry_count: self.tiles.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            capacity: Some(self.capacity),
        }
    }

    fn clear(&self) {
        self.tiles.invalidate_all();
        self.tiles.run_pending_tasks();
    }
}
