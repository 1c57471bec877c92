//! Zoom-dependent dataset selection with fallback to coarser data.
//!
//! [`ElevationLayer`] owns one [`ElevationProvider`] per dataset. A lookup
//! starts at the dataset matching the zoom level and walks towards coarser
//! datasets until one has data, since the fine datasets have gaps (oceans,
//! polar regions) that the coarse ones cover.
//!
//! | Zoom | Dataset |
//! |------|---------|
//! | 0-4  | ETOPO   |
//! | 5-8  | GLOBE   |
//! | 9+   | SRTM3   |
//! | 15+  | SRTM1, when enabled |

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{CacheStats, LruTileCache, TileCache, UnboundedTileCache};
use crate::config;
use crate::coord::{Axis, GeoCoord};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::fetch::{ArchiveDecompressor, Decompressor, TileFetcher};
use crate::provider::{ElevationProvider, NO_DATA};

#[cfg(feature = "download")]
use crate::download::{DownloadConfig, HttpFetcher};

/// Returned when every dataset in the fallback chain failed.
pub const LOOKUP_FAILED: f32 = f32::MIN;

/// Highest zoom served by ETOPO.
const ETOPO_MAX_ZOOM: u32 = 4;

/// Highest zoom served by GLOBE.
const GLOBE_MAX_ZOOM: u32 = 8;

/// Lowest zoom served by SRTM1 when it is enabled.
const SRTM1_MIN_ZOOM: u32 = 15;

/// Multi-resolution elevation source.
///
/// # Example
///
/// ```no_run
/// use geoel::{Axis, ElevationLayer, GeoCoord};
///
/// let layer = ElevationLayer::builder("/data/elevation").build()?;
/// let lat = GeoCoord::parse(Axis::Latitude, "47:30:00 N")?;
/// let lon = GeoCoord::parse(Axis::Longitude, "008:15:00 E")?;
///
/// match layer.elevation(&lat, &lon, 12) {
///     Some(metres) => println!("{metres:.0}m"),
///     None => println!("no data"),
/// }
/// # Ok::<(), geoel::ElevationError>(())
/// ```
pub struct ElevationLayer {
    root: PathBuf,
    /// One provider per dataset, indexed in `Dataset::ALL` order.
    providers: Vec<ElevationProvider>,
    srtm1_enabled: bool,
}

impl ElevationLayer {
    /// Start configuring a layer rooted at `root`.
    pub fn builder<P: AsRef<Path>>(root: P) -> ElevationLayerBuilder {
        ElevationLayerBuilder::new(root)
    }

    /// Index into the provider list for `zoom`.
    pub fn provider_index(&self, zoom: u32) -> usize {
        match zoom {
            0..=ETOPO_MAX_ZOOM => 0,
            z if z <= GLOBE_MAX_ZOOM => 1,
            z if z >= SRTM1_MIN_ZOOM && self.srtm1_enabled => 3,
            _ => 2,
        }
    }

    /// The dataset a lookup at `zoom` starts with.
    pub fn dataset_for_zoom(&self, zoom: u32) -> Dataset {
        Dataset::ALL[self.provider_index(zoom)]
    }

    /// Elevation in metres at `(lat, lon)` for `zoom`.
    ///
    /// Returns [`LOOKUP_FAILED`] when no dataset, down to ETOPO, has data.
    pub fn elevation_at(&self, lat: &GeoCoord, lon: &GeoCoord, zoom: u32) -> f32 {
        let mut index = self.provider_index(zoom);
        loop {
            let provider = &self.providers[index];
            match provider.try_elevation_at(lat, lon) {
                Ok(value) if value != NO_DATA => return value,
                Ok(_) => debug!(
                    dataset = provider.dataset_name(),
                    lat = %lat,
                    lon = %lon,
                    "No data, trying coarser dataset"
                ),
                Err(e) => debug!(
                    dataset = provider.dataset_name(),
                    error = %e,
                    "Lookup failed, trying coarser dataset"
                ),
            }

            if index == 0 {
                return LOOKUP_FAILED;
            }
            index -= 1;
        }
    }

    /// Like [`elevation_at`](Self::elevation_at) with `None` for a failed lookup.
    pub fn elevation(&self, lat: &GeoCoord, lon: &GeoCoord, zoom: u32) -> Option<f32> {
        let value = self.elevation_at(lat, lon, zoom);
        (value != LOOKUP_FAILED).then_some(value)
    }

    /// Lookup by decimal degrees.
    ///
    /// Returns `None` for non-finite values and for values outside ±90°
    /// latitude or ±180° longitude.
    pub fn elevation_degrees(&self, lat: f64, lon: f64, zoom: u32) -> Option<f32> {
        let in_range = |value: f64, axis: Axis| {
            value.is_finite() && value.abs() <= f64::from(axis.max_degrees())
        };
        if !in_range(lat, Axis::Latitude) || !in_range(lon, Axis::Longitude) {
            debug!(lat, lon, "Coordinates out of range");
            return None;
        }
        self.elevation(&GeoCoord::latitude(lat), &GeoCoord::longitude(lon), zoom)
    }

    /// Lookups for many `(lat, lon)` pairs in decimal degrees, in input order.
    pub fn elevations_batch(&self, points: &[(f64, f64)], zoom: u32) -> Vec<Option<f32>> {
        points
            .iter()
            .map(|&(lat, lon)| self.elevation_degrees(lat, lon, zoom))
            .collect()
    }

    /// The provider for `dataset`.
    pub fn provider(&self, dataset: Dataset) -> &ElevationProvider {
        &self.providers[dataset as usize]
    }

    pub fn providers(&self) -> &[ElevationProvider] {
        &self.providers
    }

    /// Cache counters per dataset, coarsest first.
    pub fn cache_stats(&self) -> Vec<(Dataset, CacheStats)> {
        self.providers
            .iter()
            .map(|p| (p.dataset(), p.cache_stats()))
            .collect()
    }

    /// Close every tile and forget unavailable tiles in all datasets.
    pub fn clear_cache(&self) {
        for provider in &self.providers {
            provider.clear_cache();
        }
    }

    /// Directory holding the dataset directories.
    pub fn data_root(&self) -> &Path {
        &self.root
    }

    pub fn srtm1_enabled(&self) -> bool {
        self.srtm1_enabled
    }
}

/// Builder for [`ElevationLayer`].
///
/// ```no_run
/// use geoel::ElevationLayerBuilder;
///
/// let layer = ElevationLayerBuilder::new("/data/elevation")
///     .cache_capacity(64)
///     .enable_srtm1(true)
///     .build()?;
/// # Ok::<(), geoel::ElevationError>(())
/// ```
pub struct ElevationLayerBuilder {
    root: Option<PathBuf>,
    cache_capacity: u64,
    srtm1: bool,
    fetchers: HashMap<Dataset, Arc<dyn TileFetcher>>,
    decompressor: Option<Arc<dyn Decompressor>>,
    #[cfg(feature = "download")]
    downloads: HashMap<Dataset, DownloadConfig>,
}

impl ElevationLayerBuilder {
    /// Builder rooted at `root`. An empty or missing root falls back to the
    /// home directory at build time.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
            cache_capacity: 0,
            srtm1: false,
            fetchers: HashMap::new(),
            decompressor: None,
            #[cfg(feature = "download")]
            downloads: HashMap::new(),
        }
    }

    /// Builder configured from `GEOEL_*` environment variables.
    ///
    /// See [`crate::config`] for the variables.
    pub fn from_env() -> Self {
        let builder = Self::new(config::env_string(config::DATA_DIR_ENV).unwrap_or_default())
            .cache_capacity(config::env_u64(config::CACHE_SIZE_ENV).unwrap_or(0))
            .enable_srtm1(config::env_flag(config::SRTM1_ENV));

        #[cfg(feature = "download")]
        let builder = builder.downloads_from_env();

        builder
    }

    #[cfg(feature = "download")]
    fn downloads_from_env(mut self) -> Self {
        if let Some(source) = config::env_string(config::DOWNLOAD_SOURCE_ENV) {
            match source.trim().to_lowercase().as_str() {
                "ardupilot" => {
                    self = self
                        .auto_download(Dataset::Srtm3, DownloadConfig::ardupilot_srtm3())
                        .auto_download(Dataset::Srtm1, DownloadConfig::ardupilot_srtm1());
                }
                other => tracing::warn!(source = other, "Unknown download source"),
            }
        }
        for dataset in Dataset::ALL {
            if let Some(template) = config::env_string(&config::download_url_env(dataset)) {
                self = self.auto_download(dataset, DownloadConfig::with_url_template(template));
            }
        }
        self
    }

    /// Override the root directory.
    pub fn data_dir<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Keep at most `capacity` tiles open per dataset, evicting the least
    /// recently used. `0` keeps every tile open (the default).
    pub fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Use SRTM1 from zoom 15 on.
    pub fn enable_srtm1(mut self, enabled: bool) -> Self {
        self.srtm1 = enabled;
        self
    }

    /// Fetch missing `dataset` tiles with `fetcher`.
    pub fn fetcher(mut self, dataset: Dataset, fetcher: Arc<dyn TileFetcher>) -> Self {
        self.fetchers.insert(dataset, fetcher);
        self
    }

    /// Download missing `dataset` tiles over HTTP.
    #[cfg(feature = "download")]
    pub fn auto_download(mut self, dataset: Dataset, config: DownloadConfig) -> Self {
        self.downloads.insert(dataset, config);
        self
    }

    /// Unpack archives with `decompressor` instead of the built-in one.
    pub fn decompressor(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        self.decompressor = Some(decompressor);
        self
    }

    /// Build the [`ElevationLayer`].
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP fetcher cannot be created.
    pub fn build(self) -> Result<ElevationLayer> {
        let root = config::resolve_data_root(self.root.as_deref());
        let decompressor = self
            .decompressor
            .unwrap_or_else(|| Arc::new(ArchiveDecompressor));

        #[cfg(feature = "download")]
        let mut fetchers = self.fetchers;
        #[cfg(not(feature = "download"))]
        let fetchers = self.fetchers;

        #[cfg(feature = "download")]
        for (dataset, config) in self.downloads {
            fetchers
                .entry(dataset)
                .or_insert(Arc::new(HttpFetcher::new(dataset, config)?));
        }

        let providers = Dataset::ALL
            .into_iter()
            .map(|dataset| {
                let cache: Box<dyn TileCache> = if self.cache_capacity > 0 {
                    Box::new(LruTileCache::new(self.cache_capacity))
                } else {
                    Box::new(UnboundedTileCache::new())
                };

                let mut provider = ElevationProvider::new(dataset, root.join(dataset.dir_name()))
                    .with_cache(cache)
                    .with_decompressor(Arc::clone(&decompressor));
                if let Some(fetcher) = fetchers.get(&dataset) {
                    provider = provider.with_fetcher(Arc::clone(fetcher));
                }
                provider
            })
            .collect();

        info!(
            root = %root.display(),
            cache_capacity = self.cache_capacity,
            srtm1 = self.srtm1,
            fetchers = fetchers.len(),
            "Elevation layer ready"
        );

        Ok(ElevationLayer {
            root,
            providers,
            srtm1_enabled: self.srtm1,
        })
    }
}
