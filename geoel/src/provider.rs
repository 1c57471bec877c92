//! Elevation lookups against a single dataset.
//!
//! An [`ElevationProvider`] owns one dataset directory and a tile cache. A
//! query on a grid intersection reads one sample; anything else reads the
//! four surrounding samples and interpolates bilinearly.
//!
//! # Loading tiles
//!
//! The first lookup touching a tile opens it. When the file is missing the
//! provider extracts a `.zip`/`.gz` archive lying next to it, or asks its
//! [`TileFetcher`] for the tile and decompresses the result, then opens it
//! once more. Whatever goes wrong on that path, the tile is cached as
//! unavailable and reads as void until the cache is cleared. Wrong-size tile
//! files and broken archives are deleted so a later run can fetch them
//! again.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CacheStats, TileCache, UnboundedTileCache};
use crate::coord::{Axis, GeoCoord};
use crate::dataset::Dataset;
use crate::error::{ElevationError, Result};
use crate::fetch::{ArchiveDecompressor, Compression, Decompressor, TileFetcher};
use crate::tile::{check_axes, TileAddress, TileFile};

/// Returned when a provider has no usable sample for a point.
pub const NO_DATA: f32 = -32768.0;

/// Lowest sample treated as real terrain (deepest ocean trench, metres).
pub const MIN_VALID_SAMPLE: i16 = -11000;

/// Samples at or above this are treated as invalid (Everest, metres).
pub const MAX_VALID_SAMPLE: i16 = 8850;

/// Whether a raw sample lies in the physically plausible range.
pub fn is_valid_sample(sample: i16) -> bool {
    (MIN_VALID_SAMPLE..MAX_VALID_SAMPLE).contains(&sample)
}

/// Bilinear interpolation over four corner samples.
///
/// `corners` are ordered north-west, north-east, south-west, south-east.
/// `p` is the position between the southern (0) and northern (1) corners,
/// `q` between the western (0) and eastern (1) corners. Invalid corners are
/// replaced by the mean of the valid ones; with no valid corner the result
/// is [`NO_DATA`]. The result carries a `+0.5` bias so that `floor()` gives
/// the nearest whole metre.
pub fn interpolate(corners: [i16; 4], p: f64, q: f64) -> f32 {
    let valid: Vec<f64> = corners
        .iter()
        .copied()
        .filter(|&v| is_valid_sample(v))
        .map(f64::from)
        .collect();
    if valid.is_empty() {
        return NO_DATA;
    }
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;

    let [e1, e2, e3, e4] = corners.map(|v| if is_valid_sample(v) { f64::from(v) } else { mean });

    ((1.0 - q) * p * e1 + q * p * e2 + (1.0 - q) * (1.0 - p) * e3 + q * (1.0 - p) * e4 + 0.5)
        as f32
}

/// Position of `value` between `lo` and `hi`, 0 when they coincide.
fn fraction(value: &GeoCoord, lo: &GeoCoord, hi: &GeoCoord) -> f64 {
    let span = hi.decimal() - lo.decimal();
    if span == 0 {
        0.0
    } else {
        f64::from(value.decimal() - lo.decimal()) / f64::from(span)
    }
}

/// Elevation source for one dataset.
pub struct ElevationProvider {
    dataset: Dataset,
    dir: PathBuf,
    cache: Box<dyn TileCache>,
    fetcher: Option<Arc<dyn TileFetcher>>,
    decompressor: Arc<dyn Decompressor>,
}

impl ElevationProvider {
    /// Provider reading `dataset` tiles from `dir`, with an unbounded cache,
    /// the built-in archive decompressor and no fetcher.
    pub fn new<P: AsRef<Path>>(dataset: Dataset, dir: P) -> Self {
        Self {
            dataset,
            dir: dir.as_ref().to_path_buf(),
            cache: Box::new(UnboundedTileCache::new()),
            fetcher: None,
            decompressor: Arc::new(ArchiveDecompressor),
        }
    }

    /// Replace the tile cache.
    pub fn with_cache(mut self, cache: Box<dyn TileCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Fetch missing tiles with `fetcher`.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn TileFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Unpack fetched and local archives with `decompressor`.
    pub fn with_decompressor(mut self, decompressor: Arc<dyn Decompressor>) -> Self {
        self.decompressor = decompressor;
        self
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn dataset_name(&self) -> &'static str {
        self.dataset.name()
    }

    pub fn sample_spacing_seconds(&self) -> u32 {
        self.dataset.spacing_seconds()
    }

    /// Grid spacing as a coordinate delta on `axis`.
    pub fn grid_spacing(&self, axis: Axis) -> GeoCoord {
        self.dataset.grid_spacing(axis)
    }

    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    pub fn has_fetcher(&self) -> bool {
        self.fetcher.is_some()
    }

    /// Elevation at `(lat, lon)` in metres, or [`NO_DATA`].
    pub fn elevation_at(&self, lat: &GeoCoord, lon: &GeoCoord) -> f32 {
        self.try_elevation_at(lat, lon).unwrap_or(NO_DATA)
    }

    /// Elevation at `(lat, lon)` in metres.
    ///
    /// Missing tiles and void samples yield `Ok(NO_DATA)`.
    ///
    /// # Errors
    ///
    /// [`ElevationError::AxisMismatch`] if `lat` is not a latitude or `lon`
    /// is not a longitude.
    pub fn try_elevation_at(&self, lat: &GeoCoord, lon: &GeoCoord) -> Result<f32> {
        check_axes(lat, lon)?;
        let lat_step = self.grid_spacing(Axis::Latitude);
        let lon_step = self.grid_spacing(Axis::Longitude);

        if lat.is_on_raster(&lat_step) && lon.is_on_raster(&lon_step) {
            let sample = self.sample_at(lat, lon)?;
            return Ok(if is_valid_sample(sample) {
                f32::from(sample)
            } else {
                NO_DATA
            });
        }

        let south = lat.to_raster_left(&lat_step);
        let north = lat.to_raster_right(&lat_step);
        let west = lon.to_raster_left(&lon_step);
        let east = lon.to_raster_right(&lon_step);

        let corners = [
            self.sample_at(&north, &west)?,
            self.sample_at(&north, &east)?,
            self.sample_at(&south, &west)?,
            self.sample_at(&south, &east)?,
        ];

        Ok(interpolate(
            corners,
            fraction(lat, &south, &north),
            fraction(lon, &west, &east),
        ))
    }

    /// Raw sample at the grid point `(lat, lon)`, loading its tile if needed.
    ///
    /// Returns [`VOID_VALUE`](crate::VOID_VALUE) when the tile is unavailable.
    pub fn sample_at(&self, lat: &GeoCoord, lon: &GeoCoord) -> Result<i16> {
        check_axes(lat, lon)?;
        let address = TileAddress::locate(self.dataset, lat, lon);
        let tile = self
            .cache
            .get_or_load(address.key, &|| self.load_tile(&address));
        Ok(tile.sample(address.offset(tile.samples_per_edge())))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Close every cached tile and forget unavailable tiles.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Tile files and archives present in the dataset directory, as sorted
    /// tile file names (`N47E008.hgt.zip` is listed as `N47E008.hgt`).
    pub fn scan_tile_files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let tile_suffix = format!("{}.hgt", self.dataset.file_suffix());
        let names: BTreeSet<String> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let name = name
                    .strip_suffix(".zip")
                    .or_else(|| name.strip_suffix(".gz"))
                    .unwrap_or(&name)
                    .to_string();
                let base = name.strip_suffix(&tile_suffix)?;
                (base.len() == 7).then_some(name)
            })
            .collect();
        names.into_iter().collect()
    }

    /// Open a tile for the cache, falling back to a tombstone.
    fn load_tile(&self, address: &TileAddress) -> TileFile {
        let name = self.dataset.tile_file_name(&address.base_name());
        let path = self.dir.join(&name);

        match self.open_or_fetch(&name, &path) {
            Ok(tile) => {
                debug!(dataset = self.dataset_name(), tile = %name, "Opened tile");
                tile
            }
            Err(e @ (ElevationError::TileNotFound { .. } | ElevationError::RemoteNotFound { .. })) => {
                debug!(dataset = self.dataset_name(), tile = %name, error = %e, "Tile not available");
                TileFile::unavailable(&path)
            }
            Err(e) => {
                warn!(dataset = self.dataset_name(), tile = %name, error = %e, "Tile marked unavailable");
                TileFile::unavailable(&path)
            }
        }
    }

    fn open_or_fetch(&self, name: &str, path: &Path) -> Result<TileFile> {
        match self.open_checked(path) {
            Err(ElevationError::TileNotFound { .. }) => {}
            other => return other,
        }

        let archive = match self.local_archive(path) {
            Some(archive) => Some(archive),
            None => self.fetch(name, path)?,
        };

        if let Some(archive) = archive {
            let unpacked = match self.decompressor.decompress(&archive) {
                Ok(unpacked) => unpacked,
                Err(e) => {
                    remove_stale(&archive);
                    return Err(e);
                }
            };
            if unpacked != path {
                debug!(
                    from = %unpacked.display(),
                    to = %path.display(),
                    "Moving unpacked tile into place"
                );
                fs::rename(&unpacked, path)?;
            }
        }

        self.open_checked(path)
    }

    /// Open the tile, deleting it when its size is wrong.
    fn open_checked(&self, path: &Path) -> Result<TileFile> {
        let result = TileFile::open(path, self.dataset.samples_per_edge());
        if let Err(ElevationError::InvalidFileSize { .. }) = result {
            remove_stale(path);
        }
        result
    }

    /// An archive of the tile already present on disk.
    fn local_archive(&self, path: &Path) -> Option<PathBuf> {
        [Compression::Zip, Compression::Gzip]
            .iter()
            .map(|c| c.archive_path(path))
            .find(|p| p.is_file())
    }

    /// Fetch a missing tile. Returns the archive to unpack, if any.
    fn fetch(&self, name: &str, path: &Path) -> Result<Option<PathBuf>> {
        let Some(fetcher) = &self.fetcher else {
            return Err(ElevationError::TileNotFound {
                path: path.to_path_buf(),
            });
        };

        fs::create_dir_all(&self.dir)?;
        let compression = fetcher.compression();
        let dest = compression.archive_path(path);

        info!(dataset = self.dataset_name(), tile = %name, "Fetching missing tile");
        fetcher.fetch(name, &dest)?;

        Ok((compression != Compression::None).then_some(dest))
    }
}

fn remove_stale(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => warn!(path = %path.display(), "Deleted unusable tile file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Could not delete unusable tile file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::VOID_VALUE;
    use std::io::Write;
    use tempfile::TempDir;

    /// Write a complete tile whose samples come from `value(row, col)`.
    fn write_tile(
        dir: &Path,
        dataset: Dataset,
        base: &str,
        value: impl Fn(usize, usize) -> i16,
    ) -> PathBuf {
        let n = dataset.samples_per_edge();
        let mut data = Vec::with_capacity(n * n * 2);
        for row in 0..n {
            for col in 0..n {
                data.extend_from_slice(&value(row, col).to_be_bytes());
            }
        }
        let path = dir.join(dataset.tile_file_name(base));
        fs::write(&path, data).unwrap();
        path
    }

    fn grid_value(row: usize, col: usize) -> i16 {
        (row * 100 + col) as i16
    }

    fn lat(text: &str) -> GeoCoord {
        GeoCoord::parse(Axis::Latitude, text).unwrap()
    }

    fn lon(text: &str) -> GeoCoord {
        GeoCoord::parse(Axis::Longitude, text).unwrap()
    }

    #[test]
    fn test_is_valid_sample() {
        assert!(is_valid_sample(0));
        assert!(is_valid_sample(-11000));
        assert!(is_valid_sample(8849));
        assert!(!is_valid_sample(8850));
        assert!(!is_valid_sample(-11001));
        assert!(!is_valid_sample(VOID_VALUE));
    }

    #[test]
    fn test_interpolate_formula() {
        assert_eq!(interpolate([503, 504, 603, 604], 0.5, 0.5), 554.0);
        // p = 1, q = 0 is the north-west corner
        assert_eq!(interpolate([100, 200, 300, 400], 1.0, 0.0), 100.5);
        assert_eq!(interpolate([100, 200, 300, 400], 0.0, 1.0), 400.5);
        assert_eq!(interpolate([VOID_VALUE; 4], 0.5, 0.5), NO_DATA);
        assert_eq!(interpolate([9000, 8850, -12000, VOID_VALUE], 0.2, 0.3), NO_DATA);
    }

    #[test]
    fn test_interpolate_substitutes_mean() {
        let (p, q) = (0.3, 0.8);
        let mean = (504.0 + 603.0 + 604.0) / 3.0;
        let expected = (1.0 - q) * p * mean
            + q * p * 504.0
            + (1.0 - q) * (1.0 - p) * 603.0
            + q * (1.0 - p) * 604.0
            + 0.5;
        let got = interpolate([VOID_VALUE, 504, 603, 604], p, q);
        assert!((got as f64 - expected).abs() < 1e-3, "{got} vs {expected}");
    }

    #[test]
    fn test_exact_grid_point() {
        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), Dataset::Etopo, "N47E008", grid_value);
        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());

        // 30' north of 47° is row 6, 15' east of 8° is column 3
        assert_eq!(provider.elevation_at(&lat("47:30 N"), &lon("8:15 E")), 603.0);
        assert_eq!(provider.sample_at(&lat("47:30 N"), &lon("8:15 E")).unwrap(), 603);
        // south-west corner of the tile is the last row
        assert_eq!(provider.elevation_at(&lat("47 N"), &lon("8 E")), 1200.0);
    }

    #[test]
    fn test_interpolated_point() {
        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), Dataset::Etopo, "N47E008", grid_value);
        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());

        // halfway between rows 5/6 and columns 3/4
        let e = provider.elevation_at(&lat("47:32:30 N"), &lon("8:17:30 E"));
        assert_eq!(e, 554.0);

        // on a latitude line, between two columns
        let e = provider.elevation_at(&lat("47:30 N"), &lon("8:16 E"));
        let expected = 0.8 * 603.0 + 0.2 * 604.0 + 0.5;
        assert!((e as f64 - expected).abs() < 1e-3);
    }

    #[test]
    fn test_missing_corner_uses_mean() {
        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), Dataset::Etopo, "N47E008", |row, col| {
            if (row, col) == (5, 3) {
                VOID_VALUE
            } else {
                grid_value(row, col)
            }
        });
        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());

        let e = provider.elevation_at(&lat("47:32:30 N"), &lon("8:17:30 E"));
        assert_eq!(e, interpolate([VOID_VALUE, 504, 603, 604], 0.5, 0.5));
        let mean = (504.0 + 603.0 + 604.0) / 3.0;
        let expected = 0.25 * (mean + 504.0 + 603.0 + 604.0) + 0.5;
        assert!((e as f64 - expected).abs() < 1e-3);
    }

    #[test]
    fn test_all_corners_invalid() {
        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), Dataset::Etopo, "N47E008", |_, _| VOID_VALUE);
        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());

        assert_eq!(provider.elevation_at(&lat("47:32 N"), &lon("8:17 E")), NO_DATA);
        assert_eq!(provider.elevation_at(&lat("47:30 N"), &lon("8:15 E")), NO_DATA);
    }

    #[test]
    fn test_southern_western_tile() {
        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), Dataset::Etopo, "S05W009", grid_value);
        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());

        // 30' south of 4°S is row 6; 15' west of 8°W is 45' east of 9°W, column 9
        assert_eq!(provider.elevation_at(&lat("4:30 S"), &lon("8:15 W")), 609.0);
    }

    #[test]
    fn test_missing_tile_is_cached_as_unavailable() {
        let dir = TempDir::new().unwrap();
        let provider = ElevationProvider::new(Dataset::Srtm3, dir.path());

        assert_eq!(provider.elevation_at(&lat("10:00 N"), &lon("10:00 E")), NO_DATA);
        assert_eq!(provider.elevation_at(&lat("10:30 N"), &lon("10:30 E")), NO_DATA);

        let stats = provider.cache_stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.entry_count, 1);
        assert!(stats.hit_count >= 1);
    }

    #[test]
    fn test_local_archive_is_extracted() {
        let dir = TempDir::new().unwrap();
        let tile = write_tile(dir.path(), Dataset::Etopo, "N47E008", grid_value);
        let bytes = fs::read(&tile).unwrap();
        fs::remove_file(&tile).unwrap();

        let archive = dir.path().join("N47E008_etopo5.hgt.zip");
        {
            let mut zip = zip::ZipWriter::new(fs::File::create(&archive).unwrap());
            zip.start_file("N47E008_etopo5.hgt", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(&bytes).unwrap();
            zip.finish().unwrap();
        }

        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());
        assert_eq!(provider.elevation_at(&lat("47:30 N"), &lon("8:15 E")), 603.0);
        assert!(tile.exists());
        assert!(!archive.exists());
    }

    /// Copies the archive verbatim to a fixed file name.
    struct RenamingDecompressor;

    impl Decompressor for RenamingDecompressor {
        fn decompress(&self, archive: &Path) -> Result<PathBuf> {
            let out = archive.with_file_name("unpacked.bin");
            fs::copy(archive, &out)?;
            fs::remove_file(archive)?;
            Ok(out)
        }
    }

    #[test]
    fn test_unpacked_tile_is_moved_into_place() {
        let dir = TempDir::new().unwrap();
        let tile = write_tile(dir.path(), Dataset::Etopo, "N47E008", grid_value);
        let archive = dir.path().join("N47E008_etopo5.hgt.zip");
        fs::rename(&tile, &archive).unwrap();

        let provider = ElevationProvider::new(Dataset::Etopo, dir.path())
            .with_decompressor(Arc::new(RenamingDecompressor));
        assert_eq!(provider.elevation_at(&lat("47:30 N"), &lon("8:15 E")), 603.0);
        assert!(tile.exists());
        assert!(!archive.exists());
        assert!(!dir.path().join("unpacked.bin").exists());
    }

    #[test]
    fn test_wrong_size_tile_is_deleted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("N47E008_etopo5.hgt");
        fs::write(&path, [0u8; 10]).unwrap();

        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());
        assert_eq!(provider.elevation_at(&lat("47:30 N"), &lon("8:15 E")), NO_DATA);
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_archive_is_deleted() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("N47E008.hgt.zip");
        fs::write(&archive, b"not a zip").unwrap();

        let provider = ElevationProvider::new(Dataset::Srtm3, dir.path());
        assert_eq!(provider.elevation_at(&lat("47:30 N"), &lon("8:15 E")), NO_DATA);
        assert!(!archive.exists());
    }

    #[test]
    fn test_axis_mismatch() {
        let dir = TempDir::new().unwrap();
        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());

        let result = provider.try_elevation_at(&lon("8:15 E"), &lon("8:15 E"));
        assert!(matches!(result, Err(ElevationError::AxisMismatch { .. })));
        assert_eq!(provider.elevation_at(&lat("8:15 N"), &lat("8:15 N")), NO_DATA);
    }

    #[test]
    fn test_clear_cache_retries_tile() {
        let dir = TempDir::new().unwrap();
        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());
        assert_eq!(provider.elevation_at(&lat("47:30 N"), &lon("8:15 E")), NO_DATA);

        // a tile appearing later is only seen after the tombstone is cleared
        write_tile(dir.path(), Dataset::Etopo, "N47E008", grid_value);
        assert_eq!(provider.elevation_at(&lat("47:30 N"), &lon("8:15 E")), NO_DATA);

        provider.clear_cache();
        assert_eq!(provider.elevation_at(&lat("47:30 N"), &lon("8:15 E")), 603.0);
    }

    #[test]
    fn test_scan_tile_files() {
        let dir = TempDir::new().unwrap();
        write_tile(dir.path(), Dataset::Etopo, "N47E008", grid_value);
        fs::write(dir.path().join("N47E008_etopo5.hgt.zip"), b"").unwrap();
        fs::write(dir.path().join("S05W009_etopo5.hgt.gz"), b"").unwrap();
        fs::write(dir.path().join("N10E010.hgt"), b"").unwrap();
        fs::write(dir.path().join("readme.txt"), b"").unwrap();

        let provider = ElevationProvider::new(Dataset::Etopo, dir.path());
        assert_eq!(
            provider.scan_tile_files(),
            vec!["N47E008_etopo5.hgt", "S05W009_etopo5.hgt"]
        );

        let missing = ElevationProvider::new(Dataset::Etopo, dir.path().join("nope"));
        assert!(missing.scan_tile_files().is_empty());
    }

    #[test]
    fn test_metadata() {
        let provider = ElevationProvider::new(Dataset::Globe, "/tmp/globe");
        assert_eq!(provider.dataset_name(), "GLOBE");
        assert_eq!(provider.sample_spacing_seconds(), 30);
        assert_eq!(provider.grid_spacing(Axis::Latitude).seconds(), 30);
        assert_eq!(provider.data_dir(), Path::new("/tmp/globe"));
        assert!(!provider.has_fetcher());
    }
}
