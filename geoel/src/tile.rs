//! Tile addressing and memory-mapped tile files.
//!
//! A tile file covers one degree of latitude by one degree of longitude.
//! Its rows run north to south and its columns west to east, whatever
//! hemisphere it lies in, so locating a sample needs a hemisphere-dependent
//! mirror on each axis.
//!
//! Tiles are named after their south-west corner (`N47E008`, `S05W010`).
//! A point exactly on a degree line in the northern or eastern hemisphere
//! lands in the tile starting at that line; in the southern or western
//! hemisphere it lands in the tile ending at that line.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use memmap2::Mmap;

use crate::coord::{Axis, GeoCoord, UNITS_PER_DEGREE, UNITS_PER_SECOND};
use crate::dataset::Dataset;
use crate::error::{ElevationError, Result};

/// Value indicating no data (void) in a tile, also returned by unavailable tiles.
pub const VOID_VALUE: i16 = -32768;

/// Integer identifying one tile's geographic position.
pub type TileKey = u32;

/// Offset added to the tile degree of southern latitudes and western
/// longitudes in a [`TileKey`].
const HEMISPHERE_OFFSET: u32 = 256;

/// Where a grid point lives: which tile, and which sample inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAddress {
    /// Cache key for the tile.
    pub key: TileKey,
    /// `N` or `S`.
    pub lat_prefix: char,
    /// Latitude degrees in the tile name.
    pub lat_deg: u32,
    /// `E` or `W`.
    pub lon_prefix: char,
    /// Longitude degrees in the tile name.
    pub lon_deg: u32,
    /// Sample row, 0 = north edge.
    pub row: usize,
    /// Sample column, 0 = west edge.
    pub col: usize,
}

impl TileAddress {
    /// Address of the grid sample at `(lat, lon)` in `dataset`.
    ///
    /// The coordinate is expected to lie on the dataset's grid; otherwise
    /// the sample towards the degree line nearer zero is chosen.
    pub fn locate(dataset: Dataset, lat: &GeoCoord, lon: &GeoCoord) -> Self {
        let spacing = dataset.spacing_seconds();
        let last = dataset.samples_per_edge() - 1;

        let (lat_deg, lat_steps) = axis_position(lat, spacing);
        let (lon_deg, lon_steps) = axis_position(lon, spacing);

        let row = if lat.is_negative() {
            lat_steps
        } else {
            last - lat_steps
        };
        let col = if lon.is_negative() {
            last - lon_steps
        } else {
            lon_steps
        };

        Self {
            key: tile_key(lat_deg, lat.is_negative(), lon_deg, lon.is_negative()),
            lat_prefix: lat.direction(),
            lat_deg,
            lon_prefix: lon.direction(),
            lon_deg,
            row,
            col,
        }
    }

    /// Tile name without suffix or extension, e.g. `N47E008`.
    pub fn base_name(&self) -> String {
        format!(
            "{}{:02}{}{:03}",
            self.lat_prefix, self.lat_deg, self.lon_prefix, self.lon_deg
        )
    }

    /// Flat sample index inside a tile with `samples_per_edge` columns.
    pub fn offset(&self, samples_per_edge: usize) -> usize {
        samples_per_edge * self.row + self.col
    }
}

/// Encode a tile's degree position as a [`TileKey`].
pub fn tile_key(lat_deg: u32, south: bool, lon_deg: u32, west: bool) -> TileKey {
    let lat = if south { lat_deg + HEMISPHERE_OFFSET } else { lat_deg };
    let lon = if west { lon_deg + HEMISPHERE_OFFSET } else { lon_deg };
    lon * 1024 + lat
}

/// Tile degree for the name, and sample steps from the tile edge nearest
/// zero along this axis.
fn axis_position(coord: &GeoCoord, spacing_seconds: u32) -> (u32, usize) {
    let units = coord.decimal().unsigned_abs();
    let per_degree = UNITS_PER_DEGREE as u32;

    if coord.is_negative() {
        let deg = units.div_ceil(per_degree);
        let into = units - (deg - 1) * per_degree;
        (deg, (into / UNITS_PER_SECOND as u32 / spacing_seconds) as usize)
    } else {
        (
            coord.degrees(),
            (coord.seconds_in_degree() / spacing_seconds) as usize,
        )
    }
}

/// Check that `lat`/`lon` carry the axis their position implies.
pub(crate) fn check_axes(lat: &GeoCoord, lon: &GeoCoord) -> Result<()> {
    if lat.axis() != Axis::Latitude {
        return Err(ElevationError::AxisMismatch {
            expected: Axis::Latitude,
            found: lat.axis(),
        });
    }
    if lon.axis() != Axis::Longitude {
        return Err(ElevationError::AxisMismatch {
            expected: Axis::Longitude,
            found: lon.axis(),
        });
    }
    Ok(())
}

/// Value range and void count of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSummary {
    pub min: i16,
    pub max: i16,
    pub void_count: usize,
    pub total: usize,
}

impl TileSummary {
    /// Share of void samples, 0-100.
    pub fn void_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.void_count as f64 / self.total as f64 * 100.0
        }
    }
}

/// One opened tile: a memory-mapped grid of big-endian `i16` samples.
///
/// A tile that could not be loaded is kept as an *unavailable* tombstone so
/// the failure is remembered; every read from it yields [`VOID_VALUE`].
#[derive(Debug)]
pub struct TileFile {
    path: PathBuf,
    samples: usize,
    data: RwLock<Option<Mmap>>,
}

impl TileFile {
    /// Memory-map the tile at `path`.
    ///
    /// # Errors
    ///
    /// - [`ElevationError::TileNotFound`] if nothing exists at `path`.
    /// - [`ElevationError::InvalidFileSize`] if the file is empty or its size
    ///   does not match `samples_per_edge`.
    /// - [`ElevationError::Io`] if the file cannot be opened or mapped.
    pub fn open<P: AsRef<Path>>(path: P, samples_per_edge: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ElevationError::TileNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let size = file.metadata()?.len();
        let expected = (samples_per_edge * samples_per_edge * 2) as u64;
        if size != expected {
            return Err(ElevationError::InvalidFileSize {
                path: path.to_path_buf(),
                size,
                expected,
            });
        }

        // SAFETY: the mapping is read-only and private to this struct; tile
        // files are not rewritten while the engine has them open.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Self {
            path: path.to_path_buf(),
            samples: samples_per_edge,
            data: RwLock::new(Some(mmap)),
        })
    }

    /// Open a tile file of any known dataset, detecting it from the size.
    pub fn open_detect<P: AsRef<Path>>(path: P) -> Result<(Self, Dataset)> {
        let path = path.as_ref();
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ElevationError::TileNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let dataset = Dataset::from_file_size(size).ok_or(ElevationError::InvalidFileSize {
            path: path.to_path_buf(),
            size,
            expected: Dataset::Srtm3.tile_size_bytes(),
        })?;
        Ok((Self::open(path, dataset.samples_per_edge())?, dataset))
    }

    /// A tombstone for a tile that could not be loaded.
    pub fn unavailable<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            samples: 0,
            data: RwLock::new(None),
        }
    }

    /// Whether samples can be read from this tile.
    pub fn is_available(&self) -> bool {
        self.data.read().map(|d| d.is_some()).unwrap_or(false)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Samples per row/column (0 for a tombstone).
    pub fn samples_per_edge(&self) -> usize {
        self.samples
    }

    /// Raw sample at a flat index, or [`VOID_VALUE`] if the tile is
    /// unavailable or the index is outside the grid.
    pub fn sample(&self, index: usize) -> i16 {
        let Ok(guard) = self.data.read() else {
            return VOID_VALUE;
        };
        let Some(data) = guard.as_ref() else {
            return VOID_VALUE;
        };
        let offset = index * 2;
        match data.get(offset..offset + 2) {
            Some(bytes) => i16::from_be_bytes([bytes[0], bytes[1]]),
            None => VOID_VALUE,
        }
    }

    /// Raw sample at `row` (0 = north) and `col` (0 = west).
    pub fn sample_at(&self, row: usize, col: usize) -> i16 {
        if row >= self.samples || col >= self.samples {
            return VOID_VALUE;
        }
        self.sample(row * self.samples + col)
    }

    /// Minimum, maximum and void count over the whole grid.
    ///
    /// Returns `None` for an unavailable tile. `min`/`max` are
    /// [`VOID_VALUE`] when every sample is void.
    pub fn summary(&self) -> Option<TileSummary> {
        let guard = self.data.read().ok()?;
        let data = guard.as_ref()?;

        let mut min = i16::MAX;
        let mut max = i16::MIN;
        let mut void_count = 0;
        for chunk in data.chunks_exact(2) {
            let value = i16::from_be_bytes([chunk[0], chunk[1]]);
            if value == VOID_VALUE {
                void_count += 1;
                continue;
            }
            min = min.min(value);
            max = max.max(value);
        }

        let total = data.len() / 2;
        if void_count == total {
            min = VOID_VALUE;
            max = VOID_VALUE;
        }
        Some(TileSummary {
            min,
            max,
            void_count,
            total,
        })
    }

    /// Release the mapping. Calling it again is a no-op.
    pub fn close(&self) {
        if let Ok(mut guard) = self.data.write() {
            guard.take();
        }
    }
}
