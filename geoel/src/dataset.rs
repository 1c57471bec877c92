//! The tiled elevation datasets the engine knows how to read.
//!
//! Every dataset is cut into one-degree tiles stored as square grids of
//! big-endian `i16` samples. Tiles share their edge rows and columns with
//! their neighbours, so a tile with spacing `s` arc-seconds holds
//! `3600 / s + 1` samples per edge.

use std::fmt;
use std::str::FromStr;

use crate::coord::{Axis, GeoCoord, UNITS_PER_SECOND};

/// A tiled elevation dataset.
///
/// Variants are ordered from coarsest to finest resolution, which is also
/// the fallback order used by [`ElevationLayer`](crate::ElevationLayer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dataset {
    /// ETOPO5: 5 arc-minute global relief, land and sea floor.
    Etopo,
    /// GLOBE: 30 arc-second global land elevation.
    Globe,
    /// SRTM3: 3 arc-second (~90m) radar topography.
    Srtm3,
    /// SRTM1: 1 arc-second (~30m) radar topography.
    Srtm1,
}

impl Dataset {
    /// All datasets, coarsest first.
    pub const ALL: [Dataset; 4] = [
        Dataset::Etopo,
        Dataset::Globe,
        Dataset::Srtm3,
        Dataset::Srtm1,
    ];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Etopo => "ETOPO",
            Dataset::Globe => "GLOBE",
            Dataset::Srtm3 => "SRTM3",
            Dataset::Srtm1 => "SRTM1",
        }
    }

    /// Sub-directory below the data root holding this dataset's tiles.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Dataset::Etopo => "etopo",
            Dataset::Globe => "globe",
            Dataset::Srtm3 => "srtm3",
            Dataset::Srtm1 => "srtm1",
        }
    }

    /// Distance between neighbouring samples in arc-seconds.
    pub fn spacing_seconds(&self) -> u32 {
        match self {
            Dataset::Etopo => 300,
            Dataset::Globe => 30,
            Dataset::Srtm3 => 3,
            Dataset::Srtm1 => 1,
        }
    }

    /// Samples per tile row (and per column).
    pub fn samples_per_edge(&self) -> usize {
        (3600 / self.spacing_seconds() + 1) as usize
    }

    /// Exact byte size of a complete tile file.
    pub fn tile_size_bytes(&self) -> u64 {
        let n = self.samples_per_edge() as u64;
        n * n * 2
    }

    /// Approximate ground distance between samples at the equator.
    pub fn approx_meters(&self) -> f64 {
        self.spacing_seconds() as f64 * 30.0
    }

    /// Suffix inserted between the tile base name and the `.hgt` extension.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Dataset::Etopo => "_etopo5",
            Dataset::Globe => "_globe30",
            Dataset::Srtm3 | Dataset::Srtm1 => "",
        }
    }

    /// Tile file name for a base name such as `N47E008`.
    pub fn tile_file_name(&self, base_name: &str) -> String {
        format!("{}{}.hgt", base_name, self.file_suffix())
    }

    /// The sample spacing as a coordinate delta on `axis`, suitable for
    /// [`GeoCoord::to_raster_left`] and friends.
    pub fn grid_spacing(&self, axis: Axis) -> GeoCoord {
        GeoCoord::from_decimal(axis, self.spacing_seconds() as i32 * UNITS_PER_SECOND)
    }

    /// Identify a dataset from the size of a tile file.
    pub fn from_file_size(size: u64) -> Option<Dataset> {
        Self::ALL.into_iter().find(|d| d.tile_size_bytes() == size)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown dataset '{s}' (expected etopo, globe, srtm3 or srtm1)"))
    }
}
