//! # geoel - multi-resolution terrain elevation lookup
//!
//! Looks up terrain elevation for a geographic point from tiled, file-backed
//! datasets of increasing resolution (ETOPO, GLOBE, SRTM3, SRTM1), fetching
//! missing tiles on demand and interpolating between grid samples.
//!
//! ## Features
//!
//! - **Exact coordinates**: [`GeoCoord`] is fixed-point (1/60 arc-second),
//!   so grid snapping and tile addressing never suffer float drift
//! - **Memory-mapped tiles**: samples are read straight from the `.hgt` files
//! - **Fallback**: a lookup that finds no data in a fine dataset retries in
//!   coarser ones before giving up
//! - **Fetch on miss**: pluggable [`TileFetcher`] and [`Decompressor`];
//!   HTTP downloads with the `download` feature
//!
//! ## Quick Start
//!
//! ```no_run
//! use geoel::{Axis, ElevationLayer, GeoCoord, LOOKUP_FAILED};
//!
//! // tiles live in /data/elevation/{etopo,globe,srtm3,srtm1}/
//! let layer = ElevationLayer::builder("/data/elevation").build()?;
//!
//! let lat = GeoCoord::parse(Axis::Latitude, "47:30:00 N")?;
//! let lon = GeoCoord::parse(Axis::Longitude, "008:15:00 E")?;
//!
//! let elevation = layer.elevation_at(&lat, &lon, 12);
//! if elevation != LOOKUP_FAILED {
//!     println!("Elevation: {:.0}m", elevation.floor());
//! }
//! # Ok::<(), geoel::ElevationError>(())
//! ```
//!
//! ## Tile Format
//!
//! Each tile covers one degree square and holds `n × n` big-endian `i16`
//! samples, rows north to south. `n` is 13 for ETOPO (5'), 121 for GLOBE
//! (30"), 1201 for SRTM3 (3") and 3601 for SRTM1 (1"). The value -32768
//! marks a void.
//!
//! ## Sentinels
//!
//! - [`VOID_VALUE`]: raw sample of a void or unavailable tile
//! - [`NO_DATA`]: one dataset had nothing usable
//! - [`LOOKUP_FAILED`]: no dataset had anything usable

pub mod cache;
pub mod config;
pub mod coord;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod layer;
pub mod provider;
pub mod tile;

#[cfg(feature = "download")]
pub mod download;

// Re-export main types at crate root for convenience
pub use cache::{CacheStats, LruTileCache, TileCache, UnboundedTileCache};
pub use coord::{Axis, GeoCoord, ParseError};
pub use dataset::Dataset;
pub use error::{ElevationError, Result};
pub use fetch::{ArchiveDecompressor, Compression, Decompressor, TileFetcher};
pub use layer::{ElevationLayer, ElevationLayerBuilder, LOOKUP_FAILED};
pub use provider::{ElevationProvider, NO_DATA};
pub use tile::{TileAddress, TileFile, TileKey, TileSummary, VOID_VALUE};

#[cfg(feature = "download")]
pub use download::{DownloadConfig, HttpFetcher};
