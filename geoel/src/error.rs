//! Error types for the geoel library.

use std::path::PathBuf;
use thiserror::Error;

use crate::coord::{Axis, ParseError};

/// Errors that can occur while locating, loading or reading elevation tiles.
///
/// None of these ever escape [`ElevationLayer::elevation_at`]; they surface
/// from the lower-level provider and tile APIs so callers that want the
/// reason can have it.
///
/// [`ElevationLayer::elevation_at`]: crate::ElevationLayer::elevation_at
#[derive(Error, Debug)]
pub enum ElevationError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The tile file does not exist locally. This is the only open failure
    /// that triggers the fetch path.
    #[error("Tile file not found: {path}")]
    TileNotFound { path: PathBuf },

    /// File size doesn't match the dataset's sample grid.
    #[error("Invalid file size for {path}: {size} bytes (expected {expected})")]
    InvalidFileSize {
        path: PathBuf,
        size: u64,
        expected: u64,
    },

    /// The remote source does not have this tile (typically open ocean).
    #[error("Tile not found remotely: {filename}")]
    RemoteNotFound { filename: String },

    /// Download failed for a reason other than the tile being absent remotely.
    #[error("Failed to download {filename}: {reason}")]
    DownloadFailed { filename: String, reason: String },

    /// A tile archive could not be unpacked.
    #[error("Failed to decompress {path}: {reason}")]
    Decompress { path: PathBuf, reason: String },

    /// A latitude was passed where a longitude was expected, or vice versa.
    #[error("Expected a {expected} coordinate, got a {found}")]
    AxisMismatch { expected: Axis, found: Axis },

    /// Malformed coordinate text.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// HTTP transport error.
    #[cfg(feature = "download")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using [`ElevationError`].
pub type Result<T> = std::result::Result<T, ElevationError>;
