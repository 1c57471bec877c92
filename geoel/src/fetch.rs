//! Collaborators used when a tile is missing on disk.
//!
//! A provider that cannot find a tile asks its [`TileFetcher`] to retrieve
//! it, then hands any archive to a [`Decompressor`] before reopening the
//! tile. The HTTP implementation lives in [`crate::download`] behind the
//! `download` feature; tests plug in their own implementations.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::info;
use zip::ZipArchive;

use crate::error::{ElevationError, Result};

/// Compression format of a fetched or locally dropped tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// No compression - raw .hgt file
    #[default]
    None,
    /// Gzip compression (.hgt.gz)
    Gzip,
    /// ZIP archive (.hgt.zip)
    Zip,
}

impl Compression {
    /// Detect compression format from a URL or filename.
    ///
    /// ```
    /// use geoel::fetch::Compression;
    ///
    /// assert_eq!(Compression::from_url("file.hgt.gz"), Compression::Gzip);
    /// assert_eq!(Compression::from_url("file.hgt.zip"), Compression::Zip);
    /// assert_eq!(Compression::from_url("file.hgt"), Compression::None);
    /// ```
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.ends_with(".gz") {
            Compression::Gzip
        } else if lower.ends_with(".zip") {
            Compression::Zip
        } else {
            Compression::None
        }
    }

    /// File extension appended to the tile name for this format.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gz"),
            Compression::Zip => Some("zip"),
        }
    }

    /// `path` with this format's extension appended, e.g.
    /// `N47E008.hgt` -> `N47E008.hgt.zip`.
    pub fn archive_path(&self, path: &Path) -> PathBuf {
        match self.extension() {
            Some(ext) => {
                let mut name = path.as_os_str().to_owned();
                name.push(".");
                name.push(ext);
                PathBuf::from(name)
            }
            None => path.to_path_buf(),
        }
    }
}

/// Retrieves tile files from somewhere else.
pub trait TileFetcher: Send + Sync {
    /// Store the tile called `remote_name` (e.g. `N47E008.hgt`) at `dest`.
    ///
    /// When [`compression`](Self::compression) is not `None`, `dest` is the
    /// archive path and the bytes are written as received.
    ///
    /// # Errors
    ///
    /// [`ElevationError::RemoteNotFound`] when the source does not have the
    /// tile; any other error is treated as a failed attempt.
    fn fetch(&self, remote_name: &str, dest: &Path) -> Result<()>;

    /// Format of the bytes written by [`fetch`](Self::fetch).
    fn compression(&self) -> Compression {
        Compression::None
    }
}

/// Unpacks tile archives.
pub trait Decompressor: Send + Sync {
    /// Unpack `archive` into a sibling file named without the archive
    /// extension and delete the archive. Returns the unpacked path, which
    /// the provider moves to the tile path when the two differ.
    fn decompress(&self, archive: &Path) -> Result<PathBuf>;
}

/// Handles `.zip` and `.gz` tile archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveDecompressor;

impl Decompressor for ArchiveDecompressor {
    fn decompress(&self, archive: &Path) -> Result<PathBuf> {
        let out = archive.with_extension("");
        let result = match Compression::from_url(&archive.to_string_lossy()) {
            Compression::Zip => extract_zip(archive, &out),
            Compression::Gzip => extract_gzip(archive, &out),
            Compression::None => {
                return Err(decompress_error(archive, "not a .zip or .gz archive"));
            }
        };

        if let Err(e) = result {
            let _ = fs::remove_file(&out);
            return Err(e);
        }

        fs::remove_file(archive)?;
        info!(archive = %archive.display(), tile = %out.display(), "Extracted tile");
        Ok(out)
    }
}

fn decompress_error(path: &Path, reason: impl ToString) -> ElevationError {
    ElevationError::Decompress {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Copy the first `.hgt` entry of a ZIP archive to `out`.
fn extract_zip(archive: &Path, out: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| decompress_error(archive, e))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| decompress_error(archive, e))?;
        if !entry.name().to_lowercase().ends_with(".hgt") {
            continue;
        }
        let mut writer = BufWriter::new(File::create(out)?);
        io::copy(&mut entry, &mut writer).map_err(|e| decompress_error(archive, e))?;
        writer.flush()?;
        return Ok(());
    }

    Err(decompress_error(archive, "no .hgt file found in ZIP archive"))
}

fn extract_gzip(archive: &Path, out: &Path) -> Result<()> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(archive)?));
    let mut writer = BufWriter::new(File::create(out)?);
    io::copy(&mut decoder, &mut writer).map_err(|e| decompress_error(archive, e))?;
    writer.flush()?;
    Ok(())
}
