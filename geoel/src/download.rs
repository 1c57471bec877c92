//! HTTP tile fetcher.
//!
//! Only available with the `download` feature. [`HttpFetcher`] implements
//! [`TileFetcher`] on top of a blocking reqwest client and a configurable
//! [`DownloadConfig`].
//!
//! # URL Template Placeholders
//!
//! - `{filename}` - tile file name without `.hgt` (e.g. `N47E008_etopo5`)
//! - `{tile}` - tile base name (e.g. `N47E008`)
//! - `{lat_prefix}` / `{lat}` - `N`/`S` and latitude digits (`47`)
//! - `{lon_prefix}` / `{lon}` - `E`/`W` and longitude digits (`008`)
//! - `{continent}` - ArduPilot continent directory (e.g. `Eurasia`)
//! - `{dataset}` - dataset directory name (e.g. `srtm3`)

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{ElevationError, Result};
use crate::fetch::{Compression, TileFetcher};

/// Default timeout for HTTP requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Where tiles are downloaded from.
#[derive(Debug, Clone)]
pub enum TileSource {
    /// ArduPilot terrain server, SRTM1. Flat directory of `.hgt.zip` files.
    ArduPilotSrtm1,

    /// ArduPilot terrain server, SRTM3. `.hgt.zip` files grouped into
    /// continent sub-directories.
    ArduPilotSrtm3,

    /// Any server reachable through a URL template.
    Custom {
        /// URL template with placeholders
        url_template: String,
        /// Compression format of the downloaded file
        compression: Compression,
    },
}

/// Configuration for downloading tiles.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// The data source to download from.
    pub source: TileSource,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Number of retry attempts after a failed download.
    pub max_retries: u32,
}

impl DownloadConfig {
    /// Download from a URL template; compression is detected from the
    /// template's extension.
    ///
    /// ```
    /// use geoel::download::DownloadConfig;
    ///
    /// let config = DownloadConfig::with_url_template(
    ///     "https://example.com/{dataset}/{filename}.hgt.gz",
    /// );
    /// ```
    pub fn with_url_template(url_template: impl Into<String>) -> Self {
        let template = url_template.into();
        let compression = Compression::from_url(&template);
        Self::with_url_template_and_compression(template, compression)
    }

    /// Download from a URL template with an explicit compression format.
    pub fn with_url_template_and_compression(
        url_template: impl Into<String>,
        compression: Compression,
    ) -> Self {
        Self::from_source(TileSource::Custom {
            url_template: url_template.into(),
            compression,
        })
    }

    /// ArduPilot terrain server, SRTM1 (~25MB per tile).
    pub fn ardupilot_srtm1() -> Self {
        Self::from_source(TileSource::ArduPilotSrtm1)
    }

    /// ArduPilot terrain server, SRTM3 (~2.8MB per tile).
    pub fn ardupilot_srtm3() -> Self {
        Self::from_source(TileSource::ArduPilotSrtm3)
    }

    fn from_source(source: TileSource) -> Self {
        Self {
            source,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 3,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Format of the files served by this source.
    pub fn compression(&self) -> Compression {
        match &self.source {
            TileSource::Custom { compression, .. } => *compression,
            TileSource::ArduPilotSrtm1 | TileSource::ArduPilotSrtm3 => Compression::Zip,
        }
    }
}

/// Downloads tiles of one dataset over HTTP.
pub struct HttpFetcher {
    client: Client,
    config: DownloadConfig,
    dataset: Dataset,
}

impl HttpFetcher {
    /// Create a fetcher for `dataset` tiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created (e.g. TLS
    /// initialization failure).
    pub fn new(dataset: Dataset, config: DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ElevationError::DownloadFailed {
                filename: String::new(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            dataset,
        })
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Build the download URL for a tile file name such as `N47E008.hgt`.
    pub fn build_url(&self, remote_name: &str) -> Result<String> {
        let stem = remote_name.strip_suffix(".hgt").unwrap_or(remote_name);
        let parts = TileNameParts::parse(stem).ok_or_else(|| ElevationError::DownloadFailed {
            filename: remote_name.to_string(),
            reason: "Invalid tile name".to_string(),
        })?;

        match &self.config.source {
            TileSource::ArduPilotSrtm1 => Ok(format!(
                "https://terrain.ardupilot.org/SRTM1/{}.hgt.zip",
                parts.base
            )),
            TileSource::ArduPilotSrtm3 => {
                let continent = coords_to_continent(parts.lat(), parts.lon()).ok_or_else(|| {
                    ElevationError::DownloadFailed {
                        filename: remote_name.to_string(),
                        reason: format!(
                            "Coordinates ({}, {}) do not map to a known continent",
                            parts.lat(),
                            parts.lon()
                        ),
                    }
                })?;
                Ok(format!(
                    "https://terrain.ardupilot.org/SRTM3/{}/{}.hgt.zip",
                    continent, parts.base
                ))
            }
            TileSource::Custom { url_template, .. } => {
                if url_template.is_empty() {
                    return Err(ElevationError::DownloadFailed {
                        filename: remote_name.to_string(),
                        reason: "No download URL template configured".to_string(),
                    });
                }

                let continent = if url_template.contains("{continent}") {
                    coords_to_continent(parts.lat(), parts.lon()).unwrap_or("")
                } else {
                    ""
                };

                Ok(url_template
                    .replace("{filename}", stem)
                    .replace("{tile}", parts.base)
                    .replace("{lat_prefix}", parts.lat_prefix)
                    .replace("{lat}", parts.lat_digits)
                    .replace("{lon_prefix}", parts.lon_prefix)
                    .replace("{lon}", parts.lon_digits)
                    .replace("{continent}", continent)
                    .replace("{dataset}", self.dataset.dir_name()))
            }
        }
    }

    /// One download attempt.
    fn download(&self, url: &str, remote_name: &str, dest: &Path) -> Result<()> {
        let response = self.client.get(url).send()?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(ElevationError::RemoteNotFound {
                    filename: remote_name.to_string(),
                })
            }
            status if !status.is_success() => {
                return Err(ElevationError::DownloadFailed {
                    filename: remote_name.to_string(),
                    reason: format!("HTTP {}", status),
                })
            }
            _ => {}
        }

        let bytes = response.bytes()?;

        // write next to the target and rename so a partial file never looks
        // like a complete tile
        let mut partial = dest.as_os_str().to_owned();
        partial.push(".part");
        fs::write(&partial, &bytes)?;
        fs::rename(&partial, dest)?;
        Ok(())
    }
}

impl TileFetcher for HttpFetcher {
    fn fetch(&self, remote_name: &str, dest: &Path) -> Result<()> {
        let url = self.build_url(remote_name)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                std::thread::sleep(Duration::from_millis(500 * attempt as u64));
            }

            match self.download(&url, remote_name, dest) {
                Ok(()) => {
                    info!(%url, dest = %dest.display(), "Downloaded tile");
                    return Ok(());
                }
                Err(e @ ElevationError::RemoteNotFound { .. }) => return Err(e),
                Err(e) => {
                    debug!(%url, attempt, error = %e, "Download attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ElevationError::DownloadFailed {
            filename: remote_name.to_string(),
            reason: "Unknown error".to_string(),
        }))
    }

    fn compression(&self) -> Compression {
        self.config.compression()
    }
}

/// Pieces of a tile base name such as `N47E008`.
struct TileNameParts<'a> {
    base: &'a str,
    lat_prefix: &'a str,
    lat_digits: &'a str,
    lon_prefix: &'a str,
    lon_digits: &'a str,
}

impl<'a> TileNameParts<'a> {
    fn parse(stem: &'a str) -> Option<Self> {
        let base = stem.get(0..7)?;
        let bytes = base.as_bytes();
        let valid = matches!(bytes[0], b'N' | b'S')
            && matches!(bytes[3], b'E' | b'W')
            && bytes[1..3].iter().all(u8::is_ascii_digit)
            && bytes[4..7].iter().all(u8::is_ascii_digit);
        if !valid {
            return None;
        }
        Some(Self {
            base,
            lat_prefix: &base[0..1],
            lat_digits: &base[1..3],
            lon_prefix: &base[3..4],
            lon_digits: &base[4..7],
        })
    }

    fn lat(&self) -> f64 {
        signed(self.lat_prefix, self.lat_digits)
    }

    fn lon(&self) -> f64 {
        signed(self.lon_prefix, self.lon_digits)
    }
}

fn signed(prefix: &str, digits: &str) -> f64 {
    let value: f64 = digits.parse().unwrap_or(0.0);
    match prefix {
        "S" | "W" => -value,
        _ => value,
    }
}

/// Map a tile's south-west corner to the ArduPilot continent directory.
///
/// Regions are checked in order, so overlaps resolve to the first match:
/// North_America, South_America, Australia, Africa, Eurasia.
pub fn coords_to_continent(lat: f64, lon: f64) -> Option<&'static str> {
    const REGIONS: [(&str, (f64, f64), (f64, f64)); 5] = [
        ("North_America", (15.0, 60.0), (-170.0, -50.0)),
        ("South_America", (-60.0, 15.0), (-90.0, -30.0)),
        ("Australia", (-50.0, -10.0), (110.0, 180.0)),
        ("Africa", (-35.0, 35.0), (-20.0, 55.0)),
        ("Eurasia", (0.0, 60.0), (-15.0, 180.0)),
    ];

    REGIONS
        .iter()
        .find(|(_, (lat_min, lat_max), (lon_min, lon_max))| {
            (*lat_min..=*lat_max).contains(&lat) && (*lon_min..=*lon_max).contains(&lon)
        })
        .map(|(name, _, _)| *name)
}
