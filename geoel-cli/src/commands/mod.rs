pub mod batch;
pub mod info;
pub mod list;
pub mod query;

use anyhow::{Context, Result};
use geoel::{Dataset, DownloadConfig, ElevationLayer, ElevationLayerBuilder};
use std::path::PathBuf;
use tracing::debug;

/// Global flags shared by every subcommand.
pub struct LayerOptions {
    pub data_dir: Option<PathBuf>,
    pub cache_size: u64,
    pub srtm1: bool,
    pub auto_download: bool,
}

impl LayerOptions {
    /// Build the layer, letting flags override the environment.
    pub fn build_layer(&self) -> Result<ElevationLayer> {
        let mut builder = ElevationLayerBuilder::from_env()
            .cache_capacity(self.cache_size)
            .enable_srtm1(self.srtm1);

        if let Some(dir) = &self.data_dir {
            builder = builder.data_dir(dir);
        }

        if self.auto_download {
            builder = builder
                .auto_download(Dataset::Srtm3, DownloadConfig::ardupilot_srtm3())
                .auto_download(Dataset::Srtm1, DownloadConfig::ardupilot_srtm1());
        }

        let layer = builder.build().context("Failed to create elevation layer")?;
        debug!(
            data_root = %layer.data_root().display(),
            cache_size = self.cache_size,
            srtm1 = layer.srtm1_enabled(),
            auto_download = self.auto_download,
            "Elevation layer ready"
        );
        Ok(layer)
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Degree ranges covered by a tile name such as `N47E008` or `S05W010`.
pub fn coverage(base_name: &str) -> Option<String> {
    let name = base_name.get(..7)?;
    let lat = signed_degrees(name.chars().next()?, name.get(1..3)?, 'N', 'S')?;
    let lon = signed_degrees(name.chars().nth(3)?, name.get(4..7)?, 'E', 'W')?;
    Some(format!(
        "lat {} to {}, lon {} to {}",
        lat.0, lat.1, lon.0, lon.1
    ))
}

/// Southern and western tiles are named after their degree line farther
/// from zero, so `S05` spans -5 to -4.
fn signed_degrees(prefix: char, digits: &str, positive: char, negative: char) -> Option<(i32, i32)> {
    let degrees: i32 = digits.parse().ok()?;
    match prefix.to_ascii_uppercase() {
        p if p == positive => Some((degrees, degrees + 1)),
        p if p == negative => Some((-degrees, -degrees + 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage() {
        assert_eq!(
            coverage("N47E008.hgt").as_deref(),
            Some("lat 47 to 48, lon 8 to 9")
        );
        assert_eq!(
            coverage("S05W010_etopo5.hgt").as_deref(),
            Some("lat -5 to -4, lon -10 to -9")
        );
        assert_eq!(coverage("X47E008"), None);
        assert_eq!(coverage("N47"), None);
    }

    #[test]
    fn test_build_layer_applies_flags() {
        let root = std::env::temp_dir();
        let options = LayerOptions {
            data_dir: Some(root.clone()),
            cache_size: 3,
            srtm1: true,
            auto_download: true,
        };

        let layer = options.build_layer().unwrap();
        assert_eq!(layer.data_root(), root.as_path());
        assert!(layer.srtm1_enabled());
        assert_eq!(layer.provider(Dataset::Srtm3).cache_stats().capacity, Some(3));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(338), "338 bytes");
        assert_eq!(format_size(2_884_802), "2.75 MB");
    }
}
