use anyhow::{bail, Context, Result};
use geoel::{Dataset, TileFile};
use std::path::PathBuf;

use super::{coverage, format_size, LayerOptions};

pub fn run(options: &LayerOptions, tile: &str, dataset: Dataset) -> Result<()> {
    let tile_path = if tile.to_lowercase().ends_with(".hgt") {
        PathBuf::from(tile)
    } else {
        let layer = options.build_layer()?;
        layer
            .provider(dataset)
            .data_dir()
            .join(dataset.tile_file_name(&tile.to_uppercase()))
    };

    if !tile_path.exists() {
        bail!("Tile not found: {}", tile_path.display());
    }

    let (tile, dataset) = TileFile::open_detect(&tile_path).context("Failed to load tile")?;
    let filename = tile_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let samples = tile.samples_per_edge();
    let file_size = std::fs::metadata(&tile_path)?.len();

    println!("Tile: {}", filename);
    println!("Path: {}", tile_path.display());
    println!();
    println!(
        "Dataset: {} ({}\" spacing, ~{:.0}m, {}x{} samples)",
        dataset.name(),
        dataset.spacing_seconds(),
        dataset.approx_meters(),
        samples,
        samples
    );
    println!(
        "Coverage: {}",
        coverage(&filename).unwrap_or_else(|| "Unknown".to_string())
    );
    println!("File size: {}", format_size(file_size));
    println!();

    if let Some(summary) = tile.summary() {
        if summary.void_count < summary.total {
            println!("Min elevation: {}m", summary.min);
            println!("Max elevation: {}m", summary.max);
        }
        if summary.void_count > 0 {
            println!(
                "Void samples: {} ({:.1}%)",
                summary.void_count,
                summary.void_percent()
            );
        }
    }

    Ok(())
}
