use anyhow::Result;
use geoel::Compression;
use std::fs;

use super::{coverage, format_size, LayerOptions};

pub fn run(options: &LayerOptions) -> Result<()> {
    let layer = options.build_layer()?;

    println!("{:<22} {:>6} {:>12} {:>34}", "TILE", "DATA", "SIZE", "COVERAGE");
    println!("{}", "-".repeat(77));

    let mut total_tiles = 0;
    let mut total_size: u64 = 0;
    let mut counts = Vec::new();

    for provider in layer.providers() {
        let tiles = provider.scan_tile_files();
        counts.push((provider.dataset_name(), tiles.len()));

        for name in &tiles {
            let path = provider.data_dir().join(name);
            // archives are listed under the name of the tile they unpack to
            let (size, packed) = match fs::metadata(&path) {
                Ok(meta) => (meta.len(), false),
                Err(_) => {
                    let size = [Compression::Zip, Compression::Gzip]
                        .iter()
                        .find_map(|c| fs::metadata(c.archive_path(&path)).ok())
                        .map(|m| m.len())
                        .unwrap_or(0);
                    (size, true)
                }
            };
            total_size += size;

            let size = if packed {
                format!("{} (packed)", format_size(size))
            } else {
                format_size(size)
            };
            println!(
                "{:<22} {:>6} {:>12} {:>34}",
                name,
                provider.dataset_name(),
                size,
                coverage(name).unwrap_or_else(|| "Unknown".to_string())
            );
        }
        total_tiles += tiles.len();
    }

    if total_tiles == 0 {
        println!("No tiles found below: {}", layer.data_root().display());
        return Ok(());
    }

    println!();
    println!("Summary:");
    println!("  Total tiles: {}", total_tiles);
    for (dataset, count) in counts.iter().filter(|(_, count)| *count > 0) {
        println!("  {}: {}", dataset, count);
    }
    println!("  Total size: {}", format_size(total_size));
    println!("  Data root: {}", layer.data_root().display());

    Ok(())
}
