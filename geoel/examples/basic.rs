//! Query a few summits at several zoom levels.
//!
//! Run with: cargo run --example basic -- /path/to/elevation/root
//!
//! The root holds one directory per dataset: `etopo/`, `globe/`, `srtm3/`
//! and optionally `srtm1/`.

use geoel::{Axis, ElevationError, ElevationLayer, GeoCoord};
use std::env;

fn main() -> Result<(), ElevationError> {
    let root = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/elevation/root");
        std::process::exit(1);
    });

    let layer = ElevationLayer::builder(&root).cache_capacity(16).build()?;

    let locations = [
        ("Mount Fuji, Japan", "35:21:38 N", "138:43:39 E"),
        ("Mount Everest, Nepal", "27:59:17 N", "086:55:30 E"),
        ("Aconcagua, Argentina", "32:39:12 S", "070:00:39 W"),
    ];

    for (name, lat, lon) in &locations {
        let lat = GeoCoord::parse(Axis::Latitude, lat)?;
        let lon = GeoCoord::parse(Axis::Longitude, lon)?;

        println!("{name} ({lat}, {lon})");
        for zoom in [2, 6, 12] {
            let dataset = layer.dataset_for_zoom(zoom);
            match layer.elevation(&lat, &lon, zoom) {
                Some(metres) => println!("  zoom {zoom:>2} ({dataset}): {:.0}m", metres.floor()),
                None => println!("  zoom {zoom:>2} ({dataset}): no data"),
            }
        }
    }

    println!("\nCache statistics:");
    for (dataset, stats) in layer.cache_stats() {
        println!(
            "  {:<6} tiles: {:>3}  hits: {:>4}  misses: {:>3}  hit rate: {:.1}%",
            dataset.name(),
            stats.entry_count,
            stats.hit_count,
            stats.miss_count,
            stats.hit_rate() * 100.0
        );
    }

    Ok(())
}
