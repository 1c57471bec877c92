//! Compare the grid sample and the interpolated value in every dataset.
//!
//! Run with: cargo run --example interpolation -- /path/to/elevation/root

use geoel::{Axis, Dataset, ElevationError, ElevationLayer, GeoCoord, NO_DATA};
use std::env;

fn main() -> Result<(), ElevationError> {
    let root = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example interpolation -- /path/to/elevation/root");
        std::process::exit(1);
    });

    let layer = ElevationLayer::builder(&root).enable_srtm1(true).build()?;

    let lat = GeoCoord::parse(Axis::Latitude, "35:21:38.2 N")?;
    let lon = GeoCoord::parse(Axis::Longitude, "138:43:38.6 E")?;

    println!("Elevation at ({lat}, {lon}):");
    println!("{:-<50}", "");

    for dataset in Dataset::ALL {
        let provider = layer.provider(dataset);
        let grid_lat = lat.to_raster_left(&provider.grid_spacing(Axis::Latitude));
        let grid_lon = lon.to_raster_left(&provider.grid_spacing(Axis::Longitude));

        let sample = provider.sample_at(&grid_lat, &grid_lon)?;
        let interpolated = provider.try_elevation_at(&lat, &lon)?;

        if interpolated == NO_DATA {
            println!("{:<6} no data", dataset.name());
        } else {
            println!(
                "{:<6} sample at {grid_lat} {grid_lon}: {sample}m, interpolated: {interpolated:.2}m",
                dataset.name()
            );
        }
    }

    Ok(())
}
