use anyhow::{Context, Result};
use geoel::{Axis, GeoCoord};
use serde::Serialize;

use super::LayerOptions;

#[derive(Serialize)]
struct ElevationResponse {
    lat: String,
    lon: String,
    zoom: u32,
    dataset: &'static str,
    elevation: Option<f32>,
}

pub fn run(options: &LayerOptions, lat: &str, lon: &str, zoom: u32, json: bool) -> Result<()> {
    let lat = GeoCoord::parse(Axis::Latitude, lat).context("Invalid latitude")?;
    let lon = GeoCoord::parse(Axis::Longitude, lon).context("Invalid longitude")?;

    let layer = options.build_layer()?;
    let elevation = layer.elevation(&lat, &lon, zoom).map(f32::floor);

    if json {
        let response = ElevationResponse {
            lat: lat.to_string(),
            lon: lon.to_string(),
            zoom,
            dataset: layer.dataset_for_zoom(zoom).name(),
            elevation,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        match elevation {
            Some(metres) => println!("{metres:.0}"),
            None => println!("no data"),
        }
    }

    Ok(())
}
