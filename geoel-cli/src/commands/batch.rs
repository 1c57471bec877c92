use anyhow::{Context, Result};
use geoel::{Axis, ElevationLayer, GeoCoord};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::LayerOptions;

pub fn run(
    options: &LayerOptions,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: &str,
    lon_col: &str,
    zoom: u32,
) -> Result<()> {
    let layer = options.build_layer()?;

    let output_path = output.unwrap_or_else(|| default_output(&input));
    let written = process_csv(&layer, &input, &output_path, lat_col, lon_col, zoom)?;

    println!("{} rows written to: {}", written, output_path.display());
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "points".to_string());
    input.with_file_name(format!("{}_elevation.csv", stem))
}

fn process_csv(
    layer: &ElevationLayer,
    input: &Path,
    output: &Path,
    lat_col: &str,
    lon_col: &str,
    zoom: u32,
) -> Result<u64> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    // Collect records for progress bar
    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let output_file = File::create(output).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("elevation");
    writer.write_record(&new_headers)?;

    let mut written = 0;
    for (line, record) in records.iter().enumerate() {
        let lat = record.get(lat_idx).context("Missing latitude")?;
        let lon = record.get(lon_idx).context("Missing longitude")?;

        let lat = GeoCoord::parse(Axis::Latitude, lat)
            .with_context(|| format!("Invalid latitude on row {}", line + 1))?;
        let lon = GeoCoord::parse(Axis::Longitude, lon)
            .with_context(|| format!("Invalid longitude on row {}", line + 1))?;

        let elevation = layer
            .elevation(&lat, &lon, zoom)
            .map(|e| format!("{:.0}", e.floor()))
            .unwrap_or_else(|| "void".to_string());

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&elevation);
        writer.write_record(&new_record)?;

        written += 1;
        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;

    Ok(written)
}
