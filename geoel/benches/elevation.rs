use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geoel::{Axis, Dataset, ElevationLayer, GeoCoord};
use tempfile::TempDir;

/// Write a synthetic SRTM3 tile with a simple gradient under `root/srtm3`.
fn create_tile(root: &Path, base_name: &str) {
    let n = Dataset::Srtm3.samples_per_edge();
    let mut data = Vec::with_capacity(n * n * 2);
    for row in 0..n {
        for col in 0..n {
            data.extend_from_slice(&(((row + col) % 4000) as i16).to_be_bytes());
        }
    }
    let dir = root.join(Dataset::Srtm3.dir_name());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(Dataset::Srtm3.tile_file_name(base_name)), data).unwrap();
}

fn layer_with_tiles(tiles: &[&str]) -> (TempDir, ElevationLayer) {
    let tmp = TempDir::new().unwrap();
    for tile in tiles {
        create_tile(tmp.path(), tile);
    }
    let layer = ElevationLayer::builder(tmp.path()).build().unwrap();
    (tmp, layer)
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_dms", |b| {
        b.iter(|| GeoCoord::parse(Axis::Latitude, black_box("47:12:34.5 N")).unwrap());
    });
}

fn bench_grid_point(c: &mut Criterion) {
    let (_tmp, layer) = layer_with_tiles(&["N35E138"]);
    let lat = GeoCoord::latitude(35.5);
    let lon = GeoCoord::longitude(138.5);

    // Warm the cache
    let _ = layer.elevation_at(&lat, &lon, 12);

    c.bench_function("grid_point_cached", |b| {
        b.iter(|| black_box(layer.elevation_at(black_box(&lat), black_box(&lon), 12)));
    });
}

fn bench_interpolated(c: &mut Criterion) {
    let (_tmp, layer) = layer_with_tiles(&["N35E138"]);
    let lat = GeoCoord::latitude(35.3606);
    let lon = GeoCoord::longitude(138.7274);

    let _ = layer.elevation_at(&lat, &lon, 12);

    c.bench_function("interpolated_cached", |b| {
        b.iter(|| black_box(layer.elevation_at(black_box(&lat), black_box(&lon), 12)));
    });
}

fn bench_batch_multi_tile(c: &mut Criterion) {
    let (_tmp, layer) = layer_with_tiles(&["N35E138", "N36E138", "N35E139"]);

    // 1000 points spread across 3 tiles
    let points: Vec<(f64, f64)> = (0..1000)
        .map(|i| {
            let frac = (i as f64 / 3000.0) * 0.99;
            match i % 3 {
                0 => (35.0 + frac, 138.5),
                1 => (36.0 + frac, 138.5),
                _ => (35.0 + frac, 139.5),
            }
        })
        .collect();

    let _ = layer.elevations_batch(&points, 12);

    c.bench_function("batch_1000_multi_tile", |b| {
        b.iter(|| black_box(layer.elevations_batch(black_box(&points), 12)));
    });
}

fn bench_fallback_miss(c: &mut Criterion) {
    let (_tmp, layer) = layer_with_tiles(&[]);
    let lat = GeoCoord::latitude(-10.25);
    let lon = GeoCoord::longitude(-20.25);

    let _ = layer.elevation_at(&lat, &lon, 12);

    c.bench_function("fallback_all_unavailable", |b| {
        b.iter(|| black_box(layer.elevation_at(black_box(&lat), black_box(&lon), 12)));
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_grid_point,
    bench_interpolated,
    bench_batch_multi_tile,
    bench_fallback_miss,
);
criterion_main!(benches);
