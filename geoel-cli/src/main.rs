use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::LayerOptions;

/// Multi-resolution terrain elevation CLI tool
#[derive(Parser)]
#[command(name = "geoel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory holding etopo/, globe/, srtm3/ and srtm1/
    #[arg(short, long, env = "GEOEL_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Maximum open tiles per dataset (0 = unbounded)
    #[arg(
        short,
        long,
        env = "GEOEL_CACHE_SIZE",
        default_value = "0",
        global = true
    )]
    cache_size: u64,

    /// Use SRTM1 for zoom levels 15 and above
    #[arg(long, env = "GEOEL_SRTM1", global = true)]
    srtm1: bool,

    /// Download missing SRTM tiles from the ArduPilot mirror
    #[arg(short, long, global = true)]
    auto_download: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation for a single coordinate
    Query {
        /// Latitude, e.g. "47:30:00 N", "47°30'N" or "47.5". Bare integers of
        /// three or more digits read as degrees and minutes ("120" is 1°20')
        #[arg(long, allow_hyphen_values = true)]
        lat: String,

        /// Longitude, e.g. "008:15:00 E", "8°15'E" or "8.25". Write 120° as
        /// "120.0", since "120" is read as 1°20'
        #[arg(long, allow_hyphen_values = true)]
        lon: String,

        /// Zoom level selecting the dataset
        #[arg(short, long, default_value = "12")]
        zoom: u32,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add an elevation column to a CSV file
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (defaults to <input>_elevation.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude
        #[arg(long, default_value = "lon")]
        lon_col: String,

        /// Zoom level selecting the dataset
        #[arg(short, long, default_value = "12")]
        zoom: u32,
    },

    /// Display information about a tile file
    Info {
        /// Path to a tile file, or a tile name (e.g. N47E008) looked up in
        /// the dataset directory
        tile: String,

        /// Dataset to look the tile name up in
        #[arg(long, default_value = "srtm3")]
        dataset: geoel::Dataset,
    },

    /// List tiles present in every dataset directory
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geoel=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = LayerOptions {
        data_dir: cli.data_dir,
        cache_size: cli.cache_size,
        srtm1: cli.srtm1,
        auto_download: cli.auto_download,
    };

    match cli.command {
        Commands::Query {
            lat,
            lon,
            zoom,
            json,
        } => commands::query::run(&options, &lat, &lon, zoom, json),
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
            zoom,
        } => commands::batch::run(&options, input, output, &lat_col, &lon_col, zoom),
        Commands::Info { tile, dataset } => commands::info::run(&options, &tile, dataset),
        Commands::List => commands::list::run(&options),
    }
}
