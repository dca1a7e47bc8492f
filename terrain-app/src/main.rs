//! Terrain Application
//!
//! Builds a terrain mesh from a point cloud file and reports what was built.
//!
//! Supported inputs:
//! - `.txt` with `X Z Y` columns
//! - `.lasbin` packed `f32` triplets
//! - `.las` with point data record format 1 or 2

mod app;

use app::{AppBuilder, LoggingConfig, OutputFormat};
use clap::Parser;
use std::path::PathBuf;
use terrain_data::HoleFillMode;

/// Terrain - point cloud to heightmap mesh
#[derive(Parser, Debug)]
#[command(name = "terrain")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Point cloud file to load
    file: PathBuf,

    /// Hole fill policy (sequential, snapshot)
    #[arg(long, default_value = "sequential")]
    hole_fill: HoleFillMode,

    /// Multiplier for 16-bit LAS colors
    #[arg(long)]
    las_rgb_scale: Option<f32>,

    /// Refuse to build height grids with more cells than this
    #[arg(long)]
    max_grid_cells: Option<usize>,

    /// Log level used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let mut app = AppBuilder::new(args.file)
        .with_hole_fill(args.hole_fill)
        .with_logging(LoggingConfig {
            level: args.log_level,
        })
        .with_output(if args.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        });
    if let Some(scale) = args.las_rgb_scale {
        app = app.with_las_rgb_scale(scale);
    }
    if let Some(cells) = args.max_grid_cells {
        app = app.with_max_grid_cells(cells);
    }

    if let Err(e) = app.run() {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
