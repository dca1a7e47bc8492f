//! Application configuration and run loop with builder pattern.

use std::error::Error;
use std::path::PathBuf;
use terrain_data::{HoleFillMode, LoaderConfig, TerrainLoader, TerrainSummary};
use tracing::info;

/// Logging configuration.
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// How the summary of a loaded terrain is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Builder for configuring and running the application.
pub struct AppBuilder {
    path: PathBuf,
    loader: LoaderConfig,
    logging: LoggingConfig,
    output: OutputFormat,
}

impl AppBuilder {
    /// Create a new AppBuilder for one input file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loader: LoaderConfig::default(),
            logging: LoggingConfig::default(),
            output: OutputFormat::default(),
        }
    }

    /// Select the hole fill policy.
    pub fn with_hole_fill(mut self, mode: HoleFillMode) -> Self {
        self.loader = self.loader.with_hole_fill(mode);
        self
    }

    /// Override the LAS format 2 color multiplier.
    pub fn with_las_rgb_scale(mut self, scale: f32) -> Self {
        self.loader = self.loader.with_las_rgb_scale(scale);
        self
    }

    /// Cap the height grid size, in cells.
    pub fn with_max_grid_cells(mut self, cells: usize) -> Self {
        self.loader = self.loader.with_max_grid_cells(cells);
        self
    }

    /// Configure logging.
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = config;
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    /// Run the application.
    pub fn run(self) -> Result<(), Box<dyn Error>> {
        self.init_logging();

        info!("Loading {}", self.path.display());
        let terrain = TerrainLoader::from_path_with_config(&self.path, &self.loader)?;
        let summary = terrain.summary();

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Text => print_summary(&summary),
        }
        Ok(())
    }

    fn init_logging(&self) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&self.logging.level)),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_summary(summary: &TerrainSummary) {
    if let (Some(version), Some(format)) = (&summary.las_version, summary.las_point_format) {
        println!("LAS {} (point format {})", version, format);
    }
    println!("points:    {}", summary.points);
    println!("grid:      {} x {}", summary.width, summary.depth);
    println!("vertices:  {}", summary.vertices);
    println!("triangles: {}", summary.triangles);
    println!("holes:     {} ({} filled)", summary.holes, summary.filled_holes);
    println!(
        "offset:    {:.3} {:.3} {:.3}",
        summary.offset[0], summary.offset[1], summary.offset[2]
    );
    println!("min y:     {:.3}", summary.min_y);
}
