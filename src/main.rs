//! complex-tiles - Render bitmap tiles from complex-valued datasets.
//!
//! This binary reads a raw dataset file through the disk-resident source and
//! writes one rendered tile as PNG, or describes the zoom pyramid.

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use complex_tiles::{
    config::{Cli, Command, LevelsConfig, RenderConfig},
    io::FileRangeReader,
    source::{ContiguousDataset, Hdf5Source, Source},
    tile::{Pyramid, TileRenderer, TileRequest},
    TileError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Render(config) => run_render(config).await,
        Command::Levels(config) => run_levels(config),
    }
}

// =============================================================================
// Render Command
// =============================================================================

async fn run_render(config: RenderConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match render(&config).await {
        Ok(()) => {
            info!("Wrote {}", config.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Render failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn render(config: &RenderConfig) -> Result<(), Box<dyn Error>> {
    let datatype = config.datatype()?;
    let (min, max) = config.value_range()?;

    let reader = FileRangeReader::open(&config.input).await?;
    let dataset = ContiguousDataset::new(
        reader,
        config.offset,
        config.shape.clone(),
        datatype.element_size,
    )?;
    let source = Hdf5Source::new(dataset, datatype)?;

    info!("Dataset: {}", config.input.display());
    info!("  Shape: {:?}", source.shape());
    info!("  Channel: {}", config.channel);
    info!("  Range: [{}, {}]", min, max);

    let request = TileRequest::new(config.zoom, config.origin(), config.tile(), min, max)?;
    let renderer = TileRenderer::with_encoder(config.encoder());
    let bitmap = renderer
        .render_tile(&source, &request, config.channel)
        .await?;

    bitmap
        .to_image()?
        .save(&config.output)
        .map_err(|e| TileError::EncodeError {
            message: e.to_string(),
        })?;

    Ok(())
}

// =============================================================================
// Levels Command
// =============================================================================

fn run_levels(config: LevelsConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let pyramid = match Pyramid::new(&config.shape, &config.tile()) {
        Ok(pyramid) => pyramid,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&pyramid) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "complex_tiles=debug"
    } else {
        "complex_tiles=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
