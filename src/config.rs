//! Configuration management for the complex-tiles CLI.
//!
//! This module provides the command-line interface:
//! - Command-line arguments via clap
//! - Environment variables with `CT_` prefix
//! - Defaults taken from the tile pipeline constants
//!
//! # Example
//!
//! ```ignore
//! use complex_tiles::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! match cli.into_command() {
//!     Command::Render(config) => println!("rendering {}", config.input.display()),
//!     Command::Levels(config) => println!("levels for {:?}", config.shape),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `CT_INPUT` - Raw dataset file to render from
//! - `CT_SHAPE` - Dataset shape in storage order, comma-separated
//! - `CT_OFFSET` - Byte offset of the first element (default: 0)
//! - `CT_COMPONENT_BYTES` - Component width, 4 or 8 (default: 4)
//! - `CT_ELEMENT_SIZE` - Compound element size in bytes
//! - `CT_REAL_OFFSET` / `CT_IMAG_OFFSET` - Compound field offsets
//! - `CT_AXIS_ORDER` - Logical axis stored at each storage position
//! - `CT_ZOOM` - Zoom level (default: 0)
//! - `CT_ORIGIN` - Tile origin in zoomed pixels (default: all zeros)
//! - `CT_TILE` - Tile shape (default: 256 per dimension)
//! - `CT_CHANNEL` - Channel to render (default: imaginary)
//! - `CT_MIN` / `CT_MAX` - Value range
//! - `CT_PALETTE` - Palette for color formats (default: gray)
//! - `CT_FORMAT` - Pixel format (default: gray8)
//! - `CT_OUTPUT` - PNG output path (default: tile.png)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::io::ByteOrder;
use crate::source::{ComponentType, Datatype};
use crate::tile::{BitmapEncoder, ChannelKind, Palette, PixelFormat, DEFAULT_TILE_SIZE};

// =============================================================================
// Default Values
// =============================================================================

/// Default component width in bytes.
pub const DEFAULT_COMPONENT_BYTES: usize = 4;

/// Default output path.
pub const DEFAULT_OUTPUT: &str = "tile.png";

// =============================================================================
// CLI Arguments
// =============================================================================

/// complex-tiles - Render bitmap tiles from complex-valued datasets.
#[derive(Parser, Debug, Clone)]
#[command(name = "complex-tiles")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The selected subcommand.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render one tile of a raw dataset file to PNG
    Render(RenderConfig),

    /// Print the zoom levels and tile grids for a dataset shape as JSON
    Levels(LevelsConfig),
}

// =============================================================================
// Render Command
// =============================================================================

/// Options for rendering a tile.
#[derive(Args, Debug, Clone)]
pub struct RenderConfig {
    // =========================================================================
    // Dataset
    // =========================================================================
    /// Raw dataset file, elements packed row-major in storage order.
    #[arg(env = "CT_INPUT")]
    pub input: PathBuf,

    /// Dataset shape in storage order (comma-separated).
    #[arg(long, env = "CT_SHAPE", value_delimiter = ',', required = true)]
    pub shape: Vec<usize>,

    /// Byte offset of the first element.
    #[arg(long, default_value_t = 0, env = "CT_OFFSET")]
    pub offset: u64,

    /// Width of each component in bytes (4 or 8).
    #[arg(long, default_value_t = DEFAULT_COMPONENT_BYTES, env = "CT_COMPONENT_BYTES")]
    pub component_bytes: usize,

    /// Element size for compound layouts.
    ///
    /// When set, `--real-offset` and `--imag-offset` place the components.
    #[arg(long, env = "CT_ELEMENT_SIZE")]
    pub element_size: Option<usize>,

    /// Byte offset of the real component inside a compound element.
    #[arg(long, default_value_t = 0, env = "CT_REAL_OFFSET")]
    pub real_offset: usize,

    /// Byte offset of the imaginary component inside a compound element.
    #[arg(long, env = "CT_IMAG_OFFSET")]
    pub imag_offset: Option<usize>,

    /// Components are stored big-endian.
    #[arg(long, default_value_t = false, env = "CT_BIG_ENDIAN")]
    pub big_endian: bool,

    /// Logical axis stored at each storage position (comma-separated).
    #[arg(long, env = "CT_AXIS_ORDER", value_delimiter = ',')]
    pub axis_order: Option<Vec<usize>>,

    // =========================================================================
    // Tile
    // =========================================================================
    /// Zoom level (0 = full resolution).
    #[arg(short, long, default_value_t = 0, env = "CT_ZOOM", allow_negative_numbers = true)]
    pub zoom: i32,

    /// Tile origin in zoomed pixels (comma-separated, logical order).
    #[arg(long, env = "CT_ORIGIN", value_delimiter = ',')]
    pub origin: Option<Vec<usize>>,

    /// Tile shape (comma-separated, logical order).
    #[arg(long, env = "CT_TILE", value_delimiter = ',')]
    pub tile: Option<Vec<usize>>,

    /// Channel to render: real, imaginary, magnitude or phase.
    #[arg(short, long, default_value_t = ChannelKind::Imaginary, env = "CT_CHANNEL")]
    pub channel: ChannelKind,

    /// Value mapped to intensity 0.
    #[arg(long, env = "CT_MIN", allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Value mapped to intensity 1.
    #[arg(long, env = "CT_MAX", allow_negative_numbers = true)]
    pub max: Option<f64>,

    // =========================================================================
    // Output
    // =========================================================================
    /// Palette for color pixel formats: gray, hot or cyclic.
    #[arg(long, default_value_t = Palette::Gray, env = "CT_PALETTE")]
    pub palette: Palette,

    /// Pixel format: gray8, rgb8 or rgba8.
    #[arg(long, default_value_t = PixelFormat::Gray8, env = "CT_FORMAT")]
    pub format: PixelFormat,

    /// Output PNG path.
    #[arg(short, long, default_value = DEFAULT_OUTPUT, env = "CT_OUTPUT")]
    pub output: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl RenderConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.shape.is_empty() || self.shape.contains(&0) {
            return Err("shape must list at least one non-zero dimension".to_string());
        }

        if let Some(ref origin) = self.origin {
            if origin.len() != self.shape.len() {
                return Err(format!(
                    "origin has {} coordinates but the dataset has rank {}",
                    origin.len(),
                    self.shape.len()
                ));
            }
        }
        if let Some(ref tile) = self.tile {
            if tile.len() != self.shape.len() {
                return Err(format!(
                    "tile has {} dimensions but the dataset has rank {}",
                    tile.len(),
                    self.shape.len()
                ));
            }
            if tile.contains(&0) {
                return Err("tile dimensions must be greater than 0".to_string());
            }
        }

        if self.zoom < 0 {
            return Err("zoom must be non-negative".to_string());
        }

        let datatype = self.datatype()?;
        datatype.validate().map_err(|e| e.to_string())?;
        datatype
            .storage_axes(self.shape.len())
            .map_err(|e| e.to_string())?;

        self.value_range().map(|_| ())
    }

    /// Datatype descriptor assembled from the layout options.
    pub fn datatype(&self) -> Result<Datatype, String> {
        let component = ComponentType::from_size(self.component_bytes).map_err(|e| e.to_string())?;

        let mut datatype = match self.element_size {
            Some(element_size) => {
                let imag_offset = self.imag_offset.ok_or_else(|| {
                    "compound layouts need --imag-offset (CT_IMAG_OFFSET)".to_string()
                })?;
                Datatype::compound(element_size, component, self.real_offset, imag_offset)
            }
            None => Datatype::interleaved(component),
        };

        if self.big_endian {
            datatype = datatype.with_byte_order(ByteOrder::BigEndian);
        }
        if let Some(ref order) = self.axis_order {
            datatype = datatype.with_dimension_order(order.clone());
        }
        Ok(datatype)
    }

    /// Value range, falling back to the channel's natural range.
    pub fn value_range(&self) -> Result<(f64, f64), String> {
        let natural = self.channel.natural_range();
        let min = self.min.or(natural.map(|(min, _)| min));
        let max = self.max.or(natural.map(|(_, max)| max));
        match (min, max) {
            (Some(min), Some(max)) if min <= max => Ok((min, max)),
            (Some(min), Some(max)) => Err(format!("min {} is greater than max {}", min, max)),
            _ => Err(format!(
                "channel '{}' has no natural range; set --min and --max",
                self.channel
            )),
        }
    }

    /// Tile origin, defaulting to the first tile.
    pub fn origin(&self) -> Vec<usize> {
        self.origin
            .clone()
            .unwrap_or_else(|| vec![0; self.shape.len()])
    }

    /// Tile shape, defaulting to square tiles.
    pub fn tile(&self) -> Vec<usize> {
        self.tile
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_TILE_SIZE; self.shape.len()])
    }

    /// Encoder for the selected pixel format and palette.
    pub fn encoder(&self) -> BitmapEncoder {
        BitmapEncoder::new(self.format, self.palette)
    }
}

// =============================================================================
// Levels Command
// =============================================================================

/// Options for describing the zoom pyramid.
#[derive(Args, Debug, Clone)]
pub struct LevelsConfig {
    /// Logical dataset shape (comma-separated).
    #[arg(long, env = "CT_SHAPE", value_delimiter = ',', required = true)]
    pub shape: Vec<usize>,

    /// Tile shape (comma-separated).
    #[arg(long, env = "CT_TILE", value_delimiter = ',')]
    pub tile: Option<Vec<usize>>,
}

impl LevelsConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.shape.is_empty() || self.shape.contains(&0) {
            return Err("shape must list at least one non-zero dimension".to_string());
        }
        let tile = self.tile();
        if tile.len() != self.shape.len() || tile.contains(&0) {
            return Err(format!(
                "tile {:?} does not fit a dataset of shape {:?}",
                tile, self.shape
            ));
        }
        Ok(())
    }

    /// Tile shape, defaulting to square tiles.
    pub fn tile(&self) -> Vec<usize> {
        self.tile
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_TILE_SIZE; self.shape.len()])
    }
}

// =============================================================================
// Tests
// =============================================================================
