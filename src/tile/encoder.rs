//! Bitmap tile encoder.
//!
//! This module assembles normalized intensities into the raw pixel buffer
//! handed back to callers.
//!
//! # Design Decisions
//!
//! - **Fixed layout per encoder**: The pixel format and palette are chosen once
//!   when the encoder is constructed. Every bitmap it produces has the same
//!   byte layout.
//!
//! - **No resizing or compression**: A tile of shape `(rows, cols)` produces a
//!   bitmap of exactly `rows * cols` pixels, row-major, top row first.
//!
//! - **Explicit background**: Pixels with no data (outside the source, or whose
//!   channel value is NaN) are written as the format's background pixel rather
//!   than as a palette color.
//!
//! # Byte Layout
//!
//! | Format  | Bytes/pixel | Pixel                       | Background   |
//! |---------|-------------|-----------------------------|--------------|
//! | `Gray8` | 1           | quantized intensity         | `0`          |
//! | `Rgb8`  | 3           | palette color               | `0, 0, 0`    |
//! | `Rgba8` | 4           | palette color, alpha `255`  | `0, 0, 0, 0` |
//!
//! Rows are packed with no padding: the row stride is `width * bytes_per_pixel`.

use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::palette::{quantize, Palette};
use crate::error::TileError;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: usize = 256;

/// Size of the widest pixel format, in bytes.
pub const MAX_BYTES_PER_PIXEL: usize = 4;

static BACKGROUND_PIXEL: [u8; MAX_BYTES_PER_PIXEL] = [0; MAX_BYTES_PER_PIXEL];

// =============================================================================
// Pixel Format
// =============================================================================

/// Byte layout of a bitmap pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// One byte per pixel, the quantized intensity; the palette is not used
    #[default]
    Gray8,
    /// Three bytes per pixel, red, green, blue
    Rgb8,
    /// Four bytes per pixel, red, green, blue, alpha
    Rgba8,
}

impl PixelFormat {
    /// Number of bytes per pixel.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    /// The background pixel, sized to [`Self::bytes_per_pixel`].
    #[inline]
    pub fn background(self) -> &'static [u8] {
        &BACKGROUND_PIXEL[..self.bytes_per_pixel()]
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PixelFormat::Gray8 => "gray8",
            PixelFormat::Rgb8 => "rgb8",
            PixelFormat::Rgba8 => "rgba8",
        })
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gray8" | "gray" | "l8" => Ok(PixelFormat::Gray8),
            "rgb8" | "rgb" => Ok(PixelFormat::Rgb8),
            "rgba8" | "rgba" => Ok(PixelFormat::Rgba8),
            other => Err(format!(
                "unknown pixel format '{}' (expected gray8, rgb8 or rgba8)",
                other
            )),
        }
    }
}

// =============================================================================
// Bitmap
// =============================================================================

/// A rendered tile.
///
/// The bitmap carries no coordinate metadata; it is owned by whoever asked
/// for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Bitmap {
    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel format of [`Self::as_bytes`].
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per row.
    pub fn row_stride(&self) -> usize {
        self.width * self.format.bytes_per_pixel()
    }

    /// Raw pixel buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the raw pixel buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of the pixel at column `x`, row `y`.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let start = y * self.row_stride() + x * bpp;
        Some(&self.data[start..start + bpp])
    }

    /// Whether the pixel at `(x, y)` is the background pixel.
    pub fn is_background(&self, x: usize, y: usize) -> bool {
        self.pixel(x, y) == Some(self.format.background())
    }

    /// Convert into an [`image::DynamicImage`] for saving or further processing.
    pub fn to_image(&self) -> Result<DynamicImage, TileError> {
        let (w, h) = (dimension(self.width)?, dimension(self.height)?);
        let data = self.data.clone();
        let image = match self.format {
            PixelFormat::Gray8 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            PixelFormat::Rgb8 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            PixelFormat::Rgba8 => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        };
        image.ok_or_else(|| TileError::EncodeError {
            message: format!(
                "buffer of {} bytes does not hold a {}x{} {} image",
                self.data.len(),
                self.width,
                self.height,
                self.format
            ),
        })
    }
}

fn dimension(extent: usize) -> Result<u32, TileError> {
    u32::try_from(extent).map_err(|_| TileError::EncodeError {
        message: format!("bitmap dimension {} exceeds u32", extent),
    })
}

// =============================================================================
// Bitmap Encoder
// =============================================================================

/// Assembles normalized intensities into a [`Bitmap`].
///
/// # Example
///
/// ```
/// use complex_tiles::tile::{BitmapEncoder, Palette, PixelFormat};
///
/// let encoder = BitmapEncoder::new(PixelFormat::Rgba8, Palette::Hot);
/// let bitmap = encoder.encode(&[Some(0.0), Some(1.0), None, Some(0.5)], &[2, 2]).unwrap();
///
/// assert_eq!(bitmap.width(), 2);
/// assert_eq!(bitmap.pixel(1, 0), Some(&[255, 255, 255, 255][..]));
/// assert!(bitmap.is_background(0, 1));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitmapEncoder {
    format: PixelFormat,
    palette: Palette,
}

impl BitmapEncoder {
    /// Create an encoder producing `format` pixels colored with `palette`.
    pub fn new(format: PixelFormat, palette: Palette) -> Self {
        Self { format, palette }
    }

    /// The pixel format of every bitmap this encoder produces.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The palette used for color formats.
    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Encode row-major intensities into a bitmap of shape `tile`.
    ///
    /// `None` entries are written as background. The bitmap is `tile[rank-1]`
    /// pixels wide and as tall as the product of the remaining dimensions, so a
    /// two-dimensional tile `(rows, cols)` becomes a `cols x rows` bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRequest`] if `tile` is empty or the number of
    /// intensities does not match the tile shape.
    pub fn encode(&self, intensities: &[Option<f64>], tile: &[usize]) -> Result<Bitmap, TileError> {
        let (width, height) = bitmap_dimensions(tile)?;
        if width.checked_mul(height) != Some(intensities.len()) {
            return Err(TileError::invalid(format!(
                "{} intensities do not fill a tile of shape {:?}",
                intensities.len(),
                tile
            )));
        }

        let mut data = Vec::with_capacity(intensities.len() * self.format.bytes_per_pixel());
        for intensity in intensities {
            match intensity {
                Some(t) => self.write_pixel(&mut data, *t),
                None => data.extend_from_slice(self.format.background()),
            }
        }

        Ok(Bitmap {
            width,
            height,
            format: self.format,
            data,
        })
    }

    #[inline]
    fn write_pixel(&self, data: &mut Vec<u8>, intensity: f64) {
        match self.format {
            PixelFormat::Gray8 => data.push(quantize(intensity)),
            PixelFormat::Rgb8 => data.extend_from_slice(&self.palette.color(intensity)),
            PixelFormat::Rgba8 => {
                data.extend_from_slice(&self.palette.color(intensity));
                data.push(255);
            }
        }
    }
}

/// `(width, height)` of the bitmap for a tile shape.
pub fn bitmap_dimensions(tile: &[usize]) -> Result<(usize, usize), TileError> {
    let (&width, rows) = tile
        .split_last()
        .ok_or_else(|| TileError::invalid("tile shape is empty"))?;
    let height = rows
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| TileError::invalid(format!("tile shape {:?} is too large", tile)))?;
    Ok((width, height))
}

// =============================================================================
// Tests
// =============================================================================
