//! Tile pipeline.
//!
//! This module turns a tile address into a bitmap of one scalar channel of a
//! complex source.
//!
//! # Architecture
//!
//! ```text
//! (zoom, origin, tile)
//!          │
//!          ▼
//! ┌─────────────────┐   DataWindow   ┌─────────────────┐
//! │     resolve     │───────────────▶│     Source      │
//! └─────────────────┘                └────────┬────────┘
//!                                             │ complex samples
//!                                             ▼
//! ┌─────────────────┐   intensities  ┌─────────────────┐
//! │  BitmapEncoder  │◀───────────────│ extract + range │
//! └────────┬────────┘                └─────────────────┘
//!          ▼
//!       Bitmap
//! ```
//!
//! # Components
//!
//! - [`resolve`]: Maps a tile address to a strided source window
//! - [`extract`]: Reduces a complex sample to one [`ChannelKind`]
//! - [`ValueRange`]: Linear mapping of channel values into `[0, 1]`
//! - [`BitmapEncoder`]: Packs intensities into a [`Bitmap`] of fixed layout
//! - [`TileRenderer`]: Runs the pipeline against any [`crate::source::Source`]
//! - [`Pyramid`]: Zoom levels and tile grids for a source shape
//!
//! # Example
//!
//! ```
//! use complex_tiles::source::GridSource;
//! use complex_tiles::tile::{imaginary_grid_tile, Sample};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Imaginary part equals the row index
//!     let grid = GridSource::from_fn(vec![4, 4], |i| Sample::new(0.0, i[0] as f64)).unwrap();
//!
//!     let bitmap = imaginary_grid_tile(&grid, 0, &[0, 0], &[4, 4], 0.0, 3.0)
//!         .await
//!         .unwrap();
//!     assert_eq!(bitmap.pixel(0, 3), Some(&[255u8][..]));
//! }
//! ```

pub mod address;
mod channel;
mod encoder;
mod palette;
mod pyramid;
mod range;
mod service;

pub use address::{resolve, stride_for_zoom, DataWindow};
pub use channel::{extract, ChannelKind, Sample, BACKGROUND_SAMPLE};
pub use encoder::{
    bitmap_dimensions, Bitmap, BitmapEncoder, PixelFormat, DEFAULT_TILE_SIZE, MAX_BYTES_PER_PIXEL,
};
pub use palette::{quantize, Palette};
pub use pyramid::{Pyramid, ZoomLevel};
pub use range::{normalize, ValueRange, BACKGROUND_INTENSITY};
pub use service::{
    grid_tile, hdf5_tile, imaginary_grid_tile, imaginary_hdf5_tile, TileRenderer, TileRequest,
};
