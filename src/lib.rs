//! # complex-tiles
//!
//! Renders fixed-size bitmap tiles of one scalar channel of a complex-valued
//! multidimensional array, for pan-and-zoom inspection of large datasets.
//!
//! A tile is addressed by a zoom level, an origin in zoomed pixels and a tile
//! shape. The pipeline resolves the address into a strided window of the
//! source, reads the window, reduces each complex sample to one channel (real,
//! imaginary, magnitude or phase), maps the values linearly through a
//! `[min, max]` range and packs the result into a bitmap.
//!
//! ## Features
//!
//! - **Two backends, one pipeline**: dense in-memory grids and disk-resident
//!   datasets implement the same [`source::Source`] trait
//! - **Partial reads**: disk datasets are read as one strided hyperslab per tile
//! - **Boundary handling**: tiles past the source edge render as background
//! - **Fixed bitmap layout**: gray, RGB or RGBA, chosen once per encoder
//!
//! ## Architecture
//!
//! - [`tile`] - Address resolution, channel extraction, range mapping, encoding
//! - [`source`] - The source trait with its grid and HDF5-style backends
//! - [`io`] - Byte range readers for local storage
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust
//! use complex_tiles::{imaginary_grid_tile, GridSource, Sample};
//!
//! #[tokio::main]
//! async fn main() {
//!     let grid = GridSource::from_fn(vec![64, 64], |i| {
//!         Sample::new(i[1] as f64, i[0] as f64)
//!     })
//!     .unwrap();
//!
//!     // Zoom 1 samples every second index: a 32x32 tile covers the grid
//!     let bitmap = imaginary_grid_tile(&grid, 1, &[0, 0], &[32, 32], 0.0, 63.0)
//!         .await
//!         .unwrap();
//!     assert_eq!((bitmap.width(), bitmap.height()), (32, 32));
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod source;
pub mod tile;

// Re-export commonly used types
pub use config::{Cli, Command, LevelsConfig, RenderConfig};
pub use error::{IoError, LayoutError, TileError};
pub use io::{ByteOrder, FileRangeReader, RangeReader};
pub use source::{
    ComplexEncoding, ComponentType, ContiguousDataset, DatasetHandle, Datatype, GridSource,
    Hdf5Source, Hyperslab, IndexType, SharedDataset, Source,
};
pub use tile::{
    extract, grid_tile, hdf5_tile, imaginary_grid_tile, imaginary_hdf5_tile, normalize, resolve,
    Bitmap, BitmapEncoder, ChannelKind, DataWindow, Palette, PixelFormat, Pyramid, Sample,
    TileRenderer, TileRequest, ValueRange, ZoomLevel, BACKGROUND_SAMPLE,
};
