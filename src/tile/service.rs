//! Tile rendering pipeline.
//!
//! The renderer is the single pipeline shared by every source backend:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileRenderer                            │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    render_tile()                        │    │
//! │  │  1. Resolve window    4. Map into [0, 1]                │    │
//! │  │  2. Read samples      5. Encode bitmap                  │    │
//! │  │  3. Extract channel                                     │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌───────────┐      ┌──────────────┐    ┌──────────────────┐  │
//! │    │  resolve  │      │    Source    │    │  BitmapEncoder   │  │
//! │    └───────────┘      └──────────────┘    └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Renders share no state, so a renderer can serve any number of concurrent
//! requests.

use tracing::{debug, warn};

use super::address::resolve;
use super::channel::{extract, ChannelKind};
use super::encoder::{Bitmap, BitmapEncoder};
use super::range::ValueRange;
use crate::error::TileError;
use crate::source::{DatasetHandle, Datatype, GridSource, Hdf5Source, Source};

// =============================================================================
// Tile Request
// =============================================================================

/// A request for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRequest {
    /// Zoom level (0 = full resolution)
    pub zoom: u32,

    /// Tile origin in zoomed pixel coordinates
    pub origin: Vec<usize>,

    /// Tile shape in pixels per dimension
    pub tile: Vec<usize>,

    /// Channel values mapped onto the intensity scale
    pub range: ValueRange,
}

impl TileRequest {
    /// Create a request, validating zoom and value range.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRequest`] if `zoom` is negative, `origin`
    /// and `tile` have different ranks, or the value range is invalid.
    pub fn new(
        zoom: i32,
        origin: Vec<usize>,
        tile: Vec<usize>,
        min: f64,
        max: f64,
    ) -> Result<Self, TileError> {
        let zoom = u32::try_from(zoom)
            .map_err(|_| TileError::invalid(format!("zoom must be non-negative, got {}", zoom)))?;
        if origin.len() != tile.len() {
            return Err(TileError::invalid(format!(
                "origin {:?} and tile shape {:?} have different ranks",
                origin, tile
            )));
        }
        Ok(Self {
            zoom,
            origin,
            tile,
            range: ValueRange::new(min, max)?,
        })
    }
}

// =============================================================================
// Tile Renderer
// =============================================================================

/// Renders tiles from any [`Source`].
///
/// The byte layout of every bitmap is fixed by the renderer's encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileRenderer {
    encoder: BitmapEncoder,
}

impl TileRenderer {
    /// Renderer producing [`crate::tile::PixelFormat::Gray8`] bitmaps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with a specific encoder.
    pub fn with_encoder(encoder: BitmapEncoder) -> Self {
        Self { encoder }
    }

    /// The bitmap encoder.
    pub fn encoder(&self) -> &BitmapEncoder {
        &self.encoder
    }

    /// Render one tile of `channel` from `source`.
    ///
    /// Pixels outside the source, and pixels whose channel value is NaN, are
    /// written as the encoder's background pixel.
    ///
    /// # Errors
    ///
    /// - [`TileError::InvalidRequest`] if the request does not fit the source rank
    ///   or overflows the index space
    /// - [`TileError::SourceRead`] if the source fails to read the window
    pub async fn render_tile(
        &self,
        source: &dyn Source,
        request: &TileRequest,
        channel: ChannelKind,
    ) -> Result<Bitmap, TileError> {
        let window = resolve(request.zoom, &request.origin, &request.tile, source.shape())?;
        if window.in_bounds_counts(source.shape()).contains(&0) {
            warn!(
                window = %window,
                shape = ?source.shape(),
                "tile lies entirely outside the source"
            );
        }

        let samples = source.read_window(&window).await?;
        if samples.len() != window.len() {
            return Err(TileError::invalid(format!(
                "source returned {} samples for a window of {}",
                samples.len(),
                window.len()
            )));
        }

        let intensities: Vec<Option<f64>> = samples
            .into_iter()
            .map(|sample| {
                let value = extract(sample, channel);
                if value.is_nan() {
                    None
                } else {
                    Some(request.range.normalize(value))
                }
            })
            .collect();

        let bitmap = self.encoder.encode(&intensities, &request.tile)?;
        debug!(
            channel = %channel,
            zoom = request.zoom,
            width = bitmap.width(),
            height = bitmap.height(),
            "rendered tile"
        );
        Ok(bitmap)
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Render `channel` of an in-memory grid.
pub async fn grid_tile(
    source: &GridSource,
    request: &TileRequest,
    channel: ChannelKind,
) -> Result<Bitmap, TileError> {
    TileRenderer::new().render_tile(source, request, channel).await
}

/// Render `channel` of an opened dataset.
///
/// The handle is borrowed for the duration of the render; its lifetime stays
/// with the caller.
///
/// # Errors
///
/// Returns [`TileError::DataLayout`] if `datatype` does not describe the
/// dataset, in addition to the errors of [`TileRenderer::render_tile`].
pub async fn hdf5_tile<D: DatasetHandle>(
    dataset: &D,
    datatype: &Datatype,
    request: &TileRequest,
    channel: ChannelKind,
) -> Result<Bitmap, TileError> {
    let source = Hdf5Source::new(dataset, datatype.clone())?;
    TileRenderer::new().render_tile(&source, request, channel).await
}

/// Render the imaginary part of an in-memory grid.
pub async fn imaginary_grid_tile(
    source: &GridSource,
    zoom: i32,
    origin: &[usize],
    tile: &[usize],
    min: f64,
    max: f64,
) -> Result<Bitmap, TileError> {
    let request = TileRequest::new(zoom, origin.to_vec(), tile.to_vec(), min, max)?;
    grid_tile(source, &request, ChannelKind::Imaginary).await
}

/// Render the imaginary part of an opened dataset.
pub async fn imaginary_hdf5_tile<D: DatasetHandle>(
    dataset: &D,
    datatype: &Datatype,
    zoom: i32,
    origin: &[usize],
    tile: &[usize],
    min: f64,
    max: f64,
) -> Result<Bitmap, TileError> {
    let request = TileRequest::new(zoom, origin.to_vec(), tile.to_vec(), min, max)?;
    hdf5_tile(dataset, datatype, &request, ChannelKind::Imaginary).await
}
