//! Tile address resolution.
//!
//! A tile is requested in the pixel grid of its zoom level. This module turns
//! that request into the absolute window of source samples that has to be read:
//!
//! ```text
//! stride   = 2^zoom
//! start[d] = origin[d] * stride
//! count[d] = tile[d]
//! ```
//!
//! One source sample is read per destination pixel (point sampling). Windows
//! near the far edge of a dataset may extend past the source bounds; the
//! resolver still returns the full window and the read stage substitutes the
//! background sentinel for the uncovered part.

use std::fmt;

use tracing::debug;

use super::encoder::MAX_BYTES_PER_PIXEL;
use crate::error::TileError;

// =============================================================================
// DataWindow
// =============================================================================

/// Absolute region of source samples read to produce one tile.
///
/// Coordinates are in source (zoom 0) index space. The same stride applies to
/// every dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataWindow {
    /// First source index per dimension
    pub start: Vec<usize>,

    /// Distance between consecutive samples, in source indices
    pub stride: usize,

    /// Number of samples per dimension (equals the tile shape)
    pub count: Vec<usize>,
}

impl DataWindow {
    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.count.len()
    }

    /// Total number of samples in the window.
    pub fn len(&self) -> usize {
        self.count.iter().product()
    }

    /// Whether the window selects no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Absolute source index of the `local`-th sample along dimension `dim`.
    #[inline]
    pub fn source_index(&self, dim: usize, local: usize) -> usize {
        self.start[dim] + self.stride * local
    }

    /// Number of leading samples per dimension that fall inside `shape`.
    ///
    /// Samples are always in bounds for a prefix of each axis, so the
    /// in-bounds part of a window is itself a window with these counts.
    pub fn in_bounds_counts(&self, shape: &[usize]) -> Vec<usize> {
        self.start
            .iter()
            .zip(&self.count)
            .zip(shape)
            .map(|((&start, &count), &extent)| {
                if start >= extent {
                    0
                } else {
                    count.min((extent - start - 1) / self.stride + 1)
                }
            })
            .collect()
    }

    /// Whether every sample of the window lies inside `shape`.
    pub fn is_within(&self, shape: &[usize]) -> bool {
        self.in_bounds_counts(shape) == self.count
    }
}

impl fmt::Display for DataWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "start={:?} stride={} count={:?}",
            self.start, self.stride, self.count
        )
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Sampling stride for a zoom level.
///
/// Zoom 0 is full resolution; each level halves the resolution.
pub fn stride_for_zoom(zoom: u32) -> Result<usize, TileError> {
    1usize
        .checked_shl(zoom)
        .ok_or_else(|| TileError::invalid(format!("zoom {} overflows the sampling stride", zoom)))
}

/// Resolve a tile address into the source window it covers.
///
/// # Errors
///
/// Returns [`TileError::InvalidRequest`] if:
/// - `origin`, `tile` and `source_shape` have different ranks
/// - the tile has a zero-length dimension
/// - the tile's bitmap would not fit in memory at the widest pixel format
/// - the zoom level or the window's far corner overflows the index type
///
/// Windows that run past `source_shape` are not an error.
pub fn resolve(
    zoom: u32,
    origin: &[usize],
    tile: &[usize],
    source_shape: &[usize],
) -> Result<DataWindow, TileError> {
    if tile.is_empty() {
        return Err(TileError::invalid("tile shape is empty"));
    }
    if origin.len() != tile.len() || source_shape.len() != tile.len() {
        return Err(TileError::invalid(format!(
            "rank mismatch: origin {:?}, tile {:?}, source {:?}",
            origin, tile, source_shape
        )));
    }
    if let Some(dim) = tile.iter().position(|&extent| extent == 0) {
        return Err(TileError::invalid(format!(
            "tile shape {:?} has a zero-length dimension {}",
            tile, dim
        )));
    }

    let fits = tile
        .iter()
        .try_fold(MAX_BYTES_PER_PIXEL, |acc, &extent| acc.checked_mul(extent))
        .is_some_and(|bytes| bytes <= isize::MAX as usize);
    if !fits {
        return Err(TileError::invalid(format!(
            "tile shape {:?} is too large to render",
            tile
        )));
    }

    let stride = stride_for_zoom(zoom)?;

    let mut start = Vec::with_capacity(tile.len());
    for (&o, &count) in origin.iter().zip(tile) {
        let first = o.checked_mul(stride);
        // The far corner must be addressable so readers can compute indices freely
        let last = first.and_then(|first| first.checked_add(stride.checked_mul(count - 1)?));
        match (first, last) {
            (Some(first), Some(_)) => start.push(first),
            _ => {
                return Err(TileError::invalid(format!(
                    "origin {:?} at zoom {} overflows the source index space",
                    origin, zoom
                )))
            }
        }
    }

    let window = DataWindow {
        start,
        stride,
        count: tile.to_vec(),
    };
    debug!(zoom, window = %window, "resolved tile window");

    Ok(window)
}

// =============================================================================
// Index Helpers
// =============================================================================

/// Row-major element strides for `shape` (last dimension varies fastest).
pub(crate) fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    strides
}

/// Advance a row-major multi-index within `extent`.
///
/// Returns `false` once the index wraps past the last position.
#[inline]
pub(crate) fn advance(index: &mut [usize], extent: &[usize]) -> bool {
    for d in (0..index.len()).rev() {
        index[d] += 1;
        if index[d] < extent[d] {
            return true;
        }
        index[d] = 0;
    }
    false
}
