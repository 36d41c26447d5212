//! Zoom pyramid layout.
//!
//! A source is browsed as a pyramid of zoom levels. Level 0 is the source at
//! full resolution; level `z` samples every `2^z`-th index. Each level is cut
//! into a mosaic of fixed-shape tiles.
//!
//! # Pyramid Structure
//!
//! ```text
//! zoom  stride  extent            tiles
//!  0      1     shape             ceil(shape / tile)
//!  1      2     ceil(shape / 2)   ceil(extent / tile)
//!  ...
//!  max    2^max fits in one tile  1 x 1
//! ```
//!
//! The pyramid stops at the first level whose extent fits inside a single
//! tile.

use serde::Serialize;

use super::address::stride_for_zoom;
use crate::error::TileError;

// =============================================================================
// ZoomLevel
// =============================================================================

/// A single level of the zoom pyramid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoomLevel {
    /// Zoom level (0 = full resolution)
    pub zoom: u32,

    /// Sampling stride in source indices
    pub stride: usize,

    /// Shape of the source in this level's pixel grid
    pub extent: Vec<usize>,

    /// Number of tiles per dimension
    pub tiles: Vec<usize>,
}

impl ZoomLevel {
    /// Total number of tiles at this level.
    pub fn tile_count(&self) -> usize {
        self.tiles.iter().product()
    }
}

// =============================================================================
// Pyramid
// =============================================================================

/// The zoom levels of a source for a given tile shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pyramid {
    /// Source shape at full resolution
    pub shape: Vec<usize>,

    /// Tile shape shared by every level
    pub tile: Vec<usize>,

    /// Levels, finest first
    pub levels: Vec<ZoomLevel>,
}

impl Pyramid {
    /// Build the pyramid for a source of `shape` cut into tiles of `tile`.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRequest`] if the ranks differ or either
    /// shape has a zero-length dimension.
    pub fn new(shape: &[usize], tile: &[usize]) -> Result<Self, TileError> {
        if shape.is_empty() || shape.len() != tile.len() {
            return Err(TileError::invalid(format!(
                "cannot tile shape {:?} with tiles of {:?}",
                shape, tile
            )));
        }
        if shape.contains(&0) || tile.contains(&0) {
            return Err(TileError::invalid(format!(
                "shape {:?} and tile {:?} must not have zero-length dimensions",
                shape, tile
            )));
        }

        let mut levels = Vec::new();
        for zoom in 0.. {
            let stride = stride_for_zoom(zoom)?;
            let extent: Vec<usize> = shape.iter().map(|&n| n.div_ceil(stride)).collect();
            let tiles: Vec<usize> = extent
                .iter()
                .zip(tile)
                .map(|(&e, &t)| e.div_ceil(t))
                .collect();
            let done = tiles.iter().all(|&t| t == 1);

            levels.push(ZoomLevel {
                zoom,
                stride,
                extent,
                tiles,
            });

            if done {
                break;
            }
        }

        Ok(Self {
            shape: shape.to_vec(),
            tile: tile.to_vec(),
            levels,
        })
    }

    /// The coarsest zoom level.
    pub fn max_zoom(&self) -> u32 {
        self.levels.last().map(|level| level.zoom).unwrap_or(0)
    }

    /// Get a level by zoom.
    pub fn level(&self, zoom: u32) -> Option<&ZoomLevel> {
        self.levels.get(zoom as usize)
    }

    /// Origin, in the level's pixel grid, of the tile at `tile_index`.
    ///
    /// Returns `None` if the zoom or the tile index is out of range.
    pub fn tile_origin(&self, zoom: u32, tile_index: &[usize]) -> Option<Vec<usize>> {
        let level = self.level(zoom)?;
        if tile_index.len() != level.tiles.len()
            || tile_index.iter().zip(&level.tiles).any(|(&i, &n)| i >= n)
        {
            return None;
        }
        Some(tile_index.iter().zip(&self.tile).map(|(&i, &t)| i * t).collect())
    }
}
