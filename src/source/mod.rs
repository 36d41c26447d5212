//! Source abstraction layer.
//!
//! This module provides a uniform interface for reading complex samples from
//! any backend, so the tile pipeline never sees storage details.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              TileRenderer               │
//! └────────────────────┬────────────────────┘
//!                      │ read_window(window)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Source Trait               │
//! │  (shape, index type, windowed reads)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │   GridSource    │    │     Hdf5Source      │
//! │ (dense memory)  │    │ (dataset handle +   │
//! │                 │    │  datatype layout)   │
//! └─────────────────┘    └──────────┬──────────┘
//!                                   ▼
//!                        ┌─────────────────────┐
//!                        │    DatasetHandle    │
//!                        │ (hyperslab reads)   │
//!                        └─────────────────────┘
//! ```

mod grid;
pub mod hdf5;

use std::fmt;

use async_trait::async_trait;

use crate::error::TileError;
use crate::tile::{DataWindow, Sample};

pub use grid::GridSource;
pub use hdf5::{
    ComplexEncoding, ComponentType, ContiguousDataset, DatasetHandle, Datatype, Hdf5Source,
    Hyperslab, SharedDataset,
};

// =============================================================================
// Index Type
// =============================================================================

/// Width of the coordinate tuples that address a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexType {
    rank: usize,
}

impl IndexType {
    /// Index type for `rank`-dimensional coordinates.
    pub const fn new(rank: usize) -> Self {
        Self { rank }
    }

    /// Number of coordinates per index.
    pub const fn rank(self) -> usize {
        self.rank
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index<{}>", self.rank)
    }
}

// =============================================================================
// Source Trait
// =============================================================================

/// A fixed-shape array of complex samples that tiles can be cut from.
///
/// Implementations must return exactly `window.len()` samples in row-major
/// window order, substituting [`crate::tile::BACKGROUND_SAMPLE`] for every
/// position outside [`Source::shape`]. Shape and index type never change over
/// the lifetime of a source.
#[async_trait]
pub trait Source: Send + Sync {
    /// Logical shape of the array.
    fn shape(&self) -> &[usize];

    /// Coordinate tuple width.
    fn index_type(&self) -> IndexType {
        IndexType::new(self.shape().len())
    }

    /// Read the samples selected by `window`.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::SourceRead`] if the backing storage fails, or
    /// [`TileError::InvalidRequest`] if the window rank does not match.
    async fn read_window(&self, window: &DataWindow) -> Result<Vec<Sample>, TileError>;
}

/// Check that `window` addresses a source of `shape`.
pub(crate) fn check_rank(window: &DataWindow, shape: &[usize]) -> Result<(), TileError> {
    if window.rank() != shape.len() || window.start.len() != shape.len() {
        return Err(TileError::invalid(format!(
            "window {} does not match source rank {}",
            window,
            shape.len()
        )));
    }
    Ok(())
}
