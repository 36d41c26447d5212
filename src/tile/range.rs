//! Linear mapping of channel values into display intensities.

use serde::{Deserialize, Serialize};

use crate::error::TileError;

/// Intensity used for NaN values and degenerate ranges.
pub const BACKGROUND_INTENSITY: f64 = 0.0;

/// Map `value` from `[min, max]` into `[0, 1]`, clamping values outside the range.
///
/// NaN values map to [`BACKGROUND_INTENSITY`]. A range with `max <= min` has
/// no width to map into, so every value maps to the background intensity too.
#[inline]
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || !(max > min) {
        return BACKGROUND_INTENSITY;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// The value range rendered into a tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Values at or below this map to intensity 0
    pub min: f64,
    /// Values at or above this map to intensity 1
    pub max: f64,
}

impl ValueRange {
    /// Create a value range.
    ///
    /// A zero-width range (`min == max`) is accepted and renders as background.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRequest`] if either bound is NaN or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, TileError> {
        if min.is_nan() || max.is_nan() {
            return Err(TileError::invalid(format!(
                "value range [{}, {}] has a NaN bound",
                min, max
            )));
        }
        if min > max {
            return Err(TileError::invalid(format!(
                "value range is inverted: min {} > max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Whether the range has zero width.
    pub fn is_degenerate(&self) -> bool {
        !(self.max > self.min)
    }

    /// Map `value` into `[0, 1]`.
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        normalize(value, self.min, self.max)
    }
}
