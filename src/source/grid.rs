use std::sync::Arc;

use async_trait::async_trait;

use super::{check_rank, Source};
use crate::error::{LayoutError, TileError};
use crate::tile::address::{advance, row_major_strides};
use crate::tile::{DataWindow, Sample, BACKGROUND_SAMPLE};

/// Dense in-memory source.
///
/// Samples are stored contiguously in row-major order. The buffer is shared,
/// so clones are cheap and concurrent renders need no locking.
#[derive(Debug, Clone)]
pub struct GridSource {
    shape: Vec<usize>,
    strides: Vec<usize>,
    data: Arc<[Sample]>,
}

/// Number of samples in `shape`, if it is addressable.
fn element_count(shape: &[usize]) -> Result<usize, LayoutError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| LayoutError::Shape {
            shape: shape.to_vec(),
            message: "element count overflows the index type".to_string(),
        })
}

impl GridSource {
    /// Wrap `data` as an array of `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Shape`] if the shape is empty, has a zero-length
    /// dimension, or does not match the number of samples.
    pub fn new(shape: Vec<usize>, data: impl Into<Arc<[Sample]>>) -> Result<Self, LayoutError> {
        let data = data.into();
        if shape.is_empty() || shape.contains(&0) {
            return Err(LayoutError::Shape {
                shape,
                message: "every dimension must be non-empty".to_string(),
            });
        }
        let expected = element_count(&shape)?;
        if data.len() != expected {
            return Err(LayoutError::Shape {
                message: format!("expected {} samples, got {}", expected, data.len()),
                shape,
            });
        }

        Ok(Self {
            strides: row_major_strides(&shape),
            shape,
            data,
        })
    }

    /// Build a grid by evaluating `f` at every index, in row-major order.
    pub fn from_fn(
        shape: Vec<usize>,
        mut f: impl FnMut(&[usize]) -> Sample,
    ) -> Result<Self, LayoutError> {
        let len = element_count(&shape)?;
        let mut data = Vec::with_capacity(len);
        if len > 0 {
            let mut index = vec![0; shape.len()];
            loop {
                data.push(f(&index));
                if !advance(&mut index, &shape) {
                    break;
                }
            }
        }
        Self::new(shape, data)
    }

    /// Sample at `index`, or `None` if it lies outside the grid.
    pub fn get(&self, index: &[usize]) -> Option<Sample> {
        if index.len() != self.shape.len() || index.iter().zip(&self.shape).any(|(i, n)| i >= n) {
            return None;
        }
        let offset: usize = index.iter().zip(&self.strides).map(|(i, s)| i * s).sum();
        Some(self.data[offset])
    }

    /// All samples in row-major order.
    pub fn samples(&self) -> &[Sample] {
        &self.data
    }
}

#[async_trait]
impl Source for GridSource {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    async fn read_window(&self, window: &DataWindow) -> Result<Vec<Sample>, TileError> {
        check_rank(window, &self.shape)?;

        let len = window.len();
        let mut out = Vec::with_capacity(len);
        if len == 0 {
            return Ok(out);
        }

        let inside = window.in_bounds_counts(&self.shape);
        let mut local = vec![0; window.rank()];
        loop {
            let sample = if local.iter().zip(&inside).all(|(l, n)| l < n) {
                let offset: usize = local
                    .iter()
                    .enumerate()
                    .map(|(d, &l)| window.source_index(d, l) * self.strides[d])
                    .sum();
                self.data[offset]
            } else {
                BACKGROUND_SAMPLE
            };
            out.push(sample);

            if !advance(&mut local, &window.count) {
                break;
            }
        }

        Ok(out)
    }
}
