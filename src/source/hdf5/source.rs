use async_trait::async_trait;
use tracing::debug;

use super::dataset::{DatasetHandle, Hyperslab};
use super::datatype::Datatype;
use crate::error::{IoError, LayoutError, TileError};
use crate::source::{check_rank, Source};
use crate::tile::address::{advance, row_major_strides};
use crate::tile::{DataWindow, Sample, BACKGROUND_SAMPLE};

/// Disk-resident source backed by a dataset handle and a datatype descriptor.
///
/// Windows are translated into a single hyperslab over the in-bounds part of
/// the window, permuted into storage axis order, and read in one call. The
/// rest of the window is filled with background.
pub struct Hdf5Source<D> {
    dataset: D,
    datatype: Datatype,
    /// Logical axis stored at each storage position
    axes: Vec<usize>,
    /// Logical shape
    shape: Vec<usize>,
}

impl<D: DatasetHandle> Hdf5Source<D> {
    /// Negotiate the datatype against the dataset's on-disk layout.
    ///
    /// # Errors
    ///
    /// Returns a [`LayoutError`] if the datatype is malformed, its element size
    /// differs from the dataset's, or its dimension order does not fit the
    /// dataset's rank.
    pub fn new(dataset: D, datatype: Datatype) -> Result<Self, LayoutError> {
        datatype.validate()?;

        if dataset.element_size() != datatype.element_size {
            return Err(LayoutError::ElementSize {
                declared: dataset.element_size(),
                required: datatype.element_size,
            });
        }

        let storage = dataset.shape();
        if storage.is_empty() || storage.contains(&0) {
            return Err(LayoutError::Shape {
                shape: storage.to_vec(),
                message: "dataset has no samples".to_string(),
            });
        }

        let axes = datatype.storage_axes(storage.len())?;
        let mut shape = vec![0; storage.len()];
        for (k, &axis) in axes.iter().enumerate() {
            shape[axis] = storage[k];
        }

        debug!(
            dataset = dataset.identifier(),
            shape = ?shape,
            storage_axes = ?axes,
            "negotiated dataset layout"
        );

        Ok(Self {
            dataset,
            datatype,
            axes,
            shape,
        })
    }

    /// The datatype descriptor.
    pub fn datatype(&self) -> &Datatype {
        &self.datatype
    }

    /// The underlying dataset handle.
    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    /// Hyperslab, in storage order, covering the in-bounds part of `window`.
    fn selection(&self, window: &DataWindow, inside: &[usize]) -> Hyperslab {
        Hyperslab {
            start: self.axes.iter().map(|&a| window.start[a]).collect(),
            stride: vec![window.stride; self.axes.len()],
            count: self.axes.iter().map(|&a| inside[a]).collect(),
        }
    }
}

#[async_trait]
impl<D: DatasetHandle> Source for Hdf5Source<D> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    async fn read_window(&self, window: &DataWindow) -> Result<Vec<Sample>, TileError> {
        check_rank(window, &self.shape)?;

        let mut out = vec![BACKGROUND_SAMPLE; window.len()];
        let inside = window.in_bounds_counts(&self.shape);
        if inside.contains(&0) {
            debug!(
                dataset = self.dataset.identifier(),
                window = %window,
                "window outside dataset, skipping read"
            );
            return Ok(out);
        }

        let selection = self.selection(window, &inside);
        let bytes = self
            .dataset
            .read_hyperslab(&selection)
            .await
            .map_err(|source| TileError::SourceRead {
                window: window.clone(),
                source,
            })?;

        let esize = self.datatype.element_size;
        if bytes.len() != selection.len() * esize {
            return Err(TileError::SourceRead {
                window: window.clone(),
                source: IoError::Read(format!(
                    "short hyperslab read: expected {} bytes, got {}",
                    selection.len() * esize,
                    bytes.len()
                )),
            });
        }

        debug!(
            dataset = self.dataset.identifier(),
            window = %window,
            elements = selection.len(),
            "read hyperslab"
        );

        // Scatter storage-ordered elements into row-major window order
        let window_strides = row_major_strides(&window.count);
        let mut storage_index = vec![0; self.axes.len()];
        for element in bytes.chunks_exact(esize) {
            let dest: usize = storage_index
                .iter()
                .zip(&self.axes)
                .map(|(&i, &axis)| i * window_strides[axis])
                .sum();
            out[dest] = self.datatype.decode(element);
            advance(&mut storage_index, &selection.count);
        }

        Ok(out)
    }
}
