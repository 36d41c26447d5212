//! Dataset handles and hyperslab selection.
//!
//! A [`DatasetHandle`] is the already-opened dataset supplied by whoever owns
//! the file. The tile pipeline only ever asks it for one thing: the packed
//! bytes of a strided hyperslab, expressed in storage axis order.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

use crate::error::{IoError, LayoutError};
use crate::io::RangeReader;
use crate::tile::address::{advance, row_major_strides};

/// Largest row stride, in elements, still fetched as one span. A coalesced
/// read never transfers more than this many times the bytes it keeps.
pub const MAX_OVERREAD: usize = 16;

/// Upper bound on the bytes fetched by one coalesced range read.
pub const MAX_READ_SPAN: usize = 1024 * 1024;

// =============================================================================
// Hyperslab
// =============================================================================

/// A strided selection in storage coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperslab {
    /// First selected index per storage dimension
    pub start: Vec<usize>,

    /// Step between selected indices per storage dimension
    pub stride: Vec<usize>,

    /// Number of selected indices per storage dimension
    pub count: Vec<usize>,
}

impl Hyperslab {
    /// Number of selected elements.
    pub fn len(&self) -> usize {
        self.count.iter().product()
    }

    /// Whether the selection is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that every selected index lies inside `shape`.
    pub fn check_within(&self, shape: &[usize]) -> Result<(), IoError> {
        let rank = shape.len();
        if self.start.len() != rank || self.stride.len() != rank || self.count.len() != rank {
            return Err(IoError::InvalidSelection(format!(
                "selection rank does not match dataset rank {}",
                rank
            )));
        }
        for d in 0..rank {
            if self.stride[d] == 0 {
                return Err(IoError::InvalidSelection(format!(
                    "zero stride in dimension {}",
                    d
                )));
            }
            if self.count[d] == 0 {
                continue;
            }
            let last = self.stride[d]
                .checked_mul(self.count[d] - 1)
                .and_then(|span| span.checked_add(self.start[d]));
            if !matches!(last, Some(last) if last < shape[d]) {
                return Err(IoError::InvalidSelection(format!(
                    "dimension {} selects past extent {} (start {}, stride {}, count {})",
                    d, shape[d], self.start[d], self.stride[d], self.count[d]
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// DatasetHandle Trait
// =============================================================================

/// An opened, disk-resident dataset.
///
/// Opening, closing and the lifetime of the underlying file belong to the
/// caller. Shapes are in storage axis order.
#[async_trait]
pub trait DatasetHandle: Send + Sync {
    /// Shape in storage axis order.
    fn shape(&self) -> &[usize];

    /// Size of one stored element in bytes.
    fn element_size(&self) -> usize;

    /// Identifier for logging.
    fn identifier(&self) -> &str;

    /// Read the selected elements, packed in row-major storage order.
    ///
    /// The returned buffer holds exactly `selection.len() * element_size()`
    /// bytes.
    async fn read_hyperslab(&self, selection: &Hyperslab) -> Result<Bytes, IoError>;
}

#[async_trait]
impl<D: DatasetHandle + ?Sized> DatasetHandle for &D {
    fn shape(&self) -> &[usize] {
        (**self).shape()
    }

    fn element_size(&self) -> usize {
        (**self).element_size()
    }

    fn identifier(&self) -> &str {
        (**self).identifier()
    }

    async fn read_hyperslab(&self, selection: &Hyperslab) -> Result<Bytes, IoError> {
        (**self).read_hyperslab(selection).await
    }
}

#[async_trait]
impl<D: DatasetHandle + ?Sized> DatasetHandle for Arc<D> {
    fn shape(&self) -> &[usize] {
        (**self).shape()
    }

    fn element_size(&self) -> usize {
        (**self).element_size()
    }

    fn identifier(&self) -> &str {
        (**self).identifier()
    }

    async fn read_hyperslab(&self, selection: &Hyperslab) -> Result<Bytes, IoError> {
        (**self).read_hyperslab(selection).await
    }
}

// =============================================================================
// ContiguousDataset
// =============================================================================

/// A dataset stored contiguously, row-major in storage order, at a fixed byte
/// offset of a [`RangeReader`].
///
/// Selected storage rows are fetched in spans of at most [`MAX_READ_SPAN`]
/// bytes when the row stride is at most [`MAX_OVERREAD`], and element by
/// element otherwise.
pub struct ContiguousDataset<R> {
    reader: R,
    offset: u64,
    shape: Vec<usize>,
    strides: Vec<usize>,
    element_size: usize,
}

impl<R: RangeReader> ContiguousDataset<R> {
    /// Describe the dataset of `shape` elements of `element_size` bytes at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Shape`] if the shape is empty, has a zero-length
    /// dimension, or the data would extend past the end of the resource.
    pub fn new(
        reader: R,
        offset: u64,
        shape: Vec<usize>,
        element_size: usize,
    ) -> Result<Self, LayoutError> {
        if shape.is_empty() || shape.contains(&0) || element_size == 0 {
            return Err(LayoutError::Shape {
                shape,
                message: "dataset and element must be non-empty".to_string(),
            });
        }

        let bytes = shape
            .iter()
            .try_fold(element_size as u64, |acc, &n| acc.checked_mul(n as u64))
            .and_then(|len| len.checked_add(offset));
        match bytes {
            Some(end) if end <= reader.size() => {}
            _ => {
                return Err(LayoutError::Shape {
                    message: format!(
                        "{}-byte elements at offset {} exceed {} ({} bytes)",
                        element_size,
                        offset,
                        reader.identifier(),
                        reader.size()
                    ),
                    shape,
                })
            }
        }

        Ok(Self {
            reader,
            offset,
            strides: row_major_strides(&shape),
            shape,
            element_size,
        })
    }

    /// The underlying reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Read one storage row of `selection`, fixed at `outer` in the leading dimensions.
    async fn read_row(
        &self,
        selection: &Hyperslab,
        outer: &[usize],
        out: &mut BytesMut,
    ) -> Result<(), IoError> {
        let last = self.shape.len() - 1;
        let esize = self.element_size;

        let mut first = selection.start[last];
        for (d, &o) in outer.iter().enumerate() {
            first += (selection.start[d] + selection.stride[d] * o) * self.strides[d];
        }
        let base = self.offset + (first * esize) as u64;

        let stride = selection.stride[last];
        let count = selection.count[last];
        let step = stride * esize;

        // Elements fetched per range read
        let per_read = if stride <= MAX_OVERREAD && esize <= MAX_READ_SPAN {
            ((MAX_READ_SPAN - esize) / step + 1).min(count)
        } else {
            1
        };
        trace!(offset = base, count, stride, per_read, "row read");

        let mut j = 0;
        while j < count {
            let n = per_read.min(count - j);
            let span = (n - 1) * step + esize;
            let chunk = self
                .reader
                .read_exact_at(base + (j * step) as u64, span)
                .await?;
            for k in 0..n {
                out.extend_from_slice(&chunk[k * step..k * step + esize]);
            }
            j += n;
        }
        Ok(())
    }
}

#[async_trait]
impl<R: RangeReader> DatasetHandle for ContiguousDataset<R> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn element_size(&self) -> usize {
        self.element_size
    }

    fn identifier(&self) -> &str {
        self.reader.identifier()
    }

    async fn read_hyperslab(&self, selection: &Hyperslab) -> Result<Bytes, IoError> {
        selection.check_within(&self.shape)?;
        if selection.is_empty() {
            return Ok(Bytes::new());
        }

        let mut out = BytesMut::with_capacity(selection.len() * self.element_size);
        let outer_count = &selection.count[..self.shape.len() - 1];
        let mut outer = vec![0; outer_count.len()];
        loop {
            self.read_row(selection, &outer, &mut out).await?;
            if !advance(&mut outer, outer_count) {
                break;
            }
        }

        Ok(out.freeze())
    }
}

// =============================================================================
// SharedDataset
// =============================================================================

/// A dataset handle shared between concurrent renders.
///
/// Every read acquires the handle for its duration; the guard releases it on
/// all exit paths, including failed reads. Use this when the underlying
/// handle does not support concurrent access; otherwise give each task its
/// own handle.
pub struct SharedDataset<D> {
    inner: Arc<Mutex<D>>,
    shape: Vec<usize>,
    element_size: usize,
    identifier: String,
}

impl<D: DatasetHandle> SharedDataset<D> {
    /// Wrap `dataset` for shared use.
    pub fn new(dataset: D) -> Self {
        Self {
            shape: dataset.shape().to_vec(),
            element_size: dataset.element_size(),
            identifier: dataset.identifier().to_string(),
            inner: Arc::new(Mutex::new(dataset)),
        }
    }

    /// Acquire exclusive access to the underlying handle.
    pub async fn lock(&self) -> MutexGuard<'_, D> {
        self.inner.lock().await
    }
}

impl<D> Clone for SharedDataset<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            shape: self.shape.clone(),
            element_size: self.element_size,
            identifier: self.identifier.clone(),
        }
    }
}

#[async_trait]
impl<D: DatasetHandle> DatasetHandle for SharedDataset<D> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn element_size(&self) -> usize {
        self.element_size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn read_hyperslab(&self, selection: &Hyperslab) -> Result<Bytes, IoError> {
        let dataset = self.inner.lock().await;
        dataset.read_hyperslab(selection).await
    }
}
