use thiserror::Error;

use crate::tile::DataWindow;

/// I/O errors that can occur when reading from dataset storage
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Hyperslab selection does not fit the dataset
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Underlying storage failed the read
    #[error("Read error: {0}")]
    Read(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(err.to_string()),
            _ => IoError::Read(err.to_string()),
        }
    }
}

/// Incompatibilities between a dataset and the complex encoding it claims to hold
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Declared element size does not match the complex encoding
    #[error("Element size mismatch: datatype declares {declared} bytes, encoding needs {required}")]
    ElementSize { declared: usize, required: usize },

    /// Component width is not a supported floating point size
    #[error("Unsupported component width: {0} bytes (expected 4 or 8)")]
    ComponentWidth(usize),

    /// Compound field lies outside the element or overlaps the other field
    #[error("Invalid compound field at offset {offset}: {message}")]
    CompoundField { offset: usize, message: String },

    /// Dimension order is not a permutation of the logical axes
    #[error("Invalid dimension order {order:?} for rank {rank}")]
    DimensionOrder { order: Vec<usize>, rank: usize },

    /// Logical shape has a different rank than the layout expects
    #[error("Rank mismatch: expected {expected}, got {actual}")]
    Rank { expected: usize, actual: usize },

    /// Shape contains a zero-length axis or does not fit the backing storage
    #[error("Invalid shape {shape:?}: {message}")]
    Shape { shape: Vec<usize>, message: String },
}

/// Errors raised while rendering a tile
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Malformed zoom, origin, tile shape or value range
    #[error("Invalid tile request: {reason}")]
    InvalidRequest { reason: String },

    /// Dataset datatype or shape is incompatible with the expected complex encoding
    #[error("Data layout error: {0}")]
    DataLayout(#[from] LayoutError),

    /// Storage failed while reading the window
    #[error("Failed to read window {window}: {source}")]
    SourceRead {
        window: DataWindow,
        #[source]
        source: IoError,
    },

    /// Bitmap could not be converted or written as an image
    #[error("Failed to encode bitmap: {message}")]
    EncodeError { message: String },
}

impl TileError {
    /// Shorthand for an [`TileError::InvalidRequest`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        TileError::InvalidRequest {
            reason: reason.into(),
        }
    }
}
