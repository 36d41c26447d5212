//! HDF5-style disk-resident source.
//!
//! A dataset is reached through a [`DatasetHandle`], which knows its storage
//! shape and element size and can read a strided hyperslab as packed bytes.
//! The [`Datatype`] descriptor says how each element encodes a complex sample
//! and in which order the logical axes are stored. [`Hdf5Source`] negotiates
//! the two and exposes the dataset through the [`crate::source::Source`] trait.
//!
//! [`ContiguousDataset`] implements the handle for contiguous (unchunked)
//! layouts over any [`crate::io::RangeReader`], and [`SharedDataset`] wraps a
//! handle whose reads must be serialized.
//!
//! # Example
//!
//! ```no_run
//! use complex_tiles::io::FileRangeReader;
//! use complex_tiles::source::{ContiguousDataset, Datatype, Hdf5Source, Source};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reader = FileRangeReader::open("scene.bin").await?;
//!     let dataset = ContiguousDataset::new(reader, 0, vec![1024, 1024], 8)?;
//!     let source = Hdf5Source::new(dataset, Datatype::complex64())?;
//!     println!("shape: {:?}", source.shape());
//!     Ok(())
//! }
//! ```

mod dataset;
mod datatype;
mod source;

pub use dataset::{
    ContiguousDataset, DatasetHandle, Hyperslab, SharedDataset, MAX_OVERREAD, MAX_READ_SPAN,
};
pub use datatype::{ComplexEncoding, ComponentType, Datatype};
pub use source::Hdf5Source;
