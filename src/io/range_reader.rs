use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading byte ranges from dataset storage.
///
/// This abstraction lets the dataset layer read hyperslabs without loading
/// whole files into memory. Implementations must be thread-safe.
#[async_trait]
pub trait RangeReader: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Get the total size of the resource in bytes.
    fn size(&self) -> u64;

    /// Get a unique identifier for this resource (for logging).
    ///
    /// For local files this is typically `file:///path/to/data.bin`.
    fn identifier(&self) -> &str;
}

// =============================================================================
// Byte Order
// =============================================================================
//
// Datasets written on different machines store their floating point
// components in either byte order. The datatype descriptor declares which.

/// Byte order (endianness) of stored components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Little-endian
    #[default]
    LittleEndian,
    /// Big-endian
    BigEndian,
}

impl ByteOrder {
    /// Read an `f32` from a byte slice using this byte order.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 4 bytes.
    #[inline]
    pub fn read_f32(self, bytes: &[u8]) -> f32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            ByteOrder::LittleEndian => f32::from_le_bytes(raw),
            ByteOrder::BigEndian => f32::from_be_bytes(raw),
        }
    }

    /// Read an `f64` from a byte slice using this byte order.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 8 bytes.
    #[inline]
    pub fn read_f64(self, bytes: &[u8]) -> f64 {
        let raw = [
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ];
        match self {
            ByteOrder::LittleEndian => f64::from_le_bytes(raw),
            ByteOrder::BigEndian => f64::from_be_bytes(raw),
        }
    }

    /// Encode an `f32` in this byte order.
    #[inline]
    pub fn write_f32(self, value: f32) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    /// Encode an `f64` in this byte order.
    #[inline]
    pub fn write_f64(self, value: f64) -> [u8; 8] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }
}
