//! Datatype and layout descriptors for disk-resident complex datasets.
//!
//! Complex datasets are stored in one of two ways:
//!
//! ## Interleaved
//! ```text
//! Bytes 0..w:   real component
//! Bytes w..2w:  imaginary component
//! ```
//! where `w` is the component width (4 or 8 bytes). This is the layout of
//! numpy-style `complex64` and `complex128` arrays.
//!
//! ## Compound
//! ```text
//! Bytes real_offset..real_offset+w:  real component
//! Bytes imag_offset..imag_offset+w:  imaginary component
//! ```
//! inside an element of arbitrary size, which may carry padding or other
//! fields. This is how HDF5 compound `{r, i}` types are laid out.
//!
//! # Dimension Order
//!
//! The on-disk axis order may differ from the logical order tiles are
//! addressed in. `dimension_order[k]` names the logical axis stored at storage
//! position `k` (position 0 varies slowest). A dataset written column-major
//! with logical axes `(row, col)` has dimension order `[1, 0]`.

use crate::error::LayoutError;
use crate::io::ByteOrder;
use crate::tile::Sample;

// =============================================================================
// Component Type
// =============================================================================

/// Floating point type of each complex component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// IEEE 754 single precision
    F32,
    /// IEEE 754 double precision
    F64,
}

impl ComponentType {
    /// Component width in bytes.
    pub const fn size(self) -> usize {
        match self {
            ComponentType::F32 => 4,
            ComponentType::F64 => 8,
        }
    }

    /// Component type for a width in bytes.
    pub fn from_size(size: usize) -> Result<Self, LayoutError> {
        match size {
            4 => Ok(ComponentType::F32),
            8 => Ok(ComponentType::F64),
            other => Err(LayoutError::ComponentWidth(other)),
        }
    }
}

// =============================================================================
// Complex Encoding
// =============================================================================

/// Placement of the two components inside an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplexEncoding {
    /// Real then imaginary, adjacent, with no padding
    Interleaved,
    /// Components at explicit byte offsets inside a larger element
    Compound {
        real_offset: usize,
        imag_offset: usize,
    },
}

// =============================================================================
// Datatype
// =============================================================================

/// Describes how complex samples are encoded in a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datatype {
    /// Size of one element in bytes
    pub element_size: usize,

    /// Type of each component
    pub component: ComponentType,

    /// Placement of the components inside an element
    pub encoding: ComplexEncoding,

    /// Byte order of each component
    pub byte_order: ByteOrder,

    /// Logical axis stored at each storage position; `None` means identity
    pub dimension_order: Option<Vec<usize>>,
}

impl Datatype {
    /// Interleaved pair of components of the given type.
    pub fn interleaved(component: ComponentType) -> Self {
        Self {
            element_size: 2 * component.size(),
            component,
            encoding: ComplexEncoding::Interleaved,
            byte_order: ByteOrder::LittleEndian,
            dimension_order: None,
        }
    }

    /// Little-endian interleaved `f32` pairs.
    pub fn complex64() -> Self {
        Self::interleaved(ComponentType::F32)
    }

    /// Little-endian interleaved `f64` pairs.
    pub fn complex128() -> Self {
        Self::interleaved(ComponentType::F64)
    }

    /// Compound element with components at explicit offsets.
    pub fn compound(
        element_size: usize,
        component: ComponentType,
        real_offset: usize,
        imag_offset: usize,
    ) -> Self {
        Self {
            element_size,
            component,
            encoding: ComplexEncoding::Compound {
                real_offset,
                imag_offset,
            },
            byte_order: ByteOrder::LittleEndian,
            dimension_order: None,
        }
    }

    /// Set the component byte order.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Set the storage dimension order.
    pub fn with_dimension_order(mut self, order: Vec<usize>) -> Self {
        self.dimension_order = Some(order);
        self
    }

    /// Byte offsets of the real and imaginary components.
    fn field_offsets(&self) -> (usize, usize) {
        match self.encoding {
            ComplexEncoding::Interleaved => (0, self.component.size()),
            ComplexEncoding::Compound {
                real_offset,
                imag_offset,
            } => (real_offset, imag_offset),
        }
    }

    /// Check that the encoding fits inside the declared element size.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let width = self.component.size();
        match self.encoding {
            ComplexEncoding::Interleaved => {
                if self.element_size != 2 * width {
                    return Err(LayoutError::ElementSize {
                        declared: self.element_size,
                        required: 2 * width,
                    });
                }
            }
            ComplexEncoding::Compound {
                real_offset,
                imag_offset,
            } => {
                for offset in [real_offset, imag_offset] {
                    if offset + width > self.element_size {
                        return Err(LayoutError::CompoundField {
                            offset,
                            message: format!(
                                "{}-byte component does not fit in a {}-byte element",
                                width, self.element_size
                            ),
                        });
                    }
                }
                if real_offset.abs_diff(imag_offset) < width {
                    return Err(LayoutError::CompoundField {
                        offset: imag_offset,
                        message: format!("overlaps the real component at {}", real_offset),
                    });
                }
            }
        }
        Ok(())
    }

    /// Storage-to-logical axis map for a dataset of `rank` dimensions.
    ///
    /// Entry `k` is the logical axis stored at storage position `k`.
    pub fn storage_axes(&self, rank: usize) -> Result<Vec<usize>, LayoutError> {
        let Some(order) = &self.dimension_order else {
            return Ok((0..rank).collect());
        };

        if order.len() != rank {
            return Err(LayoutError::Rank {
                expected: order.len(),
                actual: rank,
            });
        }
        let mut seen = vec![false; rank];
        for &axis in order {
            if axis >= rank || seen[axis] {
                return Err(LayoutError::DimensionOrder {
                    order: order.clone(),
                    rank,
                });
            }
            seen[axis] = true;
        }
        Ok(order.clone())
    }

    /// Decode one element.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than the element size.
    #[inline]
    pub fn decode(&self, bytes: &[u8]) -> Sample {
        let (re, im) = self.field_offsets();
        Sample::new(self.read_component(&bytes[re..]), self.read_component(&bytes[im..]))
    }

    #[inline]
    fn read_component(&self, bytes: &[u8]) -> f64 {
        match self.component {
            ComponentType::F32 => self.byte_order.read_f32(bytes) as f64,
            ComponentType::F64 => self.byte_order.read_f64(bytes),
        }
    }

    /// Append the encoded form of `sample` to `out`; padding bytes are zero.
    pub fn encode_into(&self, sample: Sample, out: &mut Vec<u8>) {
        let base = out.len();
        out.resize(base + self.element_size, 0);
        let (re, im) = self.field_offsets();
        for (offset, value) in [(re, sample.re), (im, sample.im)] {
            let at = base + offset;
            match self.component {
                ComponentType::F32 => {
                    out[at..at + 4].copy_from_slice(&self.byte_order.write_f32(value as f32))
                }
                ComponentType::F64 => {
                    out[at..at + 8].copy_from_slice(&self.byte_order.write_f64(value))
                }
            }
        }
    }
}
