//! Memory-read capabilities used for constant folding.
//!
//! Both traits are implemented by the runtime embedding the compiler. A
//! provider that does not understand compressed references keeps the default
//! [`MemoryAccessProvider::read_narrow_object_constant`], which reports the
//! missing capability instead of guessing.

use crate::compress::CompressEncoding;
use crate::constant::Constant;
use crate::core::error::{CompileError, CompileResult};

/// Reads reference constants out of heap objects known at compile time.
pub trait MemoryAccessProvider {
    /// Read a full-width reference stored at `base + displacement`.
    ///
    /// Returns `Ok(None)` when the location cannot be folded (unknown base,
    /// mutable field, out of bounds).
    fn read_object_constant(&self, base: &Constant, displacement: i64) -> CompileResult<Option<Constant>>;

    /// Read a compressed reference stored at `base + displacement`.
    ///
    /// The result is in narrow representation.
    fn read_narrow_object_constant(
        &self,
        _base: &Constant,
        _displacement: i64,
        _encoding: &CompressEncoding,
    ) -> CompileResult<Option<Constant>> {
        Err(CompileError::UnsupportedMemoryRead {
            representation: "compressed reference",
        })
    }
}

/// Placement of reference elements inside array objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayLayout {
    /// Offset of element 0 from the array start.
    pub base_offset: i64,
    /// Size of one element slot in bytes.
    pub index_scale: i64,
}

impl ArrayLayout {
    /// Element index addressed by `displacement`, if it hits a slot boundary.
    pub fn index_for_offset(&self, displacement: i64) -> Option<usize> {
        let relative = displacement.checked_sub(self.base_offset)?;
        if relative < 0 || self.index_scale <= 0 || relative % self.index_scale != 0 {
            return None;
        }
        usize::try_from(relative / self.index_scale).ok()
    }
}

/// Generic access to array elements of constant arrays.
///
/// Elements are always returned in full-width representation, regardless of
/// how the runtime stores them.
pub trait ConstantReflectionProvider {
    fn array_layout(&self) -> ArrayLayout;

    fn read_array_element(&self, array: &Constant, index: usize) -> Option<Constant>;

    /// Read the element addressed by a byte displacement into `array`.
    fn read_array_element_for_offset(&self, array: &Constant, displacement: i64) -> Option<Constant> {
        let index = self.array_layout().index_for_offset(displacement)?;
        self.read_array_element(array, index)
    }
}
