//! Compressed reference encoding.
//!
//! A compressed reference is a 32-bit value `n` standing for the address
//! `base + (n << shift)`. Zero is reserved for null in both representations.

use std::fmt;

/// Parameters describing how references are packed into 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressEncoding {
    /// Heap base subtracted before shifting.
    pub base: u64,
    /// Number of low zero bits dropped by compression.
    pub shift: u32,
    /// Object alignment in bytes.
    pub alignment: u32,
}

impl CompressEncoding {
    pub const fn new(base: u64, shift: u32, alignment: u32) -> Self {
        Self {
            base,
            shift,
            alignment,
        }
    }

    /// Zero-based encoding with the alignment implied by `shift`.
    ///
    /// A shift of 32 or more has no representable alignment and yields an
    /// invalid encoding.
    pub const fn with_shift(shift: u32) -> Self {
        let alignment = match 1u32.checked_shl(shift) {
            Some(alignment) => alignment,
            None => 0,
        };
        Self::new(0, shift, alignment)
    }

    pub const fn has_base(&self) -> bool {
        self.base != 0
    }

    pub const fn has_shift(&self) -> bool {
        self.shift != 0
    }

    /// The shift must not drop bits that aligned addresses can have set.
    pub fn is_valid(&self) -> bool {
        self.alignment.is_power_of_two() && self.shift < 32 && (1u64 << self.shift) <= self.alignment as u64
    }

    /// Pack an address. Null stays null.
    ///
    /// `None` when the address lies below the heap base, is not aligned, or
    /// does not fit in 32 bits after shifting.
    pub fn compress(&self, address: u64) -> Option<u32> {
        if address == 0 {
            return Some(0);
        }
        if self.alignment == 0 || address % self.alignment as u64 != 0 {
            return None;
        }
        let offset = address.checked_sub(self.base)?;
        u32::try_from(offset.checked_shr(self.shift)?).ok()
    }

    /// Unpack a compressed value. Null stays null.
    ///
    /// `None` when the address overflows 64 bits.
    pub fn uncompress(&self, narrow: u32) -> Option<u64> {
        if narrow == 0 {
            return Some(0);
        }
        let offset = (narrow as u64).checked_shl(self.shift)?;
        if offset >> self.shift != narrow as u64 {
            return None;
        }
        self.base.checked_add(offset)
    }
}

impl fmt::Display for CompressEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base={:#x} shift={} align={}", self.base, self.shift, self.alignment)
    }
}
