//! Compile-time constant values.

use std::fmt;

/// Reference to a heap object known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectConstant {
    /// Uncompressed address of the object; identifies it.
    pub address: u64,
    /// Whether the constant is in narrow representation.
    pub compressed: bool,
}

/// A constant value flowing on a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    /// Integer, sign-extended from `bits` to 64 bits.
    Int { bits: u32, value: i64 },
    /// The null reference in full-width representation.
    Null,
    /// The null reference in narrow representation.
    CompressedNull,
    Object(ObjectConstant),
}

impl Constant {
    /// Integer constant, normalised to `bits`.
    pub fn int(bits: u32, value: i64) -> Self {
        Constant::Int {
            bits,
            value: sign_extend(value, bits),
        }
    }

    pub fn object(address: u64) -> Self {
        if address == 0 {
            return Constant::Null;
        }
        Constant::Object(ObjectConstant {
            address,
            compressed: false,
        })
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Constant::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Constant::Null | Constant::CompressedNull)
    }

    /// Whether this is a reference (object or null) constant.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Constant::Int { .. })
    }

    pub fn is_compressed(&self) -> bool {
        match self {
            Constant::CompressedNull => true,
            Constant::Object(obj) => obj.compressed,
            _ => false,
        }
    }

    /// Same reference in narrow representation. Integers are returned unchanged.
    pub fn compress(self) -> Self {
        match self {
            Constant::Null => Constant::CompressedNull,
            Constant::Object(obj) => Constant::Object(ObjectConstant {
                compressed: true,
                ..obj
            }),
            other => other,
        }
    }

    /// Same reference in full-width representation. Integers are returned unchanged.
    pub fn uncompress(self) -> Self {
        match self {
            Constant::CompressedNull => Constant::Null,
            Constant::Object(obj) => Constant::Object(ObjectConstant {
                compressed: false,
                ..obj
            }),
            other => other,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int { bits, value } => write!(f, "i{} {}", bits, value),
            Constant::Null => write!(f, "null"),
            Constant::CompressedNull => write!(f, "narrow null"),
            Constant::Object(obj) if obj.compressed => write!(f, "narrow object@{:#x}", obj.address),
            Constant::Object(obj) => write!(f, "object@{:#x}", obj.address),
        }
    }
}

/// Sign-extend the low `bits` of `value` to 64 bits.
pub fn sign_extend(value: i64, bits: u32) -> i64 {
    if bits == 0 {
        return 0;
    }
    if bits >= 64 {
        return value;
    }
    let shift = 64 - bits;
    (value << shift) >> shift
}

/// Zero-extend the low `bits` of `value` to 64 bits.
pub fn zero_extend(value: i64, bits: u32) -> u64 {
    if bits >= 64 {
        return value as u64;
    }
    (value as u64) & ((1u64 << bits).wrapping_sub(1))
}
