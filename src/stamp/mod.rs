//! Stamp lattice.
//!
//! A [`Stamp`] summarises the values a graph edge may carry at run time.
//! Reference stamps come in two representation classes, full-width
//! ([`ObjectStamp`]) and compressed ([`NarrowStamp`]). The representation is an
//! axis orthogonal to the type and nullness facts: converting with
//! [`compress`]/[`decompress`] never changes those facts, and stamps of
//! different representations can never be merged.
//!
//! # Compatibility
//!
//! | left | right | compatible when |
//! |------|-------|-----------------|
//! | `Integer` | `Integer` | same bit width |
//! | `Object` | `Object` | always |
//! | `Narrow` | `Narrow` | equal encodings |
//! | `Void` | `Void` | always |
//!
//! Every other combination is incompatible and [`Stamp::meet`] reports it as
//! an internal error.

use std::fmt;

use crate::compress::CompressEncoding;
use crate::constant::Constant;
use crate::core::error::{CompileError, CompileResult};
use crate::core::target::Target;
use crate::memory::{ConstantReflectionProvider, MemoryAccessProvider};

mod integer;
mod object;
mod types;

pub use integer::IntegerStamp;
pub use object::{NarrowStamp, ObjectStamp};
pub use types::TypeRef;

/// Abstract value descriptor of a graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stamp {
    /// No value (guards, returns).
    Void,
    Integer(IntegerStamp),
    Object(ObjectStamp),
    Narrow(NarrowStamp),
}

/// Pack a full-width reference stamp; type and nullness facts are kept.
pub fn compress(stamp: &ObjectStamp, encoding: CompressEncoding) -> NarrowStamp {
    stamp.compressed(encoding)
}

/// Inverse of [`compress`].
pub fn decompress(stamp: &NarrowStamp) -> ObjectStamp {
    stamp.uncompressed()
}

impl Stamp {
    pub fn int(bits: u32) -> Self {
        Stamp::Integer(IntegerStamp::unrestricted(bits))
    }

    pub fn int_constant(bits: u32, value: i64) -> Self {
        Stamp::Integer(IntegerStamp::constant(bits, value))
    }

    /// Stamp describing exactly `constant`.
    ///
    /// Compressed reference constants need the encoding of their
    /// representation; without one they are rejected rather than given a
    /// full-width stamp that would not admit them.
    pub fn for_constant(constant: &Constant, encoding: Option<CompressEncoding>) -> CompileResult<Self> {
        let facts = match constant {
            Constant::Int { bits, value } => return Ok(Stamp::int_constant(*bits, *value)),
            Constant::Null | Constant::CompressedNull => ObjectStamp::null(),
            Constant::Object(_) => ObjectStamp::new(None, false, true, false),
        };
        if !constant.is_compressed() {
            return Ok(Stamp::Object(facts));
        }
        match encoding {
            Some(encoding) => Ok(Stamp::Narrow(facts.compressed(encoding))),
            None => Err(CompileError::MissingEncoding {
                constant: constant.to_string(),
            }),
        }
    }

    pub fn as_integer(&self) -> Option<&IntegerStamp> {
        match self {
            Stamp::Integer(stamp) => Some(stamp),
            _ => None,
        }
    }

    /// Bit width of integer stamps.
    pub fn bits(&self) -> Option<u32> {
        self.as_integer().map(IntegerStamp::bits)
    }

    /// Register width needed to hold a value of this stamp on `target`.
    ///
    /// Compressed references always fit 32 bits; full-width references take a
    /// machine word. `Void` has no storage.
    pub fn storage_bits(&self, target: &Target) -> Option<u32> {
        match self {
            Stamp::Void => None,
            Stamp::Integer(stamp) => Some(stamp.bits()),
            Stamp::Object(_) => Some(target.word_bits),
            Stamp::Narrow(_) => Some(32),
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Stamp::Narrow(_))
    }

    /// Whether the two stamps share a representation and may be merged.
    pub fn is_compatible(&self, other: &Stamp) -> bool {
        match (self, other) {
            (Stamp::Void, Stamp::Void) => true,
            (Stamp::Integer(a), Stamp::Integer(b)) => a.bits() == b.bits(),
            (Stamp::Object(_), Stamp::Object(_)) => true,
            (Stamp::Narrow(a), Stamp::Narrow(b)) => a.is_compatible(b),
            _ => false,
        }
    }

    /// Merge at a control-flow join.
    ///
    /// Merging incompatible representations is a bug in the caller and aborts
    /// the compilation unit.
    pub fn meet(&self, other: &Stamp) -> CompileResult<Stamp> {
        match (self, other) {
            (Stamp::Void, Stamp::Void) => Ok(Stamp::Void),
            (Stamp::Integer(a), Stamp::Integer(b)) if a.bits() == b.bits() => Ok(Stamp::Integer(a.meet(b))),
            (Stamp::Object(a), Stamp::Object(b)) => Ok(Stamp::Object(a.meet(b))),
            (Stamp::Narrow(a), Stamp::Narrow(b)) if a.is_compatible(b) => Ok(Stamp::Narrow(a.meet_facts(b))),
            _ => Err(CompileError::IncompatibleStamps {
                left: self.to_string(),
                right: other.to_string(),
            }),
        }
    }

    /// The single value this stamp admits, if it is that precise.
    pub fn as_constant(&self) -> Option<Constant> {
        match self {
            Stamp::Void => None,
            Stamp::Integer(stamp) => stamp.as_constant(),
            Stamp::Object(stamp) => stamp.as_constant(),
            Stamp::Narrow(stamp) => stamp.as_constant(),
        }
    }

    /// Fold a load of a value with this stamp from a constant object.
    pub fn read_constant(
        &self,
        provider: &dyn MemoryAccessProvider,
        base: &Constant,
        displacement: i64,
    ) -> CompileResult<Option<Constant>> {
        match self {
            Stamp::Object(stamp) => stamp.read_constant(provider, base, displacement),
            Stamp::Narrow(stamp) => stamp.read_constant(provider, base, displacement),
            Stamp::Integer(_) => Err(CompileError::UnsupportedMemoryRead {
                representation: "primitive",
            }),
            Stamp::Void => Err(CompileError::UnsupportedMemoryRead {
                representation: "void",
            }),
        }
    }

    /// Fold a load of an element with this stamp from a constant array.
    pub fn read_array_element_constant(
        &self,
        reflection: &dyn ConstantReflectionProvider,
        array: &Constant,
        displacement: i64,
    ) -> Option<Constant> {
        match self {
            Stamp::Object(stamp) => stamp.read_array_element_constant(reflection, array, displacement),
            Stamp::Narrow(stamp) => stamp.read_array_element_constant(reflection, array, displacement),
            Stamp::Integer(_) | Stamp::Void => None,
        }
    }

    /// Whether `constant` can flow on an edge with this stamp.
    pub fn is_compatible_constant(&self, constant: &Constant) -> bool {
        match self {
            Stamp::Void => false,
            Stamp::Integer(stamp) => matches!(constant, Constant::Int { bits, .. } if *bits == stamp.bits()),
            Stamp::Object(stamp) => stamp.is_compatible_constant(constant),
            Stamp::Narrow(stamp) => stamp.is_compatible_constant(constant),
        }
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stamp::Void => f.write_str("void"),
            Stamp::Integer(stamp) => stamp.fmt(f),
            Stamp::Object(stamp) => stamp.fmt(f),
            Stamp::Narrow(stamp) => stamp.fmt(f),
        }
    }
}

impl From<IntegerStamp> for Stamp {
    fn from(stamp: IntegerStamp) -> Self {
        Stamp::Integer(stamp)
    }
}

impl From<ObjectStamp> for Stamp {
    fn from(stamp: ObjectStamp) -> Self {
        Stamp::Object(stamp)
    }
}

impl From<NarrowStamp> for Stamp {
    fn from(stamp: NarrowStamp) -> Self {
        Stamp::Narrow(stamp)
    }
}
