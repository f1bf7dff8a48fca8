//! Integer stamps: bit width plus a signed value range.

use std::fmt;

use crate::constant::{sign_extend, Constant};

/// Possible values of an integer edge, as a signed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerStamp {
    bits: u32,
    lower: i64,
    upper: i64,
}

impl IntegerStamp {
    /// Stamp for `[lower, upper]`; bounds are normalised to `bits`.
    ///
    /// Any width is representable. Widths the target cannot compute with are
    /// rejected by the passes that consume the stamp, not here.
    pub fn new(bits: u32, lower: i64, upper: i64) -> Self {
        let lower = sign_extend(lower, bits);
        let upper = sign_extend(upper, bits);
        debug_assert!(lower <= upper, "empty integer range");
        Self { bits, lower, upper }
    }

    /// Any value of the given width.
    pub fn unrestricted(bits: u32) -> Self {
        Self::new(bits, min_value(bits), max_value(bits))
    }

    /// Exactly one value.
    pub fn constant(bits: u32, value: i64) -> Self {
        Self::new(bits, value, value)
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn lower(&self) -> i64 {
        self.lower
    }

    pub fn upper(&self) -> i64 {
        self.upper
    }

    pub fn contains(&self, value: i64) -> bool {
        let value = sign_extend(value, self.bits);
        self.lower <= value && value <= self.upper
    }

    pub fn may_be_zero(&self) -> bool {
        self.contains(0)
    }

    pub fn as_constant(&self) -> Option<Constant> {
        (self.lower == self.upper).then(|| Constant::int(self.bits, self.lower))
    }

    /// Union of both ranges. Widths must match.
    pub(crate) fn meet(&self, other: &IntegerStamp) -> IntegerStamp {
        debug_assert_eq!(self.bits, other.bits);
        IntegerStamp {
            bits: self.bits,
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }
}

impl fmt::Display for IntegerStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lower == self.upper {
            write!(f, "i{} [{}]", self.bits, self.lower)
        } else if self.lower == min_value(self.bits) && self.upper == max_value(self.bits) {
            write!(f, "i{}", self.bits)
        } else {
            write!(f, "i{} [{} - {}]", self.bits, self.lower, self.upper)
        }
    }
}

// A zero-width integer holds only 0; widths past 64 saturate.
fn min_value(bits: u32) -> i64 {
    match bits {
        0 => 0,
        1..=63 => -(1i64 << (bits - 1)),
        _ => i64::MIN,
    }
}

fn max_value(bits: u32) -> i64 {
    match bits {
        0 => 0,
        1..=63 => (1i64 << (bits - 1)) - 1,
        _ => i64::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_bounds() {
        let stamp = IntegerStamp::unrestricted(32);
        assert_eq!(stamp.lower(), i32::MIN as i64);
        assert_eq!(stamp.upper(), i32::MAX as i64);
        assert!(stamp.may_be_zero());
        assert_eq!(stamp.to_string(), "i32");
    }

    #[test]
    fn test_constant_stamp() {
        let stamp = IntegerStamp::constant(64, 7);
        assert!(!stamp.may_be_zero());
        assert_eq!(stamp.as_constant(), Some(Constant::int(64, 7)));
        assert_eq!(stamp.to_string(), "i64 [7]");
    }

    #[test]
    fn test_meet_is_range_union() {
        let a = IntegerStamp::new(32, 1, 5);
        let b = IntegerStamp::new(32, 10, 20);
        let merged = a.meet(&b);
        assert_eq!((merged.lower(), merged.upper()), (1, 20));
        assert!(!merged.may_be_zero());
        assert_eq!(merged.to_string(), "i32 [1 - 20]");
    }

    #[test]
    fn test_degenerate_widths() {
        let empty = IntegerStamp::unrestricted(0);
        assert_eq!((empty.lower(), empty.upper()), (0, 0));
        assert_eq!(empty.to_string(), "i0 [0]");

        let wide = IntegerStamp::unrestricted(128);
        assert_eq!((wide.lower(), wide.upper()), (i64::MIN, i64::MAX));
        assert!(wide.may_be_zero());
        assert_eq!(wide.to_string(), "i128");
    }
}
