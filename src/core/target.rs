//! Target description consumed by the lowering passes.
//!
//! The lowering logic only needs two facts about the machine it compiles for:
//! the native integer width and whether the hardware divide instruction faults
//! on a zero divisor. x86-64 `div`/`idiv` raise `#DE`, which the runtime turns
//! into an implicit exception. AArch64 `sdiv`/`udiv` quietly produce 0, so the
//! compiler has to emit the check itself.

use std::fmt;

/// Environment variable overriding the compilation target.
pub const TARGET_ENV_VAR: &str = "MIDTIER_TARGET";

/// Supported target architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    AArch64,
}

impl Arch {
    /// Whether integer division by zero raises a hardware fault.
    pub const fn division_traps_on_zero(self) -> bool {
        match self {
            Arch::X86_64 => true,
            Arch::AArch64 => false,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::AArch64 => "aarch64",
        }
    }
}

/// Read-only description of the compilation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub arch: Arch,
    /// Native integer register width in bits.
    pub word_bits: u32,
}

impl Target {
    pub const fn new(arch: Arch, word_bits: u32) -> Self {
        Self { arch, word_bits }
    }

    pub const fn x86_64() -> Self {
        Self::new(Arch::X86_64, 64)
    }

    pub const fn aarch64() -> Self {
        Self::new(Arch::AArch64, 64)
    }

    /// Target matching the machine the compiler itself runs on.
    pub fn host() -> Self {
        if cfg!(target_arch = "aarch64") {
            Self::aarch64()
        } else {
            Self::x86_64()
        }
    }

    /// Parse an architecture name or target triple (`aarch64-unknown-linux-gnu`).
    pub fn parse(text: &str) -> Option<Self> {
        let arch = text.trim().split('-').next()?;
        match arch.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::x86_64()),
            "aarch64" | "arm64" => Some(Self::aarch64()),
            _ => None,
        }
    }

    /// Target named by `MIDTIER_TARGET`, or the host when unset or unrecognised.
    pub fn from_env() -> Self {
        match std::env::var(TARGET_ENV_VAR) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|| {
                log::warn!("Ignoring unrecognised {}={}", TARGET_ENV_VAR, value);
                Self::host()
            }),
            Err(_) => Self::host(),
        }
    }

    /// Integer widths the division lowering can handle on this target.
    pub fn supports_width(&self, bits: u32) -> bool {
        bits == 32 || bits == self.word_bits
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}-bit)", self.arch.name(), self.word_bits)
    }
}

/// Knobs for the lowering passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoweringOptions {
    /// Emit zero checks even when the hardware divide traps.
    pub force: bool,
}

impl LoweringOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(Target::parse("aarch64"), Some(Target::aarch64()));
        assert_eq!(Target::parse("arm64-apple-darwin"), Some(Target::aarch64()));
        assert_eq!(Target::parse("x86_64-unknown-linux-gnu"), Some(Target::x86_64()));
        assert_eq!(Target::parse("riscv64gc"), None);
    }

    #[test]
    fn test_division_trap_behavior() {
        assert!(Arch::X86_64.division_traps_on_zero());
        assert!(!Arch::AArch64.division_traps_on_zero());
    }

    #[test]
    fn test_supported_widths() {
        let target = Target::aarch64();
        assert!(target.supports_width(32));
        assert!(target.supports_width(64));
        assert!(!target.supports_width(16));

        let narrow = Target::new(Arch::AArch64, 32);
        assert!(!narrow.supports_width(64));
    }
}
