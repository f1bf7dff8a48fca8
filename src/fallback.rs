//! Requests to abandon optimized execution.
//!
//! Lowered code that detects a condition it cannot handle (a zero divisor)
//! embeds a fallback request. What the request does at run time, such as
//! reconstructing interpreter frames or invalidating the compiled code, belongs
//! to the runtime; the compiler only decides where the request goes and why.

use std::fmt;

/// Why compiled code gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FallbackReason {
    /// The divisor of an integer division or remainder was zero.
    DivisionByZero,
}

/// What the runtime should do with the compiled code after falling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackAction {
    /// Keep the code; the condition is rare and expected.
    None,
    /// Throw the code away and recompile with fresh profiling.
    InvalidateRecompile,
}

/// Opaque fallback request embedded in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FallbackRequest {
    pub reason: FallbackReason,
    pub action: FallbackAction,
}

impl fmt::Display for FallbackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}, {:?}", self.reason, self.action)
    }
}

/// Runtime-specific factory for fallback requests.
pub trait FallbackRequester: Send + Sync {
    fn request_fallback(&self, reason: FallbackReason) -> FallbackRequest;
}

/// Deoptimizes without invalidating the compiled code.
///
/// Division by zero throws in the interpreter and is not a sign that the
/// compiled code made a bad assumption, so recompiling would not help.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeoptimizingFallback;

impl FallbackRequester for DeoptimizingFallback {
    fn request_fallback(&self, reason: FallbackReason) -> FallbackRequest {
        FallbackRequest {
            reason,
            action: FallbackAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requester_keeps_code() {
        let request = DeoptimizingFallback.request_fallback(FallbackReason::DivisionByZero);
        assert_eq!(request.action, FallbackAction::None);
        assert_eq!(request.to_string(), "DivisionByZero, None");
    }
}
