// This module defines error types for midtier using the thiserror crate. CompileError is
// the single error enum for the lowering infrastructure: unsupported operation widths,
// nodes that reach the division lowering without being one of its four kinds, meets of
// stamps with incompatible representations, memory reads a provider cannot perform,
// dangling node ids, compressed constants without an encoding, template instantiations
// with missing bindings and evaluations of a graph without enough arguments. Every variant is
// an internal invariant violation that aborts the current compilation unit; conditions
// of the compiled program itself (division by zero at run time) never show up here.
// CompileResult<T> is the convenience alias used throughout the crate.

//! Error types for midtier.
//!
//! Using thiserror for idiomatic error handling.

use thiserror::Error;

/// Main error type for graph lowering and stamp operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Unsupported {width}-bit {operation} operation")]
    UnsupportedWidth {
        operation: &'static str,
        width: u32,
    },

    #[error("Should not reach here: node {node} ({kind}) is not a division or remainder")]
    UnsupportedNode {
        node: u32,
        kind: String,
    },

    #[error("Cannot meet incompatible stamps {left} and {right}")]
    IncompatibleStamps {
        left: String,
        right: String,
    },

    #[error("Memory provider cannot read {representation} values")]
    UnsupportedMemoryRead {
        representation: &'static str,
    },

    #[error("Invalid or malformed node {node}")]
    InvalidNode {
        node: u32,
    },

    #[error("Template {template} has no binding for slot '{slot}'")]
    TemplateBinding {
        template: String,
        slot: &'static str,
    },

    #[error("Compressed constant {constant} has no encoding")]
    MissingEncoding {
        constant: String,
    },

    #[error("Evaluation needs argument {index} but only {provided} were provided")]
    MissingArgument {
        index: u32,
        provided: usize,
    },
}

impl CompileError {
    /// Whether the error reports a compiler bug rather than a property of the input.
    ///
    /// All current variants are internal: the compilation unit is discarded and
    /// execution continues in a lower tier.
    pub fn is_internal(&self) -> bool {
        true
    }
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CompileError::UnsupportedWidth {
            operation: "sdiv",
            width: 16,
        };
        assert_eq!(err.to_string(), "Unsupported 16-bit sdiv operation");

        let err = CompileError::UnsupportedNode {
            node: 7,
            kind: "add".to_string(),
        };
        assert!(err.to_string().contains("Should not reach here"));
        assert!(err.is_internal());
    }
}
