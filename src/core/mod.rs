// This module is the shared infrastructure hub of midtier. It groups the pieces every
// pass depends on regardless of what the pass rewrites: the CompilationSession (arena
// allocation for per-unit scratch data and lowering statistics), the CompileError enum
// that aborts a compilation unit, and the Target description that tells passes how the
// hardware behaves. Test helpers (arena-backed contexts and a simulated heap that
// implements the memory-read capabilities) live here as well and are compiled for
// tests only.

//! Core infrastructure.
//!
//! # Key Components
//!
//! ## Session Management (`session`)
//! - Arena-based scratch allocation using `bumpalo`
//! - Lowering statistics
//!
//! ## Errors (`error`)
//! - `CompileError` / `CompileResult`, built on `thiserror`
//!
//! ## Target Description (`target`)
//! - Architecture, native word width, division fault behavior
//! - `MIDTIER_TARGET` override

pub mod error;
pub mod session;
pub mod target;
pub mod test_utils;

pub use session::{ArenaMap, CompilationSession, SessionStats};

pub use error::{CompileError, CompileResult};

pub use target::{Arch, LoweringOptions, Target, TARGET_ENV_VAR};
