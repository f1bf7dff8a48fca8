//! midtier - mid-tier JIT compiler infrastructure.
//!
//! Two pieces that sit between graph construction and code generation:
//! a stamp lattice that tracks reference values in full-width and compressed
//! representation, and a lowering pass that puts an explicit zero check in
//! front of every integer division on targets whose divide instruction does
//! not fault.
//!
//! # Primary Usage
//!
//! ```
//! use bumpalo::Bump;
//! use midtier::core::{CompilationSession, Target};
//! use midtier::fallback::DeoptimizingFallback;
//! use midtier::graph::{DivRemOp, Graph};
//! use midtier::lowering::DivRemLowering;
//! use midtier::stamp::Stamp;
//! use midtier::templates::TemplateCache;
//!
//! let arena = Bump::new();
//! let session = CompilationSession::new(&arena);
//!
//! let mut graph = Graph::new("div");
//! let x = graph.add_parameter(0, Stamp::int(32));
//! let y = graph.add_parameter(1, Stamp::int(32));
//! let div = graph.add_div_rem(DivRemOp::SignedDiv, x, y)?;
//! graph.add_return(div)?;
//!
//! let lowering = DivRemLowering::new(Target::aarch64(), TemplateCache::shared(), &DeoptimizingFallback);
//! assert_eq!(lowering.run(&mut graph, &session)?, 1);
//! # Ok::<(), midtier::CompileError>(())
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Shared infrastructure (session, errors, target)
//! - [`compress`] - Compressed reference encoding
//! - [`stamp`] - Stamp lattice
//! - [`graph`] - Operation graph and reference interpreter
//! - [`templates`] - Safe-operation templates and their cache
//! - [`lowering`] - Division lowering pass

pub mod core;

pub mod compress;
pub mod constant;
pub mod fallback;
pub mod graph;
pub mod lowering;
pub mod memory;
pub mod stamp;
pub mod templates;

pub use crate::core::{CompilationSession, CompileError, CompileResult, SessionStats, Target};
pub use compress::CompressEncoding;
pub use constant::Constant;
pub use lowering::{DivRemLowering, LoweringOutcome};
pub use stamp::Stamp;
pub use templates::TemplateCache;
