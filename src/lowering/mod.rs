// This module implements the division lowering pass. Integer division and remainder
// with a zero divisor are undefined at the machine level: x86-64 raises a hardware fault
// that the runtime translates into an exception, while AArch64 silently produces zero.
// On targets that do not fault, each unchecked DivRem node is replaced by an instance
// of the matching safe template (zero check, fallback guard, SafeDivRem). SafeDivRem is
// a distinct node kind, so the pass can be run any number of times and never rewrites
// its own output. Templates come from the shared TemplateCache; within one run they
// are additionally memoised in a session-arena map to avoid repeated cache lookups.

//! Division and remainder lowering.

use std::sync::Arc;

use log::debug;

use crate::core::error::{CompileError, CompileResult};
use crate::core::session::{ArenaMap, CompilationSession};
use crate::core::target::{LoweringOptions, Target};
use crate::fallback::FallbackRequester;
use crate::graph::{Graph, NodeId, NodeKind, UnsafeDivRem};
use crate::templates::{Arguments, Template, TemplateCache, TemplateKey};

/// What [`DivRemLowering::lower`] did with a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoweringOutcome {
    /// Replaced; carries the new safe node.
    Lowered(NodeId),
    /// The node was lowered before.
    AlreadySafe,
    /// The target faults on a zero divisor by itself.
    NotRequired,
}

/// Rewrites unchecked division nodes into guarded safe nodes.
pub struct DivRemLowering<'a> {
    target: Target,
    options: LoweringOptions,
    templates: &'a TemplateCache,
    fallback: &'a dyn FallbackRequester,
}

impl<'a> DivRemLowering<'a> {
    pub fn new(target: Target, templates: &'a TemplateCache, fallback: &'a dyn FallbackRequester) -> Self {
        Self {
            target,
            options: LoweringOptions::default(),
            templates,
            fallback,
        }
    }

    pub fn with_options(mut self, options: LoweringOptions) -> Self {
        self.options = options;
        self
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Whether unchecked divisions must be rewritten for this target.
    pub fn is_required(&self) -> bool {
        self.options.force || !self.target.arch.division_traps_on_zero()
    }

    /// Lower a single node.
    ///
    /// Fails for nodes that are not a division or remainder, and for widths
    /// other than 32 bits and the target word.
    pub fn lower(
        &self,
        graph: &mut Graph,
        node: NodeId,
        session: &CompilationSession<'_>,
    ) -> CompileResult<LoweringOutcome> {
        let mut memo = session.scratch_map();
        self.lower_node(graph, node, session, &mut memo)
    }

    /// Lower every unchecked division in `graph`; returns the number rewritten.
    pub fn run(&self, graph: &mut Graph, session: &CompilationSession<'_>) -> CompileResult<usize> {
        session.set_current_unit(graph.name());
        let mut memo = session.scratch_map();
        let mut lowered = 0;

        for node in graph.node_ids() {
            if !matches!(graph.kind(node)?, NodeKind::DivRem(_) | NodeKind::SafeDivRem(_)) {
                continue;
            }
            if let LoweringOutcome::Lowered(_) = self.lower_node(graph, node, session, &mut memo)? {
                lowered += 1;
            }
        }

        debug!("lowered {} division(s) in {}", lowered, graph.name());
        Ok(lowered)
    }

    fn lower_node<'arena>(
        &self,
        graph: &mut Graph,
        node: NodeId,
        session: &CompilationSession<'arena>,
        memo: &mut ArenaMap<'arena, TemplateKey, Arc<Template>>,
    ) -> CompileResult<LoweringOutcome> {
        let div = match graph.kind(node)? {
            NodeKind::SafeDivRem(op) => {
                debug!("{} ({}) is already safe", node, op);
                session.record_node_skipped();
                return Ok(LoweringOutcome::AlreadySafe);
            }
            NodeKind::DivRem(_) => {
                UnsafeDivRem::from_graph(graph, node).ok_or(CompileError::InvalidNode { node: node.0 })?
            }
            other => {
                return Err(CompileError::UnsupportedNode {
                    node: node.0,
                    kind: other.name(),
                })
            }
        };

        if !self.is_required() {
            debug!("{} ({}) left to the {} fault handler", node, div.op, self.target.arch.name());
            session.record_node_skipped();
            return Ok(LoweringOutcome::NotRequired);
        }

        let width = graph.stamp(node)?.bits().unwrap_or(0);
        if !self.target.supports_width(width) {
            return Err(CompileError::UnsupportedWidth {
                operation: div.op.name(),
                width,
            });
        }

        let key = TemplateKey::new(div.op, width);
        let template = Arc::clone(memo.entry(key).or_insert_with(|| self.templates.get(key)));

        let mut args = Arguments::new();
        args.add("x", div.x).add("y", div.y);
        let replacement = template.instantiate(graph, &args, self.fallback, session)?;
        graph.replace_at_usages_and_delete(node, replacement)?;

        session.record_node_lowered(div.op.name());
        debug!("lowered {} ({}) to {}", node, key, replacement);
        Ok(LoweringOutcome::Lowered(replacement))
    }
}
