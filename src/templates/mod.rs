// This module defines lowering templates: small, immutable graph fragments that encode
// the safe form of one operation at one bit width. A Template is pure data (a list of
// TemplateNodes whose inputs refer either to named argument slots or to earlier nodes of
// the same fragment) and is never attached to a live graph. Template::instantiate copies
// the fragment into a host graph with every slot bound to a live operand, allocating
// the per-call node mapping in the compilation session arena. The fallback request
// embedded by guard nodes is created at instantiation time through the runtime's
// FallbackRequester, so a cached template stays independent of any one runtime.
// Template construction lives in arith, caching in cache.

//! Lowering templates and their instantiation.

use std::fmt;

use bumpalo::collections::Vec as BumpVec;
use log::trace;

use crate::constant::Constant;
use crate::core::error::{CompileError, CompileResult};
use crate::core::session::CompilationSession;
use crate::fallback::{FallbackReason, FallbackRequester};
use crate::graph::{DivRemOp, Graph, NodeId, NodeKind};
use crate::stamp::Stamp;

pub mod arith;
pub mod cache;

pub use arith::build_div_rem_template;
pub use cache::TemplateCache;

/// Cache key: one template per operation and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub op: DivRemOp,
    pub width: u32,
}

impl TemplateKey {
    pub const fn new(op: DivRemOp, width: u32) -> Self {
        Self { op, width }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_i{}", self.op, self.width)
    }
}

/// Operation of a template node. Mirrors the graph kinds a template may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateOp {
    Constant(Constant),
    IntegerEquals,
    /// Guard whose request is obtained from the runtime on instantiation.
    Fallback(FallbackReason),
    SafeDivRem(DivRemOp),
}

/// Where a template node takes an input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateInput {
    /// Argument slot, by index into [`Template::slots`].
    Slot(usize),
    /// Earlier node of the same template.
    Node(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNode {
    pub op: TemplateOp,
    pub stamp: Stamp,
    pub inputs: Vec<TemplateInput>,
}

/// Immutable graph fragment with named argument slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    key: TemplateKey,
    slots: &'static [&'static str],
    nodes: Vec<TemplateNode>,
    result: usize,
}

impl Template {
    /// Assemble a template. Node inputs may only refer to earlier nodes.
    pub fn new(key: TemplateKey, slots: &'static [&'static str], nodes: Vec<TemplateNode>, result: usize) -> Self {
        debug_assert!(result < nodes.len());
        debug_assert!(nodes.iter().enumerate().all(|(idx, node)| {
            node.inputs.iter().all(|input| match input {
                TemplateInput::Slot(slot) => *slot < slots.len(),
                TemplateInput::Node(earlier) => *earlier < idx,
            })
        }));
        Self {
            key,
            slots,
            nodes,
            result,
        }
    }

    pub fn key(&self) -> TemplateKey {
        self.key
    }

    pub fn slots(&self) -> &'static [&'static str] {
        self.slots
    }

    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// Node producing the template's value.
    pub fn result(&self) -> &TemplateNode {
        &self.nodes[self.result]
    }

    /// Copy the fragment into `graph` and return the copy of the result node.
    ///
    /// Every slot must be bound in `args`. The template itself is not touched.
    pub fn instantiate(
        &self,
        graph: &mut Graph,
        args: &Arguments,
        fallback: &dyn FallbackRequester,
        session: &CompilationSession<'_>,
    ) -> CompileResult<NodeId> {
        let mut bound = BumpVec::with_capacity_in(self.slots.len(), session.arena());
        for &slot in self.slots {
            let node = args.get(slot).ok_or_else(|| CompileError::TemplateBinding {
                template: self.key.to_string(),
                slot,
            })?;
            bound.push(node);
        }

        let mut copies: BumpVec<'_, NodeId> = BumpVec::with_capacity_in(self.nodes.len(), session.arena());
        for node in &self.nodes {
            let inputs = node
                .inputs
                .iter()
                .map(|input| match input {
                    TemplateInput::Slot(slot) => bound[*slot],
                    TemplateInput::Node(earlier) => copies[*earlier],
                })
                .collect();
            let kind = match node.op {
                TemplateOp::Constant(constant) => NodeKind::Constant(constant),
                TemplateOp::IntegerEquals => NodeKind::IntegerEquals,
                TemplateOp::Fallback(reason) => NodeKind::Guard(fallback.request_fallback(reason)),
                TemplateOp::SafeDivRem(op) => NodeKind::SafeDivRem(op),
            };
            copies.push(graph.add_node(kind, node.stamp.clone(), inputs)?);
        }

        session.record_template_instantiated(copies.len());
        trace!(
            "instantiated template {} into {} ({} nodes)",
            self.key,
            graph.name(),
            copies.len()
        );
        Ok(copies[self.result])
    }
}

/// Slot bindings for one instantiation.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    bindings: Vec<(&'static str, NodeId)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing an earlier binding of the same slot.
    pub fn add(&mut self, name: &'static str, node: NodeId) -> &mut Self {
        match self.bindings.iter_mut().find(|(slot, _)| *slot == name) {
            Some(binding) => binding.1 = node,
            None => self.bindings.push((name, node)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.bindings
            .iter()
            .find(|(slot, _)| *slot == name)
            .map(|(_, node)| *node)
    }
}
