//! Operation graph.
//!
//! A deliberately small data-flow graph: nodes live in a vector indexed by
//! [`NodeId`], each carrying a [`NodeKind`], a [`Stamp`] and an ordered list of
//! inputs. Deleted nodes leave a hole so ids stay stable while a pass rewrites
//! the graph.
//!
//! Division and remainder appear in two variants. [`NodeKind::DivRem`] is the
//! unchecked operation produced by graph construction; [`NodeKind::SafeDivRem`]
//! is the primitive emitted by the lowering, whose divisor is known to be
//! non-zero because it depends on a zero-check guard. The variant is part of
//! the node's identity, so a lowered node can never be mistaken for one that
//! still needs lowering.

use std::fmt;

use crate::compress::CompressEncoding;
use crate::constant::{zero_extend, Constant};
use crate::core::error::{CompileError, CompileResult};
use crate::fallback::FallbackRequest;
use crate::stamp::{IntegerStamp, Stamp};

pub mod eval;

pub use eval::{EvalOutcome, Evaluator};

/// Stable index of a node inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Integer division-like operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DivRemOp {
    SignedDiv,
    SignedRem,
    UnsignedDiv,
    UnsignedRem,
}

impl DivRemOp {
    pub const ALL: [DivRemOp; 4] = [
        DivRemOp::SignedDiv,
        DivRemOp::SignedRem,
        DivRemOp::UnsignedDiv,
        DivRemOp::UnsignedRem,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            DivRemOp::SignedDiv => "sdiv",
            DivRemOp::SignedRem => "srem",
            DivRemOp::UnsignedDiv => "udiv",
            DivRemOp::UnsignedRem => "urem",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, DivRemOp::SignedDiv | DivRemOp::SignedRem)
    }

    /// Fold `x op y` at width `bits`; `None` for a zero divisor.
    ///
    /// Signed overflow (`MIN / -1`) wraps. Unsigned operations read both
    /// operands zero-extended; the result is stored sign-extended like every
    /// integer value in the graph.
    pub fn fold(self, bits: u32, x: i64, y: i64) -> Option<i64> {
        let value = match (bits, self) {
            (32, DivRemOp::SignedDiv) => (x as i32).checked_div(y as i32).or_else(|| wrap32(y))? as i64,
            (32, DivRemOp::SignedRem) => (x as i32).checked_rem(y as i32).or_else(|| zero_if_minus_one32(y))? as i64,
            (32, DivRemOp::UnsignedDiv) => (x as u32).checked_div(y as u32)? as i32 as i64,
            (32, DivRemOp::UnsignedRem) => (x as u32).checked_rem(y as u32)? as i32 as i64,
            (_, DivRemOp::SignedDiv) => x.checked_div(y).or_else(|| (y == -1).then_some(i64::MIN))?,
            (_, DivRemOp::SignedRem) => x.checked_rem(y).or_else(|| (y == -1).then_some(0))?,
            (_, DivRemOp::UnsignedDiv) => zero_extend(x, bits).checked_div(zero_extend(y, bits))? as i64,
            (_, DivRemOp::UnsignedRem) => zero_extend(x, bits).checked_rem(zero_extend(y, bits))? as i64,
        };
        Some(value)
    }
}

// `checked_div` also fails on MIN / -1; only a zero divisor is undefined.
fn wrap32(y: i64) -> Option<i32> {
    (y as i32 == -1).then_some(i32::MIN)
}

fn zero_if_minus_one32(y: i64) -> Option<i32> {
    (y as i32 == -1).then_some(0)
}

impl fmt::Display for DivRemOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operation performed by a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Incoming argument of the compilation unit.
    Parameter(u32),
    Constant(Constant),
    /// 1 if both inputs are equal, else 0. Inputs: `[x, y]`.
    IntegerEquals,
    /// Requests fallback when its condition is non-zero. Inputs: `[condition]`.
    Guard(FallbackRequest),
    /// Unchecked division or remainder. Inputs: `[x, y]`.
    DivRem(DivRemOp),
    /// Division or remainder behind a zero-check. Inputs: `[x, y, guard]`.
    SafeDivRem(DivRemOp),
    /// Result of the unit. Inputs: `[value]`.
    Return,
}

impl NodeKind {
    pub fn name(&self) -> String {
        match self {
            NodeKind::Parameter(index) => format!("param({})", index),
            NodeKind::Constant(constant) => format!("const {}", constant),
            NodeKind::IntegerEquals => "eq".to_string(),
            NodeKind::Guard(request) => format!("guard({})", request),
            NodeKind::DivRem(op) => op.name().to_string(),
            NodeKind::SafeDivRem(op) => format!("safe {}", op),
            NodeKind::Return => "return".to_string(),
        }
    }
}

/// A node and its edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub stamp: Stamp,
    pub inputs: Vec<NodeId>,
}

/// Read-only view of a division node that still needs its zero check.
///
/// Only constructible from a [`NodeKind::DivRem`] node, so code taking an
/// `UnsafeDivRem` cannot be handed an already lowered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsafeDivRem {
    pub node: NodeId,
    pub op: DivRemOp,
    pub x: NodeId,
    pub y: NodeId,
}

impl UnsafeDivRem {
    pub fn from_graph(graph: &Graph, node: NodeId) -> Option<Self> {
        let n = graph.node(node).ok()?;
        match (&n.kind, n.inputs.as_slice()) {
            (NodeKind::DivRem(op), [x, y]) => Some(Self {
                node,
                op: *op,
                x: *x,
                y: *y,
            }),
            _ => None,
        }
    }
}

/// Mutable graph of one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    name: String,
    nodes: Vec<Option<Node>>,
}

impl Graph {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a node; inputs must already exist.
    pub fn add_node(&mut self, kind: NodeKind, stamp: Stamp, inputs: Vec<NodeId>) -> CompileResult<NodeId> {
        for input in &inputs {
            self.node(*input)?;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node { kind, stamp, inputs }));
        Ok(id)
    }

    pub fn add_parameter(&mut self, index: u32, stamp: Stamp) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node {
            kind: NodeKind::Parameter(index),
            stamp,
            inputs: Vec::new(),
        }));
        id
    }

    /// Constant node. Compressed constants need the encoding of their representation.
    pub fn add_constant(&mut self, constant: Constant, encoding: Option<CompressEncoding>) -> CompileResult<NodeId> {
        let stamp = Stamp::for_constant(&constant, encoding)?;
        self.add_node(NodeKind::Constant(constant), stamp, Vec::new())
    }

    /// Unchecked `x op y`; the result has the width of `x`.
    pub fn add_div_rem(&mut self, op: DivRemOp, x: NodeId, y: NodeId) -> CompileResult<NodeId> {
        let bits = self.stamp(x)?.bits().ok_or(CompileError::UnsupportedWidth {
            operation: op.name(),
            width: 0,
        })?;
        self.add_node(
            NodeKind::DivRem(op),
            Stamp::Integer(IntegerStamp::unrestricted(bits)),
            vec![x, y],
        )
    }

    pub fn add_return(&mut self, value: NodeId) -> CompileResult<NodeId> {
        self.add_node(NodeKind::Return, Stamp::Void, vec![value])
    }

    pub fn node(&self, id: NodeId) -> CompileResult<&Node> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(CompileError::InvalidNode { node: id.0 })
    }

    pub fn kind(&self, id: NodeId) -> CompileResult<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    pub fn stamp(&self, id: NodeId) -> CompileResult<&Stamp> {
        self.node(id).map(|node| &node.stamp)
    }

    pub fn inputs(&self, id: NodeId) -> CompileResult<&[NodeId]> {
        self.node(id).map(|node| node.inputs.as_slice())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Ids of all live nodes in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| node.as_ref().map(|node| (NodeId(idx as u32), node)))
    }

    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    /// Nodes that use `id` as an input.
    pub fn usages(&self, id: NodeId) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.inputs.contains(&id))
            .map(|(user, _)| user)
            .collect()
    }

    /// Redirect every use of `old` to `replacement`, then delete `old`.
    pub fn replace_at_usages_and_delete(&mut self, old: NodeId, replacement: NodeId) -> CompileResult<()> {
        self.node(old)?;
        self.node(replacement)?;
        for node in self.nodes.iter_mut().flatten() {
            for input in node.inputs.iter_mut() {
                if *input == old {
                    *input = replacement;
                }
            }
        }
        self.nodes[old.index()] = None;
        Ok(())
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph {}", self.name)?;
        for (id, node) in self.iter() {
            write!(f, "  {} = {}", id, node.kind.name())?;
            if !node.inputs.is_empty() {
                let inputs: Vec<String> = node.inputs.iter().map(ToString::to_string).collect();
                write!(f, " {}", inputs.join(", "))?;
            }
            writeln!(f, " : {}", node.stamp)?;
        }
        Ok(())
    }
}
