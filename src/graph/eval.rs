//! Reference interpreter for graphs.
//!
//! Executes a graph the way the target hardware would, which lets tests check
//! that a lowering preserves behaviour: an unchecked divide by zero faults on
//! x86-64 and yields 0 on AArch64, while a lowered divide falls back before the
//! divide ever runs.

use std::collections::HashMap;

use log::trace;

use super::{DivRemOp, Graph, NodeId, NodeKind};
use crate::constant::{sign_extend, Constant};
use crate::core::error::{CompileError, CompileResult};
use crate::core::target::Target;
use crate::fallback::FallbackReason;
use crate::stamp::IntegerStamp;

/// Result of running a graph up to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalOutcome {
    /// Integer result, sign-extended to 64 bits.
    Value(i64),
    /// A guard fired; execution continues in a lower tier.
    Fallback(FallbackReason),
    /// The hardware raised an arithmetic fault.
    Trap,
}

/// Memoising interpreter bound to one target and argument list.
pub struct Evaluator<'g> {
    graph: &'g Graph,
    target: Target,
    args: &'g [i64],
    values: HashMap<NodeId, EvalOutcome>,
}

impl<'g> Evaluator<'g> {
    pub fn new(graph: &'g Graph, target: Target, args: &'g [i64]) -> Self {
        Self {
            graph,
            target,
            args,
            values: HashMap::new(),
        }
    }

    pub fn eval(&mut self, node: NodeId) -> CompileResult<EvalOutcome> {
        if let Some(outcome) = self.values.get(&node) {
            return Ok(*outcome);
        }
        let outcome = self.compute(node)?;
        trace!("eval {} -> {:?}", node, outcome);
        self.values.insert(node, outcome);
        Ok(outcome)
    }

    fn compute(&mut self, node: NodeId) -> CompileResult<EvalOutcome> {
        let graph = self.graph;
        let n = graph.node(node)?;
        let bits = n.stamp.bits().unwrap_or(self.target.word_bits);

        match (&n.kind, n.inputs.as_slice()) {
            (NodeKind::Parameter(index), []) => {
                let value = self.args.get(*index as usize).ok_or(CompileError::MissingArgument {
                    index: *index,
                    provided: self.args.len(),
                })?;
                Ok(EvalOutcome::Value(sign_extend(*value, bits)))
            }
            (NodeKind::Constant(constant), []) => Ok(EvalOutcome::Value(constant_value(constant))),
            (NodeKind::IntegerEquals, &[x, y]) => {
                let (x, y) = match self.operands(x, y)? {
                    Ok(pair) => pair,
                    Err(stop) => return Ok(stop),
                };
                Ok(EvalOutcome::Value((x == y) as i64))
            }
            (NodeKind::Guard(request), &[condition]) => match self.eval(condition)? {
                EvalOutcome::Value(0) => Ok(EvalOutcome::Value(0)),
                EvalOutcome::Value(_) => Ok(EvalOutcome::Fallback(request.reason)),
                stop => Ok(stop),
            },
            (NodeKind::DivRem(op), &[x, y]) => {
                let (x, y) = match self.operands(x, y)? {
                    Ok(pair) => pair,
                    Err(stop) => return Ok(stop),
                };
                Ok(self.hardware_div_rem(*op, bits, x, y))
            }
            (NodeKind::SafeDivRem(op), &[x, y, guard]) => {
                let op = *op;
                // The guard dominates the divide.
                if let stop @ (EvalOutcome::Fallback(_) | EvalOutcome::Trap) = self.eval(guard)? {
                    return Ok(stop);
                }
                let (x, y) = match self.operands(x, y)? {
                    Ok(pair) => pair,
                    Err(stop) => return Ok(stop),
                };
                Ok(self.hardware_div_rem(op, bits, x, y))
            }
            (NodeKind::Return, &[value]) => self.eval(value),
            // Wrong number of inputs for the kind.
            _ => Err(CompileError::InvalidNode { node: node.0 }),
        }
    }

    /// Evaluate two inputs; a non-value outcome stops evaluation.
    fn operands(&mut self, x: NodeId, y: NodeId) -> CompileResult<Result<(i64, i64), EvalOutcome>> {
        let x = match self.eval(x)? {
            EvalOutcome::Value(v) => v,
            stop => return Ok(Err(stop)),
        };
        let y = match self.eval(y)? {
            EvalOutcome::Value(v) => v,
            stop => return Ok(Err(stop)),
        };
        Ok(Ok((x, y)))
    }

    fn hardware_div_rem(&self, op: DivRemOp, bits: u32, x: i64, y: i64) -> EvalOutcome {
        let traps = self.target.arch.division_traps_on_zero();
        if sign_extend(y, bits) == 0 {
            return if traps { EvalOutcome::Trap } else { EvalOutcome::Value(0) };
        }
        // idiv faults on MIN / -1 as well; AArch64 wraps.
        let min = IntegerStamp::unrestricted(bits).lower();
        if traps && op.is_signed() && sign_extend(x, bits) == min && sign_extend(y, bits) == -1 {
            return EvalOutcome::Trap;
        }
        match op.fold(bits, x, y) {
            Some(value) => EvalOutcome::Value(value),
            None => EvalOutcome::Trap,
        }
    }
}

fn constant_value(constant: &Constant) -> i64 {
    match constant {
        Constant::Int { value, .. } => *value,
        Constant::Null | Constant::CompressedNull => 0,
        Constant::Object(obj) => obj.address as i64,
    }
}

/// Run `graph` up to `node` with the given arguments.
pub fn evaluate(graph: &Graph, node: NodeId, target: Target, args: &[i64]) -> CompileResult<EvalOutcome> {
    Evaluator::new(graph, target, args).eval(node)
}
