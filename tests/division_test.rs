//! Test lowering of integer division and remainder operations.
//!
//! This test verifies that unchecked divisions are replaced by zero-checked
//! safe nodes, that the lowered graphs compute the same results, and that the
//! pass never touches its own output.

use bumpalo::Bump;
use midtier::core::{CompilationSession, CompileError, LoweringOptions, Target};
use midtier::fallback::{DeoptimizingFallback, FallbackReason};
use midtier::graph::eval::{evaluate, EvalOutcome};
use midtier::graph::{DivRemOp, Graph, NodeId, NodeKind};
use midtier::lowering::{DivRemLowering, LoweringOutcome};
use midtier::stamp::Stamp;
use midtier::templates::TemplateCache;
use midtier::Constant;

/// Create a test graph with a division of two parameters.
fn create_param_test(op: DivRemOp, bits: u32) -> (Graph, NodeId, NodeId) {
    // Graph: iN test(iN a, iN b)
    // {
    //     return a op b;
    // }
    let mut graph = Graph::new(&format!("test_{}{}", op, bits));
    let a = graph.add_parameter(0, Stamp::int(bits));
    let b = graph.add_parameter(1, Stamp::int(bits));
    let div = graph.add_div_rem(op, a, b).unwrap();
    let ret = graph.add_return(div).unwrap();
    (graph, div, ret)
}

/// Create a test graph with a division of two constants.
fn create_const_test(op: DivRemOp, bits: u32, a: i64, b: i64) -> (Graph, NodeId) {
    let mut graph = Graph::new("const_test");
    let a = graph.add_constant(Constant::int(bits, a), None).unwrap();
    let b = graph.add_constant(Constant::int(bits, b), None).unwrap();
    let div = graph.add_div_rem(op, a, b).unwrap();
    let ret = graph.add_return(div).unwrap();
    (graph, ret)
}

fn lower_all(graph: &mut Graph, target: Target, cache: &TemplateCache) -> usize {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    DivRemLowering::new(target, cache, &DeoptimizingFallback)
        .run(graph, &session)
        .unwrap()
}

#[test]
fn test_zero_check_guards_divide() {
    let cache = TemplateCache::new();
    let (mut graph, div, ret) = create_param_test(DivRemOp::SignedDiv, 32);
    assert!(graph.stamp(div).unwrap().as_integer().unwrap().may_be_zero());

    assert_eq!(lower_all(&mut graph, Target::aarch64(), &cache), 1);

    // return -> safe sdiv(a, b, guard) ; guard -> eq(b, 0)
    let safe = graph.inputs(ret).unwrap()[0];
    assert_eq!(graph.kind(safe).unwrap(), &NodeKind::SafeDivRem(DivRemOp::SignedDiv));
    let guard = graph.inputs(safe).unwrap()[2];
    let NodeKind::Guard(request) = graph.kind(guard).unwrap() else {
        panic!("safe divide is not guarded:\n{}", graph);
    };
    assert_eq!(request.reason, FallbackReason::DivisionByZero);

    let condition = graph.inputs(guard).unwrap()[0];
    assert_eq!(graph.kind(condition).unwrap(), &NodeKind::IntegerEquals);
    let compared = graph.inputs(condition).unwrap();
    assert_eq!(compared[0], graph.inputs(safe).unwrap()[1]);
    assert_eq!(graph.kind(compared[1]).unwrap(), &NodeKind::Constant(Constant::int(32, 0)));

    assert_eq!(
        evaluate(&graph, ret, Target::aarch64(), &[10, 0]).unwrap(),
        EvalOutcome::Fallback(FallbackReason::DivisionByZero)
    );
    assert_eq!(
        evaluate(&graph, ret, Target::aarch64(), &[10, -3]).unwrap(),
        EvalOutcome::Value(-3)
    );
}

#[test]
fn test_unsigned_remainder_64() {
    let cache = TemplateCache::new();
    let (mut graph, ret) = create_const_test(DivRemOp::UnsignedRem, 64, 23, 7);
    lower_all(&mut graph, Target::aarch64(), &cache);
    assert_eq!(evaluate(&graph, ret, Target::aarch64(), &[]).unwrap(), EvalOutcome::Value(2));

    // -9 as u64 is 2^64 - 9, a multiple of 7; the signed reading would give -2.
    let (mut graph, ret) = create_const_test(DivRemOp::UnsignedRem, 64, -9, 7);
    lower_all(&mut graph, Target::aarch64(), &cache);
    assert_eq!(evaluate(&graph, ret, Target::aarch64(), &[]).unwrap(), EvalOutcome::Value(0));

    let (mut graph, ret) = create_const_test(DivRemOp::SignedRem, 64, -9, 7);
    lower_all(&mut graph, Target::aarch64(), &cache);
    assert_eq!(evaluate(&graph, ret, Target::aarch64(), &[]).unwrap(), EvalOutcome::Value(-2));
}

#[test]
fn test_unsigned_division_32() {
    let cache = TemplateCache::new();
    let (mut graph, _, ret) = create_param_test(DivRemOp::UnsignedDiv, 32);
    lower_all(&mut graph, Target::aarch64(), &cache);

    // 0xFFFFFFFE / 2 = 0x7FFFFFFF
    assert_eq!(
        evaluate(&graph, ret, Target::aarch64(), &[-2, 2]).unwrap(),
        EvalOutcome::Value(0x7FFF_FFFF)
    );
}

#[test]
fn test_lowering_preserves_results() {
    let cache = TemplateCache::new();
    let operands: [(i64, i64); 6] = [(7, 2), (-7, 2), (7, -2), (i32::MIN as i64, 3), (100, 1), (0, 5)];

    for op in DivRemOp::ALL {
        for bits in [32, 64] {
            let (original, _, original_ret) = create_param_test(op, bits);
            let mut lowered = original.clone();
            assert_eq!(lower_all(&mut lowered, Target::aarch64(), &cache), 1);

            for (a, b) in operands {
                let expected = evaluate(&original, original_ret, Target::aarch64(), &[a, b]).unwrap();
                let actual = evaluate(&lowered, original_ret, Target::aarch64(), &[a, b]).unwrap();
                assert_eq!(actual, expected, "{} i{} ({}, {})", op, bits, a, b);
            }

            // Unlowered code quietly returns 0; lowered code falls back.
            assert_eq!(
                evaluate(&original, original_ret, Target::aarch64(), &[1, 0]).unwrap(),
                EvalOutcome::Value(0)
            );
            assert_eq!(
                evaluate(&lowered, original_ret, Target::aarch64(), &[1, 0]).unwrap(),
                EvalOutcome::Fallback(FallbackReason::DivisionByZero)
            );
        }
    }
    assert_eq!(cache.len(), 8);
}

#[test]
fn test_already_safe_node_is_skipped() {
    let (mut graph, _, ret) = create_param_test(DivRemOp::SignedRem, 64);
    lower_all(&mut graph, Target::aarch64(), &TemplateCache::new());
    let safe = graph.inputs(ret).unwrap()[0];
    let before = graph.to_string();

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let fresh = TemplateCache::new();
    let lowering = DivRemLowering::new(Target::aarch64(), &fresh, &DeoptimizingFallback);

    assert_eq!(
        lowering.lower(&mut graph, safe, &session).unwrap(),
        LoweringOutcome::AlreadySafe
    );
    assert_eq!(graph.to_string(), before);
    assert!(fresh.is_empty());
    assert_eq!(fresh.builds(), 0);
    assert_eq!(session.stats().nodes_skipped, 1);
    assert_eq!(session.stats().templates_instantiated, 0);
}

#[test]
fn test_lowering_is_idempotent() {
    let cache = TemplateCache::new();
    let (mut graph, _, _) = create_param_test(DivRemOp::UnsignedDiv, 64);

    assert_eq!(lower_all(&mut graph, Target::aarch64(), &cache), 1);
    let once = graph.to_string();
    let live = graph.live_count();

    assert_eq!(lower_all(&mut graph, Target::aarch64(), &cache), 0);
    assert_eq!(graph.to_string(), once);
    assert_eq!(graph.live_count(), live);
}

#[test]
fn test_trapping_target_needs_no_lowering() {
    let cache = TemplateCache::new();
    let (mut graph, div, ret) = create_param_test(DivRemOp::SignedDiv, 32);

    assert_eq!(lower_all(&mut graph, Target::x86_64(), &cache), 0);
    assert!(graph.contains(div));
    assert!(cache.is_empty());
    assert_eq!(evaluate(&graph, ret, Target::x86_64(), &[1, 0]).unwrap(), EvalOutcome::Trap);

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let forced = DivRemLowering::new(Target::x86_64(), &cache, &DeoptimizingFallback)
        .with_options(LoweringOptions::forced());
    assert_eq!(forced.run(&mut graph, &session).unwrap(), 1);
    assert_eq!(
        evaluate(&graph, ret, Target::x86_64(), &[1, 0]).unwrap(),
        EvalOutcome::Fallback(FallbackReason::DivisionByZero)
    );
}

#[test]
fn test_unsupported_width() {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let cache = TemplateCache::new();
    let lowering = DivRemLowering::new(Target::aarch64(), &cache, &DeoptimizingFallback);
    let (mut graph, div, _) = create_param_test(DivRemOp::SignedDiv, 16);

    let err = lowering.lower(&mut graph, div, &session).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnsupportedWidth {
            operation: "sdiv",
            width: 16,
        }
    );
    assert!(graph.contains(div));
    assert!(cache.is_empty());

    for width in [0, 1, 128] {
        let (mut graph, div, _) = create_param_test(DivRemOp::UnsignedRem, width);
        let err = lowering.lower(&mut graph, div, &session).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnsupportedWidth {
                operation: "urem",
                width,
            }
        );
    }
}

#[test]
fn test_unsupported_node_kind() {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let cache = TemplateCache::new();
    let lowering = DivRemLowering::new(Target::aarch64(), &cache, &DeoptimizingFallback);
    let (mut graph, _, ret) = create_param_test(DivRemOp::SignedDiv, 32);

    let err = lowering.lower(&mut graph, ret, &session).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedNode { .. }));
    assert!(err.to_string().contains("Should not reach here"));
}
