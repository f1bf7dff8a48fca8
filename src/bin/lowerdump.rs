//! Division lowering inspector.
//!
//! Builds `return op(p0, p1)` for one operation, prints the graph before and
//! after lowering, then evaluates the lowered graph with the given operands.
//!
//! Usage: `lowerdump --op udiv --bits 64 --dividend 23 --divisor 7 [--target aarch64] [--force]`

use bumpalo::Bump;
use clap::Parser;
use log::info;

use midtier::core::{CompilationSession, LoweringOptions, Target};
use midtier::fallback::DeoptimizingFallback;
use midtier::graph::eval::evaluate;
use midtier::graph::{DivRemOp, Graph};
use midtier::lowering::DivRemLowering;
use midtier::stamp::Stamp;
use midtier::templates::TemplateCache;

#[derive(Parser, Debug)]
#[command(name = "lowerdump")]
#[command(about = "Lower a single integer division and show the result")]
struct Args {
    /// Target architecture or triple (defaults to MIDTIER_TARGET, then the host)
    #[arg(long, value_parser = parse_target)]
    target: Option<Target>,

    /// Operation to lower
    #[arg(long, default_value = "sdiv", value_parser = parse_op)]
    op: DivRemOp,

    /// Operand width in bits
    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..=64))]
    bits: u32,

    #[arg(long, default_value_t = 7, allow_hyphen_values = true)]
    dividend: i64,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    divisor: i64,

    /// Lower even when the target divide faults on zero
    #[arg(long)]
    force: bool,
}

fn parse_target(text: &str) -> Result<Target, String> {
    Target::parse(text).ok_or_else(|| format!("unknown target '{}'", text))
}

fn parse_op(text: &str) -> Result<DivRemOp, String> {
    DivRemOp::from_name(text).ok_or_else(|| format!("expected one of sdiv, srem, udiv, urem, got '{}'", text))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let target = args.target.unwrap_or_else(Target::from_env);
    info!("lowering {} at {} bits for {}", args.op, args.bits, target);

    let mut graph = Graph::new(&format!("{}_i{}", args.op, args.bits));
    let x = graph.add_parameter(0, Stamp::int(args.bits));
    let y = graph.add_parameter(1, Stamp::int(args.bits));
    let div = graph.add_div_rem(args.op, x, y)?;
    let ret = graph.add_return(div)?;

    println!("{}", graph);

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let options = LoweringOptions { force: args.force };
    let lowering = DivRemLowering::new(target, TemplateCache::shared(), &DeoptimizingFallback).with_options(options);
    let lowered = lowering.run(&mut graph, &session)?;

    println!("{}", graph);
    println!(
        "{}({}, {}) on {} = {:?}",
        args.op,
        args.dividend,
        args.divisor,
        target,
        evaluate(&graph, ret, target, &[args.dividend, args.divisor])?
    );
    println!("{} node(s) lowered", lowered);
    print!("{}", session.stats());
    Ok(())
}
