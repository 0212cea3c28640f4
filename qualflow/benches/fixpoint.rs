use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use qualflow::cfg::{BinaryOp, BlockId, CfgBuilder, ControlFlowGraph, Entity, Literal, NodeKind};
use qualflow::checks::constants::QualifierUsageCheck;
use qualflow::checks::purity::PurityClassifier;
use qualflow::config::PurityOptions;
use qualflow::dataflow::EngineConfig;
use qualflow::lattice::UnderlyingType;
use qualflow::program::Routine;
use qualflow::Diagnostic;

/// `depth` nested counting loops, one counter local per level.
///
/// `depth` must be at least one.
fn nested_loops(depth: usize) -> ControlFlowGraph {
    let mut b = CfgBuilder::new("nested");
    let mut outer: BlockId = b.entry();
    let mut heads = Vec::with_capacity(depth);

    for level in 0..depth {
        let var = format!("x{}", level);
        let zero = b.push(outer, NodeKind::Literal(Literal::Int(0)));
        b.push(
            outer,
            NodeKind::Assign {
                target: Entity::local(var.as_str()),
                value: zero,
            },
        );
        let head = b.block();
        b.goto(outer, head);
        let x = b.push(head, NodeKind::Read(Entity::local(var.as_str())));
        let n = b.push(head, NodeKind::Read(Entity::local("n")));
        b.push(
            head,
            NodeKind::Binary {
                op: BinaryOp::Lt,
                lhs: x,
                rhs: n,
            },
        );
        let body = b.block();
        heads.push((head, body, var));
        outer = body;
    }

    let innermost = heads.len() - 1;
    step(&mut b, outer, &heads[innermost].2, heads[innermost].0);

    let exit = b.exit();
    for (level, (head, body, _)) in heads.iter().enumerate() {
        let done = if level == 0 {
            exit
        } else {
            // leaving an inner loop steps the enclosing counter
            let (outer_head, _, outer_var) = &heads[level - 1];
            let block = b.block();
            step(&mut b, block, outer_var, *outer_head);
            block
        };
        b.branch(*head, *body, done);
    }
    b.build().unwrap()
}

/// `var = var + 1`, then back to `head`.
fn step(b: &mut CfgBuilder, block: BlockId, var: &str, head: BlockId) {
    let x = b.push(block, NodeKind::Read(Entity::local(var)));
    let one = b.push(block, NodeKind::Literal(Literal::Int(1)));
    let next = b.push(
        block,
        NodeKind::Binary {
            op: BinaryOp::Add,
            lhs: x,
            rhs: one,
        },
    );
    b.push(
        block,
        NodeKind::Assign {
            target: Entity::local(var),
            value: next,
        },
    );
    b.goto(block, head);
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixpoint");
    for depth in [1usize, 4, 16, 64] {
        let routine = Routine::new("nested")
            .with_param("n", UnderlyingType::Int)
            .with_body(nested_loops(depth));

        group.bench_with_input(BenchmarkId::new("fenum", depth), &routine, |bench, routine| {
            let check = QualifierUsageCheck::new(EngineConfig::default());
            bench.iter(|| {
                let mut sink: Vec<Diagnostic> = Vec::new();
                black_box(check.check_routine("Bench", routine, &mut sink))
            });
        });

        group.bench_with_input(BenchmarkId::new("purity", depth), &routine, |bench, routine| {
            let classifier =
                PurityClassifier::new(&PurityOptions::default(), EngineConfig::default());
            bench.iter(|| black_box(classifier.analyze(routine)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);
