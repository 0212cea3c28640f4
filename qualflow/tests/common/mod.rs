//! Shared helpers for integration tests
// Each test target uses a different subset of these helpers.
#![allow(dead_code)]

use qualflow::cfg::{BinaryOp, BlockId, CfgBuilder, ControlFlowGraph, Entity, Literal, NodeKind};
use qualflow::lattice::UnderlyingType;
use qualflow::program::{Declaration, FieldDecl, PatternPolicy, Routine};

/// `public static final int name = value` in `group`.
pub fn int_constant(name: &str, group: &str, pattern: PatternPolicy, value: i64) -> FieldDecl {
    FieldDecl::constant(name, group, pattern, Literal::Int(value))
}

/// A declaration holding only the given fields.
pub fn declaration_with(name: &str, fields: Vec<FieldDecl>) -> Declaration {
    let mut declaration = Declaration::new(name);
    declaration.fields = fields;
    declaration
}

/// `x = 0; while (x < n) { x = x + 1 }; return x`
pub fn counting_loop() -> ControlFlowGraph {
    let mut b = CfgBuilder::new("count");
    let entry = b.entry();
    let zero = b.push(entry, NodeKind::Literal(Literal::Int(0)));
    b.push(
        entry,
        NodeKind::Assign {
            target: Entity::local("x"),
            value: zero,
        },
    );

    let head = b.block();
    let body = b.block();
    let done = b.block();
    let exit = b.exit();
    b.goto(entry, head);

    let x = b.push(head, NodeKind::Read(Entity::local("x")));
    let n = b.push(head, NodeKind::Read(Entity::local("n")));
    b.push(
        head,
        NodeKind::Binary {
            op: BinaryOp::Lt,
            lhs: x,
            rhs: n,
        },
    );
    b.branch(head, body, done);

    let x = b.push(body, NodeKind::Read(Entity::local("x")));
    let one = b.push(body, NodeKind::Literal(Literal::Int(1)));
    let next = b.push(
        body,
        NodeKind::Binary {
            op: BinaryOp::Add,
            lhs: x,
            rhs: one,
        },
    );
    b.push(
        body,
        NodeKind::Assign {
            target: Entity::local("x"),
            value: next,
        },
    );
    b.goto(body, head);

    let x = b.push(done, NodeKind::Read(Entity::local("x")));
    b.push(done, NodeKind::Return { value: Some(x) });
    b.goto(done, exit);
    b.build().unwrap()
}

/// A chain of `depth` if/else diamonds, each assigning a literal to `x`.
///
/// Returns the graph and the number of blocks reachable from the entry.
pub fn diamond_chain(depth: usize) -> (ControlFlowGraph, usize) {
    let mut b = CfgBuilder::new("diamonds");
    let mut current: BlockId = b.entry();
    for i in 0..depth {
        b.push(current, NodeKind::Read(Entity::local("flag")));
        let then_block = b.block();
        let else_block = b.block();
        let join = b.block();
        b.branch(current, then_block, else_block);
        for (block, value) in [(then_block, i as i64), (else_block, -(i as i64))] {
            let literal = b.push(block, NodeKind::Literal(Literal::Int(value)));
            b.push(
                block,
                NodeKind::Assign {
                    target: Entity::local("x"),
                    value: literal,
                },
            );
            b.goto(block, join);
        }
        current = join;
    }
    let exit = b.exit();
    b.goto(current, exit);
    (b.build().unwrap(), 3 * depth + 2)
}

/// `a + b` over two int parameters.
pub fn pure_add() -> Routine {
    let mut b = CfgBuilder::new("add");
    let entry = b.entry();
    let lhs = b.push(entry, NodeKind::Read(Entity::local("a")));
    let rhs = b.push(entry, NodeKind::Read(Entity::local("b")));
    let sum = b.push(
        entry,
        NodeKind::Binary {
            op: BinaryOp::Add,
            lhs,
            rhs,
        },
    );
    b.push(entry, NodeKind::Return { value: Some(sum) });
    let exit = b.exit();
    b.goto(entry, exit);
    Routine::new("add")
        .with_param("a", UnderlyingType::Int)
        .with_param("b", UnderlyingType::Int)
        .with_body(b.build().unwrap())
}
