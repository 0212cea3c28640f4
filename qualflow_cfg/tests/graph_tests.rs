//! Graph validation and ordering tests

use pretty_assertions::assert_eq;
use qualflow_cfg::{
    Block, BlockId, BlockKind, CfgBuilder, CfgError, ControlFlowGraph, Edge, EdgeKind, Entity,
    GraphParts, Literal, Node, NodeId, NodeKind,
};

fn literal(b: &mut CfgBuilder, block: BlockId, value: i64) -> NodeId {
    b.push(block, NodeKind::Literal(Literal::Int(value)))
}

fn condition(b: &mut CfgBuilder, block: BlockId) -> NodeId {
    b.push(block, NodeKind::Read(Entity::local("flag")))
}

// ==================== Ordering ====================

#[test]
fn test_reverse_postorder_of_diamond() {
    let mut b = CfgBuilder::new("diamond");
    let entry = b.entry();
    condition(&mut b, entry);
    let then_block = b.block();
    let else_block = b.block();
    let join = b.block();
    b.branch(entry, then_block, else_block);
    b.goto(then_block, join);
    b.goto(else_block, join);
    let graph = b.build().unwrap();

    let order = graph.reverse_postorder();
    assert_eq!(order.len(), 4);
    assert_eq!(order[0], entry);
    assert_eq!(order[3], join);
    assert!(graph.loop_heads().is_empty());
}

#[test]
fn test_loop_head_detection() {
    // entry -> head -(true)-> body -> head
    //               -(false)-> exit
    let mut b = CfgBuilder::new("loop");
    let entry = b.entry();
    let head = b.block();
    let body = b.block();
    let exit = b.exit();
    b.goto(entry, head);
    condition(&mut b, head);
    b.branch(head, body, exit);
    literal(&mut b, body, 1);
    b.goto(body, head);
    let graph = b.build().unwrap();

    assert_eq!(graph.loop_heads().into_iter().collect::<Vec<_>>(), vec![head]);
    let order = graph.reverse_postorder();
    assert_eq!(order.first(), Some(&entry));
    let head_pos = order.iter().position(|&b| b == head).unwrap();
    let body_pos = order.iter().position(|&b| b == body).unwrap();
    assert!(head_pos < body_pos);
}

#[test]
fn test_unreachable_blocks_are_not_ordered() {
    let mut b = CfgBuilder::new("dead");
    let entry = b.entry();
    let exit = b.exit();
    let dead = b.block();
    b.goto(entry, exit);
    b.goto(dead, exit);
    let graph = b.build().unwrap();

    let order = graph.reverse_postorder();
    assert_eq!(order, vec![entry, exit]);
    assert_eq!(graph.predecessors(exit).count(), 2);
}

#[test]
fn test_exit_blocks_are_shared() {
    let mut b = CfgBuilder::new("exits");
    let first = b.exit();
    let second = b.exit();
    let thrown = b.exceptional_exit();
    assert_eq!(first, second);
    assert_ne!(first, thrown);

    let entry = b.entry();
    b.goto(entry, first);
    b.exceptional(entry, thrown);
    let graph = b.build().unwrap();
    assert_eq!(graph.blocks_of_kind(BlockKind::Exit).count(), 1);
    assert_eq!(graph.blocks_of_kind(BlockKind::ExceptionalExit).count(), 1);
}

// ==================== Validation ====================

#[test]
fn test_incomplete_branch_is_rejected() {
    let mut b = CfgBuilder::new("half");
    let entry = b.entry();
    condition(&mut b, entry);
    let then_block = b.block();
    b.edge(entry, then_block, EdgeKind::TrueBranch);

    assert_eq!(b.build().unwrap_err(), CfgError::IncompleteBranch(entry));
}

#[test]
fn test_branch_without_condition_is_rejected() {
    let mut b = CfgBuilder::new("no_condition");
    let entry = b.entry();
    let then_block = b.block();
    let else_block = b.block();
    b.branch(entry, then_block, else_block);

    assert_eq!(b.build().unwrap_err(), CfgError::NotACondition(entry));
}

#[test]
fn test_mixed_successors_are_rejected() {
    let mut b = CfgBuilder::new("mixed");
    let entry = b.entry();
    condition(&mut b, entry);
    let a = b.block();
    let c = b.block();
    b.branch(entry, a, c);
    b.goto(entry, a);

    assert_eq!(b.build().unwrap_err(), CfgError::MixedSuccessors(entry));
}

#[test]
fn test_duplicate_edge_is_rejected() {
    let mut b = CfgBuilder::new("dup");
    let entry = b.entry();
    let exit = b.exit();
    b.goto(entry, exit);
    b.goto(entry, exit);

    assert!(matches!(
        b.build(),
        Err(CfgError::DuplicateEdge {
            kind: EdgeKind::Normal,
            ..
        })
    ));
}

#[test]
fn test_unknown_operand_is_rejected() {
    let parts = GraphParts {
        name: "bad".to_string(),
        entry: BlockId(0),
        blocks: vec![Block {
            id: BlockId(0),
            kind: BlockKind::Entry,
            nodes: vec![NodeId(0)],
        }],
        nodes: vec![Node::new(
            NodeId(0),
            NodeKind::Assign {
                target: Entity::local("x"),
                value: NodeId(7),
            },
            Default::default(),
        )],
        edges: vec![],
    };

    assert_eq!(
        ControlFlowGraph::from_parts(parts).unwrap_err(),
        CfgError::UnknownOperand {
            node: NodeId(0),
            operand: NodeId(7)
        }
    );
}

#[test]
fn test_edge_to_unknown_block_is_rejected() {
    let parts = GraphParts {
        blocks: vec![Block {
            id: BlockId(0),
            kind: BlockKind::Entry,
            nodes: vec![],
        }],
        edges: vec![Edge {
            from: BlockId(0),
            to: BlockId(4),
            kind: EdgeKind::Normal,
        }],
        ..GraphParts::default()
    };

    assert_eq!(
        ControlFlowGraph::from_parts(parts).unwrap_err(),
        CfgError::UnknownBlock(BlockId(4))
    );
}

#[test]
fn test_default_parts_enter_at_first_block() {
    let parts = GraphParts {
        blocks: vec![Block {
            id: BlockId(0),
            kind: BlockKind::Entry,
            nodes: vec![],
        }],
        ..GraphParts::default()
    };
    assert_eq!(parts.entry, BlockId(0));

    let graph = ControlFlowGraph::from_parts(parts).unwrap();
    assert_eq!(graph.entry(), BlockId(0));
    assert_eq!(CfgBuilder::new("f").entry(), BlockId(0));
}

#[test]
fn test_empty_graph_is_rejected() {
    assert_eq!(
        ControlFlowGraph::from_parts(GraphParts::default()).unwrap_err(),
        CfgError::Empty
    );
}

// ==================== Serialization ====================

#[test]
fn test_deserialize_validates() {
    let json = r#"{
        "name": "f",
        "blocks": [
            { "id": 0, "kind": "entry", "nodes": [0] },
            { "id": 1, "kind": "exit" }
        ],
        "nodes": [
            { "id": 0, "kind": { "literal": { "int": 3 } } }
        ],
        "edges": [ { "from": 0, "to": 1 } ]
    }"#;
    let graph: ControlFlowGraph = serde_json::from_str(json).unwrap();
    assert_eq!(graph.name(), "f");
    assert_eq!(graph.block_of(NodeId(0)), Some(BlockId(0)));
    assert_eq!(
        graph.successors(BlockId(0)).next().map(|e| e.kind),
        Some(EdgeKind::Normal)
    );

    let broken = r#"{ "blocks": [] }"#;
    let err = serde_json::from_str::<ControlFlowGraph>(broken).unwrap_err();
    assert!(err.to_string().contains("graph has no blocks"));
}
