//! qualflow_cfg
//!
//! Control-flow graph model for the qualflow dataflow engine.
//!
//! This crate does not build graphs from source text. It defines the shape
//! the engine reads (nodes grouped into basic blocks, edges labelled normal,
//! true-branch, false-branch or exceptional), validates it, and provides the
//! graph orderings the engine needs.
//!
//! # Example
//!
//! ```
//! use qualflow_cfg::{BinaryOp, CfgBuilder, Entity, Literal, NodeKind};
//!
//! // if (x == 1) { y = 1 } else { y = 2 }
//! let mut b = CfgBuilder::new("choose");
//! let entry = b.entry();
//! let x = b.push(entry, NodeKind::Read(Entity::local("x")));
//! let one = b.push(entry, NodeKind::Literal(Literal::Int(1)));
//! b.push(entry, NodeKind::Binary { op: BinaryOp::Eq, lhs: x, rhs: one });
//!
//! let then_block = b.block();
//! let else_block = b.block();
//! let exit = b.exit();
//! b.branch(entry, then_block, else_block);
//! b.goto(then_block, exit);
//! b.goto(else_block, exit);
//!
//! let graph = b.build().unwrap();
//! assert!(graph.is_branching(entry));
//! assert!(graph.loop_heads().is_empty());
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod node;
pub mod span;

pub use builder::CfgBuilder;
pub use error::{CfgError, CfgResult};
pub use graph::{Block, BlockId, BlockKind, ControlFlowGraph, Edge, EdgeKind, GraphParts};
pub use node::{BinaryOp, Entity, Literal, Node, NodeId, NodeKind, UnaryOp};
pub use span::Span;
