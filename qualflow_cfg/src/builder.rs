//! Incremental construction of control-flow graphs.
//!
//! ```
//! use qualflow_cfg::{CfgBuilder, Entity, Literal, NodeKind};
//!
//! let mut builder = CfgBuilder::new("set_one");
//! let entry = builder.entry();
//! let one = builder.push(entry, NodeKind::Literal(Literal::Int(1)));
//! builder.push(entry, NodeKind::Assign { target: Entity::local("x"), value: one });
//! let exit = builder.exit();
//! builder.goto(entry, exit);
//!
//! let graph = builder.build().unwrap();
//! assert_eq!(graph.blocks().len(), 2);
//! ```

use crate::error::CfgResult;
use crate::graph::{Block, BlockId, BlockKind, ControlFlowGraph, Edge, EdgeKind, GraphParts};
use crate::node::{Node, NodeId, NodeKind};
use crate::span::Span;

/// Builder for [`ControlFlowGraph`].
///
/// The entry block is created up front. Exit blocks are created lazily and
/// shared, so every `exit()` call returns the same block.
#[derive(Debug, Clone)]
pub struct CfgBuilder {
    parts: GraphParts,
    exit: Option<BlockId>,
    exceptional_exit: Option<BlockId>,
}

impl CfgBuilder {
    /// Creates a builder holding only an empty entry block.
    pub fn new(name: impl Into<String>) -> Self {
        let mut builder = Self {
            parts: GraphParts {
                name: name.into(),
                ..GraphParts::default()
            },
            exit: None,
            exceptional_exit: None,
        };
        let entry = builder.block_of_kind(BlockKind::Entry);
        builder.parts.entry = entry;
        builder
    }

    pub fn entry(&self) -> BlockId {
        self.parts.entry
    }

    /// Adds a new regular block.
    pub fn block(&mut self) -> BlockId {
        self.block_of_kind(BlockKind::Regular)
    }

    /// The normal exit block, created on first use.
    pub fn exit(&mut self) -> BlockId {
        if let Some(exit) = self.exit {
            return exit;
        }
        let exit = self.block_of_kind(BlockKind::Exit);
        self.exit = Some(exit);
        exit
    }

    /// The exceptional exit block, created on first use.
    pub fn exceptional_exit(&mut self) -> BlockId {
        if let Some(exit) = self.exceptional_exit {
            return exit;
        }
        let exit = self.block_of_kind(BlockKind::ExceptionalExit);
        self.exceptional_exit = Some(exit);
        exit
    }

    fn block_of_kind(&mut self, kind: BlockKind) -> BlockId {
        let id = BlockId(self.parts.blocks.len() as u32);
        self.parts.blocks.push(Block {
            id,
            kind,
            nodes: Vec::new(),
        });
        id
    }

    /// Appends a node to `block` and returns its id.
    pub fn push(&mut self, block: BlockId, kind: NodeKind) -> NodeId {
        self.push_at(block, kind, Span::empty())
    }

    /// Appends a node with a source location to `block`.
    ///
    /// # Panics
    /// Panics if `block` was not created by this builder.
    pub fn push_at(&mut self, block: BlockId, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.parts.nodes.len() as u32);
        self.parts.nodes.push(Node::new(id, kind, span));
        self.parts.blocks[block.index()].nodes.push(id);
        id
    }

    /// Unconditional edge.
    pub fn goto(&mut self, from: BlockId, to: BlockId) {
        self.edge(from, to, EdgeKind::Normal);
    }

    /// Two-way branch on the last node of `from`.
    pub fn branch(&mut self, from: BlockId, then_block: BlockId, else_block: BlockId) {
        self.edge(from, then_block, EdgeKind::TrueBranch);
        self.edge(from, else_block, EdgeKind::FalseBranch);
    }

    /// Edge taken when a node of `from` throws.
    pub fn exceptional(&mut self, from: BlockId, handler: BlockId) {
        self.edge(from, handler, EdgeKind::Exceptional);
    }

    pub fn edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind) {
        self.parts.edges.push(Edge { from, to, kind });
    }

    /// Validates and freezes the graph.
    pub fn build(self) -> CfgResult<ControlFlowGraph> {
        ControlFlowGraph::from_parts(self.parts)
    }
}
