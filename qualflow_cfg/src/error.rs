//! Graph construction errors

use crate::graph::{BlockId, EdgeKind};
use crate::node::NodeId;
use thiserror::Error;

/// Reasons a set of blocks, nodes and edges does not form a usable graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CfgError {
    /// The graph has no blocks at all
    #[error("graph has no blocks")]
    Empty,

    /// The designated entry block does not exist
    #[error("entry block {0} does not exist")]
    MissingEntry(BlockId),

    /// A block's id does not match its position
    #[error("block at position {position} is labelled {found}")]
    BlockIdMismatch { position: usize, found: BlockId },

    /// A node's id does not match its position
    #[error("node at position {position} is labelled {found}")]
    NodeIdMismatch { position: usize, found: NodeId },

    /// An edge mentions a block that does not exist
    #[error("edge refers to unknown block {0}")]
    UnknownBlock(BlockId),

    /// A block lists a node that does not exist
    #[error("block {block} refers to unknown node {node}")]
    UnknownNode { block: BlockId, node: NodeId },

    /// The same node is placed in two blocks
    #[error("node {node} appears in blocks {first} and {second}")]
    NodeInMultipleBlocks {
        node: NodeId,
        first: BlockId,
        second: BlockId,
    },

    /// A node consumes a node that does not exist
    #[error("node {node} uses unknown operand {operand}")]
    UnknownOperand { node: NodeId, operand: NodeId },

    /// A block has a true edge without a false edge, or the reverse
    #[error("block {0} has only one branch edge")]
    IncompleteBranch(BlockId),

    /// A block has both a normal successor and branch successors
    #[error("block {0} mixes normal and branch successors")]
    MixedSuccessors(BlockId),

    /// A branching block has no node to branch on
    #[error("block {0} branches but its last node cannot be a condition")]
    NotACondition(BlockId),

    /// The same edge is declared twice
    #[error("duplicate {kind:?} edge from {from} to {to}")]
    DuplicateEdge {
        from: BlockId,
        to: BlockId,
        kind: EdgeKind,
    },
}

/// Result alias for graph construction
pub type CfgResult<T> = Result<T, CfgError>;
