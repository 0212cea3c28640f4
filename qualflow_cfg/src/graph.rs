//! The control-flow graph: basic blocks of nodes joined by labelled edges.
//!
//! A [`ControlFlowGraph`] is immutable once built. It is validated on
//! construction (see [`CfgError`]) so consumers can index blocks and nodes
//! by id without further checks.
//!
//! # Shape
//!
//! - Every block holds a (possibly empty) sequence of nodes.
//! - A block leaves either through one `Normal` edge, or through a
//!   `TrueBranch`/`FalseBranch` pair decided by its last node.
//! - Any block may additionally have `Exceptional` edges, taken when one of
//!   its nodes throws.

use crate::error::{CfgError, CfgResult};
use crate::node::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Index of a block inside its graph.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    /// Position of the block in the graph's block table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// Role of a block in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Entry,
    #[default]
    Regular,
    /// Normal routine exit
    Exit,
    /// Exit reached by an uncaught exception
    ExceptionalExit,
}

/// Label of a control-flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    #[default]
    Normal,
    TrueBranch,
    FalseBranch,
    Exceptional,
}

/// A directed edge between two blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: BlockId,
    pub to: BlockId,
    #[serde(default)]
    pub kind: EdgeKind,
}

/// A basic block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub kind: BlockKind,
    #[serde(default)]
    pub nodes: Vec<NodeId>,
}

/// Unvalidated graph contents, as produced by a builder or a deserializer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphParts {
    #[serde(default)]
    pub name: String,
    /// Defaults to the first block
    #[serde(default)]
    pub entry: BlockId,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A validated control-flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphParts", into = "GraphParts")]
pub struct ControlFlowGraph {
    name: String,
    entry: BlockId,
    blocks: Vec<Block>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Outgoing edge indices per block
    successors: Vec<Vec<usize>>,
    /// Incoming edge indices per block
    predecessors: Vec<Vec<usize>>,
    /// Block containing each node, if any
    node_block: Vec<Option<BlockId>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unseen,
    OnStack,
    Done,
}

impl ControlFlowGraph {
    /// Validates `parts` and builds the adjacency indexes.
    pub fn from_parts(parts: GraphParts) -> CfgResult<Self> {
        let GraphParts {
            name,
            entry,
            blocks,
            nodes,
            edges,
        } = parts;

        if blocks.is_empty() {
            return Err(CfgError::Empty);
        }
        for (position, block) in blocks.iter().enumerate() {
            if block.id.index() != position {
                return Err(CfgError::BlockIdMismatch {
                    position,
                    found: block.id,
                });
            }
        }
        for (position, node) in nodes.iter().enumerate() {
            if node.id.index() != position {
                return Err(CfgError::NodeIdMismatch {
                    position,
                    found: node.id,
                });
            }
        }
        if entry.index() >= blocks.len() {
            return Err(CfgError::MissingEntry(entry));
        }

        let mut node_block: Vec<Option<BlockId>> = vec![None; nodes.len()];
        for block in &blocks {
            for &node in &block.nodes {
                let slot = node_block
                    .get_mut(node.index())
                    .ok_or(CfgError::UnknownNode {
                        block: block.id,
                        node,
                    })?;
                if let Some(first) = *slot {
                    return Err(CfgError::NodeInMultipleBlocks {
                        node,
                        first,
                        second: block.id,
                    });
                }
                *slot = Some(block.id);
            }
        }

        for node in &nodes {
            for operand in node.kind.operands() {
                if operand.index() >= nodes.len() {
                    return Err(CfgError::UnknownOperand {
                        node: node.id,
                        operand,
                    });
                }
            }
        }

        let mut successors = vec![Vec::new(); blocks.len()];
        let mut predecessors = vec![Vec::new(); blocks.len()];
        let mut seen = HashSet::new();
        for (idx, edge) in edges.iter().enumerate() {
            for end in [edge.from, edge.to] {
                if end.index() >= blocks.len() {
                    return Err(CfgError::UnknownBlock(end));
                }
            }
            if !seen.insert(*edge) {
                return Err(CfgError::DuplicateEdge {
                    from: edge.from,
                    to: edge.to,
                    kind: edge.kind,
                });
            }
            successors[edge.from.index()].push(idx);
            predecessors[edge.to.index()].push(idx);
        }

        for block in &blocks {
            let kinds: Vec<EdgeKind> = successors[block.id.index()]
                .iter()
                .map(|&idx| edges[idx].kind)
                .collect();
            let has_true = kinds.contains(&EdgeKind::TrueBranch);
            let has_false = kinds.contains(&EdgeKind::FalseBranch);
            let has_normal = kinds.contains(&EdgeKind::Normal);
            if has_true != has_false {
                return Err(CfgError::IncompleteBranch(block.id));
            }
            if has_true && has_normal {
                return Err(CfgError::MixedSuccessors(block.id));
            }
            if has_true {
                let condition = block.nodes.last().map(|id| &nodes[id.index()].kind);
                if !condition.is_some_and(|kind| kind.is_conditional()) {
                    return Err(CfgError::NotACondition(block.id));
                }
            }
        }

        Ok(Self {
            name,
            entry,
            blocks,
            nodes,
            edges,
            successors,
            predecessors,
            node_block,
        })
    }

    /// Name of the routine this graph was built for (may be empty).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The block with the given id.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this graph.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The node with the given id.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this graph.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Outgoing edges of `block`, in declaration order.
    pub fn successors(&self, block: BlockId) -> impl Iterator<Item = &Edge> + '_ {
        self.successors[block.index()]
            .iter()
            .map(move |&idx| &self.edges[idx])
    }

    /// Incoming edges of `block`, in declaration order.
    pub fn predecessors(&self, block: BlockId) -> impl Iterator<Item = &Edge> + '_ {
        self.predecessors[block.index()]
            .iter()
            .map(move |&idx| &self.edges[idx])
    }

    /// The block a node was placed in.
    pub fn block_of(&self, node: NodeId) -> Option<BlockId> {
        self.node_block.get(node.index()).copied().flatten()
    }

    /// Returns true if `block` leaves through a true/false edge pair.
    pub fn is_branching(&self, block: BlockId) -> bool {
        self.successors(block)
            .any(|edge| edge.kind == EdgeKind::TrueBranch)
    }

    /// Blocks of the given kind, in id order.
    pub fn blocks_of_kind(&self, kind: BlockKind) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.iter().filter(move |block| block.kind == kind)
    }

    /// Blocks reachable from the entry, in reverse postorder.
    ///
    /// In an acyclic graph every block appears after all of its reachable
    /// predecessors.
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        let (mut postorder, _) = self.depth_first();
        postorder.reverse();
        postorder
    }

    /// Targets of back edges found by a depth-first walk from the entry.
    ///
    /// Every cycle reachable from the entry passes through at least one of
    /// these blocks.
    pub fn loop_heads(&self) -> BTreeSet<BlockId> {
        self.depth_first().1
    }

    fn depth_first(&self) -> (Vec<BlockId>, BTreeSet<BlockId>) {
        let mut state = vec![Visit::Unseen; self.blocks.len()];
        let mut postorder = Vec::with_capacity(self.blocks.len());
        let mut heads = BTreeSet::new();
        let mut stack: Vec<(BlockId, usize)> = vec![(self.entry, 0)];
        state[self.entry.index()] = Visit::OnStack;

        while let Some(top) = stack.last_mut() {
            let (block, cursor) = *top;
            let outgoing = &self.successors[block.index()];
            if cursor < outgoing.len() {
                top.1 += 1;
                let target = self.edges[outgoing[cursor]].to;
                match state[target.index()] {
                    Visit::Unseen => {
                        state[target.index()] = Visit::OnStack;
                        stack.push((target, 0));
                    }
                    Visit::OnStack => {
                        heads.insert(target);
                    }
                    Visit::Done => {}
                }
            } else {
                state[block.index()] = Visit::Done;
                postorder.push(block);
                stack.pop();
            }
        }

        (postorder, heads)
    }
}

impl TryFrom<GraphParts> for ControlFlowGraph {
    type Error = CfgError;

    fn try_from(parts: GraphParts) -> CfgResult<Self> {
        ControlFlowGraph::from_parts(parts)
    }
}

impl From<ControlFlowGraph> for GraphParts {
    fn from(graph: ControlFlowGraph) -> Self {
        GraphParts {
            name: graph.name,
            entry: graph.entry,
            blocks: graph.blocks,
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}
