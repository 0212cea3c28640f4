//! The frozen outcome of one fixed-point run.

use super::store::Store;
use crate::lattice::Lattice;
use qualflow_cfg::{BlockId, NodeId};

/// Stores leaving a block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockExit<V> {
    /// Store after the last node
    pub normal: Store<V>,
    /// Store along the true edge (same as `normal` for non-branching blocks)
    pub then_store: Store<V>,
    /// Store along the false edge (same as `normal` for non-branching blocks)
    pub else_store: Store<V>,
    /// Join of every store flowing along exceptional edges
    pub exceptional: Store<V>,
}

impl<V: Lattice> BlockExit<V> {
    pub fn unreachable() -> Self {
        Self {
            normal: Store::Bottom,
            then_store: Store::Bottom,
            else_store: Store::Bottom,
            exceptional: Store::Bottom,
        }
    }
}

/// Counters collected while the engine runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    /// Number of times a block's nodes were transferred
    pub block_visits: usize,
    /// Number of transfer function applications
    pub transfers: usize,
    /// Number of times a loop-head input was widened
    pub widenings: usize,
    /// False if the run stopped at the visit cap
    pub converged: bool,
}

/// Per-point results of an analysis, read-only once returned.
///
/// Querying a point the analysis never reached yields the bottom store.
#[derive(Debug, Clone)]
pub struct AnalysisResult<V, F> {
    pub(crate) inputs: Vec<Store<V>>,
    pub(crate) exits: Vec<BlockExit<V>>,
    pub(crate) before: Vec<Store<V>>,
    pub(crate) after: Vec<Store<V>>,
    pub(crate) values: Vec<Option<V>>,
    pub(crate) facts: Vec<Vec<F>>,
    pub(crate) stats: AnalysisStats,
    unreached: Store<V>,
}

impl<V: Lattice, F> AnalysisResult<V, F> {
    pub(crate) fn empty(blocks: usize, nodes: usize) -> Self {
        Self {
            inputs: vec![Store::Bottom; blocks],
            exits: (0..blocks).map(|_| BlockExit::unreachable()).collect(),
            before: vec![Store::Bottom; nodes],
            after: vec![Store::Bottom; nodes],
            values: vec![None; nodes],
            facts: (0..nodes).map(|_| Vec::new()).collect(),
            stats: AnalysisStats::default(),
            unreached: Store::Bottom,
        }
    }

    /// Store at block entry.
    pub fn block_input(&self, block: BlockId) -> &Store<V> {
        self.inputs.get(block.index()).unwrap_or(&self.unreached)
    }

    pub fn block_exit(&self, block: BlockId) -> Option<&BlockExit<V>> {
        self.exits.get(block.index())
    }

    /// Store after the last node of `block`.
    pub fn normal_exit(&self, block: BlockId) -> &Store<V> {
        self.block_exit(block)
            .map(|exit| &exit.normal)
            .unwrap_or(&self.unreached)
    }

    pub fn then_store(&self, block: BlockId) -> &Store<V> {
        self.block_exit(block)
            .map(|exit| &exit.then_store)
            .unwrap_or(&self.unreached)
    }

    pub fn else_store(&self, block: BlockId) -> &Store<V> {
        self.block_exit(block)
            .map(|exit| &exit.else_store)
            .unwrap_or(&self.unreached)
    }

    pub fn exceptional_store(&self, block: BlockId) -> &Store<V> {
        self.block_exit(block)
            .map(|exit| &exit.exceptional)
            .unwrap_or(&self.unreached)
    }

    pub fn store_before(&self, node: NodeId) -> &Store<V> {
        self.before.get(node.index()).unwrap_or(&self.unreached)
    }

    /// Store after `node` on normal completion (both branches joined).
    pub fn store_after(&self, node: NodeId) -> &Store<V> {
        self.after.get(node.index()).unwrap_or(&self.unreached)
    }

    /// Value computed for `node`, if it was reached and produced one.
    pub fn value(&self, node: NodeId) -> Option<&V> {
        self.values.get(node.index()).and_then(Option::as_ref)
    }

    /// Side facts recorded against `node` by its last transfer.
    pub fn facts(&self, node: NodeId) -> &[F] {
        self.facts
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every recorded fact, in node order.
    pub fn all_facts(&self) -> impl Iterator<Item = (NodeId, &F)> + '_ {
        self.facts.iter().enumerate().flat_map(|(idx, facts)| {
            facts.iter().map(move |fact| (NodeId(idx as u32), fact))
        })
    }

    /// Returns true if the block was reached with a non-bottom input.
    pub fn is_reachable(&self, block: BlockId) -> bool {
        !self.block_input(block).is_bottom()
    }

    pub fn stats(&self) -> AnalysisStats {
        self.stats
    }
}
