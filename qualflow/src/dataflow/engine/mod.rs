//! Fixed-point engine.
//!
//! The engine runs a worklist over the blocks of a [`ControlFlowGraph`],
//! applying a [`TransferFunction`] to every node of a stale block and joining
//! stores where edges converge, until no block input changes.
//!
//! # Algorithm
//!
//! 1. The worklist is seeded with the entry block and always yields the stale
//!    block earliest in reverse postorder. On acyclic graphs every reachable
//!    block is therefore visited exactly once.
//! 2. A block's input is the join of the stores on its incoming edges:
//!    - `Normal`: the predecessor's store after its last node
//!    - `TrueBranch` / `FalseBranch`: the predecessor's then / else store
//!    - `Exceptional`: the predecessor's exceptional store
//!
//!    The entry block also receives the initial store.
//! 3. A block is re-run only if its input changed. Bottom inputs are never
//!    transferred.
//! 4. At loop heads the recorded input is widened with the new one, after
//!    `widen_delay` plain joins.
//! 5. When a block's exit stores change, its successors become stale. When
//!    the value of a node changes, every already visited block reading that
//!    node as an operand is re-run even if its input store did not change.
//!
//! A run that exceeds `max_block_visits` stops early; the result is still
//! usable but [`AnalysisStats::converged`] is false.

use super::result::{AnalysisResult, AnalysisStats, BlockExit};
use super::store::Store;
use super::transfer::{NodeOutput, TransferFunction, TransferInput};
use crate::lattice::{Lattice, DEFAULT_MAX_BLOCK_VISITS, DEFAULT_WIDEN_DELAY};
use log::{debug, trace, warn};
use qualflow_cfg::{BlockId, ControlFlowGraph, EdgeKind, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Iteration bounds for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Plain joins allowed at a loop head before widening
    pub widen_delay: usize,
    /// Block visits after which a run is abandoned
    pub max_block_visits: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            widen_delay: DEFAULT_WIDEN_DELAY,
            max_block_visits: DEFAULT_MAX_BLOCK_VISITS,
        }
    }
}

/// Worklist solver, generic over the lattice and the transfer function.
///
/// # Example
/// ```
/// use qualflow::dataflow::{
///     FixpointEngine, Store, TransferFunction, TransferInput, TransferResult,
/// };
/// use qualflow::lattice::Flat;
/// use qualflow_cfg::{CfgBuilder, Literal, Node, NodeKind};
///
/// /// Tracks integer literals, nothing else.
/// struct Literals;
///
/// impl TransferFunction<Flat<i64>> for Literals {
///     type Fact = ();
///
///     fn transfer(
///         &mut self,
///         node: &Node,
///         input: &TransferInput<'_, Flat<i64>>,
///     ) -> TransferResult<Flat<i64>, ()> {
///         let result = TransferResult::regular(input.store().clone());
///         match &node.kind {
///             NodeKind::Literal(Literal::Int(v)) => result.with_value(Flat::Value(*v)),
///             _ => result,
///         }
///     }
/// }
///
/// let mut b = CfgBuilder::new("f");
/// let entry = b.entry();
/// let seven = b.push(entry, NodeKind::Literal(Literal::Int(7)));
/// let exit = b.exit();
/// b.goto(entry, exit);
/// let graph = b.build().unwrap();
///
/// let result = FixpointEngine::default().analyze(&graph, Store::<Flat<i64>>::new(), &mut Literals);
/// assert_eq!(result.value(seven), Some(&Flat::Value(7)));
/// assert_eq!(result.stats().block_visits, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixpointEngine {
    config: EngineConfig,
}

impl FixpointEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs `transfer` over `graph` to a fixed point, starting from `initial`
    /// at the entry block.
    pub fn analyze<V, T>(
        &self,
        graph: &ControlFlowGraph,
        initial: Store<V>,
        transfer: &mut T,
    ) -> AnalysisResult<V, T::Fact>
    where
        V: Lattice,
        T: TransferFunction<V>,
    {
        let blocks = graph.blocks().len();
        let order = graph.reverse_postorder();
        let loop_heads = graph.loop_heads();
        let mut rank = vec![usize::MAX; blocks];
        for (position, block) in order.iter().enumerate() {
            rank[block.index()] = position;
        }

        debug!(
            "analyzing `{}`: {} blocks ({} reachable), {} loop heads",
            graph.name(),
            blocks,
            order.len(),
            loop_heads.len()
        );

        let readers = operand_readers(graph);
        let mut result = AnalysisResult::empty(blocks, graph.nodes().len());
        let mut visited = vec![false; blocks];
        // operands read by the block changed since its last visit
        let mut stale_operands = vec![false; blocks];
        let mut head_joins = vec![0usize; blocks];
        let mut stats = AnalysisStats {
            converged: true,
            ..AnalysisStats::default()
        };

        let mut worklist: BTreeSet<(usize, BlockId)> = BTreeSet::new();
        worklist.insert((rank[graph.entry().index()], graph.entry()));

        while let Some((_, block)) = worklist.pop_first() {
            let incoming = self.incoming_store(graph, block, &initial, &result);

            let input = if loop_heads.contains(&block) && visited[block.index()] {
                let previous = &result.inputs[block.index()];
                let joined = previous.join(&incoming);
                if joined == *previous {
                    joined
                } else if head_joins[block.index()] < self.config.widen_delay {
                    head_joins[block.index()] += 1;
                    joined
                } else {
                    stats.widenings += 1;
                    previous.widen(&joined)
                }
            } else {
                incoming
            };

            if input.is_bottom() {
                continue;
            }
            if visited[block.index()]
                && !stale_operands[block.index()]
                && input == result.inputs[block.index()]
            {
                continue;
            }

            if stats.block_visits >= self.config.max_block_visits {
                warn!(
                    "analysis of `{}` stopped after {} block visits without reaching a fixed point",
                    graph.name(),
                    stats.block_visits
                );
                stats.converged = false;
                break;
            }
            stats.block_visits += 1;
            visited[block.index()] = true;
            stale_operands[block.index()] = false;
            trace!("visit {} (visit #{})", block, stats.block_visits);

            let (exit, changed) =
                Self::run_block(graph, block, &input, transfer, &mut result, &mut stats);
            result.inputs[block.index()] = input;

            for node in changed {
                for &reader in &readers[node.index()] {
                    if visited[reader.index()] {
                        stale_operands[reader.index()] = true;
                        worklist.insert((rank[reader.index()], reader));
                    }
                }
            }

            if exit != result.exits[block.index()] {
                result.exits[block.index()] = exit;
                for edge in graph.successors(block) {
                    worklist.insert((rank[edge.to.index()], edge.to));
                }
            }
        }

        debug!(
            "analysis of `{}` done: {} block visits, {} transfers, {} widenings",
            graph.name(),
            stats.block_visits,
            stats.transfers,
            stats.widenings
        );
        result.stats = stats;
        result
    }

    /// Join of the stores flowing into `block` along its incoming edges.
    fn incoming_store<V: Lattice, F>(
        &self,
        graph: &ControlFlowGraph,
        block: BlockId,
        initial: &Store<V>,
        result: &AnalysisResult<V, F>,
    ) -> Store<V> {
        let mut sources: Vec<&Store<V>> = Vec::new();
        if block == graph.entry() {
            sources.push(initial);
        }
        for edge in graph.predecessors(block) {
            let exit = &result.exits[edge.from.index()];
            sources.push(match edge.kind {
                EdgeKind::Normal => &exit.normal,
                EdgeKind::TrueBranch => &exit.then_store,
                EdgeKind::FalseBranch => &exit.else_store,
                EdgeKind::Exceptional => &exit.exceptional,
            });
        }

        let joined = sources
            .iter()
            .fold(Store::Bottom, |acc, store| acc.join(store));
        assert!(
            sources.iter().any(|store| !store.is_bottom()) || joined.is_bottom(),
            "joining bottom stores produced a reachable store"
        );
        joined
    }

    /// Transfers every node of `block` and returns the stores leaving it,
    /// along with the nodes whose value changed.
    fn run_block<V, T>(
        graph: &ControlFlowGraph,
        block: BlockId,
        input: &Store<V>,
        transfer: &mut T,
        result: &mut AnalysisResult<V, T::Fact>,
        stats: &mut AnalysisStats,
    ) -> (BlockExit<V>, Vec<NodeId>)
    where
        V: Lattice,
        T: TransferFunction<V>,
    {
        let nodes = &graph.block(block).nodes;
        let mut store = input.clone();
        let mut exceptional = Store::Bottom;
        let mut branches: Option<(Store<V>, Store<V>)> = None;
        let mut changed = Vec::new();

        for (position, &id) in nodes.iter().enumerate() {
            let slot = id.index();
            if store.is_bottom() {
                if result.values[slot].take().is_some() {
                    changed.push(id);
                }
                result.before[slot] = Store::Bottom;
                result.after[slot] = Store::Bottom;
                result.facts[slot].clear();
                continue;
            }

            let outcome = {
                let view = TransferInput::new(&store, &result.values, graph);
                transfer.transfer(graph.node(id), &view)
            };
            stats.transfers += 1;

            let normal = outcome.output.merged();
            if let Some(thrown) = &outcome.exceptional {
                exceptional = exceptional.join(&thrown.join(&normal));
            }
            if position + 1 == nodes.len() {
                if let NodeOutput::Conditional {
                    then_store,
                    else_store,
                } = outcome.output
                {
                    branches = Some((then_store, else_store));
                }
            }

            if result.values[slot] != outcome.value {
                changed.push(id);
            }
            result.before[slot] = std::mem::replace(&mut store, normal);
            result.after[slot] = store.clone();
            result.values[slot] = outcome.value;
            result.facts[slot] = outcome.facts;
        }

        let (then_store, else_store) = match branches {
            Some(pair) => pair,
            None => (store.clone(), store.clone()),
        };
        let exit = BlockExit {
            normal: store,
            then_store,
            else_store,
            exceptional,
        };
        (exit, changed)
    }
}

/// For every node, the blocks that read it as an operand.
///
/// A read of a node placed earlier in the same block is left out: the
/// block recomputes that operand before using it.
fn operand_readers(graph: &ControlFlowGraph) -> Vec<Vec<BlockId>> {
    let mut position = vec![0usize; graph.nodes().len()];
    for block in graph.blocks() {
        for (pos, id) in block.nodes.iter().enumerate() {
            position[id.index()] = pos;
        }
    }

    let mut readers: Vec<Vec<BlockId>> = vec![Vec::new(); graph.nodes().len()];
    for block in graph.blocks() {
        for (pos, &id) in block.nodes.iter().enumerate() {
            for operand in graph.node(id).kind.operands() {
                if graph.block_of(operand) == Some(block.id) && position[operand.index()] < pos {
                    continue;
                }
                let list = &mut readers[operand.index()];
                if !list.contains(&block.id) {
                    list.push(block.id);
                }
            }
        }
    }
    readers
}
