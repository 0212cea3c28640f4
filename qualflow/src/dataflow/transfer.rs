//! Transfer functions: how one node changes the abstract state.

use super::store::Store;
use crate::lattice::Lattice;
use qualflow_cfg::{ControlFlowGraph, Node, NodeId};
use std::fmt;

/// What a transfer function sees when it is applied to a node.
#[derive(Debug)]
pub struct TransferInput<'a, V> {
    store: &'a Store<V>,
    values: &'a [Option<V>],
    graph: &'a ControlFlowGraph,
}

impl<'a, V: Lattice> TransferInput<'a, V> {
    pub(crate) fn new(
        store: &'a Store<V>,
        values: &'a [Option<V>],
        graph: &'a ControlFlowGraph,
    ) -> Self {
        Self {
            store,
            values,
            graph,
        }
    }

    /// The store before the node. Never bottom.
    pub fn store(&self) -> &'a Store<V> {
        self.store
    }

    /// The value most recently computed for `node` (normally an operand).
    ///
    /// Nodes that produced no value are at top.
    pub fn value_of(&self, node: NodeId) -> V {
        self.values
            .get(node.index())
            .cloned()
            .flatten()
            .unwrap_or_else(V::top)
    }

    pub fn graph(&self) -> &'a ControlFlowGraph {
        self.graph
    }
}

/// The state after a node on normal completion.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput<V> {
    /// One store for every normal successor
    Regular(Store<V>),
    /// Separate stores for the true and false branches of a conditional
    Conditional {
        then_store: Store<V>,
        else_store: Store<V>,
    },
}

impl<V: Lattice> NodeOutput<V> {
    pub fn then_store(&self) -> &Store<V> {
        match self {
            NodeOutput::Regular(store) => store,
            NodeOutput::Conditional { then_store, .. } => then_store,
        }
    }

    pub fn else_store(&self) -> &Store<V> {
        match self {
            NodeOutput::Regular(store) => store,
            NodeOutput::Conditional { else_store, .. } => else_store,
        }
    }

    /// Join of both branch stores.
    pub fn merged(&self) -> Store<V> {
        match self {
            NodeOutput::Regular(store) => store.clone(),
            NodeOutput::Conditional {
                then_store,
                else_store,
            } => then_store.join(else_store),
        }
    }
}

/// Everything a transfer function reports for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult<V, F> {
    pub output: NodeOutput<V>,
    /// Store flowing along exceptional edges; `None` if the node cannot throw
    pub exceptional: Option<Store<V>>,
    /// Abstract value of the node itself
    pub value: Option<V>,
    /// Analysis-specific side facts recorded against the node
    pub facts: Vec<F>,
}

impl<V, F> TransferResult<V, F> {
    pub fn regular(store: Store<V>) -> Self {
        Self {
            output: NodeOutput::Regular(store),
            exceptional: None,
            value: None,
            facts: Vec::new(),
        }
    }

    pub fn conditional(then_store: Store<V>, else_store: Store<V>) -> Self {
        Self {
            output: NodeOutput::Conditional {
                then_store,
                else_store,
            },
            exceptional: None,
            value: None,
            facts: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: V) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_exceptional(mut self, store: Store<V>) -> Self {
        self.exceptional = Some(store);
        self
    }

    pub fn with_fact(mut self, fact: F) -> Self {
        self.facts.push(fact);
        self
    }
}

/// A dataflow analysis: one transfer rule per node kind.
///
/// The engine calls [`TransferFunction::transfer`] only for nodes in
/// reachable blocks, with a non-bottom input store. A node may be transferred
/// several times while loops stabilise; only the results of the last
/// application are kept.
pub trait TransferFunction<V: Lattice> {
    /// Side facts this analysis records per node.
    type Fact: Clone + fmt::Debug;

    fn transfer(&mut self, node: &Node, input: &TransferInput<'_, V>)
        -> TransferResult<V, Self::Fact>;
}
