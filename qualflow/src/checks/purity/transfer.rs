//! Per-node effects.

use super::{ImpurityCause, PurityKinds, PurityLabel};
use crate::dataflow::{Store, TransferFunction, TransferInput, TransferResult};
use qualflow_cfg::{Entity, Node, NodeKind};
use std::collections::BTreeMap;

/// A node that broke at least one purity property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impurity {
    pub cause: ImpurityCause,
    /// The properties that still hold for the node
    pub effect: PurityKinds,
}

/// Transfer function of the purity analysis.
///
/// The value of every node is its own effect. Stores are only threaded
/// through so that the engine can tell which nodes are reachable.
#[derive(Debug)]
pub struct PurityTransfer<'a> {
    /// Declared purity of callees, by callee name
    callees: &'a BTreeMap<String, PurityLabel>,
    /// Effect assumed for callees without a declaration
    assumed: PurityKinds,
}

impl<'a> PurityTransfer<'a> {
    pub fn new(callees: &'a BTreeMap<String, PurityLabel>, assumed: PurityKinds) -> Self {
        Self { callees, assumed }
    }

    /// The effect of calling `callee`.
    pub fn callee_effect(&self, callee: &str) -> PurityKinds {
        self.callees
            .get(callee)
            .map_or(self.assumed, |label| label.kinds())
    }

    fn effect(&self, kind: &NodeKind) -> Option<(ImpurityCause, PurityKinds)> {
        match kind {
            NodeKind::Assign {
                target: Entity::Field { .. },
                ..
            } => Some((ImpurityCause::AssignField, PurityKinds::IMPURE)),
            NodeKind::ArrayStore { .. } => Some((ImpurityCause::AssignArray, PurityKinds::IMPURE)),
            NodeKind::New { .. } => Some((
                ImpurityCause::ObjectCreation,
                PurityKinds {
                    deterministic: false,
                    side_effect_free: true,
                },
            )),
            NodeKind::Call { callee, .. } => Some((ImpurityCause::Call, self.callee_effect(callee))),
            NodeKind::Catch { .. } => Some((
                ImpurityCause::Catch,
                PurityKinds {
                    deterministic: false,
                    side_effect_free: true,
                },
            )),
            _ => None,
        }
    }
}

impl TransferFunction<PurityKinds> for PurityTransfer<'_> {
    type Fact = Impurity;

    fn transfer(
        &mut self,
        node: &Node,
        input: &TransferInput<'_, PurityKinds>,
    ) -> TransferResult<PurityKinds, Impurity> {
        let store = input.store().clone();
        let mut result = match node.kind {
            NodeKind::Throw { .. } => TransferResult::regular(Store::Bottom).with_exceptional(store),
            _ if node.kind.may_throw() => {
                let thrown = store.clone();
                TransferResult::regular(store).with_exceptional(thrown)
            }
            _ => TransferResult::regular(store),
        };

        match self.effect(&node.kind) {
            Some((cause, effect)) if !effect.is_pure() => {
                result = result
                    .with_value(effect)
                    .with_fact(Impurity { cause, effect });
            }
            _ => result = result.with_value(PurityKinds::PURE),
        }
        result
    }
}
