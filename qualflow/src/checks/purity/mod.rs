//! Purity classification.
//!
//! A routine is *deterministic* if it returns the same result for the same
//! arguments, and *side-effect-free* if it leaves no trace visible to its
//! caller. The classifier runs the engine with [`PurityTransfer`], joins the
//! effects of every reachable node and collapses the two properties into a
//! [`PurityLabel`].
//!
//! ```
//! use qualflow::checks::purity::{PurityKinds, PurityLabel};
//!
//! let kinds = PurityKinds { deterministic: false, side_effect_free: true };
//! assert_eq!(PurityLabel::from_kinds(kinds), PurityLabel::SideEffectFree);
//! assert_eq!(PurityLabel::Pure.to_string(), "pure");
//! ```

pub mod classifier;
pub mod transfer;

pub use classifier::{PurityClassifier, PurityReport};
pub use transfer::{Impurity, PurityTransfer};

use crate::dataflow::AnalysisResult;
use crate::lattice::Lattice;
use qualflow_cfg::ControlFlowGraph;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The two purity properties of a node or routine.
///
/// Ordered as an effect lattice: bottom has no effect at all (both
/// properties hold), top may do anything (neither holds), and joining keeps
/// a property only if both sides have it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurityKinds {
    pub deterministic: bool,
    pub side_effect_free: bool,
}

impl PurityKinds {
    pub const PURE: PurityKinds = PurityKinds {
        deterministic: true,
        side_effect_free: true,
    };

    pub const IMPURE: PurityKinds = PurityKinds {
        deterministic: false,
        side_effect_free: false,
    };

    pub fn is_pure(&self) -> bool {
        self.deterministic && self.side_effect_free
    }
}

impl Lattice for PurityKinds {
    fn bottom() -> Self {
        Self::PURE
    }

    fn top() -> Self {
        Self::IMPURE
    }

    fn join(&self, other: &Self) -> Self {
        PurityKinds {
            deterministic: self.deterministic && other.deterministic,
            side_effect_free: self.side_effect_free && other.side_effect_free,
        }
    }

    fn leq(&self, other: &Self) -> bool {
        (self.deterministic || !other.deterministic)
            && (self.side_effect_free || !other.side_effect_free)
    }
}

/// The reported purity of a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurityLabel {
    #[serde(rename = "pure")]
    Pure,
    #[serde(rename = "side-effect-free")]
    SideEffectFree,
    #[serde(rename = "deterministic")]
    Deterministic,
    #[serde(rename = "impure")]
    Impure,
}

impl PurityLabel {
    pub fn from_kinds(kinds: PurityKinds) -> Self {
        match (kinds.deterministic, kinds.side_effect_free) {
            (true, true) => PurityLabel::Pure,
            (false, true) => PurityLabel::SideEffectFree,
            (true, false) => PurityLabel::Deterministic,
            (false, false) => PurityLabel::Impure,
        }
    }

    /// The properties this label promises.
    pub fn kinds(self) -> PurityKinds {
        match self {
            PurityLabel::Pure => PurityKinds::PURE,
            PurityLabel::SideEffectFree => PurityKinds {
                deterministic: false,
                side_effect_free: true,
            },
            PurityLabel::Deterministic => PurityKinds {
                deterministic: true,
                side_effect_free: false,
            },
            PurityLabel::Impure => PurityKinds::IMPURE,
        }
    }
}

impl fmt::Display for PurityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurityLabel::Pure => write!(f, "pure"),
            PurityLabel::SideEffectFree => write!(f, "side-effect-free"),
            PurityLabel::Deterministic => write!(f, "deterministic"),
            PurityLabel::Impure => write!(f, "impure"),
        }
    }
}

/// The kind of node that broke a purity property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImpurityCause {
    AssignField,
    AssignArray,
    ObjectCreation,
    Call,
    Catch,
}

impl fmt::Display for ImpurityCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpurityCause::AssignField => write!(f, "assign.field"),
            ImpurityCause::AssignArray => write!(f, "assign.array"),
            ImpurityCause::ObjectCreation => write!(f, "object.creation"),
            ImpurityCause::Call => write!(f, "call"),
            ImpurityCause::Catch => write!(f, "catch"),
        }
    }
}

impl Serialize for ImpurityCause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Joins the effects of every node the analysis reached.
///
/// Nodes in unreachable blocks carry no value and do not contribute, so a
/// `throw` followed by dead stores still classifies by the live path only.
pub fn classify(
    body: &ControlFlowGraph,
    result: &AnalysisResult<PurityKinds, Impurity>,
) -> PurityKinds {
    body.nodes()
        .iter()
        .filter_map(|node| result.value(node.id))
        .fold(PurityKinds::bottom(), |acc, effect| acc.join(effect))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PurityKinds; 4] = [
        PurityKinds::PURE,
        PurityKinds::IMPURE,
        PurityKinds {
            deterministic: true,
            side_effect_free: false,
        },
        PurityKinds {
            deterministic: false,
            side_effect_free: true,
        },
    ];

    #[test]
    fn test_effect_join_laws() {
        for a in ALL {
            assert_eq!(a.join(&a), a);
            assert_eq!(PurityKinds::bottom().join(&a), a);
            assert_eq!(PurityKinds::top().join(&a), PurityKinds::top());
            for b in ALL {
                assert_eq!(a.join(&b), b.join(&a));
                assert!(a.leq(&a.join(&b)));
                assert_eq!(a.leq(&b), a.join(&b) == b);
            }
        }
    }

    #[test]
    fn test_labels_round_trip_through_kinds() {
        for kinds in ALL {
            assert_eq!(PurityLabel::from_kinds(kinds).kinds(), kinds);
        }
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(
            serde_json::to_string(&PurityLabel::SideEffectFree).unwrap(),
            "\"side-effect-free\""
        );
        let label: PurityLabel = serde_json::from_str("\"deterministic\"").unwrap();
        assert_eq!(label, PurityLabel::Deterministic);
        assert_eq!(
            serde_json::to_string(&ImpurityCause::AssignArray).unwrap(),
            "\"assign.array\""
        );
    }
}
