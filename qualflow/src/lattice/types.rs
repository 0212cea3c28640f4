//! Concrete lattice types.
//!
//! - [`Flat`]: lifts any set of incomparable values into a lattice of height two
//! - [`AbstractValue`]: the value tracked per entity, an underlying type tag plus
//!   a qualifier drawn from some other lattice
//! - [`UnderlyingType`]: the runtime type an abstract value describes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime type underlying an abstract value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderlyingType {
    Int,
    Text,
    Bool,
    /// A named reference type
    Reference(String),
    /// Type not known, or a join of different types
    Unknown,
}

impl UnderlyingType {
    /// Least common type: equal types stay, anything else becomes `Unknown`.
    pub fn join(&self, other: &UnderlyingType) -> UnderlyingType {
        if self == other {
            self.clone()
        } else {
            UnderlyingType::Unknown
        }
    }

    pub fn is_subtype_of(&self, other: &UnderlyingType) -> bool {
        self == other || *other == UnderlyingType::Unknown
    }
}

impl fmt::Display for UnderlyingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnderlyingType::Int => write!(f, "int"),
            UnderlyingType::Text => write!(f, "text"),
            UnderlyingType::Bool => write!(f, "bool"),
            UnderlyingType::Reference(name) => write!(f, "{}", name),
            UnderlyingType::Unknown => write!(f, "unknown"),
        }
    }
}

/// A flat lattice: bottom, pairwise incomparable values, top.
///
/// ```text
///            Top
///        /    |    \
///   Value(a) Value(b) ...
///        \    |    /
///           Bottom
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flat<T> {
    Bottom,
    Value(T),
    Top,
}

impl<T> Flat<T> {
    /// The wrapped value, if this is neither bottom nor top.
    pub fn value(&self) -> Option<&T> {
        match self {
            Flat::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// The abstract value tracked for one entity at one program point.
///
/// `Bottom` carries no runtime type: it describes a value that cannot exist
/// (an unreachable point). A `Concrete` value pairs the underlying runtime
/// type with the qualifier in force. [`AbstractValue::bottom_of`] gives the
/// least value of a particular underlying type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstractValue<Q> {
    Bottom,
    Concrete {
        underlying: UnderlyingType,
        qualifier: Q,
    },
}

impl<Q> AbstractValue<Q> {
    pub fn new(underlying: UnderlyingType, qualifier: Q) -> Self {
        AbstractValue::Concrete {
            underlying,
            qualifier,
        }
    }

    /// The underlying type, or `None` for `Bottom`.
    pub fn underlying(&self) -> Option<&UnderlyingType> {
        match self {
            AbstractValue::Bottom => None,
            AbstractValue::Concrete { underlying, .. } => Some(underlying),
        }
    }
}

impl<Q: crate::lattice::Lattice> AbstractValue<Q> {
    /// The least value whose runtime type is `underlying`.
    pub fn bottom_of(underlying: UnderlyingType) -> Self {
        AbstractValue::new(underlying, Q::bottom())
    }

    /// The qualifier in force; `Q::bottom()` for `Bottom`.
    pub fn qualifier(&self) -> Q {
        match self {
            AbstractValue::Bottom => Q::bottom(),
            AbstractValue::Concrete { qualifier, .. } => qualifier.clone(),
        }
    }

    /// Same underlying type, different qualifier. `Bottom` stays `Bottom`.
    pub fn with_qualifier(&self, qualifier: Q) -> Self {
        match self {
            AbstractValue::Bottom => AbstractValue::Bottom,
            AbstractValue::Concrete { underlying, .. } => {
                AbstractValue::new(underlying.clone(), qualifier)
            }
        }
    }
}
