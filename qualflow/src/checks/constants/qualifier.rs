//! The fenum qualifier lattice.
//!
//! ```text
//!                    FenumTop
//!        /              |              \
//! FenumUnqualified  @Fenum("A")  @Fenum("B") ...
//!        \              |              /
//!                   FenumBottom
//! ```
//!
//! Constants of group `A` carry `@Fenum("A")`; literals and ordinary values
//! are unqualified. Two values can only be combined if their qualifiers are
//! comparable.

use crate::lattice::{AbstractValue, Flat, Lattice, UnderlyingType};
use std::fmt;

/// A non-extreme fenum qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FenumTag {
    Unqualified,
    Named(String),
}

/// Qualifier of a value in the constant-set analysis.
pub type FenumQualifier = Flat<FenumTag>;

/// Abstract value of the qualifier usage analysis.
pub type FenumValue = AbstractValue<FenumQualifier>;

impl Flat<FenumTag> {
    pub fn unqualified() -> Self {
        Flat::Value(FenumTag::Unqualified)
    }

    /// `@Fenum(group)`.
    pub fn fenum(group: impl Into<String>) -> Self {
        Flat::Value(FenumTag::Named(group.into()))
    }

    /// The qualifier for an optional group annotation.
    pub fn from_group(group: Option<&str>) -> Self {
        group.map_or_else(Self::unqualified, Self::fenum)
    }

    /// The group name, for `@Fenum` qualifiers.
    pub fn group(&self) -> Option<&str> {
        match self {
            Flat::Value(FenumTag::Named(name)) => Some(name),
            _ => None,
        }
    }

    /// Returns true if one qualifier is below the other.
    pub fn is_comparable(&self, other: &Self) -> bool {
        self.leq(other) || other.leq(self)
    }
}

impl fmt::Display for Flat<FenumTag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flat::Bottom => write!(f, "FenumBottom"),
            Flat::Top => write!(f, "FenumTop"),
            Flat::Value(FenumTag::Unqualified) => write!(f, "FenumUnqualified"),
            Flat::Value(FenumTag::Named(name)) => write!(f, "@Fenum({:?})", name),
        }
    }
}

/// An unqualified value of the given type.
pub fn unqualified(underlying: UnderlyingType) -> FenumValue {
    AbstractValue::new(underlying, FenumQualifier::unqualified())
}

/// Renders a value the way diagnostics show it: qualifier then type.
pub fn describe(value: &FenumValue) -> String {
    match value {
        AbstractValue::Bottom => "FenumBottom".to_string(),
        AbstractValue::Concrete {
            underlying,
            qualifier,
        } => format!("{} {}", qualifier, underlying),
    }
}
