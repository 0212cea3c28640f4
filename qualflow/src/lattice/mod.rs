//! Lattices of abstract values.
//!
//! Every abstract value the engine tracks implements [`Lattice`]: a partial
//! order with a least element (bottom, "unreachable / no information yet"), a
//! greatest element (top, "anything"), a least upper bound and an optional
//! widening operator.
//!
//! # Module structure
//!
//! - `types`: concrete lattices (`Flat`, `AbstractValue`, `UnderlyingType`)
//! - `ops`: the `Lattice` implementations for those types
//! - `widening`: constants bounding fixed-point iteration

pub mod ops;
pub mod types;
pub mod widening;

pub use types::{AbstractValue, Flat, UnderlyingType};
pub use widening::{DEFAULT_MAX_BLOCK_VISITS, DEFAULT_WIDEN_DELAY};

use std::fmt;

/// A join semi-lattice with bottom and top.
///
/// Implementations must satisfy, for all `a`, `b`, `c`:
///
/// - `a.join(b) == b.join(a)`, `a.join(a) == a`,
///   `a.join(b.join(c)) == a.join(b).join(c)`
/// - `bottom().join(a) == a` and `top().join(a) == top()`
/// - `a.leq(a.join(b))` and `b.leq(a.join(b))`
///
/// `widen` must return an upper bound of both arguments, and any ascending
/// chain built by repeated widening must stabilise after finitely many steps.
/// On finite-height lattices the default (plain join) already does.
pub trait Lattice: Clone + PartialEq + fmt::Debug {
    /// The least element.
    fn bottom() -> Self;

    /// The greatest element.
    fn top() -> Self;

    /// Least upper bound.
    fn join(&self, other: &Self) -> Self;

    /// Partial order: `self ⊑ other`.
    fn leq(&self, other: &Self) -> bool {
        self.join(other) == *other
    }

    /// Upper bound used at loop heads instead of `join`.
    ///
    /// `self` is the previously recorded value, `next` the newly computed one.
    fn widen(&self, next: &Self) -> Self {
        self.join(next)
    }

    fn is_bottom(&self) -> bool {
        *self == Self::bottom()
    }

    fn is_top(&self) -> bool {
        *self == Self::top()
    }
}
