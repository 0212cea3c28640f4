//! Lattice operations for the concrete lattice types.
//!
//! - join (⊔): least upper bound
//! - leq (⊑): partial order
//! - widen (∇): join, forwarded to the qualifier lattice for abstract values
//!
//! `AbstractValue` is ordered pointwise: the underlying types by
//! [`UnderlyingType::is_subtype_of`] and the qualifiers by their own lattice.

use super::types::{AbstractValue, Flat, UnderlyingType};
use super::Lattice;
use std::fmt;

impl<T: Clone + PartialEq + fmt::Debug> Lattice for Flat<T> {
    fn bottom() -> Self {
        Flat::Bottom
    }

    fn top() -> Self {
        Flat::Top
    }

    /// # Examples
    /// ```text
    /// Bottom ⊔ x        = x
    /// Top ⊔ x           = Top
    /// Value(a) ⊔ Value(a) = Value(a)
    /// Value(a) ⊔ Value(b) = Top
    /// ```
    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Flat::Bottom, x) | (x, Flat::Bottom) => x.clone(),
            (Flat::Top, _) | (_, Flat::Top) => Flat::Top,
            (Flat::Value(a), Flat::Value(b)) if a == b => Flat::Value(a.clone()),
            _ => Flat::Top,
        }
    }

    fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Flat::Bottom, _) | (_, Flat::Top) => true,
            (Flat::Value(a), Flat::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl<Q: Lattice> Lattice for AbstractValue<Q> {
    fn bottom() -> Self {
        AbstractValue::Bottom
    }

    fn top() -> Self {
        AbstractValue::new(UnderlyingType::Unknown, Q::top())
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (AbstractValue::Bottom, x) | (x, AbstractValue::Bottom) => x.clone(),
            (
                AbstractValue::Concrete {
                    underlying: ua,
                    qualifier: qa,
                },
                AbstractValue::Concrete {
                    underlying: ub,
                    qualifier: qb,
                },
            ) => AbstractValue::new(ua.join(ub), qa.join(qb)),
        }
    }

    fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (AbstractValue::Bottom, _) => true,
            (_, AbstractValue::Bottom) => false,
            (
                AbstractValue::Concrete {
                    underlying: ua,
                    qualifier: qa,
                },
                AbstractValue::Concrete {
                    underlying: ub,
                    qualifier: qb,
                },
            ) => ua.is_subtype_of(ub) && qa.leq(qb),
        }
    }

    fn widen(&self, next: &Self) -> Self {
        match (self, next) {
            (AbstractValue::Bottom, x) | (x, AbstractValue::Bottom) => x.clone(),
            (
                AbstractValue::Concrete {
                    underlying: ua,
                    qualifier: qa,
                },
                AbstractValue::Concrete {
                    underlying: ub,
                    qualifier: qb,
                },
            ) => AbstractValue::new(ua.join(ub), qa.widen(qb)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Value = AbstractValue<Flat<&'static str>>;

    fn samples() -> Vec<Flat<&'static str>> {
        vec![Flat::Bottom, Flat::Value("a"), Flat::Value("b"), Flat::Top]
    }

    #[test]
    fn test_flat_join_laws() {
        let all = samples();
        for a in &all {
            assert_eq!(a.join(a), *a);
            assert_eq!(Flat::bottom().join(a), *a);
            assert_eq!(Flat::top().join(a), Flat::Top);
            for b in &all {
                assert_eq!(a.join(b), b.join(a));
                assert!(a.leq(&a.join(b)));
                assert!(b.leq(&a.join(b)));
                for c in &all {
                    assert_eq!(a.join(&b.join(c)), a.join(b).join(c));
                }
            }
        }
    }

    #[test]
    fn test_flat_distinct_values_join_to_top() {
        assert_eq!(Flat::Value("a").join(&Flat::Value("b")), Flat::Top);
        assert!(!Flat::Value("a").leq(&Flat::Value("b")));
        assert!(Flat::Value("a").leq(&Flat::Top));
    }

    #[test]
    fn test_abstract_value_bottom_is_identity() {
        let int = Value::new(UnderlyingType::Int, Flat::Value("a"));
        assert_eq!(Value::Bottom.join(&int), int);
        assert_eq!(int.join(&Value::Bottom), int);
        assert!(Value::Bottom.leq(&int));
        assert!(!int.leq(&Value::Bottom));
    }

    #[test]
    fn test_abstract_value_join_mixed_types() {
        let int = Value::new(UnderlyingType::Int, Flat::Value("a"));
        let text = Value::new(UnderlyingType::Text, Flat::Value("a"));
        let joined = int.join(&text);
        assert_eq!(joined.underlying(), Some(&UnderlyingType::Unknown));
        assert_eq!(joined.qualifier(), Flat::Value("a"));
        assert!(int.leq(&joined));
        assert!(!joined.leq(&int));
    }

    #[test]
    fn test_bottom_of_is_least_of_its_type() {
        let least = Value::bottom_of(UnderlyingType::Int);
        let int = Value::new(UnderlyingType::Int, Flat::Value("a"));
        assert!(least.leq(&int));
        assert_eq!(least.join(&int), int);
        assert!(!least.is_bottom());
        assert!(Value::top().is_top());
    }
}
