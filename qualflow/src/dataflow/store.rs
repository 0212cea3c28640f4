//! Stores: the abstract state at one program point.
//!
//! A [`Store`] maps trackable entities (locals, fields, pure expressions) to
//! lattice values. It is itself a lattice:
//!
//! - `Bottom` means the point is statically unreachable and is the identity
//!   of `join`
//! - an entity absent from a concrete store is at top (nothing known), so
//!   joining two concrete stores keeps only the entities both know about
//! - the empty concrete store is top

use crate::lattice::Lattice;
use qualflow_cfg::Entity;
use std::collections::BTreeMap;

/// Abstract state at one program point.
///
/// # Example
/// ```
/// use qualflow::dataflow::Store;
/// use qualflow::lattice::{Flat, Lattice};
/// use qualflow_cfg::Entity;
///
/// let x = Entity::local("x");
/// let mut left: Store<Flat<i32>> = Store::new();
/// left.set(x.clone(), Flat::Value(1));
/// let mut right = Store::new();
/// right.set(x.clone(), Flat::Value(1));
///
/// assert_eq!(left.join(&right).get(&x), Some(&Flat::Value(1)));
/// assert_eq!(Store::bottom().join(&left), left);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Store<V> {
    /// Unreachable
    Bottom,
    /// Known entity values; absent entities are at top
    Concrete(BTreeMap<Entity, V>),
}

impl<V: Lattice> Store<V> {
    /// An empty reachable store (every entity at top).
    pub fn new() -> Self {
        Store::Concrete(BTreeMap::new())
    }

    pub fn is_reachable(&self) -> bool {
        !matches!(self, Store::Bottom)
    }

    /// The recorded value of `entity`, if the store holds one.
    pub fn get(&self, entity: &Entity) -> Option<&V> {
        match self {
            Store::Bottom => None,
            Store::Concrete(map) => map.get(entity),
        }
    }

    /// The value of `entity` at this point.
    ///
    /// Absent entities are at top; every entity of a bottom store is bottom.
    pub fn value_of(&self, entity: &Entity) -> V {
        match self {
            Store::Bottom => V::bottom(),
            Store::Concrete(map) => map.get(entity).cloned().unwrap_or_else(V::top),
        }
    }

    /// Records `value` for `entity`.
    ///
    /// Top values are not stored. Setting a value in a bottom store has no
    /// effect: nothing is computed at unreachable points.
    pub fn set(&mut self, entity: Entity, value: V) {
        if let Store::Concrete(map) = self {
            if value.is_top() {
                map.remove(&entity);
            } else {
                map.insert(entity, value);
            }
        }
    }

    /// Forgets `entity` (moves it to top).
    pub fn remove(&mut self, entity: &Entity) {
        if let Store::Concrete(map) = self {
            map.remove(entity);
        }
    }

    /// Forgets every field entity; used after calls that may write fields.
    pub fn invalidate_fields(&mut self) {
        if let Store::Concrete(map) = self {
            map.retain(|entity, _| !entity.is_field());
        }
    }

    /// Entities with a recorded value, in order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        let map = match self {
            Store::Bottom => None,
            Store::Concrete(map) => Some(map),
        };
        map.into_iter().flat_map(|map| map.keys())
    }

    pub fn len(&self) -> usize {
        match self {
            Store::Bottom => 0,
            Store::Concrete(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn combine(&self, other: &Self, op: impl Fn(&V, &V) -> V) -> Self {
        match (self, other) {
            (Store::Bottom, s) | (s, Store::Bottom) => s.clone(),
            (Store::Concrete(a), Store::Concrete(b)) => {
                let mut merged = BTreeMap::new();
                for (entity, left) in a {
                    if let Some(right) = b.get(entity) {
                        let value = op(left, right);
                        if !value.is_top() {
                            merged.insert(entity.clone(), value);
                        }
                    }
                }
                Store::Concrete(merged)
            }
        }
    }
}

impl<V: Lattice> Default for Store<V> {
    fn default() -> Self {
        Store::new()
    }
}

impl<V: Lattice> Lattice for Store<V> {
    fn bottom() -> Self {
        Store::Bottom
    }

    fn top() -> Self {
        Store::new()
    }

    fn join(&self, other: &Self) -> Self {
        self.combine(other, V::join)
    }

    fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Store::Bottom, _) => true,
            (_, Store::Bottom) => false,
            (Store::Concrete(a), Store::Concrete(b)) => b
                .iter()
                .all(|(entity, right)| a.get(entity).is_some_and(|left| left.leq(right))),
        }
    }

    fn widen(&self, next: &Self) -> Self {
        self.combine(next, V::widen)
    }

    fn is_bottom(&self) -> bool {
        matches!(self, Store::Bottom)
    }
}
