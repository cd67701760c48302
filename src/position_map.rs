use crate::newtypes::Position;
use std::collections::BTreeMap;
use std::ops::Bound;

/// An ordered map keyed by [`Position`].
///
/// The simplifier keeps one per input node to hold the
/// mutations still waiting to be assigned to an output
/// node, keyed by site position.
#[derive(Clone, Debug)]
pub struct PositionMap<V> {
    map: BTreeMap<Position, V>,
}

impl<V> Default for PositionMap<V> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<V> PositionMap<V> {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` at `key`, returning the previous value.
    pub fn insert(&mut self, key: Position, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    /// The value at `key`.
    pub fn get(&self, key: Position) -> Option<&V> {
        self.map.get(&key)
    }

    /// Mutable access to the value at `key`.
    pub fn get_mut(&mut self, key: Position) -> Option<&mut V> {
        self.map.get_mut(&key)
    }

    /// The value at `key`, inserting `V::default()` if absent.
    pub fn entry_or_default(&mut self, key: Position) -> &mut V
    where
        V: Default,
    {
        self.map.entry(key).or_default()
    }

    /// Remove and return the value at `key`.
    pub fn remove(&mut self, key: Position) -> Option<V> {
        self.map.remove(&key)
    }

    /// The largest key `<= key`.
    pub fn floor_key(&self, key: Position) -> Option<Position> {
        self.map
            .range((Bound::Unbounded, Bound::Included(key)))
            .next_back()
            .map(|(k, _)| *k)
    }

    /// The smallest key `>= key`.
    pub fn successor_key(&self, key: Position) -> Option<Position> {
        self.map
            .range((Bound::Included(key), Bound::Unbounded))
            .next()
            .map(|(k, _)| *k)
    }

    /// Remove and return, in increasing key order, all entries
    /// with keys in `[left, right)`.
    ///
    /// Costs O(k log n) for k removed entries.
    pub fn drain_range(&mut self, left: Position, right: Position) -> Vec<(Position, V)> {
        if left >= right {
            return vec![];
        }
        let keys = self.map.range(left..right).map(|(k, _)| *k).collect::<Vec<_>>();
        keys.into_iter()
            .filter_map(|k| self.map.remove(&k).map(|v| (k, v)))
            .collect()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over entries in increasing key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Position, &V)> {
        self.map.iter()
    }
}
