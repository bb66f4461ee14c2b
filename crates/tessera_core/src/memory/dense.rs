//! # Dense Map
//!
//! Keyed storage with dense values and O(1) insert, lookup and removal.
//!
//! ```text
//! slots:  { T7 -> 0, T2 -> 1, T9 -> 2 }
//! keys:   [ T7, T2, T9 ]
//! values: [ v7, v2, v9 ]
//!
//! remove(T7):  keys [ T9, T2 ]  values [ v9, v2 ]  slots { T9 -> 0, T2 -> 1 }
//! ```
//!
//! Removal mirrors the container's swap-remove, so enumeration order is
//! insertion order until the first removal and unspecified after it.

use std::collections::HashMap;
use std::hash::Hash;

use super::vector::GrowVec;

/// A dense arena of values addressed by stable keys.
///
/// # Example
///
/// ```rust
/// use tessera_core::DenseMap;
///
/// let mut map: DenseMap<u32, &str> = DenseMap::new();
/// map.insert(10, "ten");
/// map.insert(20, "twenty");
/// assert_eq!(map.get(20), Some(&"twenty"));
///
/// map.remove(10);
/// assert_eq!(map.values().collect::<Vec<_>>(), vec![&"twenty"]);
/// ```
#[derive(Clone, Debug)]
pub struct DenseMap<K, V> {
    /// Key for each dense slot.
    keys: GrowVec<K>,
    /// Values, parallel to `keys`.
    values: GrowVec<V>,
    /// Key to dense slot.
    slots: HashMap<K, usize>,
}

impl<K, V> DenseMap<K, V>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: GrowVec::new(),
            values: GrowVec::new(),
            slots: HashMap::new(),
        }
    }

    /// Returns the number of values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Checks if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks if a key is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.slots.contains_key(&key)
    }

    /// Gets a value by key.
    #[inline]
    #[must_use]
    pub fn get(&self, key: K) -> Option<&V> {
        let slot = *self.slots.get(&key)?;
        Some(self.values.get(slot))
    }

    /// Gets a mutable value by key.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let slot = *self.slots.get(&key)?;
        Some(self.values.get_mut(slot))
    }

    /// Inserts a value, returning the previous value for this key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&slot) = self.slots.get(&key) {
            return Some(std::mem::replace(self.values.get_mut(slot), value));
        }

        let slot = self.values.len();
        self.keys.push(key);
        self.values.push(value);
        self.slots.insert(key, slot);
        None
    }

    /// Returns the value for `key`, inserting `init()` first if absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, init: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let slot = match self.slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.values.len();
                self.keys.push(key);
                self.values.push(init());
                self.slots.insert(key, slot);
                slot
            }
        };
        self.values.get_mut(slot)
    }

    /// Removes a value. The last value takes its slot.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let slot = self.slots.remove(&key)?;
        self.keys.remove_index(slot);
        let value = self.values.remove_index(slot);

        if slot < self.keys.len() {
            let moved = *self.keys.get(slot);
            self.slots.insert(moved, slot);
        }

        Some(value)
    }

    /// Returns two distinct values mutably.
    ///
    /// Returns `None` if either key is missing or both keys are equal.
    pub fn pair_mut(&mut self, a: K, b: K) -> Option<(&mut V, &mut V)> {
        let ia = *self.slots.get(&a)?;
        let ib = *self.slots.get(&b)?;
        if ia == ib {
            return None;
        }

        let values = self.values.as_mut_slice();
        if ia < ib {
            let (low, high) = values.split_at_mut(ib);
            Some((&mut low[ia], &mut high[0]))
        } else {
            let (low, high) = values.split_at_mut(ia);
            Some((&mut high[0], &mut low[ib]))
        }
    }

    /// Removes every value, keeping allocations.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
        self.slots.clear();
    }

    /// Iterates over keys in dense order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.keys.iter().copied()
    }

    /// Iterates over values in dense order.
    pub fn values(&self) -> std::slice::Iter<'_, V> {
        self.values.iter()
    }

    /// Iterates mutably over values in dense order.
    pub fn values_mut(&mut self) -> std::slice::IterMut<'_, V> {
        self.values.iter_mut()
    }

    /// Iterates over `(key, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.keys.iter().copied().zip(self.values.iter())
    }
}

impl<K, V> Default for DenseMap<K, V>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get() {
        let mut map: DenseMap<u32, String> = DenseMap::new();
        assert!(map.insert(1, "one".into()).is_none());
        assert_eq!(map.insert(1, "uno".into()).as_deref(), Some("one"));
        assert_eq!(map.get(1).map(String::as_str), Some("uno"));
        assert_eq!(map.len(), 1);
        assert!(map.get(2).is_none());
    }

    #[test]
    fn test_remove_compacts() {
        let mut map: DenseMap<u32, u32> = DenseMap::new();
        for k in 0..4 {
            map.insert(k, k * 10);
        }

        assert_eq!(map.remove(0), Some(0));
        assert!(!map.contains(0));
        // Last value moved into slot 0.
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(map.get(3), Some(&30));

        assert_eq!(map.remove(2), Some(20));
        assert_eq!(map.remove(2), None);
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(3, &30), (1, &10)]);
    }

    #[test]
    fn test_get_or_insert_with() {
        let mut map: DenseMap<u8, Vec<u8>> = DenseMap::new();
        map.get_or_insert_with(5, Vec::new).push(1);
        map.get_or_insert_with(5, || unreachable!()).push(2);
        assert_eq!(map.get(5), Some(&vec![1, 2]));
    }

    #[test]
    fn test_pair_mut() {
        let mut map: DenseMap<u8, i32> = DenseMap::new();
        map.insert(1, 100);
        map.insert(2, 200);

        let (a, b) = map.pair_mut(2, 1).unwrap();
        std::mem::swap(a, b);
        assert_eq!(map.get(1), Some(&200));
        assert_eq!(map.get(2), Some(&100));

        assert!(map.pair_mut(1, 1).is_none());
        assert!(map.pair_mut(1, 9).is_none());
    }
}
