//! # Growable Vector
//!
//! The contiguous dynamic array underneath every column and id list.
//!
//! ## Growth Policy
//!
//! ```text
//! count:     1  2  3  4  5  6  7  8  9
//! capacity:  1  2  4  4  8  8  8  8  16
//! ```
//!
//! Capacity is always the smallest power of two that covers the largest count
//! ever requested, or an explicit floor set through `with_capacity` /
//! `set_min_size`. It only goes down through [`GrowVec::reclaim`].
//!
//! ## Removal
//!
//! Removal is swap-remove: the last element is moved into the hole. Indices
//! are NOT stable across removals.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Index, IndexMut};

use bytemuck::{Pod, Zeroable};

/// Memory usage of a container, in element units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Number of element slots allocated.
    pub allocated: usize,
    /// Number of element slots in use.
    pub used: usize,
}

impl MemoryStats {
    /// Adds another set of stats to this one.
    #[inline]
    pub fn accumulate(&mut self, other: Self) {
        self.allocated += other.allocated;
        self.used += other.used;
    }
}

/// A contiguous, power-of-two growing array.
///
/// # Invalidation
///
/// Any call that can grow the vector (`add`, `push`, `add_n`, `set_*`, `grow`)
/// may relocate the backing memory. The borrow checker enforces that no
/// reference into the vector survives such a call.
///
/// # Example
///
/// ```rust
/// use tessera_core::GrowVec;
///
/// let mut ids: GrowVec<u64> = GrowVec::new();
/// ids.push(7);
/// ids.push(8);
/// ids.push(9);
/// assert_eq!(ids.capacity(), 4);
///
/// ids.remove_index(0);
/// assert_eq!(ids.as_slice(), &[9, 8]);
/// ```
pub struct GrowVec<T> {
    /// Element storage. `data.len()` is the count.
    data: Vec<T>,
    /// Logical capacity, tracked separately so the policy does not depend on
    /// the allocator's rounding.
    size: usize,
}

impl<T> GrowVec<T> {
    /// Rejects zero-sized element types at compile time.
    const NON_ZERO_SIZED: () = assert!(
        std::mem::size_of::<T>() != 0,
        "GrowVec cannot store zero-sized elements"
    );

    /// Creates an empty vector without allocating.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_ZERO_SIZED;
        Self {
            data: Vec::new(),
            size: 0,
        }
    }

    /// Creates an empty vector with exactly `capacity` slots reserved.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut vector = Self::new();
        vector.resize_storage(capacity);
        vector
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of element slots allocated.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.size
    }

    /// Appends a value and returns a reference to it.
    ///
    /// Grows to the next power of two when full.
    #[inline]
    pub fn push(&mut self, value: T) -> &mut T {
        let index = self.data.len();
        self.reserve_for(index + 1);
        self.data.push(value);
        &mut self.data[index]
    }

    /// Appends a default-initialised slot and returns it for the caller to fill.
    #[inline]
    pub fn add(&mut self) -> &mut T
    where
        T: Default,
    {
        self.push(T::default())
    }

    /// Appends `count` default-initialised contiguous slots.
    pub fn add_n(&mut self, count: usize) -> &mut [T]
    where
        T: Default,
    {
        let start = self.data.len();
        self.reserve_for(start + count);
        self.data.resize_with(start + count, T::default);
        &mut self.data[start..]
    }

    /// Returns the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> &T {
        debug_assert!(index < self.len(), "index {index} out of bounds (count {})", self.len());
        &self.data[index]
    }

    /// Returns the element at `index` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len(), "index {index} out of bounds (count {})", self.len());
        &mut self.data[index]
    }

    /// Returns the first element.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.data.first()
    }

    /// Returns the last element.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.data.last()
    }

    /// Returns the last element mutably.
    #[inline]
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.data.last_mut()
    }

    /// Drops the last element. O(1), nothing is moved. No-op when empty.
    #[inline]
    pub fn remove_last(&mut self) {
        self.data.pop();
    }

    /// Removes and returns the last element, or `None` when empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.data.pop()
    }

    /// Removes the element at `index` by moving the last element into its slot.
    ///
    /// When `index` is the last slot nothing is moved.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn remove_index(&mut self, index: usize) -> T {
        debug_assert!(index < self.len(), "index {index} out of bounds (count {})", self.len());
        self.data.swap_remove(index)
    }

    /// Swap-removes element `index` from `src` and appends it to `dst`.
    ///
    /// Used when an entity transitions between tables.
    pub fn move_index<'a>(dst: &'a mut Self, src: &mut Self, index: usize) -> &'a mut T {
        let value = src.remove_index(index);
        dst.push(value)
    }

    /// Ensures capacity for at least `count` elements. Returns the capacity.
    pub fn set_min_size(&mut self, count: usize) -> usize {
        if self.size < count {
            self.set_size(count);
        }
        self.size
    }

    /// Grows capacity to hold `count` elements, rounded up to a power of two.
    ///
    /// Never shrinks: a request below the current capacity (or count) leaves
    /// the vector untouched. Returns the capacity.
    pub fn set_size(&mut self, count: usize) -> usize {
        let count = count.max(self.data.len());
        if self.size < count {
            self.resize_storage(next_size(count));
        }
        self.size
    }

    /// Reserves room for `additional` more elements without changing the count.
    pub fn grow(&mut self, additional: usize) -> usize {
        self.set_size(self.data.len() + additional)
    }

    /// Shrinks capacity down to the current count.
    pub fn reclaim(&mut self) {
        if self.size > self.data.len() {
            self.resize_storage(self.data.len());
        }
    }

    /// Removes all elements, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Sorts the elements in place.
    ///
    /// Reorders rows: containers that run parallel to this one must be
    /// reordered the same way.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.data.sort_by(compare);
    }

    /// Returns allocation and usage in element units.
    #[inline]
    #[must_use]
    pub fn memory(&self) -> MemoryStats {
        MemoryStats {
            allocated: self.size,
            used: self.data.len(),
        }
    }

    /// Returns the elements as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterates over the elements.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterates mutably over the elements.
    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    #[inline]
    fn reserve_for(&mut self, count: usize) {
        if count > self.size {
            self.resize_storage(next_size(count));
        }
    }

    fn resize_storage(&mut self, size: usize) {
        debug_assert!(size >= self.data.len());
        if size > self.data.capacity() {
            self.data.reserve_exact(size - self.data.len());
        } else {
            self.data.shrink_to(size);
        }
        self.size = size;
    }
}

impl<T: Clone> GrowVec<T> {
    /// Creates a vector holding a copy of `values`, with capacity equal to its length.
    #[must_use]
    pub fn from_slice(values: &[T]) -> Self {
        let mut vector = Self::with_capacity(values.len());
        vector.data.extend_from_slice(values);
        vector
    }
}

impl<T: Zeroable> GrowVec<T> {
    /// Sets the count to exactly `count`.
    ///
    /// Growing past capacity reallocates. New slots are zeroed.
    pub fn set_count(&mut self, count: usize) {
        if count > self.size {
            self.set_size(count);
        }
        self.data.resize_with(count, T::zeroed);
    }

    /// Ensures the count is at least `count`, zero-filling new slots.
    pub fn set_min_count(&mut self, count: usize) {
        self.set_min_size(count);
        if self.data.len() < count {
            self.set_count(count);
        }
    }

    /// Zeroes every element in place.
    pub fn zero(&mut self) {
        for slot in &mut self.data {
            *slot = T::zeroed();
        }
    }
}

impl<T: Pod> GrowVec<T> {
    /// Returns the used portion of the storage as raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Next power of two covering `count`.
#[inline]
fn next_size(count: usize) -> usize {
    count
        .checked_next_power_of_two()
        .unwrap_or_else(|| capacity_overflow(count))
}

#[cold]
fn capacity_overflow(count: usize) -> ! {
    panic!("GrowVec capacity overflow: cannot hold {count} elements")
}

impl<T> Default for GrowVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for GrowVec<T> {
    fn clone(&self) -> Self {
        let mut vector = Self::with_capacity(self.size);
        vector.data.extend_from_slice(&self.data);
        vector
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowVec")
            .field("count", &self.data.len())
            .field("capacity", &self.size)
            .field("data", &self.data)
            .finish()
    }
}

impl<T> Index<usize> for GrowVec<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        self.get(index)
    }
}

impl<T> IndexMut<usize> for GrowVec<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.get_mut(index)
    }
}

impl<T> Extend<T> for GrowVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for GrowVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vector = Self::new();
        vector.extend(iter);
        vector
    }
}

impl<'a, T> IntoIterator for &'a GrowVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_grows_by_powers_of_two() {
        let mut v: GrowVec<u32> = GrowVec::new();
        assert_eq!(v.capacity(), 0);

        let expected = [1, 2, 4, 4, 8, 8, 8, 8, 16];
        for (i, &cap) in expected.iter().enumerate() {
            *v.add() = i as u32;
            assert_eq!(v.len(), i + 1);
            assert_eq!(v.capacity(), cap);
        }
    }

    #[test]
    fn test_add_n_is_contiguous() {
        let mut v: GrowVec<u16> = GrowVec::new();
        v.push(1);
        let slots = v.add_n(5);
        assert_eq!(slots.len(), 5);
        slots.copy_from_slice(&[2, 3, 4, 5, 6]);

        assert_eq!(v.as_slice(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(v.capacity(), 8);
    }

    #[test]
    fn test_first_last() {
        let mut v: GrowVec<i64> = GrowVec::new();
        assert!(v.first().is_none());
        assert!(v.last().is_none());

        v.extend([10, 20, 30]);
        assert_eq!(v.first(), Some(&10));
        assert_eq!(v.last(), Some(&30));
    }

    #[test]
    fn test_remove_last_and_pop() {
        let mut v: GrowVec<u8> = [1, 2, 3].into_iter().collect();
        v.remove_last();
        assert_eq!(v.as_slice(), &[1, 2]);

        assert_eq!(v.pop(), Some(2));
        assert_eq!(v.pop(), Some(1));
        assert_eq!(v.pop(), None);

        // No-op on empty.
        v.remove_last();
        assert!(v.is_empty());
        assert_eq!(v.capacity(), 4);
    }

    #[test]
    fn test_remove_index_swaps_last_in() {
        let mut v: GrowVec<char> = "abcde".chars().collect();
        assert_eq!(v.remove_index(1), 'b');
        assert_eq!(v.as_slice(), &['a', 'e', 'c', 'd']);

        assert_eq!(v.remove_index(3), 'd');
        assert_eq!(v.as_slice(), &['a', 'e', 'c']);
    }

    #[test]
    fn test_move_index() {
        let mut src: GrowVec<u32> = [1, 2, 3].into_iter().collect();
        let mut dst: GrowVec<u32> = GrowVec::new();

        let moved = GrowVec::move_index(&mut dst, &mut src, 0);
        assert_eq!(*moved, 1);
        assert_eq!(src.as_slice(), &[3, 2]);
        assert_eq!(dst.as_slice(), &[1]);
    }

    #[test]
    fn test_explicit_sizes() {
        let mut v: GrowVec<u64> = GrowVec::with_capacity(3);
        assert_eq!(v.capacity(), 3);

        // Already large enough.
        assert_eq!(v.set_min_size(2), 3);
        // Rounded up to a power of two.
        assert_eq!(v.set_min_size(5), 8);
        // Never shrinks.
        assert_eq!(v.set_size(1), 8);

        v.extend([1, 2, 3]);
        assert_eq!(v.grow(10), 16);
        assert_eq!(v.len(), 3);

        v.reclaim();
        assert_eq!(v.capacity(), 3);
        assert_eq!(v.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_set_count_zero_fills() {
        let mut v: GrowVec<u32> = GrowVec::new();
        v.push(9);
        v.set_count(5);
        assert_eq!(v.as_slice(), &[9, 0, 0, 0, 0]);
        assert_eq!(v.capacity(), 8);

        v.set_count(2);
        assert_eq!(v.as_slice(), &[9, 0]);
        assert_eq!(v.capacity(), 8);

        v.set_min_count(1);
        assert_eq!(v.len(), 2);
        v.set_min_count(3);
        assert_eq!(v.as_slice(), &[9, 0, 0]);
    }

    #[test]
    fn test_zero_and_bytes() {
        let mut v: GrowVec<u16> = [0x0102, 0x0304].into_iter().collect();
        assert_eq!(v.as_bytes().len(), 4);

        v.zero();
        assert_eq!(v.as_slice(), &[0, 0]);
        assert!(v.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sort_and_memory() {
        let mut v: GrowVec<i32> = [3, -1, 2].into_iter().collect();
        v.sort_by(|a, b| a.cmp(b));
        assert_eq!(v.as_slice(), &[-1, 2, 3]);
        assert_eq!(v.memory(), MemoryStats { allocated: 4, used: 3 });
    }

    #[test]
    fn test_clone_keeps_capacity() {
        let mut v: GrowVec<String> = GrowVec::with_capacity(16);
        v.push("a".to_owned());
        let copy = v.clone();
        assert_eq!(copy.capacity(), 16);
        assert_eq!(copy.as_slice(), v.as_slice());
    }

    #[test]
    fn test_from_slice() {
        let v = GrowVec::from_slice(&[1u8, 2, 3]);
        assert_eq!(v.capacity(), 3);
        assert_eq!(v[2], 3);
    }

    proptest! {
        #[test]
        fn prop_capacity_is_next_power_of_two(n in 1usize..2048) {
            let mut v: GrowVec<u64> = GrowVec::new();
            for i in 0..n {
                v.push(i as u64);
            }
            prop_assert_eq!(v.len(), n);
            prop_assert_eq!(v.capacity(), n.next_power_of_two());
        }

        #[test]
        fn prop_capacity_respects_floor(floor in 1usize..512, n in 0usize..512) {
            let mut v: GrowVec<u32> = GrowVec::new();
            v.set_min_size(floor);
            for i in 0..n {
                v.push(i as u32);
            }
            let expected = floor.next_power_of_two().max(n.next_power_of_two());
            prop_assert_eq!(v.capacity(), expected);
        }

        #[test]
        fn prop_remove_index_moves_last(len in 1usize..256, pick in any::<prop::sample::Index>()) {
            let mut v: GrowVec<usize> = (0..len).collect();
            let i = pick.index(len);
            let last = *v.last().unwrap();

            let removed = v.remove_index(i);
            prop_assert_eq!(removed, i);
            prop_assert_eq!(v.len(), len - 1);
            if i < len - 1 {
                prop_assert_eq!(v[i], last);
            }
            for j in 0..v.len() {
                if j != i {
                    prop_assert_eq!(v[j], j);
                }
            }
        }
    }
}
