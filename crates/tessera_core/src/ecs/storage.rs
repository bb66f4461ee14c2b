//! # Column Storage
//!
//! One column holds every value of one component for one table. Columns are
//! type-erased so a table can hold any mix of components, but each one is a
//! plain [`GrowVec<C>`] underneath.
//!
//! Rows are only ever added, removed or moved through the owning table, which
//! keeps every column aligned with the table's entity list.

#[cfg(debug_assertions)]
use std::alloc::Layout;
use std::any::{type_name, Any};
use std::fmt;

use super::component::{Component, ComponentId};
use crate::memory::{GrowVec, MemoryStats};

/// Row operations a column supports without knowing its element type.
trait ColumnData: Send + Sync {
    fn len(&self) -> usize;
    fn push_default(&mut self);
    fn swap_remove(&mut self, row: usize);
    /// Swap-removes `row` and appends it to `dst`.
    fn move_row(&mut self, row: usize, dst: &mut dyn ColumnData);
    /// Appends a clone of `row` to `dst`.
    fn clone_row(&self, row: usize, dst: &mut dyn ColumnData);
    fn empty_like(&self, capacity: usize) -> Box<dyn ColumnData>;
    fn set_min_size(&mut self, count: usize);
    fn reclaim(&mut self);
    fn memory(&self) -> MemoryStats;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> ColumnData for GrowVec<C> {
    fn len(&self) -> usize {
        GrowVec::len(self)
    }

    fn push_default(&mut self) {
        self.add();
    }

    fn swap_remove(&mut self, row: usize) {
        self.remove_index(row);
    }

    fn move_row(&mut self, row: usize, dst: &mut dyn ColumnData) {
        let dst = downcast_mut::<C>(dst);
        GrowVec::move_index(dst, self, row);
    }

    fn clone_row(&self, row: usize, dst: &mut dyn ColumnData) {
        let value = self.get(row).clone();
        downcast_mut::<C>(dst).push(value);
    }

    fn empty_like(&self, capacity: usize) -> Box<dyn ColumnData> {
        Box::new(GrowVec::<C>::with_capacity(capacity))
    }

    fn set_min_size(&mut self, count: usize) {
        GrowVec::set_min_size(self, count);
    }

    fn reclaim(&mut self) {
        GrowVec::reclaim(self);
    }

    fn memory(&self) -> MemoryStats {
        GrowVec::memory(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn downcast_mut<C: Component>(column: &mut dyn ColumnData) -> &mut GrowVec<C> {
    column
        .as_any_mut()
        .downcast_mut::<GrowVec<C>>()
        .unwrap_or_else(|| type_mismatch::<C>())
}

#[cold]
fn type_mismatch<C>() -> ! {
    panic!("column does not store {}", type_name::<C>())
}

/// Type-erased storage for one component of one table.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Column, ComponentId, Name};
///
/// let column = Column::new::<Name>(ComponentId::NAME);
/// assert!(column.is_empty());
/// assert!(column.as_slice::<Name>().is_empty());
/// ```
pub struct Column {
    /// Component stored in this column.
    component: ComponentId,
    /// The values.
    data: Box<dyn ColumnData>,
    /// Element layout, checked on every typed access in debug builds.
    #[cfg(debug_assertions)]
    layout: Layout,
}

impl Column {
    /// Creates an empty column for component `C`.
    #[must_use]
    pub fn new<C: Component>(component: ComponentId) -> Self {
        Self {
            component,
            data: Box::new(GrowVec::<C>::new()),
            #[cfg(debug_assertions)]
            layout: Layout::new::<C>(),
        }
    }

    /// Creates an empty column of the same type, with `capacity` slots.
    #[must_use]
    pub fn empty_like(&self, capacity: usize) -> Self {
        Self {
            component: self.component,
            data: self.data.empty_like(capacity),
            #[cfg(debug_assertions)]
            layout: self.layout,
        }
    }

    /// Returns the component stored in this column.
    #[inline]
    #[must_use]
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Returns the number of values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Returns the values as a typed slice.
    ///
    /// # Panics
    ///
    /// Panics if the column does not store `C`.
    #[must_use]
    pub fn as_slice<C: Component>(&self) -> &[C] {
        self.check_layout::<C>();
        self.data
            .as_any()
            .downcast_ref::<GrowVec<C>>()
            .unwrap_or_else(|| type_mismatch::<C>())
            .as_slice()
    }

    /// Returns the values as a typed mutable slice.
    ///
    /// # Panics
    ///
    /// Panics if the column does not store `C`.
    pub fn as_mut_slice<C: Component>(&mut self) -> &mut [C] {
        self.check_layout::<C>();
        downcast_mut::<C>(self.data.as_mut()).as_mut_slice()
    }

    /// Returns the value at `row`.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, row: usize) -> Option<&C> {
        self.as_slice::<C>().get(row)
    }

    /// Returns the value at `row` mutably.
    #[inline]
    pub fn get_mut<C: Component>(&mut self, row: usize) -> Option<&mut C> {
        self.as_mut_slice::<C>().get_mut(row)
    }

    /// Returns allocation and usage in element units.
    #[must_use]
    pub fn memory(&self) -> MemoryStats {
        self.data.memory()
    }

    pub(crate) fn push_default(&mut self) {
        self.data.push_default();
    }

    pub(crate) fn swap_remove(&mut self, row: usize) {
        self.data.swap_remove(row);
    }

    pub(crate) fn move_row(&mut self, row: usize, dst: &mut Self) {
        debug_assert_eq!(self.component, dst.component);
        self.data.move_row(row, dst.data.as_mut());
    }

    pub(crate) fn clone_row(&self, row: usize, dst: &mut Self) {
        debug_assert_eq!(self.component, dst.component);
        self.data.clone_row(row, dst.data.as_mut());
    }

    pub(crate) fn set_min_size(&mut self, count: usize) {
        self.data.set_min_size(count);
    }

    pub(crate) fn reclaim(&mut self) {
        self.data.reclaim();
    }

    #[inline]
    fn check_layout<C>(&self) {
        #[cfg(debug_assertions)]
        debug_assert_eq!(
            self.layout,
            Layout::new::<C>(),
            "column {} accessed as {}",
            self.component,
            type_name::<C>()
        );
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("component", &self.component)
            .field("len", &self.len())
            .finish()
    }
}
