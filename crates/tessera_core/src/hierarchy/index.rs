//! # Child Table Index
//!
//! Maps every parent entity to the tables that hold its children:
//!
//! ```text
//! ROOT ──> [T1 {Name}, T2 {Name, Mass}]
//!   12 ──> [T4 {Name, ChildOf(12)}, T7 {Name, Mass, ChildOf(12)}]
//! ```
//!
//! A table's parent is fixed by its signature, so each table is registered
//! exactly once, when it is created. Tables with no `ChildOf` term are
//! children of [`Entity::ROOT`].

use std::collections::HashMap;

use crate::ecs::{Entity, Table, TableId};
use crate::memory::GrowVec;

/// Parent to child-table index of the canonical store.
#[derive(Debug, Default)]
pub struct ChildTables {
    /// Table ids per parent, in creation order.
    by_parent: HashMap<Entity, GrowVec<TableId>>,
}

impl ChildTables {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `table` under the parent named by its signature.
    pub fn register(&mut self, table: &Table) {
        let parent = table.signature().parent();
        let tables = self.by_parent.entry(parent).or_default();
        debug_assert!(!tables.iter().any(|&id| id == table.id()), "table registered twice");
        tables.push(table.id());
    }

    /// Removes a table from its parent's list. Order is not preserved.
    pub fn unregister(&mut self, table: &Table) {
        let parent = table.signature().parent();
        let Some(tables) = self.by_parent.get_mut(&parent) else {
            return;
        };
        if let Some(index) = tables.iter().position(|&id| id == table.id()) {
            tables.remove_index(index);
        }
        if tables.is_empty() {
            self.by_parent.remove(&parent);
        }
    }

    /// Returns the tables holding children of `parent`.
    #[inline]
    #[must_use]
    pub fn tables_of(&self, parent: Entity) -> &[TableId] {
        self.by_parent
            .get(&parent)
            .map(GrowVec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the number of parents with at least one child table.
    #[must_use]
    pub fn parent_count(&self) -> usize {
        self.by_parent.len()
    }
}
