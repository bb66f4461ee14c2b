//! # Tree Iteration
//!
//! Visits the children of one parent a table at a time. Each batch is a
//! direct window into a canonical table, so columns can be processed as
//! slices.
//!
//! Only committed tables are visited. Children that exist only in a stage
//! appear once the stage has been merged.

use std::iter::FusedIterator;

use crate::ecs::{Column, Component, Entity, Table, TableId, World};

/// Iterator over the non-empty child tables of a parent.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Entity, Name, World};
///
/// let mut world = World::new();
/// let fleet = world.new_named(Entity::ROOT, "fleet").unwrap();
/// world.new_named(fleet, "a").unwrap();
/// world.new_named(fleet, "b").unwrap();
///
/// let names: Vec<&str> = world
///     .tree_iter(fleet)
///     .flat_map(|batch| batch.column::<Name>().unwrap_or_default())
///     .map(Name::as_str)
///     .collect();
/// assert_eq!(names, ["a", "b"]);
/// ```
#[derive(Clone, Debug)]
pub struct TreeIter<'w> {
    world: &'w World,
    tables: &'w [TableId],
    index: usize,
}

impl<'w> TreeIter<'w> {
    pub(crate) fn new(world: &'w World, parent: Entity) -> Self {
        Self {
            world,
            tables: world.child_tables(parent),
            index: 0,
        }
    }
}

impl<'w> Iterator for TreeIter<'w> {
    type Item = ChildBatch<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&id) = self.tables.get(self.index) {
            self.index += 1;
            match self.world.table(id) {
                Some(table) if !table.is_empty() => {
                    return Some(ChildBatch {
                        world: self.world,
                        table,
                    });
                }
                _ => {}
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.tables.len() - self.index))
    }
}

impl FusedIterator for TreeIter<'_> {}

/// One table's worth of children.
#[derive(Clone, Copy, Debug)]
pub struct ChildBatch<'w> {
    world: &'w World,
    table: &'w Table,
}

impl<'w> ChildBatch<'w> {
    /// Returns the table.
    #[inline]
    #[must_use]
    pub fn table(&self) -> &'w Table {
        self.table
    }

    /// Returns the number of children in this batch.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.table.len()
    }

    /// Returns the children.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &'w [Entity] {
        self.table.entities()
    }

    /// Returns every column, in signature order.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &'w [Column] {
        self.table.columns()
    }

    /// Returns the values of component `C`, if the table has it.
    #[must_use]
    pub fn column<C: Component>(&self) -> Option<&'w [C]> {
        let id = self.world.lookup_component::<C>()?;
        self.table.data().column(id).map(Column::as_slice::<C>)
    }
}
