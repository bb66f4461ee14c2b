//! # Archetype Tables
//!
//! Entities with the exact same signature share one table:
//!
//! ```text
//! Table #4  { Name, Mass, ChildOf(12) }
//!
//! row | entities | Name   | Mass
//! ----+----------+--------+-----
//!   0 |    17    | "hull" | 9.0
//!   1 |    21    | "mast" | 2.5
//! ```
//!
//! Every column is a separate [`GrowVec`](crate::GrowVec), kept row-aligned
//! with the entity column. Rows are appended to every column at once and
//! removed with swap-remove across every column at once, so row indices move
//! around and only the entity id is a stable handle.

use std::fmt;

use super::component::{ChildOf, ComponentId};
use super::entity::Entity;
use super::storage::Column;
use crate::memory::{GrowVec, MemoryStats};

/// One element of a table signature.
///
/// Components sort before relation pairs, so column `i` of a table always
/// matches term `i` of its signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// A data component with its own column.
    Component(ComponentId),
    /// Parent relation. Carries no column.
    ChildOf(Entity),
}

/// Signature of a table - which terms it contains.
///
/// Uses a sorted, deduplicated vector so equal sets compare and hash equal
/// regardless of construction order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    /// Sorted list of terms.
    terms: Vec<Term>,
}

static EMPTY_SIGNATURE: Signature = Signature::empty();

impl Signature {
    /// The signature of an entity with no components.
    #[must_use]
    pub const fn empty() -> Self {
        Self { terms: Vec::new() }
    }

    pub(crate) fn empty_ref() -> &'static Self {
        &EMPTY_SIGNATURE
    }

    /// Creates a signature from terms in any order.
    #[must_use]
    pub fn new(mut terms: Vec<Term>) -> Self {
        terms.sort_unstable();
        terms.dedup();
        Self { terms }
    }

    /// Returns the sorted terms.
    #[inline]
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Returns the number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Checks if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Checks if the signature contains a term.
    #[must_use]
    pub fn contains(&self, term: Term) -> bool {
        self.terms.binary_search(&term).is_ok()
    }

    /// Checks if the signature contains a component.
    #[inline]
    #[must_use]
    pub fn has_component(&self, component: ComponentId) -> bool {
        self.contains(Term::Component(component))
    }

    /// Returns the column index of a component.
    #[must_use]
    pub fn column_of(&self, component: ComponentId) -> Option<usize> {
        self.terms.binary_search(&Term::Component(component)).ok()
    }

    /// Iterates over the data components, in column order.
    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.terms.iter().map_while(|term| match term {
            Term::Component(id) => Some(*id),
            Term::ChildOf(_) => None,
        })
    }

    /// Returns the parent relation, if any.
    #[must_use]
    pub fn child_of(&self) -> Option<ChildOf> {
        self.terms.iter().find_map(|term| match term {
            Term::ChildOf(parent) => Some(ChildOf(*parent)),
            Term::Component(_) => None,
        })
    }

    /// Returns the entity whose children live in tables of this signature.
    ///
    /// Signatures without a parent relation belong to the root.
    #[must_use]
    pub fn parent(&self) -> Entity {
        self.child_of().map_or(Entity::ROOT, ChildOf::target)
    }

    /// Returns this signature plus `term`.
    #[must_use]
    pub fn with(&self, term: Term) -> Self {
        let mut terms = self.terms.clone();
        terms.push(term);
        Self::new(terms)
    }

    /// Returns this signature minus `term`.
    #[must_use]
    pub fn without(&self, term: Term) -> Self {
        Self {
            terms: self.terms.iter().copied().filter(|t| *t != term).collect(),
        }
    }

    /// Returns this signature with its parent replaced by `parent`.
    ///
    /// A null `parent` removes the relation.
    #[must_use]
    pub fn with_parent(&self, parent: Entity) -> Self {
        let mut terms: Vec<Term> = self
            .terms
            .iter()
            .copied()
            .filter(|t| !matches!(t, Term::ChildOf(_)))
            .collect();
        if !parent.is_null() {
            terms.push(Term::ChildOf(parent));
        }
        Self::new(terms)
    }
}

/// Identifier of a table.
///
/// Unique across the canonical store and every stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(u32);

impl TableId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Row storage of a table: entity ids plus one column per component.
///
/// Stage overlays are bare `TableData` shaped like the canonical table they
/// shadow.
#[derive(Debug)]
pub struct TableData {
    /// Entity of each row.
    entities: GrowVec<Entity>,
    /// One column per component, in signature order.
    columns: Vec<Column>,
}

impl TableData {
    pub(crate) fn new(columns: Vec<Column>, capacity: usize) -> Self {
        let mut data = Self {
            entities: GrowVec::new(),
            columns,
        };
        data.reserve(capacity);
        data
    }

    /// Creates empty storage with the same columns.
    pub(crate) fn empty_like(&self, capacity: usize) -> Self {
        Self {
            entities: GrowVec::with_capacity(capacity),
            columns: self.columns.iter().map(|c| c.empty_like(capacity)).collect(),
        }
    }

    /// Returns the number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Checks if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the entity of every row.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        self.entities.as_slice()
    }

    /// Returns every column.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column of a component.
    #[must_use]
    pub fn column(&self, component: ComponentId) -> Option<&Column> {
        self.column_index(component).map(|index| &self.columns[index])
    }

    pub(crate) fn column_mut(&mut self, component: ComponentId) -> Option<&mut Column> {
        self.column_index(component)
            .map(move |index| &mut self.columns[index])
    }

    /// Returns the index of a component's column.
    #[must_use]
    pub fn column_index(&self, component: ComponentId) -> Option<usize> {
        self.columns
            .binary_search_by_key(&component, Column::component)
            .ok()
    }

    /// Returns the row of an entity. Linear scan.
    #[must_use]
    pub fn find_row(&self, entity: Entity) -> Option<usize> {
        self.entities.iter().position(|&e| e == entity)
    }

    /// Appends a row for `entity`, default-initialised in every column.
    pub(crate) fn push_row(&mut self, entity: Entity) -> usize {
        let row = self.entities.len();
        self.entities.push(entity);
        for column in &mut self.columns {
            column.push_default();
        }
        self.debug_check_aligned();
        row
    }

    /// Swap-removes `row` from every column.
    ///
    /// Returns the entity that now occupies `row`, if any.
    pub(crate) fn swap_remove(&mut self, row: usize) -> Option<Entity> {
        self.entities.remove_index(row);
        for column in &mut self.columns {
            column.swap_remove(row);
        }
        self.debug_check_aligned();
        self.entities.as_slice().get(row).copied()
    }

    /// Moves `row` into `dst`, which may have a different signature.
    ///
    /// Shared components move; components missing from `dst` are dropped;
    /// components new in `dst` are default-initialised. Returns the new row in
    /// `dst` and the entity that took over `row` here.
    pub(crate) fn move_row(&mut self, row: usize, dst: &mut Self) -> (usize, Option<Entity>) {
        let dst_row = dst.entities.len();
        GrowVec::move_index(&mut dst.entities, &mut self.entities, row);

        let mut moved = vec![false; self.columns.len()];
        for dst_column in &mut dst.columns {
            match self.column_index(dst_column.component()) {
                Some(index) => {
                    self.columns[index].move_row(row, dst_column);
                    moved[index] = true;
                }
                None => dst_column.push_default(),
            }
        }
        for (column, moved) in self.columns.iter_mut().zip(moved) {
            if !moved {
                column.swap_remove(row);
            }
        }

        self.debug_check_aligned();
        dst.debug_check_aligned();
        (dst_row, self.entities.as_slice().get(row).copied())
    }

    /// Appends a clone of `row` to `dst`, which must have the same columns.
    pub(crate) fn copy_row(&self, row: usize, dst: &mut Self) -> usize {
        debug_assert_eq!(self.columns.len(), dst.columns.len());
        let dst_row = dst.entities.len();
        dst.entities.push(*self.entities.get(row));
        for (src, dst) in self.columns.iter().zip(&mut dst.columns) {
            src.clone_row(row, dst);
        }
        dst.debug_check_aligned();
        dst_row
    }

    /// Reserves room for at least `capacity` rows in every column.
    pub(crate) fn reserve(&mut self, capacity: usize) {
        if capacity == 0 {
            return;
        }
        self.entities.set_min_size(capacity);
        for column in &mut self.columns {
            column.set_min_size(capacity);
        }
    }

    /// Releases slack in every column.
    pub(crate) fn reclaim(&mut self) {
        self.entities.reclaim();
        for column in &mut self.columns {
            column.reclaim();
        }
    }

    /// Returns allocation and usage over the entity list and every column.
    #[must_use]
    pub fn memory(&self) -> MemoryStats {
        let mut stats = self.entities.memory();
        for column in &self.columns {
            stats.accumulate(column.memory());
        }
        stats
    }

    #[inline]
    fn debug_check_aligned(&self) {
        debug_assert!(
            self.columns.iter().all(|c| c.len() == self.entities.len()),
            "columns out of step with entity list"
        );
    }
}

/// A single archetype table - stores all entities with the same signature.
#[derive(Debug)]
pub struct Table {
    /// Identifier.
    id: TableId,
    /// Signature identifying this table. Fixed at creation.
    signature: Signature,
    /// Row storage.
    data: TableData,
}

impl Table {
    pub(crate) fn new(id: TableId, signature: Signature, columns: Vec<Column>, capacity: usize) -> Self {
        debug_assert!(
            columns.iter().map(Column::component).eq(signature.components()),
            "columns do not match signature"
        );
        Self {
            id,
            signature,
            data: TableData::new(columns, capacity),
        }
    }

    /// Returns the table id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the signature of this table.
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the row storage.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &TableData {
        &self.data
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut TableData {
        &mut self.data
    }

    /// Returns the number of rows.
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

    /// Returns the entity of every row.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        self.data.entities()
    }

    /// Returns every column.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        self.data.columns()
    }
}
