//! # Hierarchy
//!
//! Parent/child relations, name lookup and paths.
//!
//! ## Design Philosophy
//!
//! - A child's parent is part of its table signature, so every row of a
//!   table shares one parent
//! - The index stores tables, not entities: finding children is a walk over
//!   a handful of tables
//! - Absence is a value: lookups return [`Entity::NULL`](crate::Entity::NULL),
//!   never an error
//!
//! Lookup and path queries are methods on [`WorldView`](crate::WorldView), so
//! they see a stage's pending edits whenever one is active.

mod index;
mod lookup;
mod path;
mod tree;

pub use index::ChildTables;
pub use tree::{ChildBatch, TreeIter};
