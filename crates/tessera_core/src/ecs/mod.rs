//! # Entity Component System
//!
//! Archetype storage: every entity lives in exactly one table, chosen by the
//! set of components and the parent it carries.
//!
//! ## Design Philosophy
//!
//! - Components are stored in dense columns for cache efficiency
//! - Entity ids are plain integers; `0` is reserved as null and root
//! - The parent relation is part of the table signature, not a column
//! - Dynamic dispatch only at the column boundary, never per element

mod archetype;
mod component;
mod entity;
mod storage;
mod world;

pub use archetype::{Signature, Table, TableData, TableId, Term};
pub use component::{ChildOf, Component, ComponentId, ComponentInfo, ComponentRegistry, Name};
pub use entity::Entity;
pub use storage::Column;
pub use world::{EntityRecord, World};
