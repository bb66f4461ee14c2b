//! # Tessera Core
//!
//! Archetype entity storage with staged writes and a name hierarchy:
//! - Entities grouped into tables by component set and parent
//! - Per-worker stages that shadow committed rows without touching them
//! - Name lookup and path resolution that see staged edits
//!
//! ## Architecture Rules
//!
//! 1. **Dense storage** - Every column is a contiguous, power-of-two array
//! 2. **Shared reads, private writes** - Workers share `&World` and write to
//!    their own [`Stage`]
//! 3. **Absence is not an error** - Lookups return [`Entity::NULL`]
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{Entity, Stage, World};
//!
//! let mut world = World::new();
//! let ship = world.new_named(Entity::ROOT, "ship").unwrap();
//! let mast = world.new_named(ship, "mast").unwrap();
//! assert_eq!(world.view().lookup_full_path("::ship.mast"), mast);
//!
//! let mut stage = Stage::new(1);
//! let flag = stage.new_named(&world, mast, "flag").unwrap();
//! assert_eq!(stage.view(&world).lookup_full_path("::ship.mast.flag"), flag);
//! assert_eq!(world.view().lookup_full_path("::ship.mast.flag"), Entity::NULL);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod hierarchy;
pub mod memory;
pub mod sync;

pub use config::StoreConfig;
pub use ecs::{
    ChildOf, Column, Component, ComponentId, ComponentInfo, ComponentRegistry, Entity,
    EntityRecord, Name, Signature, Table, TableData, TableId, Term, World,
};
pub use error::{StoreError, StoreResult};
pub use hierarchy::{ChildBatch, ChildTables, TreeIter};
pub use memory::{DenseMap, GrowVec, MemoryStats};
pub use sync::{Stage, StagedLocation, WorldView};
