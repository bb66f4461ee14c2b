//! # Staged Writes
//!
//! Workers never write to the canonical store while it is shared. Each one
//! owns a [`Stage`] and reads through a [`WorldView`]:
//!
//! ```text
//! Worker 1:  &mut Stage A ──┐
//!                           ├──> &World   (read-only, shared)
//! Worker 2:  &mut Stage B ──┘
//!
//! read(e) = Stage A overlay, if A has touched e
//!         = canonical row, otherwise
//! ```
//!
//! A stage holds two kinds of pending data:
//!
//! - **Overlays**: rows destined for a canonical table, keyed by its id
//! - **Local tables**: tables whose signature the canonical store has never
//!   seen, created mid-transaction
//!
//! Merging a stage back into the world happens at an external sync point.

mod stage;
mod view;

pub use stage::{Stage, StagedLocation};
pub use view::WorldView;
