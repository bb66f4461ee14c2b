//! # Memory Primitives
//!
//! Contiguous containers that every other part of the store is built from.
//!
//! ## Design Philosophy
//!
//! - One growth policy everywhere: powers of two, never shrinking implicitly
//! - Removal is always swap-remove, so storage stays dense
//! - Element types are checked at compile time, not at run time

mod dense;
mod vector;

pub use dense::DenseMap;
pub use vector::{GrowVec, MemoryStats};
