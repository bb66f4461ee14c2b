//! # Store Error Types
//!
//! Errors returned by write operations and configuration loading.
//!
//! Lookups never fail: a missing entity or path segment is reported as
//! [`Entity::NULL`](crate::Entity::NULL).

use thiserror::Error;

use crate::ecs::Entity;

/// Errors that can occur in the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Entity is not alive in the world or the stage.
    #[error("entity not found: {0}")]
    EntityNotFound(Entity),

    /// Entity was deleted by the stage it is being written through.
    #[error("entity {0} was deleted in this stage")]
    EntityDeleted(Entity),

    /// Attempted to make an entity its own parent.
    #[error("entity {0} cannot be its own parent")]
    SelfParent(Entity),

    /// Attempted to make an entity a child of one of its own descendants.
    #[error("entity {entity} is an ancestor of {parent}, reparenting would create a cycle")]
    Cycle {
        /// Entity being reparented.
        entity: Entity,
        /// Requested parent.
        parent: Entity,
    },

    /// Configuration value out of range or unparsable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration {path}: {reason}")]
    ConfigIo {
        /// File that was read.
        path: String,
        /// Underlying IO error.
        reason: String,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
