//! # World View
//!
//! Read access to the world, optionally through one stage. Every read checks
//! the stage first: an entity the stage has touched is read from the stage's
//! copy, even when a canonical row still exists.

use super::stage::{Stage, StagedLocation};
use crate::ecs::{Component, ComponentId, Entity, Name, Signature, TableData, World};

/// Read handle over the world plus an optional active stage.
///
/// Lookup, path and hierarchy queries are defined on this type.
#[derive(Clone, Copy, Debug)]
pub struct WorldView<'a> {
    /// Committed data.
    world: &'a World,
    /// Pending edits that take priority over `world`.
    stage: Option<&'a Stage>,
}

/// Resolved storage of an entity.
struct Located<'a> {
    signature: &'a Signature,
    /// `None` for an entity with no components.
    row: Option<(&'a TableData, usize)>,
}

impl<'a> WorldView<'a> {
    /// Creates a view of committed data only.
    #[must_use]
    pub fn canonical(world: &'a World) -> Self {
        Self { world, stage: None }
    }

    /// Creates a view with `stage` layered over `world`.
    #[must_use]
    pub fn staged(world: &'a World, stage: &'a Stage) -> Self {
        Self {
            world,
            stage: Some(stage),
        }
    }

    /// Returns the underlying world.
    #[inline]
    #[must_use]
    pub fn world(&self) -> &'a World {
        self.world
    }

    /// Returns the active stage.
    #[inline]
    #[must_use]
    pub fn stage(&self) -> Option<&'a Stage> {
        self.stage
    }

    /// Checks if `entity` is alive in this view.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.locate(entity).is_some()
    }

    /// Returns component `C` of `entity`.
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&'a C> {
        let id = self.world.lookup_component::<C>()?;
        self.read(entity, id)
    }

    /// Returns the name of `entity`.
    #[must_use]
    pub fn name_of(&self, entity: Entity) -> Option<&'a str> {
        self.read::<Name>(entity, ComponentId::NAME).map(Name::as_str)
    }

    /// Returns the parent of `entity`, or [`Entity::NULL`] at the root.
    #[must_use]
    pub fn parent_of(&self, entity: Entity) -> Entity {
        self.signature_of(entity).map_or(Entity::NULL, Signature::parent)
    }

    /// Returns the signature of `entity`.
    #[must_use]
    pub fn signature_of(&self, entity: Entity) -> Option<&'a Signature> {
        self.locate(entity).map(|located| located.signature)
    }

    /// Checks if the active stage owns `entity`, hiding its canonical row.
    #[inline]
    pub(crate) fn is_shadowed(&self, entity: Entity) -> bool {
        self.stage.is_some_and(|stage| stage.is_shadowed(entity))
    }

    fn read<C: Component>(&self, entity: Entity, id: ComponentId) -> Option<&'a C> {
        let (data, row) = self.locate(entity)?.row?;
        data.column(id)?.get::<C>(row)
    }

    fn locate(&self, entity: Entity) -> Option<Located<'a>> {
        let world = self.world;
        if let Some(stage) = self.stage {
            if let Some(location) = stage.location(entity) {
                return match location {
                    StagedLocation::Overlay { table, row } => Some(Located {
                        signature: world.table_by_id(table).signature(),
                        row: stage.overlay(table).map(|data| (data, row)),
                    }),
                    StagedLocation::Local { table, row } => {
                        stage.local_table(table).map(|table| Located {
                            signature: table.signature(),
                            row: Some((table.data(), row)),
                        })
                    }
                    StagedLocation::Detached => Some(Located {
                        signature: Signature::empty_ref(),
                        row: None,
                    }),
                    StagedLocation::Deleted => None,
                };
            }
        }

        let record = world.record(entity)?;
        Some(match record.table {
            Some(table) => {
                let table = world.table_by_id(table);
                Located {
                    signature: table.signature(),
                    row: Some((table.data(), record.row)),
                }
            }
            None => Located {
                signature: Signature::empty_ref(),
                row: None,
            },
        })
    }
}
