//! # Name Lookup
//!
//! Resolves a child by name in two tiers:
//!
//! ```text
//! 1. indexed   for T in child_tables[parent] with a Name column:
//!                  scan stage overlay of T      (pending rows win)
//!                  scan canonical T             (skipping shadowed rows)
//! 2. fallback  for T in stage-local tables with ChildOf(parent):
//!                  scan T
//! ```
//!
//! The fallback only runs on a miss, and only finds children whose table was
//! created inside the active stage. Once tables are committed it stays cold.

use crate::ecs::{ComponentId, Entity, Name, TableData};
use crate::sync::WorldView;

impl WorldView<'_> {
    /// Returns the child of `parent` named `name`, or [`Entity::NULL`].
    ///
    /// Children are scanned in table-index order, rows in storage order; with
    /// duplicate names the first match wins.
    #[must_use]
    pub fn lookup_child(&self, parent: Entity, name: &str) -> Entity {
        let world = self.world();
        let stage = self.stage();

        for &table_id in world.child_tables(parent) {
            let table = world.table_by_id(table_id);
            if !table.signature().has_component(ComponentId::NAME) {
                continue;
            }

            if let Some(overlay) = stage.and_then(|stage| stage.overlay(table_id)) {
                if let Some(found) = find_named(overlay, name, |_| true) {
                    return found;
                }
            }
            if let Some(found) = find_named(table.data(), name, |e| !self.is_shadowed(e)) {
                return found;
            }
        }

        let Some(stage) = stage else {
            return Entity::NULL;
        };
        for table in stage.local_tables() {
            if table.signature().parent() != parent
                || !table.signature().has_component(ComponentId::NAME)
            {
                continue;
            }
            if let Some(found) = find_named(table.data(), name, |_| true) {
                tracing::trace!(
                    stage = stage.id(),
                    table = %table.id(),
                    %parent,
                    name,
                    "resolved through stage-local table"
                );
                return found;
            }
        }
        Entity::NULL
    }

    /// Resolves a top-level name.
    ///
    /// A name starting with a decimal digit is read as an entity id instead:
    /// `"42"` and `"42abc"` both return entity 42. Ids that overflow return
    /// [`Entity::NULL`].
    #[must_use]
    pub fn lookup(&self, name: &str) -> Entity {
        match name.as_bytes().first() {
            None => Entity::NULL,
            Some(first) if first.is_ascii_digit() => parse_id(name),
            Some(_) => self.lookup_child(Entity::ROOT, name),
        }
    }
}

/// Returns the first entity in `data` named `name` that passes `keep`.
fn find_named(data: &TableData, name: &str, keep: impl Fn(Entity) -> bool) -> Option<Entity> {
    let names = data.column(ComponentId::NAME)?.as_slice::<Name>();
    names
        .iter()
        .zip(data.entities())
        .find(|(candidate, &entity)| candidate.as_str() == name && keep(entity))
        .map(|(_, &entity)| entity)
}

fn parse_id(name: &str) -> Entity {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    name[..digits]
        .parse::<u64>()
        .map_or(Entity::NULL, Entity::from_raw)
}
