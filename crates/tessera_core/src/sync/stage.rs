//! # Stage
//!
//! Per-worker write buffer over a shared [`World`].
//!
//! The first write to a committed entity copies its canonical row into the
//! stage's overlay for that table. From then on the stage owns the entity:
//! renames, moves and deletes only touch staged data, and reads through
//! [`Stage::view`] see the staged version.
//!
//! ```text
//!            canonical T3 {Name}        stage overlay T3
//! row 0      17 "hull"                  17 "keel"   <- renamed here
//! row 1      21 "mast"
//! ```

use std::collections::HashMap;

use super::view::WorldView;
use crate::ecs::{Component, ComponentId, Entity, Name, Signature, Table, TableData, TableId, Term, World};
use crate::error::{StoreError, StoreResult};
use crate::memory::{DenseMap, MemoryStats};

/// Where a stage keeps an entity it has touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StagedLocation {
    /// Row in the overlay of a canonical table.
    Overlay {
        /// Canonical table the overlay shadows.
        table: TableId,
        /// Row within the overlay.
        row: usize,
    },
    /// Row in a table only this stage knows about.
    Local {
        /// Stage-local table.
        table: TableId,
        /// Row within the table.
        row: usize,
    },
    /// Alive, with no components.
    Detached,
    /// Deleted in this stage.
    Deleted,
}

/// Row storage owned by a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Overlay(TableId),
    Local(TableId),
}

impl Slot {
    fn at(self, row: usize) -> StagedLocation {
        match self {
            Self::Overlay(table) => StagedLocation::Overlay { table, row },
            Self::Local(table) => StagedLocation::Local { table, row },
        }
    }
}

impl StagedLocation {
    fn slot(self) -> Option<(Slot, usize)> {
        match self {
            Self::Overlay { table, row } => Some((Slot::Overlay(table), row)),
            Self::Local { table, row } => Some((Slot::Local(table), row)),
            Self::Detached | Self::Deleted => None,
        }
    }
}

/// Pending edits of one worker.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Entity, Stage, World};
///
/// let mut world = World::new();
/// let ship = world.new_named(Entity::ROOT, "ship").unwrap();
///
/// let mut stage = Stage::new(1);
/// stage.set_name(&world, ship, "boat").unwrap();
///
/// assert_eq!(stage.view(&world).lookup("boat"), ship);
/// assert_eq!(world.view().lookup("boat"), Entity::NULL);
/// ```
#[derive(Debug)]
pub struct Stage {
    /// Stage id, for diagnostics.
    id: u32,
    /// Pending rows per canonical table, shaped like that table.
    overlays: DenseMap<TableId, TableData>,
    /// Tables created by this stage.
    tables: DenseMap<TableId, Table>,
    /// Signature to stage-local table.
    local_index: HashMap<Signature, TableId>,
    /// Every entity this stage has touched.
    records: HashMap<Entity, StagedLocation>,
}

impl Stage {
    /// Creates an empty stage.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            overlays: DenseMap::new(),
            tables: DenseMap::new(),
            local_index: HashMap::new(),
            records: HashMap::new(),
        }
    }

    /// Returns the stage id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates an entity with no components, visible only through this stage.
    pub fn new_entity(&mut self, world: &World) -> Entity {
        let entity = world.alloc_entity();
        self.records.insert(entity, StagedLocation::Detached);
        entity
    }

    /// Creates a named entity under `parent`. A null parent means the root.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EntityNotFound`] if `parent` is not alive in this
    /// stage's view.
    pub fn new_named(&mut self, world: &World, parent: Entity, name: &str) -> StoreResult<Entity> {
        if !parent.is_null() && !self.view(world).is_alive(parent) {
            return Err(StoreError::EntityNotFound(parent));
        }

        let entity = self.new_entity(world);
        let target = Signature::new(vec![Term::Component(ComponentId::NAME)]).with_parent(parent);
        let location = self.move_to(world, entity, &target)?;
        self.write(location, ComponentId::NAME, Name::new(name));
        Ok(entity)
    }

    /// Sets component `C` on `entity`, adding it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EntityNotFound`] for an unknown entity and
    /// [`StoreError::EntityDeleted`] if this stage deleted it.
    pub fn set<C: Component>(&mut self, world: &World, entity: Entity, value: C) -> StoreResult<()> {
        let id = world.component_id::<C>();
        let mut location = self.ensure_staged(world, entity)?;
        let signature = self.signature_at(world, location);
        if !signature.has_component(id) {
            let target = signature.with(Term::Component(id));
            location = self.move_to(world, entity, &target)?;
        }
        self.write(location, id, value);
        Ok(())
    }

    /// Sets the name of `entity`.
    ///
    /// # Errors
    ///
    /// As [`Stage::set`].
    pub fn set_name(&mut self, world: &World, entity: Entity, name: &str) -> StoreResult<()> {
        self.set(world, entity, Name::new(name))
    }

    /// Removes component `C` from `entity`. Missing components are ignored.
    ///
    /// # Errors
    ///
    /// As [`Stage::set`].
    pub fn remove<C: Component>(&mut self, world: &World, entity: Entity) -> StoreResult<()> {
        let location = self.ensure_staged(world, entity)?;
        let signature = self.signature_at(world, location);
        match world.lookup_component::<C>() {
            Some(id) if signature.has_component(id) => {
                let target = signature.without(Term::Component(id));
                self.move_to(world, entity, &target).map(|_| ())
            }
            _ => Ok(()),
        }
    }

    /// Makes `entity` a child of `parent`. A null parent detaches it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SelfParent`] if `parent == entity`,
    /// [`StoreError::Cycle`] if `entity` is an ancestor of `parent` as seen
    /// through this stage, otherwise as [`Stage::set`] for either entity.
    pub fn add_child_of(&mut self, world: &World, entity: Entity, parent: Entity) -> StoreResult<()> {
        if entity == parent {
            return Err(StoreError::SelfParent(entity));
        }
        let view = self.view(world);
        if !parent.is_null() && !view.is_alive(parent) {
            return Err(StoreError::EntityNotFound(parent));
        }
        if view.has_ancestor(parent, entity) {
            return Err(StoreError::Cycle { entity, parent });
        }
        let location = self.ensure_staged(world, entity)?;
        let target = self.signature_at(world, location).with_parent(parent);
        self.move_to(world, entity, &target).map(|_| ())
    }

    /// Detaches `entity` from its parent.
    ///
    /// # Errors
    ///
    /// As [`Stage::set`].
    pub fn remove_child_of(&mut self, world: &World, entity: Entity) -> StoreResult<()> {
        self.add_child_of(world, entity, Entity::NULL)
    }

    /// Deletes `entity` in this stage. The canonical row is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EntityNotFound`] for an unknown entity and
    /// [`StoreError::EntityDeleted`] if it was already deleted here.
    pub fn delete(&mut self, world: &World, entity: Entity) -> StoreResult<()> {
        match self.records.get(&entity).copied() {
            Some(StagedLocation::Deleted) => return Err(StoreError::EntityDeleted(entity)),
            Some(location) => self.remove_row(location),
            None if world.is_alive(entity) => {}
            None => return Err(StoreError::EntityNotFound(entity)),
        }
        self.records.insert(entity, StagedLocation::Deleted);
        Ok(())
    }

    /// Drops every pending edit.
    pub fn clear(&mut self) {
        tracing::debug!(
            stage = self.id,
            staged = self.records.len(),
            local_tables = self.tables.len(),
            "cleared stage"
        );
        self.overlays.clear();
        self.tables.clear();
        self.local_index.clear();
        self.records.clear();
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns the overlay of a canonical table.
    #[must_use]
    pub fn overlay(&self, table: TableId) -> Option<&TableData> {
        self.overlays.get(table)
    }

    /// Iterates over tables created by this stage, in creation order.
    pub fn local_tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.tables.values()
    }

    /// Returns a stage-local table by id.
    #[must_use]
    pub fn local_table(&self, table: TableId) -> Option<&Table> {
        self.tables.get(table)
    }

    /// Checks if this stage has touched `entity`.
    #[inline]
    #[must_use]
    pub fn is_shadowed(&self, entity: Entity) -> bool {
        self.records.contains_key(&entity)
    }

    /// Returns where this stage keeps `entity`.
    #[must_use]
    pub fn location(&self, entity: Entity) -> Option<StagedLocation> {
        self.records.get(&entity).copied()
    }

    /// Returns the number of entities this stage has touched.
    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.records.len()
    }

    /// Returns allocation and usage over overlays and local tables.
    #[must_use]
    pub fn memory(&self) -> MemoryStats {
        let mut stats = MemoryStats::default();
        for overlay in self.overlays.values() {
            stats.accumulate(overlay.memory());
        }
        for table in self.tables.values() {
            stats.accumulate(table.data().memory());
        }
        stats
    }

    /// Returns a view of `world` with this stage's edits applied.
    #[inline]
    #[must_use]
    pub fn view<'a>(&'a self, world: &'a World) -> WorldView<'a> {
        WorldView::staged(world, self)
    }

    // =========================================================================
    // Row bookkeeping
    // =========================================================================

    /// Returns the staged location of `entity`, copying its canonical row in
    /// on first touch.
    fn ensure_staged(&mut self, world: &World, entity: Entity) -> StoreResult<StagedLocation> {
        match self.records.get(&entity) {
            Some(StagedLocation::Deleted) => return Err(StoreError::EntityDeleted(entity)),
            Some(&location) => return Ok(location),
            None => {}
        }

        let record = world.record(entity).ok_or(StoreError::EntityNotFound(entity))?;
        let location = match record.table {
            Some(table) => {
                let canonical = world.table_by_id(table).data();
                let overlay = self
                    .overlays
                    .get_or_insert_with(table, || canonical.empty_like(0));
                let row = canonical.copy_row(record.row, overlay);
                StagedLocation::Overlay { table, row }
            }
            None => StagedLocation::Detached,
        };
        self.records.insert(entity, location);
        Ok(location)
    }

    fn signature_at<'a>(&'a self, world: &'a World, location: StagedLocation) -> &'a Signature {
        match location {
            StagedLocation::Overlay { table, .. } => world.table_by_id(table).signature(),
            StagedLocation::Local { table, .. } => self.local_table_by_id(table).signature(),
            StagedLocation::Detached | StagedLocation::Deleted => Signature::empty_ref(),
        }
    }

    /// Moves `entity` to the staged storage for `target`.
    fn move_to(&mut self, world: &World, entity: Entity, target: &Signature) -> StoreResult<StagedLocation> {
        let location = self.ensure_staged(world, entity)?;
        if self.signature_at(world, location) == target {
            return Ok(location);
        }

        let dst = (!target.is_empty()).then(|| self.slot_for(world, target));
        let updated = match (location.slot(), dst) {
            (None, Some(dst)) => dst.at(self.slot_data_mut(dst).push_row(entity)),
            (Some((src, row)), Some(dst)) => {
                let (from, to) = self.slot_pair_mut(src, dst);
                let (dst_row, moved) = from.move_row(row, to);
                self.fix_moved(moved, src, row);
                dst.at(dst_row)
            }
            (Some(_), None) => {
                self.remove_row(location);
                StagedLocation::Detached
            }
            (None, None) => StagedLocation::Detached,
        };
        self.records.insert(entity, updated);
        Ok(updated)
    }

    /// Returns the staged storage for `signature`: the overlay of the
    /// canonical table if one exists, otherwise a stage-local table.
    fn slot_for(&mut self, world: &World, signature: &Signature) -> Slot {
        if let Some(table) = world.table_for(signature) {
            if !self.overlays.contains(table) {
                let overlay = world.table_by_id(table).data().empty_like(0);
                self.overlays.insert(table, overlay);
            }
            return Slot::Overlay(table);
        }
        if let Some(&table) = self.local_index.get(signature) {
            return Slot::Local(table);
        }

        let table = world.build_table(signature.clone());
        let id = table.id();
        tracing::debug!(
            stage = self.id,
            table = %id,
            parent = %signature.parent(),
            "created stage-local table"
        );
        self.local_index.insert(signature.clone(), id);
        self.tables.insert(id, table);
        Slot::Local(id)
    }

    fn write<C: Component>(&mut self, location: StagedLocation, id: ComponentId, value: C) {
        let Some((slot, row)) = location.slot() else {
            panic!("entity at {location:?} has no row");
        };
        match self.slot_data_mut(slot).column_mut(id) {
            Some(column) => match column.get_mut::<C>(row) {
                Some(cell) => *cell = value,
                None => panic!("staged row {row} out of bounds in {slot:?}"),
            },
            None => panic!("staged row {location:?} has no column {id}"),
        }
    }

    fn remove_row(&mut self, location: StagedLocation) {
        if let Some((slot, row)) = location.slot() {
            let moved = self.slot_data_mut(slot).swap_remove(row);
            self.fix_moved(moved, slot, row);
        }
    }

    fn fix_moved(&mut self, moved: Option<Entity>, slot: Slot, row: usize) {
        if let Some(moved) = moved {
            self.records.insert(moved, slot.at(row));
        }
    }

    fn slot_data_mut(&mut self, slot: Slot) -> &mut TableData {
        let data = match slot {
            Slot::Overlay(table) => self.overlays.get_mut(table),
            Slot::Local(table) => self.tables.get_mut(table).map(Table::data_mut),
        };
        data.unwrap_or_else(|| panic!("stage has no storage for {slot:?}"))
    }

    fn slot_pair_mut(&mut self, a: Slot, b: Slot) -> (&mut TableData, &mut TableData) {
        let pair = match (a, b) {
            (Slot::Overlay(a), Slot::Overlay(b)) => self.overlays.pair_mut(a, b),
            (Slot::Local(a), Slot::Local(b)) => self
                .tables
                .pair_mut(a, b)
                .map(|(a, b)| (a.data_mut(), b.data_mut())),
            (Slot::Overlay(a), Slot::Local(b)) => self
                .overlays
                .get_mut(a)
                .zip(self.tables.get_mut(b).map(Table::data_mut)),
            (Slot::Local(a), Slot::Overlay(b)) => self
                .tables
                .get_mut(a)
                .map(Table::data_mut)
                .zip(self.overlays.get_mut(b)),
        };
        pair.unwrap_or_else(|| panic!("stage has no storage for {a:?} or {b:?}"))
    }

    fn local_table_by_id(&self, table: TableId) -> &Table {
        self.tables
            .get(table)
            .unwrap_or_else(|| panic!("stage {} lost local table {table}", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    #[allow(dead_code)]
    struct Mass(u32);
    impl Component for Mass {}

    fn named_world() -> (World, Entity, Entity) {
        let mut world = World::new();
        let a = world.new_named(Entity::ROOT, "a").unwrap();
        let b = world.new_named(Entity::ROOT, "b").unwrap();
        (world, a, b)
    }

    #[test]
    fn test_rename_stays_in_stage() {
        let (world, a, _) = named_world();
        let mut stage = Stage::new(1);
        stage.set_name(&world, a, "z").unwrap();

        assert_eq!(world.name_of(a), Some("a"));
        assert_eq!(world.view().name_of(a), Some("a"));
        assert_eq!(stage.view(&world).name_of(a), Some("z"));

        let table = world.record(a).unwrap().table.unwrap();
        assert_eq!(stage.overlay(table).unwrap().len(), 1);
        assert!(stage.is_shadowed(a));
        assert_eq!(stage.staged_count(), 1);
    }

    #[test]
    fn test_new_signature_goes_to_local_table() {
        let (world, a, _) = named_world();
        let mut stage = Stage::new(1);
        stage.set(&world, a, Mass(5)).unwrap();

        assert_eq!(stage.local_tables().count(), 1);
        assert!(matches!(stage.location(a), Some(StagedLocation::Local { row: 0, .. })));
        let view = stage.view(&world);
        assert_eq!(view.get::<Mass>(a), Some(&Mass(5)));
        assert_eq!(view.name_of(a), Some("a"));
        assert_eq!(world.get::<Mass>(a), None);
        assert_eq!(world.table_count(), 1);
    }

    #[test]
    fn test_swap_in_overlay_fixes_rows() {
        let (world, a, b) = named_world();
        let mut stage = Stage::new(1);
        stage.set_name(&world, a, "a2").unwrap();
        stage.set_name(&world, b, "b2").unwrap();

        // Moving `a` out of the overlay pulls `b` into row 0.
        stage.set(&world, a, Mass(1)).unwrap();
        let table = world.record(b).unwrap().table.unwrap();
        assert_eq!(stage.location(b), Some(StagedLocation::Overlay { table, row: 0 }));
        assert_eq!(stage.view(&world).name_of(b), Some("b2"));
        assert_eq!(stage.view(&world).name_of(a), Some("a2"));
    }

    #[test]
    fn test_delete_in_stage() {
        let (world, a, _) = named_world();
        let mut stage = Stage::new(1);
        stage.delete(&world, a).unwrap();

        assert!(world.is_alive(a));
        assert!(!stage.view(&world).is_alive(a));
        assert_eq!(stage.delete(&world, a), Err(StoreError::EntityDeleted(a)));
        assert_eq!(stage.set_name(&world, a, "x"), Err(StoreError::EntityDeleted(a)));

        let ghost = Entity::from_raw(777);
        assert_eq!(stage.delete(&world, ghost), Err(StoreError::EntityNotFound(ghost)));
    }

    #[test]
    fn test_staged_entities_and_parents() {
        let (world, a, _) = named_world();
        let mut stage = Stage::new(1);
        let child = stage.new_named(&world, a, "child").unwrap();

        assert!(!world.is_alive(child));
        let view = stage.view(&world);
        assert!(view.is_alive(child));
        assert_eq!(view.parent_of(child), a);

        assert_eq!(stage.add_child_of(&world, a, a), Err(StoreError::SelfParent(a)));
        let ghost = Entity::from_raw(777);
        assert_eq!(
            stage.add_child_of(&world, a, ghost),
            Err(StoreError::EntityNotFound(ghost))
        );

        stage.remove_child_of(&world, child).unwrap();
        assert_eq!(stage.view(&world).parent_of(child), Entity::NULL);
    }

    #[test]
    fn test_staged_cycle_is_rejected() {
        let (mut world, a, b) = named_world();
        let mut stage = Stage::new(1);
        stage.add_child_of(&world, b, a).unwrap();

        // Only the stage sees b under a.
        assert_eq!(
            stage.add_child_of(&world, a, b),
            Err(StoreError::Cycle { entity: a, parent: b })
        );
        let grandchild = stage.new_named(&world, b, "grandchild").unwrap();
        assert_eq!(
            stage.add_child_of(&world, a, grandchild),
            Err(StoreError::Cycle { entity: a, parent: grandchild })
        );
        assert_eq!(stage.view(&world).parent_of(a), Entity::NULL);

        world.add_child_of(a, b).unwrap();
        assert_eq!(world.parent_of(a), b);
    }

    #[test]
    fn test_remove_and_detach() {
        let (world, a, _) = named_world();
        let mut stage = Stage::new(1);
        stage.remove::<Name>(&world, a).unwrap();

        assert_eq!(stage.location(a), Some(StagedLocation::Detached));
        assert_eq!(stage.view(&world).name_of(a), None);
        assert!(stage.view(&world).is_alive(a));
        assert_eq!(world.name_of(a), Some("a"));
    }

    #[test]
    fn test_clear() {
        let (world, a, _) = named_world();
        let mut stage = Stage::new(3);
        stage.set(&world, a, Mass(2)).unwrap();
        stage.new_entity(&world);
        assert!(stage.memory().used > 0);

        stage.clear();
        assert_eq!(stage.staged_count(), 0);
        assert_eq!(stage.local_tables().count(), 0);
        assert_eq!(stage.memory(), MemoryStats::default());
        assert_eq!(stage.view(&world).name_of(a), Some("a"));
    }

    #[test]
    fn test_stage_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Stage>();
    }
}
