//! # ECS World
//!
//! The canonical store: every committed table, the entity index, and the
//! hierarchy index.
//!
//! Writes through `&mut World` are committed immediately. Workers that run
//! while the world is shared write through a [`Stage`](crate::Stage) instead
//! and read through a [`WorldView`] that layers their pending edits over the
//! canonical data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::RwLock;

use super::archetype::{Signature, Table, TableId, Term};
use super::component::{Component, ComponentId, ComponentRegistry, Name};
use super::entity::Entity;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::hierarchy::{ChildTables, TreeIter};
use crate::memory::{DenseMap, MemoryStats};
use crate::sync::WorldView;

/// Where an entity's row lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityRecord {
    /// Table holding the row. `None` for an entity with no components.
    pub table: Option<TableId>,
    /// Row within the table. Only valid until the next write to that table.
    pub row: usize,
}

impl EntityRecord {
    const DETACHED: Self = Self { table: None, row: 0 };
}

/// The ECS World - canonical container for all entities and tables.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Entity, World};
///
/// let mut world = World::new();
/// let ship = world.new_named(Entity::ROOT, "ship").unwrap();
/// let hull = world.new_named(ship, "hull").unwrap();
///
/// let view = world.view();
/// assert_eq!(view.lookup_path(Entity::ROOT, "ship.hull", ".", None), hull);
/// assert_eq!(view.full_path(hull), "::ship.hull");
/// ```
#[derive(Debug)]
pub struct World {
    /// Store tunables.
    config: StoreConfig,
    /// Component types seen so far. Shared with stages.
    components: RwLock<ComponentRegistry>,
    /// Every canonical table.
    tables: DenseMap<TableId, Table>,
    /// Signature to table.
    table_index: HashMap<Signature, TableId>,
    /// Parent to child tables.
    child_tables: ChildTables,
    /// Entity to row.
    entity_index: HashMap<Entity, EntityRecord>,
    /// Next entity id. Starts at 1: id 0 is the null/root sentinel.
    next_entity: AtomicU64,
    /// Next table id, shared by canonical and stage-local tables.
    next_table: AtomicU32,
}

impl World {
    /// Creates an empty world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(StoreConfig::default())
    }

    /// Creates an empty world with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn with_config(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Self {
        Self {
            config,
            components: RwLock::new(ComponentRegistry::new()),
            tables: DenseMap::new(),
            table_index: HashMap::new(),
            child_tables: ChildTables::new(),
            entity_index: HashMap::new(),
            next_entity: AtomicU64::new(1),
            next_table: AtomicU32::new(1),
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Returns the id of `C`, registering it on first use.
    pub fn component_id<C: Component>(&self) -> ComponentId {
        let known = self.components.read().id_of::<C>();
        if let Some(id) = known {
            return id;
        }
        self.components.write().register::<C>()
    }

    /// Returns the id of `C` if it has been registered.
    #[must_use]
    pub fn lookup_component<C: Component>(&self) -> Option<ComponentId> {
        self.components.read().id_of::<C>()
    }

    // =========================================================================
    // Allocation shared with stages
    // =========================================================================

    /// Reserves a fresh entity id.
    pub(crate) fn alloc_entity(&self) -> Entity {
        Entity::from_raw(self.next_entity.fetch_add(1, Ordering::Relaxed))
    }

    /// Builds an empty, unregistered table for `signature`.
    pub(crate) fn build_table(&self, signature: Signature) -> Table {
        let columns = {
            let registry = self.components.read();
            signature
                .components()
                .map(|id| {
                    registry
                        .info(id)
                        .unwrap_or_else(|| panic!("component {id} is not registered"))
                        .new_column()
                })
                .collect()
        };
        let id = TableId::from_raw(self.next_table.fetch_add(1, Ordering::Relaxed));
        Table::new(id, signature, columns, self.config.initial_table_capacity)
    }

    fn find_or_create_table(&mut self, signature: &Signature) -> TableId {
        if let Some(&id) = self.table_index.get(signature) {
            return id;
        }

        let table = self.build_table(signature.clone());
        let id = table.id();
        tracing::debug!(
            table = %id,
            terms = signature.len(),
            parent = %signature.parent(),
            "created table"
        );
        self.child_tables.register(&table);
        self.table_index.insert(signature.clone(), id);
        self.tables.insert(id, table);
        id
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with no components.
    pub fn new_entity(&mut self) -> Entity {
        let entity = self.alloc_entity();
        self.entity_index.insert(entity, EntityRecord::DETACHED);
        entity
    }

    /// Creates a named entity under `parent`. A null parent means the root.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EntityNotFound`] if `parent` is not alive.
    pub fn new_named(&mut self, parent: Entity, name: &str) -> StoreResult<Entity> {
        if !parent.is_null() && !self.is_alive(parent) {
            return Err(StoreError::EntityNotFound(parent));
        }

        let entity = self.new_entity();
        let signature = Signature::new(vec![Term::Component(ComponentId::NAME)]).with_parent(parent);
        self.move_entity(entity, &signature)?;
        self.write(entity, ComponentId::NAME, Name::new(name))?;
        Ok(entity)
    }

    /// Sets component `C` on `entity`, adding it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EntityNotFound`] if `entity` is not alive.
    pub fn set<C: Component>(&mut self, entity: Entity, value: C) -> StoreResult<()> {
        let id = self.component_id::<C>();
        let signature = self.signature_of(entity).ok_or(StoreError::EntityNotFound(entity))?;
        if !signature.has_component(id) {
            let target = signature.with(Term::Component(id));
            self.move_entity(entity, &target)?;
        }
        self.write(entity, id, value)
    }

    /// Returns component `C` of `entity`.
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        let id = self.lookup_component::<C>()?;
        self.read(entity, id)
    }

    /// Removes component `C` from `entity`. Missing components are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EntityNotFound`] if `entity` is not alive.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> StoreResult<()> {
        let signature = self.signature_of(entity).ok_or(StoreError::EntityNotFound(entity))?;
        match self.lookup_component::<C>() {
            Some(id) if signature.has_component(id) => {
                let target = signature.without(Term::Component(id));
                self.move_entity(entity, &target).map(|_| ())
            }
            _ => Ok(()),
        }
    }

    /// Sets the name of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EntityNotFound`] if `entity` is not alive.
    pub fn set_name(&mut self, entity: Entity, name: &str) -> StoreResult<()> {
        self.set(entity, Name::new(name))
    }

    /// Returns the name of `entity`.
    #[must_use]
    pub fn name_of(&self, entity: Entity) -> Option<&str> {
        self.read::<Name>(entity, ComponentId::NAME).map(Name::as_str)
    }

    /// Makes `entity` a child of `parent`, replacing any previous parent.
    ///
    /// A null `parent` detaches the entity to the root.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SelfParent`] if `parent == entity`,
    /// [`StoreError::Cycle`] if `entity` is an ancestor of `parent` and
    /// [`StoreError::EntityNotFound`] if either entity is not alive.
    pub fn add_child_of(&mut self, entity: Entity, parent: Entity) -> StoreResult<()> {
        if entity == parent {
            return Err(StoreError::SelfParent(entity));
        }
        if !parent.is_null() && !self.is_alive(parent) {
            return Err(StoreError::EntityNotFound(parent));
        }
        if self.view().has_ancestor(parent, entity) {
            return Err(StoreError::Cycle { entity, parent });
        }
        let signature = self.signature_of(entity).ok_or(StoreError::EntityNotFound(entity))?;
        let target = signature.with_parent(parent);
        self.move_entity(entity, &target).map(|_| ())
    }

    /// Detaches `entity` from its parent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EntityNotFound`] if `entity` is not alive.
    pub fn remove_child_of(&mut self, entity: Entity) -> StoreResult<()> {
        self.add_child_of(entity, Entity::NULL)
    }

    /// Returns the parent of `entity`, or [`Entity::NULL`] at the root.
    #[must_use]
    pub fn parent_of(&self, entity: Entity) -> Entity {
        self.signature_of(entity).map_or(Entity::NULL, Signature::parent)
    }

    /// Returns the signature of `entity`.
    #[must_use]
    pub fn signature_of(&self, entity: Entity) -> Option<&Signature> {
        let record = self.entity_index.get(&entity)?;
        Some(match record.table {
            Some(table) => self.table_by_id(table).signature(),
            None => Signature::empty_ref(),
        })
    }

    /// Deletes `entity`. Children keep their (now dangling) parent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EntityNotFound`] if `entity` is not alive.
    pub fn delete(&mut self, entity: Entity) -> StoreResult<()> {
        let record = self
            .entity_index
            .remove(&entity)
            .ok_or(StoreError::EntityNotFound(entity))?;
        if let Some(table) = record.table {
            let moved = self.table_by_id_mut(table).data_mut().swap_remove(record.row);
            self.fix_moved(moved, record.row);
        }
        Ok(())
    }

    /// Moves `entity` to the table of `target`, creating it if needed.
    fn move_entity(&mut self, entity: Entity, target: &Signature) -> StoreResult<EntityRecord> {
        let record = *self
            .entity_index
            .get(&entity)
            .ok_or(StoreError::EntityNotFound(entity))?;
        let dst = (!target.is_empty()).then(|| self.find_or_create_table(target));
        if dst == record.table {
            return Ok(record);
        }

        let row = match (record.table, dst) {
            (Some(src), Some(dst)) => {
                let (src, dst) = self
                    .tables
                    .pair_mut(src, dst)
                    .unwrap_or_else(|| panic!("table {src} or {dst} is indexed but not stored"));
                let (row, moved) = src.data_mut().move_row(record.row, dst.data_mut());
                self.fix_moved(moved, record.row);
                row
            }
            (Some(src), None) => {
                let moved = self.table_by_id_mut(src).data_mut().swap_remove(record.row);
                self.fix_moved(moved, record.row);
                0
            }
            (None, Some(dst)) => self.table_by_id_mut(dst).data_mut().push_row(entity),
            (None, None) => 0,
        };

        let updated = EntityRecord { table: dst, row };
        self.entity_index.insert(entity, updated);
        Ok(updated)
    }

    fn fix_moved(&mut self, moved: Option<Entity>, row: usize) {
        if let Some(moved) = moved {
            if let Some(record) = self.entity_index.get_mut(&moved) {
                record.row = row;
            }
        }
    }

    fn read<C: Component>(&self, entity: Entity, id: ComponentId) -> Option<&C> {
        let record = self.entity_index.get(&entity)?;
        let table = self.table_by_id(record.table?);
        table.data().column(id)?.get::<C>(record.row)
    }

    fn write<C: Component>(&mut self, entity: Entity, id: ComponentId, value: C) -> StoreResult<()> {
        let record = *self
            .entity_index
            .get(&entity)
            .ok_or(StoreError::EntityNotFound(entity))?;
        let Some(table) = record.table else {
            panic!("entity {entity} has no row for component {id}");
        };
        let cell = self
            .table_by_id_mut(table)
            .data_mut()
            .column_mut(id)
            .and_then(|column| column.get_mut::<C>(record.row))
            .unwrap_or_else(|| panic!("entity {entity} has no row for component {id}"));
        *cell = value;
        Ok(())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Checks if `entity` is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entity_index.contains_key(&entity)
    }

    /// Returns the number of alive entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entity_index.len()
    }

    /// Returns where `entity` is stored.
    #[must_use]
    pub fn record(&self, entity: Entity) -> Option<EntityRecord> {
        self.entity_index.get(&entity).copied()
    }

    /// Returns a table by id.
    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id)
    }

    /// Iterates over every canonical table.
    pub fn tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.tables.values()
    }

    /// Returns the number of canonical tables.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Returns the table of `signature`, if it exists.
    #[must_use]
    pub fn table_for(&self, signature: &Signature) -> Option<TableId> {
        self.table_index.get(signature).copied()
    }

    /// Returns the tables holding children of `parent`.
    #[inline]
    #[must_use]
    pub fn child_tables(&self, parent: Entity) -> &[TableId] {
        self.child_tables.tables_of(parent)
    }

    /// Drops every empty table and releases slack in the rest.
    ///
    /// Returns the number of tables removed.
    pub fn prune_empty_tables(&mut self) -> usize {
        let empty: Vec<TableId> = self
            .tables
            .iter()
            .filter(|(_, table)| table.is_empty())
            .map(|(id, _)| id)
            .collect();

        for &id in &empty {
            if let Some(table) = self.tables.remove(id) {
                self.child_tables.unregister(&table);
                self.table_index.remove(table.signature());
            }
        }
        for table in self.tables.values_mut() {
            table.data_mut().reclaim();
        }

        tracing::debug!(removed = empty.len(), remaining = self.tables.len(), "pruned tables");
        empty.len()
    }

    /// Returns allocation and usage over every canonical table.
    #[must_use]
    pub fn memory(&self) -> MemoryStats {
        let mut stats = MemoryStats::default();
        for table in self.tables.values() {
            stats.accumulate(table.data().memory());
        }
        stats
    }

    /// Returns a read view of the committed data.
    #[inline]
    #[must_use]
    pub fn view(&self) -> WorldView<'_> {
        WorldView::canonical(self)
    }

    /// Iterates over the non-empty canonical tables holding children of
    /// `parent`.
    #[must_use]
    pub fn tree_iter(&self, parent: Entity) -> TreeIter<'_> {
        TreeIter::new(self, parent)
    }

    pub(crate) fn table_by_id(&self, id: TableId) -> &Table {
        self.tables
            .get(id)
            .unwrap_or_else(|| panic!("table {id} is indexed but not stored"))
    }

    fn table_by_id_mut(&mut self, id: TableId) -> &mut Table {
        self.tables
            .get_mut(id)
            .unwrap_or_else(|| panic!("table {id} is indexed but not stored"))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
