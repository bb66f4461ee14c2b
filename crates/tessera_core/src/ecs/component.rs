//! # Component System
//!
//! Components are plain data attached to entities. Each distinct component
//! type gets a [`ComponentId`] the first time the store sees it.

use std::alloc::Layout;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use super::entity::Entity;
use super::storage::Column;
use crate::memory::GrowVec;

/// Marker trait for storable components.
///
/// Components must be:
/// - `Clone`: rows are copied into stage overlays
/// - `Default`: new rows are default-initialised before being written
/// - `Send + Sync`: tables are shared between workers
/// - non zero-sized: enforced when the column is created
///
/// # Example
///
/// ```rust
/// use tessera_core::Component;
///
/// #[derive(Clone, Default)]
/// struct Health(u32);
///
/// impl Component for Health {}
/// ```
pub trait Component: Clone + Default + Send + Sync + 'static {}

/// Identifier of a registered component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u32);

impl ComponentId {
    /// The built-in [`Name`] component.
    pub const NAME: Self = Self(0);

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Text label used by lookups and paths.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Name(String);

impl Component for Name {}

impl Name {
    /// Creates a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the label.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parent relation of a child entity.
///
/// Stored in the table signature rather than in a column: every row of a
/// table shares the same parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChildOf(pub Entity);

impl ChildOf {
    /// Returns the parent entity.
    #[inline]
    #[must_use]
    pub const fn target(self) -> Entity {
        self.0
    }
}

/// Registration record of a component type.
#[derive(Clone, Copy, Debug)]
pub struct ComponentInfo {
    /// Assigned id.
    pub id: ComponentId,
    /// Rust type id.
    pub type_id: TypeId,
    /// Rust type name, for diagnostics.
    pub type_name: &'static str,
    /// Element layout.
    pub layout: Layout,
    /// Builds an empty column for this component.
    new_column: fn(ComponentId) -> Column,
}

impl ComponentInfo {
    fn of<C: Component>(id: ComponentId) -> Self {
        Self {
            id,
            type_id: TypeId::of::<C>(),
            type_name: type_name::<C>(),
            layout: Layout::new::<C>(),
            new_column: Column::new::<C>,
        }
    }

    /// Creates an empty column for this component.
    #[must_use]
    pub fn new_column(&self) -> Column {
        (self.new_column)(self.id)
    }
}

/// On-demand registry of component types.
///
/// [`Name`] is always registered as [`ComponentId::NAME`].
#[derive(Debug)]
pub struct ComponentRegistry {
    /// Infos indexed by component id.
    infos: GrowVec<ComponentInfo>,
    /// Type to id.
    by_type: HashMap<TypeId, ComponentId>,
}

impl ComponentRegistry {
    /// Creates a registry with the built-in components.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            infos: GrowVec::new(),
            by_type: HashMap::new(),
        };
        let name = registry.register::<Name>();
        debug_assert_eq!(name, ComponentId::NAME);
        registry
    }

    /// Returns the id of `C`, registering it if needed.
    pub fn register<C: Component>(&mut self) -> ComponentId {
        if let Some(&id) = self.by_type.get(&TypeId::of::<C>()) {
            return id;
        }

        let index = u32::try_from(self.infos.len())
            .unwrap_or_else(|_| panic!("component id space exhausted"));
        let id = ComponentId(index);
        self.infos.push(ComponentInfo::of::<C>(id));
        self.by_type.insert(TypeId::of::<C>(), id);
        id
    }

    /// Returns the id of `C` if it has been registered.
    #[inline]
    #[must_use]
    pub fn id_of<C: Component>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<C>()).copied()
    }

    /// Returns the info of a registered component.
    #[must_use]
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.as_slice().get(id.0 as usize)
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Checks if empty. Never true: built-ins are always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
