//! # Paths
//!
//! Joins and splits entity names along the `ChildOf` chain:
//!
//! ```text
//! ::ship.deck.mast
//! ^^ prefix: anchors the path at the root
//!        ^ separator
//! ```

use std::collections::HashSet;
use std::iter::FusedIterator;

use crate::ecs::Entity;
use crate::sync::WorldView;

/// Upward walk over `ChildOf` targets, ending below the root.
///
/// Writes reject cycles, but a stage built against an older world can still
/// combine with later committed reparents into one. Past the configured
/// depth the walk records visited entities and stops on the first repeat.
#[derive(Debug)]
pub(crate) struct Ancestors<'v, 'a> {
    view: &'v WorldView<'a>,
    current: Entity,
    depth: usize,
    tracked_after: usize,
    visited: HashSet<Entity>,
    cycled: bool,
}

impl Ancestors<'_, '_> {
    /// Checks if the walk stopped on a repeated entity.
    #[inline]
    pub(crate) fn cycled(&self) -> bool {
        self.cycled
    }
}

impl Iterator for Ancestors<'_, '_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        if self.current.is_null() {
            return None;
        }
        let up = self.view.parent_of(self.current);
        self.current = up;
        if up.is_null() {
            return None;
        }

        self.depth += 1;
        if self.depth > self.tracked_after && !self.visited.insert(up) {
            tracing::warn!(entity = %up, depth = self.depth, "parent chain loops, walk stopped");
            self.cycled = true;
            self.current = Entity::NULL;
            return None;
        }
        Some(up)
    }
}

impl FusedIterator for Ancestors<'_, '_> {}

impl<'a> WorldView<'a> {
    /// Walks the parents of `entity`, nearest first, excluding the root.
    pub(crate) fn ancestors(&self, entity: Entity) -> Ancestors<'_, 'a> {
        Ancestors {
            view: self,
            current: entity,
            depth: 0,
            tracked_after: self.world().config().max_hierarchy_depth,
            visited: HashSet::new(),
            cycled: false,
        }
    }

    /// Checks if `ancestor` is on the parent chain of `entity`.
    #[must_use]
    pub fn has_ancestor(&self, entity: Entity, ancestor: Entity) -> bool {
        !ancestor.is_null() && self.ancestors(entity).any(|up| up == ancestor)
    }

    /// Builds the path of `child` relative to `parent`.
    ///
    /// Walks up from `child` until it reaches `parent` (exclusive) or the
    /// root. `prefix` is written only when the walk reaches the root. An
    /// entity without a name contributes its id.
    #[must_use]
    pub fn path_of(&self, parent: Entity, child: Entity, sep: &str, prefix: Option<&str>) -> String {
        if parent == child {
            return String::new();
        }

        let mut chain = vec![child];
        let mut reached_parent = false;
        let mut ancestors = self.ancestors(child);
        for up in ancestors.by_ref() {
            if up == parent {
                reached_parent = true;
                break;
            }
            chain.push(up);
        }
        let reached_root = !reached_parent && !ancestors.cycled();

        let mut path = String::new();
        if reached_root {
            if let Some(prefix) = prefix {
                path.push_str(prefix);
            }
        }
        for (i, &entity) in chain.iter().rev().enumerate() {
            if i > 0 {
                path.push_str(sep);
            }
            match self.name_of(entity) {
                Some(name) => path.push_str(name),
                None => path.push_str(&entity.to_string()),
            }
        }
        path
    }

    /// Resolves `path` relative to `parent`.
    ///
    /// A leading `prefix` anchors resolution at the root instead; `Some("")`
    /// always matches and so always anchors at the root. Each
    /// segment is resolved with [`lookup_child`](WorldView::lookup_child); the
    /// first miss returns [`Entity::NULL`]. A trailing separator is ignored
    /// and an empty path resolves to the anchor itself.
    #[must_use]
    pub fn lookup_path(&self, parent: Entity, path: &str, sep: &str, prefix: Option<&str>) -> Entity {
        let mut current = parent;
        let mut rest = path;
        if let Some(stripped) = prefix.and_then(|p| path.strip_prefix(p)) {
            rest = stripped;
            current = Entity::ROOT;
        }

        if rest.is_empty() {
            return current;
        }
        if sep.is_empty() {
            return self.lookup_child(current, rest);
        }

        let mut segments = rest.split(sep).peekable();
        while let Some(segment) = segments.next() {
            if segment.is_empty() && segments.peek().is_none() {
                break;
            }
            current = self.lookup_child(current, segment);
            if current.is_null() {
                return Entity::NULL;
            }
        }
        current
    }

    /// Returns the absolute path of `child`, formatted with the world's
    /// configured separator and prefix.
    #[must_use]
    pub fn full_path(&self, child: Entity) -> String {
        let config = self.world().config();
        self.path_of(Entity::ROOT, child, &config.path_separator, config.prefix())
    }

    /// Resolves an absolute path formatted with the world's configured
    /// separator and prefix.
    #[must_use]
    pub fn lookup_full_path(&self, path: &str) -> Entity {
        let config = self.world().config();
        self.lookup_path(Entity::ROOT, path, &config.path_separator, config.prefix())
    }
}
