//! `wid → Surface` registry.
//!
//! The registry is the single owner of every live [`Surface`].  Parent links
//! are stored as window ids and resolved through the registry.  Removing (or
//! replacing) a surface clears the link on each of its children, so they
//! behave as roots and stay roots even if the server later reuses the wid.
//!
//! Removal does **not** cascade.  A server that closes a top-level window also
//! sends `lost-window` for each of its overlays.

use std::collections::{HashMap, HashSet};

use super::surface::{Surface, Wid};

/// Owns all live surfaces, keyed by window id.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: HashMap<Wid, Surface>,
}

impl SurfaceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `surface`, returning the surface it replaced (if any).
    ///
    /// A parent link that does not resolve to a registered surface is
    /// dropped, so the new surface starts life as a root.
    pub fn insert(&mut self, mut surface: Surface) -> Option<Surface> {
        if let Some(parent) = surface.parent {
            if parent == surface.wid || !self.surfaces.contains_key(&parent) {
                surface.parent = None;
            }
        }
        let replaced = self.surfaces.remove(&surface.wid);
        if replaced.is_some() {
            self.detach_children(surface.wid);
        }
        self.surfaces.insert(surface.wid, surface);
        replaced
    }

    /// Deregisters and returns the surface for `wid`.  Its children become
    /// roots.
    pub fn remove(&mut self, wid: Wid) -> Option<Surface> {
        let removed = self.surfaces.remove(&wid)?;
        self.detach_children(wid);
        Some(removed)
    }

    fn detach_children(&mut self, parent: Wid) {
        for surface in self.surfaces.values_mut() {
            if surface.parent == Some(parent) {
                surface.parent = None;
            }
        }
    }

    pub fn get(&self, wid: Wid) -> Option<&Surface> {
        self.surfaces.get(&wid)
    }

    pub fn get_mut(&mut self, wid: Wid) -> Option<&mut Surface> {
        self.surfaces.get_mut(&wid)
    }

    pub fn contains(&self, wid: Wid) -> bool {
        self.surfaces.contains_key(&wid)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// All live window ids in ascending order.
    pub fn wids(&self) -> Vec<Wid> {
        let mut wids: Vec<Wid> = self.surfaces.keys().copied().collect();
        wids.sort_unstable();
        wids
    }

    /// Returns the parent of `wid` if, and only if, that parent is still
    /// registered.
    pub fn parent_of(&self, wid: Wid) -> Option<Wid> {
        self.surfaces
            .get(&wid)
            .and_then(|s| s.parent)
            .filter(|parent| self.surfaces.contains_key(parent))
    }

    /// Walks parent links from `wid` up to the top-most registered ancestor.
    ///
    /// Returns `None` if `wid` itself is not registered.  A cycle in the
    /// parent links stops the walk at the first repeated surface.
    pub fn root_of(&self, wid: Wid) -> Option<Wid> {
        if !self.contains(wid) {
            return None;
        }
        let mut seen = HashSet::new();
        let mut current = wid;
        seen.insert(current);
        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(parent) {
                break;
            }
            current = parent;
        }
        Some(current)
    }

    /// Window ids whose resolved parent is `parent`, in ascending order.
    pub fn children_of(&self, parent: Wid) -> Vec<Wid> {
        let mut children: Vec<Wid> = self
            .surfaces
            .keys()
            .copied()
            .filter(|wid| *wid != parent && self.parent_of(*wid) == Some(parent))
            .collect();
        children.sort_unstable();
        children
    }

    /// Drops every surface at once.  No renderer is released explicitly.
    pub fn clear(&mut self) {
        self.surfaces.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::surface::MockRenderer;
    use crate::protocol::packets::Metadata;

    fn window(wid: Wid) -> Surface {
        Surface::new(
            wid,
            (0, 0, 10, 10),
            Metadata::new(),
            Metadata::new(),
            Box::new(MockRenderer::new()),
        )
    }

    fn overlay(wid: Wid, parent: Wid) -> Surface {
        Surface::new_overlay(
            wid,
            (0, 0, 5, 5),
            Metadata::new(),
            Metadata::new(),
            parent,
            Box::new(MockRenderer::new()),
        )
    }

    #[test]
    fn test_insert_then_remove() {
        // Arrange
        let mut registry = SurfaceRegistry::new();

        // Act
        registry.insert(window(7));

        // Assert
        assert!(registry.contains(7));
        assert!(registry.remove(7).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_with_unregistered_parent_becomes_root() {
        let mut registry = SurfaceRegistry::new();
        registry.insert(overlay(9, 42));
        assert_eq!(registry.get(9).and_then(Surface::parent), None);
        assert_eq!(registry.root_of(9), Some(9));
    }

    #[test]
    fn test_root_of_walks_to_top() {
        let mut registry = SurfaceRegistry::new();
        registry.insert(window(1));
        registry.insert(overlay(2, 1));
        registry.insert(overlay(3, 2));

        assert_eq!(registry.root_of(3), Some(1));
        assert_eq!(registry.root_of(1), Some(1));
        assert_eq!(registry.root_of(99), None);
    }

    #[test]
    fn test_removing_parent_orphans_children_without_cascade() {
        let mut registry = SurfaceRegistry::new();
        registry.insert(window(1));
        registry.insert(overlay(2, 1));

        registry.remove(1);

        assert!(registry.contains(2), "children must not be removed");
        assert_eq!(registry.parent_of(2), None);
        assert_eq!(registry.root_of(2), Some(2));
    }

    #[test]
    fn test_reused_wid_does_not_adopt_orphans() {
        // Arrange
        let mut registry = SurfaceRegistry::new();
        registry.insert(window(1));
        registry.insert(overlay(2, 1));
        registry.remove(1);

        // Act
        registry.insert(window(1));

        // Assert
        assert_eq!(registry.parent_of(2), None);
        assert!(registry.children_of(1).is_empty());
        assert_eq!(registry.root_of(2), Some(2));
    }

    #[test]
    fn test_replacing_a_parent_detaches_its_children() {
        let mut registry = SurfaceRegistry::new();
        registry.insert(window(1));
        registry.insert(overlay(2, 1));

        let replaced = registry.insert(window(1));

        assert!(replaced.is_some());
        assert_eq!(registry.parent_of(2), None);
    }

    #[test]
    fn test_children_of_returns_direct_children_only() {
        let mut registry = SurfaceRegistry::new();
        registry.insert(window(1));
        registry.insert(overlay(3, 1));
        registry.insert(overlay(2, 1));
        registry.insert(overlay(4, 2));

        assert_eq!(registry.children_of(1), vec![2, 3]);
        assert_eq!(registry.children_of(2), vec![4]);
        assert!(registry.children_of(4).is_empty());
    }

    #[test]
    fn test_clear_empties_registry() {
        let mut registry = SurfaceRegistry::new();
        registry.insert(window(1));
        registry.insert(window(2));

        registry.clear();

        assert!(registry.wids().is_empty());
    }

    #[test]
    fn test_wids_are_sorted() {
        let mut registry = SurfaceRegistry::new();
        for wid in [5, 1, 3] {
            registry.insert(window(wid));
        }
        assert_eq!(registry.wids(), vec![1, 3, 5]);
    }
}
