//! Typed lookups over the ownership tree.
//!
//! Two families: by concrete behavior type (`find_child::<Pose>`) and by
//! capability flags (`find_child_with(Capabilities::COLLIDER)`). Neither ever
//! errors; absence is `None` or an empty `Vec`.

use crate::api::behavior::Behavior;
use crate::api::types::{Capabilities, EntityId};
use crate::core::tree::Tree;

impl Tree {
    /// Whether the behavior of `id` is a `T`.
    pub fn is<T: Behavior>(&self, id: EntityId) -> bool {
        self.get::<T>(id).is_some()
    }

    /// Whether the capability set of `id` contains every flag in `caps`.
    pub fn has_capabilities(&self, id: EntityId, caps: Capabilities) -> bool {
        self.contains(id) && self.capabilities(id).contains(caps)
    }

    // -- By type --

    /// Nearest strict ancestor whose behavior is a `T`.
    pub fn find_ancestor<T: Behavior>(&self, id: EntityId) -> Option<EntityId> {
        self.ancestors(id).find(|&a| self.is::<T>(a))
    }

    /// Earliest-inserted child whose behavior is a `T`.
    pub fn find_child<T: Behavior>(&self, id: EntityId) -> Option<EntityId> {
        self.children(id).iter().copied().find(|&c| self.is::<T>(c))
    }

    pub fn find_children<T: Behavior>(&self, id: EntityId) -> Vec<EntityId> {
        self.children(id).iter().copied().filter(|&c| self.is::<T>(c)).collect()
    }

    /// Every descendant whose behavior is a `T`, in pre-order.
    pub fn find_descendants<T: Behavior>(&self, id: EntityId) -> Vec<EntityId> {
        let mut found = Vec::new();
        self.walk_descendants(id, &mut |tree, d| {
            if tree.is::<T>(d) {
                found.push(d);
            }
        });
        found
    }

    // -- By capability --

    pub fn find_ancestor_with(&self, id: EntityId, caps: Capabilities) -> Option<EntityId> {
        self.ancestors(id).find(|&a| self.has_capabilities(a, caps))
    }

    pub fn find_child_with(&self, id: EntityId, caps: Capabilities) -> Option<EntityId> {
        self.children(id).iter().copied().find(|&c| self.has_capabilities(c, caps))
    }

    pub fn find_children_with(&self, id: EntityId, caps: Capabilities) -> Vec<EntityId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.has_capabilities(c, caps))
            .collect()
    }

    pub fn find_descendants_with(&self, id: EntityId, caps: Capabilities) -> Vec<EntityId> {
        let mut found = Vec::new();
        self.walk_descendants(id, &mut |tree, d| {
            if tree.has_capabilities(d, caps) {
                found.push(d);
            }
        });
        found
    }

    /// Visit every strict descendant of `id` in pre-order.
    pub fn walk_descendants(&self, id: EntityId, visit: &mut dyn FnMut(&Tree, EntityId)) {
        for &child in self.children(id) {
            visit(self, child);
            self.walk_descendants(child, visit);
        }
    }
}
