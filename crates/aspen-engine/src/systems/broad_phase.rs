//! All-pairs collision pass over a subtree.
//!
//! Driven by the caller, typically once per tick after `invoke`:
//!
//!   tree.tick(world, dt);
//!   let contacts = broad_phase(&mut tree, world);

use crate::api::types::{Capabilities, EntityId};
use crate::core::tree::{Hook, Tree};
use crate::systems::collision::{resolve_collision, test_collision, Collision, CollisionResult};

/// A successful test between two colliders, from the first one's side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPair {
    pub first: EntityId,
    pub second: EntityId,
    /// Seen from `first`; `collision.mirrored(first)` is `second`'s view.
    pub collision: Collision,
}

/// Active colliders at or under `root`, in pre-order.
fn active_colliders(tree: &Tree, root: EntityId) -> Vec<EntityId> {
    let mut found = Vec::new();
    if tree.has_capabilities(root, Capabilities::COLLIDER) {
        found.push(root);
    }
    found.extend(tree.find_descendants_with(root, Capabilities::COLLIDER));
    found.retain(|&c| tree.is_valid(c) && tree.is_active(c));
    found
}

/// Colliders whose owners are the same entity or an ancestor and descendant
/// are never tested against each other.
fn related(tree: &Tree, a: EntityId, b: EntityId) -> bool {
    match (tree.parent(a), tree.parent(b)) {
        (Some(oa), Some(ob)) => {
            oa == ob || tree.has_ancestor(oa, ob) || tree.has_ancestor(ob, oa)
        }
        _ => true,
    }
}

/// Test one pair, letting the second collider answer when the first cannot.
fn test_pair(tree: &Tree, a: EntityId, b: EntityId) -> Collision {
    let hit = test_collision(tree, a, b);
    if hit.result != CollisionResult::CannotHandle {
        return hit;
    }
    let swapped = test_collision(tree, b, a);
    match swapped.result {
        CollisionResult::CannotHandle => hit,
        _ => swapped.mirrored(b),
    }
}

fn notify(tree: &mut Tree, collider: EntityId, collision: &Collision) {
    if let Some(owner) = tree.parent(collider) {
        tree.notify(owner, Hook::Collision(*collision));
    }
}

/// Test every unrelated pair of active colliders under `root`.
///
/// For each hit both owners get `on_collision` with their own view, then
/// both sides are resolved. Returns the hits in the order they were found.
pub fn broad_phase(tree: &mut Tree, root: EntityId) -> Vec<CollisionPair> {
    let colliders = active_colliders(tree, root);
    let mut pairs = Vec::new();
    for (i, &a) in colliders.iter().enumerate() {
        for &b in &colliders[i + 1..] {
            // Earlier notifications may have ended either side.
            if !tree.is_valid(a) || !tree.is_valid(b) || related(tree, a, b) {
                continue;
            }
            let collision = test_pair(tree, a, b);
            if !collision.is_success() {
                continue;
            }
            let mirrored = collision.mirrored(a);
            notify(tree, a, &collision);
            notify(tree, b, &mirrored);
            resolve_collision(tree, a, &collision);
            resolve_collision(tree, b, &mirrored);
            pairs.push(CollisionPair {
                first: a,
                second: b,
                collision,
            });
        }
    }
    if !pairs.is_empty() {
        log::trace!("broad phase: {} contacts", pairs.len());
    }
    pairs
}
