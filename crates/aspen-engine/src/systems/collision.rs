//! Pairwise collider tests and their resolution.
//!
//! Every test answers from the point of view of the collider being asked.
//! `Collision::mirrored` gives the other participant's answer.

use glam::Vec2;
use std::f32::consts::PI;

use crate::api::types::EntityId;
use crate::components::collider::{Collider, Shape};
use crate::components::pose::{rotate_degrees, Pose};
use crate::components::rigidbody::Rigidbody;
use crate::core::tree::Tree;

/// Outcome of one pairwise test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionResult {
    Failure,
    Success,
    /// This collider does not know the other's shape; retry with roles swapped.
    CannotHandle,
}

/// Result of testing one collider against another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub result: CollisionResult,
    /// The collider tested against.
    pub collider: EntityId,
    /// World-space point in the middle of the overlap.
    pub contact: Vec2,
    /// Direction (radians) to push this collider's owner out of the overlap.
    pub direction: f32,
    /// Penetration depth; how far to push.
    pub strength: f32,
}

impl Collision {
    fn with_result(collider: EntityId, result: CollisionResult) -> Self {
        Self {
            result,
            collider,
            contact: Vec2::ZERO,
            direction: 0.0,
            strength: 0.0,
        }
    }

    pub fn failure(collider: EntityId) -> Self {
        Self::with_result(collider, CollisionResult::Failure)
    }

    pub fn cannot_handle(collider: EntityId) -> Self {
        Self::with_result(collider, CollisionResult::CannotHandle)
    }

    fn success(collider: EntityId, contact: Vec2, push: Vec2) -> Self {
        Self {
            result: CollisionResult::Success,
            collider,
            contact,
            direction: push.y.atan2(push.x),
            strength: push.length(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == CollisionResult::Success
    }

    /// Resolution push as a vector.
    pub fn force(&self) -> Vec2 {
        Vec2::new(self.direction.cos(), self.direction.sin()) * self.strength
    }

    /// The same collision seen from the other side: `this` is the collider
    /// that produced `self`.
    pub fn mirrored(&self, this: EntityId) -> Collision {
        Collision {
            result: self.result,
            collider: this,
            contact: self.contact,
            direction: (self.direction + PI).rem_euclid(2.0 * PI),
            strength: self.strength,
        }
    }
}

/// A collider placed in the world: center and world-scaled shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderFrame {
    pub center: Vec2,
    pub shape: Shape,
}

/// Place `collider` (owned by `owner`) in world space from the owner's pose.
pub fn collider_frame(tree: &Tree, owner: EntityId, collider: &Collider) -> Option<ColliderFrame> {
    let pose = tree.entity_world_pose(owner)?;
    let center = pose.position() + rotate_degrees(collider.offset(), pose.rotation());
    let scale = pose.scale().abs();
    let shape = match collider.shape() {
        Shape::Circle { radius } => Shape::Circle {
            radius: radius * (scale.x + scale.y) * 0.5,
        },
        Shape::Aabb { width, height } => Shape::Aabb {
            width: width * scale.x,
            height: height * scale.y,
        },
    };
    Some(ColliderFrame { center, shape })
}

/// World frame of the collider entity `id`, resolved through its owner.
pub fn frame_of(tree: &Tree, id: EntityId) -> Option<ColliderFrame> {
    let collider = tree.get::<Collider>(id)?;
    collider_frame(tree, tree.parent(id)?, collider)
}

/// Whether the world point `(x, y)` lies inside collider `id`. Edges count.
pub fn contains_point(tree: &Tree, id: EntityId, x: f32, y: f32) -> bool {
    let Some(frame) = frame_of(tree, id) else {
        return false;
    };
    let point = Vec2::new(x, y);
    match frame.shape {
        Shape::Circle { radius } => point.distance_squared(frame.center) <= radius * radius,
        Shape::Aabb { width, height } => {
            let d = (point - frame.center).abs();
            d.x <= width * 0.5 && d.y <= height * 0.5
        }
    }
}

/// Whether this collider's shape has a test against the other shape.
fn handles(this: Shape, other: Shape) -> bool {
    matches!(
        (this, other),
        (Shape::Circle { .. }, Shape::Circle { .. })
            | (Shape::Aabb { .. }, Shape::Aabb { .. })
            | (Shape::Aabb { .. }, Shape::Circle { .. })
    )
}

/// Test collider `this` against collider `other`.
///
/// `CannotHandle` when the pairing is unknown from this side, `Failure`
/// when either collider cannot be placed in the world or they do not
/// overlap.
pub fn test_collision(tree: &Tree, this: EntityId, other: EntityId) -> Collision {
    let (Some(a), Some(b)) = (tree.get::<Collider>(this), tree.get::<Collider>(other)) else {
        return Collision::failure(other);
    };
    if !handles(a.shape(), b.shape()) {
        return Collision::cannot_handle(other);
    }
    let (Some(fa), Some(fb)) = (frame_of(tree, this), frame_of(tree, other)) else {
        return Collision::failure(other);
    };
    let hit = match (fa.shape, fb.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(fa.center, ra, fb.center, rb)
        }
        (Shape::Aabb { width: wa, height: ha }, Shape::Aabb { width: wb, height: hb }) => {
            aabb_aabb(fa.center, Vec2::new(wa, ha) * 0.5, fb.center, Vec2::new(wb, hb) * 0.5)
        }
        (Shape::Aabb { width, height }, Shape::Circle { radius }) => {
            aabb_circle(fa.center, Vec2::new(width, height) * 0.5, fb.center, radius)
        }
        _ => return Collision::cannot_handle(other),
    };
    match hit {
        Some((contact, push)) => Collision::success(other, contact, push),
        None => Collision::failure(other),
    }
}

/// Unit vector from `from` toward `to`; +X when they coincide.
fn direction_between(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).try_normalize().unwrap_or(Vec2::X)
}

/// Contact point and push for circle A against circle B.
fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<(Vec2, Vec2)> {
    let distance_sq = ca.distance_squared(cb);
    let reach = ra + rb;
    if distance_sq >= reach * reach {
        return None;
    }
    let normal = direction_between(ca, cb);
    let depth = reach - distance_sq.sqrt();
    let contact = ca + normal * (ra - depth * 0.5);
    Some((contact, -normal * depth))
}

fn aabb_aabb(ca: Vec2, ha: Vec2, cb: Vec2, hb: Vec2) -> Option<(Vec2, Vec2)> {
    let delta = cb - ca;
    let overlap = (ha + hb) - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return None;
    }
    let lo = (ca - ha).max(cb - hb);
    let hi = (ca + ha).min(cb + hb);
    let contact = (lo + hi) * 0.5;
    let sign = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
    let push = if overlap.x < overlap.y {
        Vec2::new(-sign(delta.x) * overlap.x, 0.0)
    } else {
        Vec2::new(0.0, -sign(delta.y) * overlap.y)
    };
    Some((contact, push))
}

fn aabb_circle(ca: Vec2, half: Vec2, cc: Vec2, radius: f32) -> Option<(Vec2, Vec2)> {
    let closest = cc.clamp(ca - half, ca + half);
    let gap = cc - closest;
    let gap_sq = gap.length_squared();
    if gap_sq > 0.0 {
        if gap_sq >= radius * radius {
            return None;
        }
        let distance = gap_sq.sqrt();
        let normal = gap / distance;
        let depth = radius - distance;
        return Some((closest - normal * (depth * 0.5), -normal * depth));
    }

    // Circle center inside the box: leave through the nearest face.
    let local = cc - ca;
    let to_face = half - local.abs();
    let sign = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
    let (normal, face_distance) = if to_face.x < to_face.y {
        (Vec2::new(sign(local.x), 0.0), to_face.x)
    } else {
        (Vec2::new(0.0, sign(local.y)), to_face.y)
    };
    let depth = radius + face_distance;
    let face_point = cc + normal * face_distance;
    Some((face_point - normal * (depth * 0.5), -normal * depth))
}

/// Apply `collision` to the owner of collider `this`.
///
/// Does nothing unless the test succeeded, neither side is a trigger and
/// the owner has both a rigidbody and a pose. The owner moves the full push
/// against a static body and half of it against another rigidbody; its
/// velocity loses the component heading into the contact.
pub fn resolve_collision(tree: &mut Tree, this: EntityId, collision: &Collision) {
    if !collision.is_success() {
        return;
    }
    let Some(own) = tree.get::<Collider>(this) else {
        return;
    };
    if own.is_trigger()
        || tree
            .get::<Collider>(collision.collider)
            .is_some_and(Collider::is_trigger)
    {
        return;
    }
    let Some(owner) = tree.parent(this) else {
        return;
    };
    let (Some(body_id), Some(pose_id)) = (tree.find_child::<Rigidbody>(owner), tree.get_pose(owner))
    else {
        return;
    };
    let other_dynamic = tree
        .parent(collision.collider)
        .and_then(|o| tree.find_child::<Rigidbody>(o))
        .is_some();

    let push = collision.force() * if other_dynamic { 0.5 } else { 1.0 };
    if let Some(pose) = tree.get_mut::<Pose>(pose_id) {
        pose.translate(push);
    }

    let Some(into_contact) = (-push).try_normalize() else {
        return;
    };
    if let Some(body) = tree.get_mut::<Rigidbody>(body_id) {
        let v = body.velocity_vec();
        let closing = v.dot(into_contact);
        if closing > 0.0 {
            let v = v - into_contact * closing;
            body.set_cartesian_velocity(v.x, v.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A root entity at `at` carrying a pose and the given collider.
    fn body(tree: &mut Tree, at: Vec2, collider: Collider, dynamic: bool) -> EntityId {
        let e = tree.spawn("body", ());
        tree.create_child(e, "pose", Pose::new().with_position(at.x, at.y)).unwrap();
        if dynamic {
            tree.create_child(e, "rigidbody", Rigidbody::new(1.0)).unwrap();
        }
        tree.create_child(e, "collider", collider).unwrap()
    }

    #[test]
    fn overlapping_circles_are_symmetric() {
        let mut tree = Tree::new();
        let a = body(&mut tree, Vec2::ZERO, Collider::circle(5.0), false);
        let b = body(&mut tree, Vec2::new(6.0, 0.0), Collider::circle(5.0), false);

        let ab = test_collision(&tree, a, b);
        let ba = test_collision(&tree, b, a);
        assert!(ab.is_success() && ba.is_success());
        assert_eq!(ab.collider, b);
        assert_eq!(ba.collider, a);
        assert_relative_eq!(ab.strength, 4.0, epsilon = 1e-4);
        assert_relative_eq!(ab.strength, ba.strength, epsilon = 1e-4);
        let sum = ab.force() + ba.force();
        assert_relative_eq!(sum.length(), 0.0, epsilon = 1e-4);
        assert_relative_eq!(ab.contact.x, ba.contact.x, epsilon = 1e-4);
        assert_relative_eq!(ab.contact.x, 3.0, epsilon = 1e-4);
        // A is pushed toward -X.
        assert!(ab.force().x < 0.0);
    }

    #[test]
    fn separated_circles_fail() {
        let mut tree = Tree::new();
        let a = body(&mut tree, Vec2::ZERO, Collider::circle(1.0), false);
        let b = body(&mut tree, Vec2::new(2.0, 0.0), Collider::circle(1.0), false);
        assert_eq!(test_collision(&tree, a, b).result, CollisionResult::Failure);
    }

    #[test]
    fn circle_defers_boxes() {
        let mut tree = Tree::new();
        let circle = body(&mut tree, Vec2::ZERO, Collider::circle(1.0), false);
        let bx = body(&mut tree, Vec2::new(1.0, 0.0), Collider::aabb(2.0, 2.0), false);
        assert_eq!(test_collision(&tree, circle, bx).result, CollisionResult::CannotHandle);

        let from_box = test_collision(&tree, bx, circle);
        assert!(from_box.is_success());
        // Box center is to the right of the circle, so the box is pushed right.
        assert!(from_box.force().x > 0.0);
        assert_relative_eq!(from_box.strength, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn circle_inside_box_leaves_through_nearest_face() {
        let mut tree = Tree::new();
        let bx = body(&mut tree, Vec2::ZERO, Collider::aabb(10.0, 4.0), false);
        let circle = body(&mut tree, Vec2::new(0.0, 1.0), Collider::circle(0.5), false);
        let hit = test_collision(&tree, bx, circle);
        assert!(hit.is_success());
        assert_relative_eq!(hit.strength, 1.5, epsilon = 1e-4);
        assert!(hit.force().y < 0.0);
    }

    #[test]
    fn boxes_push_along_shallowest_axis() {
        let mut tree = Tree::new();
        let a = body(&mut tree, Vec2::ZERO, Collider::aabb(4.0, 4.0), false);
        let b = body(&mut tree, Vec2::new(3.0, 1.0), Collider::aabb(4.0, 4.0), false);
        let hit = test_collision(&tree, a, b);
        assert!(hit.is_success());
        assert_relative_eq!(hit.force().x, -1.0, epsilon = 1e-4);
        assert_relative_eq!(hit.force().y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(hit.contact.x, 1.5, epsilon = 1e-4);
        assert_relative_eq!(hit.contact.y, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn offset_and_scale_place_the_shape() {
        let mut tree = Tree::new();
        let e = tree.spawn("e", ());
        let pose = Pose::new()
            .with_position(1.0, 1.0)
            .with_rotation(90.0)
            .with_scale(2.0, 4.0);
        tree.create_child(e, "pose", pose).unwrap();
        let collider = Collider::circle(1.0).with_offset(2.0, 0.0);
        let c = tree.create_child(e, "collider", collider).unwrap();
        let frame = frame_of(&tree, c).unwrap();
        assert_relative_eq!(frame.center.x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(frame.center.y, 3.0, epsilon = 1e-4);
        assert_eq!(frame.shape, Shape::Circle { radius: 3.0 });
    }

    #[test]
    fn point_queries() {
        let mut tree = Tree::new();
        let circle = body(&mut tree, Vec2::new(10.0, 10.0), Collider::circle(2.0), false);
        let bx = body(&mut tree, Vec2::ZERO, Collider::aabb(4.0, 2.0), false);
        assert!(contains_point(&tree, circle, 11.0, 11.0));
        assert!(!contains_point(&tree, circle, 12.0, 12.0));
        assert!(contains_point(&tree, bx, 2.0, -1.0));
        assert!(!contains_point(&tree, bx, 0.0, 1.5));
    }

    #[test]
    fn missing_pose_fails() {
        let mut tree = Tree::new();
        let a = body(&mut tree, Vec2::ZERO, Collider::circle(1.0), false);
        let bare = tree.spawn("bare", ());
        let b = tree.create_child(bare, "collider", Collider::circle(1.0)).unwrap();
        assert_eq!(test_collision(&tree, a, b).result, CollisionResult::Failure);
    }

    #[test]
    fn mirrored_flips_direction() {
        let mut tree = Tree::new();
        let a = body(&mut tree, Vec2::ZERO, Collider::circle(5.0), false);
        let b = body(&mut tree, Vec2::new(0.0, 6.0), Collider::circle(5.0), false);
        let ab = test_collision(&tree, a, b);
        let mirrored = ab.mirrored(a);
        let ba = test_collision(&tree, b, a);
        assert_eq!(mirrored.collider, a);
        assert_relative_eq!(mirrored.force().x, ba.force().x, epsilon = 1e-4);
        assert_relative_eq!(mirrored.force().y, ba.force().y, epsilon = 1e-4);
    }

    #[test]
    fn resolve_moves_dynamic_against_static() {
        let mut tree = Tree::new();
        let a = body(&mut tree, Vec2::ZERO, Collider::circle(5.0), true);
        let b = body(&mut tree, Vec2::new(6.0, 0.0), Collider::circle(5.0), false);
        let owner = tree.parent(a).unwrap();
        let rb = tree.find_child::<Rigidbody>(owner).unwrap();
        tree.get_mut::<Rigidbody>(rb).unwrap().set_cartesian_velocity(3.0, 1.0);

        let hit = test_collision(&tree, a, b);
        resolve_collision(&mut tree, a, &hit);

        let pos = tree.entity_world_pose(owner).unwrap().position();
        assert_relative_eq!(pos.x, -4.0, epsilon = 1e-4);
        let v = tree.get::<Rigidbody>(rb).unwrap().velocity_vec();
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-4);

        // The static side has no rigidbody and stays put.
        let b_owner = tree.parent(b).unwrap();
        resolve_collision(&mut tree, b, &hit.mirrored(a));
        assert_relative_eq!(tree.entity_world_pose(b_owner).unwrap().x(), 6.0);
    }

    #[test]
    fn resolve_splits_between_dynamic_bodies() {
        let mut tree = Tree::new();
        let a = body(&mut tree, Vec2::ZERO, Collider::circle(5.0), true);
        let b = body(&mut tree, Vec2::new(6.0, 0.0), Collider::circle(5.0), true);
        let hit = test_collision(&tree, a, b);
        resolve_collision(&mut tree, a, &hit);
        resolve_collision(&mut tree, b, &hit.mirrored(a));
        let pa = tree.entity_world_pose(tree.parent(a).unwrap()).unwrap().x();
        let pb = tree.entity_world_pose(tree.parent(b).unwrap()).unwrap().x();
        assert_relative_eq!(pa, -2.0, epsilon = 1e-4);
        assert_relative_eq!(pb, 8.0, epsilon = 1e-4);
    }

    #[test]
    fn triggers_are_not_resolved() {
        let mut tree = Tree::new();
        let a = body(&mut tree, Vec2::ZERO, Collider::circle(5.0), true);
        let sensor = Collider::circle(5.0).with_trigger(true);
        let b = body(&mut tree, Vec2::new(6.0, 0.0), sensor, false);
        let hit = test_collision(&tree, a, b);
        assert!(hit.is_success());
        resolve_collision(&mut tree, a, &hit);
        assert_eq!(tree.entity_world_pose(tree.parent(a).unwrap()).unwrap().x(), 0.0);
    }
}
