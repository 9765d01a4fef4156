// systems/transform.rs
//
// World-space pose composition over the ownership tree.
// Nothing is cached: every query walks the ancestor chain.
//
// Usage:
//   let pose = tree.create_child(ship, "pose", Pose::new())?;
//   let world = tree.world_pose(pose);            // absolute
//   let view = tree.relative_pose(pose, camera);  // camera-relative

use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::pose::{normalize_degrees, rotate_degrees, Pose};
use crate::core::tree::Tree;

/// Compose local poses ordered farthest → nearest into one world pose.
fn compose<'a>(levels: impl Iterator<Item = &'a Pose>) -> Pose {
    let mut position = Vec2::ZERO;
    let mut rotation = 0.0;
    let mut scale = Vec2::ONE;
    for local in levels {
        position += rotate_degrees(local.position(), rotation);
        rotation += local.rotation();
        scale *= local.scale();
    }
    Pose::from_parts(position, normalize_degrees(rotation), scale)
}

impl Tree {
    /// The first `Pose` child of `entity`.
    pub fn get_pose(&self, entity: EntityId) -> Option<EntityId> {
        self.find_child::<Pose>(entity)
    }

    /// `entity` itself if it is a pose, otherwise its first pose child.
    pub fn representative_pose(&self, entity: EntityId) -> Option<EntityId> {
        if self.is::<Pose>(entity) {
            Some(entity)
        } else {
            self.get_pose(entity)
        }
    }

    /// Poses contributing to the world value of `pose`, nearest first.
    ///
    /// Starts with `pose` itself, then one representative pose per ancestor
    /// of its owner that has one.
    pub fn pose_chain(&self, pose: EntityId) -> Vec<EntityId> {
        if !self.is::<Pose>(pose) {
            return Vec::new();
        }
        let mut chain = vec![pose];
        chain.extend(
            self.ancestors(pose)
                .filter_map(|a| self.representative_pose(a))
                .filter(|&p| p != pose),
        );
        chain
    }

    fn compose_chain(&self, chain: &[EntityId]) -> Pose {
        compose(chain.iter().rev().filter_map(|&p| self.get::<Pose>(p)))
    }

    /// World-space pose of `pose`. Equals the local pose when no ancestor
    /// carries one.
    pub fn world_pose(&self, pose: EntityId) -> Option<Pose> {
        let chain = self.pose_chain(pose);
        if chain.is_empty() {
            return None;
        }
        Some(self.compose_chain(&chain))
    }

    /// World-space pose of the entity's representative pose.
    pub fn entity_world_pose(&self, entity: EntityId) -> Option<Pose> {
        self.world_pose(self.representative_pose(entity)?)
    }

    /// World pose of `pose` expressed in the frame of `reference`.
    ///
    /// When `reference` lies on the chain, composition simply stops there.
    /// Otherwise the reference's world pose is taken out: position
    /// difference un-rotated by the reference rotation, rotation difference,
    /// scale ratio.
    pub fn relative_pose(&self, pose: EntityId, reference: EntityId) -> Option<Pose> {
        let chain = self.pose_chain(pose);
        if chain.is_empty() {
            return None;
        }
        if let Some(stop) = chain.iter().position(|&p| p == reference) {
            if stop == 0 {
                return Some(Pose::new());
            }
            return Some(self.compose_chain(&chain[..stop]));
        }

        let world = self.compose_chain(&chain);
        let frame = self.world_pose(reference)?;
        let ratio = |a: f32, b: f32| if b == 0.0 { 0.0 } else { a / b };
        Some(Pose::from_parts(
            rotate_degrees(world.position() - frame.position(), -frame.rotation()),
            world.rotation() - frame.rotation(),
            Vec2::new(
                ratio(world.scale().x, frame.scale().x),
                ratio(world.scale().y, frame.scale().y),
            ),
        ))
    }
}
