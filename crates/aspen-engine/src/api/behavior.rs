use std::any::Any;

use crate::api::types::{Capabilities, EntityId};
use crate::core::tree::Tree;
use crate::systems::collision::Collision;
use crate::systems::debug::Inspector;

/// Object-safe access to `Any` for boxed behaviors.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-entity logic and data attached to a node of the [`Tree`].
///
/// Every hook has an empty default, so plain grouping entities can use `()`.
/// While one of its hooks runs, a behavior is detached from its node: lookups
/// that reach that node see no behavior until the hook returns.
pub trait Behavior: AsAny {
    /// Concerns this behavior takes part in. Must not change over its lifetime.
    fn capabilities(&self) -> Capabilities {
        Capabilities::empty()
    }

    /// Name used by a state manager to address this entity, if it is a state.
    fn state_name(&self) -> Option<&str> {
        None
    }

    /// Runs once, on the first update or activation while active.
    fn on_start(&mut self, _ctx: &mut Context<'_>) {}

    /// Runs after `on_start`, and on every later inactive → active transition.
    fn on_activate(&mut self, _ctx: &mut Context<'_>) {}

    /// Per-tick work, before the children are invoked.
    fn on_update(&mut self, _ctx: &mut Context<'_>) {}

    fn on_deactivate(&mut self, _ctx: &mut Context<'_>) {}

    /// Runs once when the entity is ended, before its children are ended.
    fn on_end(&mut self, _ctx: &mut Context<'_>) {}

    /// Called on the owner of a collider that just collided.
    fn on_collision(&mut self, _ctx: &mut Context<'_>, _collision: &Collision) {}

    /// Inspector hook for debug overlays.
    fn describe(&self, _inspector: &mut Inspector) {}
}

impl Behavior for () {}

/// Access to the tree handed to behavior hooks.
pub struct Context<'a> {
    pub tree: &'a mut Tree,
    /// The entity whose hook is running.
    pub id: EntityId,
}

impl<'a> Context<'a> {
    pub fn new(tree: &'a mut Tree, id: EntityId) -> Self {
        Self { tree, id }
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.tree.parent(self.id)
    }

    /// Per-tick delta scaled so that 60 ticks per second is 1.0.
    pub fn delta_time(&self) -> f32 {
        self.tree.delta_time()
    }

    /// Ends the running entity. Reclamation happens after its parent's pass.
    pub fn end_self(&mut self) {
        self.tree.end(self.id);
    }
}
