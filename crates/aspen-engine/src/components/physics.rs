use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::api::behavior::Behavior;
use crate::api::types::{Capabilities, EntityId};
use crate::core::tree::Tree;
use crate::systems::debug::Inspector;

/// Named gravity directions, in radians.
pub struct GravityDirection;

impl GravityDirection {
    pub const LEFT: f32 = 0.0;
    pub const DOWN: f32 = FRAC_PI_2;
    pub const RIGHT: f32 = PI;
    pub const UP: f32 = PI * 1.5;
}

/// A (strength, direction) pair. Direction is in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Polar {
    pub strength: f32,
    pub direction: f32,
}

impl Polar {
    pub const ZERO: Self = Self { strength: 0.0, direction: 0.0 };

    pub fn new(strength: f32, direction: f32) -> Self {
        Self { strength, direction }
    }

    pub fn from_vec2(v: Vec2) -> Self {
        Self {
            strength: v.length(),
            direction: v.y.atan2(v.x),
        }
    }

    pub fn x(&self) -> f32 {
        self.strength * self.direction.cos()
    }

    pub fn y(&self) -> f32 {
        self.strength * self.direction.sin()
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x(), self.y())
    }
}

/// How velocity decays each tick under the field's drag factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragModel {
    /// `strength *= drag * dt`. Scales with tick length, so a drag of 1 only
    /// leaves velocity untouched at exactly 60 ticks per second.
    #[default]
    Linear,
    /// `strength *= drag.powf(dt)`. Frame-rate independent.
    Exponential,
    /// `strength *= 1 - drag * dt`, clamped at zero: velocity is damped
    /// proportionally to itself.
    Damping,
}

impl DragModel {
    /// Velocity strength after one tick of decay.
    pub fn apply(self, strength: f32, drag: f32, dt: f32) -> f32 {
        match self {
            DragModel::Linear => strength * drag * dt,
            DragModel::Exponential => strength * drag.powf(dt),
            DragModel::Damping => strength * (1.0 - drag * dt).max(0.0),
        }
    }
}

/// Global force field shared by every rigidbody below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsField {
    gravity: Polar,
    drag: f32,
    drag_model: DragModel,
}

impl Default for PhysicsField {
    fn default() -> Self {
        Self::new(1.0, GravityDirection::DOWN)
    }
}

impl PhysicsField {
    pub fn new(strength: f32, direction: f32) -> Self {
        Self {
            gravity: Polar::new(strength, direction),
            drag: 1.0,
            drag_model: DragModel::Linear,
        }
    }

    pub fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag;
        self
    }

    pub fn with_drag_model(mut self, model: DragModel) -> Self {
        self.drag_model = model;
        self
    }

    pub fn gravity(&self) -> Polar {
        self.gravity
    }

    pub fn gravity_strength(&self) -> f32 {
        self.gravity.strength
    }

    pub fn gravity_direction(&self) -> f32 {
        self.gravity.direction
    }

    pub fn gravity_x(&self) -> f32 {
        self.gravity.x()
    }

    pub fn gravity_y(&self) -> f32 {
        self.gravity.y()
    }

    pub fn gravity_vec(&self) -> Vec2 {
        self.gravity.to_vec2()
    }

    pub fn set_gravity_strength(&mut self, strength: f32) {
        self.gravity.strength = strength;
    }

    pub fn set_gravity_direction(&mut self, direction: f32) {
        self.gravity.direction = direction;
    }

    /// Set gravity from Cartesian components.
    pub fn set_gravity(&mut self, x: f32, y: f32) {
        self.gravity = Polar::from_vec2(Vec2::new(x, y));
    }

    pub fn drag(&self) -> f32 {
        self.drag
    }

    pub fn set_drag(&mut self, drag: f32) {
        self.drag = drag;
    }

    pub fn drag_model(&self) -> DragModel {
        self.drag_model
    }

    pub fn set_drag_model(&mut self, model: DragModel) {
        self.drag_model = model;
    }
}

impl Behavior for PhysicsField {
    fn capabilities(&self) -> Capabilities {
        Capabilities::PHYSICS_FIELD
    }

    fn describe(&self, inspector: &mut Inspector) {
        inspector.field("Gravity Strength", self.gravity.strength);
        inspector.field("Gravity Direction", self.gravity.direction);
        inspector.field("Drag", self.drag);
        inspector.field("Drag Model", format!("{:?}", self.drag_model));
    }
}

impl Tree {
    /// Nearest field above `id`: an ancestor that is a field, or that owns one.
    pub fn find_physics_field(&self, id: EntityId) -> Option<EntityId> {
        self.ancestors(id).find_map(|a| {
            if self.is::<PhysicsField>(a) {
                Some(a)
            } else {
                self.find_child::<PhysicsField>(a)
            }
        })
    }
}
