use glam::Vec2;

use crate::api::behavior::{Behavior, Context};
use crate::api::types::Capabilities;
use crate::components::physics::{PhysicsField, Polar};
use crate::components::pose::Pose;
use crate::systems::debug::Inspector;

/// Velocity/acceleration integrator for the entity that owns it.
///
/// Each tick it reads the nearest [`PhysicsField`] and the tree's delta time,
/// then moves the owner's pose by the resulting velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rigidbody {
    mass: f32,
    velocity: Polar,
    acceleration: Polar,
    gravity_scale: f32,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Rigidbody {
    pub fn new(mass: f32) -> Self {
        Self {
            mass,
            velocity: Polar::ZERO,
            acceleration: Polar::ZERO,
            gravity_scale: 1.0,
        }
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
    }

    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = scale;
    }

    // -- Velocity --

    pub fn velocity(&self) -> Polar {
        self.velocity
    }

    pub fn velocity_strength(&self) -> f32 {
        self.velocity.strength
    }

    pub fn velocity_direction(&self) -> f32 {
        self.velocity.direction
    }

    pub fn velocity_x(&self) -> f32 {
        self.velocity.x()
    }

    pub fn velocity_y(&self) -> f32 {
        self.velocity.y()
    }

    pub fn velocity_vec(&self) -> Vec2 {
        self.velocity.to_vec2()
    }

    pub fn set_velocity_strength(&mut self, strength: f32) {
        self.velocity.strength = strength;
    }

    pub fn set_velocity_direction(&mut self, direction: f32) {
        self.velocity.direction = direction;
    }

    pub fn set_velocity(&mut self, strength: f32, direction: f32) {
        self.velocity = Polar::new(strength, direction);
    }

    pub fn set_cartesian_velocity(&mut self, x: f32, y: f32) {
        self.velocity = Polar::from_vec2(Vec2::new(x, y));
    }

    // -- Acceleration --

    pub fn acceleration(&self) -> Polar {
        self.acceleration
    }

    pub fn acceleration_strength(&self) -> f32 {
        self.acceleration.strength
    }

    pub fn acceleration_direction(&self) -> f32 {
        self.acceleration.direction
    }

    pub fn acceleration_x(&self) -> f32 {
        self.acceleration.x()
    }

    pub fn acceleration_y(&self) -> f32 {
        self.acceleration.y()
    }

    pub fn acceleration_vec(&self) -> Vec2 {
        self.acceleration.to_vec2()
    }

    pub fn set_acceleration_strength(&mut self, strength: f32) {
        self.acceleration.strength = strength;
    }

    pub fn set_acceleration_direction(&mut self, direction: f32) {
        self.acceleration.direction = direction;
    }

    pub fn set_acceleration(&mut self, strength: f32, direction: f32) {
        self.acceleration = Polar::new(strength, direction);
    }

    pub fn set_cartesian_acceleration(&mut self, x: f32, y: f32) {
        self.acceleration = Polar::from_vec2(Vec2::new(x, y));
    }

    // -- Forces --

    /// Add `force / mass` along `angle` (radians) to the acceleration.
    ///
    /// The change persists until the acceleration is overwritten.
    pub fn apply_force(&mut self, force: f32, angle: f32) {
        self.apply_cartesian_force(force * angle.cos(), force * angle.sin());
    }

    /// Ignored, with a warning, while the mass is zero.
    pub fn apply_cartesian_force(&mut self, x: f32, y: f32) {
        if self.mass == 0.0 {
            log::warn!("Ignoring force ({}, {}) on a massless rigidbody", x, y);
            return;
        }
        let delta = Vec2::new(x, y) / self.mass;
        self.acceleration = Polar::from_vec2(self.acceleration.to_vec2() + delta);
    }

    /// Advance one tick and return the displacement to apply to the owner.
    ///
    /// Order: drag decay, gravity accumulated into acceleration, acceleration
    /// integrated into velocity. Gravity is never reset, so a body in a
    /// constant field keeps gaining acceleration.
    pub fn integrate(&mut self, field: &PhysicsField, dt: f32) -> Vec2 {
        self.velocity.strength = field
            .drag_model()
            .apply(self.velocity.strength, field.drag(), dt);
        let acceleration = self.acceleration.to_vec2() + field.gravity_vec() * self.gravity_scale;
        self.acceleration = Polar::from_vec2(acceleration);
        let velocity = self.velocity.to_vec2() + acceleration * dt;
        self.velocity = Polar::from_vec2(velocity);
        velocity
    }
}

impl Behavior for Rigidbody {
    fn capabilities(&self) -> Capabilities {
        Capabilities::RIGIDBODY
    }

    fn on_update(&mut self, ctx: &mut Context<'_>) {
        let Some(owner) = ctx.parent() else {
            return;
        };
        let Some(field_id) = ctx.tree.find_physics_field(ctx.id) else {
            log::error!(
                "{} requires an ancestor with a PhysicsField",
                ctx.tree.name(ctx.id).unwrap_or("Rigidbody")
            );
            return;
        };
        let Some(field) = ctx.tree.get::<PhysicsField>(field_id).copied() else {
            return;
        };
        let Some(pose_id) = ctx.tree.get_pose(owner) else {
            log::warn!(
                "{} requires a parent with a Pose child",
                ctx.tree.name(ctx.id).unwrap_or("Rigidbody")
            );
            return;
        };
        let dt = ctx.delta_time();
        let displacement = self.integrate(&field, dt);
        if let Some(pose) = ctx.tree.get_mut::<Pose>(pose_id) {
            pose.translate(displacement);
        }
    }

    fn describe(&self, inspector: &mut Inspector) {
        inspector.field("Mass", self.mass);
        inspector.field("Velocity Strength", self.velocity.strength);
        inspector.field("Velocity Direction", self.velocity.direction);
        let v = self.velocity.to_vec2();
        inspector.field("Cartesian Velocity", format!("({:.4}, {:.4})", v.x, v.y));
        inspector.field("Acceleration Strength", self.acceleration.strength);
        inspector.field("Acceleration Direction", self.acceleration.direction);
        inspector.field("Gravity Scale", self.gravity_scale);
    }
}
