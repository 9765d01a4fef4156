use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::api::behavior::Behavior;
use crate::api::types::Capabilities;
use crate::systems::debug::Inspector;

/// Wrap degrees into [0, 360).
pub fn normalize_degrees(degrees: f32) -> f32 {
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Rotate `v` counter-clockwise by `degrees`.
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    let (sin_r, cos_r) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos_r - v.y * sin_r, v.x * sin_r + v.y * cos_r)
}

/// Local 2D pose: position, rotation in degrees, non-uniform scale.
///
/// Attached to an entity as a child; world values are composed on demand
/// through the ancestor chain (see [`crate::systems::transform`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    position: Vec2,
    /// Degrees, always within [0, 360).
    rotation: f32,
    scale: Vec2,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(position: Vec2, rotation: f32, scale: Vec2) -> Self {
        Self {
            position,
            rotation: normalize_degrees(rotation),
            scale,
        }
    }

    // -- Builder pattern --

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.set_rotation(degrees);
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32) -> Self {
        self.scale = Vec2::new(x, y);
        self
    }

    // -- Setters --

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
    }

    pub fn set_x(&mut self, x: f32) {
        self.position.x = x;
    }

    pub fn set_y(&mut self, y: f32) {
        self.position.y = y;
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = normalize_degrees(degrees);
    }

    pub fn set_scale(&mut self, x: f32, y: f32) {
        self.scale = Vec2::new(x, y);
    }

    pub fn set_x_scale(&mut self, x: f32) {
        self.scale.x = x;
    }

    pub fn set_y_scale(&mut self, y: f32) {
        self.scale.y = y;
    }

    // -- Relative modifiers --

    pub fn modify_position(&mut self, x: f32, y: f32) {
        self.position += Vec2::new(x, y);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub fn modify_x(&mut self, x: f32) {
        self.position.x += x;
    }

    pub fn modify_y(&mut self, y: f32) {
        self.position.y += y;
    }

    pub fn modify_rotation(&mut self, degrees: f32) {
        self.rotation = normalize_degrees(self.rotation + degrees);
    }

    /// Multiplies the current scale.
    pub fn modify_scale(&mut self, x: f32, y: f32) {
        self.scale *= Vec2::new(x, y);
    }

    pub fn modify_x_scale(&mut self, x: f32) {
        self.scale.x *= x;
    }

    pub fn modify_y_scale(&mut self, y: f32) {
        self.scale.y *= y;
    }

    // -- Local getters --

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// The pose that undoes this one when composed after it.
    ///
    /// Zero scale components invert to zero rather than infinity.
    pub fn inverse(&self) -> Pose {
        let inv = |s: f32| if s == 0.0 { 0.0 } else { 1.0 / s };
        Pose {
            position: rotate_degrees(-self.position, -self.rotation),
            rotation: normalize_degrees(-self.rotation),
            scale: Vec2::new(inv(self.scale.x), inv(self.scale.y)),
        }
    }
}

/// Component-wise accumulation: positions add, rotations add, scales multiply.
impl Add for Pose {
    type Output = Pose;

    fn add(mut self, rhs: Pose) -> Pose {
        self += rhs;
        self
    }
}

impl AddAssign for Pose {
    fn add_assign(&mut self, rhs: Pose) {
        self.position += rhs.position;
        self.modify_rotation(rhs.rotation);
        self.scale *= rhs.scale;
    }
}

impl Behavior for Pose {
    fn capabilities(&self) -> Capabilities {
        Capabilities::POSE
    }

    fn describe(&self, inspector: &mut Inspector) {
        inspector.field("Position", format!("({:.2}, {:.2})", self.position.x, self.position.y));
        inspector.field("Rotation", format!("{:.2}", self.rotation));
        inspector.field("Scale", format!("({:.2}, {:.2})", self.scale.x, self.scale.y));
    }
}
