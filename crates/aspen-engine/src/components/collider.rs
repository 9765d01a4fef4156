use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::behavior::{Behavior, Context};
use crate::api::types::Capabilities;
use crate::systems::collision::collider_frame;
use crate::systems::debug::{collider_outline, Inspector};

/// Collider geometry in the owner's local units, before world scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned box; rotation of the owner does not turn it.
    Aabb { width: f32, height: f32 },
}

/// Overlap detection attached to an entity as a child.
///
/// The shape is centered on the owner's world position plus `offset`
/// (rotated with the owner). Trigger colliders report collisions but are
/// never pushed apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    shape: Shape,
    offset: Vec2,
    trigger: bool,
    /// World-space outline from the last update, for debug drawing.
    outline: Vec<[f32; 2]>,
}

impl Collider {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            offset: Vec2::ZERO,
            trigger: false,
            outline: Vec::new(),
        }
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(Shape::Circle { radius })
    }

    pub fn aabb(width: f32, height: f32) -> Self {
        Self::new(Shape::Aabb { width, height })
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Vec2::new(x, y);
        self
    }

    pub fn with_trigger(mut self, trigger: bool) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    /// Radius for circles, `None` for other shapes.
    pub fn radius(&self) -> Option<f32> {
        match self.shape {
            Shape::Circle { radius } => Some(radius),
            _ => None,
        }
    }

    /// Only changes circles.
    pub fn set_radius(&mut self, radius: f32) {
        if let Shape::Circle { radius: r } = &mut self.shape {
            *r = radius;
        }
    }

    /// Width and height for boxes, `None` for other shapes.
    pub fn size(&self) -> Option<(f32, f32)> {
        match self.shape {
            Shape::Aabb { width, height } => Some((width, height)),
            _ => None,
        }
    }

    /// Only changes boxes.
    pub fn set_size(&mut self, width: f32, height: f32) {
        if let Shape::Aabb { width: w, height: h } = &mut self.shape {
            *w = width;
            *h = height;
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, x: f32, y: f32) {
        self.offset = Vec2::new(x, y);
    }

    pub fn is_trigger(&self) -> bool {
        self.trigger
    }

    pub fn set_trigger(&mut self, trigger: bool) {
        self.trigger = trigger;
    }

    pub fn outline(&self) -> &[[f32; 2]] {
        &self.outline
    }
}

impl Behavior for Collider {
    fn capabilities(&self) -> Capabilities {
        Capabilities::COLLIDER
    }

    /// Refreshes the debug outline; collision testing is driven elsewhere.
    fn on_update(&mut self, ctx: &mut Context<'_>) {
        self.outline.clear();
        let Some(owner) = ctx.parent() else {
            return;
        };
        if let Some(frame) = collider_frame(ctx.tree, owner, self) {
            self.outline = collider_outline(frame.center, &frame.shape);
        }
    }

    fn describe(&self, inspector: &mut Inspector) {
        match self.shape {
            Shape::Circle { radius } => inspector.field("Radius", radius),
            Shape::Aabb { width, height } => {
                inspector.field("Size", format!("({:.2}, {:.2})", width, height))
            }
        }
        inspector.field("Offset", format!("({:.2}, {:.2})", self.offset.x, self.offset.y));
        inspector.field("Trigger", self.trigger);
    }
}
