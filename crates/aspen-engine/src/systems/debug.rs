//! Debug helpers: inspector fields, collider outlines, tree dumps.
//!
//! Nothing here draws. Outlines are plain point lists and inspector output
//! is label/value text, so any overlay can consume them.

use std::fmt::{Display, Write};

use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::collider::Shape;
use crate::core::tree::Tree;

/// Label/value pairs collected from a behavior's `describe` hook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inspector {
    fields: Vec<(String, String)>,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&mut self, label: &str, value: impl Display) {
        self.fields.push((label.to_string(), value.to_string()));
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Value of the first field with `label`.
    pub fn value(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }
}

impl Display for Inspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (label, value) in &self.fields {
            writeln!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

/// Common entity fields followed by whatever the behavior describes.
pub fn inspect(tree: &Tree, id: EntityId) -> Option<Inspector> {
    let name = tree.name(id)?;
    let mut inspector = Inspector::new();
    inspector.field("Name", name);
    inspector.field("Valid", tree.is_valid(id));
    inspector.field("Active", tree.is_active_self(id));
    inspector.field("Children", tree.child_count(id));
    if let Some(behavior) = tree.behavior(id) {
        behavior.describe(&mut inspector);
    }
    Some(inspector)
}

/// Generate outline points for a world-placed collider shape.
pub fn collider_outline(center: Vec2, shape: &Shape) -> Vec<[f32; 2]> {
    match *shape {
        Shape::Circle { radius } => {
            // 24-segment circle
            let segments = 24;
            let mut points = Vec::with_capacity(segments + 1);
            for i in 0..=segments {
                let angle = (i as f32 / segments as f32) * std::f32::consts::TAU;
                points.push([
                    center.x + angle.cos() * radius,
                    center.y + angle.sin() * radius,
                ]);
            }
            points
        }
        Shape::Aabb { width, height } => {
            let (hw, hh) = (width * 0.5, height * 0.5);
            let corners: [[f32; 2]; 4] = [[-hw, -hh], [hw, -hh], [hw, hh], [-hw, hh]];
            let mut points: Vec<[f32; 2]> = corners
                .iter()
                .map(|[lx, ly]| [center.x + lx, center.y + ly])
                .collect();
            // Close the loop
            points.push(points[0]);
            points
        }
    }
}

/// Indented dump of the subtree under `root`, one entity per line.
///
/// Inactive entities are marked with `(inactive)`.
pub fn print_tree(tree: &Tree, root: EntityId) -> String {
    let mut out = String::new();
    write_node(tree, root, "", true, true, &mut out);
    out
}

/// Send [`print_tree`] output to the debug log.
pub fn log_tree(tree: &Tree, root: EntityId) {
    for line in print_tree(tree, root).lines() {
        log::debug!("{}", line);
    }
}

fn write_node(tree: &Tree, id: EntityId, prefix: &str, last: bool, top: bool, out: &mut String) {
    let Some(name) = tree.name(id) else {
        return;
    };
    let connector = match (top, last) {
        (true, _) => "",
        (false, true) => "\\... ",
        (false, false) => "+--- ",
    };
    let marker = if tree.is_active_self(id) { "" } else { " (inactive)" };
    let _ = writeln!(out, "{}{}{}{}", prefix, connector, name, marker);

    let child_prefix = match (top, last) {
        (true, _) => prefix.to_string(),
        (false, true) => format!("{}     ", prefix),
        (false, false) => format!("{}|    ", prefix),
    };
    let children = tree.children(id);
    for (i, &child) in children.iter().enumerate() {
        write_node(tree, child, &child_prefix, i + 1 == children.len(), false, out);
    }
}
