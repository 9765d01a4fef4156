use serde::{Deserialize, Serialize};

use crate::components::physics::{DragModel, GravityDirection, PhysicsField};
use crate::core::error::ConfigError;
use crate::core::time::{FixedTimestep, TICKS_PER_SECOND};

/// Engine-wide simulation settings.
///
/// Every field has a default, so a JSON document only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Gravity strength per tick (default: 1).
    pub gravity_strength: f32,
    /// Gravity direction in radians (default: down).
    pub gravity_direction: f32,
    /// Velocity drag factor (default: 1, no decay under the linear model).
    pub drag: f32,
    pub drag_model: DragModel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / TICKS_PER_SECOND,
            gravity_strength: 1.0,
            gravity_direction: GravityDirection::DOWN,
            drag: 1.0,
            drag_model: DragModel::Linear,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt > 0.0) || !self.fixed_dt.is_finite() {
            return Err(ConfigError::Invalid {
                field: "fixed_dt",
                reason: format!("must be a positive number of seconds, got {}", self.fixed_dt),
            });
        }
        if self.drag < 0.0 || !self.drag.is_finite() {
            return Err(ConfigError::Invalid {
                field: "drag",
                reason: format!("must be finite and non-negative, got {}", self.drag),
            });
        }
        Ok(())
    }

    /// Build the global force field described by this config.
    pub fn physics_field(&self) -> PhysicsField {
        PhysicsField::new(self.gravity_strength, self.gravity_direction)
            .with_drag(self.drag)
            .with_drag_model(self.drag_model)
    }

    pub fn timestep(&self) -> FixedTimestep {
        FixedTimestep::new(self.fixed_dt)
    }
}
