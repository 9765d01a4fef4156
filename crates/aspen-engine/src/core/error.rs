use crate::api::types::EntityId;

/// Structural changes the tree refuses to make.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The handle does not resolve to a live entity.
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),

    /// An entity cannot own itself.
    #[error("entity {0:?} cannot be its own parent")]
    SelfParent(EntityId),

    /// Attaching would make an entity a descendant of itself.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: EntityId, child: EntityId },
}

/// Errors raised while loading an [`EngineConfig`](crate::core::config::EngineConfig).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but cannot drive the simulation.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
