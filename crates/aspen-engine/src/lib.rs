pub mod api;
pub mod core;
pub mod components;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::behavior::{AsAny, Behavior, Context};
pub use api::types::{Capabilities, EntityId};
pub use core::config::EngineConfig;
pub use core::error::{ConfigError, TreeError};
pub use core::time::{ticks_from_seconds, FixedTimestep, MAX_CATCH_UP_TICKS, TICKS_PER_SECOND};
pub use core::tree::{Hook, Tree};
pub use components::collider::{Collider, Shape};
pub use components::physics::{DragModel, GravityDirection, PhysicsField, Polar};
pub use components::pose::{normalize_degrees, rotate_degrees, Pose};
pub use components::rigidbody::Rigidbody;
pub use components::state::{State, StateManager, StateRef, States};
pub use systems::broad_phase::{broad_phase, CollisionPair};
pub use systems::collision::{
    collider_frame, contains_point, frame_of, resolve_collision, test_collision,
    ColliderFrame, Collision, CollisionResult,
};
pub use systems::debug::{collider_outline, inspect, log_tree, print_tree, Inspector};
