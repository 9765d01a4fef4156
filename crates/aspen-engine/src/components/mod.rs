pub mod collider;
pub mod physics;
pub mod pose;
pub mod rigidbody;
pub mod state;
