pub mod broad_phase;
pub mod collision;
pub mod debug;
pub mod transform;
