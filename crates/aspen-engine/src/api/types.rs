use bitflags::bitflags;
use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to an entity living in a [`Tree`](crate::core::tree::Tree).
    ///
    /// Handles are generational: once an entity is destroyed its handle never
    /// resolves again, even after the slot is reused.
    pub struct EntityId;
}

bitflags! {
    /// Concerns a behavior takes part in.
    ///
    /// Capability lookups match any entity whose set contains the requested
    /// flags, so a circle and a box collider are both found by `COLLIDER`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        /// Local position/rotation/scale composed along the ancestor chain.
        const POSE = 1 << 0;
        /// Overlap detection and resolution.
        const COLLIDER = 1 << 1;
        /// Velocity/acceleration integration.
        const RIGIDBODY = 1 << 2;
        /// Gravity and drag shared by descendant rigidbodies.
        const PHYSICS_FIELD = 1 << 3;
        /// Named, mutually-exclusive application state.
        const STATE = 1 << 4;
        /// Owner of `STATE` children.
        const STATE_MANAGER = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_sets_compose() {
        let caps = Capabilities::POSE | Capabilities::COLLIDER;
        assert!(caps.contains(Capabilities::COLLIDER));
        assert!(!caps.contains(Capabilities::RIGIDBODY));
        assert!(caps.contains(Capabilities::empty()));
    }

    #[test]
    fn default_handle_is_null() {
        use slotmap::Key;
        assert!(EntityId::default().is_null());
    }
}
