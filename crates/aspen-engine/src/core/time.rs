/// Simulation rate the per-tick delta is normalized to.
pub const TICKS_PER_SECOND: f32 = 60.0;

/// Most ticks a single frame may catch up on; slower frames drop time.
pub const MAX_CATCH_UP_TICKS: u32 = 10;

/// Convert wall-clock seconds into tick units: 1/60 s is 1.0.
pub fn ticks_from_seconds(seconds: f32) -> f32 {
    seconds * TICKS_PER_SECOND
}

/// Splits variable frame times into whole simulation ticks of fixed length.
///
/// Drive a tree with [`Tree::advance`](crate::core::tree::Tree::advance); the
/// tick length becomes the tree's delta time in tick units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    tick_seconds: f32,
    /// Frame time not yet consumed by a tick.
    carry: f32,
}

impl FixedTimestep {
    pub fn new(tick_seconds: f32) -> Self {
        Self {
            tick_seconds,
            carry: 0.0,
        }
    }

    /// Bank `frame_seconds` and return how many ticks are now due.
    pub fn accumulate(&mut self, frame_seconds: f32) -> u32 {
        let banked = self.carry + frame_seconds.max(0.0);
        let due = (banked / self.tick_seconds) as u32;
        if due >= MAX_CATCH_UP_TICKS {
            self.carry = 0.0;
            return MAX_CATCH_UP_TICKS;
        }
        self.carry = (banked - due as f32 * self.tick_seconds).max(0.0);
        due
    }

    /// Share of a tick still banked, for interpolating between poses.
    pub fn alpha(&self) -> f32 {
        self.carry / self.tick_seconds
    }

    pub fn dt(&self) -> f32 {
        self.tick_seconds
    }

    /// The tick length in tick units, as stored on the tree.
    pub fn tick_delta(&self) -> f32 {
        ticks_from_seconds(self.tick_seconds)
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(1.0 / TICKS_PER_SECOND)
    }
}
