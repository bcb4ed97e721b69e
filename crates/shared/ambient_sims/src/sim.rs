//! The contract every simulation core implements.

use serde::{Deserialize, Serialize};

/// Upper bound on logical steps processed by one `advance` call, so a long
/// pause (or a very high speed) never turns into an unbounded catch-up burst.
pub const MAX_STEPS_PER_ADVANCE: u32 = 8;

#[inline]
pub(crate) fn bounded_steps(steps: u32) -> u32 {
    steps.min(MAX_STEPS_PER_ADVANCE)
}

/// Clamped per-instance knobs, resolved by the host from its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepParams {
    /// Relative animation speed, 1.0 = default.
    pub speed: f32,
    /// Burst radius multiplier (fireworks only).
    pub explosion_size: f32,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            explosion_size: 1.0,
        }
    }
}

/// What happened during an `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StepEvent {
    Steady,
    /// Deliberate restart: stagnation recovery, finished maze, full pipe grid,
    /// full snake grid.
    Reseeded,
    /// An internal invariant broke and the core re-initialised itself.
    Reset,
}

impl StepEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            StepEvent::Steady => "steady",
            StepEvent::Reseeded => "reseeded",
            StepEvent::Reset => "reset",
        }
    }

    /// Keep the most severe of two events.
    pub fn merge(self, other: StepEvent) -> StepEvent {
        self.max(other)
    }
}

pub trait Simulation: Clone {
    /// Native extent: `GridSize` for cell kinds, `Canvas` for free-space kinds.
    type Extent: Copy + PartialEq;

    fn init(extent: Self::Extent, seed: u64) -> Self;

    fn extent(&self) -> Self::Extent;

    /// Advance `steps` logical steps in place.
    fn advance(&mut self, steps: u32, params: &StepParams) -> StepEvent;

    /// Adopt a new extent. Resizing to the current extent is a no-op.
    fn resize(&mut self, extent: Self::Extent);

    /// Pure form of [`Simulation::advance`]: the receiver is left untouched.
    fn step(&self, steps: u32, params: &StepParams) -> Self {
        let mut next = self.clone();
        next.advance(steps, params);
        next
    }
}
