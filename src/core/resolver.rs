//! Speed/config resolution: host configuration to per-tick pacing and core parameters.
//!
//! Bad values are corrected here, never reported back to the host.

use ambient_sims::{StepParams, MAX_STEPS_PER_ADVANCE};
use serde::{Deserialize, Serialize};

use crate::kind::WidgetKind;

pub const DEFAULT_SPEED: f32 = 1.0;
pub const MIN_SPEED: f32 = 0.1;
pub const MAX_SPEED: f32 = 10.0;

pub const DEFAULT_EXPLOSION_SIZE: f32 = 1.0;
pub const MIN_EXPLOSION_SIZE: f32 = 0.2;
pub const MAX_EXPLOSION_SIZE: f32 = 5.0;

/// Per-instance options as the host sends and persists them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimConfig {
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_explosion_size")]
    pub explosion_size: f32,
}

fn default_speed() -> f32 {
    DEFAULT_SPEED
}

fn default_explosion_size() -> f32 {
    DEFAULT_EXPLOSION_SIZE
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            explosion_size: DEFAULT_EXPLOSION_SIZE,
        }
    }
}

impl SimConfig {
    pub fn with_speed(speed: f32) -> Self {
        Self {
            speed,
            ..Self::default()
        }
    }

    /// Copy with every field inside its supported range.
    pub fn sanitized(&self) -> Self {
        Self {
            speed: clamp_or_default(self.speed, MIN_SPEED, MAX_SPEED, DEFAULT_SPEED),
            explosion_size: clamp_or_default(
                self.explosion_size,
                MIN_EXPLOSION_SIZE,
                MAX_EXPLOSION_SIZE,
                DEFAULT_EXPLOSION_SIZE,
            ),
        }
    }
}

/// Partial update to a [`SimConfig`]. Absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explosion_size: Option<f32>,
}

impl ConfigPatch {
    pub fn speed(speed: f32) -> Self {
        Self {
            speed: Some(speed),
            ..Self::default()
        }
    }

    pub fn apply(&self, base: &SimConfig) -> SimConfig {
        SimConfig {
            speed: self.speed.unwrap_or(base.speed),
            explosion_size: self.explosion_size.unwrap_or(base.explosion_size),
        }
    }
}

impl From<SimConfig> for ConfigPatch {
    fn from(config: SimConfig) -> Self {
        Self {
            speed: Some(config.speed),
            explosion_size: Some(config.explosion_size),
        }
    }
}

fn clamp_or_default(value: f32, min: f32, max: f32, default: f32) -> f32 {
    if !value.is_finite() || value <= 0.0 {
        return default;
    }
    value.clamp(min, max)
}

/// How often an instance advances, in frame ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// Ticks between advances, ≥1.
    pub interval_ticks: u32,
    /// Logical steps per advance, in `1..=MAX_STEPS_PER_ADVANCE`.
    pub steps_per_advance: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            interval_ticks: 1,
            steps_per_advance: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub config: SimConfig,
    pub pacing: Pacing,
    pub params: StepParams,
}

/// Frame ticks per logical step at speed 1.0 (60 Hz reference), or `None`
/// for kinds that fold speed into continuous rates inside the core.
pub fn base_ticks_per_step(kind: WidgetKind) -> Option<f32> {
    match kind {
        WidgetKind::Life => Some(6.0),
        WidgetKind::Maze => Some(0.5),
        WidgetKind::Donut => Some(2.0),
        WidgetKind::Pipes => Some(2.0),
        WidgetKind::Snake => Some(6.0),
        WidgetKind::Fireworks | WidgetKind::Starfield | WidgetKind::Matrix => None,
    }
}

pub fn resolve(kind: WidgetKind, config: &SimConfig) -> Resolved {
    let config = config.sanitized();
    let pacing = match base_ticks_per_step(kind) {
        Some(base) => pacing_for(base / config.speed),
        None => Pacing::default(),
    };
    let params = StepParams {
        // Paced kinds already turned speed into an interval.
        speed: if base_ticks_per_step(kind).is_some() {
            1.0
        } else {
            config.speed
        },
        explosion_size: config.explosion_size,
    };
    Resolved {
        config,
        pacing,
        params,
    }
}

fn pacing_for(ticks_per_step: f32) -> Pacing {
    if ticks_per_step >= 1.0 {
        Pacing {
            interval_ticks: ticks_per_step.round().max(1.0) as u32,
            steps_per_advance: 1,
        }
    } else {
        let steps = (1.0 / ticks_per_step).round() as u32;
        Pacing {
            interval_ticks: 1,
            steps_per_advance: steps.clamp(1, MAX_STEPS_PER_ADVANCE),
        }
    }
}

/// Counts ticks for one instance and says when it is due to advance.
///
/// Never reads the wall clock, so pausing the frame clock loses nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pacer {
    ticks: u32,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_ticks(&self) -> u32 {
        self.ticks
    }

    /// Register one frame tick; returns the number of steps to run now.
    pub fn tick(&mut self, pacing: &Pacing) -> u32 {
        self.ticks += 1;
        if self.ticks >= pacing.interval_ticks.max(1) {
            self.ticks = 0;
            pacing.steps_per_advance
        } else {
            0
        }
    }

    /// Keep accumulated ticks but never more than a new interval allows.
    pub fn retune(&mut self, pacing: &Pacing) {
        self.ticks = self.ticks.min(pacing.interval_ticks.saturating_sub(1));
    }
}
