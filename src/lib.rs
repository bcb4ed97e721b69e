//! Ambient simulation widget engine.
//!
//! Hosts create widget instances through [`registry::WidgetRegistry`], drive
//! its frame clock once per display refresh, report container sizes, and draw
//! the primitives returned by `render`. The simulations themselves live in the
//! `ambient_sims` crate.

#[cfg(feature = "std")]
#[path = "core/time.rs"]
pub mod time;

#[path = "core/clock.rs"]
pub mod clock;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/kind.rs"]
pub mod kind;

#[path = "core/protocol.rs"]
pub mod protocol;

#[path = "core/registry.rs"]
pub mod registry;

#[path = "core/render.rs"]
pub mod render;

#[path = "core/resolver.rs"]
pub mod resolver;

#[path = "core/state.rs"]
pub mod state;

pub use ambient_sims as sims;

pub mod prelude {
    pub use crate::clock::{FrameClock, FrameTick, Subscription};
    pub use crate::error::RegistryError;
    pub use crate::kind::{Dimensions, UnknownKind, WidgetKind};
    pub use crate::registry::{ActiveWidgets, InstanceInfo, PersistedWidget, WidgetRegistry};
    pub use crate::render::{rasterize_text, DrawPrimitive, Paint};
    pub use crate::resolver::{resolve, ConfigPatch, Pacing, Resolved, SimConfig};
    pub use crate::state::SimulationState;
}
