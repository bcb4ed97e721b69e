//! Deterministic simulation cores for the ambient widgets.
//!
//! Every core implements [`Simulation`]: seeded construction, bounded
//! in-place advancing, and resizing that is a no-op for an unchanged extent.
//! Nothing here reads a clock or logs; hosts decide when to step and report
//! the [`StepEvent`]s they get back.

pub mod geom;
pub mod prng;
pub mod sim;

pub mod donut;
pub mod fireworks;
pub mod life;
pub mod maze;
pub mod pipes;
pub mod rain;
pub mod snake;
pub mod starfield;

pub use geom::{Canvas, Dir, GridSize, Rgb, MAX_CANVAS_SIDE, MAX_GRID_SIDE, PALETTE};
pub use prng::Prng;
pub use sim::{Simulation, StepEvent, StepParams, MAX_STEPS_PER_ADVANCE};

pub use donut::DonutSim;
pub use fireworks::FireworksSim;
pub use life::LifeSim;
pub use maze::MazeSim;
pub use pipes::PipesSim;
pub use rain::GlyphRainSim;
pub use snake::SnakeSim;
pub use starfield::StarfieldSim;
