//! Per-kind simulation state behind one tagged union.

use ambient_sims::{
    Canvas, DonutSim, FireworksSim, GlyphRainSim, GridSize, LifeSim, MazeSim, PipesSim,
    Simulation, SnakeSim, StarfieldSim, StepEvent, StepParams,
};

use crate::kind::{Dimensions, WidgetKind};

/// A core's native extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Grid(GridSize),
    Canvas(Canvas),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationState {
    Life(LifeSim),
    Maze(MazeSim),
    Fireworks(FireworksSim),
    Donut(DonutSim),
    Matrix(GlyphRainSim),
    Starfield(StarfieldSim),
    Pipes(PipesSim),
    Snake(SnakeSim),
}

impl SimulationState {
    pub fn init(kind: WidgetKind, dims: &Dimensions, seed: u64) -> Self {
        let grid = dims.grid_for(kind);
        let canvas = dims.canvas();
        match kind {
            WidgetKind::Life => Self::Life(LifeSim::init(grid, seed)),
            WidgetKind::Maze => Self::Maze(MazeSim::init(grid, seed)),
            WidgetKind::Fireworks => Self::Fireworks(FireworksSim::init(canvas, seed)),
            WidgetKind::Donut => Self::Donut(DonutSim::init(canvas, seed)),
            WidgetKind::Matrix => Self::Matrix(GlyphRainSim::init(grid, seed)),
            WidgetKind::Starfield => Self::Starfield(StarfieldSim::init(canvas, seed)),
            WidgetKind::Pipes => Self::Pipes(PipesSim::init(grid, seed)),
            WidgetKind::Snake => Self::Snake(SnakeSim::init(grid, seed)),
        }
    }

    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::Life(_) => WidgetKind::Life,
            Self::Maze(_) => WidgetKind::Maze,
            Self::Fireworks(_) => WidgetKind::Fireworks,
            Self::Donut(_) => WidgetKind::Donut,
            Self::Matrix(_) => WidgetKind::Matrix,
            Self::Starfield(_) => WidgetKind::Starfield,
            Self::Pipes(_) => WidgetKind::Pipes,
            Self::Snake(_) => WidgetKind::Snake,
        }
    }

    pub fn extent(&self) -> Extent {
        match self {
            Self::Life(s) => Extent::Grid(s.extent()),
            Self::Maze(s) => Extent::Grid(s.extent()),
            Self::Fireworks(s) => Extent::Canvas(s.extent()),
            Self::Donut(s) => Extent::Canvas(s.extent()),
            Self::Matrix(s) => Extent::Grid(s.extent()),
            Self::Starfield(s) => Extent::Canvas(s.extent()),
            Self::Pipes(s) => Extent::Grid(s.extent()),
            Self::Snake(s) => Extent::Grid(s.extent()),
        }
    }

    pub fn advance(&mut self, steps: u32, params: &StepParams) -> StepEvent {
        if steps == 0 {
            return StepEvent::Steady;
        }
        match self {
            Self::Life(s) => s.advance(steps, params),
            Self::Maze(s) => s.advance(steps, params),
            Self::Fireworks(s) => s.advance(steps, params),
            Self::Donut(s) => s.advance(steps, params),
            Self::Matrix(s) => s.advance(steps, params),
            Self::Starfield(s) => s.advance(steps, params),
            Self::Pipes(s) => s.advance(steps, params),
            Self::Snake(s) => s.advance(steps, params),
        }
    }

    /// Forward new container dimensions to the core in its native extent.
    pub fn resize(&mut self, dims: &Dimensions) {
        let kind = self.kind();
        let grid = dims.grid_for(kind);
        let canvas = dims.canvas();
        match self {
            Self::Life(s) => s.resize(grid),
            Self::Maze(s) => s.resize(grid),
            Self::Fireworks(s) => s.resize(canvas),
            Self::Donut(s) => s.resize(canvas),
            Self::Matrix(s) => s.resize(grid),
            Self::Starfield(s) => s.resize(canvas),
            Self::Pipes(s) => s.resize(grid),
            Self::Snake(s) => s.resize(grid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_extent(kind: WidgetKind, dims: &Dimensions) -> Extent {
        match kind {
            WidgetKind::Fireworks | WidgetKind::Donut | WidgetKind::Starfield => {
                Extent::Canvas(dims.canvas())
            }
            _ => Extent::Grid(dims.grid_for(kind)),
        }
    }

    #[test]
    fn extent_tracks_latest_dimensions_through_steps() {
        let params = StepParams::default();
        for kind in WidgetKind::ALL {
            for dims in [
                Dimensions::new(0.0, 0.0),
                Dimensions::new(1.0, 1.0),
                Dimensions::new(3.0, 500.0),
                Dimensions::default(),
            ] {
                let mut state = SimulationState::init(kind, &dims, 11);
                assert_eq!(state.kind(), kind);
                assert_eq!(state.extent(), expected_extent(kind, &dims), "{kind}");
                for _ in 0..40 {
                    state.advance(3, &params);
                }
                assert_eq!(state.extent(), expected_extent(kind, &dims), "{kind}");

                let degenerate = Dimensions::new(-10.0, f32::NAN);
                state.resize(&degenerate);
                state.advance(1, &params);
                assert_eq!(state.extent(), expected_extent(kind, &degenerate), "{kind}");

                let last = Dimensions::new(410.0, 170.0);
                state.resize(&last);
                for _ in 0..20 {
                    state.advance(2, &params);
                }
                assert_eq!(state.extent(), expected_extent(kind, &last), "{kind}");
            }
        }
    }

    #[test]
    fn resize_twice_equals_resize_once() {
        for kind in WidgetKind::ALL {
            let mut state = SimulationState::init(kind, &Dimensions::default(), 5);
            state.advance(4, &StepParams::default());
            let target = Dimensions::new(200.0, 150.0);
            state.resize(&target);
            let once = state.clone();
            state.resize(&target);
            assert_eq!(state, once, "{kind}");
        }
    }

    #[test]
    fn zero_steps_leave_state_untouched() {
        for kind in WidgetKind::ALL {
            let mut state = SimulationState::init(kind, &Dimensions::default(), 9);
            let before = state.clone();
            assert_eq!(state.advance(0, &StepParams::default()), StepEvent::Steady);
            assert_eq!(state, before);
        }
    }
}
