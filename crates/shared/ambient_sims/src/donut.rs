//! Spinning ASCII torus, after the classic `donut.c`.
//!
//! The two rotation angles are kept as integer phase accumulators, so after
//! [`CYCLE_STEPS`] steps both return exactly to their starting values and the
//! animation is periodic to the bit. The projection is a pure function of the
//! phases and the output grid, which is always the full canvas.

use crate::geom::Canvas;
use crate::sim::{bounded_steps, Simulation, StepEvent, StepParams};
use std::f32::consts::TAU;

/// Steps for the X-axis angle to complete one turn.
pub const A_STEPS_PER_TURN: u32 = 160;
/// Steps for the Z-axis angle to complete one turn.
pub const B_STEPS_PER_TURN: u32 = 320;
/// Steps after which both angles are back where they started.
pub const CYCLE_STEPS: u32 = B_STEPS_PER_TURN;

/// Luminance ramp, darkest to brightest.
pub const LUMINANCE_RAMP: &[u8; 12] = b".,-~:;=!*#$@";

const THETA_STEP: f32 = 0.07;
const PHI_STEP: f32 = 0.02;
const R1: f32 = 1.0;
const R2: f32 = 2.0;
const K2: f32 = 5.0;

/// One projected frame: `cells[row * cols + col]` holds a ramp index or `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct DonutFrame {
    pub cols: u32,
    pub rows: u32,
    pub cells: Vec<Option<u8>>,
}

impl DonutFrame {
    pub fn glyph(&self, col: u32, row: u32) -> Option<char> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.cells[(row as usize) * (self.cols as usize) + col as usize]
            .map(|i| LUMINANCE_RAMP[i as usize] as char)
    }

    pub fn lit_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DonutSim {
    canvas: Canvas,
    a_phase: u32,
    b_phase: u32,
}

impl DonutSim {
    pub fn angles(&self) -> (f32, f32) {
        (
            self.a_phase as f32 * TAU / A_STEPS_PER_TURN as f32,
            self.b_phase as f32 * TAU / B_STEPS_PER_TURN as f32,
        )
    }

    pub fn phases(&self) -> (u32, u32) {
        (self.a_phase, self.b_phase)
    }

    /// Project the torus onto a `cols × rows` character grid.
    ///
    /// Character cells are assumed to be about twice as tall as they are wide.
    pub fn frame(&self, cols: u32, rows: u32) -> DonutFrame {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let n = (cols as usize) * (rows as usize);
        let mut cells: Vec<Option<u8>> = vec![None; n];
        let mut zbuf = vec![0.0f32; n];

        let (a, b) = self.angles();
        let (sin_a, cos_a) = a.sin_cos();
        let (sin_b, cos_b) = b.sin_cos();

        // Fit the torus (outer radius R1 + R2) into the smaller screen axis.
        let fit = (cols as f32).min(rows as f32 * 2.0);
        let k1 = fit * K2 * 3.0 / (8.0 * (R1 + R2));
        let half_w = cols as f32 * 0.5;
        let half_h = rows as f32 * 0.5;

        let theta_samples = (TAU / THETA_STEP).ceil() as u32;
        let phi_samples = (TAU / PHI_STEP).ceil() as u32;

        for ti in 0..theta_samples {
            let (sin_t, cos_t) = (ti as f32 * THETA_STEP).sin_cos();
            let circle_x = R2 + R1 * cos_t;
            let circle_y = R1 * sin_t;

            for pi in 0..phi_samples {
                let (sin_p, cos_p) = (pi as f32 * PHI_STEP).sin_cos();

                let x = circle_x * (cos_b * cos_p + sin_a * sin_b * sin_p) - circle_y * cos_a * sin_b;
                let y = circle_x * (sin_b * cos_p - sin_a * cos_b * sin_p) + circle_y * cos_a * cos_b;
                let z = K2 + cos_a * circle_x * sin_p + circle_y * sin_a;
                let ooz = 1.0 / z;

                let xp = (half_w + k1 * ooz * x).floor();
                let yp = (half_h - k1 * 0.5 * ooz * y).floor();
                if xp < 0.0 || yp < 0.0 || xp >= cols as f32 || yp >= rows as f32 {
                    continue;
                }

                // Surface normal · light direction (0, 1, -1).
                let lum = cos_p * cos_t * sin_b - cos_a * cos_t * sin_p - sin_a * sin_t
                    + cos_b * (cos_a * sin_t - cos_t * sin_a * sin_p);
                if lum <= 0.0 {
                    continue;
                }

                let idx = (yp as usize) * (cols as usize) + xp as usize;
                if ooz > zbuf[idx] {
                    zbuf[idx] = ooz;
                    let level = ((lum * 8.0) as usize).min(LUMINANCE_RAMP.len() - 1);
                    cells[idx] = Some(level as u8);
                }
            }
        }

        DonutFrame { cols, rows, cells }
    }
}

impl Simulation for DonutSim {
    type Extent = Canvas;

    fn init(canvas: Canvas, _seed: u64) -> Self {
        Self {
            canvas: canvas.clamped(),
            a_phase: 0,
            b_phase: 0,
        }
    }

    fn extent(&self) -> Canvas {
        self.canvas
    }

    fn advance(&mut self, steps: u32, _params: &StepParams) -> StepEvent {
        let steps = bounded_steps(steps);
        self.a_phase = (self.a_phase + steps) % A_STEPS_PER_TURN;
        self.b_phase = (self.b_phase + steps) % B_STEPS_PER_TURN;
        StepEvent::Steady
    }

    fn resize(&mut self, canvas: Canvas) {
        self.canvas = canvas.clamped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_periodic_over_a_full_cycle() {
        let mut sim = DonutSim::init(Canvas::new(640.0, 480.0), 0);
        let first = sim.frame(80, 24);
        assert!(first.lit_cells() > 0);

        let params = StepParams::default();
        for _ in 0..CYCLE_STEPS {
            sim.advance(1, &params);
        }
        assert_eq!(sim.phases(), (0, 0));
        assert_eq!(sim.frame(80, 24), first);
    }

    #[test]
    fn frame_changes_mid_cycle() {
        let mut sim = DonutSim::init(Canvas::new(640.0, 480.0), 0);
        let first = sim.frame(60, 20);
        sim.advance(7, &StepParams::default());
        assert_ne!(sim.frame(60, 20), first);
    }

    #[test]
    fn angles_wrap() {
        let mut sim = DonutSim::init(Canvas::new(10.0, 10.0), 0);
        let params = StepParams::default();
        for _ in 0..A_STEPS_PER_TURN {
            sim.advance(1, &params);
        }
        let (a, b) = sim.angles();
        assert_eq!(a, 0.0);
        assert!((b - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn tiny_grids_do_not_panic() {
        let sim = DonutSim::init(Canvas::new(0.0, 0.0), 0);
        for (c, r) in [(0, 0), (1, 1), (2, 1), (1, 7)] {
            let f = sim.frame(c, r);
            assert_eq!(f.cells.len(), (c.max(1) * r.max(1)) as usize);
        }
    }
}
