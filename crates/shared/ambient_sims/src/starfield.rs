//! Parallax starfield.
//!
//! Stars live in a normalised `[-1, 1]²` plane at a depth in
//! `(NEAR_PLANE, MAX_DEPTH]`. Each step pulls every star closer; the projected
//! position is `center + (x, y) · half_extent / depth`, so near stars race
//! outwards. A star that crosses the near plane is respawned far away.

use crate::geom::Canvas;
use crate::prng::Prng;
use crate::sim::{bounded_steps, Simulation, StepEvent, StepParams};

pub const NEAR_PLANE: f32 = 0.05;
pub const MAX_DEPTH: f32 = 1.0;
/// Depth travelled per step at speed 1.0.
pub const BASE_APPROACH: f32 = 0.006;

const MIN_STARS: usize = 24;
const MAX_STARS: usize = 400;
/// Canvas area (px²) per star.
const AREA_PER_STAR: f32 = 700.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarfieldSim {
    canvas: Canvas,
    stars: Vec<Star>,
    rng: Prng,
}

pub fn star_count(canvas: Canvas) -> usize {
    ((canvas.width * canvas.height / AREA_PER_STAR) as usize).clamp(MIN_STARS, MAX_STARS)
}

impl StarfieldSim {
    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Screen position of `star` seen at `depth` on `canvas`.
    pub fn project(canvas: Canvas, star: &Star, depth: f32) -> (f32, f32) {
        let (cx, cy) = canvas.center();
        let d = depth.max(NEAR_PLANE);
        (cx + star.x * cx / d, cy + star.y * cy / d)
    }

    fn spawn(rng: &mut Prng, depth: f32) -> Star {
        Star {
            x: rng.gen_range_f32(-1.0, 1.0),
            y: rng.gen_range_f32(-1.0, 1.0),
            depth,
        }
    }

    fn spawn_anywhere(rng: &mut Prng) -> Star {
        let depth = rng.gen_range_f32(NEAR_PLANE + 0.01, MAX_DEPTH);
        Self::spawn(rng, depth)
    }
}

impl Simulation for StarfieldSim {
    type Extent = Canvas;

    fn init(canvas: Canvas, seed: u64) -> Self {
        let canvas = canvas.clamped();
        let mut rng = Prng::new(seed);
        let stars = (0..star_count(canvas))
            .map(|_| Self::spawn_anywhere(&mut rng))
            .collect();
        Self { canvas, stars, rng }
    }

    fn extent(&self) -> Canvas {
        self.canvas
    }

    fn advance(&mut self, steps: u32, params: &StepParams) -> StepEvent {
        let approach = BASE_APPROACH * params.speed.max(0.0);
        for _ in 0..bounded_steps(steps) {
            for star in self.stars.iter_mut() {
                star.depth -= approach;
                if star.depth < NEAR_PLANE {
                    *star = Self::spawn(&mut self.rng, MAX_DEPTH);
                }
            }
        }
        StepEvent::Steady
    }

    fn resize(&mut self, canvas: Canvas) {
        let canvas = canvas.clamped();
        if canvas == self.canvas {
            return;
        }
        // Positions are normalised, so only the population changes.
        let target = star_count(canvas);
        self.stars.truncate(target);
        while self.stars.len() < target {
            let s = Self::spawn_anywhere(&mut self.rng);
            self.stars.push(s);
        }
        self.canvas = canvas;
    }
}
