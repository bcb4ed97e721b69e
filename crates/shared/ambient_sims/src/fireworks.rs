//! Particle fireworks.
//!
//! Rockets (pending launches) rise from the bottom edge and burst into a ring
//! of particles sharing one colour. Particles follow simple ballistic motion
//! and disappear once their life runs out or they leave the canvas.

use crate::geom::{Canvas, Rgb, PALETTE};
use crate::prng::Prng;
use crate::sim::{bounded_steps, Simulation, StepEvent, StepParams};
use std::f32::consts::TAU;

/// Fixed integration step; one logical step is one 60 Hz frame.
pub const STEP_DT: f32 = 1.0 / 60.0;
/// Downward acceleration in px/s².
pub const GRAVITY: f32 = 70.0;
/// Hard cap on live particles; the oldest are dropped first.
pub const MAX_PARTICLES: usize = 1_500;

const BASE_LAUNCH_INTERVAL: f32 = 45.0;
const PARTICLES_PER_BURST: usize = 48;
const BASE_BURST_SPEED: f32 = 60.0;
const MIN_LIFE: f32 = 0.9;
const MAX_LIFE: f32 = 1.7;
const DRAG: f32 = 0.985;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub max_life: f32,
    pub color: Rgb,
}

impl Particle {
    /// Remaining life as a fraction of the initial life.
    pub fn life_fraction(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }
}

/// A launched shell that has not burst yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rocket {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub burst_y: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireworksSim {
    canvas: Canvas,
    particles: Vec<Particle>,
    rockets: Vec<Rocket>,
    launch_countdown: f32,
    rng: Prng,
}

impl FireworksSim {
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn rockets(&self) -> &[Rocket] {
        &self.rockets
    }

    /// Burst `PARTICLES_PER_BURST` particles at `(x, y)`.
    pub fn explode(&mut self, x: f32, y: f32, color: Rgb, explosion_size: f32) {
        // Scale bursts with the container so small widgets stay readable.
        let scale = (self.canvas.width.min(self.canvas.height) / 240.0).clamp(0.3, 3.0);
        let top_speed = BASE_BURST_SPEED * explosion_size * scale;
        for _ in 0..PARTICLES_PER_BURST {
            let angle = self.rng.gen_range_f32(0.0, TAU);
            let speed = top_speed * self.rng.gen_range_f32(0.35, 1.0);
            let life = self.rng.gen_range_f32(MIN_LIFE, MAX_LIFE);
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life,
                max_life: life,
                color,
            });
        }
        if self.particles.len() > MAX_PARTICLES {
            let excess = self.particles.len() - MAX_PARTICLES;
            self.particles.drain(..excess);
        }
    }

    fn launch(&mut self) {
        let w = self.canvas.width;
        let h = self.canvas.height;
        let burst_y = self.rng.gen_range_f32(0.15 * h, 0.5 * h);
        let flight_s = self.rng.gen_range_f32(0.7, 1.2);
        let color = PALETTE[self.rng.gen_range_usize(0, PALETTE.len())];
        self.rockets.push(Rocket {
            x: self.rng.gen_range_f32(0.15 * w, 0.85 * w),
            y: h,
            vy: -(h - burst_y) / flight_s,
            burst_y,
            color,
        });
    }

    fn step_once(&mut self, params: &StepParams) {
        self.launch_countdown -= 1.0;
        if self.launch_countdown <= 0.0 {
            self.launch();
            self.launch_countdown += BASE_LAUNCH_INTERVAL / params.speed.max(0.1);
        }

        let mut bursts: Vec<(f32, f32, Rgb)> = Vec::new();
        self.rockets.retain_mut(|r| {
            r.y += r.vy * STEP_DT;
            if r.y <= r.burst_y {
                bursts.push((r.x, r.y, r.color));
                false
            } else {
                true
            }
        });

        let canvas = self.canvas;
        for p in self.particles.iter_mut() {
            p.vy += GRAVITY * STEP_DT;
            p.vx *= DRAG;
            p.vy *= DRAG;
            p.x += p.vx * STEP_DT;
            p.y += p.vy * STEP_DT;
            p.life -= STEP_DT;
        }
        self.particles
            .retain(|p| p.life > 0.0 && canvas.contains(p.x, p.y));

        for (x, y, color) in bursts {
            self.explode(x, y, color, params.explosion_size);
        }
    }
}

impl Simulation for FireworksSim {
    type Extent = Canvas;

    fn init(canvas: Canvas, seed: u64) -> Self {
        let mut rng = Prng::new(seed);
        // Stagger the first launch so duplicates do not fire in lockstep.
        let launch_countdown = rng.gen_range_f32(1.0, BASE_LAUNCH_INTERVAL * 0.5);
        Self {
            canvas: canvas.clamped(),
            particles: Vec::new(),
            rockets: Vec::new(),
            launch_countdown,
            rng,
        }
    }

    fn extent(&self) -> Canvas {
        self.canvas
    }

    fn advance(&mut self, steps: u32, params: &StepParams) -> StepEvent {
        for _ in 0..bounded_steps(steps) {
            self.step_once(params);
        }
        StepEvent::Steady
    }

    fn resize(&mut self, canvas: Canvas) {
        let canvas = canvas.clamped();
        if canvas == self.canvas {
            return;
        }
        let sx = canvas.width / self.canvas.width;
        let sy = canvas.height / self.canvas.height;
        for p in self.particles.iter_mut() {
            p.x *= sx;
            p.y *= sy;
        }
        for r in self.rockets.iter_mut() {
            r.x *= sx;
            r.y *= sy;
            r.vy *= sy;
            r.burst_y *= sy;
        }
        self.canvas = canvas;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_appear_and_fade() {
        let mut sim = FireworksSim::init(Canvas::new(400.0, 300.0), 12);
        let params = StepParams::default();
        let mut max_seen = 0;
        for _ in 0..600 {
            sim.advance(1, &params);
            max_seen = max_seen.max(sim.particles().len());
            assert!(sim.particles().len() <= MAX_PARTICLES);
        }
        assert!(max_seen > 0, "no burst in ten seconds");
    }

    #[test]
    fn expired_particles_are_gone_after_next_step() {
        let mut sim = FireworksSim::init(Canvas::new(300.0, 300.0), 5);
        sim.explode(150.0, 150.0, PALETTE[0], 1.0);
        // Force a few particles to the end of their life.
        for p in sim.particles.iter_mut().take(10) {
            p.life = STEP_DT * 0.5;
        }
        sim.advance(1, &StepParams::default());
        assert!(sim.particles().iter().all(|p| p.life > 0.0));
        assert!(sim.particles().len() <= PARTICLES_PER_BURST - 10);
    }

    #[test]
    fn particles_stay_inside_canvas() {
        let mut sim = FireworksSim::init(Canvas::new(120.0, 90.0), 77);
        let params = StepParams {
            speed: 4.0,
            explosion_size: 3.0,
        };
        for _ in 0..900 {
            sim.advance(1, &params);
            let c = sim.extent();
            assert!(sim.particles().iter().all(|p| c.contains(p.x, p.y)));
        }
    }

    #[test]
    fn explosion_size_scales_spread() {
        let mut small = FireworksSim::init(Canvas::new(400.0, 400.0), 1);
        let mut large = small.clone();
        small.explode(200.0, 200.0, PALETTE[1], 0.5);
        large.explode(200.0, 200.0, PALETTE[1], 2.0);
        let top = |s: &FireworksSim| {
            s.particles()
                .iter()
                .map(|p| (p.vx * p.vx + p.vy * p.vy).sqrt())
                .fold(0.0f32, f32::max)
        };
        assert!(top(&large) > top(&small) * 2.0);
    }

    #[test]
    fn particle_cap_drops_oldest() {
        let mut sim = FireworksSim::init(Canvas::new(800.0, 800.0), 2);
        for _ in 0..(MAX_PARTICLES / PARTICLES_PER_BURST + 5) {
            sim.explode(400.0, 400.0, PALETTE[2], 1.0);
        }
        assert_eq!(sim.particles().len(), MAX_PARTICLES);
    }
}
