//! "Digital rain": one falling glyph column per grid column.
//!
//! Each column has a fractional head row, a fall rate in rows per step and a
//! trail length. A head that falls past the bottom restarts above the top at a
//! random offset with fresh rate, trail and glyph seed, so the rain never
//! settles into a visible loop.

use crate::geom::GridSize;
use crate::prng::Prng;
use crate::sim::{bounded_steps, Simulation, StepEvent, StepParams};

const MIN_RATE: f32 = 0.25;
const MAX_RATE: f32 = 0.9;
/// Fastest a head may fall in one step, whatever the speed setting.
const MAX_ROWS_PER_STEP: f32 = 3.0;
const MIN_TRAIL: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainColumn {
    pub head: f32,
    pub rate: f32,
    pub trail: u32,
    pub glyph_seed: u32,
}

impl RainColumn {
    pub fn head_row(&self) -> i64 {
        self.head.floor() as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRainSim {
    size: GridSize,
    columns: Vec<RainColumn>,
    frame: u64,
    rng: Prng,
}

impl GlyphRainSim {
    pub fn columns(&self) -> &[RainColumn] {
        &self.columns
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Stable per-cell key a renderer maps onto its glyph set. The head glyph
    /// flickers every few frames; trail glyphs stay put.
    pub fn glyph_key(&self, col: u32, row: i64) -> u32 {
        let Some(c) = self.columns.get(col as usize) else {
            return 0;
        };
        let flicker = if row == c.head_row() { self.frame / 4 } else { 0 };
        let mut h = (c.glyph_seed as u64) ^ (row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        h ^= flicker.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        h ^= h >> 29;
        h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        (h >> 32) as u32
    }

    fn spawn_column(rng: &mut Prng, rows: u32, initial: bool) -> RainColumn {
        let max_trail = ((rows as f32 * 0.6) as u32).max(MIN_TRAIL + 1);
        // On first fill spread heads over the whole screen so it does not start
        // empty; later respawns always come from above.
        let head = if initial {
            rng.gen_range_f32(-(rows as f32), rows as f32)
        } else {
            -rng.gen_range_f32(1.0, rows as f32 + 1.0)
        };
        RainColumn {
            head,
            rate: rng.gen_range_f32(MIN_RATE, MAX_RATE),
            trail: rng.gen_range_u32(MIN_TRAIL, max_trail + 1),
            glyph_seed: rng.next_u32(),
        }
    }
}

impl Simulation for GlyphRainSim {
    type Extent = GridSize;

    fn init(size: GridSize, seed: u64) -> Self {
        let size = size.clamped();
        let mut rng = Prng::new(seed);
        let columns = (0..size.cols)
            .map(|_| Self::spawn_column(&mut rng, size.rows, true))
            .collect();
        Self {
            size,
            columns,
            frame: 0,
            rng,
        }
    }

    fn extent(&self) -> GridSize {
        self.size
    }

    fn advance(&mut self, steps: u32, params: &StepParams) -> StepEvent {
        let rows = self.size.rows;
        for _ in 0..bounded_steps(steps) {
            self.frame = self.frame.wrapping_add(1);
            for c in self.columns.iter_mut() {
                c.head += (c.rate * params.speed).min(MAX_ROWS_PER_STEP);
                if c.head >= rows as f32 {
                    *c = Self::spawn_column(&mut self.rng, rows, false);
                }
            }
        }
        StepEvent::Steady
    }

    fn resize(&mut self, size: GridSize) {
        let size = size.clamped();
        if size == self.size {
            return;
        }
        self.columns.truncate(size.cols as usize);
        while self.columns.len() < size.cols as usize {
            let c = Self::spawn_column(&mut self.rng, size.rows, true);
            self.columns.push(c);
        }
        // Heads below the new bottom restart on the next step.
        self.size = size;
    }
}
