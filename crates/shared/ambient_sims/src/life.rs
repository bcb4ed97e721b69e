//! Conway's Game of Life on a bounded grid.
//!
//! Cells outside the grid count as dead (no wrap-around). A fully dead grid is
//! reseeded instead of freezing, and a resize re-centres the current pattern
//! rather than reseeding, so the animation never jumps.

use crate::geom::GridSize;
use crate::prng::Prng;
use crate::sim::{bounded_steps, Simulation, StepEvent, StepParams};

const SEED_DENSITY: f32 = 0.28;

#[derive(Debug, Clone, PartialEq)]
pub struct LifeSim {
    size: GridSize,
    cells: Vec<bool>,
    generation: u64,
    rng: Prng,
}

impl LifeSim {
    /// Build a grid with exactly the given live cells (out-of-range ones are
    /// ignored).
    pub fn from_live_cells(size: GridSize, live: &[(u32, u32)], seed: u64) -> Self {
        let size = size.clamped();
        let mut cells = vec![false; size.cells()];
        for &(x, y) in live {
            if x < size.cols && y < size.rows {
                cells[size.idx(x, y)] = true;
            }
        }
        Self {
            size,
            cells,
            generation: 0,
            rng: Prng::new(seed),
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn is_alive(&self, x: u32, y: u32) -> bool {
        x < self.size.cols && y < self.size.rows && self.cells[self.size.idx(x, y)]
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    fn reseed(&mut self) {
        for c in self.cells.iter_mut() {
            *c = self.rng.chance(SEED_DENSITY);
        }
        // Tiny grids can come up empty; always leave something to evolve.
        if !self.cells.iter().any(|&c| c) {
            let i = self.rng.gen_range_usize(0, self.cells.len());
            self.cells[i] = true;
        }
    }

    fn live_neighbors(&self, x: u32, y: u32) -> u8 {
        let mut n = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if self.size.contains(nx, ny) && self.cells[self.size.idx(nx as u32, ny as u32)] {
                    n += 1;
                }
            }
        }
        n
    }

    fn next_generation(&mut self) {
        let mut next = vec![false; self.cells.len()];
        for y in 0..self.size.rows {
            for x in 0..self.size.cols {
                let i = self.size.idx(x, y);
                next[i] = matches!(
                    (self.cells[i], self.live_neighbors(x, y)),
                    (true, 2) | (true, 3) | (false, 3)
                );
            }
        }
        self.cells = next;
        self.generation += 1;
    }
}

impl Simulation for LifeSim {
    type Extent = GridSize;

    fn init(size: GridSize, seed: u64) -> Self {
        let size = size.clamped();
        let mut sim = Self {
            size,
            cells: vec![false; size.cells()],
            generation: 0,
            rng: Prng::new(seed),
        };
        sim.reseed();
        sim
    }

    fn extent(&self) -> GridSize {
        self.size
    }

    fn advance(&mut self, steps: u32, _params: &StepParams) -> StepEvent {
        let mut event = StepEvent::Steady;
        for _ in 0..bounded_steps(steps) {
            self.next_generation();
            if !self.cells.iter().any(|&c| c) {
                self.reseed();
                event = event.merge(StepEvent::Reseeded);
            }
        }
        event
    }

    fn resize(&mut self, size: GridSize) {
        let size = size.clamped();
        if size == self.size {
            return;
        }
        let off_x = (size.cols as i64 - self.size.cols as i64) / 2;
        let off_y = (size.rows as i64 - self.size.rows as i64) / 2;

        let mut cells = vec![false; size.cells()];
        for y in 0..self.size.rows {
            for x in 0..self.size.cols {
                if !self.cells[self.size.idx(x, y)] {
                    continue;
                }
                let nx = x as i64 + off_x;
                let ny = y as i64 + off_y;
                if size.contains(nx, ny) {
                    cells[size.idx(nx as u32, ny as u32)] = true;
                }
            }
        }
        self.size = size;
        self.cells = cells;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StepParams {
        StepParams::default()
    }

    #[test]
    fn block_is_a_still_life() {
        let block = [(1, 1), (2, 1), (1, 2), (2, 2)];
        let mut sim = LifeSim::from_live_cells(GridSize::new(4, 4), &block, 1);
        let before = sim.cells().to_vec();
        for _ in 0..50 {
            assert_eq!(sim.advance(1, &params()), StepEvent::Steady);
            assert_eq!(sim.cells(), &before[..]);
        }
        assert_eq!(sim.generation(), 50);
    }

    #[test]
    fn blinker_oscillates_with_period_two() {
        let mut sim = LifeSim::from_live_cells(GridSize::new(5, 5), &[(1, 2), (2, 2), (3, 2)], 3);
        let start = sim.cells().to_vec();
        sim.advance(1, &params());
        assert!(sim.is_alive(2, 1) && sim.is_alive(2, 2) && sim.is_alive(2, 3));
        assert!(!sim.is_alive(1, 2));
        sim.advance(1, &params());
        assert_eq!(sim.cells(), &start[..]);
    }

    #[test]
    fn edges_do_not_wrap() {
        // A blinker lying on the top edge loses the cells that would wrap.
        let mut sim = LifeSim::from_live_cells(GridSize::new(5, 5), &[(1, 0), (2, 0), (3, 0)], 3);
        sim.advance(1, &params());
        assert!(sim.is_alive(2, 0) && sim.is_alive(2, 1));
        assert!(!sim.is_alive(2, 4), "row 4 must not be a neighbour of row 0");
    }

    #[test]
    fn dead_grid_is_reseeded() {
        let mut sim = LifeSim::from_live_cells(GridSize::new(6, 6), &[(0, 0)], 9);
        let ev = sim.advance(1, &params());
        assert_eq!(ev, StepEvent::Reseeded);
        assert!(sim.live_count() > 0);
    }

    #[test]
    fn pure_step_leaves_receiver_untouched() {
        let sim = LifeSim::init(GridSize::new(10, 8), 5);
        let next = sim.step(1, &params());
        assert_eq!(sim.generation(), 0);
        assert_eq!(next.generation(), 1);
    }

    #[test]
    fn resize_recenters_pattern() {
        let block = [(1, 1), (2, 1), (1, 2), (2, 2)];
        let mut sim = LifeSim::from_live_cells(GridSize::new(4, 4), &block, 1);
        sim.resize(GridSize::new(8, 8));
        assert_eq!(sim.live_count(), 4);
        assert!(sim.is_alive(3, 3) && sim.is_alive(4, 4));

        sim.resize(GridSize::new(2, 2));
        assert_eq!(sim.cells().len(), 4);
        assert!(sim.live_count() <= 4);
    }

    #[test]
    fn resize_is_idempotent() {
        let mut sim = LifeSim::init(GridSize::new(12, 9), 11);
        sim.resize(GridSize::new(7, 15));
        let once = sim.clone();
        sim.resize(GridSize::new(7, 15));
        assert_eq!(sim, once);
    }

    #[test]
    fn one_by_one_grid_keeps_running() {
        let mut sim = LifeSim::init(GridSize::new(0, 0), 2);
        for _ in 0..20 {
            sim.advance(3, &params());
            assert_eq!(sim.cells().len(), 1);
        }
    }
}
