//! The "pipes" screensaver.
//!
//! A few walkers crawl over an occupancy grid, one cell per step, leaving a
//! coloured pipe behind. A walker keeps its heading for a random run length
//! and may also turn at random; it never reverses. A walker with nowhere to go
//! is retired and replaced at a random free cell. Once the grid is mostly full
//! it is wiped and drawing starts over.

use crate::geom::{Dir, GridSize, PALETTE};
use crate::prng::Prng;
use crate::sim::{bounded_steps, Simulation, StepEvent, StepParams};

/// Fraction of occupied cells that triggers a wipe.
pub const FILL_THRESHOLD: f32 = 0.6;
/// Per-step probability of an unscheduled turn.
pub const TURN_CHANCE: f32 = 0.08;

const MIN_RUN: u32 = 3;
const MAX_RUN: u32 = 14;
const CELLS_PER_WALKER: usize = 300;
const MAX_WALKERS: usize = 4;

/// One occupied cell: which neighbours it connects to, and its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeCell {
    pub links: u8,
    pub color: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walker {
    pub x: u32,
    pub y: u32,
    pub dir: Dir,
    pub run_left: u32,
    pub color: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipesSim {
    size: GridSize,
    cells: Vec<Option<PipeCell>>,
    occupied: usize,
    walkers: Vec<Walker>,
    rng: Prng,
}

pub fn walker_count(size: GridSize) -> usize {
    (size.cells() / CELLS_PER_WALKER).clamp(1, MAX_WALKERS)
}

impl PipesSim {
    pub fn cell(&self, x: u32, y: u32) -> Option<PipeCell> {
        if x >= self.size.cols || y >= self.size.rows {
            return None;
        }
        self.cells[self.size.idx(x, y)]
    }

    pub fn walkers(&self) -> &[Walker] {
        &self.walkers
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn fill_ratio(&self) -> f32 {
        self.occupied as f32 / self.size.cells() as f32
    }

    fn is_free(&self, x: u32, y: u32) -> bool {
        self.cells[self.size.idx(x, y)].is_none()
    }

    fn occupy(&mut self, x: u32, y: u32, links: u8, color: u8) {
        let idx = self.size.idx(x, y);
        match &mut self.cells[idx] {
            Some(cell) => cell.links |= links,
            slot @ None => {
                *slot = Some(PipeCell { links, color });
                self.occupied += 1;
            }
        }
    }

    /// A random free cell, or `None` if the grid is full. O(cells) worst case.
    fn random_free_cell(&mut self) -> Option<(u32, u32)> {
        let free = self.size.cells() - self.occupied;
        if free == 0 {
            return None;
        }
        let mut skip = self.rng.gen_range_usize(0, free);
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.is_some() {
                continue;
            }
            if skip == 0 {
                let cols = self.size.cols as usize;
                return Some(((i % cols) as u32, (i / cols) as u32));
            }
            skip -= 1;
        }
        None
    }

    fn spawn_walker(&mut self) -> Option<Walker> {
        let (x, y) = self.random_free_cell()?;
        let color = self.rng.gen_range_usize(0, PALETTE.len()) as u8;
        self.occupy(x, y, 0, color);
        Some(Walker {
            x,
            y,
            dir: Dir::ALL[self.rng.gen_range_usize(0, 4)],
            run_left: self.rng.gen_range_u32(MIN_RUN, MAX_RUN + 1),
            color,
        })
    }

    fn wipe(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
        self.occupied = 0;
        self.walkers.clear();
        for _ in 0..walker_count(self.size) {
            if let Some(w) = self.spawn_walker() {
                self.walkers.push(w);
            }
        }
    }

    fn open(&self, w: &Walker, dir: Dir) -> Option<(u32, u32)> {
        let (nx, ny) = self.size.step(w.x, w.y, dir)?;
        self.is_free(nx, ny).then_some((nx, ny))
    }

    /// Move one walker. Returns `false` if it is boxed in.
    fn move_walker(&mut self, i: usize) -> bool {
        let mut w = self.walkers[i];
        let wants_turn = w.run_left == 0 || self.rng.chance(TURN_CHANCE);
        let (first_turn, second_turn) = if self.rng.chance(0.5) {
            (w.dir.turn_left(), w.dir.turn_right())
        } else {
            (w.dir.turn_right(), w.dir.turn_left())
        };
        let order = if wants_turn {
            [first_turn, second_turn, w.dir]
        } else {
            [w.dir, first_turn, second_turn]
        };

        let Some((dir, (nx, ny))) = order
            .into_iter()
            .find_map(|d| self.open(&w, d).map(|cell| (d, cell)))
        else {
            return false;
        };

        self.occupy(w.x, w.y, dir.bit(), w.color);
        self.occupy(nx, ny, dir.opposite().bit(), w.color);
        if dir != w.dir {
            w.run_left = self.rng.gen_range_u32(MIN_RUN, MAX_RUN + 1);
        } else {
            w.run_left = w.run_left.saturating_sub(1);
        }
        w.x = nx;
        w.y = ny;
        w.dir = dir;
        self.walkers[i] = w;
        true
    }

    fn step_once(&mut self) -> StepEvent {
        let mut i = 0;
        while i < self.walkers.len() {
            if self.move_walker(i) {
                i += 1;
                continue;
            }
            match self.spawn_walker() {
                Some(w) => {
                    self.walkers[i] = w;
                    i += 1;
                }
                None => {
                    self.wipe();
                    return StepEvent::Reseeded;
                }
            }
        }
        if self.walkers.is_empty() || self.fill_ratio() > FILL_THRESHOLD {
            self.wipe();
            return StepEvent::Reseeded;
        }
        StepEvent::Steady
    }
}

impl Simulation for PipesSim {
    type Extent = GridSize;

    fn init(size: GridSize, seed: u64) -> Self {
        let size = size.clamped();
        let mut sim = Self {
            size,
            cells: vec![None; size.cells()],
            occupied: 0,
            walkers: Vec::new(),
            rng: Prng::new(seed),
        };
        sim.wipe();
        sim
    }

    fn extent(&self) -> GridSize {
        self.size
    }

    fn advance(&mut self, steps: u32, _params: &StepParams) -> StepEvent {
        let mut event = StepEvent::Steady;
        for _ in 0..bounded_steps(steps) {
            event = event.merge(self.step_once());
        }
        event
    }

    fn resize(&mut self, size: GridSize) {
        let size = size.clamped();
        if size == self.size {
            return;
        }
        self.size = size;
        self.cells = vec![None; size.cells()];
        self.wipe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_occupied(sim: &PipesSim) -> usize {
        sim.cells.iter().filter(|c| c.is_some()).count()
    }

    #[test]
    fn walkers_leave_connected_pipes() {
        let mut sim = PipesSim::init(GridSize::new(30, 20), 4);
        let params = StepParams::default();
        for _ in 0..50 {
            sim.advance(1, &params);
            assert_eq!(sim.occupied(), count_occupied(&sim));
            for w in sim.walkers() {
                assert!(sim.cell(w.x, w.y).is_some());
            }
        }
        // Every link has a matching link on the neighbour.
        let size = sim.extent();
        for y in 0..size.rows {
            for x in 0..size.cols {
                let Some(c) = sim.cell(x, y) else { continue };
                for d in Dir::ALL {
                    if c.links & d.bit() != 0 {
                        let (nx, ny) = size.step(x, y, d).expect("link points off-grid");
                        let n = sim.cell(nx, ny).expect("link into empty cell");
                        assert_ne!(n.links & d.opposite().bit(), 0);
                    }
                }
            }
        }
    }

    #[test]
    fn never_reverses() {
        let mut sim = PipesSim::init(GridSize::new(40, 40), 8);
        let params = StepParams::default();
        for _ in 0..300 {
            let before: Vec<Walker> = sim.walkers().to_vec();
            if sim.advance(1, &params) != StepEvent::Steady {
                continue;
            }
            for (b, a) in before.iter().zip(sim.walkers()) {
                // A freshly respawned walker sits on a cell with no links yet.
                let linked = sim.cell(a.x, a.y).is_some_and(|c| c.links != 0);
                if !linked {
                    continue;
                }
                assert_eq!(Dir::between((b.x, b.y), (a.x, a.y)), Some(a.dir));
                assert_ne!(a.dir, b.dir.opposite());
            }
        }
    }

    #[test]
    fn fill_threshold_triggers_wipe() {
        let mut sim = PipesSim::init(GridSize::new(12, 12), 3);
        let params = StepParams::default();
        let mut wiped = false;
        for _ in 0..2_000 {
            if sim.advance(1, &params) == StepEvent::Reseeded {
                wiped = true;
                assert!(sim.occupied() <= sim.walkers().len());
            }
            assert!(sim.fill_ratio() <= FILL_THRESHOLD + 1e-6);
        }
        assert!(wiped);
    }

    #[test]
    fn degenerate_grids_keep_running() {
        for size in [GridSize::new(1, 1), GridSize::new(1, 5), GridSize::new(2, 1)] {
            let mut sim = PipesSim::init(size, 1);
            for _ in 0..100 {
                sim.advance(2, &StepParams::default());
                assert_eq!(sim.occupied(), count_occupied(&sim));
                assert!(sim.occupied() <= size.cells());
            }
        }
    }

    #[test]
    fn resize_wipes_to_new_grid() {
        let mut sim = PipesSim::init(GridSize::new(10, 10), 2);
        sim.advance(5, &StepParams::default());
        sim.resize(GridSize::new(4, 30));
        assert_eq!(sim.extent(), GridSize::new(4, 30));
        assert_eq!(sim.occupied(), sim.walkers().len());
        let once = sim.clone();
        sim.resize(GridSize::new(4, 30));
        assert_eq!(sim, once);
    }
}
