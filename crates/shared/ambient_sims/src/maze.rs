//! Animated perfect-maze generator.
//!
//! Randomized depth-first backtracking, one carve (or backtrack) per step, so a
//! host sees the maze being drawn. Only ever connecting the current cell to an
//! unvisited neighbour keeps the wall graph a spanning tree. Once the stack
//! empties the finished maze is held for a pause, then carving restarts from a
//! new random origin.

use crate::geom::{Dir, GridSize, ALL_BITS};
use crate::prng::Prng;
use crate::sim::{bounded_steps, Simulation, StepEvent, StepParams};

/// Steps a finished maze stays on screen before the next one starts.
pub const DEFAULT_RESTART_PAUSE: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeGrid {
    size: GridSize,
    cells: Vec<u8>,
}

impl MazeGrid {
    pub fn new(size: GridSize) -> Self {
        let size = size.clamped();
        Self {
            size,
            cells: vec![ALL_BITS; size.cells()],
        }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn walls(&self, x: u32, y: u32) -> u8 {
        // Out-of-bounds reads are fully walled rather than a panic.
        if x >= self.size.cols || y >= self.size.rows {
            return ALL_BITS;
        }
        self.cells[self.size.idx(x, y)]
    }

    pub fn has_wall(&self, x: u32, y: u32, dir: Dir) -> bool {
        self.walls(x, y) & dir.bit() != 0
    }

    /// Number of knocked-down walls between adjacent cells.
    pub fn open_connections(&self) -> usize {
        let mut n = 0;
        for y in 0..self.size.rows {
            for x in 0..self.size.cols {
                if x + 1 < self.size.cols && !self.has_wall(x, y, Dir::Right) {
                    n += 1;
                }
                if y + 1 < self.size.rows && !self.has_wall(x, y, Dir::Down) {
                    n += 1;
                }
            }
        }
        n
    }

    fn carve(&mut self, x: u32, y: u32, dir: Dir) {
        let Some((nx, ny)) = self.size.step(x, y, dir) else {
            return;
        };
        let (a, b) = (self.size.idx(x, y), self.size.idx(nx, ny));
        self.cells[a] &= !dir.bit();
        self.cells[b] &= !dir.opposite().bit();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Carving,
    Holding { steps_left: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MazeSim {
    grid: MazeGrid,
    visited: Vec<bool>,
    stack: Vec<(u32, u32)>,
    phase: Phase,
    restart_pause: u32,
    mazes_completed: u64,
    rng: Prng,
}

impl MazeSim {
    pub fn grid(&self) -> &MazeGrid {
        &self.grid
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Holding { .. })
    }

    /// Cell currently being carved from, while generating.
    pub fn head(&self) -> Option<(u32, u32)> {
        self.stack.last().copied()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_visited(&self, x: u32, y: u32) -> bool {
        let size = self.grid.size();
        x < size.cols && y < size.rows && self.visited[size.idx(x, y)]
    }

    pub fn mazes_completed(&self) -> u64 {
        self.mazes_completed
    }

    pub fn restart_pause(&self) -> u32 {
        self.restart_pause
    }

    pub fn set_restart_pause(&mut self, steps: u32) {
        self.restart_pause = steps;
    }

    fn restart(&mut self) {
        let size = self.grid.size();
        self.grid = MazeGrid::new(size);
        self.visited = vec![false; size.cells()];
        self.stack.clear();

        let x = self.rng.gen_range_u32(0, size.cols);
        let y = self.rng.gen_range_u32(0, size.rows);
        self.visited[size.idx(x, y)] = true;
        self.stack.push((x, y));
        self.phase = Phase::Carving;
    }

    /// One algorithm step. Returns `false` if an invariant broke.
    fn carve_step(&mut self) -> bool {
        let size = self.grid.size();
        let Some(&(x, y)) = self.stack.last() else {
            self.finish();
            return true;
        };

        let mut options = [Dir::Up; 4];
        let mut n = 0usize;
        for dir in Dir::ALL {
            if let Some((nx, ny)) = size.step(x, y, dir) {
                if !self.visited[size.idx(nx, ny)] {
                    options[n] = dir;
                    n += 1;
                }
            }
        }

        if n == 0 {
            self.stack.pop();
            if self.stack.is_empty() {
                self.finish();
            }
            return true;
        }

        let dir = options[self.rng.gen_range_usize(0, n)];
        let Some((nx, ny)) = size.step(x, y, dir) else {
            return false;
        };
        let idx = size.idx(nx, ny);
        if self.visited[idx] {
            return false;
        }
        self.grid.carve(x, y, dir);
        self.visited[idx] = true;
        self.stack.push((nx, ny));
        true
    }

    fn finish(&mut self) {
        self.mazes_completed += 1;
        self.phase = Phase::Holding {
            steps_left: self.restart_pause,
        };
    }
}

impl Simulation for MazeSim {
    type Extent = GridSize;

    fn init(size: GridSize, seed: u64) -> Self {
        let size = size.clamped();
        let mut sim = Self {
            grid: MazeGrid::new(size),
            visited: vec![false; size.cells()],
            stack: Vec::with_capacity(size.cells()),
            phase: Phase::Carving,
            restart_pause: DEFAULT_RESTART_PAUSE,
            mazes_completed: 0,
            rng: Prng::new(seed),
        };
        sim.restart();
        sim
    }

    fn extent(&self) -> GridSize {
        self.grid.size()
    }

    fn advance(&mut self, steps: u32, _params: &StepParams) -> StepEvent {
        let mut event = StepEvent::Steady;
        for _ in 0..bounded_steps(steps) {
            match self.phase {
                Phase::Carving => {
                    if !self.carve_step() {
                        let pause = self.restart_pause;
                        *self = Self::init(self.grid.size(), self.rng.fork());
                        self.restart_pause = pause;
                        return StepEvent::Reset;
                    }
                }
                Phase::Holding { steps_left: 0 } => {
                    self.restart();
                    event = event.merge(StepEvent::Reseeded);
                }
                Phase::Holding { steps_left } => {
                    self.phase = Phase::Holding {
                        steps_left: steps_left - 1,
                    };
                }
            }
        }
        event
    }

    fn resize(&mut self, size: GridSize) {
        let size = size.clamped();
        if size == self.grid.size() {
            return;
        }
        self.grid = MazeGrid::new(size);
        self.restart();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn run_to_completion(sim: &mut MazeSim) {
        let params = StepParams::default();
        let budget = sim.grid().size().cells() * 2 + 4;
        for _ in 0..budget {
            if sim.is_complete() {
                return;
            }
            sim.advance(1, &params);
        }
        assert!(sim.is_complete(), "maze did not finish within 2·cells steps");
    }

    fn reachable_cells(grid: &MazeGrid) -> usize {
        let size = grid.size();
        let mut seen = vec![false; size.cells()];
        let mut queue = VecDeque::from([(0u32, 0u32)]);
        seen[0] = true;
        let mut count = 0;
        while let Some((x, y)) = queue.pop_front() {
            count += 1;
            for dir in Dir::ALL {
                if grid.has_wall(x, y, dir) {
                    continue;
                }
                if let Some((nx, ny)) = size.step(x, y, dir) {
                    let i = size.idx(nx, ny);
                    if !seen[i] {
                        seen[i] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
        }
        count
    }

    #[test]
    fn finished_maze_is_a_spanning_tree() {
        for (seed, cols, rows) in [(1, 9, 9), (2, 17, 5), (3, 1, 12), (4, 30, 20)] {
            let mut sim = MazeSim::init(GridSize::new(cols, rows), seed);
            run_to_completion(&mut sim);
            let cells = sim.grid().size().cells();
            assert_eq!(sim.grid().open_connections(), cells - 1);
            assert_eq!(reachable_cells(sim.grid()), cells);
        }
    }

    #[test]
    fn walls_are_symmetric() {
        let mut sim = MazeSim::init(GridSize::new(11, 7), 8);
        run_to_completion(&mut sim);
        let g = sim.grid();
        for y in 0..7 {
            for x in 0..11 {
                if let Some((nx, ny)) = g.size().step(x, y, Dir::Right) {
                    assert_eq!(g.has_wall(x, y, Dir::Right), g.has_wall(nx, ny, Dir::Left));
                }
                if let Some((nx, ny)) = g.size().step(x, y, Dir::Down) {
                    assert_eq!(g.has_wall(x, y, Dir::Down), g.has_wall(nx, ny, Dir::Up));
                }
            }
        }
    }

    #[test]
    fn carving_is_one_operation_per_step() {
        let mut sim = MazeSim::init(GridSize::new(8, 8), 21);
        let params = StepParams::default();
        let before = sim.grid().open_connections();
        sim.advance(1, &params);
        let after = sim.grid().open_connections();
        assert!(after - before <= 1);
        assert!(!sim.is_complete());
    }

    #[test]
    fn restarts_after_pause() {
        let mut sim = MazeSim::init(GridSize::new(5, 5), 4);
        sim.set_restart_pause(3);
        run_to_completion(&mut sim);
        let params = StepParams::default();
        for _ in 0..3 {
            assert_eq!(sim.advance(1, &params), StepEvent::Steady);
            assert!(sim.is_complete());
        }
        assert_eq!(sim.advance(1, &params), StepEvent::Reseeded);
        assert!(!sim.is_complete());
        assert_eq!(sim.stack_depth(), 1);
        assert_eq!(sim.grid().open_connections(), 0);
        assert_eq!(sim.mazes_completed(), 1);
    }

    #[test]
    fn single_cell_maze_completes_immediately() {
        let mut sim = MazeSim::init(GridSize::new(0, 0), 1);
        sim.advance(1, &StepParams::default());
        assert!(sim.is_complete());
        assert_eq!(sim.grid().open_connections(), 0);
    }

    #[test]
    fn resize_restarts_on_new_grid_and_is_idempotent() {
        let mut sim = MazeSim::init(GridSize::new(6, 6), 3);
        sim.advance(5, &StepParams::default());
        sim.resize(GridSize::new(10, 4));
        assert_eq!(sim.extent(), GridSize::new(10, 4));
        assert_eq!(sim.stack_depth(), 1);
        let once = sim.clone();
        sim.resize(GridSize::new(10, 4));
        assert_eq!(sim, once);
    }
}
