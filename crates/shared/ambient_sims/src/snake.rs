//! Self-playing snake.
//!
//! The snake follows a precomputed Hamiltonian cycle over the grid, which on
//! its own guarantees it never collides. While the snake is short it may take
//! a shortcut to a neighbour further along the cycle, provided the jump lands
//! strictly between its head and its tail and does not overshoot the food.
//! That keeps every body cell inside the cycle interval from tail to head, so
//! following the cycle afterwards stays collision-free.
//!
//! A grid with an odd number of cells has no Hamiltonian cycle; in that case
//! the last row is left out of play. A single row or column degenerates to a
//! two-cell shuttle.

use std::collections::VecDeque;

use crate::geom::{Dir, GridSize};
use crate::prng::Prng;
use crate::sim::{bounded_steps, Simulation, StepEvent, StepParams};

const START_LENGTH: usize = 3;
/// Free cells a shortcut must leave in front of the tail.
const SHORTCUT_MARGIN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct SnakeSim {
    size: GridSize,
    cycle: Vec<(u32, u32)>,
    /// Position of each grid cell on the cycle, `None` for cells out of play.
    order: Vec<Option<u32>>,
    /// Head first.
    body: VecDeque<(u32, u32)>,
    occupied: Vec<bool>,
    dir: Dir,
    food: Option<(u32, u32)>,
    foods_eaten: u64,
    rng: Prng,
}

/// Builds a Hamiltonian cycle over `size`, or the closest thing to one for
/// grids that have none.
pub fn hamiltonian_cycle(size: GridSize) -> Vec<(u32, u32)> {
    let size = size.clamped();
    let (cols, rows) = (size.cols, size.rows);
    if cols == 1 && rows == 1 {
        return vec![(0, 0)];
    }
    if cols == 1 {
        return vec![(0, 0), (0, 1)];
    }
    if rows == 1 {
        return vec![(0, 0), (1, 0)];
    }

    // Lay out a U×V cycle with V even, then map it back onto the grid.
    let (u_len, v_len, transpose) = if rows % 2 == 0 {
        (cols, rows, false)
    } else if cols % 2 == 0 {
        (rows, cols, true)
    } else {
        (cols, rows - 1, false)
    };
    let map = |u: u32, v: u32| if transpose { (v, u) } else { (u, v) };

    let mut cycle = Vec::with_capacity((u_len * v_len) as usize);
    for v in 0..v_len {
        if v % 2 == 0 {
            cycle.extend((1..u_len).map(|u| map(u, v)));
        } else {
            cycle.extend((1..u_len).rev().map(|u| map(u, v)));
        }
    }
    cycle.extend((0..v_len).rev().map(|v| map(0, v)));
    cycle
}

impl SnakeSim {
    pub fn body(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.body.iter().copied()
    }

    pub fn head(&self) -> (u32, u32) {
        self.body.front().copied().unwrap_or((0, 0))
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn food(&self) -> Option<(u32, u32)> {
        self.food
    }

    pub fn dir(&self) -> Dir {
        self.dir
    }

    pub fn foods_eaten(&self) -> u64 {
        self.foods_eaten
    }

    pub fn cycle(&self) -> &[(u32, u32)] {
        &self.cycle
    }

    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        x < self.size.cols && y < self.size.rows && self.occupied[self.size.idx(x, y)]
    }

    fn pos(&self, cell: (u32, u32)) -> Option<usize> {
        self.order[self.size.idx(cell.0, cell.1)].map(|p| p as usize)
    }

    fn dist(&self, from: usize, to: usize) -> usize {
        let n = self.cycle.len();
        (to + n - from) % n
    }

    fn reset(&mut self) {
        let size = self.size;
        self.cycle = hamiltonian_cycle(size);
        self.order = vec![None; size.cells()];
        for (i, &(x, y)) in self.cycle.iter().enumerate() {
            self.order[size.idx(x, y)] = Some(i as u32);
        }
        self.occupied = vec![false; size.cells()];
        self.body.clear();

        let n = self.cycle.len();
        let length = START_LENGTH.min(n.saturating_sub(1)).max(1);
        let start = self.rng.gen_range_usize(0, n);
        for k in 0..length {
            let cell = self.cycle[(start + n - k) % n];
            self.occupied[size.idx(cell.0, cell.1)] = true;
            self.body.push_back(cell);
        }
        let next = self.cycle[(start + 1) % n];
        self.dir = Dir::between(self.head(), next).unwrap_or(Dir::Right);
        self.place_food();
    }

    fn place_food(&mut self) {
        let free = self.cycle.len() - self.body.len();
        if free == 0 {
            self.food = None;
            return;
        }
        let mut skip = self.rng.gen_range_usize(0, free);
        for &cell in &self.cycle {
            if self.occupied[self.size.idx(cell.0, cell.1)] {
                continue;
            }
            if skip == 0 {
                self.food = Some(cell);
                return;
            }
            skip -= 1;
        }
        self.food = None;
    }

    fn choose_next(&self) -> (u32, u32) {
        let n = self.cycle.len();
        let head = self.head();
        let Some(h) = self.pos(head) else {
            return self.cycle[0];
        };
        let along = self.cycle[(h + 1) % n];
        if self.body.len() * 2 >= n {
            return along;
        }

        let tail_dist = match self.body.back() {
            Some(&tail) if self.body.len() > 1 => {
                self.pos(tail).map_or(n, |t| self.dist(h, t))
            }
            _ => n,
        };
        let food_dist = self
            .food
            .and_then(|f| self.pos(f))
            .map_or(n, |f| self.dist(h, f));
        let limit = tail_dist.saturating_sub(SHORTCUT_MARGIN).min(food_dist);

        Dir::ALL
            .into_iter()
            .filter_map(|d| self.size.step(head.0, head.1, d))
            .filter_map(|cell| self.pos(cell).map(|p| (cell, self.dist(h, p))))
            .filter(|&(_, d)| d >= 1 && d <= limit)
            .max_by_key(|&(_, d)| d)
            .map_or(along, |(cell, _)| cell)
    }

    fn step_once(&mut self) -> StepEvent {
        if self.cycle.len() < 2 {
            return StepEvent::Steady;
        }
        let next = self.choose_next();
        let eating = self.food == Some(next);

        if !eating {
            if let Some((tx, ty)) = self.body.pop_back() {
                let idx = self.size.idx(tx, ty);
                self.occupied[idx] = false;
            }
        }
        let idx = self.size.idx(next.0, next.1);
        if self.occupied[idx] {
            self.reset();
            return StepEvent::Reset;
        }
        if let Some(d) = Dir::between(self.head(), next) {
            self.dir = d;
        }
        self.occupied[idx] = true;
        self.body.push_front(next);

        if eating {
            self.foods_eaten += 1;
            if self.body.len() >= self.cycle.len() {
                self.reset();
                return StepEvent::Reseeded;
            }
            self.place_food();
        }
        StepEvent::Steady
    }
}

impl Simulation for SnakeSim {
    type Extent = GridSize;

    fn init(size: GridSize, seed: u64) -> Self {
        let size = size.clamped();
        let mut sim = Self {
            size,
            cycle: Vec::new(),
            order: Vec::new(),
            body: VecDeque::new(),
            occupied: Vec::new(),
            dir: Dir::Right,
            food: None,
            foods_eaten: 0,
            rng: Prng::new(seed),
        };
        sim.reset();
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
        self.reset();
    }
}
