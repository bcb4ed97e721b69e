//! Extents, headings and colours shared by the simulation cores.

use serde::{Deserialize, Serialize};

/// Largest grid side, in cells.
pub const MAX_GRID_SIDE: u32 = 1024;

/// Largest canvas side, in pixels.
pub const MAX_CANVAS_SIDE: f32 = 8192.0;

/// Logical grid extent in cells. Constructors keep each side within
/// `1..=MAX_GRID_SIDE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
}

impl GridSize {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols: cols.clamp(1, MAX_GRID_SIDE),
            rows: rows.clamp(1, MAX_GRID_SIDE),
        }
    }

    /// Re-apply the bounds (deserialized values bypass `new`).
    pub fn clamped(self) -> Self {
        Self::new(self.cols, self.rows)
    }

    pub fn cells(self) -> usize {
        (self.cols as usize) * (self.rows as usize)
    }

    #[inline]
    pub fn idx(self, x: u32, y: u32) -> usize {
        (y as usize) * (self.cols as usize) + (x as usize)
    }

    #[inline]
    pub fn contains(self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.cols as i64 && y < self.rows as i64
    }

    /// The cell one step from `(x, y)` along `dir`, if it is inside the grid.
    pub fn step(self, x: u32, y: u32, dir: Dir) -> Option<(u32, u32)> {
        let (dx, dy) = dir.delta();
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if self.contains(nx, ny) {
            Some((nx as u32, ny as u32))
        } else {
            None
        }
    }
}

/// Pixel extent for the free-space kinds (fireworks, starfield, donut).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: sanitize_extent(width),
            height: sanitize_extent(height),
        }
    }

    pub fn clamped(self) -> Self {
        Self::new(self.width, self.height)
    }

    pub fn center(self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }

    pub fn contains(self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x <= self.width && y <= self.height
    }
}

fn sanitize_extent(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(1.0, MAX_CANVAS_SIDE)
    } else {
        1.0
    }
}

// Bit per heading, shared by maze walls and pipe links.
// 1=up, 2=right, 4=down, 8=left.
pub const BIT_UP: u8 = 1;
pub const BIT_RIGHT: u8 = 2;
pub const BIT_DOWN: u8 = 4;
pub const BIT_LEFT: u8 = 8;
pub const ALL_BITS: u8 = BIT_UP | BIT_RIGHT | BIT_DOWN | BIT_LEFT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    /// Screen-space delta: `y` grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Right => (1, 0),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Dir::Up => BIT_UP,
            Dir::Right => BIT_RIGHT,
            Dir::Down => BIT_DOWN,
            Dir::Left => BIT_LEFT,
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Right => Dir::Left,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
        }
    }

    pub fn turn_left(self) -> Dir {
        match self {
            Dir::Up => Dir::Left,
            Dir::Right => Dir::Up,
            Dir::Down => Dir::Right,
            Dir::Left => Dir::Down,
        }
    }

    pub fn turn_right(self) -> Dir {
        self.turn_left().opposite()
    }

    /// Heading that moves from `from` to an orthogonally adjacent `to`.
    pub fn between(from: (u32, u32), to: (u32, u32)) -> Option<Dir> {
        let dx = to.0 as i64 - from.0 as i64;
        let dy = to.1 as i64 - from.1 as i64;
        match (dx, dy) {
            (0, -1) => Some(Dir::Up),
            (1, 0) => Some(Dir::Right),
            (0, 1) => Some(Dir::Down),
            (-1, 0) => Some(Dir::Left),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Saturated colours used for firework bursts and pipes.
pub const PALETTE: [Rgb; 8] = [
    Rgb(239, 68, 68),
    Rgb(249, 115, 22),
    Rgb(250, 204, 21),
    Rgb(34, 197, 94),
    Rgb(6, 182, 212),
    Rgb(59, 130, 246),
    Rgb(168, 85, 247),
    Rgb(236, 72, 153),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_extents_clamp_to_one() {
        assert_eq!(GridSize::new(0, 0), GridSize { cols: 1, rows: 1 });
        let c = Canvas::new(-4.0, f32::NAN);
        assert_eq!((c.width, c.height), (1.0, 1.0));
    }

    #[test]
    fn huge_extents_are_capped() {
        let g = GridSize::new(u32::MAX, 5);
        assert_eq!((g.cols, g.rows), (MAX_GRID_SIDE, 5));
        let c = Canvas::new(1.0e30, f32::MAX);
        assert_eq!((c.width, c.height), (MAX_CANVAS_SIDE, MAX_CANVAS_SIDE));
        assert_eq!(GridSize { cols: 5000, rows: 0 }.clamped(), GridSize::new(MAX_GRID_SIDE, 1));
    }

    #[test]
    fn turns_are_quarter_turns() {
        for d in Dir::ALL {
            assert_eq!(d.turn_left().turn_right(), d);
            assert_ne!(d.turn_left(), d.opposite());
            assert_eq!(d.turn_left().turn_left(), d.opposite());
            assert_eq!(d.bit() & d.opposite().bit(), 0);
        }
    }

    #[test]
    fn step_respects_bounds() {
        let g = GridSize::new(3, 2);
        assert_eq!(g.step(0, 0, Dir::Left), None);
        assert_eq!(g.step(0, 0, Dir::Right), Some((1, 0)));
        assert_eq!(g.step(2, 1, Dir::Down), None);
        assert_eq!(Dir::between((1, 1), (1, 0)), Some(Dir::Up));
        assert_eq!(Dir::between((1, 1), (2, 2)), None);
    }
}
