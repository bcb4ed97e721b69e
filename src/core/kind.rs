//! The eight widget kinds and host-side dimensions.

use std::fmt;
use std::str::FromStr;

use ambient_sims::{Canvas, GridSize, MAX_CANVAS_SIDE, MAX_GRID_SIDE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Container width used until the host reports a real size.
pub const DEFAULT_WIDTH: f32 = 320.0;
/// Container height used until the host reports a real size.
pub const DEFAULT_HEIGHT: f32 = 240.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Life,
    Maze,
    Fireworks,
    Donut,
    Matrix,
    Starfield,
    Pipes,
    Snake,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown widget kind: {0:?}")]
pub struct UnknownKind(pub String);

impl WidgetKind {
    pub const ALL: [WidgetKind; 8] = [
        WidgetKind::Life,
        WidgetKind::Maze,
        WidgetKind::Fireworks,
        WidgetKind::Donut,
        WidgetKind::Matrix,
        WidgetKind::Starfield,
        WidgetKind::Pipes,
        WidgetKind::Snake,
    ];

    /// Stable key used in instance ids and persisted settings.
    pub fn key(self) -> &'static str {
        match self {
            WidgetKind::Life => "life",
            WidgetKind::Maze => "maze",
            WidgetKind::Fireworks => "fireworks",
            WidgetKind::Donut => "donut",
            WidgetKind::Matrix => "matrix",
            WidgetKind::Starfield => "starfield",
            WidgetKind::Pipes => "pipes",
            WidgetKind::Snake => "snake",
        }
    }

    /// Title of the canonical instance's container.
    pub fn title(self) -> &'static str {
        match self {
            WidgetKind::Life => "conway.life",
            WidgetKind::Maze => "maze.gen",
            WidgetKind::Fireworks => "fireworks.py",
            WidgetKind::Donut => "donut.c",
            WidgetKind::Matrix => "matrix",
            WidgetKind::Starfield => "starfield.scr",
            WidgetKind::Pipes => "pipes.scr",
            WidgetKind::Snake => "snake.exe",
        }
    }

    /// Title of a duplicate: the key plus the tail of its id.
    pub fn duplicate_title(self, id: &str) -> String {
        let suffix = id.rsplit('-').next().unwrap_or(id);
        let start = suffix.char_indices().rev().nth(3).map_or(0, |(i, _)| i);
        format!("{}.exe ({})", self.key(), &suffix[start..])
    }

    /// Creation stamp of a well-formed duplicate id, `<key>-<digits>`.
    pub fn duplicate_stamp(self, id: &str) -> Option<u64> {
        let digits = id.strip_prefix(self.key())?.strip_prefix('-')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Cell size in px for grid kinds; `None` for kinds that draw on the raw canvas.
    pub fn cell_size(self) -> Option<(f32, f32)> {
        match self {
            WidgetKind::Life => Some((10.0, 10.0)),
            WidgetKind::Maze => Some((16.0, 16.0)),
            WidgetKind::Donut => Some((8.0, 14.0)),
            WidgetKind::Matrix => Some((12.0, 16.0)),
            WidgetKind::Pipes => Some((10.0, 16.0)),
            WidgetKind::Snake => Some((12.0, 12.0)),
            WidgetKind::Fireworks | WidgetKind::Starfield => None,
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for WidgetKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        WidgetKind::ALL
            .into_iter()
            .find(|k| k.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Container size in device-independent pixels, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Dimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either side is too small to hold a single pixel.
    pub fn is_degenerate(&self) -> bool {
        !(self.width >= 1.0 && self.height >= 1.0)
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Whole cells of `cell_w`×`cell_h` that fit, never less than 1×1.
    pub fn grid(&self, cell_w: f32, cell_h: f32) -> GridSize {
        let cols = whole_cells(self.width, cell_w);
        let rows = whole_cells(self.height, cell_h);
        GridSize::new(cols, rows)
    }

    /// Grid for `kind`'s cell size; canvas kinds get one cell per pixel.
    pub fn grid_for(&self, kind: WidgetKind) -> GridSize {
        let (w, h) = kind.cell_size().unwrap_or((1.0, 1.0));
        self.grid(w, h)
    }

    /// True when `kind`'s extent for this size would be capped at the maximum.
    pub fn exceeds_extent(&self, kind: WidgetKind) -> bool {
        match kind.cell_size() {
            Some((w, h)) => {
                whole_cells(self.width, w) > MAX_GRID_SIDE
                    || whole_cells(self.height, h) > MAX_GRID_SIDE
            }
            None => self.width > MAX_CANVAS_SIDE || self.height > MAX_CANVAS_SIDE,
        }
    }
}

fn whole_cells(px: f32, cell: f32) -> u32 {
    if !px.is_finite() || !cell.is_finite() || cell <= 0.0 || px <= 0.0 {
        return 1;
    }
    ((px / cell).floor() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_loosely() {
        assert_eq!(" Snake ".parse::<WidgetKind>(), Ok(WidgetKind::Snake));
        assert_eq!("MATRIX".parse::<WidgetKind>(), Ok(WidgetKind::Matrix));
        assert_eq!(
            "tetris".parse::<WidgetKind>(),
            Err(UnknownKind("tetris".to_string()))
        );
        for kind in WidgetKind::ALL {
            assert_eq!(kind.key().parse::<WidgetKind>(), Ok(kind));
        }
    }

    #[test]
    fn duplicate_titles_use_id_tail() {
        assert_eq!(
            WidgetKind::Snake.duplicate_title("snake-1700000001234"),
            "snake.exe (1234)"
        );
        assert_eq!(WidgetKind::Life.duplicate_title("life-7"), "life.exe (7)");
    }

    #[test]
    fn degenerate_dimensions_map_to_one_cell() {
        for dims in [
            Dimensions::new(0.0, 0.0),
            Dimensions::new(-5.0, 3.0),
            Dimensions::new(f32::NAN, 100.0),
        ] {
            assert!(dims.is_degenerate());
            let grid = dims.grid_for(WidgetKind::Life);
            assert!(grid.cols >= 1 && grid.rows >= 1);
        }
        let grid = Dimensions::default().grid_for(WidgetKind::Life);
        assert_eq!(grid, GridSize::new(32, 24));
    }

    #[test]
    fn duplicate_stamps_need_key_and_digits() {
        assert_eq!(WidgetKind::Snake.duplicate_stamp("snake-1700000001234"), Some(1_700_000_001_234));
        assert_eq!(WidgetKind::Snake.duplicate_stamp("snake"), None);
        assert_eq!(WidgetKind::Snake.duplicate_stamp("snake-"), None);
        assert_eq!(WidgetKind::Snake.duplicate_stamp("snake-+12"), None);
        assert_eq!(WidgetKind::Snake.duplicate_stamp("life-12"), None);
    }

    #[test]
    fn oversized_containers_are_flagged() {
        let huge = Dimensions::new(1.0e30, 1.0e30);
        for kind in WidgetKind::ALL {
            assert!(huge.exceeds_extent(kind), "{kind}");
            assert!(!Dimensions::default().exceeds_extent(kind), "{kind}");
        }
        let grid = huge.grid_for(WidgetKind::Life);
        assert_eq!((grid.cols, grid.rows), (MAX_GRID_SIDE, MAX_GRID_SIDE));
    }

    #[test]
    fn serde_uses_keys() {
        let json = serde_json::to_string(&WidgetKind::Starfield).unwrap();
        assert_eq!(json, "\"starfield\"");
    }
}
