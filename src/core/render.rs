//! Render adapters: simulation state to draw primitives.
//!
//! Adapters never fail. Anything that falls outside the container (the state
//! can be a step behind a resize) is dropped instead of drawn.

use ambient_sims::donut::LUMINANCE_RAMP;
use ambient_sims::starfield::{BASE_APPROACH, MAX_DEPTH};
use ambient_sims::{
    Canvas, Dir, DonutSim, FireworksSim, GlyphRainSim, GridSize, LifeSim, MazeSim, PipesSim, Rgb,
    Simulation, SnakeSim, StarfieldSim, StepParams, PALETTE,
};
use serde::{Deserialize, Serialize};

use crate::kind::{Dimensions, WidgetKind};
use crate::state::SimulationState;

/// Colour of a primitive: a theme slot the host maps to its palette, or a fixed colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Paint {
    Foreground,
    Accent,
    Muted,
    Rgb(u8, u8, u8),
}

impl From<Rgb> for Paint {
    fn from(c: Rgb) -> Self {
        Paint::Rgb(c.0, c.1, c.2)
    }
}

const FOOD: Paint = Paint::Rgb(239, 68, 68);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DrawPrimitive {
    Cell {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        paint: Paint,
    },
    Glyph {
        x: f32,
        y: f32,
        ch: char,
        opacity: f32,
        paint: Paint,
    },
    Line {
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        width: f32,
        paint: Paint,
    },
    Point {
        x: f32,
        y: f32,
        radius: f32,
        opacity: f32,
        paint: Paint,
    },
}

/// Pixel layout of a maze inside its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MazeGeometry {
    dims: Dimensions,
    grid: GridSize,
    pub cell: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl MazeGeometry {
    fn compute(dims: &Dimensions, grid: GridSize) -> Self {
        let canvas = dims.canvas();
        let cell = (canvas.width / grid.cols as f32).min(canvas.height / grid.rows as f32);
        Self {
            dims: *dims,
            grid,
            cell,
            offset_x: (canvas.width - cell * grid.cols as f32) * 0.5,
            offset_y: (canvas.height - cell * grid.rows as f32) * 0.5,
        }
    }

    fn origin(&self, x: u32, y: u32) -> (f32, f32) {
        (
            self.offset_x + x as f32 * self.cell,
            self.offset_y + y as f32 * self.cell,
        )
    }
}

/// Derived geometry an instance keeps between frames.
#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    maze: Option<MazeGeometry>,
    geometry_builds: u64,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times the maze geometry had to be recomputed.
    pub fn geometry_builds(&self) -> u64 {
        self.geometry_builds
    }

    pub fn clear(&mut self) {
        self.maze = None;
    }

    fn maze_geometry(&mut self, dims: &Dimensions, grid: GridSize) -> MazeGeometry {
        match self.maze {
            Some(g) if g.dims == *dims && g.grid == grid => g,
            _ => {
                let g = MazeGeometry::compute(dims, grid);
                self.maze = Some(g);
                self.geometry_builds += 1;
                g
            }
        }
    }
}

/// Draw `state` into a container of `dims`.
pub fn render(
    state: &SimulationState,
    dims: &Dimensions,
    params: &StepParams,
    cache: &mut RenderCache,
) -> Vec<DrawPrimitive> {
    match state {
        SimulationState::Life(s) => render_life(s, dims),
        SimulationState::Maze(s) => render_maze(s, dims, cache),
        SimulationState::Fireworks(s) => render_fireworks(s, dims),
        SimulationState::Donut(s) => render_donut(s, dims),
        SimulationState::Matrix(s) => render_matrix(s, dims),
        SimulationState::Starfield(s) => render_starfield(s, dims, params),
        SimulationState::Pipes(s) => render_pipes(s, dims),
        SimulationState::Snake(s) => render_snake(s, dims),
    }
}

/// Cell size and the part of a state grid that fits the container.
fn cell_layout(kind: WidgetKind, dims: &Dimensions) -> (f32, f32, GridSize) {
    let (cw, ch) = kind.cell_size().unwrap_or((1.0, 1.0));
    (cw, ch, dims.grid(cw, ch))
}

fn cell_rect(x: u32, y: u32, cw: f32, ch: f32, paint: Paint) -> DrawPrimitive {
    DrawPrimitive::Cell {
        x: x as f32 * cw,
        y: y as f32 * ch,
        w: (cw - 1.0).max(1.0),
        h: (ch - 1.0).max(1.0),
        paint,
    }
}

fn render_life(sim: &LifeSim, dims: &Dimensions) -> Vec<DrawPrimitive> {
    let (cw, ch, fit) = cell_layout(WidgetKind::Life, dims);
    let size = sim.size();
    let mut out = Vec::with_capacity(sim.live_count());
    for y in 0..size.rows.min(fit.rows) {
        for x in 0..size.cols.min(fit.cols) {
            if sim.is_alive(x, y) {
                out.push(cell_rect(x, y, cw, ch, Paint::Foreground));
            }
        }
    }
    out
}

fn render_maze(sim: &MazeSim, dims: &Dimensions, cache: &mut RenderCache) -> Vec<DrawPrimitive> {
    let grid = sim.grid();
    let size = grid.size();
    let geo = cache.maze_geometry(dims, size);
    let line = |x0: f32, y0: f32, x1: f32, y1: f32| DrawPrimitive::Line {
        x0,
        y0,
        x1,
        y1,
        width: 1.0,
        paint: Paint::Foreground,
    };

    let mut out = Vec::new();
    if let Some((hx, hy)) = sim.head().filter(|_| !sim.is_complete()) {
        let (px, py) = geo.origin(hx, hy);
        out.push(DrawPrimitive::Cell {
            x: px,
            y: py,
            w: geo.cell,
            h: geo.cell,
            paint: Paint::Accent,
        });
    }
    // Top and left walls per cell, plus the far edges once.
    for y in 0..size.rows {
        for x in 0..size.cols {
            let (px, py) = geo.origin(x, y);
            let (qx, qy) = (px + geo.cell, py + geo.cell);
            if grid.has_wall(x, y, Dir::Up) {
                out.push(line(px, py, qx, py));
            }
            if grid.has_wall(x, y, Dir::Left) {
                out.push(line(px, py, px, qy));
            }
            if x + 1 == size.cols && grid.has_wall(x, y, Dir::Right) {
                out.push(line(qx, py, qx, qy));
            }
            if y + 1 == size.rows && grid.has_wall(x, y, Dir::Down) {
                out.push(line(px, qy, qx, qy));
            }
        }
    }
    out
}

fn render_fireworks(sim: &FireworksSim, dims: &Dimensions) -> Vec<DrawPrimitive> {
    let canvas = dims.canvas();
    let rockets = sim.rockets().iter().map(|r| (r.x, r.y, 2.0, 1.0, r.color));
    let sparks = sim
        .particles()
        .iter()
        .map(|p| (p.x, p.y, 1.5, p.life_fraction(), p.color));
    rockets
        .chain(sparks)
        .filter(|&(x, y, ..)| canvas.contains(x, y))
        .map(|(x, y, radius, opacity, color)| DrawPrimitive::Point {
            x,
            y,
            radius,
            opacity,
            paint: color.into(),
        })
        .collect()
}

fn render_donut(sim: &DonutSim, dims: &Dimensions) -> Vec<DrawPrimitive> {
    let (cw, ch, fit) = cell_layout(WidgetKind::Donut, dims);
    let frame = sim.frame(fit.cols, fit.rows);
    let levels = LUMINANCE_RAMP.len() as f32;
    let mut out = Vec::with_capacity(frame.lit_cells());
    for row in 0..frame.rows {
        for col in 0..frame.cols {
            let idx = (row as usize) * (frame.cols as usize) + col as usize;
            let Some(level) = frame.cells[idx] else {
                continue;
            };
            out.push(DrawPrimitive::Glyph {
                x: col as f32 * cw,
                y: row as f32 * ch,
                ch: LUMINANCE_RAMP[level as usize] as char,
                opacity: (level as f32 + 1.0) / levels,
                paint: Paint::Foreground,
            });
        }
    }
    out
}

const KATAKANA_FIRST: u32 = 0xFF66;
const KATAKANA_COUNT: u32 = 56;

/// Half-width katakana or a digit, picked by `key`.
pub fn rain_glyph(key: u32) -> char {
    let i = key % (KATAKANA_COUNT + 10);
    if i < KATAKANA_COUNT {
        char::from_u32(KATAKANA_FIRST + i).unwrap_or('0')
    } else {
        char::from_digit(i - KATAKANA_COUNT, 10).unwrap_or('0')
    }
}

fn render_matrix(sim: &GlyphRainSim, dims: &Dimensions) -> Vec<DrawPrimitive> {
    let (cw, ch, fit) = cell_layout(WidgetKind::Matrix, dims);
    let rows = sim.extent().rows.min(fit.rows) as i64;
    let mut out = Vec::new();
    for (col, column) in sim.columns().iter().enumerate().take(fit.cols as usize) {
        let head = column.head_row();
        let trail = column.trail.max(1);
        for k in 0..trail {
            let row = head - k as i64;
            if row < 0 || row >= rows {
                continue;
            }
            let paint = if k == 0 { Paint::Foreground } else { Paint::Accent };
            out.push(DrawPrimitive::Glyph {
                x: col as f32 * cw,
                y: row as f32 * ch,
                ch: rain_glyph(sim.glyph_key(col as u32, row)),
                opacity: 1.0 - k as f32 / trail as f32,
                paint,
            });
        }
    }
    out
}

fn render_starfield(
    sim: &StarfieldSim,
    dims: &Dimensions,
    params: &StepParams,
) -> Vec<DrawPrimitive> {
    let canvas: Canvas = dims.canvas();
    let streak = BASE_APPROACH * params.speed.max(0.0);
    let mut out = Vec::with_capacity(sim.stars().len() * 2);
    for star in sim.stars() {
        let (x1, y1) = StarfieldSim::project(canvas, star, star.depth);
        if !canvas.contains(x1, y1) {
            continue;
        }
        let (x0, y0) = StarfieldSim::project(canvas, star, (star.depth + streak).min(MAX_DEPTH));
        let nearness = (1.0 - star.depth / MAX_DEPTH).clamp(0.0, 1.0);
        let opacity = nearness.max(0.15);
        out.push(DrawPrimitive::Line {
            x0,
            y0,
            x1,
            y1,
            width: 0.5 + nearness * 1.5,
            paint: Paint::Muted,
        });
        out.push(DrawPrimitive::Point {
            x: x1,
            y: y1,
            radius: 0.5 + nearness * 2.0,
            opacity,
            paint: Paint::Foreground,
        });
    }
    out
}

/// Box-drawing glyph for a connection mask (up=1, right=2, down=4, left=8).
pub fn pipe_glyph(links: u8) -> char {
    match links & 0x0F {
        0 => '•',
        1 => '╵',
        2 => '╶',
        4 => '╷',
        8 => '╴',
        3 => '└',
        5 => '│',
        6 => '┌',
        9 => '┘',
        10 => '─',
        12 => '┐',
        7 => '├',
        11 => '┴',
        13 => '┤',
        14 => '┬',
        _ => '┼',
    }
}

fn render_pipes(sim: &PipesSim, dims: &Dimensions) -> Vec<DrawPrimitive> {
    let (cw, ch, fit) = cell_layout(WidgetKind::Pipes, dims);
    let size = sim.extent();
    let mut out = Vec::with_capacity(sim.occupied());
    for y in 0..size.rows.min(fit.rows) {
        for x in 0..size.cols.min(fit.cols) {
            let Some(cell) = sim.cell(x, y) else {
                continue;
            };
            out.push(DrawPrimitive::Glyph {
                x: x as f32 * cw,
                y: y as f32 * ch,
                ch: pipe_glyph(cell.links),
                opacity: 1.0,
                paint: PALETTE[cell.color as usize % PALETTE.len()].into(),
            });
        }
    }
    out
}

fn render_snake(sim: &SnakeSim, dims: &Dimensions) -> Vec<DrawPrimitive> {
    let (cw, ch, fit) = cell_layout(WidgetKind::Snake, dims);
    let fits = |(x, y): (u32, u32)| x < fit.cols && y < fit.rows;
    let mut out = Vec::with_capacity(sim.len() + 1);
    if let Some(food) = sim.food().filter(|&c| fits(c)) {
        out.push(cell_rect(food.0, food.1, cw, ch, FOOD));
    }
    for (i, seg) in sim.body().enumerate() {
        if !fits(seg) {
            continue;
        }
        let paint = if i == 0 { Paint::Accent } else { Paint::Foreground };
        out.push(cell_rect(seg.0, seg.1, cw, ch, paint));
    }
    out
}

/// Render primitives onto a `cols × rows` character grid for terminal hosts.
pub fn rasterize_text(
    prims: &[DrawPrimitive],
    cols: u32,
    rows: u32,
    cell_w: f32,
    cell_h: f32,
) -> String {
    let cols = cols.max(1) as usize;
    let rows = rows.max(1) as usize;
    let cell_w = if cell_w > 0.0 { cell_w } else { 1.0 };
    let cell_h = if cell_h > 0.0 { cell_h } else { 1.0 };
    let mut grid = vec![vec![' '; cols]; rows];

    let mut put = |px: f32, py: f32, c: char| {
        if !(px.is_finite() && py.is_finite()) || px < 0.0 || py < 0.0 {
            return;
        }
        let (cx, cy) = ((px / cell_w) as usize, (py / cell_h) as usize);
        if cx < cols && cy < rows {
            grid[cy][cx] = c;
        }
    };

    for prim in prims {
        match *prim {
            DrawPrimitive::Cell { x, y, w, h, .. } => {
                let mut py = y;
                while py < y + h {
                    let mut px = x;
                    while px < x + w {
                        put(px, py, '#');
                        px += cell_w;
                    }
                    py += cell_h;
                }
            }
            DrawPrimitive::Glyph { x, y, ch, .. } => put(x, y, ch),
            DrawPrimitive::Point { x, y, opacity, .. } => {
                put(x, y, if opacity > 0.5 { '*' } else { '.' })
            }
            DrawPrimitive::Line { x0, y0, x1, y1, .. } => {
                let (dx, dy) = (x1 - x0, y1 - y0);
                let c = if dx.abs() >= dy.abs() * 2.0 {
                    '-'
                } else if dy.abs() >= dx.abs() * 2.0 {
                    '|'
                } else if (dx > 0.0) == (dy > 0.0) {
                    '\\'
                } else {
                    '/'
                };
                let samples = ((dx.abs() / cell_w).max(dy.abs() / cell_h) * 2.0).ceil() as u32;
                for i in 0..=samples.min(4096) {
                    let t = if samples == 0 { 0.0 } else { i as f32 / samples as f32 };
                    put(x0 + dx * t, y0 + dy * t, c);
                }
            }
        }
    }

    let mut out = String::with_capacity(rows * (cols + 1));
    for (i, line) in grid.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.extend(line.iter());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> Dimensions {
        Dimensions::new(320.0, 240.0)
    }

    #[test]
    fn life_draws_one_cell_per_live_cell() {
        let sim = LifeSim::from_live_cells(GridSize::new(32, 24), &[(1, 1), (2, 1), (5, 7)], 1);
        let prims = render_life(&sim, &dims());
        assert_eq!(prims.len(), 3);
        assert!(prims.contains(&DrawPrimitive::Cell {
            x: 50.0,
            y: 70.0,
            w: 9.0,
            h: 9.0,
            paint: Paint::Foreground,
        }));
    }

    #[test]
    fn oversized_state_is_clipped_not_fatal() {
        let sim = LifeSim::from_live_cells(GridSize::new(100, 100), &[(0, 0), (90, 90)], 1);
        let small = Dimensions::new(50.0, 50.0);
        let prims = render_life(&sim, &small);
        assert_eq!(prims.len(), 1);

        for kind in WidgetKind::ALL {
            let state = SimulationState::init(kind, &Dimensions::new(800.0, 600.0), 3);
            let mut cache = RenderCache::new();
            render(&state, &Dimensions::new(0.0, 0.0), &StepParams::default(), &mut cache);
        }
    }

    #[test]
    fn maze_geometry_is_cached_per_size() {
        let sim = MazeSim::init(GridSize::new(20, 15), 4);
        let mut cache = RenderCache::new();
        let first = render_maze(&sim, &dims(), &mut cache);
        let again = render_maze(&sim, &dims(), &mut cache);
        assert_eq!(first, again);
        assert_eq!(cache.geometry_builds(), 1);
        render_maze(&sim, &Dimensions::new(400.0, 300.0), &mut cache);
        assert_eq!(cache.geometry_builds(), 2);
    }

    #[test]
    fn fresh_maze_is_fully_walled() {
        let sim = MazeSim::init(GridSize::new(4, 3), 4);
        let mut cache = RenderCache::new();
        let lines = render_maze(&sim, &dims(), &mut cache)
            .into_iter()
            .filter(|p| matches!(p, DrawPrimitive::Line { .. }))
            .count();
        // Shared walls once each: 4 rows of 4 horizontal, 5 columns of 3 vertical.
        assert_eq!(lines, 31);
    }

    #[test]
    fn pipe_glyphs_cover_every_mask() {
        assert_eq!(pipe_glyph(0b0101), '│');
        assert_eq!(pipe_glyph(0b1010), '─');
        assert_eq!(pipe_glyph(0b1111), '┼');
        let distinct: std::collections::HashSet<char> = (0u8..16).map(pipe_glyph).collect();
        assert_eq!(distinct.len(), 16);
    }

    #[test]
    fn rain_glyphs_are_katakana_or_digits() {
        for key in 0..200 {
            let c = rain_glyph(key);
            assert!(c.is_ascii_digit() || ('\u{FF66}'..='\u{FF9D}').contains(&c));
        }
    }

    #[test]
    fn snake_head_is_accent_and_food_is_red() {
        let sim = SnakeSim::init(GridSize::new(26, 20), 8);
        let prims = render_snake(&sim, &dims());
        assert_eq!(prims.len(), sim.len() + 1);
        let accents = prims
            .iter()
            .filter(|p| matches!(p, DrawPrimitive::Cell { paint: Paint::Accent, .. }))
            .count();
        assert_eq!(accents, 1);
        assert!(matches!(prims[0], DrawPrimitive::Cell { paint: FOOD, .. }));
    }

    #[test]
    fn primitives_serialize_with_type_tag() {
        let p = DrawPrimitive::Point {
            x: 1.0,
            y: 2.0,
            radius: 1.0,
            opacity: 0.5,
            paint: Paint::Accent,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.starts_with(r#"{"type":"Point""#));
        let back: DrawPrimitive = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn rasterize_places_glyphs_and_clips() {
        let prims = vec![
            DrawPrimitive::Glyph {
                x: 16.0,
                y: 0.0,
                ch: '@',
                opacity: 1.0,
                paint: Paint::Foreground,
            },
            DrawPrimitive::Line {
                x0: 0.0,
                y0: 16.0,
                x1: 23.0,
                y1: 16.0,
                width: 1.0,
                paint: Paint::Foreground,
            },
            DrawPrimitive::Point {
                x: 999.0,
                y: 999.0,
                radius: 1.0,
                opacity: 1.0,
                paint: Paint::Foreground,
            },
        ];
        let text = rasterize_text(&prims, 4, 3, 8.0, 8.0);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["  @ ", "    ", "--- "]);
    }
}
