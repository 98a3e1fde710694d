/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer from a world snapshot
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!` and flush once
///   5. Swap front/back
///
/// World pixels map onto cells at `PX_PER_COL` × `PX_PER_ROW`, so the
/// 800×400 view becomes an 80×20 playfield below the HUD row.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use bobo::domain::entity::{Facing, Level, Rgb};
use bobo::domain::geometry::Rect;
use bobo::sim::world::{Hud, Phase, Snapshot};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every empty cell, so the terminal default
    /// never shows through between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Self::BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Background color already painted at (x, y).
    fn bg_at(&self, x: usize, y: usize) -> Color {
        self.get(x, y).bg
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Projection ──

const PX_PER_COL: f32 = 10.0;
const PX_PER_ROW: f32 = 20.0;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const OVERLAY_BG: Color = Color::Rgb { r: 30, g: 30, b: 40 };
const GOLD: Color = Color::Rgb { r: 255, g: 215, b: 0 };
const PLAYER: Color = Color::Rgb { r: 30, g: 90, b: 220 };
const ENEMY: Color = Color::Rgb { r: 220, g: 40, b: 40 };
const BOSS: Color = Color::Rgb { r: 170, g: 30, b: 170 };
const EXIT_SHUT: Color = Color::Rgb { r: 110, g: 80, b: 60 };
const EXIT_OPEN: Color = Color::Rgb { r: 60, g: 220, b: 90 };

fn color(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

/// Cells covered by a world rect, as half-open `(col0, col1, row0, row1)`
/// inside a `cols` × `rows` viewport. Anything visible covers at least
/// one cell. `None` when entirely off-screen.
fn cell_span(
    rect: &Rect,
    camera_x: f32,
    cols: usize,
    rows: usize,
) -> Option<(usize, usize, usize, usize)> {
    let x0 = ((rect.x - camera_x) / PX_PER_COL).floor();
    let x1 = ((rect.right() - camera_x) / PX_PER_COL).ceil().max(x0 + 1.0);
    let y0 = (rect.y / PX_PER_ROW).floor();
    let y1 = (rect.bottom() / PX_PER_ROW).ceil().max(y0 + 1.0);
    if x1 <= 0.0 || y1 <= 0.0 || x0 >= cols as f32 || y0 >= rows as f32 {
        return None;
    }
    let clip = |v: f32, max: usize| v.max(0.0).min(max as f32) as usize;
    Some((clip(x0, cols), clip(x1, cols), clip(y0, rows), clip(y1, rows)))
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the
    /// terminal will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }
        log::debug!("keyboard release events: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, snap: &Snapshot<'_>, hud: &Hud, paused: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(snap.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(snap.phase);
        }

        self.front.clear();

        match snap.phase {
            Phase::Title => self.compose_title(snap),
            Phase::Playing => {
                self.compose_game(snap, hud);
                if paused {
                    self.compose_box(snap, &[("PAUSED", GOLD), ("P / F1: Resume", Color::White)]);
                }
            }
            Phase::LevelComplete => {
                self.compose_game(snap, hud);
                let title = format!("LEVEL {} COMPLETE!", hud.level);
                self.compose_box(
                    snap,
                    &[(title.as_str(), EXIT_OPEN), ("ENTER: Next level", Color::White)],
                );
            }
            Phase::GameOver => {
                self.compose_game(snap, hud);
                let reached = format!("Reached level {} of {}", hud.level, hud.levels);
                self.compose_box(
                    snap,
                    &[
                        ("GAME OVER", ENEMY),
                        (reached.as_str(), Color::White),
                        ("ENTER / R: Try again   Q: Quit", Color::Grey),
                    ],
                );
            }
            Phase::Won => {
                self.compose_game(snap, hud);
                let lives = format!("All {} levels cleared with {} lives left", hud.levels, hud.lives);
                self.compose_box(
                    snap,
                    &[
                        ("YOU WIN!", GOLD),
                        (lives.as_str(), Color::White),
                        ("ENTER / R: Play again   Q: Quit", Color::Grey),
                    ],
                );
            }
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn view_size(&self, snap: &Snapshot<'_>) -> (usize, usize) {
        let cols = ((snap.view_width / PX_PER_COL) as usize).min(self.front.width);
        let rows = ((snap.playfield_height / PX_PER_ROW) as usize)
            .min(self.front.height.saturating_sub(MAP_ROW + 1));
        (cols, rows)
    }

    fn compose_game(&mut self, snap: &Snapshot<'_>, hud: &Hud) {
        self.compose_hud(hud);
        let Some(level) = snap.level else { return };
        let (cols, rows) = self.view_size(snap);

        let sky = color(level.theme.background);
        for row in 0..rows {
            for col in 0..cols {
                self.front.set(col, MAP_ROW + row, Cell::new(' ', Color::White, sky));
            }
        }

        self.compose_level(level, snap.camera_x, cols, rows);

        // Blink while invincible.
        let visible = !snap.invincible || (snap.tick / 4) % 2 == 0;
        if let (Some(p), true) = (snap.player, visible) {
            let glyph = match (p.crouching, p.facing) {
                (true, _) => '▄',
                (false, Facing::Right) => '▶',
                (false, Facing::Left) => '◀',
            };
            self.paint(&p.hitbox, snap.camera_x, cols, rows, glyph, PLAYER, true);
        }

        let help_row = MAP_ROW + rows;
        if help_row < self.front.height {
            let help = " ←→/AD: Move (tap twice: run)  Space/↑: Jump  ↓/S: Crouch  P: Pause  R: Restart  Q: Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_level(&mut self, level: &Level, camera_x: f32, cols: usize, rows: usize) {
        for p in &level.platforms {
            let glyph = if p.is_moving() { '▓' } else { '█' };
            self.paint(&p.rect, camera_x, cols, rows, glyph, color(p.color), false);
        }

        let (exit_glyph, exit_fg) =
            if level.exit.is_open { ('▒', EXIT_OPEN) } else { ('░', EXIT_SHUT) };
        self.paint(&level.exit.rect, camera_x, cols, rows, exit_glyph, exit_fg, false);

        for c in level.collectibles.iter().filter(|c| !c.collected) {
            self.paint(&c.rect, camera_x, cols, rows, '◆', GOLD, false);
        }

        for e in &level.enemies {
            let (glyph, fg) = if e.is_boss { ('▀', BOSS) } else { ('▲', ENEMY) };
            self.paint(&e.rect, camera_x, cols, rows, glyph, fg, false);
        }
    }

    /// Fill a world rect with `glyph`. Solid fills keep the sky behind as
    /// background; `fill_bg` paints the glyph color there too.
    #[allow(clippy::too_many_arguments)]
    fn paint(
        &mut self,
        rect: &Rect,
        camera_x: f32,
        cols: usize,
        rows: usize,
        glyph: char,
        fg: Color,
        fill_bg: bool,
    ) {
        let Some((c0, c1, r0, r1)) = cell_span(rect, camera_x, cols, rows) else { return };
        for row in r0..r1 {
            for col in c0..c1 {
                let y = MAP_ROW + row;
                let bg = if fill_bg { fg } else { self.front.bg_at(col, y) };
                let fg = if fill_bg { Color::White } else { fg };
                self.front.set(col, y, Cell::new(glyph, fg, bg));
            }
        }
    }

    fn compose_hud(&mut self, hud: &Hud) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hearts: String = (0..hud.max_lives)
            .map(|i| if i < hud.lives { '♥' } else { '·' })
            .collect();
        let goal = if hud.boss {
            "BOSS".to_string()
        } else {
            format!("◆ {}/{}", hud.collected, hud.required)
        };
        let exit = if hud.exit_open { "EXIT OPEN" } else { "" };
        let line = format!(
            " Bobo's Adventure   Level {}/{}   {}   {}   {}",
            hud.level, hud.levels, hearts, goal, exit
        );
        self.front.put_str(0, HUD_ROW, &line, Color::White, HUD_BG);
    }

    fn compose_title(&mut self, snap: &Snapshot<'_>) {
        self.compose_box(
            snap,
            &[
                ("BOBO'S ADVENTURE", GOLD),
                ("", Color::White),
                ("Collect the gems, stomp the critters,", Color::White),
                ("and reach the exit once it opens.", Color::White),
                ("", Color::White),
                ("ENTER: Start    Q: Quit", EXIT_OPEN),
            ],
        );
    }

    /// A centered message box over the playfield.
    fn compose_box(&mut self, snap: &Snapshot<'_>, lines: &[(&str, Color)]) {
        let (cols, rows) = self.view_size(snap);
        let inner = lines.iter().map(|(s, _)| s.chars().count()).max().unwrap_or(0);
        let box_w = (inner + 6).min(cols.max(1));
        let box_h = (lines.len() + 2).min(rows.max(1));
        let x0 = cols.saturating_sub(box_w) / 2;
        let y0 = MAP_ROW + rows.saturating_sub(box_h) / 2;

        for y in y0..y0 + box_h {
            for x in x0..x0 + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, OVERLAY_BG));
            }
        }
        for (i, (text, fg)) in lines.iter().enumerate() {
            let len = text.chars().count();
            let x = x0 + box_w.saturating_sub(len) / 2;
            self.front.put_str(x, y0 + 1 + i, text, *fg, OVERLAY_BG);
        }
    }
}
