//! Entities: Player, Platform (static or moving), Collectible, Enemy, Exit,
//! and the live Level that owns them.
//!
//! Positions are world pixels (f32). Everything here is plain data plus
//! small invariant-keeping helpers; motion lives in `physics` and `ai`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::Rect;

pub const PLAYER_WIDTH: f32 = 30.0;
pub const PLAYER_HEIGHT: f32 = 40.0;
pub const EXIT_SIZE: f32 = 50.0;
/// Height of the ground strip; platforms whose top sits this far above the
/// floor take the theme's ground color.
pub const GROUND_THICKNESS: f32 = 20.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

// ── Color ──

/// 24-bit color, written `#rrggbb` in level files.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// HSL (degrees, percent, percent) to RGB.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(360.0) / 360.0;
        let s = (s / 100.0).clamp(0.0, 1.0);
        let l = (l / 100.0).clamp(0.0, 1.0);
        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Rgb::new(v, v, v);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |mut t: f32| {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let hex = s.strip_prefix('#').unwrap_or(&s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected #rrggbb, got {s:?}"));
        }
        let part = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("bad hex color {s:?}"))
        };
        Ok(Rgb::new(part(0)?, part(2)?, part(4)?))
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> String {
        c.to_string()
    }
}

/// Per-level palette.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub background: Rgb,
    pub ground: Rgb,
    pub platform: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Rgb::new(0x87, 0xce, 0xeb),
            ground: Rgb::new(0x28, 0xa7, 0x45),
            platform: Rgb::new(0x6f, 0x4e, 0x37),
        }
    }
}

// ── Player ──

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Nominal standing size; the crouch only changes `draw_*`.
    pub width: f32,
    pub height: f32,
    pub draw_width: f32,
    pub draw_height: f32,
    pub facing: Facing,
    pub is_jumping: bool,
    pub on_ground: bool,
    pub crouching: bool,
    pub can_variable_jump: bool,
    /// Tick clock (ms) of the press that started the current jump.
    pub jump_pressed_at: u64,
    /// One-shot jump credit granted by a stomp.
    pub bounce_jump: bool,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            draw_width: PLAYER_WIDTH,
            draw_height: PLAYER_HEIGHT,
            facing: Facing::Right,
            is_jumping: false,
            on_ground: false,
            crouching: false,
            can_variable_jump: false,
            jump_pressed_at: 0,
            bounce_jump: false,
        }
    }

    /// Collision box. Crouching keeps the feet where they are and the box
    /// centered on the standing box.
    pub fn hitbox(&self) -> Rect {
        Rect::new(
            self.x + (self.width - self.draw_width) / 2.0,
            self.y + (self.height - self.draw_height),
            self.draw_width,
            self.draw_height,
        )
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Move so the feet rest on `surface_y`.
    pub fn stand_on(&mut self, surface_y: f32) {
        self.y = surface_y - self.height;
        self.vy = 0.0;
        self.on_ground = true;
        self.is_jumping = false;
        self.can_variable_jump = false;
        self.bounce_jump = false;
    }

    pub fn crouch(&mut self, w: f32, h: f32) {
        self.crouching = true;
        self.draw_width = w;
        self.draw_height = h;
    }

    pub fn stand_up(&mut self) {
        self.crouching = false;
        self.draw_width = self.width;
        self.draw_height = self.height;
    }

    /// Zero motion and clear transient state after a respawn.
    pub fn reset_motion(&mut self) {
        self.vx = 0.0;
        self.vy = 0.0;
        self.is_jumping = false;
        self.on_ground = false;
        self.can_variable_jump = false;
        self.bounce_jump = false;
        self.stand_up();
    }
}

// ── Platforms ──

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovingPath {
    /// Left end of travel; the platform never goes left of it.
    pub origin: f32,
    pub speed: f32,
    pub range: f32,
    pub direction: Facing,
    /// Displacement applied on the most recent tick, after clamping.
    pub last_dx: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlatformKind {
    Static,
    Moving(MovingPath),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
    pub rect: Rect,
    pub kind: PlatformKind,
    pub color: Rgb,
}

impl Platform {
    pub fn is_moving(&self) -> bool {
        matches!(self.kind, PlatformKind::Moving(_))
    }

    /// Horizontal displacement from the last tick; 0 for static platforms.
    pub fn carry_dx(&self) -> f32 {
        match self.kind {
            PlatformKind::Moving(path) => path.last_dx,
            PlatformKind::Static => 0.0,
        }
    }
}

// ── Collectibles / Enemies / Exit ──

#[derive(Clone, Debug, PartialEq)]
pub struct Collectible {
    pub rect: Rect,
    pub collected: bool,
}

impl Collectible {
    pub fn new(rect: Rect) -> Self {
        Collectible { rect, collected: false }
    }

    /// Returns true only on the first pickup.
    pub fn collect(&mut self) -> bool {
        !std::mem::replace(&mut self.collected, true)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Patrol {
    pub start: f32,
    pub end: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub rect: Rect,
    /// Speed as authored; the live `speed` is derived from it every tick.
    pub base_speed: f32,
    pub speed: f32,
    pub direction: Facing,
    pub patrol: Patrol,
    pub is_boss: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Exit {
    pub rect: Rect,
    pub is_open: bool,
}

// ── Level ──

/// Completion gate for a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Objective {
    Collect { required: usize },
    DefeatAll,
}

/// A live level instance. Rebuilt from its template on every load.
#[derive(Clone, Debug)]
pub struct Level {
    pub index: usize,
    pub name: String,
    pub width: f32,
    pub theme: Theme,
    pub spawn: (f32, f32),
    pub platforms: Vec<Platform>,
    pub collectibles: Vec<Collectible>,
    pub enemies: Vec<Enemy>,
    pub exit: Exit,
    pub objective: Objective,
}

impl Level {
    pub fn is_boss(&self) -> bool {
        self.objective == Objective::DefeatAll
    }

    /// Collectibles still needed; 0 on boss levels.
    pub fn required(&self) -> usize {
        match self.objective {
            Objective::Collect { required } => required,
            Objective::DefeatAll => 0,
        }
    }

    pub fn objective_met(&self, collected: usize) -> bool {
        match self.objective {
            Objective::Collect { required } => collected >= required,
            Objective::DefeatAll => self.enemies.is_empty(),
        }
    }

    /// Open the exit once the objective holds. Returns true if it opened now.
    pub fn refresh_exit(&mut self, collected: usize) -> bool {
        if !self.exit.is_open && self.objective_met(collected) {
            self.exit.is_open = true;
            true
        } else {
            false
        }
    }
}
