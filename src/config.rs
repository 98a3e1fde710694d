//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to sensible defaults if the file is missing, incomplete,
//! or describes an inconsistent tuning.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::entity::{PLAYER_HEIGHT, PLAYER_WIDTH};

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tuning: Tuning,
    pub gamepad: GamepadConfig,
    pub tick_rate_ms: u64,
    /// Optional TOML level pack; `None` means the built-in campaign.
    pub levels_file: Option<PathBuf>,
    /// Seed for the generated campaign levels.
    pub seed: u64,
}

/// Everything the simulation core reads. Owned by `World`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub session: SessionTuning,
    pub difficulty: DifficultyTuning,
}

/// Per-tick physics constants. Velocities are pixels per tick.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    pub gravity: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub jump_force: f32,
    /// Upward speed a released jump must still exceed to be shortened.
    pub min_jump_velocity: f32,
    /// Short hop velocity = `min_jump_velocity * short_hop_factor`.
    pub short_hop_factor: f32,
    pub variable_jump_window_ms: u64,
    pub double_tap_ms: u64,
    pub stomp_bounce_divisor: f32,
    /// How far below an enemy's top the previous bottom edge may be and still stomp.
    pub stomp_tolerance: f32,
    pub playfield_height: f32,
    pub fall_margin: f32,
    pub view_width: f32,
    pub camera_lerp: f32,
    pub crouch_width: f32,
    pub crouch_height: f32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    pub starting_lives: u32,
    pub max_lives: u32,
    pub invincibility_ms: f32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    pub progress_cap: f32,
    pub progress_gain: f32,
    pub level_speed_step: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub crouch: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid tuning `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Defaults ──

impl Default for PhysicsTuning {
    fn default() -> Self {
        PhysicsTuning {
            gravity: 0.6,
            walk_speed: 3.5,
            run_speed: 6.0,
            jump_force: 13.0,
            min_jump_velocity: 5.0,
            short_hop_factor: 1.5,
            variable_jump_window_ms: 150,
            double_tap_ms: 220,
            stomp_bounce_divisor: 1.5,
            stomp_tolerance: 5.0,
            playfield_height: 400.0,
            fall_margin: 50.0,
            view_width: 800.0,
            camera_lerp: 0.1,
            crouch_width: 28.0,
            crouch_height: 25.0,
        }
    }
}

impl Default for SessionTuning {
    fn default() -> Self {
        SessionTuning {
            starting_lives: 3,
            max_lives: 5,
            invincibility_ms: 2000.0,
        }
    }
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        DifficultyTuning {
            progress_cap: 1.5,
            progress_gain: 0.5,
            level_speed_step: 0.05,
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: vec!["A".into(), "B".into()],
            crouch: vec!["X".into()],
            confirm: vec!["Start".into()],
            cancel: vec!["Select".into()],
            restart: vec!["Y".into()],
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            tuning: Tuning::default(),
            gamepad: GamepadConfig::default(),
            tick_rate_ms: default_tick_rate(),
            levels_file: None,
            seed: default_seed(),
        }
    }
}

fn default_tick_rate() -> u64 { 16 }
fn default_seed() -> u64 { 20240501 }

// ── Validation ──

impl Tuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        positive("physics.gravity", p.gravity)?;
        positive("physics.walk_speed", p.walk_speed)?;
        positive("physics.jump_force", p.jump_force)?;
        positive("physics.playfield_height", p.playfield_height)?;
        positive("physics.view_width", p.view_width)?;
        positive("physics.stomp_bounce_divisor", p.stomp_bounce_divisor)?;
        if p.run_speed < p.walk_speed {
            return Err(invalid("physics.run_speed", "must be at least walk_speed"));
        }
        if !(p.camera_lerp > 0.0 && p.camera_lerp <= 1.0) {
            return Err(invalid("physics.camera_lerp", "must be in (0, 1]"));
        }
        // Crouching must shrink the hitbox on both axes.
        if !(p.crouch_width > 0.0 && p.crouch_width < PLAYER_WIDTH) {
            return Err(invalid(
                "physics.crouch_width",
                format!("must be in (0, {PLAYER_WIDTH})"),
            ));
        }
        if !(p.crouch_height > 0.0 && p.crouch_height < PLAYER_HEIGHT) {
            return Err(invalid(
                "physics.crouch_height",
                format!("must be in (0, {PLAYER_HEIGHT})"),
            ));
        }

        let s = &self.session;
        if s.max_lives == 0 {
            return Err(invalid("session.max_lives", "must be at least 1"));
        }
        if s.starting_lives == 0 || s.starting_lives > s.max_lives {
            return Err(invalid(
                "session.starting_lives",
                format!("must be in 1..={}", s.max_lives),
            ));
        }
        if !(s.invincibility_ms >= 0.0 && s.invincibility_ms.is_finite()) {
            return Err(invalid("session.invincibility_ms", "must be a non-negative number"));
        }

        let d = &self.difficulty;
        if d.progress_cap < 1.0 {
            return Err(invalid("difficulty.progress_cap", "must be at least 1.0"));
        }
        if d.progress_gain < 0.0 || d.level_speed_step < 0.0 {
            return Err(invalid("difficulty", "gains must be non-negative"));
        }
        Ok(())
    }
}

fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v > 0.0 && v.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be a positive number"))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: PhysicsTuning,
    #[serde(default)]
    session: SessionTuning,
    #[serde(default)]
    difficulty: DifficultyTuning,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGamepad {
    jump: Option<Vec<String>>,
    crouch: Option<Vec<String>>,
    confirm: Option<Vec<String>>,
    cancel: Option<Vec<String>>,
    restart: Option<Vec<String>>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default)]
    levels_file: String,
    #[serde(default = "default_seed")]
    seed: u64,
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tick_rate_ms: default_tick_rate(),
            levels_file: String::new(),
            seed: default_seed(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/bobo`.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. Missing keys fall back to defaults;
    /// a parse error or an invalid tuning yields the full default config.
    pub fn parse(text: &str) -> Self {
        match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => Self::from_toml(cfg, &[]),
            Err(e) => {
                log::warn!("config.toml parse error: {e}; using defaults");
                GameConfig::default()
            }
        }
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let mut tuning = Tuning {
            physics: cfg.physics,
            session: cfg.session,
            difficulty: cfg.difficulty,
        };
        if let Err(e) = tuning.validate() {
            log::warn!("{e}; using default tuning");
            tuning = Tuning::default();
        }

        let defaults = GamepadConfig::default();
        let gamepad = GamepadConfig {
            jump: cfg.gamepad.jump.unwrap_or(defaults.jump),
            crouch: cfg.gamepad.crouch.unwrap_or(defaults.crouch),
            confirm: cfg.gamepad.confirm.unwrap_or(defaults.confirm),
            cancel: cfg.gamepad.cancel.unwrap_or(defaults.cancel),
            restart: cfg.gamepad.restart.unwrap_or(defaults.restart),
        };

        let levels_file = resolve_levels_file(&cfg.general.levels_file, search_dirs);

        GameConfig {
            tuning,
            gamepad,
            tick_rate_ms: cfg.general.tick_rate_ms.max(1),
            levels_file,
            seed: cfg.general.seed,
        }
    }
}

/// Relative pack paths are looked up next to the config file candidates.
fn resolve_levels_file(raw: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    if raw.trim().is_empty() {
        return None;
    }
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Some(path);
    }
    let found = search_dirs.iter().map(|d| d.join(raw)).find(|p| p.is_file());
    Some(found.unwrap_or(path))
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/bobo");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    log::info!("loaded {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    log::warn!("config.toml parse error: {e}; using default settings");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
            }
        }
    }
    TomlConfig::default()
}
