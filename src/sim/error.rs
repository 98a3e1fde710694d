//! Error types for the simulation core and level loading.

use std::path::PathBuf;

use thiserror::Error;

use super::world::Phase;
use crate::config::ConfigError;

/// Malformed level data. Raised when a pack is loaded or a level is
/// instantiated; values are never clamped into range silently.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level pack contains no levels")]
    EmptyPack,
    #[error("level {level:?}: width must be positive, got {width}")]
    NonPositiveWidth { level: String, width: f32 },
    #[error("level {level:?}: required fraction must be within [0, 1], got {fraction}")]
    FractionOutOfRange { level: String, fraction: f32 },
    #[error("level {level:?}: platform #{index} has a degenerate box")]
    BadPlatform { level: String, index: usize },
    #[error("level {level:?}: platform #{index} has invalid motion (speed and range must be positive)")]
    BadMotion { level: String, index: usize },
    #[error("level {level:?}: collectible #{index} has a degenerate box")]
    BadCollectible { level: String, index: usize },
    #[error("level {level:?}: enemy #{index} has a degenerate box or negative speed")]
    BadEnemy { level: String, index: usize },
    #[error("level {level:?}: enemy #{index} starts outside its patrol [{start}, {end}]")]
    BadPatrol { level: String, index: usize, start: f32, end: f32 },
    #[error("level {level:?}: exit at y={exit_y} lies outside the playfield")]
    ExitOutOfBounds { level: String, exit_y: f32 },
    #[error("could not read level pack {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse level pack: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Precondition failures on the simulation entry points.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no level loaded")]
    NoLevelLoaded,
    #[error("`{op}` is not allowed in phase {phase:?}")]
    WrongPhase { op: &'static str, phase: Phase },
    #[error("tick length must be finite and non-negative, got {0}")]
    InvalidElapsed(f32),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
