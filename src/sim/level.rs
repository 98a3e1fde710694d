//! Level templates, validation, instantiation and the built-in campaign.
//!
//! ## Sources (priority order):
//!   1. TOML level pack named by `general.levels_file` in config.toml
//!   2. Built-in campaign (authored level 1, seeded generation for the rest)
//!
//! ## Pack format:
//!   ```toml
//!   [[level]]
//!   name = "Meadow"
//!   width = 3200
//!   required_fraction = 0.6
//!   exit_y = 340
//!
//!   [level.theme]
//!   background = "#87ceeb"
//!   ground = "#28a745"
//!   platform = "#6f4e37"
//!
//!   [[level.platform]]
//!   x = 0
//!   y = 380
//!   w = 400
//!   h = 20
//!
//!   [[level.platform]]
//!   x = 1600
//!   y = 240
//!   w = 70
//!   h = 20
//!   motion = { speed = 1.0, range = 50.0, direction = "right" }
//!
//!   [[level.collectible]]
//!   x = 180
//!   y = 295
//!   w = 15
//!   h = 25
//!
//!   [[level.enemy]]
//!   x = 400
//!   y = 350
//!   w = 40
//!   h = 30
//!   speed = 1.0
//!   patrol_start = 300
//!   patrol_end = 500
//!   ```
//!
//! Templates are immutable; every load builds fresh entities from them.

use std::path::Path;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Deserialize;

use super::error::LevelError;
use super::generate::{self, EnemySpread, PlatformSpread, PLATFORM_HEIGHT};
use crate::config::{GameConfig, PhysicsTuning};
use crate::domain::entity::{
    Collectible, Enemy, Exit, Facing, Level, MovingPath, Objective, Patrol, Platform,
    PlatformKind, Rgb, Theme, EXIT_SIZE, GROUND_THICKNESS,
};
use crate::domain::geometry::Rect;

/// Player spawn, relative to the left edge and the floor.
pub const SPAWN_X: f32 = 100.0;
pub const SPAWN_ABOVE_FLOOR: f32 = 100.0;
/// The exit stands this far in from the level's right edge.
pub const EXIT_INSET: f32 = 100.0;
pub const DEFAULT_EXIT_ABOVE_FLOOR: f32 = 60.0;

// ══════════════════════════════════════════════════════════════
// Template data
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LevelTemplate {
    pub name: String,
    pub width: f32,
    #[serde(default)]
    pub theme: Theme,
    /// Top edge of the exit door. Defaults to 60px above the floor.
    #[serde(default)]
    pub exit_y: Option<f32>,
    #[serde(default)]
    pub required_fraction: f32,
    /// Boss levels ignore collectibles and open once every enemy is gone.
    #[serde(default)]
    pub boss: bool,
    #[serde(default, rename = "platform")]
    pub platforms: Vec<PlatformDef>,
    #[serde(default, rename = "collectible")]
    pub collectibles: Vec<Rect>,
    #[serde(default, rename = "enemy")]
    pub enemies: Vec<EnemyDef>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlatformDef {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Overrides the theme color.
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub motion: Option<MotionDef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct MotionDef {
    pub speed: f32,
    pub range: f32,
    #[serde(default)]
    pub direction: Facing,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EnemyDef {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub speed: f32,
    #[serde(default)]
    pub direction: Facing,
    pub patrol_start: f32,
    pub patrol_end: f32,
    #[serde(default)]
    pub boss: bool,
}

#[derive(Debug, Deserialize)]
struct PackFile {
    #[serde(default, rename = "level")]
    levels: Vec<LevelTemplate>,
}

// ══════════════════════════════════════════════════════════════
// Validation / instantiation
// ══════════════════════════════════════════════════════════════

fn exit_top(t: &LevelTemplate, p: &PhysicsTuning) -> f32 {
    t.exit_y.unwrap_or(p.playfield_height - DEFAULT_EXIT_ABOVE_FLOOR)
}

/// Reject malformed template data. Nothing is clamped.
pub fn validate(t: &LevelTemplate, p: &PhysicsTuning) -> Result<(), LevelError> {
    let level = || t.name.clone();

    if !(t.width > 0.0 && t.width.is_finite()) {
        return Err(LevelError::NonPositiveWidth { level: level(), width: t.width });
    }
    if !(0.0..=1.0).contains(&t.required_fraction) {
        return Err(LevelError::FractionOutOfRange {
            level: level(),
            fraction: t.required_fraction,
        });
    }

    for (index, pl) in t.platforms.iter().enumerate() {
        if !Rect::new(pl.x, pl.y, pl.w, pl.h).is_well_formed() {
            return Err(LevelError::BadPlatform { level: level(), index });
        }
        if let Some(m) = pl.motion {
            if !(m.speed > 0.0 && m.range > 0.0 && m.speed.is_finite() && m.range.is_finite()) {
                return Err(LevelError::BadMotion { level: level(), index });
            }
        }
    }

    for (index, c) in t.collectibles.iter().enumerate() {
        if !c.is_well_formed() {
            return Err(LevelError::BadCollectible { level: level(), index });
        }
    }

    for (index, e) in t.enemies.iter().enumerate() {
        if !Rect::new(e.x, e.y, e.w, e.h).is_well_formed() || !(e.speed >= 0.0) {
            return Err(LevelError::BadEnemy { level: level(), index });
        }
        if e.patrol_start > e.patrol_end || e.x < e.patrol_start || e.x > e.patrol_end {
            return Err(LevelError::BadPatrol {
                level: level(),
                index,
                start: e.patrol_start,
                end: e.patrol_end,
            });
        }
    }

    let exit_y = exit_top(t, p);
    if !(exit_y >= 0.0 && exit_y + EXIT_SIZE <= p.playfield_height) {
        return Err(LevelError::ExitOutOfBounds { level: level(), exit_y });
    }
    Ok(())
}

/// `ceil(count * fraction)`. The slack is relative to the product and only
/// absorbs f32 noise in the fraction.
pub fn required_count(count: usize, fraction: f32) -> usize {
    let raw = count as f64 * f64::from(fraction);
    let slack = raw * 2.0 * f64::from(f32::EPSILON);
    (raw - slack).ceil().max(0.0) as usize
}

/// Build a fresh live level from its template.
pub fn instantiate_level(
    t: &LevelTemplate,
    index: usize,
    p: &PhysicsTuning,
) -> Result<Level, LevelError> {
    validate(t, p)?;

    let ground_top = p.playfield_height - GROUND_THICKNESS;
    let platforms = t
        .platforms
        .iter()
        .map(|pl| {
            let kind = match pl.motion {
                Some(m) => PlatformKind::Moving(MovingPath {
                    origin: pl.x,
                    speed: m.speed,
                    range: m.range,
                    direction: m.direction,
                    last_dx: 0.0,
                }),
                None => PlatformKind::Static,
            };
            let themed = if pl.y == ground_top { t.theme.ground } else { t.theme.platform };
            Platform {
                rect: Rect::new(pl.x, pl.y, pl.w, pl.h),
                kind,
                color: pl.color.unwrap_or(themed),
            }
        })
        .collect();

    let collectibles: Vec<Collectible> = t.collectibles.iter().copied().map(Collectible::new).collect();

    let enemies = t
        .enemies
        .iter()
        .map(|e| Enemy {
            rect: Rect::new(e.x, e.y, e.w, e.h),
            base_speed: e.speed,
            speed: e.speed,
            direction: e.direction,
            patrol: Patrol { start: e.patrol_start, end: e.patrol_end },
            is_boss: e.boss,
        })
        .collect();

    let objective = if t.boss {
        Objective::DefeatAll
    } else {
        Objective::Collect { required: required_count(collectibles.len(), t.required_fraction) }
    };

    let exit = Exit {
        rect: Rect::new(t.width - EXIT_INSET, exit_top(t, p), EXIT_SIZE, EXIT_SIZE),
        is_open: false,
    };

    Ok(Level {
        index,
        name: t.name.clone(),
        width: t.width,
        theme: t.theme,
        spawn: (SPAWN_X, p.playfield_height - SPAWN_ABOVE_FLOOR),
        platforms,
        collectibles,
        enemies,
        exit,
        objective,
    })
}

// ══════════════════════════════════════════════════════════════
// Packs
// ══════════════════════════════════════════════════════════════

pub fn parse_pack(text: &str, p: &PhysicsTuning) -> Result<Vec<LevelTemplate>, LevelError> {
    let pack: PackFile = toml::from_str(text)?;
    if pack.levels.is_empty() {
        return Err(LevelError::EmptyPack);
    }
    for t in &pack.levels {
        validate(t, p)?;
    }
    Ok(pack.levels)
}

pub fn load_pack(path: &Path, p: &PhysicsTuning) -> Result<Vec<LevelTemplate>, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pack(&text, p)
}

/// The configured pack, or the built-in campaign if there is none or it
/// fails to load.
pub fn load_campaign(cfg: &GameConfig) -> Vec<LevelTemplate> {
    let physics = &cfg.tuning.physics;
    if let Some(path) = &cfg.levels_file {
        match load_pack(path, physics) {
            Ok(levels) => {
                log::info!("loaded {} levels from {}", levels.len(), path.display());
                return levels;
            }
            Err(e) => log::warn!("{e}; falling back to built-in levels"),
        }
    }
    builtin_campaign(cfg.seed, physics)
}

// ══════════════════════════════════════════════════════════════
// Built-in campaign
// ══════════════════════════════════════════════════════════════

const fn hex(rgb: u32) -> Rgb {
    Rgb::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

const fn theme(background: u32, ground: u32, platform: u32) -> Theme {
    Theme { background: hex(background), ground: hex(ground), platform: hex(platform) }
}

fn ground_strip(x: f32, w: f32, floor: f32) -> PlatformDef {
    PlatformDef {
        x,
        y: floor - GROUND_THICKNESS,
        w,
        h: PLATFORM_HEIGHT,
        color: None,
        motion: None,
    }
}

// (x, height above floor, width, motion as (speed, range))
const MEADOW_LEDGES: &[(f32, f32, f32, Option<(f32, f32)>)] = &[
    (150.0, 80.0, 100.0, None),
    (300.0, 140.0, 120.0, None),
    (550.0, 100.0, 150.0, None),
    (700.0, 180.0, 80.0, None),
    (850.0, 120.0, 100.0, None),
    (1000.0, 90.0, 130.0, None),
    (1150.0, 150.0, 100.0, None),
    (1300.0, 200.0, 120.0, None),
    (1500.0, 100.0, 150.0, None),
    (1600.0, 160.0, 70.0, Some((1.0, 50.0))),
    (1750.0, 130.0, 100.0, None),
    (1900.0, 70.0, 90.0, None),
    (2050.0, 140.0, 110.0, None),
    (2200.0, 190.0, 100.0, None),
    (2350.0, 100.0, 150.0, None),
    (2500.0, 150.0, 80.0, None),
    (2650.0, 220.0, 120.0, None),
    (2800.0, 120.0, 100.0, None),
    (2950.0, 170.0, 130.0, Some((1.5, 70.0))),
];

const MEADOW_CARROTS: &[(f32, f32)] = &[
    (180.0, 105.0),
    (350.0, 165.0),
    (1350.0, 225.0),
    (2250.0, 215.0),
    (3000.0, 50.0),
];

/// The hand-authored opening level.
fn meadow(floor: f32) -> LevelTemplate {
    let width = 3200.0;
    let mut platforms: Vec<PlatformDef> = [(0.0, 400.0), (500.0, 600.0), (1200.0, 800.0), (2100.0, 1100.0)]
        .iter()
        .map(|&(x, w)| ground_strip(x, w, floor))
        .collect();
    platforms.extend(MEADOW_LEDGES.iter().map(|&(x, above, w, motion)| PlatformDef {
        x,
        y: floor - above,
        w,
        h: PLATFORM_HEIGHT,
        color: None,
        motion: motion.map(|(speed, range)| MotionDef { speed, range, direction: Facing::Right }),
    }));

    let (cw, ch) = generate::COLLECTIBLE_SIZE;
    let collectibles = MEADOW_CARROTS
        .iter()
        .map(|&(x, above)| Rect::new(x, floor - above, cw, ch))
        .collect();

    let walker = |x: f32, speed: f32, start: f32, end: f32| EnemyDef {
        x,
        y: floor - 50.0,
        w: generate::ENEMY_SIZE.0,
        h: generate::ENEMY_SIZE.1,
        speed,
        direction: Facing::Right,
        patrol_start: start,
        patrol_end: end,
        boss: false,
    };

    LevelTemplate {
        name: "Level 1".into(),
        width,
        theme: theme(0x87ceeb, 0x28a745, 0x6f4e37),
        exit_y: Some(floor - 60.0),
        required_fraction: 0.6,
        boss: false,
        platforms,
        collectibles,
        enemies: vec![walker(400.0, 1.0, 300.0, 500.0), walker(900.0, 1.2, 800.0, 1050.0)],
    }
}

struct Recipe {
    width: f32,
    theme: Theme,
    ground: Vec<(f32, f32)>,
    platforms: PlatformSpread,
    enemies: EnemySpread,
    exit_above_floor: f32,
    required_fraction: f32,
}

fn generated<R: rand::Rng + ?Sized>(rng: &mut R, n: usize, r: Recipe, floor: f32) -> LevelTemplate {
    let mut platforms: Vec<PlatformDef> =
        r.ground.iter().map(|&(x, w)| ground_strip(x, w, floor)).collect();
    platforms.extend(generate::platforms(rng, r.width, &r.platforms, floor));
    let enemies = generate::enemies(rng, r.width, &r.enemies, floor);
    let collectibles = generate::collectibles(rng, &platforms, 0.6, floor);
    LevelTemplate {
        name: format!("Level {n}"),
        width: r.width,
        theme: r.theme,
        exit_y: Some(floor - r.exit_above_floor),
        required_fraction: r.required_fraction,
        boss: false,
        platforms,
        collectibles,
        enemies,
    }
}

fn spread(y_offset: f32, count: usize, w: (f32, f32), gap: (f32, f32), moving: f64) -> PlatformSpread {
    PlatformSpread {
        y_offset,
        count,
        min_width: w.0,
        max_width: w.1,
        min_gap: gap.0,
        max_gap: gap.1,
        moving_chance: moving,
    }
}

fn walkers(count: usize, base_speed: f32, patrol_width: f32) -> EnemySpread {
    EnemySpread { count, base_speed, patrol_width }
}

fn boss_lair(floor: f32) -> LevelTemplate {
    LevelTemplate {
        name: "Level 11".into(),
        width: 1000.0,
        theme: theme(0x200000, 0x100000, 0x301010),
        exit_y: Some(floor - 100.0),
        required_fraction: 0.0,
        boss: true,
        platforms: vec![ground_strip(0.0, 1000.0, floor)],
        collectibles: vec![],
        enemies: vec![EnemyDef {
            x: 450.0,
            y: floor - 100.0,
            w: 100.0,
            h: 80.0,
            speed: 0.0,
            direction: Facing::Right,
            patrol_start: 450.0,
            patrol_end: 450.0,
            boss: true,
        }],
    }
}

/// Eleven levels: one authored, four generated from hand-picked recipes,
/// five that stretch the fifth, and a boss arena. Same seed, same campaign.
pub fn builtin_campaign(seed: u64, p: &PhysicsTuning) -> Vec<LevelTemplate> {
    let floor = p.playfield_height;
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut levels = vec![meadow(floor)];

    let recipes = [
        Recipe {
            width: 3500.0,
            theme: theme(0x34495e, 0x555555, 0x4a4a4a),
            ground: vec![(0.0, 300.0), (400.0, 500.0), (1000.0, 700.0), (1800.0, 1700.0)],
            platforms: spread(70.0, 12, (60.0, 100.0), (80.0, 150.0), 0.3),
            enemies: walkers(4, 1.3, 200.0),
            exit_above_floor: 70.0,
            required_fraction: 0.7,
        },
        Recipe {
            width: 4000.0,
            theme: theme(0xe0f7fa, 0xc0c0c0, 0xadd8e6),
            ground: vec![(0.0, 200.0), (300.0, 400.0), (800.0, 600.0), (1500.0, 2500.0)],
            platforms: spread(60.0, 15, (50.0, 90.0), (100.0, 180.0), 0.4),
            enemies: walkers(5, 1.5, 180.0),
            exit_above_floor: 60.0,
            required_fraction: 0.75,
        },
        Recipe {
            width: 3800.0,
            theme: theme(0x4a4e69, 0x22333b, 0x5e503f),
            ground: vec![(0.0, 350.0), (450.0, 550.0), (1100.0, 750.0), (1950.0, 1850.0)],
            platforms: spread(80.0, 14, (70.0, 110.0), (90.0, 160.0), 0.35),
            enemies: walkers(6, 1.4, 220.0),
            exit_above_floor: 65.0,
            required_fraction: 0.7,
        },
        Recipe {
            width: 4200.0,
            theme: theme(0x9db4c0, 0x778899, 0x5c6b73),
            ground: vec![(0.0, 150.0), (500.0, 200.0), (1200.0, 180.0), (2000.0, 250.0), (3800.0, 400.0)],
            platforms: spread(50.0, 18, (40.0, 80.0), (120.0, 200.0), 0.5),
            enemies: walkers(7, 1.6, 150.0),
            exit_above_floor: 80.0,
            required_fraction: 0.8,
        },
    ];
    for r in recipes {
        let n = levels.len() + 1;
        levels.push(generated(&mut rng, n, r, floor));
    }

    let base_width = levels[levels.len() - 1].width;
    for i in 1..=5u8 {
        let k = f32::from(i);
        let width = base_width + k * 200.0;
        let strip = 100.0 + k * 10.0;
        let r = Recipe {
            width,
            theme: Theme {
                background: Rgb::from_hsl(200.0 + k * 10.0, 50.0, 60.0 - k * 2.0),
                ground: Rgb::from_hsl(120.0 + k * 5.0, 30.0, 40.0 - k * 2.0),
                platform: Rgb::from_hsl(30.0 + k * 5.0, 30.0, 35.0 - k * 2.0),
            },
            ground: vec![(0.0, strip), (width - strip, strip)],
            platforms: spread(
                40.0 + k * 5.0,
                18 + usize::from(i),
                (35.0 - k * 2.0, 75.0 - k * 3.0),
                (130.0 + k * 10.0, 220.0 + k * 10.0),
                0.5 + f64::from(i) * 0.05,
            ),
            enemies: walkers(7 + usize::from(i), 1.6 + k * 0.1, 140.0 - k * 5.0),
            exit_above_floor: 80.0 + k * 5.0,
            required_fraction: (0.8 + k * 0.03).min(0.95),
        };
        let n = levels.len() + 1;
        levels.push(generated(&mut rng, n, r, floor));
    }

    levels.push(boss_lair(floor));
    levels
}
