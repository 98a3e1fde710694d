//! Procedural level content: floating platforms, patrolling enemies and
//! collectibles placed above platforms.
//!
//! Generators produce template data only; the result is validated and
//! instantiated like any authored level. All randomness comes from the
//! caller's RNG, so a seed fixes the whole campaign.

use rand::Rng;

use super::level::{EnemyDef, MotionDef, PlatformDef};
use crate::domain::entity::{Facing, Rgb, GROUND_THICKNESS};
use crate::domain::geometry::Rect;

pub const PLATFORM_HEIGHT: f32 = 20.0;
pub const ENEMY_SIZE: (f32, f32) = (40.0, 30.0);
pub const COLLECTIBLE_SIZE: (f32, f32) = (15.0, 25.0);
/// Generated platforms are always painted this brown.
pub const GENERATED_PLATFORM_COLOR: Rgb = Rgb::new(0x6f, 0x4e, 0x37);

/// Knobs for a run of floating platforms laid out left to right.
#[derive(Clone, Debug)]
pub struct PlatformSpread {
    /// Minimum height above the floor; up to 100px more is added.
    pub y_offset: f32,
    pub count: usize,
    pub min_width: f32,
    pub max_width: f32,
    pub min_gap: f32,
    pub max_gap: f32,
    pub moving_chance: f64,
}

#[derive(Clone, Debug)]
pub struct EnemySpread {
    pub count: usize,
    pub base_speed: f32,
    pub patrol_width: f32,
}

#[inline]
fn between<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + rng.random::<f32>() * (hi - lo)
}

#[inline]
fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.random::<f64>() < p
}

fn coin_facing<R: Rng + ?Sized>(rng: &mut R) -> Facing {
    if chance(rng, 0.5) { Facing::Right } else { Facing::Left }
}

pub fn platforms<R: Rng + ?Sized>(
    rng: &mut R,
    level_width: f32,
    spread: &PlatformSpread,
    floor: f32,
) -> Vec<PlatformDef> {
    let mut out = Vec::with_capacity(spread.count);
    let mut x = 150.0;
    for _ in 0..spread.count {
        if x > level_width - spread.max_width - 50.0 {
            break;
        }
        let w = between(rng, spread.min_width, spread.max_width);
        let y = floor - (rng.random::<f32>() * 100.0 + spread.y_offset);
        let motion = chance(rng, spread.moving_chance).then(|| MotionDef {
            speed: between(rng, 0.5, 1.5),
            range: between(rng, 30.0, 80.0),
            direction: coin_facing(rng),
        });
        out.push(PlatformDef {
            x,
            y,
            w,
            h: PLATFORM_HEIGHT,
            color: Some(GENERATED_PLATFORM_COLOR),
            motion,
        });
        x += w + between(rng, spread.min_gap, spread.max_gap);
    }
    out
}

/// One collectible centered above some of the floating platforms.
/// Ground strips and narrow ledges get none.
pub fn collectibles<R: Rng + ?Sized>(
    rng: &mut R,
    platforms: &[PlatformDef],
    p: f64,
    floor: f32,
) -> Vec<Rect> {
    let (w, h) = COLLECTIBLE_SIZE;
    platforms
        .iter()
        .filter(|pl| pl.y < floor - GROUND_THICKNESS)
        .filter(|pl| chance(rng, p) && pl.w > 30.0)
        .map(|pl| Rect::new(pl.x + pl.w / 2.0 - w / 2.0, pl.y - 28.0, w, h))
        .collect()
}

/// Ground-level walkers, each centered in its own patrol interval.
pub fn enemies<R: Rng + ?Sized>(
    rng: &mut R,
    level_width: f32,
    spread: &EnemySpread,
    floor: f32,
) -> Vec<EnemyDef> {
    let (w, h) = ENEMY_SIZE;
    let half = spread.patrol_width / 2.0;
    let span = (level_width - spread.patrol_width - 300.0).max(0.0);
    (0..spread.count)
        .map(|_| {
            let x = 200.0 + rng.random::<f32>() * span;
            EnemyDef {
                x,
                y: floor - 50.0,
                w,
                h,
                speed: spread.base_speed + rng.random::<f32>() * 0.5,
                direction: coin_facing(rng),
                patrol_start: (x - half).max(0.0),
                patrol_end: (x + half).min(level_width),
                boss: false,
            }
        })
        .collect()
}
