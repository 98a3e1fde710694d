//! Collision resolution for one tick, run after motion.
//!
//! Order: platforms → collectibles → enemies → exit. Platform contacts are
//! classified from the player's previous-frame edges (see `geometry`).
//! Results come back as `Hit`s; lives and phases are not touched here.

use super::entity::{Level, Player};
use super::geometry::{classify, overlaps, side_push, swept_landing, Contact};
use crate::config::PhysicsTuning;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hit {
    Collected { index: usize },
    ExitOpened,
    /// A non-boss enemy was removed; position is where it stood.
    Stomped { x: f32, y: f32 },
    /// Touched an enemy badly. Resolution stops at the first one.
    Damaged,
    ExitReached,
}

/// Resolve every interaction for this tick.
/// `collected` is the session counter and is bumped on each pickup.
pub fn resolve(
    player: &mut Player,
    level: &mut Level,
    collected: &mut usize,
    invincible: bool,
    t: &PhysicsTuning,
) -> Vec<Hit> {
    let mut hits = Vec::new();

    resolve_platforms(player, level);
    resolve_collectibles(player, level, collected, &mut hits);

    let damaged = if invincible {
        false
    } else {
        resolve_enemies(player, level, *collected, t, &mut hits)
    };

    if !damaged && level.exit.is_open && overlaps(&player.hitbox(), &level.exit.rect) {
        hits.push(Hit::ExitReached);
    }
    hits
}

// ── Platforms ──

fn resolve_platforms(player: &mut Player, level: &Level) {
    for plat in &level.platforms {
        let hb = player.hitbox();
        let contact = if overlaps(&hb, &plat.rect) {
            classify(&hb, player.vy, &plat.rect)
        } else if swept_landing(&hb, player.vy, &plat.rect) {
            Contact::Landing
        } else {
            continue;
        };

        match contact {
            Contact::Landing => {
                player.stand_on(plat.rect.y);
                // Ride along with a moving platform.
                player.x += plat.carry_dx();
            }
            Contact::HeadBump => {
                player.y = plat.rect.bottom() - (player.height - player.draw_height);
                player.vy = 0.0;
            }
            Contact::Side => {
                let inset = (player.width - player.draw_width) / 2.0;
                player.x = side_push(&hb, player.vx, &plat.rect) - inset;
                player.vx = 0.0;
            }
        }
    }

    let max_x = (level.width - player.width).max(0.0);
    player.x = player.x.clamp(0.0, max_x);
}

// ── Collectibles ──

fn resolve_collectibles(
    player: &Player,
    level: &mut Level,
    collected: &mut usize,
    hits: &mut Vec<Hit>,
) {
    let hb = player.hitbox();
    for index in 0..level.collectibles.len() {
        let item = &mut level.collectibles[index];
        if item.collected || !overlaps(&hb, &item.rect) {
            continue;
        }
        if item.collect() {
            *collected += 1;
            hits.push(Hit::Collected { index });
            if level.refresh_exit(*collected) {
                hits.push(Hit::ExitOpened);
            }
        }
    }
}

// ── Enemies ──

/// Returns true if the player took a hit.
fn resolve_enemies(
    player: &mut Player,
    level: &mut Level,
    collected: usize,
    t: &PhysicsTuning,
    hits: &mut Vec<Hit>,
) -> bool {
    let mut i = 0;
    while i < level.enemies.len() {
        let hb = player.hitbox();
        let enemy = &level.enemies[i];
        if !overlaps(&hb, &enemy.rect) {
            i += 1;
            continue;
        }
        if enemy.is_boss {
            hits.push(Hit::Damaged);
            return true;
        }

        let prev_bottom = hb.bottom() - player.vy;
        let from_above = player.vy > 0.0 && prev_bottom < enemy.rect.y + t.stomp_tolerance;
        if from_above && !player.crouching {
            let gone = level.enemies.remove(i);
            player.vy = -t.jump_force / t.stomp_bounce_divisor;
            player.is_jumping = false;
            player.on_ground = false;
            player.bounce_jump = true;
            hits.push(Hit::Stomped { x: gone.rect.x, y: gone.rect.y });
            if level.refresh_exit(collected) {
                hits.push(Hit::ExitOpened);
            }
            // `i` now points at the next enemy.
        } else {
            hits.push(Hit::Damaged);
            return true;
        }
    }
    false
}
