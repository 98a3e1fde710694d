//! The step function and the state-machine transitions around it.
//!
//! Processing order per tick:
//!   1. Intents (move / jump / crouch edges)
//!   2. Player motion + invincibility countdown
//!   3. Camera follow
//!   4. Enemy AI
//!   5. Moving platforms
//!   6. Fall check
//!   7. Collisions → pickups, stomps, damage, exit
//!   8. Crouch settle (held key applied once grounded)
//!
//! Transitions outside the tick: `fresh_start` (any phase) and `advance`
//! (LevelComplete only). Calls in the wrong phase are errors, not no-ops.

use crate::domain::ai;
use crate::domain::collision::{self, Hit};
use crate::domain::control::{Intent, IntentKind};
use crate::domain::entity::{Facing, Player};
use crate::domain::physics;
use crate::sim::error::SimError;
use crate::sim::event::{DamageCause, GameEvent};
use crate::sim::level::instantiate_level;
use crate::sim::world::{Camera, Phase, World};

/// Fall respawn: this far right of the camera's left edge, and this high
/// above the floor.
const FALL_RESPAWN_CAMERA_OFFSET: f32 = 100.0;
const FALL_RESPAWN_ABOVE_FLOOR: f32 = 200.0;
/// Contact respawn: this far back from where the hit happened.
const CONTACT_RESPAWN_SETBACK: f32 = 50.0;
const CONTACT_RESPAWN_ABOVE_FLOOR: f32 = 100.0;
/// Respawns never go further left than this.
const RESPAWN_MIN_X: f32 = 50.0;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Advance one tick. `dt_ms` is the measured length of the tick and only
/// drives the invincibility countdown.
pub fn step(world: &mut World, intents: &[Intent], dt_ms: f32) -> Result<Vec<GameEvent>, SimError> {
    if !(dt_ms >= 0.0 && dt_ms.is_finite()) {
        return Err(SimError::InvalidElapsed(dt_ms));
    }
    if world.level.is_none() {
        return Err(SimError::NoLevelLoaded);
    }
    if world.phase != Phase::Playing {
        return Err(SimError::WrongPhase { op: "step", phase: world.phase });
    }

    let mut events = Vec::new();
    world.tick += 1;

    resolve_intents(world, intents, &mut events);
    let fell = resolve_motion(world, dt_ms);
    resolve_camera(world);
    resolve_enemies(world);
    resolve_platforms(world);

    if fell {
        if world.is_invincible() {
            // Already hurt: put the player back without charging a life.
            respawn(world, DamageCause::Fall);
        } else {
            events.extend(lose_life(world, DamageCause::Fall));
        }
        if world.phase != Phase::Playing {
            return Ok(events);
        }
    }

    resolve_collisions(world, &mut events);
    settle_crouch(world);
    Ok(events)
}

// ══════════════════════════════════════════════════════════════
// Transitions
// ══════════════════════════════════════════════════════════════

/// Start over from the first level with full starting lives. Allowed from
/// any phase.
pub fn fresh_start(world: &mut World) -> Result<Vec<GameEvent>, SimError> {
    world.session.lives = world.tuning.session.starting_lives;
    let events = load_level(world, 0)?;
    world.phase = Phase::Playing;
    log::info!("new game: {} levels, {} lives", world.campaign.len(), world.session.lives);
    Ok(events)
}

/// Load the level after the one just completed. Lives carry over.
pub fn advance(world: &mut World) -> Result<Vec<GameEvent>, SimError> {
    if world.phase != Phase::LevelComplete {
        return Err(SimError::WrongPhase { op: "advance", phase: world.phase });
    }
    let next = world.session.level_index + 1;
    if next >= world.campaign.len() {
        world.phase = Phase::Won;
        return Ok(vec![GameEvent::Won]);
    }
    let events = load_level(world, next)?;
    world.phase = Phase::Playing;
    Ok(events)
}

/// Charge one life for `cause`. Ignored while invincible or outside play.
pub fn lose_life(world: &mut World, cause: DamageCause) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.is_invincible() {
        return vec![];
    }
    world.session.lives = world.session.lives.saturating_sub(1);
    world.session.invincible_ms = world.tuning.session.invincibility_ms;
    let lives_left = world.session.lives;
    log::debug!("damage ({cause:?}), {lives_left} lives left");

    let mut events = vec![GameEvent::Damaged { cause, lives_left }];
    if lives_left == 0 {
        world.phase = Phase::GameOver;
        log::info!("game over on level {}", world.session.level_index + 1);
        events.push(GameEvent::GameOver);
    } else {
        respawn(world, cause);
    }
    events
}

fn respawn(world: &mut World, cause: DamageCause) {
    let floor = world.tuning.physics.playfield_height;
    let p = &mut world.player;
    match cause {
        DamageCause::Fall => {
            p.x = (world.camera.x + FALL_RESPAWN_CAMERA_OFFSET).max(RESPAWN_MIN_X);
            p.y = floor - FALL_RESPAWN_ABOVE_FLOOR;
        }
        DamageCause::Contact => {
            p.x = (p.x - CONTACT_RESPAWN_SETBACK).max(RESPAWN_MIN_X);
            p.y = floor - CONTACT_RESPAWN_ABOVE_FLOOR;
        }
    }
    p.reset_motion();
}

fn complete_level(world: &mut World) -> Vec<GameEvent> {
    let index = world.session.level_index;
    world.phase = Phase::LevelComplete;
    log::info!("level {} complete", index + 1);

    let mut events = vec![GameEvent::LevelCompleted { level: index }];
    if index + 1 >= world.campaign.len() {
        world.phase = Phase::Won;
        log::info!("campaign won with {} lives left", world.session.lives);
        events.push(GameEvent::Won);
    } else {
        events.push(GameEvent::NextLevelReady { level: index + 1 });
    }
    events
}

/// Build level `index` fresh from its template and reset per-level state.
fn load_level(world: &mut World, index: usize) -> Result<Vec<GameEvent>, SimError> {
    let template = world.campaign.get(index).ok_or(SimError::NoLevelLoaded)?;
    let mut level = instantiate_level(template, index, &world.tuning.physics)?;

    let (sx, sy) = level.spawn;
    world.player = Player::new(sx, sy);
    world.control.reset();
    world.camera = Camera::new(world.tuning.physics.view_width);
    world.session.level_index = index;
    world.session.collected = 0;
    world.session.invincible_ms = 0.0;

    let mut events = vec![GameEvent::LevelStarted { level: index }];
    // A level that asks for nothing starts with its exit open.
    if level.refresh_exit(0) {
        events.push(GameEvent::ExitOpened);
    }
    log::info!(
        "loaded level {} ({:?}): width {}, {} collectibles ({} required), {} enemies",
        index + 1,
        level.name,
        level.width,
        level.collectibles.len(),
        level.required(),
        level.enemies.len()
    );
    world.level = Some(level);
    Ok(events)
}

// ══════════════════════════════════════════════════════════════
// Tick phases
// ══════════════════════════════════════════════════════════════

fn resolve_intents(world: &mut World, intents: &[Intent], events: &mut Vec<GameEvent>) {
    let t = &world.tuning.physics;
    for intent in intents {
        match intent.kind {
            IntentKind::MoveLeft(active) => {
                world.control.set_move(Facing::Left, active, intent.at_ms, t.double_tap_ms)
            }
            IntentKind::MoveRight(active) => {
                world.control.set_move(Facing::Right, active, intent.at_ms, t.double_tap_ms)
            }
            IntentKind::JumpPressed => {
                if physics::try_jump(&mut world.player, t, intent.at_ms) {
                    events.push(GameEvent::Jumped);
                }
            }
            IntentKind::JumpReleased => {
                physics::release_jump(&mut world.player, t, intent.at_ms);
            }
            IntentKind::CrouchPressed => {
                world.control.set_crouch(true);
                physics::start_crouch(&mut world.player, t);
            }
            IntentKind::CrouchReleased => {
                world.control.set_crouch(false);
                physics::stop_crouch(&mut world.player);
            }
        }
    }
}

fn resolve_motion(world: &mut World, dt_ms: f32) -> bool {
    let width = world.level.as_ref().map_or(0.0, |l| l.width);
    let fell = physics::step_player(&mut world.player, &world.control, &world.tuning.physics, width);
    if physics::tick_invincibility(&mut world.session.invincible_ms, dt_ms) {
        log::debug!("invincibility ended");
    }
    fell
}

fn resolve_camera(world: &mut World) {
    if let Some(level) = &world.level {
        world.camera.follow(&world.player, level.width, world.tuning.physics.camera_lerp);
    }
}

fn resolve_enemies(world: &mut World) {
    if let Some(level) = world.level.as_mut() {
        ai::step_enemies(
            &mut level.enemies,
            world.camera.x,
            level.width,
            level.index,
            &world.tuning.difficulty,
        );
    }
}

fn resolve_platforms(world: &mut World) {
    if let Some(level) = world.level.as_mut() {
        physics::advance_platforms(&mut level.platforms);
    }
}

fn resolve_collisions(world: &mut World, events: &mut Vec<GameEvent>) {
    let Some(level) = world.level.as_mut() else { return };
    let invincible = world.session.invincible_ms > 0.0;
    let before = world.session.collected;
    let hits = collision::resolve(
        &mut world.player,
        level,
        &mut world.session.collected,
        invincible,
        &world.tuning.physics,
    );
    let required = level.required();

    let mut running = before;
    for hit in hits {
        match hit {
            Hit::Collected { .. } => {
                running += 1;
                log::debug!("collected {running}/{required}");
                events.push(GameEvent::Collected { collected: running, required });
            }
            Hit::ExitOpened => {
                log::debug!("exit open");
                events.push(GameEvent::ExitOpened);
            }
            Hit::Stomped { x, y } => {
                log::debug!("stomped enemy at ({x:.0}, {y:.0})");
                events.push(GameEvent::Stomped { x, y });
            }
            Hit::Damaged => events.extend(lose_life(world, DamageCause::Contact)),
            Hit::ExitReached => events.extend(complete_level(world)),
        }
    }
}

/// Apply the held crouch key once the player is on the ground.
fn settle_crouch(world: &mut World) {
    let held = world.control.crouch_held();
    let p = &mut world.player;
    if held && !p.crouching {
        physics::start_crouch(p, &world.tuning.physics);
    } else if !held && p.crouching {
        physics::stop_crouch(p);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tuning;
    use crate::domain::geometry::Rect;
    use crate::sim::level::{EnemyDef, LevelTemplate, PlatformDef};
    use crate::domain::entity::Theme;

    const DT: f32 = 16.0;
    const GROUND_Y: f32 = 380.0;

    fn floor_strip(x: f32, w: f32) -> PlatformDef {
        PlatformDef { x, y: GROUND_Y, w, h: 20.0, color: None, motion: None }
    }

    fn flat(name: &str, collectibles: Vec<Rect>, fraction: f32) -> LevelTemplate {
        LevelTemplate {
            name: name.into(),
            width: 2000.0,
            theme: Theme::default(),
            exit_y: None,
            required_fraction: fraction,
            boss: false,
            platforms: vec![floor_strip(0.0, 2000.0)],
            collectibles,
            enemies: vec![],
        }
    }

    fn walker(x: f32) -> EnemyDef {
        EnemyDef {
            x,
            y: GROUND_Y - 30.0,
            w: 40.0,
            h: 30.0,
            speed: 0.0,
            direction: Facing::Right,
            patrol_start: x,
            patrol_end: x + 40.0,
            boss: false,
        }
    }

    fn world_with(levels: Vec<LevelTemplate>) -> World {
        let mut w = World::new(Tuning::default(), levels).unwrap();
        fresh_start(&mut w).unwrap();
        w
    }

    fn run(world: &mut World, ticks: usize) -> Vec<GameEvent> {
        let mut all = Vec::new();
        for _ in 0..ticks {
            all.extend(step(world, &[], DT).unwrap());
        }
        all
    }

    /// Drop the player from spawn until it stands on the floor.
    fn settle(world: &mut World) {
        run(world, 60);
        assert!(world.player.on_ground);
    }

    fn place(world: &mut World, x: f32) {
        world.player.x = x;
        world.player.y = GROUND_Y - world.player.height;
        world.player.vy = 0.0;
        world.player.on_ground = true;
    }

    fn five_items() -> Vec<Rect> {
        (0..5).map(|i| Rect::new(300.0 + 200.0 * i as f32, GROUND_Y - 30.0, 15.0, 25.0)).collect()
    }

    // ── preconditions ──

    #[test]
    fn tick_without_level_fails() {
        let mut w = World::new(Tuning::default(), vec![flat("a", vec![], 0.0)]).unwrap();
        assert!(matches!(step(&mut w, &[], DT), Err(SimError::NoLevelLoaded)));
    }

    #[test]
    fn tick_outside_playing_fails() {
        let mut w = world_with(vec![flat("a", vec![], 0.0)]);
        w.phase = Phase::GameOver;
        assert!(matches!(
            step(&mut w, &[], DT),
            Err(SimError::WrongPhase { op: "step", phase: Phase::GameOver })
        ));
    }

    #[test]
    fn negative_elapsed_rejected() {
        let mut w = world_with(vec![flat("a", vec![], 0.0)]);
        assert!(matches!(step(&mut w, &[], -1.0), Err(SimError::InvalidElapsed(_))));
        assert!(matches!(step(&mut w, &[], f32::NAN), Err(SimError::InvalidElapsed(_))));
    }

    #[test]
    fn advance_only_from_level_complete() {
        let mut w = world_with(vec![flat("a", vec![], 0.0)]);
        assert!(matches!(advance(&mut w), Err(SimError::WrongPhase { op: "advance", .. })));
    }

    // ── scenario A: objective, exit, completion ──

    #[test]
    fn collecting_required_items_opens_exit_then_completes_once() {
        let mut w = world_with(vec![flat("a", five_items(), 0.6), flat("b", vec![], 0.0)]);
        assert_eq!(w.hud().required, 3);
        settle(&mut w);

        for x in [300.0, 500.0] {
            place(&mut w, x);
            let ev = run(&mut w, 1);
            assert!(matches!(ev.as_slice(), [GameEvent::Collected { .. }]));
            assert!(!w.hud().exit_open);
        }
        place(&mut w, 700.0);
        let ev = run(&mut w, 1);
        assert_eq!(
            ev,
            vec![GameEvent::Collected { collected: 3, required: 3 }, GameEvent::ExitOpened]
        );
        assert!(w.hud().exit_open);

        place(&mut w, 1910.0);
        let ev = run(&mut w, 1);
        assert_eq!(
            ev,
            vec![GameEvent::LevelCompleted { level: 0 }, GameEvent::NextLevelReady { level: 1 }]
        );
        assert_eq!(w.phase(), Phase::LevelComplete);
        // Loop is paused; completion cannot fire again.
        assert!(step(&mut w, &[], DT).is_err());

        let ev = advance(&mut w).unwrap();
        assert_eq!(ev[0], GameEvent::LevelStarted { level: 1 });
        assert_eq!(w.phase(), Phase::Playing);
        assert_eq!(w.hud().collected, 0);
        assert_eq!(w.lives(), 3);
    }

    #[test]
    fn exit_stays_shut_below_threshold() {
        let mut w = world_with(vec![flat("a", five_items(), 0.6)]);
        settle(&mut w);
        place(&mut w, 300.0);
        run(&mut w, 1);
        place(&mut w, 1910.0);
        let ev = run(&mut w, 5);
        assert!(ev.is_empty());
        assert_eq!(w.phase(), Phase::Playing);
    }

    #[test]
    fn zero_requirement_opens_exit_on_load() {
        let mut w = World::new(Tuning::default(), vec![flat("a", vec![], 0.0)]).unwrap();
        let ev = fresh_start(&mut w).unwrap();
        assert_eq!(ev, vec![GameEvent::LevelStarted { level: 0 }, GameEvent::ExitOpened]);
    }

    #[test]
    fn last_level_exit_wins() {
        let mut w = world_with(vec![flat("only", vec![], 0.0)]);
        settle(&mut w);
        place(&mut w, 1910.0);
        let ev = run(&mut w, 1);
        assert_eq!(ev, vec![GameEvent::LevelCompleted { level: 0 }, GameEvent::Won]);
        assert_eq!(w.phase(), Phase::Won);
        assert!(advance(&mut w).is_err());
    }

    // ── scenario B: last life ──

    #[test]
    fn last_life_contact_is_game_over_and_further_damage_ignored() {
        let mut t = flat("a", vec![], 0.0);
        t.enemies.push(walker(600.0));
        let mut w = world_with(vec![t]);
        settle(&mut w);
        w.session.lives = 1;
        place(&mut w, 580.0);
        let ev = run(&mut w, 1);
        assert_eq!(
            ev,
            vec![
                GameEvent::Damaged { cause: DamageCause::Contact, lives_left: 0 },
                GameEvent::GameOver
            ]
        );
        assert_eq!(w.phase(), Phase::GameOver);
        assert!(lose_life(&mut w, DamageCause::Contact).is_empty());
        assert_eq!(w.lives(), 0);
    }

    #[test]
    fn invincibility_blocks_repeat_damage_until_it_expires() {
        let mut t = flat("a", vec![], 0.0);
        t.enemies.push(walker(600.0));
        let mut w = world_with(vec![t]);
        settle(&mut w);
        place(&mut w, 580.0);
        run(&mut w, 1);
        assert_eq!(w.lives(), 2);
        assert!(w.is_respawning());
        // contact respawn: 50px back, 100px above the floor
        assert_eq!(w.player.x, 530.0);

        assert!(lose_life(&mut w, DamageCause::Contact).is_empty());
        // Walk back into the enemy for most of the window.
        for _ in 0..100 {
            place(&mut w, 580.0);
            step(&mut w, &[], DT).unwrap();
        }
        assert_eq!(w.lives(), 2);

        // 2000ms window at 16ms ticks: 125 ticks in total.
        place(&mut w, 200.0);
        run(&mut w, 30);
        assert!(!w.is_invincible());
        assert_eq!(w.lives(), 2);
        place(&mut w, 580.0);
        run(&mut w, 1);
        assert_eq!(w.lives(), 1);
    }

    #[test]
    fn invincibility_follows_measured_time() {
        let mut t = flat("a", vec![], 0.0);
        t.enemies.push(walker(600.0));
        let mut w = world_with(vec![t]);
        settle(&mut w);
        place(&mut w, 580.0);
        run(&mut w, 1);
        assert!(w.is_invincible());
        // Two long frames cover the whole window.
        step(&mut w, &[], 1000.0).unwrap();
        assert!(w.is_invincible());
        step(&mut w, &[], 1000.0).unwrap();
        assert!(!w.is_invincible());
    }

    // ── scenario C: variable jump ──

    #[test]
    fn quick_release_gives_short_hop() {
        let mut w = world_with(vec![flat("a", vec![], 0.0)]);
        settle(&mut w);
        let ev = step(&mut w, &[Intent::new(IntentKind::JumpPressed, 5000)], DT).unwrap();
        assert_eq!(ev, vec![GameEvent::Jumped]);
        assert!((w.player.vy + 12.4).abs() < 1e-4);
        step(&mut w, &[Intent::new(IntentKind::JumpReleased, 5050)], DT).unwrap();
        // -7.5 short hop, then one tick of gravity
        assert!((w.player.vy + 6.9).abs() < 1e-4);
    }

    #[test]
    fn held_jump_keeps_full_velocity() {
        let mut w = world_with(vec![flat("a", vec![], 0.0)]);
        settle(&mut w);
        step(&mut w, &[Intent::new(IntentKind::JumpPressed, 5000)], DT).unwrap();
        step(&mut w, &[Intent::new(IntentKind::JumpReleased, 5300)], DT).unwrap();
        assert!((w.player.vy + 11.8).abs() < 1e-4);
    }

    #[test]
    fn no_jump_in_midair() {
        let mut w = world_with(vec![flat("a", vec![], 0.0)]);
        let ev = step(&mut w, &[Intent::new(IntentKind::JumpPressed, 0)], DT).unwrap();
        assert!(ev.is_empty());
    }

    // ── scenario D: stomp ──

    #[test]
    fn stomp_removes_enemy_and_allows_jump() {
        let mut t = flat("a", vec![], 0.0);
        t.enemies.push(walker(600.0));
        let mut w = world_with(vec![t]);
        settle(&mut w);
        // Just above the enemy, falling.
        w.player.x = 605.0;
        w.player.y = GROUND_Y - 30.0 - 40.0 - 2.0;
        w.player.vy = 3.0;
        w.player.on_ground = false;
        let ev = run(&mut w, 1);
        assert!(matches!(ev.as_slice(), [GameEvent::Stomped { .. }]));
        assert!(w.level().unwrap().enemies.is_empty());
        assert!(w.player.vy < 0.0);
        assert_eq!(w.lives(), 3);

        let ev = step(&mut w, &[Intent::new(IntentKind::JumpPressed, 9000)], DT).unwrap();
        assert_eq!(ev, vec![GameEvent::Jumped]);
    }

    #[test]
    fn boss_level_exit_waits_for_empty_arena() {
        let mut t = flat("boss", vec![Rect::new(300.0, 300.0, 15.0, 25.0)], 1.0);
        t.boss = true;
        t.enemies.push(walker(800.0));
        let mut w = World::new(Tuning::default(), vec![t]).unwrap();
        let ev = fresh_start(&mut w).unwrap();
        assert_eq!(ev, vec![GameEvent::LevelStarted { level: 0 }]);
        assert_eq!(w.hud().required, 0);
        assert!(w.hud().boss);
        settle(&mut w);
        w.player.x = 805.0;
        w.player.y = GROUND_Y - 30.0 - 40.0 - 2.0;
        w.player.vy = 3.0;
        let ev = run(&mut w, 1);
        assert!(ev.contains(&GameEvent::ExitOpened));
    }

    // ── scenario E: falling ──

    #[test]
    fn fall_respawns_high_and_near_camera() {
        let mut t = flat("pit", vec![], 0.0);
        t.platforms = vec![floor_strip(0.0, 800.0), floor_strip(1000.0, 1000.0)];
        let mut w = world_with(vec![t]);
        settle(&mut w);
        w.camera.x = 600.0;
        w.player.x = 900.0;
        w.player.on_ground = false;
        let mut ev = Vec::new();
        for _ in 0..60 {
            ev.extend(step(&mut w, &[], DT).unwrap());
            if !ev.is_empty() {
                break;
            }
        }
        assert_eq!(ev, vec![GameEvent::Damaged { cause: DamageCause::Fall, lives_left: 2 }]);
        // camera.x + 100, 200 above the floor
        assert_eq!(w.player.x, w.camera_x() + 100.0);
        assert!(w.player.x > 600.0);
        assert_eq!(w.player.y, 200.0);
        assert!(w.is_respawning());
    }

    #[test]
    fn fall_and_contact_respawns_differ() {
        let mut t = flat("a", vec![], 0.0);
        t.enemies.push(walker(600.0));
        let mut a = world_with(vec![t.clone()]);
        let mut b = world_with(vec![t]);
        settle(&mut a);
        settle(&mut b);
        place(&mut a, 580.0);
        place(&mut b, 580.0);
        lose_life(&mut a, DamageCause::Contact);
        lose_life(&mut b, DamageCause::Fall);
        assert!(b.player.y < a.player.y);
        assert_ne!(a.player.x, b.player.x);
    }

    // ── crouch / movement ──

    #[test]
    fn crouch_held_in_air_applies_on_landing() {
        let mut w = world_with(vec![flat("a", vec![], 0.0)]);
        step(&mut w, &[Intent::new(IntentKind::CrouchPressed, 0)], DT).unwrap();
        assert!(!w.player.crouching);
        settle(&mut w);
        assert!(w.player.crouching);
        step(&mut w, &[Intent::new(IntentKind::CrouchReleased, 2000)], DT).unwrap();
        assert!(!w.player.crouching);
    }

    #[test]
    fn double_tap_runs() {
        let mut w = world_with(vec![flat("a", vec![], 0.0)]);
        settle(&mut w);
        let x0 = w.player.x;
        step(&mut w, &[Intent::new(IntentKind::MoveRight(true), 100)], DT).unwrap();
        assert!((w.player.x - x0 - 3.5).abs() < 1e-4);
        step(
            &mut w,
            &[
                Intent::new(IntentKind::MoveRight(false), 150),
                Intent::new(IntentKind::MoveRight(true), 200),
            ],
            DT,
        )
        .unwrap();
        assert!((w.player.x - x0 - 9.5).abs() < 1e-4);
    }

    #[test]
    fn fresh_start_resets_from_game_over() {
        let mut w = world_with(vec![flat("a", vec![], 0.0), flat("b", vec![], 0.0)]);
        w.session.lives = 1;
        w.session.level_index = 1;
        w.phase = Phase::GameOver;
        fresh_start(&mut w).unwrap();
        assert_eq!(w.phase(), Phase::Playing);
        assert_eq!(w.lives(), 3);
        assert_eq!(w.level_index(), 0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn lives_never_increase_during_play(
                moves in proptest::collection::vec(0u8..6, 1..200),
            ) {
                let mut t = flat("a", vec![], 0.0);
                t.enemies.push(EnemyDef { speed: 2.0, patrol_start: 200.0, patrol_end: 900.0, ..walker(400.0) });
                t.platforms = vec![floor_strip(0.0, 700.0), floor_strip(800.0, 1200.0)];
                let mut w = world_with(vec![t]);
                let mut lives = w.lives();
                for (i, m) in moves.iter().enumerate() {
                    let at = i as u64 * 16;
                    let kind = match m {
                        0 => IntentKind::MoveLeft(true),
                        1 => IntentKind::MoveLeft(false),
                        2 => IntentKind::MoveRight(true),
                        3 => IntentKind::MoveRight(false),
                        4 => IntentKind::JumpPressed,
                        _ => IntentKind::JumpReleased,
                    };
                    if w.phase() != Phase::Playing {
                        break;
                    }
                    let was_invincible = w.is_invincible();
                    step(&mut w, &[Intent::new(kind, at)], DT).unwrap();
                    prop_assert!(w.lives() <= lives);
                    if was_invincible && w.is_invincible() {
                        prop_assert_eq!(w.lives(), lives);
                    }
                    lives = w.lives();
                }
            }

            #[test]
            fn grounded_player_never_sinks_into_floor(
                moves in proptest::collection::vec(0u8..4, 1..150),
            ) {
                let mut w = world_with(vec![flat("a", vec![], 0.0)]);
                for (i, m) in moves.iter().enumerate() {
                    let kind = match m {
                        0 => IntentKind::MoveLeft(true),
                        1 => IntentKind::MoveRight(true),
                        2 => IntentKind::JumpPressed,
                        _ => IntentKind::JumpReleased,
                    };
                    step(&mut w, &[Intent::new(kind, i as u64 * 16)], DT).unwrap();
                    let hb = w.player.hitbox();
                    prop_assert!(hb.bottom() <= GROUND_Y + 1e-3);
                }
            }
        }
    }
}
