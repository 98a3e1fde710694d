//! Per-tick kinematics for the player and moving platforms, plus the
//! intent-driven actions (jump, variable-jump release, crouch).
//!
//! Velocities are pixels per tick. The only wall-clock quantity is the
//! invincibility countdown, which is driven by the measured tick length.
//!
//! Nothing here decides about lives: a fall past the playfield is reported
//! back to the caller and the state machine handles it.

use super::control::Control;
use super::entity::{Facing, Platform, PlatformKind, Player};
use crate::config::PhysicsTuning;

// ══════════════════════════════════════════════════════════════
// Player motion
// ══════════════════════════════════════════════════════════════

/// Advance the player one tick. Returns true when the player has fallen
/// out of the playfield.
pub fn step_player(
    player: &mut Player,
    control: &Control,
    t: &PhysicsTuning,
    level_width: f32,
) -> bool {
    let axis = control.axis();
    player.vx = if player.crouching { 0.0 } else { axis * control.speed(t) };
    if axis > 0.0 {
        player.facing = Facing::Right;
    } else if axis < 0.0 {
        player.facing = Facing::Left;
    }

    player.x += player.vx;
    player.vy += t.gravity;
    player.y += player.vy;
    player.on_ground = false;

    let max_x = (level_width - player.width).max(0.0);
    player.x = player.x.clamp(0.0, max_x);

    player.bottom() > t.playfield_height + t.fall_margin
}

/// Count the invincibility window down by the measured tick length.
/// Returns true on the tick the window closes.
pub fn tick_invincibility(remaining_ms: &mut f32, dt_ms: f32) -> bool {
    if *remaining_ms <= 0.0 {
        return false;
    }
    *remaining_ms -= dt_ms;
    if *remaining_ms <= 0.0 {
        *remaining_ms = 0.0;
        true
    } else {
        false
    }
}

// ── Intents ──

/// Start a jump if grounded (or holding a stomp bounce credit).
pub fn try_jump(player: &mut Player, t: &PhysicsTuning, at_ms: u64) -> bool {
    let grounded = player.on_ground || player.bounce_jump;
    if !grounded || player.is_jumping {
        return false;
    }
    player.vy = -t.jump_force;
    player.is_jumping = true;
    player.on_ground = false;
    player.bounce_jump = false;
    player.can_variable_jump = true;
    player.jump_pressed_at = at_ms;
    true
}

/// Early release shortens the jump. Returns true if the velocity was cut.
pub fn release_jump(player: &mut Player, t: &PhysicsTuning, at_ms: u64) -> bool {
    if !player.can_variable_jump {
        return false;
    }
    player.can_variable_jump = false;

    let held = at_ms.saturating_sub(player.jump_pressed_at);
    if held >= t.variable_jump_window_ms || player.vy >= -t.min_jump_velocity {
        return false;
    }
    let short_hop = -t.min_jump_velocity * t.short_hop_factor;
    if player.vy < short_hop {
        player.vy = short_hop;
        true
    } else {
        false
    }
}

pub fn start_crouch(player: &mut Player, t: &PhysicsTuning) -> bool {
    if !player.on_ground || player.crouching {
        return false;
    }
    player.crouch(t.crouch_width, t.crouch_height);
    true
}

pub fn stop_crouch(player: &mut Player) -> bool {
    if !player.on_ground || !player.crouching {
        return false;
    }
    player.stand_up();
    true
}

// ══════════════════════════════════════════════════════════════
// Moving platforms
// ══════════════════════════════════════════════════════════════

/// Advance one platform. Travel is `[origin, origin + range]`; hitting
/// either end clamps exactly onto it and flips direction.
pub fn advance_platform(platform: &mut Platform) {
    let PlatformKind::Moving(path) = &mut platform.kind else {
        return;
    };
    let before = platform.rect.x;
    let far = path.origin + path.range;
    let mut x = before + path.speed * path.direction.sign();
    if x >= far {
        x = far;
        path.direction = Facing::Left;
    } else if x <= path.origin {
        x = path.origin;
        path.direction = Facing::Right;
    }
    platform.rect.x = x;
    path.last_dx = x - before;
}

pub fn advance_platforms(platforms: &mut [Platform]) {
    for p in platforms.iter_mut() {
        advance_platform(p);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{MovingPath, Rgb};
    use crate::domain::geometry::Rect;

    fn tuning() -> PhysicsTuning {
        PhysicsTuning::default()
    }

    fn grounded(x: f32) -> Player {
        let mut p = Player::new(x, 340.0);
        p.on_ground = true;
        p
    }

    fn mover(x: f32, speed: f32, range: f32, direction: Facing) -> Platform {
        Platform {
            rect: Rect::new(x, 200.0, 100.0, 20.0),
            kind: PlatformKind::Moving(MovingPath {
                origin: 100.0,
                speed,
                range,
                direction,
                last_dx: 0.0,
            }),
            color: Rgb::new(0, 0, 0),
        }
    }

    // ── step_player ──

    #[test]
    fn gravity_accumulates() {
        let t = tuning();
        let mut p = Player::new(100.0, 100.0);
        let c = Control::default();
        step_player(&mut p, &c, &t, 2000.0);
        step_player(&mut p, &c, &t, 2000.0);
        assert!((p.vy - 1.2).abs() < 1e-5);
        assert!((p.y - 101.8).abs() < 1e-4);
        assert!(!p.on_ground);
    }

    #[test]
    fn walk_moves_by_walk_speed() {
        let t = tuning();
        let mut p = grounded(100.0);
        let mut c = Control::default();
        c.set_move(Facing::Right, true, 0, t.double_tap_ms);
        step_player(&mut p, &c, &t, 2000.0);
        assert!((p.x - 103.5).abs() < 1e-5);
        assert_eq!(p.facing, Facing::Right);
    }

    #[test]
    fn crouch_blocks_horizontal_motion() {
        let t = tuning();
        let mut p = grounded(100.0);
        assert!(start_crouch(&mut p, &t));
        let mut c = Control::default();
        c.set_move(Facing::Left, true, 0, t.double_tap_ms);
        step_player(&mut p, &c, &t, 2000.0);
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.x, 100.0);
    }

    #[test]
    fn x_clamped_to_level() {
        let t = tuning();
        let mut p = grounded(2.0);
        let mut c = Control::default();
        c.set_move(Facing::Left, true, 0, t.double_tap_ms);
        step_player(&mut p, &c, &t, 500.0);
        assert_eq!(p.x, 0.0);

        let mut p = grounded(468.0);
        let mut c = Control::default();
        c.set_move(Facing::Right, true, 0, t.double_tap_ms);
        step_player(&mut p, &c, &t, 500.0);
        assert_eq!(p.x, 470.0);
    }

    #[test]
    fn falling_below_margin_is_reported() {
        let t = tuning();
        let mut p = Player::new(100.0, 405.0);
        // bottom 445 + vy 0.6 → 445.6 < 450
        assert!(!step_player(&mut p, &Control::default(), &t, 2000.0));
        p.vy = 10.0;
        assert!(step_player(&mut p, &Control::default(), &t, 2000.0));
    }

    // ── jump ──

    #[test]
    fn jump_requires_ground() {
        let t = tuning();
        let mut p = Player::new(100.0, 100.0);
        assert!(!try_jump(&mut p, &t, 0));
        p.on_ground = true;
        assert!(try_jump(&mut p, &t, 0));
        assert_eq!(p.vy, -13.0);
        assert!(p.is_jumping);
        // no double jump
        p.on_ground = true;
        assert!(!try_jump(&mut p, &t, 10));
    }

    #[test]
    fn quick_release_cuts_to_short_hop() {
        let t = tuning();
        let mut p = grounded(100.0);
        try_jump(&mut p, &t, 1000);
        step_player(&mut p, &Control::default(), &t, 2000.0);
        assert!(release_jump(&mut p, &t, 1050));
        assert!((p.vy + 7.5).abs() < 1e-5);
        assert!(!p.can_variable_jump);
    }

    #[test]
    fn late_release_keeps_full_jump() {
        let t = tuning();
        let mut p = grounded(100.0);
        try_jump(&mut p, &t, 1000);
        let vy = p.vy;
        assert!(!release_jump(&mut p, &t, 1200));
        assert_eq!(p.vy, vy);
    }

    #[test]
    fn release_never_speeds_up_ascent() {
        let t = tuning();
        let mut p = grounded(100.0);
        try_jump(&mut p, &t, 0);
        p.vy = -6.0;
        assert!(!release_jump(&mut p, &t, 20));
        assert_eq!(p.vy, -6.0);
    }

    #[test]
    fn bounce_credit_allows_airborne_jump_once() {
        let t = tuning();
        let mut p = Player::new(100.0, 100.0);
        p.bounce_jump = true;
        assert!(try_jump(&mut p, &t, 0));
        assert!(!p.bounce_jump);
        p.is_jumping = false;
        assert!(!try_jump(&mut p, &t, 5));
    }

    // ── crouch ──

    #[test]
    fn no_crouch_midair() {
        let t = tuning();
        let mut p = Player::new(100.0, 100.0);
        assert!(!start_crouch(&mut p, &t));
        p.on_ground = true;
        assert!(start_crouch(&mut p, &t));
        assert!(p.draw_height < p.height && p.draw_width < p.width);
        assert!(stop_crouch(&mut p));
        assert_eq!(p.draw_height, p.height);
    }

    // ── invincibility ──

    #[test]
    fn invincibility_follows_elapsed_time() {
        let mut left = 2000.0;
        assert!(!tick_invincibility(&mut left, 1000.0));
        assert!(!tick_invincibility(&mut left, 999.0));
        assert!(tick_invincibility(&mut left, 5.0));
        assert_eq!(left, 0.0);
        assert!(!tick_invincibility(&mut left, 16.0));
    }

    // ── platforms ──

    #[test]
    fn platform_clamps_at_far_bound_and_flips() {
        let mut p = mover(148.0, 5.0, 50.0, Facing::Right);
        advance_platform(&mut p);
        assert_eq!(p.rect.x, 150.0);
        assert_eq!(p.carry_dx(), 2.0);
        let PlatformKind::Moving(path) = p.kind else { panic!() };
        assert_eq!(path.direction, Facing::Left);
        advance_platform(&mut p);
        assert_eq!(p.rect.x, 145.0);
    }

    #[test]
    fn platform_clamps_at_origin_and_flips() {
        let mut p = mover(103.0, 5.0, 50.0, Facing::Left);
        advance_platform(&mut p);
        assert_eq!(p.rect.x, 100.0);
        assert_eq!(p.carry_dx(), -3.0);
        let PlatformKind::Moving(path) = p.kind else { panic!() };
        assert_eq!(path.direction, Facing::Right);
    }

    #[test]
    fn leftward_platform_at_origin_flips_in_place() {
        let mut p = mover(100.0, 2.0, 50.0, Facing::Left);
        advance_platform(&mut p);
        assert_eq!(p.rect.x, 100.0);
        assert_eq!(p.carry_dx(), 0.0);
        let PlatformKind::Moving(path) = p.kind else { panic!() };
        assert_eq!(path.last_dx, 0.0);
        assert_eq!(path.direction, Facing::Right);
    }

    #[test]
    fn static_platform_never_moves() {
        let mut p = Platform {
            rect: Rect::new(10.0, 10.0, 50.0, 20.0),
            kind: PlatformKind::Static,
            color: Rgb::new(1, 2, 3),
        };
        advance_platform(&mut p);
        assert_eq!(p.rect.x, 10.0);
        assert_eq!(p.carry_dx(), 0.0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn platform_stays_within_travel(
                start in 0.0f32..1.0,
                speed in 0.1f32..8.0,
                range in 1.0f32..120.0,
                ticks in 1usize..400,
            ) {
                let mut p = mover(100.0 + start * range, speed, range, Facing::Right);
                for _ in 0..ticks {
                    advance_platform(&mut p);
                    prop_assert!(p.rect.x >= 100.0 - 1e-3);
                    prop_assert!(p.rect.x <= 100.0 + range + 1e-3);
                }
            }
        }
    }
}
