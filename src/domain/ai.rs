//! Enemy patrol AI.
//!
//! Non-boss enemies walk back and forth inside their patrol interval. The
//! live speed is recomputed every tick from the base speed, how far the
//! camera has progressed through the level, and the level index.
//! Bosses hold still.

use super::entity::{Enemy, Facing};
use crate::config::DifficultyTuning;

/// Speed-up from scrolling further into the level, capped.
pub fn progress_factor(camera_x: f32, level_width: f32, d: &DifficultyTuning) -> f32 {
    if level_width <= 0.0 {
        return 1.0;
    }
    let progress = (camera_x / level_width).max(0.0);
    (1.0 + progress * d.progress_gain).min(d.progress_cap)
}

/// Flat multiplier for later levels.
pub fn level_factor(level_index: usize, d: &DifficultyTuning) -> f32 {
    1.0 + level_index as f32 * d.level_speed_step
}

/// Move one enemy along its patrol. The whole body stays inside
/// `[start, end]`: reaching either end clamps onto it and reverses.
pub fn patrol_step(enemy: &mut Enemy) {
    let lo = enemy.patrol.start;
    let hi = (enemy.patrol.end - enemy.rect.w).max(lo);
    let mut x = enemy.rect.x + enemy.speed * enemy.direction.sign();
    if x >= hi {
        x = hi;
        enemy.direction = Facing::Left;
    } else if x <= lo {
        x = lo;
        enemy.direction = Facing::Right;
    }
    enemy.rect.x = x;
}

pub fn step_enemies(
    enemies: &mut [Enemy],
    camera_x: f32,
    level_width: f32,
    level_index: usize,
    d: &DifficultyTuning,
) {
    let scale = progress_factor(camera_x, level_width, d) * level_factor(level_index, d);
    for e in enemies.iter_mut().filter(|e| !e.is_boss) {
        e.speed = e.base_speed * scale;
        patrol_step(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Patrol;
    use crate::domain::geometry::Rect;

    fn walker(x: f32, speed: f32, start: f32, end: f32, direction: Facing) -> Enemy {
        Enemy {
            rect: Rect::new(x, 350.0, 40.0, 30.0),
            base_speed: speed,
            speed,
            direction,
            patrol: Patrol { start, end },
            is_boss: false,
        }
    }

    #[test]
    fn progress_factor_is_capped() {
        let d = DifficultyTuning::default();
        assert_eq!(progress_factor(0.0, 3000.0, &d), 1.0);
        assert!((progress_factor(1500.0, 3000.0, &d) - 1.25).abs() < 1e-6);
        assert_eq!(progress_factor(9000.0, 3000.0, &d), 1.5);
    }

    #[test]
    fn later_levels_are_faster() {
        let d = DifficultyTuning::default();
        assert_eq!(level_factor(0, &d), 1.0);
        assert!((level_factor(4, &d) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn reverses_at_patrol_end() {
        let mut e = walker(158.0, 5.0, 100.0, 200.0, Facing::Right);
        patrol_step(&mut e);
        assert_eq!(e.rect.x, 160.0);
        assert_eq!(e.direction, Facing::Left);
        patrol_step(&mut e);
        assert_eq!(e.rect.x, 155.0);
    }

    #[test]
    fn reverses_at_patrol_start() {
        let mut e = walker(102.0, 5.0, 100.0, 200.0, Facing::Left);
        patrol_step(&mut e);
        assert_eq!(e.rect.x, 100.0);
        assert_eq!(e.direction, Facing::Right);
    }

    #[test]
    fn boss_holds_still() {
        let mut boss = walker(450.0, 1.0, 450.0, 450.0, Facing::Left);
        boss.is_boss = true;
        let mut all = vec![boss];
        step_enemies(&mut all, 0.0, 1000.0, 10, &DifficultyTuning::default());
        assert_eq!(all[0].rect.x, 450.0);
    }

    #[test]
    fn speed_scales_from_base() {
        let d = DifficultyTuning::default();
        let mut all = vec![walker(300.0, 2.0, 100.0, 600.0, Facing::Right)];
        step_enemies(&mut all, 1500.0, 3000.0, 2, &d);
        let expected = 2.0 * 1.25 * 1.1;
        assert!((all[0].speed - expected).abs() < 1e-5);
        assert!((all[0].rect.x - (300.0 + expected)).abs() < 1e-4);
        // base speed untouched, so repeated ticks do not compound
        step_enemies(&mut all, 1500.0, 3000.0, 2, &d);
        assert!((all[0].speed - expected).abs() < 1e-5);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn enemy_stays_in_patrol(
                start in 0.0f32..500.0,
                span in 40.0f32..400.0,
                offset in 0.0f32..1.0,
                speed in 0.1f32..6.0,
                ticks in 1usize..300,
            ) {
                let end = start + span;
                let x = start + offset * (span - 40.0);
                let mut e = walker(x, speed, start, end, Facing::Right);
                for _ in 0..ticks {
                    patrol_step(&mut e);
                    prop_assert!(e.rect.x >= start - 1e-3);
                    prop_assert!(e.rect.right() <= end + 1e-3);
                }
            }
        }
    }
}
