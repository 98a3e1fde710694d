//! Player intents and the held-direction / speed-tier tracker.
//!
//! Intents are edge events stamped with the tick clock in milliseconds.
//! Holding a direction walks; pressing the same direction twice within the
//! double-tap window runs until that direction is released.

use super::entity::Facing;
use crate::config::PhysicsTuning;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentKind {
    MoveLeft(bool),
    MoveRight(bool),
    JumpPressed,
    JumpReleased,
    CrouchPressed,
    CrouchReleased,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Intent {
    pub kind: IntentKind,
    pub at_ms: u64,
}

impl Intent {
    pub fn new(kind: IntentKind, at_ms: u64) -> Self {
        Intent { kind, at_ms }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SpeedTier {
    #[default]
    Walk,
    Run,
}

#[derive(Clone, Debug, Default)]
pub struct Control {
    left: bool,
    right: bool,
    crouch: bool,
    tier: SpeedTier,
    last_left_press: Option<u64>,
    last_right_press: Option<u64>,
}

impl Control {
    /// Apply a move edge. Repeated presses while already held are ignored.
    pub fn set_move(&mut self, dir: Facing, active: bool, at_ms: u64, double_tap_ms: u64) {
        let (held, last) = match dir {
            Facing::Left => (&mut self.left, &mut self.last_left_press),
            Facing::Right => (&mut self.right, &mut self.last_right_press),
        };
        if active {
            if *held {
                return;
            }
            *held = true;
            let double_tap = last.is_some_and(|t| at_ms.saturating_sub(t) < double_tap_ms);
            *last = Some(at_ms);
            if double_tap {
                self.tier = SpeedTier::Run;
            }
        } else if *held {
            *held = false;
            if !self.left && !self.right {
                self.tier = SpeedTier::Walk;
            }
        }
    }

    pub fn set_crouch(&mut self, held: bool) {
        self.crouch = held;
    }

    pub fn crouch_held(&self) -> bool {
        self.crouch
    }

    /// -1, 0 or +1. Right wins when both are held.
    pub fn axis(&self) -> f32 {
        if self.right {
            1.0
        } else if self.left {
            -1.0
        } else {
            0.0
        }
    }

    pub fn tier(&self) -> SpeedTier {
        self.tier
    }

    pub fn speed(&self, t: &PhysicsTuning) -> f32 {
        match self.tier {
            SpeedTier::Walk => t.walk_speed,
            SpeedTier::Run => t.run_speed,
        }
    }

    /// Forget held keys and tap history (level load, respawn into a new level).
    pub fn reset(&mut self) {
        *self = Control::default();
    }
}
