//! World: the complete state of a running game session.
//!
//! ## Ownership
//!
//! The caller owns one `World` and passes it to the step functions in
//! `sim::step`. There is no global state. Rendering and HUD code read the
//! world through `snapshot()` / `hud()` after a tick, never during one.
//!
//! ## Camera
//!
//! World x is level-space. The camera offset eases toward keeping the
//! player centered in a `view_width`-wide window, clamped to the level.

use crate::config::Tuning;
use crate::domain::control::Control;
use crate::domain::entity::{Facing, Level, Player};
use crate::domain::geometry::Rect;
use crate::sim::error::{LevelError, SimError};
use crate::sim::level::{validate, LevelTemplate};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// No level loaded yet.
    Title,
    /// Tick loop active. Respawning happens inside this phase.
    Playing,
    /// Exit reached; waiting for an explicit advance.
    LevelComplete,
    GameOver,
    Won,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub view_w: f32,
}

impl Camera {
    pub fn new(view_w: f32) -> Self {
        Camera { x: 0.0, view_w }
    }

    pub fn follow(&mut self, player: &Player, level_width: f32, lerp: f32) {
        let target = player.x - (self.view_w / 2.0 - player.width / 2.0);
        self.x += (target - self.x) * lerp;
        let max = (level_width - self.view_w).max(0.0);
        self.x = self.x.clamp(0.0, max);
    }
}

/// Counters that survive respawns. Lives also survive level changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub level_index: usize,
    pub lives: u32,
    pub collected: usize,
    /// Remaining invincibility; 0 when vulnerable.
    pub invincible_ms: f32,
}

/// What the status line shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hud {
    pub lives: u32,
    pub max_lives: u32,
    pub collected: usize,
    pub required: usize,
    /// 1-based for display.
    pub level: usize,
    pub levels: usize,
    pub boss: bool,
    pub exit_open: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerView {
    /// Crouch-adjusted collision box.
    pub hitbox: Rect,
    pub facing: Facing,
    pub crouching: bool,
    pub on_ground: bool,
}

/// Read-only view for rendering.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub phase: Phase,
    pub camera_x: f32,
    pub view_width: f32,
    pub playfield_height: f32,
    pub level: Option<&'a Level>,
    pub player: Option<PlayerView>,
    pub invincible: bool,
    pub tick: u64,
}

pub struct World {
    pub(crate) tuning: Tuning,
    pub(crate) campaign: Vec<LevelTemplate>,
    pub(crate) phase: Phase,
    pub(crate) session: Session,
    pub(crate) level: Option<Level>,
    pub(crate) player: Player,
    pub(crate) control: Control,
    pub(crate) camera: Camera,
    pub(crate) tick: u64,
}

impl World {
    /// A world on the title screen. Every template is validated up front so
    /// a broken pack fails here rather than mid-game.
    pub fn new(tuning: Tuning, campaign: Vec<LevelTemplate>) -> Result<Self, SimError> {
        tuning.validate()?;
        if campaign.is_empty() {
            return Err(LevelError::EmptyPack.into());
        }
        for t in &campaign {
            validate(t, &tuning.physics)?;
        }
        let p = &tuning.physics;
        Ok(World {
            session: Session {
                level_index: 0,
                lives: tuning.session.starting_lives,
                collected: 0,
                invincible_ms: 0.0,
            },
            player: Player::new(0.0, 0.0),
            control: Control::default(),
            camera: Camera::new(p.view_width),
            phase: Phase::Title,
            level: None,
            tick: 0,
            campaign,
            tuning,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn lives(&self) -> u32 {
        self.session.lives
    }

    pub fn level_index(&self) -> usize {
        self.session.level_index
    }

    pub fn level_count(&self) -> usize {
        self.campaign.len()
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn camera_x(&self) -> f32 {
        self.camera.x
    }

    pub fn is_invincible(&self) -> bool {
        self.session.invincible_ms > 0.0
    }

    /// Inside the post-damage window: repositioned, still playing.
    pub fn is_respawning(&self) -> bool {
        self.phase == Phase::Playing && self.is_invincible()
    }

    pub fn hud(&self) -> Hud {
        let level = self.level.as_ref();
        Hud {
            lives: self.session.lives,
            max_lives: self.tuning.session.max_lives,
            collected: self.session.collected,
            required: level.map_or(0, Level::required),
            level: self.session.level_index + 1,
            levels: self.campaign.len(),
            boss: level.is_some_and(Level::is_boss),
            exit_open: level.is_some_and(|l| l.exit.is_open),
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let player = self.level.as_ref().map(|_| PlayerView {
            hitbox: self.player.hitbox(),
            facing: self.player.facing,
            crouching: self.player.crouching,
            on_ground: self.player.on_ground,
        });
        Snapshot {
            phase: self.phase,
            camera_x: self.camera.x,
            view_width: self.camera.view_w,
            playfield_height: self.tuning.physics.playfield_height,
            level: self.level.as_ref(),
            player,
            invincible: self.is_invincible(),
            tick: self.tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::builtin_campaign;

    #[test]
    fn new_world_sits_on_title() {
        let tuning = Tuning::default();
        let campaign = builtin_campaign(1, &tuning.physics);
        let w = World::new(tuning, campaign).unwrap();
        assert_eq!(w.phase(), Phase::Title);
        assert!(w.level().is_none());
        assert!(w.snapshot().player.is_none());
        let hud = w.hud();
        assert_eq!(hud.lives, 3);
        assert_eq!(hud.levels, 11);
        assert_eq!(hud.required, 0);
    }

    #[test]
    fn empty_campaign_rejected() {
        assert!(matches!(
            World::new(Tuning::default(), vec![]),
            Err(SimError::Level(LevelError::EmptyPack))
        ));
    }

    #[test]
    fn camera_eases_and_clamps() {
        let mut cam = Camera::new(800.0);
        let mut p = Player::new(1000.0, 300.0);
        cam.follow(&p, 3000.0, 0.1);
        // target = 1000 - (400 - 15) = 615
        assert!((cam.x - 61.5).abs() < 1e-4);
        for _ in 0..200 {
            cam.follow(&p, 3000.0, 0.1);
        }
        assert!((cam.x - 615.0).abs() < 0.1);

        p.x = 2950.0;
        for _ in 0..400 {
            cam.follow(&p, 3000.0, 0.1);
        }
        assert_eq!(cam.x, 2200.0);

        p.x = 0.0;
        for _ in 0..400 {
            cam.follow(&p, 3000.0, 0.1);
        }
        assert_eq!(cam.x, 0.0);
    }
}
