//! Events emitted during a simulation step or a state transition.
//! The presentation layer consumes these for sound and messages; they are
//! never fed back into the tick that produced them.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageCause {
    Contact,
    Fall,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// A level was loaded and play began (fresh start or advance).
    LevelStarted { level: usize },
    Jumped,
    Collected { collected: usize, required: usize },
    ExitOpened,
    Stomped { x: f32, y: f32 },
    Damaged { cause: DamageCause, lives_left: u32 },
    LevelCompleted { level: usize },
    /// Another level follows the one just completed.
    NextLevelReady { level: usize },
    GameOver,
    Won,
}
