/// Keyboard state tracker and intent feed.
///
/// `InputState` tracks which keys are held, so movement continues while a
/// key is down and menu keys fire once per press. Crossterm's keyboard
/// enhancement supplies Release events where the terminal supports it;
/// elsewhere a key counts as released after `HOLD_TIMEOUT` without a
/// Press/Repeat.
///
/// `IntentFeed` turns the held set of logical controls into the edge
/// intents the simulation consumes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use bobo::domain::control::{Intent, IntentKind};

/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const JUMP_KEYS: [KeyCode; 4] =
    [KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const CROUCH_KEYS: [KeyCode; 3] = [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from released to held during the last `drain_events`.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events from the last drain, for meta keys.
    pub raw_events: Vec<KeyEvent>,

    /// Honor Release events. Only set once keyboard enhancement is on.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Unreliable without enhancement; the timeout handles it.
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Freshly pressed this frame (edge trigger).
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Logical controls currently held on the keyboard.
    pub fn held(&self) -> Held {
        Held {
            left: self.any_held(&LEFT_KEYS),
            right: self.any_held(&RIGHT_KEYS),
            jump: self.any_held(&JUMP_KEYS),
            crouch: self.any_held(&CROUCH_KEYS),
        }
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .is_some_and(|t| now.duration_since(*t) < HOLD_TIMEOUT)
    }
}

// ── Intent feed ──

/// Held state of the four gameplay controls, from any device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Held {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub crouch: bool,
}

impl Held {
    pub fn merge(self, other: Held) -> Held {
        Held {
            left: self.left || other.left,
            right: self.right || other.right,
            jump: self.jump || other.jump,
            crouch: self.crouch || other.crouch,
        }
    }
}

#[derive(Debug, Default)]
pub struct IntentFeed {
    prev: Held,
}

impl IntentFeed {
    pub fn new() -> Self {
        IntentFeed::default()
    }

    /// Edges between the previous frame's controls and `now`, stamped
    /// with `at_ms`.
    pub fn diff(&mut self, now: Held, at_ms: u64) -> Vec<Intent> {
        let prev = std::mem::replace(&mut self.prev, now);
        let mut out = Vec::new();
        let mut edge = |before: bool, after: bool, on: IntentKind, off: IntentKind| {
            if after && !before {
                out.push(Intent::new(on, at_ms));
            } else if before && !after {
                out.push(Intent::new(off, at_ms));
            }
        };
        edge(prev.left, now.left, IntentKind::MoveLeft(true), IntentKind::MoveLeft(false));
        edge(prev.right, now.right, IntentKind::MoveRight(true), IntentKind::MoveRight(false));
        edge(prev.crouch, now.crouch, IntentKind::CrouchPressed, IntentKind::CrouchReleased);
        edge(prev.jump, now.jump, IntentKind::JumpPressed, IntentKind::JumpReleased);
        out
    }

    /// Forget movement and crouch after a level load, so keys still held
    /// are pressed again on the next frame. A held jump is not repeated.
    pub fn rearm(&mut self) {
        self.prev = Held { jump: self.prev.jump, ..Held::default() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent { code, modifiers: KeyModifiers::NONE, kind, state: KeyEventState::NONE }
    }

    #[test]
    fn press_then_repeat_is_one_fresh_press() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.apply(key(KeyCode::Left, KeyEventKind::Press), now);
        kb.apply(key(KeyCode::Left, KeyEventKind::Repeat), now);
        assert_eq!(kb.fresh_presses, vec![KeyCode::Left]);
        assert!(kb.held().left);
    }

    #[test]
    fn release_only_honored_with_enhancement() {
        let mut kb = InputState::new();
        let now = Instant::now();
        kb.apply(key(KeyCode::Char(' '), KeyEventKind::Press), now);
        kb.apply(key(KeyCode::Char(' '), KeyEventKind::Release), now);
        assert!(kb.held().jump);

        kb.honor_release = true;
        kb.apply(key(KeyCode::Char(' '), KeyEventKind::Release), now);
        assert!(!kb.held().jump);
    }

    #[test]
    fn feed_emits_edges_only() {
        let mut feed = IntentFeed::new();
        let right = Held { right: true, ..Held::default() };
        assert_eq!(feed.diff(right, 10), vec![Intent::new(IntentKind::MoveRight(true), 10)]);
        assert!(feed.diff(right, 26).is_empty());
        assert_eq!(
            feed.diff(Held::default(), 42),
            vec![Intent::new(IntentKind::MoveRight(false), 42)]
        );
    }

    #[test]
    fn jump_press_and_release() {
        let mut feed = IntentFeed::new();
        let jump = Held { jump: true, ..Held::default() };
        assert_eq!(feed.diff(jump, 100), vec![Intent::new(IntentKind::JumpPressed, 100)]);
        assert_eq!(
            feed.diff(Held::default(), 160),
            vec![Intent::new(IntentKind::JumpReleased, 160)]
        );
    }

    #[test]
    fn rearm_repeats_movement_but_not_jump() {
        let mut feed = IntentFeed::new();
        let both = Held { left: true, jump: true, ..Held::default() };
        feed.diff(both, 0);
        feed.rearm();
        assert_eq!(feed.diff(both, 16), vec![Intent::new(IntentKind::MoveLeft(true), 16)]);
    }

    #[test]
    fn merge_is_per_control_or() {
        let a = Held { left: true, ..Held::default() };
        let b = Held { crouch: true, ..Held::default() };
        assert_eq!(a.merge(b), Held { left: true, crouch: true, ..Held::default() });
    }
}
