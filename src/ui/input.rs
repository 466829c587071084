/// Keyboard input tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered jump advance (only fires on initial press)
///   - Variable jump height while the jump key stays down
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// Bindings:
///   ← / a        left
///   → / d        right
///   ↑ / w / ␣    jump
///   Enter        confirm
///   r            restart
///   Esc / q / ^C quit

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::TickInput;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const JUMP_KEYS: [KeyCode; 4] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' ')];
const CONFIRM_KEYS: [KeyCode; 1] = [KeyCode::Enter];
const RESTART_KEYS: [KeyCode; 2] = [KeyCode::Char('r'), KeyCode::Char('R')];
const QUIT_KEYS: [KeyCode; 3] = [KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call. Used for edge-triggered actions.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
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

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the session tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        if !self.honor_release {
            let now = Instant::now();
            self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
    }

    /// Reduce the keyboard to this frame's logical input.
    /// The jump edge comes from fresh presses, the jump level from held keys.
    pub fn tick_input(&self) -> TickInput {
        TickInput {
            left: self.any_held(&LEFT_KEYS),
            right: self.any_held(&RIGHT_KEYS),
            jump_held: self.any_pressed(&JUMP_KEYS),
            jump_pressed: self.any_held(&JUMP_KEYS),
            confirm: self.any_pressed(&CONFIRM_KEYS),
        }
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_pressed(&RESTART_KEYS)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(&QUIT_KEYS) || self.ctrl_c_pressed()
    }

    /// Is this key currently held down?
    /// Used for continuous actions (movement, jump hold). With Release
    /// events only a Release ends the hold.
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| self.honor_release || t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    /// Used for one-shot actions (jump advance, confirm).
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    // ── Internal ──

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                // Explicit release: remove from active set
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Ignore release when enhancement not confirmed;
                // rely on timeout-based expiry instead
            }
            KeyEventKind::Repeat => {
                // Auto-repeat keeps the key held, never a new edge
                self.last_active.insert(key.code, now);
            }
            KeyEventKind::Press => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    /// Start a new frame without touching the terminal.
    fn next_frame(input: &mut InputState) {
        input.fresh_presses.clear();
        input.raw_events.clear();
    }

    #[test]
    fn jump_press_is_an_edge_then_a_level() {
        let mut input = InputState::new();
        input.apply(key(KeyCode::Char(' '), KeyEventKind::Press), Instant::now());
        let first = input.tick_input();
        assert!(first.jump_held && first.jump_pressed);

        // Auto-repeat: still held, no new edge.
        next_frame(&mut input);
        input.apply(key(KeyCode::Char(' '), KeyEventKind::Repeat), Instant::now());
        let second = input.tick_input();
        assert!(!second.jump_held);
        assert!(second.jump_pressed);
    }

    #[test]
    fn movement_keys_map_to_directions() {
        let mut input = InputState::new();
        input.apply(key(KeyCode::Left, KeyEventKind::Press), Instant::now());
        input.apply(key(KeyCode::Char('d'), KeyEventKind::Press), Instant::now());
        let t = input.tick_input();
        assert!(t.left && t.right);
        assert!(!t.jump_held && !t.confirm);
    }

    #[test]
    fn release_is_honored_only_with_enhancement() {
        let mut input = InputState::new();
        input.apply(key(KeyCode::Up, KeyEventKind::Press), Instant::now());
        input.apply(key(KeyCode::Up, KeyEventKind::Release), Instant::now());
        assert!(input.is_held(KeyCode::Up));

        input.honor_release = true;
        input.apply(key(KeyCode::Up, KeyEventKind::Release), Instant::now());
        assert!(!input.is_held(KeyCode::Up));
    }

    #[test]
    fn stale_keys_expire() {
        let mut input = InputState::new();
        let Some(past) = Instant::now().checked_sub(HOLD_TIMEOUT * 2) else {
            return;
        };
        input.apply(key(KeyCode::Right, KeyEventKind::Press), past);
        assert!(!input.tick_input().right);
    }

    #[test]
    fn release_events_keep_a_long_hold_alive() {
        let mut input = InputState::new();
        input.honor_release = true;
        let Some(past) = Instant::now().checked_sub(Duration::from_millis(300)) else {
            return;
        };
        input.apply(key(KeyCode::Up, KeyEventKind::Press), past);
        next_frame(&mut input);
        let t = input.tick_input();
        assert!(t.jump_pressed, "hold outlasts the fallback timeout");
        assert!(!t.jump_held);

        // First auto-repeat arrives late: still one physical press.
        input.apply(key(KeyCode::Up, KeyEventKind::Repeat), Instant::now());
        let t = input.tick_input();
        assert!(!t.jump_held);
        assert!(t.jump_pressed);

        input.apply(key(KeyCode::Up, KeyEventKind::Release), Instant::now());
        assert!(!input.tick_input().jump_pressed);
    }

    #[test]
    fn late_repeat_after_timeout_is_not_an_edge() {
        let mut input = InputState::new();
        let Some(past) = Instant::now().checked_sub(HOLD_TIMEOUT * 2) else {
            return;
        };
        input.apply(key(KeyCode::Char(' '), KeyEventKind::Press), past);
        next_frame(&mut input);
        assert!(!input.tick_input().jump_pressed);

        input.apply(key(KeyCode::Char(' '), KeyEventKind::Repeat), Instant::now());
        let t = input.tick_input();
        assert!(!t.jump_held);
        assert!(t.jump_pressed);
    }

    #[test]
    fn meta_keys() {
        let mut input = InputState::new();
        input.apply(key(KeyCode::Enter, KeyEventKind::Press), Instant::now());
        input.apply(key(KeyCode::Char('r'), KeyEventKind::Press), Instant::now());
        assert!(input.tick_input().confirm);
        assert!(input.restart_pressed());
        assert!(!input.quit_pressed());

        next_frame(&mut input);
        input.apply(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
        );
        assert!(input.quit_pressed());
    }
}
