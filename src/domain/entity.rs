/// Entities: the player and the per-tick input it consumes.

/// Frame input, already reduced to logical keys by the host.
///
/// Two views of the jump key:
///   - `jump_held`    — edge: true once per physical press (no auto-repeat).
///                      Advances the jump state machine.
///   - `jump_pressed` — level: true every tick the key is down.
///                      Drives the variable-height hold windows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub jump_held: bool,
    pub jump_pressed: bool,
    pub confirm: bool,
}

#[cfg(test)]
impl TickInput {
    /// A fresh jump press: both views true on the press tick.
    pub fn jump() -> Self {
        TickInput { jump_held: true, jump_pressed: true, ..Default::default() }
    }

    /// Jump key kept down after the press tick.
    pub fn jump_hold() -> Self {
        TickInput { jump_pressed: true, ..Default::default() }
    }

    pub fn confirm() -> Self {
        TickInput { confirm: true, ..Default::default() }
    }
}

/// Player kinematic state. Position is the top-left corner of a
/// one-tile-square bounding box, in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// 0 = grounded, 1 = first jump, 2 = double jump (hover).
    pub jump_count: u8,
    pub on_ground: bool,
    pub dead: bool,
    pub won: bool,
    /// Accumulated per-tick gravity delta added to `vy`.
    pub gravity_speed: f32,
    /// Time the jump key has been held in the current jump cycle.
    pub hold_timer_ms: f32,
}

impl PlayerState {
    /// Fresh player at a spawn point: at rest, airborne until the first landing.
    pub fn spawn(x: f32, y: f32) -> Self {
        PlayerState {
            x, y,
            vx: 0.0,
            vy: 0.0,
            jump_count: 0,
            on_ground: false,
            dead: false,
            won: false,
            gravity_speed: 0.0,
            hold_timer_ms: 0.0,
        }
    }

    /// Rounded integer pixel position, as drawn.
    pub fn pixel_pos(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_clears_everything() {
        let p = PlayerState::spawn(70.0, 60.0);
        assert_eq!((p.x, p.y), (70.0, 60.0));
        assert_eq!((p.vx, p.vy, p.gravity_speed, p.hold_timer_ms), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(p.jump_count, 0);
        assert!(!p.on_ground && !p.dead && !p.won);
    }

    #[test]
    fn pixel_pos_rounds() {
        let mut p = PlayerState::spawn(10.49, 9.5);
        assert_eq!(p.pixel_pos(), (10, 10));
        p.x = -0.6;
        assert_eq!(p.pixel_pos().0, -1);
    }
}
