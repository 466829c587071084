/// SessionState: the complete state of a running game session.
///
/// ## Ownership
///
///   - `grid`   — parsed once from level data, **never mutated** afterwards.
///   - `player` — the only mutable entity; reset in place on respawn.
///   - `phase`  — coarse session state, advanced only by `step::tick`.
///
/// Dying is not a phase of its own: a dead player inside `Playing` means the
/// death pause is running (`death_timer_ms`).

use crate::domain::entity::PlayerState;
use crate::domain::grid::TileGrid;
use crate::domain::physics::PhysicsParams;
use crate::sim::level::Level;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Waiting for the first confirm.
    Idle,
    Playing,
    /// Goal reached; frozen until confirm.
    Won,
}

/// The part of the session the renderer is allowed to see.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dead: bool,
}

#[derive(Clone, Debug)]
pub struct SessionState {
    pub phase: Phase,
    pub player: PlayerState,
    pub grid: TileGrid,
    pub params: PhysicsParams,
    pub level_name: String,
    pub spawn: (f32, f32),
    /// Elapsed time spent dead, counted toward `params.death_pause_ms`.
    pub death_timer_ms: f32,
    /// Ticks simulated while Playing.
    pub frame: u64,
    pub deaths: u32,
}

impl SessionState {
    pub fn new(level: Level, params: PhysicsParams) -> Self {
        let (sx, sy) = level.spawn;
        SessionState {
            phase: Phase::Idle,
            player: PlayerState::spawn(sx, sy),
            grid: level.grid,
            params,
            level_name: level.name,
            spawn: level.spawn,
            death_timer_ms: 0.0,
            frame: 0,
            deaths: 0,
        }
    }

    pub fn player_view(&self) -> PlayerView {
        let (x, y) = self.player.pixel_pos();
        PlayerView { x, y, dead: self.player.dead }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::parse_level;

    #[test]
    fn new_session_is_idle_at_spawn() {
        let level = parse_level("@ 15,10\n#####\n#...#\n#####\n", 10.0).unwrap();
        let s = SessionState::new(level, PhysicsParams::default());
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!((s.player.x, s.player.y), (15.0, 10.0));
        assert_eq!(s.spawn, (15.0, 10.0));
        assert_eq!(s.player_view(), PlayerView { x: 15, y: 10, dead: false });
        assert_eq!(s.grid.columns(), 5);
    }
}
