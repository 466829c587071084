/// The session tick: advances the game by one frame.
///
/// Phase dispatch:
///   Idle     — confirm starts play, everything else is ignored
///   Playing  — dead:  death pause countdown, respawn when it expires
///              alive: one `physics::step_player` call
///   Won      — frozen; confirm respawns and resumes play
///
/// Progress depends only on the `elapsed_ms` values passed in and the input
/// sequence, never on the wall clock, so a recorded trace replays exactly.

use crate::domain::entity::{PlayerState, TickInput};
use crate::domain::physics;
use super::event::GameEvent;
use super::world::{Phase, SessionState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn tick(session: &mut SessionState, elapsed_ms: f32, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();
    // Timers never run backwards.
    let elapsed_ms = if elapsed_ms.is_finite() { elapsed_ms.max(0.0) } else { 0.0 };

    match session.phase {
        Phase::Idle => {
            if input.confirm {
                session.phase = Phase::Playing;
                log::debug!("session started");
                events.push(GameEvent::Started);
            }
        }
        Phase::Playing if session.player.dead => {
            resolve_death_pause(session, elapsed_ms, &mut events);
        }
        Phase::Playing => {
            resolve_player(session, elapsed_ms, input, &mut events);
        }
        Phase::Won => {
            if input.confirm {
                respawn(session);
                session.phase = Phase::Playing;
                events.push(GameEvent::Respawned);
            }
        }
    }

    events
}

/// Put the player back at the spawn point and resume play (restart key).
/// Does nothing before the session has started.
pub fn restart(session: &mut SessionState) -> Vec<GameEvent> {
    if session.phase == Phase::Idle {
        return vec![];
    }
    respawn(session);
    session.phase = Phase::Playing;
    vec![GameEvent::Respawned]
}

// ══════════════════════════════════════════════════════════════
// Phases
// ══════════════════════════════════════════════════════════════

fn resolve_death_pause(session: &mut SessionState, elapsed_ms: f32, events: &mut Vec<GameEvent>) {
    session.death_timer_ms += elapsed_ms;
    if session.death_timer_ms >= session.params.death_pause_ms {
        respawn(session);
        events.push(GameEvent::Respawned);
    }
}

fn resolve_player(
    session: &mut SessionState,
    elapsed_ms: f32,
    input: &TickInput,
    events: &mut Vec<GameEvent>,
) {
    session.frame += 1;
    let out = physics::step_player(
        &mut session.player,
        &session.grid,
        &session.params,
        elapsed_ms,
        input,
    );

    if out.jumped { events.push(GameEvent::Jumped); }
    if out.double_jumped { events.push(GameEvent::DoubleJumped); }
    if out.landed { events.push(GameEvent::Landed); }

    // A hazard and the goal touched on the same tick: the hazard wins.
    if session.player.dead {
        session.player.won = false;
        session.death_timer_ms = 0.0;
        if out.died {
            session.deaths += 1;
            log::debug!("player died at ({:.2}, {:.2})", session.player.x, session.player.y);
            events.push(GameEvent::Died);
        }
    } else if out.won {
        session.phase = Phase::Won;
        log::debug!("goal reached after {} frames", session.frame);
        events.push(GameEvent::Won);
    }
}

fn respawn(session: &mut SessionState) {
    let (x, y) = session.spawn;
    session.player = PlayerState::spawn(x, y);
    session.death_timer_ms = 0.0;
    log::debug!("respawned at ({x}, {y})");
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::physics::PhysicsParams;
    use crate::sim::level::parse_level;

    const FRAME: f32 = 16.0;

    fn session(text: &str) -> SessionState {
        let level = parse_level(text, 10.0).unwrap();
        SessionState::new(level, PhysicsParams::default())
    }

    fn playing(text: &str) -> SessionState {
        let mut s = session(text);
        tick(&mut s, FRAME, &TickInput::confirm());
        assert_eq!(s.phase, Phase::Playing);
        s
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    const PIT: &str = "
        @ 20,10
        #####
        #...#
        #...#
        #.^.#
    ";

    const GOAL: &str = "
        @ 20,10
        #####
        #...#
        #...#
        #.$.#
    ";

    #[test]
    fn idle_ignores_everything_but_confirm() {
        let mut s = session(PIT);
        let before = s.player.clone();
        for input in [idle(), TickInput::jump(), TickInput { left: true, ..Default::default() }] {
            assert!(tick(&mut s, FRAME, &input).is_empty());
        }
        assert_eq!(s.phase, Phase::Idle);
        assert_eq!(s.player, before);

        let events = tick(&mut s, FRAME, &TickInput::confirm());
        assert_eq!(events, vec![GameEvent::Started]);
        assert_eq!(s.phase, Phase::Playing);
        assert_eq!(s.player, before, "start tick does not simulate");
    }

    #[test]
    fn playing_delegates_to_physics() {
        let mut s = playing(PIT);
        let y = s.player.y;
        tick(&mut s, FRAME, &idle());
        assert!(s.player.y > y);
        assert_eq!(s.frame, 1);
    }

    #[test]
    fn hazard_death_pauses_then_respawns() {
        let mut s = playing(PIT);
        let mut died = false;
        for _ in 0..30 {
            if tick(&mut s, FRAME, &idle()).contains(&GameEvent::Died) {
                died = true;
                break;
            }
        }
        assert!(died);
        assert!(s.player.dead);
        assert!(s.player_view().dead);
        assert_eq!(s.deaths, 1);

        // Frozen for 500ms of accumulated elapsed time.
        let frozen = s.player.clone();
        for _ in 0..31 {
            assert!(tick(&mut s, FRAME, &TickInput { right: true, ..Default::default() }).is_empty());
            assert_eq!(s.player, frozen);
        }
        assert_eq!(s.death_timer_ms, 496.0);

        let events = tick(&mut s, FRAME, &idle());
        assert_eq!(events, vec![GameEvent::Respawned]);
        assert!(!s.player.dead);
        assert_eq!((s.player.x, s.player.y), s.spawn);
        assert_eq!(s.player, PlayerState::spawn(20.0, 10.0));
        assert_eq!(s.death_timer_ms, 0.0);
        assert_eq!(s.phase, Phase::Playing);

        // Simulation resumes on the next tick.
        tick(&mut s, FRAME, &idle());
        assert!(s.player.y > 10.0);
    }

    #[test]
    fn death_pause_counts_elapsed_time_not_ticks() {
        let mut s = playing(PIT);
        s.player.dead = true;
        assert!(tick(&mut s, 499.0, &idle()).is_empty());
        assert_eq!(tick(&mut s, 1.0, &idle()), vec![GameEvent::Respawned]);

        s.player.dead = true;
        assert_eq!(tick(&mut s, 10_000.0, &idle()), vec![GameEvent::Respawned]);
    }

    #[test]
    fn bad_elapsed_time_is_ignored() {
        let mut s = playing(PIT);
        s.player.dead = true;
        tick(&mut s, -1000.0, &idle());
        tick(&mut s, f32::NAN, &idle());
        tick(&mut s, f32::INFINITY, &idle());
        assert_eq!(s.death_timer_ms, 0.0);
        assert!(s.player.dead);
    }

    #[test]
    fn goal_freezes_until_confirm() {
        let mut s = playing(GOAL);
        let mut won = false;
        for _ in 0..30 {
            if tick(&mut s, FRAME, &idle()).contains(&GameEvent::Won) {
                won = true;
                break;
            }
        }
        assert!(won);
        assert_eq!(s.phase, Phase::Won);
        assert!(s.player.won);

        let frozen = s.player.clone();
        for input in [idle(), TickInput::jump(), TickInput { left: true, ..Default::default() }] {
            assert!(tick(&mut s, FRAME, &input).is_empty());
            assert_eq!(s.player, frozen);
        }

        let events = tick(&mut s, FRAME, &TickInput::confirm());
        assert_eq!(events, vec![GameEvent::Respawned]);
        assert_eq!(s.phase, Phase::Playing);
        assert!(!s.player.won);
        assert_eq!((s.player.x, s.player.y), (20.0, 10.0));
    }

    #[test]
    fn hazard_beats_goal_on_the_same_tick() {
        // Bottom samples at x + 1 and x + 9 straddle the spike and the goal.
        let mut s = playing("
            @ 15,10
            ####
            #..#
            #..#
            #^$#
        ");
        let mut events = vec![];
        for _ in 0..30 {
            events = tick(&mut s, FRAME, &idle());
            if !events.is_empty() {
                break;
            }
        }
        assert!(events.contains(&GameEvent::Died), "events: {events:?}");
        assert!(!events.contains(&GameEvent::Won));
        assert_eq!(s.phase, Phase::Playing);
        assert!(s.player.dead);
        assert!(!s.player.won);
        assert_eq!(s.deaths, 1);
    }

    #[test]
    fn walking_into_goal_wins() {
        let mut s = playing("
            @ 30,10
            ######
            #...$#
            ######
        ");
        let walk = TickInput { right: true, ..Default::default() };
        let mut won = false;
        for _ in 0..5 {
            if tick(&mut s, FRAME, &walk).contains(&GameEvent::Won) {
                won = true;
                break;
            }
        }
        assert!(won);
        assert_eq!(s.phase, Phase::Won);
        assert!(s.player.won);
        assert!(!s.player.dead);
    }

    #[test]
    fn jump_and_landing_events() {
        let mut s = playing("
            @ 20,10
            #####
            #...#
            #...#
            #####
        ");
        let mut landed = false;
        for _ in 0..20 {
            landed |= tick(&mut s, FRAME, &idle()).contains(&GameEvent::Landed);
        }
        assert!(landed);
        assert_eq!(tick(&mut s, FRAME, &TickInput::jump()), vec![GameEvent::Jumped]);
        assert_eq!(tick(&mut s, FRAME, &TickInput::jump()), vec![GameEvent::DoubleJumped]);
    }

    #[test]
    fn restart_resets_player_in_place() {
        let mut s = session(PIT);
        assert!(restart(&mut s).is_empty(), "restart before start is ignored");

        let mut s = playing(PIT);
        for _ in 0..5 {
            tick(&mut s, FRAME, &TickInput { right: true, ..Default::default() });
        }
        let grid = s.grid.clone();
        assert_eq!(restart(&mut s), vec![GameEvent::Respawned]);
        assert_eq!(s.player, PlayerState::spawn(20.0, 10.0));
        assert_eq!(s.grid, grid);
    }

    #[test]
    fn replaying_a_trace_is_deterministic() {
        let trace: Vec<(f32, TickInput)> = (0..200)
            .map(|i| {
                let input = TickInput {
                    left: i % 37 < 10,
                    right: i % 23 < 7,
                    jump_held: i % 41 == 0,
                    jump_pressed: i % 41 < 12,
                    confirm: i % 97 == 0,
                };
                (12.0 + (i % 7) as f32, input)
            })
            .collect();
        let run = || {
            let mut s = session(PIT);
            let mut log = vec![];
            for (dt, input) in &trace {
                log.extend(tick(&mut s, *dt, input));
            }
            (s.player, s.phase, s.deaths, log)
        };
        assert_eq!(run(), run());
    }
}
