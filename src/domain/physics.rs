/// Player simulation: one tick of gravity, jumping and collision.
///
/// ## Step order
///
/// The order is load-bearing: the vertical probe runs at the x produced by
/// the horizontal resolution, and friction decays the velocities the
/// collision steps may have zeroed.
///
///   1. Horizontal intent   (left, then right; right wins)
///   2. Jump state machine  (impulse / double-jump advance / fall gravity)
///   3. Hold windows        (float at jump 1, hover at jump 2)
///   4. Terminal clamp + integrate `vy`
///   5. Candidate position  (`round3` of each velocity)
///   6. Horizontal collision at the OLD y
///   7. Vertical collision at the NEW x
///   8. Friction
///   9. Commit
///
/// ## Jump state machine
///
/// ```text
///              jump edge, on ground            jump edge, airborne
///  [0 grounded] ───────────────────▶ [1 float] ───────────────────▶ [2 hover]
///       ▲                               │                               │
///       └──────────── landing ──────────┴───────────────────────────────┘
/// ```
///
/// While the jump key stays down and `hold_timer_ms < hold_cap_ms`, state 1
/// caps `gravity_speed` at `float_clamp` (sustained ascent) and state 2 pins
/// it to zero (apex hover). The timer is shared by both states and only
/// resets on landing.
///
/// Velocities are never snapped to zero: `round3` turns any residual below
/// half a thousandth of a pixel into no movement at all.

use super::entity::{PlayerState, TickInput};
use super::grid::TileGrid;
use super::rules;

/// Tuning constants. Defaults are the mature iteration's values; earlier
/// iterations used friction 0.82 / 0.9 and a terminal gravity of 2.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsParams {
    pub move_speed: f32,
    pub jump_impulse: f32,
    pub fall_gravity: f32,
    pub float_clamp: f32,
    pub hold_cap_ms: f32,
    pub terminal_gravity: f32,
    pub friction: f32,
    pub snap_epsilon: f32,
    pub edge_bias: f32,
    pub death_pause_ms: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        PhysicsParams {
            move_speed: 3.0,
            jump_impulse: -1.5,
            fall_gravity: 0.2,
            float_clamp: -0.2,
            hold_cap_ms: 800.0,
            terminal_gravity: 1.2,
            friction: 0.8,
            snap_epsilon: 0.01,
            edge_bias: 1.0,
            death_pause_ms: 500.0,
        }
    }
}

/// What happened during one `step_player` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub jumped: bool,
    pub double_jumped: bool,
    /// Airborne → grounded this tick.
    pub landed: bool,
    pub died: bool,
    pub won: bool,
}

/// Round to 3 decimal places, as the position integrator always has.
/// Keeps sub-pixel drift deterministic and kills residual velocities.
#[inline]
pub fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

/// Advance the player by one tick. Caller guarantees the player is alive
/// and has not won; this function does not check.
pub fn step_player(
    player: &mut PlayerState,
    grid: &TileGrid,
    params: &PhysicsParams,
    elapsed_ms: f32,
    input: &TickInput,
) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    let size = grid.tile_size();

    // 1. Horizontal intent
    if input.left {
        player.vx = -params.move_speed;
    }
    if input.right {
        player.vx = params.move_speed;
    }

    // 2. Jump state machine
    let gravity = if input.jump_held && player.on_ground && player.jump_count == 0 {
        player.jump_count = 1;
        outcome.jumped = true;
        params.jump_impulse
    } else {
        if input.jump_held && player.jump_count > 0 {
            if player.jump_count == 1 {
                outcome.double_jumped = true;
            }
            player.jump_count = (player.jump_count + 1).min(2);
        }
        params.fall_gravity
    };
    player.gravity_speed += gravity;

    // 3. Hold windows
    if input.jump_pressed && player.hold_timer_ms < params.hold_cap_ms {
        match player.jump_count {
            1 => {
                player.hold_timer_ms += elapsed_ms;
                player.gravity_speed = player.gravity_speed.min(params.float_clamp);
            }
            2 => {
                player.hold_timer_ms += elapsed_ms;
                player.gravity_speed = 0.0;
            }
            _ => {}
        }
    }

    // 4. Terminal clamp + integrate
    player.gravity_speed = player.gravity_speed.min(params.terminal_gravity);
    player.vy += player.gravity_speed;

    // 5. Candidate position
    let dx = round3(player.vx);
    let mut new_x = player.x + dx;
    let mut new_y = player.y + round3(player.vy);

    // 6. Horizontal collision (old y). A box that does not move sideways
    // has no leading edge; probing x + size would catch the next column.
    if dx != 0.0 {
        let moving_left = dx < 0.0;
        let side = rules::probe_horizontal(grid, new_x, player.y, moving_left, params.edge_bias);
        if side.blocked {
            new_x = if moving_left {
                rules::snap_after(new_x, size)
            } else {
                rules::snap_before(new_x, size, params.snap_epsilon)
            };
            player.vx = 0.0;
        }
        if side.hazard {
            kill(player, &mut outcome);
        }
        if side.goal {
            player.won = true;
        }
    }

    // 7. Vertical collision (new x)
    let moving_up = player.vy < 0.0;
    let vert = rules::probe_vertical(grid, new_x, new_y, moving_up, params.edge_bias);
    if vert.blocked {
        player.vy = 0.0;
        if moving_up {
            new_y = rules::snap_after(new_y, size);
            player.gravity_speed = 0.0;
            player.on_ground = false;
        } else {
            new_y = rules::snap_before(new_y, size, params.snap_epsilon);
            player.jump_count = 0;
            player.gravity_speed = 0.0;
            player.hold_timer_ms = 0.0;
            outcome.landed = !player.on_ground;
            player.on_ground = true;
        }
    } else {
        player.on_ground = false;
    }
    if vert.hazard {
        kill(player, &mut outcome);
    }
    if vert.goal {
        player.won = true;
    }
    outcome.won = player.won;

    // 8. Friction
    player.vx *= params.friction;
    player.vy *= params.friction;

    // 9. Commit
    player.x = new_x;
    player.y = new_y;

    outcome
}

fn kill(player: &mut PlayerState, outcome: &mut StepOutcome) {
    if !player.dead {
        outcome.died = true;
    }
    player.dead = true;
    player.hold_timer_ms = 0.0;
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
