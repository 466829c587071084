/// Collision rules: axis-separated probes and boundary snapping.
///
/// Pure functions over the tile grid. They answer "what does the player's
/// leading edge touch" and "where does a blocked edge come to rest" without
/// mutating anything; `physics::step_player` applies the results.
///
/// ## Probe layout
///
/// The player box is one tile square, top-left at (x, y). Each axis samples
/// two points on the leading edge, pulled 1px (`bias`) inward along the
/// other axis so that a box resting exactly on a tile boundary does not
/// catch the neighbouring row/column:
///
/// ```text
///   Horizontal (at OLD y)          Vertical (at NEW x)
///   ┌────────┐                     ┌─●────●─┐  ← up: edge y
///   ●        ●  ← y + bias         │        │
///   │        │                     │        │
///   ●        ●  ← y + size - bias  └─●────●─┘  ← down: edge y + size
///   ↑left    ↑right                  x+bias  x+size-bias
/// ```
///
/// ## Snapping
///
/// | Direction | Blocked edge ends at                 |
/// |-----------|--------------------------------------|
/// | left/up   | `floor(pos/size)*size + size`        |
/// | right/down| `floor(pos/size)*size - epsilon`     |

use super::grid::TileGrid;
use super::tile::TileKind;

/// What a pair of edge samples touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Contact {
    pub blocked: bool,
    pub hazard: bool,
    pub goal: bool,
}

impl Contact {
    pub fn from_samples(first: TileKind, last: TileKind) -> Self {
        Contact {
            blocked: first.is_blocking() || last.is_blocking(),
            hazard: first.is_hazard() || last.is_hazard(),
            goal: first.is_goal() || last.is_goal(),
        }
    }
}

/// Sample the leading vertical edge of a box at `new_x`, rows taken at `y`.
pub fn probe_horizontal(grid: &TileGrid, new_x: f32, y: f32, moving_left: bool, bias: f32) -> Contact {
    let size = grid.tile_size();
    let edge_x = if moving_left { new_x } else { new_x + size };
    Contact::from_samples(
        grid.tile_at(edge_x, y + bias),
        grid.tile_at(edge_x, y + size - bias),
    )
}

/// Sample the leading horizontal edge of a box at `new_y`, columns taken at `x`.
pub fn probe_vertical(grid: &TileGrid, x: f32, new_y: f32, moving_up: bool, bias: f32) -> Contact {
    let size = grid.tile_size();
    let edge_y = if moving_up { new_y } else { new_y + size };
    Contact::from_samples(
        grid.tile_at(x + bias, edge_y),
        grid.tile_at(x + size - bias, edge_y),
    )
}

/// Resting coordinate after hitting a tile while moving left/up.
#[inline]
pub fn snap_after(pos: f32, size: f32) -> f32 {
    (pos / size).floor() * size + size
}

/// Resting coordinate after hitting a tile while moving right/down.
#[inline]
pub fn snap_before(pos: f32, size: f32, epsilon: f32) -> f32 {
    (pos / size).floor() * size - epsilon
}
