/// Level loader.
///
/// ## Sources (priority order):
///   1. `general.level_file` from config.toml
///   2. Built-in embedded level
///
/// ## Level format (`.txt`):
///   Optional header lines, then a rectangular block of tile rows.
///   ```
///   # Level Name
///   @ 70,60
///   = 12
///   ################
///   #..............#
///   #######^^......#
///   ```
///   `# Name`  — display name (`#` followed by whitespace)
///   `@ x,y`   — spawn point in pixels (top-left of the player box)
///   `= size`  — tile size in pixels (default from the caller)
///
///   Leading/trailing whitespace on every line is ignored, blank lines are
///   skipped. Width and height come from the block itself.
///
/// ## Tile legend:
///   '.' = Empty        '#' = Wall
///   '^' = Hazard (up)  'v' = Hazard (down)   'ˆ' = Hazard (up, legacy)
///   '$' = Goal
///
/// Anything else is rejected at load time: a level either parses completely
/// or not at all.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::grid::{GridError, TileGrid};
use crate::domain::tile::TileKind;

/// Tile size of the embedded level and of files without a `=` line.
pub const DEFAULT_TILE_SIZE: f32 = 12.0;

/// Inset used when checking that the spawn box is free.
const SPAWN_INSET: f32 = 1.0;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no tile rows")]
    Empty,
    #[error("row {row} is {found} tiles wide, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("unknown glyph {glyph:?} at row {row}, column {col}")]
    UnknownGlyph { row: usize, col: usize, glyph: char },
    #[error("malformed header on line {line}: {text:?}")]
    BadMetadata { line: usize, text: String },
    #[error("spawn ({x}, {y}) lies outside the level")]
    SpawnOutOfBounds { x: f32, y: f32 },
    #[error("spawn ({x}, {y}) overlaps a solid tile")]
    SpawnBlocked { x: f32, y: f32 },
    #[error("level has no empty tile to spawn on")]
    NoSpawn,
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("could not read level {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A parsed, validated level.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub grid: TileGrid,
    pub spawn: (f32, f32),
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the configured level, or the embedded one when none is configured.
pub fn load_level(level_file: Option<&Path>) -> Result<Level, LevelError> {
    let level = match level_file {
        Some(path) => load_level_file(path)?,
        None => embedded_level()?,
    };
    log::info!(
        "level {:?}: {}x{} tiles of {}px, spawn {:?}",
        level.name,
        level.grid.columns(),
        level.grid.rows(),
        level.grid.tile_size(),
        level.spawn,
    );
    log::trace!("level layout:\n{}", level.grid);
    Ok(level)
}

/// Read and parse a level file. Unnamed levels take the file stem as name.
pub fn load_level_file(path: &Path) -> Result<Level, LevelError> {
    let content = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut level = parse_level(&content, DEFAULT_TILE_SIZE)?;
    if level.name.is_empty() {
        level.name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
    }
    Ok(level)
}

/// Parse level text. `tile_size` applies unless the text carries a `=` line.
pub fn parse_level(content: &str, tile_size: f32) -> Result<Level, LevelError> {
    let mut name = String::new();
    let mut spawn: Option<(f32, f32)> = None;
    let mut size = tile_size;
    let mut rows: Vec<&str> = vec![];

    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_name_line(line) {
            name = line[1..].trim().to_string();
        } else if let Some(rest) = line.strip_prefix('@') {
            spawn = Some(parse_pair(rest).ok_or_else(|| bad_meta(i, line))?);
        } else if let Some(rest) = line.strip_prefix('=') {
            size = rest.trim().parse::<f32>().map_err(|_| bad_meta(i, line))?;
        } else {
            rows.push(line);
        }
    }

    let grid = parse_rows(&rows, size)?;
    let spawn = match spawn {
        Some(s) => {
            check_spawn(&grid, s)?;
            s
        }
        None => first_empty_cell(&grid).ok_or(LevelError::NoSpawn)?,
    };

    Ok(Level { name, grid, spawn })
}

/// The built-in level: a room with a spike pit, a hanging
/// spike and the goal at the bottom left.
pub fn embedded_level() -> Result<Level, LevelError> {
    parse_level(EMBEDDED, DEFAULT_TILE_SIZE)
}

// ══════════════════════════════════════════════════════════════
// Internal
// ══════════════════════════════════════════════════════════════

fn parse_rows(rows: &[&str], size: f32) -> Result<TileGrid, LevelError> {
    let first = rows.first().ok_or(LevelError::Empty)?;
    let columns = first.chars().count();
    let mut tiles = Vec::with_capacity(columns * rows.len());

    for (row, line) in rows.iter().enumerate() {
        let found = line.chars().count();
        if found != columns {
            return Err(LevelError::Ragged { row, expected: columns, found });
        }
        for (col, glyph) in line.chars().enumerate() {
            let tile = TileKind::from_glyph(glyph)
                .ok_or(LevelError::UnknownGlyph { row, col, glyph })?;
            tiles.push(tile);
        }
    }

    Ok(TileGrid::new(columns, rows.len(), size, tiles)?)
}

/// Distinguish `# Level Name` from `#####...#` (level data).
/// Tile rows never contain whitespace once trimmed.
fn is_name_line(line: &str) -> bool {
    line.starts_with('#') && line[1..].starts_with(char::is_whitespace)
}

fn parse_pair(s: &str) -> Option<(f32, f32)> {
    let (x, y) = s.trim().split_once(',')?;
    let x = x.trim().parse::<f32>().ok()?;
    let y = y.trim().parse::<f32>().ok()?;
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

fn bad_meta(index: usize, line: &str) -> LevelError {
    LevelError::BadMetadata { line: index + 1, text: line.to_string() }
}

fn check_spawn(grid: &TileGrid, (x, y): (f32, f32)) -> Result<(), LevelError> {
    let size = grid.tile_size();
    if x < 0.0 || y < 0.0 || x + size > grid.width_px() || y + size > grid.height_px() {
        return Err(LevelError::SpawnOutOfBounds { x, y });
    }
    let (near, far) = (SPAWN_INSET, size - SPAWN_INSET);
    let blocked = [(near, near), (far, near), (near, far), (far, far)]
        .iter()
        .any(|&(dx, dy)| grid.tile_at(x + dx, y + dy).is_blocking());
    if blocked {
        return Err(LevelError::SpawnBlocked { x, y });
    }
    Ok(())
}

fn first_empty_cell(grid: &TileGrid) -> Option<(f32, f32)> {
    let size = grid.tile_size();
    grid.iter_cells()
        .find(|&(_, _, t)| t == TileKind::Empty)
        .map(|(col, row, _)| (col as f32 * size, row as f32 * size))
}

// ══════════════════════════════════════════════════════════════
// Embedded level
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &str = "
# Spike Pit
@ 70,60
################################
################################
################################
#####......................#####
#####......................#####
#####......................#####
#####......................#####
#####......................#####
##################^^.......#####
##########v#########.......#####
#####......................#####
#####......................#####
#####......................#####
#####......................#####
#####.$....................#####
################################
################################
################################
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_level_parses() {
        let level = embedded_level().unwrap();
        assert_eq!(level.name, "Spike Pit");
        assert_eq!(level.grid.columns(), 32);
        assert_eq!(level.grid.rows(), 18);
        assert_eq!(level.grid.tile_size(), 12.0);
        assert_eq!(level.spawn, (70.0, 60.0));
        assert_eq!(level.grid.cell(18, 8), TileKind::HazardUp);
        assert_eq!(level.grid.cell(10, 9), TileKind::HazardDown);
        assert_eq!(level.grid.cell(6, 14), TileKind::Goal);
    }

    #[test]
    fn parses_block_with_indentation_and_header() {
        let text = "
            # Tiny
            = 10
            @ 15,10
            #####
            #.$.#
            #####
        ";
        let level = parse_level(text, 12.0).unwrap();
        assert_eq!(level.name, "Tiny");
        assert_eq!(level.grid.tile_size(), 10.0);
        assert_eq!(level.spawn, (15.0, 10.0));
        assert_eq!(level.grid.cell(2, 1), TileKind::Goal);
    }

    #[test]
    fn data_row_with_spikes_is_not_a_name() {
        let level = parse_level("#v#\n#.#\n###", 10.0).unwrap();
        assert_eq!(level.name, "");
        assert_eq!(level.grid.rows(), 3);
        assert_eq!(level.grid.cell(1, 0), TileKind::HazardDown);
    }

    #[test]
    fn legacy_caret_is_a_hazard() {
        let level = parse_level("....\n#ˆˆ#", 10.0).unwrap();
        assert_eq!(level.grid.columns(), 4);
        assert_eq!(level.grid.cell(1, 1), TileKind::HazardUp);
    }

    #[test]
    fn spawn_defaults_to_first_empty_cell() {
        let level = parse_level("###\n#..\n###", 10.0).unwrap();
        assert_eq!(level.spawn, (10.0, 10.0));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = parse_level("####\n#..\n####", 10.0).unwrap_err();
        assert!(matches!(err, LevelError::Ragged { row: 1, expected: 4, found: 3 }), "{err}");
    }

    #[test]
    fn rejects_unknown_glyph() {
        let err = parse_level("###\n#x#\n###", 10.0).unwrap_err();
        assert!(matches!(err, LevelError::UnknownGlyph { row: 1, col: 1, glyph: 'x' }), "{err}");
    }

    #[test]
    fn rejects_empty_text() {
        assert!(matches!(parse_level("", 10.0), Err(LevelError::Empty)));
        assert!(matches!(parse_level("# Only a name\n\n", 10.0), Err(LevelError::Empty)));
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(
            parse_level("@ 1;2\n...", 10.0),
            Err(LevelError::BadMetadata { line: 1, .. })
        ));
        assert!(matches!(
            parse_level("...\n= big", 10.0),
            Err(LevelError::BadMetadata { line: 2, .. })
        ));
        assert!(matches!(
            parse_level("= 0\n...", 10.0),
            Err(LevelError::Grid(GridError::BadTileSize(_)))
        ));
    }

    #[test]
    fn rejects_bad_spawns() {
        assert!(matches!(
            parse_level("@ 25,0\n...", 10.0),
            Err(LevelError::SpawnOutOfBounds { .. })
        ));
        assert!(matches!(
            parse_level("@ 15,0\n..#", 10.0),
            Err(LevelError::SpawnBlocked { .. })
        ));
        assert!(matches!(parse_level("###", 10.0), Err(LevelError::NoSpawn)));
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = parse_level("###\n#?#", 10.0).unwrap_err();
        assert_eq!(err.to_string(), "unknown glyph '?' at row 1, column 1");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_level_file(Path::new("/nonexistent/ledgehop/level.txt")).unwrap_err();
        assert!(matches!(err, LevelError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/ledgehop/level.txt"));
    }
}
