/// Tile World: the immutable level grid and its point lookup.
///
/// Continuous (pixel) coordinates map to cells by flooring against the tile
/// size; cells are stored row-major.
///
/// ## Out-of-bounds policy
///
/// Every point outside the grid (negative, past the last row/column, or
/// non-finite) reads as `TileKind::Wall`: it blocks movement but is neither a
/// hazard nor the goal. Movement therefore always stops at the grid edge.

use std::fmt;

use thiserror::Error;

use super::tile::TileKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid must have at least one row and one column (got {columns}x{rows})")]
    ZeroSized { columns: usize, rows: usize },
    #[error("grid expects {expected} tiles ({columns}x{rows}) but got {found}")]
    SizeMismatch { columns: usize, rows: usize, expected: usize, found: usize },
    #[error("tile size must be a positive number of pixels (got {0})")]
    BadTileSize(f32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    columns: usize,
    rows: usize,
    tile_size: f32,
    tiles: Vec<TileKind>,
}

impl TileGrid {
    pub fn new(
        columns: usize,
        rows: usize,
        tile_size: f32,
        tiles: Vec<TileKind>,
    ) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::ZeroSized { columns, rows });
        }
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(GridError::BadTileSize(tile_size));
        }
        let expected = columns * rows;
        if tiles.len() != expected {
            return Err(GridError::SizeMismatch {
                columns, rows, expected,
                found: tiles.len(),
            });
        }
        Ok(TileGrid { columns, rows, tile_size, tiles })
    }

    pub fn columns(&self) -> usize { self.columns }
    pub fn rows(&self) -> usize { self.rows }
    pub fn tile_size(&self) -> f32 { self.tile_size }

    pub fn width_px(&self) -> f32 { self.columns as f32 * self.tile_size }
    pub fn height_px(&self) -> f32 { self.rows as f32 * self.tile_size }

    /// Tile under the pixel point (px, py).
    #[inline]
    pub fn tile_at(&self, px: f32, py: f32) -> TileKind {
        let col = (px / self.tile_size).floor();
        let row = (py / self.tile_size).floor();
        // NaN fails both comparisons, so non-finite points fall through to Wall.
        if !(col >= 0.0 && row >= 0.0) {
            return TileKind::Wall;
        }
        self.cell(col as usize, row as usize)
    }

    /// Tile at a grid cell; out of range = Wall.
    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> TileKind {
        if col < self.columns && row < self.rows {
            self.tiles[row * self.columns + col]
        } else {
            TileKind::Wall
        }
    }

    /// All cells as `(col, row, tile)`, row-major.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, TileKind)> + '_ {
        let columns = self.columns;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, &t)| (i % columns, i / columns, t))
    }
}

/// The grid in level-file glyphs, one line per row.
impl fmt::Display for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            if row > 0 {
                writeln!(f)?;
            }
            for col in 0..self.columns {
                write!(f, "{}", self.cell(col, row).to_glyph())?;
            }
        }
        Ok(())
    }
}
