//! CSV tile layouts that reference a tileset by id
//!
//! Tiled exports each tile layer as a CSV grid where every cell is a tile id
//! and `-1` marks an empty cell.

use crate::{Tileset, TilesetError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Cell value for an empty cell
pub const EMPTY_CELL: i64 = -1;

/// Cell size used by levels that do not specify one
pub const DEFAULT_CELL_SIZE: u32 = 64;

/// What to do when a layout references an id the tileset does not have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTilePolicy {
    /// Fail with [`TilesetError::UnknownTile`]
    #[default]
    Error,
    /// Leave the cell empty
    Skip,
    /// Draw this tile instead
    Placeholder(u32),
}

/// A grid of tile ids, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayout {
    pub width: usize,
    pub height: usize,
    cells: Vec<Option<u32>>,
}

/// A tile resolved to a position in the level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedTile {
    pub column: usize,
    pub row: usize,
    /// Id that is drawn (differs from the cell's id under a placeholder)
    pub id: u32,
    /// Top-left corner in pixels
    pub x: u32,
    pub y: u32,
}

impl TileLayout {
    /// Parse CSV text. Blank lines are ignored; short rows are padded with
    /// empty cells so the grid stays rectangular.
    pub fn parse_csv(text: &str) -> Result<Self, TilesetError> {
        let mut rows: Vec<Vec<Option<u32>>> = Vec::new();

        for (row, line) in text.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            let mut cells = Vec::new();
            for (column, raw) in line.split(',').enumerate() {
                let value = raw.trim();
                let invalid = || TilesetError::InvalidLayout {
                    row,
                    column,
                    value: value.to_string(),
                };
                let number: i64 = value.parse().map_err(|_| invalid())?;
                let cell = match number {
                    EMPTY_CELL => None,
                    n if n < 0 || n > u32::MAX as i64 => return Err(invalid()),
                    n => Some(n as u32),
                };
                cells.push(cell);
            }
            rows.push(cells);
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let height = rows.len();
        let mut cells = Vec::with_capacity(width * height);
        for mut row in rows {
            row.resize(width, None);
            cells.extend(row);
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Read a CSV layout file
    pub fn load(path: &Path) -> Result<Self, TilesetError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TilesetError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::parse_csv(&content)
    }

    /// Tile id at a cell, `None` when empty or out of bounds
    pub fn get(&self, column: usize, row: usize) -> Option<u32> {
        if column >= self.width || row >= self.height {
            return None;
        }
        self.cells[row * self.width + column]
    }

    /// Every distinct id the layout uses
    pub fn referenced_ids(&self) -> BTreeSet<u32> {
        self.cells.iter().flatten().copied().collect()
    }

    /// Ids the layout uses that `tileset` cannot draw
    pub fn missing_ids(&self, tileset: &Tileset) -> BTreeSet<u32> {
        self.referenced_ids()
            .into_iter()
            .filter(|&id| !tileset.contains(id))
            .collect()
    }

    /// Resolve every non-empty cell to a placed tile on a square grid
    pub fn placements(
        &self,
        tileset: &Tileset,
        cell_size: u32,
        policy: MissingTilePolicy,
    ) -> Result<Vec<PlacedTile>, TilesetError> {
        let mut placed = Vec::new();
        for row in 0..self.height {
            for column in 0..self.width {
                let Some(id) = self.get(column, row) else {
                    continue;
                };
                let id = if tileset.contains(id) {
                    id
                } else {
                    match policy {
                        MissingTilePolicy::Error => return Err(TilesetError::UnknownTile(id)),
                        MissingTilePolicy::Skip => {
                            log::debug!("Skipping unknown tile {} at ({}, {})", id, column, row);
                            continue;
                        }
                        MissingTilePolicy::Placeholder(substitute) => {
                            tileset.require(substitute)?;
                            substitute
                        }
                    }
                };
                let position = cell_offset(column, cell_size).zip(cell_offset(row, cell_size));
                let Some((x, y)) = position else {
                    return Err(TilesetError::GeometryOverflow(format!(
                        "cell ({}, {}) at {}px per cell",
                        column, row, cell_size
                    )));
                };
                placed.push(PlacedTile {
                    column,
                    row,
                    id,
                    x,
                    y,
                });
            }
        }
        Ok(placed)
    }
}

fn cell_offset(index: usize, cell_size: u32) -> Option<u32> {
    u32::try_from(index).ok()?.checked_mul(cell_size)
}
