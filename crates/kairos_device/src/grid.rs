//! A serializable tile-grid snapshot.

use crate::types::Tile;
use crate::DeviceGrid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A device grid stored as a sparse list of tiles plus a position index.
///
/// The index is not serialized; call [`rebuild_index`](Self::rebuild_index)
/// after deserializing, or use [`from_tiles`](Self::from_tiles).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    /// Device series name.
    pub series: String,
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub cols: u32,
    /// All tiles. Positions without an entry have no tile.
    pub tiles: Vec<Tile>,
    #[serde(skip)]
    by_position: HashMap<(u32, u32), usize>,
}

impl TileGrid {
    /// Builds a grid and its position index.
    ///
    /// When two tiles share a position the later one wins.
    pub fn from_tiles(series: impl Into<String>, rows: u32, cols: u32, tiles: Vec<Tile>) -> Self {
        let mut grid = Self {
            series: series.into(),
            rows,
            cols,
            tiles,
            by_position: HashMap::new(),
        };
        grid.rebuild_index();
        grid
    }

    /// Rebuilds the position index from `tiles`.
    pub fn rebuild_index(&mut self) {
        self.by_position = self
            .tiles
            .iter()
            .enumerate()
            .map(|(i, t)| ((t.row, t.col), i))
            .collect();
    }

    /// Returns the tile at `(row, col)`.
    pub fn tile(&self, row: u32, col: u32) -> Option<&Tile> {
        self.by_position.get(&(row, col)).map(|&i| &self.tiles[i])
    }
}

impl DeviceGrid for TileGrid {
    fn series(&self) -> &str {
        &self.series
    }

    fn rows(&self) -> u32 {
        self.rows
    }

    fn cols(&self) -> u32 {
        self.cols
    }

    fn tile_type(&self, row: u32, col: u32) -> Option<&str> {
        self.tile(row, col).map(|t| t.type_name.as_str())
    }
}
