//! Device tile-grid model consumed by the interconnect delay estimator.
//!
//! The estimator only needs to know which kind of tile sits at each
//! (row, column) of the device so it can account for the extra delay of
//! wires crossing hard blocks such as block RAM, DSP, or clock rows.
//! [`DeviceGrid`] is the read-only collaborator interface; [`TileGrid`] is
//! a serializable snapshot implementing it.
//!
//! # Usage
//!
//! ```
//! use kairos_device::{DeviceGrid, Tile, TileClass, TileGrid};
//!
//! let grid = TileGrid::from_tiles(
//!     "ultrascaleplus",
//!     2,
//!     2,
//!     vec![Tile::new(1, 0, "BRAM"), Tile::new(1, 1, "CLEL_R")],
//! );
//! assert_eq!(grid.tile_class(1, 0), Some(TileClass::Bram));
//! assert_eq!(grid.tile_class(0, 0), None);
//! ```

#![warn(missing_docs)]

pub mod grid;
pub mod types;

pub use grid::TileGrid;
pub use types::{Tile, TileClass};

/// Read-only view of a device's tile grid.
///
/// Rows and columns are 0-based. Positions with no tile return `None`; a
/// tile whose type is `NULL` is present and classifies as
/// [`TileClass::Null`].
pub trait DeviceGrid: Send + Sync {
    /// Device series name, used to pick the delay data directory.
    fn series(&self) -> &str;

    /// Number of tile rows.
    fn rows(&self) -> u32;

    /// Number of tile columns.
    fn cols(&self) -> u32;

    /// The tile type name at `(row, col)`, if a tile exists there.
    fn tile_type(&self, row: u32, col: u32) -> Option<&str>;

    /// The resource class of the tile at `(row, col)`.
    fn tile_class(&self, row: u32, col: u32) -> Option<TileClass> {
        self.tile_type(row, col).map(TileClass::from_type_name)
    }
}
