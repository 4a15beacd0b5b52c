//! Per-column and per-row resource-crossing tables.
//!
//! Wires that cross a hard-block column (BRAM, DSP, I/O, ...) or a clock
//! row are slower than wires spanning plain logic tiles. [`DistanceTables`]
//! precomputes the crossing penalty of every column and row once per device,
//! so the `d` term of a wire group is a range sum.

use crate::group::GroupDelayType;
use crate::terms::InterconnectTerms;
use kairos_device::{DeviceGrid, TileClass};

/// Crossing penalties of one axis, one array per wire class.
#[derive(Debug, Clone, Default, PartialEq)]
struct AxisTables {
    single: Vec<f64>,
    double: Vec<f64>,
    quad: Vec<f64>,
    long: Vec<f64>,
}

impl AxisTables {
    fn zeros(len: usize) -> Self {
        Self {
            single: vec![0.0; len],
            double: vec![0.0; len],
            quad: vec![0.0; len],
            long: vec![0.0; len],
        }
    }

    fn set(&mut self, i: usize, terms: &InterconnectTerms, class: TileClass) {
        if let Some(c) = terms.crossing(class) {
            self.single[i] = c.single_and_double;
            self.double[i] = c.single_and_double;
            self.quad[i] = c.quad;
            self.long[i] = c.long;
        }
    }

    fn array(&self, ty: GroupDelayType) -> Option<&[f64]> {
        match ty {
            GroupDelayType::Single => Some(&self.single),
            GroupDelayType::Double => Some(&self.double),
            GroupDelayType::Quad => Some(&self.quad),
            GroupDelayType::Long => Some(&self.long),
            _ => None,
        }
    }

    fn sum(&self, lo: u32, hi: u32, ty: GroupDelayType) -> f64 {
        let Some(arr) = self.array(ty) else {
            return 0.0;
        };
        if lo > hi || arr.is_empty() {
            return 0.0;
        }
        let lo = lo as usize;
        let hi = (hi as usize).min(arr.len() - 1);
        if lo > hi {
            return 0.0;
        }
        arr[lo..=hi].iter().sum()
    }
}

/// Crossing-penalty lookup tables for one device.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTables {
    horizontal: AxisTables,
    vertical: AxisTables,
}

impl DistanceTables {
    /// Builds the tables from a device grid.
    ///
    /// Columns take the class of their first non-`NULL` tile at or above
    /// `start_tile_row`. Row `i` takes the class of the tile at
    /// `(i + 1, start_tile_col)`, and only clock rows contribute.
    pub fn build(grid: &dyn DeviceGrid, terms: &InterconnectTerms) -> Self {
        let cols = grid.cols() as usize;
        let rows = grid.rows() as usize;

        let mut horizontal = AxisTables::zeros(cols);
        for col in 0..grid.cols() {
            let good = (terms.start_tile_row..grid.rows())
                .filter_map(|row| grid.tile_class(row, col))
                .find(|class| *class != TileClass::Null);
            if let Some(class) = good {
                horizontal.set(col as usize, terms, class);
            }
        }

        let mut vertical = AxisTables::zeros(rows);
        for row in 0..grid.rows() {
            if grid.tile_class(row + 1, terms.start_tile_col) == Some(TileClass::Rclk) {
                vertical.set(row as usize, terms, TileClass::Rclk);
            }
        }

        log::trace!("built distance tables for {cols} columns and {rows} rows");
        Self {
            horizontal,
            vertical,
        }
    }

    /// Sum of column penalties over `lo..=hi` for a wire class.
    ///
    /// Classes other than single, double, quad and long return 0, as does
    /// an empty range. The range is clamped to the device.
    pub fn horizontal_distance(&self, lo: u32, hi: u32, ty: GroupDelayType) -> f64 {
        self.horizontal.sum(lo, hi, ty)
    }

    /// Sum of row penalties over `lo..=hi` for a wire class.
    pub fn vertical_distance(&self, lo: u32, hi: u32, ty: GroupDelayType) -> f64 {
        self.vertical.sum(lo, hi, ty)
    }

    /// Number of columns covered.
    pub fn cols(&self) -> usize {
        self.horizontal.single.len()
    }

    /// Number of rows covered.
    pub fn rows(&self) -> usize {
        self.vertical.single.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kairos_device::{Tile, TileGrid};

    fn terms() -> InterconnectTerms {
        InterconnectTerms {
            start_tile_row: 1,
            start_tile_col: 2,
            ..InterconnectTerms::default()
        }
    }

    /// Five columns: CLE, BRAM (NULL in row 1), CLE, DSP, HPIO.
    /// Column 2 carries a clock row at row 3.
    fn grid() -> TileGrid {
        let mut tiles = Vec::new();
        for row in 0..5 {
            tiles.push(Tile::new(row, 0, "CLEL_R"));
            tiles.push(Tile::new(row, 1, if row == 1 { "NULL" } else { "BRAM" }));
            tiles.push(Tile::new(row, 2, if row == 3 { "RCLK_INT_L" } else { "INT" }));
            tiles.push(Tile::new(row, 3, "DSP"));
            tiles.push(Tile::new(row, 4, "HPIO_L"));
        }
        TileGrid::from_tiles("test", 5, 5, tiles)
    }

    #[test]
    fn horizontal_sums_crossings() {
        let t = DistanceTables::build(&grid(), &terms());
        assert_eq!(t.cols(), 5);
        assert_eq!(t.horizontal_distance(0, 2, GroupDelayType::Single), 16.0);
        assert_eq!(t.horizontal_distance(0, 4, GroupDelayType::Quad), 16.0 + 3.0 + 68.0);
        assert_eq!(t.horizontal_distance(3, 4, GroupDelayType::Long), 3.0 + 186.0);
    }

    #[test]
    fn null_tiles_are_skipped_for_good_row() {
        let t = DistanceTables::build(&grid(), &terms());
        assert_eq!(t.horizontal_distance(1, 1, GroupDelayType::Double), 16.0);
    }

    #[test]
    fn vertical_counts_only_clock_rows() {
        let t = DistanceTables::build(&grid(), &terms());
        // Row 2 looks at tile (3, 2), the clock row.
        assert_eq!(t.vertical_distance(2, 2, GroupDelayType::Single), 3.0);
        assert_eq!(t.vertical_distance(0, 4, GroupDelayType::Long), 3.0);
        assert_eq!(t.vertical_distance(3, 4, GroupDelayType::Long), 0.0);
    }

    #[test]
    fn empty_or_unsupported_ranges_are_zero() {
        let t = DistanceTables::build(&grid(), &terms());
        assert_eq!(t.horizontal_distance(3, 1, GroupDelayType::Single), 0.0);
        assert_eq!(t.horizontal_distance(0, 4, GroupDelayType::Global), 0.0);
        assert_eq!(t.horizontal_distance(0, 4, GroupDelayType::Internal), 0.0);
        assert_eq!(t.horizontal_distance(9, 12, GroupDelayType::Single), 0.0);
    }

    #[test]
    fn range_is_clamped() {
        let t = DistanceTables::build(&grid(), &terms());
        assert_eq!(
            t.horizontal_distance(3, 100, GroupDelayType::Single),
            t.horizontal_distance(3, 4, GroupDelayType::Single)
        );
    }
}
