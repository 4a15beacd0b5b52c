//! Tile records and the resource classes the delay model distinguishes.

use serde::{Deserialize, Serialize};

/// The coarse class of a tile, as far as interconnect delay is concerned.
///
/// Wires that cross a hard-block column or a clock row are slower than
/// wires spanning plain logic tiles; each class below carries its own
/// crossing penalty in the interconnect delay terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileClass {
    /// Horizontal clock distribution row.
    Rclk,
    /// DSP column.
    Dsp,
    /// Block RAM column.
    Bram,
    /// Configuration frame column.
    Cfrm,
    /// UltraRAM column.
    Uram,
    /// PCIe, Interlaken, CMAC and configuration blocks.
    Pcie,
    /// High-performance I/O column.
    Io,
    /// A `NULL` placeholder tile.
    Null,
    /// Logic, interconnect, and anything else without a crossing penalty.
    Other,
}

impl TileClass {
    /// Classifies a tile by its type name.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "RCLK_INT_L" | "RCLK_INT_R" => TileClass::Rclk,
            "DSP" | "DSP_TERM_T" => TileClass::Dsp,
            "BRAM" | "BRAM_L" | "BRAM_R" | "BRAM_TERM_T" => TileClass::Bram,
            "CFRM_CONFIG" | "CFRM_AMS_CFGIO" | "CFRM_T" | "CFRM_B" => TileClass::Cfrm,
            "URAM_URAM_FT" | "URAM_URAM_DELAY_FT" | "URAM_URAM_TERM_T_FT" => TileClass::Uram,
            "PCIE4_PCIE4_FT" | "ILKN_ILKN_FT" | "CFG_CONFIG" | "CMAC" | "CFGIO_IOB20" => {
                TileClass::Pcie
            }
            "HPIO_L" | "HPIO_L_TERM_T" => TileClass::Io,
            "NULL" => TileClass::Null,
            _ => TileClass::Other,
        }
    }
}

/// One tile of the device grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Row index (0-based).
    pub row: u32,
    /// Column index (0-based).
    pub col: u32,
    /// Vendor tile type name, e.g. `"CLEL_R"` or `"RCLK_INT_L"`.
    pub type_name: String,
}

impl Tile {
    /// Creates a tile record.
    pub fn new(row: u32, col: u32, type_name: impl Into<String>) -> Self {
        Self {
            row,
            col,
            type_name: type_name.into(),
        }
    }

    /// The resource class of this tile.
    pub fn class(&self) -> TileClass {
        TileClass::from_type_name(&self.type_name)
    }
}
