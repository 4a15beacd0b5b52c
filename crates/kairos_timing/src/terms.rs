//! Interconnect delay terms read from `intersite_delay_terms.txt`.
//!
//! The file holds one `NAME value` pair per line. Names are matched
//! case-insensitively; an unknown name is fatal. Terms not present in the
//! file keep the reference values of [`InterconnectTerms::default`].

use crate::error::DataError;
use kairos_common::ContentHash;
use kairos_device::TileClass;
use std::path::Path;

/// Extra delay for crossing one tile of a given class, per wire class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingTerms {
    /// Singles and doubles.
    pub single_and_double: f64,
    /// Quads.
    pub quad: f64,
    /// Longs.
    pub long: f64,
}

impl CrossingTerms {
    const fn uniform(v: f64) -> Self {
        Self {
            single_and_double: v,
            quad: v,
            long: v,
        }
    }
}

/// Coefficients of the `k0 + k1 * L + k2 * d` interconnect delay model,
/// plus the fixed site-pin, intra-site and logic delays used alongside it.
///
/// All delays are in picoseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct InterconnectTerms {
    /// First row scanned when picking a representative tile per column.
    pub start_tile_row: u32,
    /// Column whose tiles define vertical crossing penalties.
    pub start_tile_col: u32,

    /// `INTRASITE_DELAY_SITEPIN_TO_LUT_INPUT`.
    pub sitepin_to_lut_input: f64,
    /// `INTRASITE_DELAY_LUT_OUTPUT_TO_O_SITEPIN`.
    pub lut_output_to_o_sitepin: f64,
    /// `INTRASITE_DELAY_SITEPIN_TO_FF_INPUT`.
    pub sitepin_to_ff_input: f64,
    /// `INTRASITE_DELAY_FF_INPUT_TO_SITEPIN`.
    pub ff_input_to_sitepin: f64,
    /// `INTRASITE_DELAY_LUT_OUTPUT_TO_FF_INPUT`.
    pub lut_output_to_ff_input: f64,
    /// `INTRASITE_DELAY_LUT_OUTPUT_TO_MUX_SITEPIN`.
    pub lut_output_to_mux_sitepin: f64,
    /// `BOUNCE_DELAY`.
    pub bounce_delay: f64,

    /// `L_HORIZONTAL_BOUNCE`.
    pub l_horizontal_bounce: f64,
    /// `L_HORIZONTAL_INTERNAL`.
    pub l_horizontal_internal: f64,
    /// `L_HORIZONTAL_SINGLE`.
    pub l_horizontal_single: f64,
    /// `L_HORIZONTAL_DOUBLE`.
    pub l_horizontal_double: f64,
    /// `L_HORIZONTAL_QUAD`.
    pub l_horizontal_quad: f64,
    /// `L_HORIZONTAL_LONG`.
    pub l_horizontal_long: f64,
    /// `L_HORIZONTAL_GLOBAL`.
    pub l_horizontal_global: f64,
    /// `L_VERTICAL_SINGLE`.
    pub l_vertical_single: f64,
    /// `L_VERTICAL_DOUBLE`.
    pub l_vertical_double: f64,
    /// `L_VERTICAL_QUAD`.
    pub l_vertical_quad: f64,
    /// `L_VERTICAL_LONG`.
    pub l_vertical_long: f64,

    /// `K0_HORIZONTAL`.
    pub k0_horizontal: f64,
    /// `K1_HORIZONTAL`.
    pub k1_horizontal: f64,
    /// `K2_HORIZONTAL_SINGLE`.
    pub k2_horizontal_single: f64,
    /// `K2_HORIZONTAL_DOUBLE`.
    pub k2_horizontal_double: f64,
    /// `K2_HORIZONTAL_QUAD`.
    pub k2_horizontal_quad: f64,
    /// `K2_HORIZONTAL_LONG`.
    pub k2_horizontal_long: f64,
    /// `K2_HORIZONTAL_GLOBAL`.
    pub k2_horizontal_global: f64,
    /// `K0_VERTICAL`.
    pub k0_vertical: f64,
    /// `K1_VERTICAL`.
    pub k1_vertical: f64,
    /// `K2_VERTICAL_SINGLE`.
    pub k2_vertical_single: f64,
    /// `K2_VERTICAL_DOUBLE`.
    pub k2_vertical_double: f64,
    /// `K2_VERTICAL_QUAD`.
    pub k2_vertical_quad: f64,
    /// `K2_VERTICAL_LONG`.
    pub k2_vertical_long: f64,

    /// `RCLK_*` crossing terms.
    pub rclk: CrossingTerms,
    /// `DSP_*` crossing terms.
    pub dsp: CrossingTerms,
    /// `BRAM_*` crossing terms.
    pub bram: CrossingTerms,
    /// `CFRM_*` crossing terms.
    pub cfrm: CrossingTerms,
    /// `URAM_*` crossing terms.
    pub uram: CrossingTerms,
    /// `PCIE_*` crossing terms.
    pub pcie: CrossingTerms,
    /// `IO_*` crossing terms.
    pub io: CrossingTerms,

    /// Clock-to-out of a flip-flop, charged on its output nets.
    pub logic_ff_delay: f64,
    /// `CARRY_CO_DELAY`.
    pub carry_co_delay: f64,
    /// `LOGIC_LUT_A1_DELAY` through `LOGIC_LUT_A6_DELAY`.
    pub logic_lut_delay: [f64; 6],
    /// `SITEPIN_A1_DELAY` through `SITEPIN_A6_DELAY`.
    pub sitepin_delay: [f64; 6],
    /// `SITEPIN_A_I_DELAY`.
    pub sitepin_a_i_delay: f64,
    /// `SITEPIN_AX_DELAY`.
    pub sitepin_ax_delay: f64,

    /// `NEAR_MIN`.
    pub near_min: u32,
    /// `NEAR_MAX`.
    pub near_max: u32,
    /// `MID_MIN`.
    pub mid_min: u32,
    /// `MID_MAX`.
    pub mid_max: u32,
    /// `FAR_MIN`.
    pub far_min: u32,
    /// `FAR_MAX`.
    pub far_max: u32,

    /// Hash of the file the terms were read from, if any.
    pub source_hash: Option<ContentHash>,
    /// Number of terms the file set.
    pub terms_read: usize,
}

impl Default for InterconnectTerms {
    fn default() -> Self {
        Self {
            start_tile_row: 1,
            start_tile_col: 52,
            sitepin_to_lut_input: 0.0,
            lut_output_to_o_sitepin: 0.0,
            sitepin_to_ff_input: 100.0,
            ff_input_to_sitepin: 0.0,
            lut_output_to_ff_input: 48.0,
            lut_output_to_mux_sitepin: 60.0,
            bounce_delay: 46.0,
            l_horizontal_bounce: 0.0,
            l_horizontal_internal: 0.0,
            l_horizontal_single: 1.0,
            l_horizontal_double: 2.0,
            l_horizontal_quad: 6.0,
            l_horizontal_long: 12.0,
            l_horizontal_global: 15.0,
            l_vertical_single: 1.0,
            l_vertical_double: 3.0,
            l_vertical_quad: 6.0,
            l_vertical_long: 12.0,
            k0_horizontal: 46.0,
            k1_horizontal: 4.5,
            k2_horizontal_single: 2.4,
            k2_horizontal_double: 2.4,
            k2_horizontal_quad: 2.9,
            k2_horizontal_long: 1.2,
            k2_horizontal_global: 2.4,
            k0_vertical: 43.0,
            k1_vertical: 3.7,
            k2_vertical_single: 14.5,
            k2_vertical_double: 5.6,
            k2_vertical_quad: 9.5,
            k2_vertical_long: 4.0,
            rclk: CrossingTerms::uniform(3.0),
            dsp: CrossingTerms::uniform(3.0),
            bram: CrossingTerms::uniform(16.0),
            cfrm: CrossingTerms::uniform(33.0),
            uram: CrossingTerms::uniform(34.0),
            pcie: CrossingTerms::uniform(62.0),
            io: CrossingTerms {
                single_and_double: 86.0,
                quad: 68.0,
                long: 186.0,
            },
            logic_ff_delay: 78.0,
            carry_co_delay: 216.0,
            logic_lut_delay: [150.0, 125.0, 100.0, 90.0, 53.0, 38.0],
            sitepin_delay: [74.0, 53.0, 48.0, 44.0, 44.0, 43.0],
            sitepin_a_i_delay: 65.0,
            sitepin_ax_delay: 65.0,
            near_min: 1,
            near_max: 2,
            mid_min: 4,
            mid_max: 4,
            far_min: 12,
            far_max: 12,
            source_hash: None,
            terms_read: 0,
        }
    }
}

enum Slot<'a> {
    Delay(&'a mut f64),
    Count(&'a mut u32),
}

impl InterconnectTerms {
    /// Reads terms from a file, starting from the reference values.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text, path)
    }

    /// Parses terms text. `origin` names the source in error messages.
    pub fn from_text(text: &str, origin: impl AsRef<Path>) -> Result<Self, DataError> {
        let origin = origin.as_ref();
        let mut terms = Self {
            source_hash: Some(ContentHash::from_bytes(text.as_bytes())),
            ..Self::default()
        };
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let mut tokens = line.split_whitespace();
            let Some(name) = tokens.next() else {
                continue;
            };
            if name.starts_with('#') {
                continue;
            }
            let Some(raw) = tokens.next() else {
                return Err(DataError::Parse {
                    path: origin.to_path_buf(),
                    line: line_no,
                    message: format!("term '{name}' has no value"),
                });
            };
            let value: f64 = raw.parse().map_err(|_| DataError::Parse {
                path: origin.to_path_buf(),
                line: line_no,
                message: format!("invalid value '{raw}' for term '{name}'"),
            })?;
            match terms.slot(&name.to_ascii_uppercase()) {
                Some(Slot::Delay(v)) => *v = value,
                Some(Slot::Count(v)) => *v = value.max(0.0).floor() as u32,
                None => {
                    return Err(DataError::UnknownTerm {
                        path: origin.to_path_buf(),
                        line: line_no,
                        name: name.to_string(),
                    })
                }
            }
            terms.terms_read += 1;
        }
        Ok(terms)
    }

    fn slot(&mut self, name: &str) -> Option<Slot<'_>> {
        use Slot::{Count, Delay};
        let slot = match name {
            "START_TILE_ROW" => Count(&mut self.start_tile_row),
            "START_TILE_COL" => Count(&mut self.start_tile_col),
            "INTRASITE_DELAY_SITEPIN_TO_LUT_INPUT" => Delay(&mut self.sitepin_to_lut_input),
            "INTRASITE_DELAY_LUT_OUTPUT_TO_O_SITEPIN" => Delay(&mut self.lut_output_to_o_sitepin),
            "INTRASITE_DELAY_SITEPIN_TO_FF_INPUT" => Delay(&mut self.sitepin_to_ff_input),
            "INTRASITE_DELAY_FF_INPUT_TO_SITEPIN" => Delay(&mut self.ff_input_to_sitepin),
            "INTRASITE_DELAY_LUT_OUTPUT_TO_FF_INPUT" => Delay(&mut self.lut_output_to_ff_input),
            "INTRASITE_DELAY_LUT_OUTPUT_TO_MUX_SITEPIN" => {
                Delay(&mut self.lut_output_to_mux_sitepin)
            }
            "BOUNCE_DELAY" => Delay(&mut self.bounce_delay),
            "L_HORIZONTAL_BOUNCE" => Delay(&mut self.l_horizontal_bounce),
            "L_HORIZONTAL_INTERNAL" => Delay(&mut self.l_horizontal_internal),
            "L_HORIZONTAL_SINGLE" => Delay(&mut self.l_horizontal_single),
            "L_HORIZONTAL_DOUBLE" => Delay(&mut self.l_horizontal_double),
            "L_HORIZONTAL_QUAD" => Delay(&mut self.l_horizontal_quad),
            "L_HORIZONTAL_LONG" => Delay(&mut self.l_horizontal_long),
            "L_HORIZONTAL_GLOBAL" => Delay(&mut self.l_horizontal_global),
            "L_VERTICAL_SINGLE" => Delay(&mut self.l_vertical_single),
            "L_VERTICAL_DOUBLE" => Delay(&mut self.l_vertical_double),
            "L_VERTICAL_QUAD" => Delay(&mut self.l_vertical_quad),
            "L_VERTICAL_LONG" => Delay(&mut self.l_vertical_long),
            "K0_HORIZONTAL" => Delay(&mut self.k0_horizontal),
            "K1_HORIZONTAL" => Delay(&mut self.k1_horizontal),
            "K2_HORIZONTAL_SINGLE" => Delay(&mut self.k2_horizontal_single),
            "K2_HORIZONTAL_DOUBLE" => Delay(&mut self.k2_horizontal_double),
            "K2_HORIZONTAL_QUAD" => Delay(&mut self.k2_horizontal_quad),
            "K2_HORIZONTAL_LONG" => Delay(&mut self.k2_horizontal_long),
            "K2_HORIZONTAL_GLOBAL" => Delay(&mut self.k2_horizontal_global),
            "K0_VERTICAL" => Delay(&mut self.k0_vertical),
            "K1_VERTICAL" => Delay(&mut self.k1_vertical),
            "K2_VERTICAL_SINGLE" => Delay(&mut self.k2_vertical_single),
            "K2_VERTICAL_DOUBLE" => Delay(&mut self.k2_vertical_double),
            "K2_VERTICAL_QUAD" => Delay(&mut self.k2_vertical_quad),
            "K2_VERTICAL_LONG" => Delay(&mut self.k2_vertical_long),
            "LOGIC_FF_DELAY" => Delay(&mut self.logic_ff_delay),
            "CARRY_CO_DELAY" => Delay(&mut self.carry_co_delay),
            "SITEPIN_A_I_DELAY" => Delay(&mut self.sitepin_a_i_delay),
            "SITEPIN_AX_DELAY" => Delay(&mut self.sitepin_ax_delay),
            "NEAR_MIN" => Count(&mut self.near_min),
            "NEAR_MAX" => Count(&mut self.near_max),
            "MID_MIN" => Count(&mut self.mid_min),
            "MID_MAX" => Count(&mut self.mid_max),
            "FAR_MIN" => Count(&mut self.far_min),
            "FAR_MAX" => Count(&mut self.far_max),
            _ => return self.indexed_slot(name),
        };
        Some(slot)
    }

    /// Crossing terms (`BRAM_QUAD`) and numbered pin terms (`SITEPIN_A3_DELAY`).
    fn indexed_slot(&mut self, name: &str) -> Option<Slot<'_>> {
        if let Some((class, wire)) = name.split_once('_') {
            let crossing = match class {
                "RCLK" => Some(&mut self.rclk),
                "DSP" => Some(&mut self.dsp),
                "BRAM" => Some(&mut self.bram),
                "CFRM" => Some(&mut self.cfrm),
                "URAM" => Some(&mut self.uram),
                "PCIE" => Some(&mut self.pcie),
                "IO" => Some(&mut self.io),
                _ => None,
            };
            if let Some(terms) = crossing {
                return match wire {
                    "SINGLE_AND_DOUBLE" => Some(Slot::Delay(&mut terms.single_and_double)),
                    "QUAD" => Some(Slot::Delay(&mut terms.quad)),
                    "LONG" => Some(Slot::Delay(&mut terms.long)),
                    _ => None,
                };
            }
        }

        let pin_index = |prefix: &str| -> Option<usize> {
            let digit = name.strip_prefix(prefix)?.strip_suffix("_DELAY")?;
            match digit.parse::<usize>() {
                Ok(n @ 1..=6) => Some(n - 1),
                _ => None,
            }
        };
        if let Some(i) = pin_index("LOGIC_LUT_A") {
            return Some(Slot::Delay(&mut self.logic_lut_delay[i]));
        }
        if let Some(i) = pin_index("SITEPIN_A") {
            return Some(Slot::Delay(&mut self.sitepin_delay[i]));
        }
        None
    }

    /// Crossing terms for a tile class; `None` for classes without a penalty.
    pub fn crossing(&self, class: TileClass) -> Option<&CrossingTerms> {
        match class {
            TileClass::Rclk => Some(&self.rclk),
            TileClass::Dsp => Some(&self.dsp),
            TileClass::Bram => Some(&self.bram),
            TileClass::Cfrm => Some(&self.cfrm),
            TileClass::Uram => Some(&self.uram),
            TileClass::Pcie => Some(&self.pcie),
            TileClass::Io => Some(&self.io),
            TileClass::Null | TileClass::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_reference_values() {
        let t = InterconnectTerms::default();
        assert_eq!(t.start_tile_col, 52);
        assert_eq!(t.k2_vertical_single, 14.5);
        assert_eq!(t.io.long, 186.0);
        assert_eq!(t.logic_lut_delay[0], 150.0);
        assert_eq!(t.sitepin_delay[5], 43.0);
        assert!(t.source_hash.is_none());
    }

    #[test]
    fn parse_overrides_and_comments() {
        let text = "\
# UltraScale+ terms
K0_HORIZONTAL 50

bram_quad 20
SITEPIN_A3_DELAY 49.5
LOGIC_LUT_A6_DELAY 40
NEAR_MAX 3.7
";
        let t = InterconnectTerms::from_text(text, "terms.txt").unwrap();
        assert_eq!(t.k0_horizontal, 50.0);
        assert_eq!(t.bram.quad, 20.0);
        assert_eq!(t.bram.long, 16.0);
        assert_eq!(t.sitepin_delay[2], 49.5);
        assert_eq!(t.logic_lut_delay[5], 40.0);
        assert_eq!(t.near_max, 3);
        assert_eq!(t.terms_read, 5);
        assert!(t.source_hash.is_some());
    }

    #[test]
    fn unknown_term_is_fatal_with_line() {
        let err = InterconnectTerms::from_text("K0_HORIZONTAL 1\nK9_DIAGONAL 2\n", "t.txt")
            .unwrap_err();
        match err {
            DataError::UnknownTerm { line, name, .. } => {
                assert_eq!(line, 2);
                assert_eq!(name, "K9_DIAGONAL");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_pin_terms_are_unknown() {
        assert!(InterconnectTerms::from_text("SITEPIN_A7_DELAY 1\n", "t").is_err());
        assert!(InterconnectTerms::from_text("BRAM_HEX 1\n", "t").is_err());
    }

    #[test]
    fn bad_value_is_parse_error() {
        let err = InterconnectTerms::from_text("K1_VERTICAL fast\n", "t").unwrap_err();
        assert!(matches!(err, DataError::Parse { line: 1, .. }));
        let err = InterconnectTerms::from_text("K1_VERTICAL\n", "t").unwrap_err();
        assert!(matches!(err, DataError::Parse { line: 1, .. }));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = InterconnectTerms::load(Path::new("/nonexistent/intersite.txt")).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }

    #[test]
    fn crossing_by_class() {
        let t = InterconnectTerms::default();
        assert_eq!(t.crossing(TileClass::Uram).unwrap().quad, 34.0);
        assert!(t.crossing(TileClass::Other).is_none());
        assert!(t.crossing(TileClass::Null).is_none());
    }
}
