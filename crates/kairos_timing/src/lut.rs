//! Truth-table analysis for LUTs.
//!
//! Some logical inputs of a LUT may not influence its output, either
//! because the equation ignores them or because a `LUT6_2` half sees only
//! part of the parent table. Edges from those inputs would add false
//! paths, so the builder asks [`used_inputs`] or [`table_inputs`] which
//! ones matter.

use kairos_design::I5Tie;

/// Which of `I0..I5` can change the output of a LUT.
///
/// `init` is the parent `LUT6_2` INIT value. A LUT5 half, or an `I5` tied
/// to a constant, sees only 32 entries of the table: the lower half, or the
/// upper half when `I5` is tied high on a LUT6 half. `I5` itself counts as
/// used only when it carries a signal into a LUT6 half.
pub fn used_inputs(init: u64, is_lut5: bool, i5: I5Tie) -> [bool; 6] {
    let full = !is_lut5 && !i5.is_const();
    let entries: u32 = if full { 64 } else { 32 };
    let offset: u32 = if !is_lut5 && i5 == I5Tie::Const1 { 32 } else { 0 };
    let inputs = if full { 6 } else { 5 };

    depends_on(init >> offset, entries, inputs)
}

/// Which of `I0..I5` can change the output of a standalone `LUTk` whose
/// own INIT is `init`. Only the low `2^width` bits are read.
pub fn table_inputs(init: u64, width: usize) -> [bool; 6] {
    let width = width.min(6);
    depends_on(init, 1 << width, width)
}

/// Input count of a plain `LUT1` to `LUT6` cell type.
pub fn lut_width(cell_type: &str) -> Option<usize> {
    match cell_type.strip_prefix("LUT")?.as_bytes() {
        [d @ b'1'..=b'6'] => Some(usize::from(*d - b'0')),
        _ => None,
    }
}

fn depends_on(table: u64, entries: u32, inputs: usize) -> [bool; 6] {
    let bit = |i: u32| (table >> i) & 1;
    let mut used = [false; 6];
    for (k, slot) in used.iter_mut().enumerate().take(inputs) {
        let mask = 1u32 << k;
        *slot = (0..entries)
            .filter(|i| i & mask == 0)
            .any(|i| bit(i) != bit(i | mask));
    }
    used
}

/// Index of a logical LUT input named `...I0` to `...I5`.
pub fn input_index(pin: &str) -> Option<usize> {
    let b = pin.as_bytes();
    match b {
        [.., b'I', d @ b'0'..=b'5'] => Some(usize::from(*d - b'0')),
        _ => None,
    }
}
