//! 80 column monochrome display of the P2000M
//!
//! Every byte of a row is shown; there are no serial attributes. Bit 7 marks
//! an inverted cell.

use crate::saa5050::{Band, CellCommand, ROWS, ROW_STRIDE, VRAM_SIZE};
use crate::screen_cache::fingerprint_m;

pub const MONO_COLUMNS: usize = ROW_STRIDE;

/// Decode a monochrome frame. Control bytes show as spaces; colours are
/// always white on black with inversion applied.
pub fn decode_frame_mono<F>(vram: &[u8; VRAM_SIZE], scroll: u16, mut sink: F)
where
    F: FnMut(CellCommand, i32),
{
    for row in 0..ROWS {
        let start = scroll as usize + row * ROW_STRIDE;
        for col in 0..MONO_COLUMNS {
            let byte = vram[(start + col) % VRAM_SIZE];
            let c = byte & 0x7F;
            let glyph = if c < 0x20 { 0 } else { c - 0x20 };
            let inverted = byte & 0x80 != 0;
            let (fg, bg) = if inverted { (0, 7) } else { (7, 0) };
            let cell = CellCommand {
                col: col as u8,
                row: row as u8,
                glyph,
                fg,
                bg,
                band: Band::Single,
                inverted,
            };
            sink(cell, fingerprint_m(glyph, inverted, false));
        }
    }
}
