//! Teletext colours and a text approximation of the character set
//!
//! Used by renderers that do not rasterize the SAA5050 font themselves, such
//! as terminal output.

/// The eight teletext colours, indexed by their 3 bit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
}

impl Color {
    /// Colour for a 3 bit code; higher bits are ignored.
    pub fn from_index(index: u8) -> Self {
        match index & 7 {
            0 => Color::Black,
            1 => Color::Red,
            2 => Color::Green,
            3 => Color::Yellow,
            4 => Color::Blue,
            5 => Color::Magenta,
            6 => Color::Cyan,
            _ => Color::White,
        }
    }

    pub fn argb(self) -> u32 {
        let i = self as u8;
        let r = if i & 1 != 0 { 0xFF } else { 0 };
        let g = if i & 2 != 0 { 0xFF } else { 0 };
        let b = if i & 4 != 0 { 0xFF } else { 0 };
        0xFF00_0000 | (r << 16) | (g << 8) | b
    }

    /// SGR foreground code
    pub fn ansi_fg(self) -> u8 {
        30 + self as u8
    }

    /// SGR background code
    pub fn ansi_bg(self) -> u8 {
        40 + self as u8
    }
}

/// Printable approximation of a font glyph.
///
/// Alphanumerics map to ASCII; mosaics map to Unicode sextant blocks, with
/// separated mosaics shown like contiguous ones.
pub fn glyph_char(glyph: u8) -> char {
    match glyph {
        0x5F => '█',
        0..=0x5E => char::from(glyph + 32),
        0x60..=0x9F => mosaic_char(glyph),
        0xA0..=0xDF => mosaic_char(glyph - 64),
        _ => '?',
    }
}

fn mosaic_char(glyph: u8) -> char {
    let c = glyph + 32;
    let code = if c < 0xA0 { c - 96 } else { c - 64 };
    let bits = (code & 0x1F) | ((code & 0x40) >> 1);
    match bits {
        0 => ' ',
        21 => '▌',
        42 => '▐',
        63 => '█',
        _ => {
            let skipped = u32::from(bits > 21) + u32::from(bits > 42);
            char::from_u32(0x1FB00 + u32::from(bits) - 1 - skipped).unwrap_or('?')
        }
    }
}
