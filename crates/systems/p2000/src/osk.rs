//! On-screen keyboard for pad-only plugin hosts
//!
//! While a shoulder button is held, the bottom text row shows a strip of
//! 40 keys with the selection in a fixed highlight column. The d-pad moves
//! the selection and fire types the selected key through
//! [`PluginInput`](crate::input::PluginInput).

use crate::keyboard::keys;
use crate::palette::Color;
use crate::saa5050::{Band, CellCommand, COLUMNS};

/// Screen row the strip replaces.
pub const OSK_ROW: u8 = 23;
/// Column showing the selected key.
pub const OSK_HIGHLIGHT_COL: u8 = 19;

/// One key of the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OskKey {
    pub ascii: u8,
    pub code: u8,
    /// Typed with the emulated shift
    pub shifted: bool,
}

impl OskKey {
    const fn plain(ascii: u8, code: u8) -> Self {
        Self {
            ascii,
            code,
            shifted: false,
        }
    }

    const fn shifted(ascii: u8, code: u8) -> Self {
        Self {
            ascii,
            code,
            shifted: true,
        }
    }

    /// Font index of the key's character.
    pub fn glyph(&self) -> u8 {
        self.ascii - 32
    }
}

/// Strip contents in ASCII order. Shifted entries follow the P2000T
/// keyboard legends.
pub const OSK_KEYS: &[OskKey] = &[
    OskKey::plain(b' ', keys::SPACE),
    OskKey::shifted(b'!', keys::DIGIT_1),
    OskKey::shifted(b'"', keys::DIGIT_2),
    OskKey::shifted(b'$', keys::DIGIT_4),
    OskKey::shifted(b'%', keys::DIGIT_5),
    OskKey::shifted(b'&', keys::DIGIT_6),
    OskKey::shifted(b'\'', keys::DIGIT_7),
    OskKey::shifted(b'(', keys::DIGIT_8),
    OskKey::shifted(b')', keys::DIGIT_9),
    OskKey::shifted(b'*', keys::COLON),
    OskKey::shifted(b'+', keys::SEMICOLON),
    OskKey::plain(b',', keys::COMMA),
    OskKey::plain(b'-', keys::MINUS),
    OskKey::plain(b'.', keys::PERIOD),
    OskKey::plain(b'/', keys::SLASH),
    OskKey::plain(b'0', keys::DIGIT_0),
    OskKey::plain(b'1', keys::DIGIT_1),
    OskKey::plain(b'2', keys::DIGIT_2),
    OskKey::plain(b'3', keys::DIGIT_3),
    OskKey::plain(b'4', keys::DIGIT_4),
    OskKey::plain(b'5', keys::DIGIT_5),
    OskKey::plain(b'6', keys::DIGIT_6),
    OskKey::plain(b'7', keys::DIGIT_7),
    OskKey::plain(b'8', keys::DIGIT_8),
    OskKey::plain(b'9', keys::DIGIT_9),
    OskKey::plain(b':', keys::COLON),
    OskKey::plain(b';', keys::SEMICOLON),
    OskKey::shifted(b'<', keys::COMMA),
    OskKey::shifted(b'=', keys::MINUS),
    OskKey::shifted(b'>', keys::PERIOD),
    OskKey::shifted(b'?', keys::SLASH),
    OskKey::plain(b'@', keys::AT),
    OskKey::shifted(b'A', keys::A),
    OskKey::shifted(b'B', keys::B),
    OskKey::shifted(b'C', keys::C),
    OskKey::shifted(b'D', keys::D),
    OskKey::shifted(b'E', keys::E),
    OskKey::shifted(b'F', keys::F),
    OskKey::shifted(b'G', keys::G),
    OskKey::shifted(b'H', keys::H),
    OskKey::shifted(b'I', keys::I),
    OskKey::shifted(b'J', keys::J),
    OskKey::shifted(b'K', keys::K),
    OskKey::shifted(b'L', keys::L),
    OskKey::shifted(b'M', keys::M),
    OskKey::shifted(b'N', keys::N),
    OskKey::shifted(b'O', keys::O),
    OskKey::shifted(b'P', keys::P),
    OskKey::shifted(b'Q', keys::Q),
    OskKey::shifted(b'R', keys::R),
    OskKey::shifted(b'S', keys::S),
    OskKey::shifted(b'T', keys::T),
    OskKey::shifted(b'U', keys::U),
    OskKey::shifted(b'V', keys::V),
    OskKey::shifted(b'W', keys::W),
    OskKey::shifted(b'X', keys::X),
    OskKey::shifted(b'Y', keys::Y),
    OskKey::shifted(b'Z', keys::Z),
    OskKey::plain(b'a', keys::A),
    OskKey::plain(b'b', keys::B),
    OskKey::plain(b'c', keys::C),
    OskKey::plain(b'd', keys::D),
    OskKey::plain(b'e', keys::E),
    OskKey::plain(b'f', keys::F),
    OskKey::plain(b'g', keys::G),
    OskKey::plain(b'h', keys::H),
    OskKey::plain(b'i', keys::I),
    OskKey::plain(b'j', keys::J),
    OskKey::plain(b'k', keys::K),
    OskKey::plain(b'l', keys::L),
    OskKey::plain(b'm', keys::M),
    OskKey::plain(b'n', keys::N),
    OskKey::plain(b'o', keys::O),
    OskKey::plain(b'p', keys::P),
    OskKey::plain(b'q', keys::Q),
    OskKey::plain(b'r', keys::R),
    OskKey::plain(b's', keys::S),
    OskKey::plain(b't', keys::T),
    OskKey::plain(b'u', keys::U),
    OskKey::plain(b'v', keys::V),
    OskKey::plain(b'w', keys::W),
    OskKey::plain(b'x', keys::X),
    OskKey::plain(b'y', keys::Y),
    OskKey::plain(b'z', keys::Z),
];

/// Visibility and selection of the strip.
#[derive(Debug, Clone, Default)]
pub struct OnScreenKeyboard {
    visible: bool,
    index: usize,
}

impl OnScreenKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn selected(&self) -> OskKey {
        OSK_KEYS[self.index]
    }

    pub fn select_previous(&mut self) {
        self.index = self.index.checked_sub(1).unwrap_or(OSK_KEYS.len() - 1);
    }

    pub fn select_next(&mut self) {
        self.index = (self.index + 1) % OSK_KEYS.len();
    }

    /// Key shown at `col`, wrapping around the table on both sides of the
    /// highlight.
    pub fn key_at(&self, col: u8) -> OskKey {
        let len = OSK_KEYS.len() as isize;
        let offset = col as isize - OSK_HIGHLIGHT_COL as isize;
        OSK_KEYS[(self.index as isize + offset).rem_euclid(len) as usize]
    }

    /// Replace a strip cell with the keyboard. Other rows pass through.
    pub fn overlay(&self, cell: &mut CellCommand) {
        if !self.visible || cell.row != OSK_ROW || cell.col as usize >= COLUMNS {
            return;
        }
        let bg = if cell.col == OSK_HIGHLIGHT_COL {
            Color::Yellow
        } else {
            Color::Cyan
        };
        cell.glyph = self.key_at(cell.col).glyph();
        cell.fg = Color::Black as u8;
        cell.bg = bg as u8;
        cell.band = Band::Single;
        cell.inverted = false;
    }
}
