//! P2000 keyboard matrix
//!
//! The keyboard is a 10 × 8 matrix read by the CPU one row per I/O port.
//! A key code is `row * 8 + bit`, so codes run from 0 to 79.
//!
//! The matrix is **active low**: a cleared bit means the key contact is
//! closed. An idle row therefore reads `0xFF`.
//!
//! | Row | Bit 0      | Bit 1 | Bit 2  | Bit 3 | Bit 4     | Bit 5 | Bit 6 | Bit 7  |
//! |-----|------------|-------|--------|-------|-----------|-------|-------|--------|
//! | 0   | ←          | 6     | ↑      | Q     | 3         | 5     | 7     | 4      |
//! | 1   | Tab        | H     | Z      | S     | D         | G     | J     | F      |
//! | 2   | kp .       | Space | kp 00  | kp 0  | #         | ↓     | ,     | →      |
//! | 3   | Shift lock | N     | <      | X     | C         | B     | M     | V      |
//! | 4   | Code       | Y     | A      | W     | E         | T     | U     | R      |
//! | 5   | Clr line   | 9     | kp +   | kp -  | Backspace | 0     | 1     | -      |
//! | 6   | kp 9       | O     | kp 8   | kp 7  | Enter     | P     | 8     | 2      |
//! | 7   | kp 3       | .     | kp 2   | kp 1  | ←-arrow   | /     | ;     | K      |
//! | 8   | kp 6       | @     | kp 5   | kp 4  | :         | L     | I     | [      |
//! | 9   | Left shift | -     | -      | -     | -         | -     | -     | Right shift |

pub const MATRIX_ROWS: usize = 10;

/// Number of addressable key positions.
pub const KEY_COUNT: u8 = (MATRIX_ROWS * 8) as u8;

/// Row value with no key pressed.
pub const ROW_RELEASED: u8 = 0xFF;

/// Matrix key codes
pub mod keys {
    pub const LEFT: u8 = 0;
    pub const DIGIT_6: u8 = 1;
    pub const UP: u8 = 2;
    pub const Q: u8 = 3;
    pub const DIGIT_3: u8 = 4;
    pub const DIGIT_5: u8 = 5;
    pub const DIGIT_7: u8 = 6;
    pub const DIGIT_4: u8 = 7;

    pub const TAB: u8 = 8;
    pub const H: u8 = 9;
    pub const Z: u8 = 10;
    pub const S: u8 = 11;
    pub const D: u8 = 12;
    pub const G: u8 = 13;
    pub const J: u8 = 14;
    pub const F: u8 = 15;

    pub const NUM_PERIOD: u8 = 16;
    pub const SPACE: u8 = 17;
    pub const NUM_00: u8 = 18;
    pub const NUM_0: u8 = 19;
    pub const HASH: u8 = 20;
    pub const DOWN: u8 = 21;
    pub const COMMA: u8 = 22;
    pub const RIGHT: u8 = 23;

    pub const SHIFT_LOCK: u8 = 24;
    pub const N: u8 = 25;
    pub const LESS_THAN: u8 = 26;
    pub const X: u8 = 27;
    pub const C: u8 = 28;
    pub const B: u8 = 29;
    pub const M: u8 = 30;
    pub const V: u8 = 31;

    pub const CODE: u8 = 32;
    pub const Y: u8 = 33;
    pub const A: u8 = 34;
    pub const W: u8 = 35;
    pub const E: u8 = 36;
    pub const T: u8 = 37;
    pub const U: u8 = 38;
    pub const R: u8 = 39;

    pub const CLEAR_LINE: u8 = 40;
    pub const DIGIT_9: u8 = 41;
    pub const NUM_PLUS: u8 = 42;
    pub const NUM_MINUS: u8 = 43;
    pub const BACKSPACE: u8 = 44;
    pub const DIGIT_0: u8 = 45;
    pub const DIGIT_1: u8 = 46;
    pub const MINUS: u8 = 47;

    pub const NUM_9: u8 = 48;
    pub const O: u8 = 49;
    pub const NUM_8: u8 = 50;
    pub const NUM_7: u8 = 51;
    pub const ENTER: u8 = 52;
    pub const P: u8 = 53;
    pub const DIGIT_8: u8 = 54;
    pub const DIGIT_2: u8 = 55;

    pub const NUM_3: u8 = 56;
    pub const PERIOD: u8 = 57;
    pub const NUM_2: u8 = 58;
    pub const NUM_1: u8 = 59;
    pub const LEFT_ARROW_CHAR: u8 = 60;
    pub const SLASH: u8 = 61;
    pub const SEMICOLON: u8 = 62;
    pub const K: u8 = 63;

    pub const NUM_6: u8 = 64;
    pub const AT: u8 = 65;
    pub const NUM_5: u8 = 66;
    pub const NUM_4: u8 = 67;
    pub const COLON: u8 = 68;
    pub const L: u8 = 69;
    pub const I: u8 = 70;
    pub const BRACKET: u8 = 71;

    pub const LSHIFT: u8 = 72;
    pub const RSHIFT: u8 = 79;

    /// `<ZOEK>` (search tape) = shift + keypad 1
    pub const ZOEK: u8 = NUM_1;
    /// `<START>` (run tape program) = shift + keypad 3
    pub const START: u8 = NUM_3;
    /// `<STOP>` = shift + keypad period
    pub const STOP: u8 = NUM_PERIOD;
    /// Clear cassette = shift + keypad 7
    pub const CLEAR_CASSETTE: u8 = NUM_7;
}

/// Row holding both shift keys.
pub const SHIFT_ROW: usize = (keys::LSHIFT / 8) as usize;

/// Shift row value with only the left shift key down.
pub const SHIFT_ROW_LSHIFT: u8 = !(1 << (keys::LSHIFT % 8));

/// The key contact matrix read by the CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMatrix {
    rows: [u8; MATRIX_ROWS],
}

impl KeyMatrix {
    /// All keys released
    pub fn new() -> Self {
        Self {
            rows: [ROW_RELEASED; MATRIX_ROWS],
        }
    }

    fn locate(code: u8) -> Option<(usize, u8)> {
        let row = (code / 8) as usize;
        if row < MATRIX_ROWS {
            Some((row, 1 << (code % 8)))
        } else {
            None
        }
    }

    /// Close the contact for `code`. Codes outside the matrix are ignored.
    pub fn press(&mut self, code: u8) {
        if let Some((row, mask)) = Self::locate(code) {
            self.rows[row] &= !mask;
        }
    }

    /// Open the contact for `code`. Codes outside the matrix are ignored.
    pub fn release(&mut self, code: u8) {
        if let Some((row, mask)) = Self::locate(code) {
            self.rows[row] |= mask;
        }
    }

    pub fn set(&mut self, code: u8, pressed: bool) {
        if pressed {
            self.press(code);
        } else {
            self.release(code);
        }
    }

    pub fn is_pressed(&self, code: u8) -> bool {
        Self::locate(code)
            .map(|(row, mask)| self.rows[row] & mask == 0)
            .unwrap_or(false)
    }

    pub fn release_all(&mut self) {
        self.rows = [ROW_RELEASED; MATRIX_ROWS];
    }

    /// Raw row byte as the CPU sees it. Rows past the matrix read as idle.
    pub fn row(&self, index: usize) -> u8 {
        self.rows.get(index).copied().unwrap_or(ROW_RELEASED)
    }

    /// Overwrite a whole row. Used to force the shift row in one write.
    pub fn set_row(&mut self, index: usize, value: u8) {
        if let Some(row) = self.rows.get_mut(index) {
            *row = value;
        }
    }

    pub fn rows(&self) -> &[u8; MATRIX_ROWS] {
        &self.rows
    }

    /// True when any key in the shift row is down.
    pub fn shift_down(&self) -> bool {
        self.rows[SHIFT_ROW] != ROW_RELEASED
    }

    /// Number of closed contacts, for diagnostics.
    pub fn pressed_count(&self) -> u32 {
        self.rows.iter().map(|r| r.count_zeros()).sum()
    }
}

impl Default for KeyMatrix {
    fn default() -> Self {
        Self::new()
    }
}
