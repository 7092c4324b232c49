//! Host key identifiers and the tables that map them onto the P2000 matrix
//!
//! Three tables live here:
//! - the positional table, one optional host key per matrix code, used when
//!   the host keyboard should behave like the physical P2000 layout;
//! - the symbolic table, which maps the character printed on a host key to the
//!   P2000 key (and shift state) producing the same character;
//! - the plugin keyboard table, a primary and optional alternate host key per
//!   matrix code.
//!
//! The joystick maps are at the bottom.

use crate::keyboard::{keys, KEY_COUNT};

/// Host keyboard keys, named by their position on a PC keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostKey {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Kp0,
    Kp1,
    Kp2,
    Kp3,
    Kp4,
    Kp5,
    Kp6,
    Kp7,
    Kp8,
    Kp9,
    KpPeriod,
    KpPlus,
    KpMinus,
    KpMultiply,
    KpDivide,
    KpEnter,
    Space,
    Enter,
    Backspace,
    Tab,
    Escape,
    Delete,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
    Minus,
    Equals,
    LeftBracket,
    RightBracket,
    Backslash,
    Semicolon,
    Quote,
    Backquote,
    Comma,
    Period,
    Slash,
    LeftShift,
    RightShift,
    CapsLock,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

/// Positional layout: the host key sitting where each P2000 key sits.
///
/// Indexed by matrix code; `None` marks an unused matrix position.
pub const POSITIONAL_MAP: [Option<HostKey>; KEY_COUNT as usize] = {
    use HostKey::*;
    [
        // row 0
        Some(Left),
        Some(Digit6),
        Some(Up),
        Some(Q),
        Some(Digit3),
        Some(Digit5),
        Some(Digit7),
        Some(Digit4),
        // row 1
        Some(Tab),
        Some(H),
        Some(Z),
        Some(S),
        Some(D),
        Some(G),
        Some(J),
        Some(F),
        // row 2
        Some(KpPeriod),
        Some(Space),
        Some(KpDivide),
        Some(Kp0),
        Some(Backslash),
        Some(Down),
        Some(Comma),
        Some(Right),
        // row 3
        Some(CapsLock),
        Some(N),
        Some(Backquote),
        Some(X),
        Some(C),
        Some(B),
        Some(M),
        Some(V),
        // row 4
        Some(LeftCtrl),
        Some(Y),
        Some(A),
        Some(W),
        Some(E),
        Some(T),
        Some(U),
        Some(R),
        // row 5
        Some(Delete),
        Some(Digit9),
        Some(KpPlus),
        Some(KpMinus),
        Some(Backspace),
        Some(Digit0),
        Some(Digit1),
        Some(Minus),
        // row 6
        Some(Kp9),
        Some(O),
        Some(Kp8),
        Some(Kp7),
        Some(Enter),
        Some(P),
        Some(Digit8),
        Some(Digit2),
        // row 7
        Some(Kp3),
        Some(Period),
        Some(Kp2),
        Some(Kp1),
        Some(Equals),
        Some(Slash),
        Some(Semicolon),
        Some(K),
        // row 8
        Some(Kp6),
        Some(LeftBracket),
        Some(Kp5),
        Some(Kp4),
        Some(Quote),
        Some(L),
        Some(I),
        Some(RightBracket),
        // row 9
        Some(LeftShift),
        None,
        None,
        None,
        None,
        None,
        None,
        Some(RightShift),
    ]
};

/// One row of the symbolic table.
///
/// The host key `trigger` produces `unshifted` when the host shift is up and
/// `shifted` when it is down. Each side names the P2000 key code plus whether
/// the emulated shift must be held for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolicKey {
    pub trigger: HostKey,
    pub unshifted_code: u8,
    pub unshifted_needs_shift: bool,
    pub shifted_code: u8,
    pub shifted_needs_shift: bool,
}

impl SymbolicKey {
    const fn new(trigger: HostKey, unshifted: (u8, bool), shifted: (u8, bool)) -> Self {
        Self {
            trigger,
            unshifted_code: unshifted.0,
            unshifted_needs_shift: unshifted.1,
            shifted_code: shifted.0,
            shifted_needs_shift: shifted.1,
        }
    }

    /// Same P2000 key either way, shift passed through.
    const fn plain(trigger: HostKey, code: u8) -> Self {
        Self::new(trigger, (code, false), (code, true))
    }

    /// The two host shift states land on different P2000 keys.
    pub fn is_combi(&self) -> bool {
        self.unshifted_code != self.shifted_code
    }

    /// Shift on the host simply means shift on the P2000.
    pub fn is_normal(&self) -> bool {
        !self.is_combi() && !self.unshifted_needs_shift && self.shifted_needs_shift
    }

    /// Code and required emulated shift for the given host shift state.
    pub fn wanted(&self, host_shift: bool) -> (u8, bool) {
        if host_shift {
            (self.shifted_code, self.shifted_needs_shift)
        } else {
            (self.unshifted_code, self.unshifted_needs_shift)
        }
    }

    /// The code used for the opposite host shift state.
    pub fn alternate(&self, host_shift: bool) -> u8 {
        if host_shift {
            self.unshifted_code
        } else {
            self.shifted_code
        }
    }
}

/// Symbolic layout for a US-style host keyboard.
pub const SYMBOLIC_MAP: &[SymbolicKey] = {
    use HostKey::*;
    &[
        SymbolicKey::plain(A, keys::A),
        SymbolicKey::plain(B, keys::B),
        SymbolicKey::plain(C, keys::C),
        SymbolicKey::plain(D, keys::D),
        SymbolicKey::plain(E, keys::E),
        SymbolicKey::plain(F, keys::F),
        SymbolicKey::plain(G, keys::G),
        SymbolicKey::plain(H, keys::H),
        SymbolicKey::plain(I, keys::I),
        SymbolicKey::plain(J, keys::J),
        SymbolicKey::plain(K, keys::K),
        SymbolicKey::plain(L, keys::L),
        SymbolicKey::plain(M, keys::M),
        SymbolicKey::plain(N, keys::N),
        SymbolicKey::plain(O, keys::O),
        SymbolicKey::plain(P, keys::P),
        SymbolicKey::plain(Q, keys::Q),
        SymbolicKey::plain(R, keys::R),
        SymbolicKey::plain(S, keys::S),
        SymbolicKey::plain(T, keys::T),
        SymbolicKey::plain(U, keys::U),
        SymbolicKey::plain(V, keys::V),
        SymbolicKey::plain(W, keys::W),
        SymbolicKey::plain(X, keys::X),
        SymbolicKey::plain(Y, keys::Y),
        SymbolicKey::plain(Z, keys::Z),
        SymbolicKey::plain(Digit1, keys::DIGIT_1),
        // '@'
        SymbolicKey::new(Digit2, (keys::DIGIT_2, false), (keys::AT, false)),
        SymbolicKey::plain(Digit3, keys::DIGIT_3),
        SymbolicKey::plain(Digit4, keys::DIGIT_4),
        SymbolicKey::plain(Digit5, keys::DIGIT_5),
        SymbolicKey::plain(Digit6, keys::DIGIT_6),
        // '&'
        SymbolicKey::new(Digit7, (keys::DIGIT_7, false), (keys::DIGIT_6, true)),
        // '*'
        SymbolicKey::new(Digit8, (keys::DIGIT_8, false), (keys::COLON, true)),
        // '('
        SymbolicKey::new(Digit9, (keys::DIGIT_9, false), (keys::DIGIT_8, true)),
        // ')'
        SymbolicKey::new(Digit0, (keys::DIGIT_0, false), (keys::DIGIT_9, true)),
        SymbolicKey::plain(Minus, keys::MINUS),
        // '=' and '+'
        SymbolicKey::new(Equals, (keys::MINUS, true), (keys::SEMICOLON, true)),
        // ';' and ':'
        SymbolicKey::new(Semicolon, (keys::SEMICOLON, false), (keys::COLON, false)),
        // ''' and '"'
        SymbolicKey::new(Quote, (keys::DIGIT_7, true), (keys::DIGIT_2, true)),
        SymbolicKey::plain(Comma, keys::COMMA),
        SymbolicKey::plain(Period, keys::PERIOD),
        SymbolicKey::plain(Slash, keys::SLASH),
        SymbolicKey::plain(LeftBracket, keys::BRACKET),
        SymbolicKey::plain(Backslash, keys::HASH),
        SymbolicKey::plain(Space, keys::SPACE),
        SymbolicKey::plain(Enter, keys::ENTER),
        SymbolicKey::plain(KpEnter, keys::ENTER),
        SymbolicKey::plain(Backspace, keys::BACKSPACE),
        SymbolicKey::plain(Tab, keys::TAB),
        SymbolicKey::plain(Home, keys::CLEAR_LINE),
        SymbolicKey::plain(LeftCtrl, keys::CODE),
        SymbolicKey::plain(Up, keys::UP),
        SymbolicKey::plain(Down, keys::DOWN),
        SymbolicKey::plain(Left, keys::LEFT),
        SymbolicKey::plain(Right, keys::RIGHT),
        SymbolicKey::plain(Kp0, keys::NUM_0),
        SymbolicKey::plain(Kp1, keys::NUM_1),
        SymbolicKey::plain(Kp2, keys::NUM_2),
        SymbolicKey::plain(Kp3, keys::NUM_3),
        SymbolicKey::plain(Kp4, keys::NUM_4),
        SymbolicKey::plain(Kp5, keys::NUM_5),
        SymbolicKey::plain(Kp6, keys::NUM_6),
        SymbolicKey::plain(Kp7, keys::NUM_7),
        SymbolicKey::plain(Kp8, keys::NUM_8),
        SymbolicKey::plain(Kp9, keys::NUM_9),
        SymbolicKey::plain(KpPeriod, keys::NUM_PERIOD),
        SymbolicKey::plain(KpPlus, keys::NUM_PLUS),
        SymbolicKey::plain(KpMinus, keys::NUM_MINUS),
        SymbolicKey::plain(KpDivide, keys::NUM_00),
    ]
};

/// Plugin host keyboard: (matrix code, primary key, alternate key).
///
/// The quote key only counts while a host shift key is down, since the
/// P2000 has no unshifted key producing it.
pub const PLUGIN_KEY_MAP: &[(u8, HostKey, Option<HostKey>)] = {
    use HostKey::*;
    &[
        (keys::LEFT, Left, None),
        (keys::DIGIT_6, Digit6, None),
        (keys::UP, Up, None),
        (keys::Q, Q, None),
        (keys::DIGIT_3, Digit3, None),
        (keys::DIGIT_5, Digit5, None),
        (keys::DIGIT_7, Digit7, None),
        (keys::DIGIT_4, Digit4, None),
        (keys::TAB, Tab, None),
        (keys::H, H, None),
        (keys::Z, Z, None),
        (keys::S, S, None),
        (keys::D, D, None),
        (keys::G, G, None),
        (keys::J, J, None),
        (keys::F, F, None),
        (keys::NUM_PERIOD, KpPeriod, Some(Delete)),
        (keys::SPACE, Space, None),
        (keys::NUM_00, KpDivide, None),
        (keys::NUM_0, Kp0, None),
        (keys::HASH, Backslash, None),
        (keys::DOWN, Down, None),
        (keys::COMMA, Comma, None),
        (keys::RIGHT, Right, None),
        (keys::SHIFT_LOCK, CapsLock, None),
        (keys::N, N, None),
        (keys::LESS_THAN, Backquote, None),
        (keys::X, X, None),
        (keys::C, C, None),
        (keys::B, B, None),
        (keys::M, M, None),
        (keys::V, V, None),
        (keys::CODE, LeftCtrl, Some(RightCtrl)),
        (keys::Y, Y, None),
        (keys::A, A, None),
        (keys::W, W, None),
        (keys::E, E, None),
        (keys::T, T, None),
        (keys::U, U, None),
        (keys::R, R, None),
        (keys::CLEAR_LINE, Home, None),
        (keys::DIGIT_9, Digit9, None),
        (keys::NUM_PLUS, KpPlus, None),
        (keys::NUM_MINUS, KpMinus, None),
        (keys::BACKSPACE, Backspace, None),
        (keys::DIGIT_0, Digit0, None),
        (keys::DIGIT_1, Digit1, None),
        (keys::MINUS, Minus, None),
        (keys::NUM_9, Kp9, None),
        (keys::O, O, None),
        (keys::NUM_8, Kp8, None),
        (keys::NUM_7, Kp7, None),
        (keys::ENTER, Enter, Some(KpEnter)),
        (keys::P, P, None),
        (keys::DIGIT_8, Digit8, None),
        (keys::DIGIT_2, Digit2, Some(Quote)),
        (keys::NUM_3, Kp3, None),
        (keys::PERIOD, Period, None),
        (keys::NUM_2, Kp2, None),
        (keys::NUM_1, Kp1, None),
        (keys::LEFT_ARROW_CHAR, Equals, None),
        (keys::SLASH, Slash, None),
        (keys::SEMICOLON, Semicolon, None),
        (keys::K, K, None),
        (keys::NUM_6, Kp6, None),
        (keys::AT, LeftBracket, None),
        (keys::NUM_5, Kp5, None),
        (keys::NUM_4, Kp4, None),
        (keys::COLON, KpMultiply, None),
        (keys::L, L, None),
        (keys::I, I, None),
        (keys::BRACKET, RightBracket, None),
        (keys::LSHIFT, LeftShift, None),
        (keys::RSHIFT, RightShift, None),
    ]
};

/// The host key that only counts together with a host shift key.
pub const SHIFT_ONLY_KEY: HostKey = HostKey::Quote;

/// Joystick maps: matrix codes for up, down, left, right and fire.
pub const JOYSTICK_MAPS: [[u8; 5]; 2] = [
    // cursor keys and space
    [keys::UP, keys::DOWN, keys::LEFT, keys::RIGHT, keys::SPACE],
    // numeric keypad
    [keys::NUM_8, keys::NUM_2, keys::NUM_4, keys::NUM_6, keys::NUM_0],
];
