//! Host input to key matrix translation
//!
//! Two host styles drive the same [`KeyMatrix`]:
//!
//! - [`InputMapper`] serves a windowed host. It keeps the matrix between
//!   ticks and updates it either positionally or symbolically, plus an
//!   optional joystick mapping. Machine keys requested from a menu go through
//!   a timed combo: shift on the request, target key one tick later, both
//!   released one tick after that.
//! - [`PluginInput`] serves a plugin host that polls everything each tick. It
//!   rebuilds the matrix from scratch every tick, and shortcut controls
//!   trigger combos guarded by a debounce so a held button fires once. A
//!   held shoulder button turns the pad into an [`OnScreenKeyboard`].
//!
//! Both are selected through [`InputFrontend`].

use crate::keyboard::{keys, KeyMatrix, KEY_COUNT, ROW_RELEASED, SHIFT_ROW, SHIFT_ROW_LSHIFT};
use crate::keymap::{
    HostKey, SymbolicKey, JOYSTICK_MAPS, PLUGIN_KEY_MAP, POSITIONAL_MAP, SHIFT_ONLY_KEY,
    SYMBOLIC_MAP,
};
use crate::osk::OnScreenKeyboard;
use emu_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ticks a shortcut stays debounced after a release-and-press.
pub const DEBOUNCE_NORMAL: u32 = 30;
/// Ticks between auto-repeats when a shortcut is held through its cooldown.
pub const DEBOUNCE_FAST: u32 = 5;

/// Joypad buttons known to the plugin host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadButton {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
    L,
    L2,
}

/// Anything the host can report as held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Key(HostKey),
    Pad(PadButton),
}

/// Snapshot of host input for one tick.
pub trait HostInput {
    fn is_down(&self, control: Control) -> bool;

    fn host_shift(&self) -> bool {
        self.is_down(Control::Key(HostKey::LeftShift))
            || self.is_down(Control::Key(HostKey::RightShift))
    }
}

impl HostInput for HashSet<Control> {
    fn is_down(&self, control: Control) -> bool {
        self.contains(&control)
    }
}

/// Keyboard interpretation for the windowed host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingMode {
    /// Host keys stand where the P2000 keys stand
    Positional,
    /// Host keys type the character printed on them
    #[default]
    Symbolic,
}

/// Which joystick layout a windowed host uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoystickMap {
    #[default]
    Cursor,
    Keypad,
}

impl JoystickMap {
    fn codes(self) -> &'static [u8; 5] {
        match self {
            JoystickMap::Cursor => &JOYSTICK_MAPS[0],
            JoystickMap::Keypad => &JOYSTICK_MAPS[1],
        }
    }
}

/// Shifted keypad keys with a dedicated meaning for the tape monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineKey {
    Zoek,
    Start,
    Stop,
    ClearCassette,
}

impl MachineKey {
    pub fn code(self) -> u8 {
        match self {
            MachineKey::Zoek => keys::ZOEK,
            MachineKey::Start => keys::START,
            MachineKey::Stop => keys::STOP,
            MachineKey::ClearCassette => keys::CLEAR_CASSETTE,
        }
    }
}

/// Progress of a shift + key combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComboPhase {
    #[default]
    Idle,
    /// Shift pressed, target waits for the next tick
    ShiftDown(u8),
    /// Shift and target both pressed
    TargetDown(u8),
}

/// A single pending shifted key press.
#[derive(Debug, Clone, Default)]
pub struct ComboKeyQueue {
    phase: ComboPhase,
}

impl ComboKeyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ComboPhase {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase != ComboPhase::Idle
    }

    /// Press shift now and queue `code` for the next tick.
    ///
    /// Returns false, leaving everything as it was, while another combo is
    /// still in flight.
    pub fn request(&mut self, code: u8, matrix: &mut KeyMatrix) -> bool {
        if self.is_pending() {
            log(LogCategory::Input, LogLevel::Debug, || {
                format!("combo for key {code} rejected, {:?} pending", self.phase)
            });
            return false;
        }
        matrix.press(keys::LSHIFT);
        self.phase = ComboPhase::ShiftDown(code);
        log(LogCategory::Input, LogLevel::Debug, || {
            format!("combo queued: shift + key {code}")
        });
        true
    }

    /// Timed advance for control-less combos.
    ///
    /// Returns true when the combo consumed this tick, in which case no other
    /// input may be processed.
    pub fn advance_timed(&mut self, matrix: &mut KeyMatrix) -> bool {
        match self.phase {
            ComboPhase::Idle => false,
            ComboPhase::ShiftDown(code) => {
                matrix.press(code);
                self.phase = ComboPhase::TargetDown(code);
                true
            }
            ComboPhase::TargetDown(_) => {
                self.release(matrix);
                true
            }
        }
    }

    /// Keep the target pressed while the triggering control is held.
    pub fn hold(&mut self, matrix: &mut KeyMatrix) {
        if let ComboPhase::ShiftDown(code) | ComboPhase::TargetDown(code) = self.phase {
            matrix.press(code);
            self.phase = ComboPhase::TargetDown(code);
        }
    }

    /// Release shift and the target, back to idle.
    pub fn release(&mut self, matrix: &mut KeyMatrix) {
        if let ComboPhase::ShiftDown(code) | ComboPhase::TargetDown(code) = self.phase {
            matrix.release(code);
            matrix.release(keys::LSHIFT);
        }
        self.phase = ComboPhase::Idle;
    }

    /// Forget the combo without touching the matrix.
    pub fn clear(&mut self) {
        self.phase = ComboPhase::Idle;
    }
}

/// Result of polling a [`Debounce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePoll {
    /// Nothing armed
    Inactive,
    /// Source still held inside its cooldown; skip other input
    Blocking,
    /// Cooldown just ended
    Ended,
}

/// Suppresses repeated triggering by a held control.
#[derive(Debug, Clone)]
pub struct Debounce {
    source: Option<Control>,
    remaining: u32,
    next_init: u32,
}

impl Debounce {
    pub fn new() -> Self {
        Self {
            source: None,
            remaining: 0,
            next_init: DEBOUNCE_NORMAL,
        }
    }

    pub fn arm(&mut self, control: Control) {
        self.source = Some(control);
        self.remaining = self.next_init;
    }

    pub fn is_armed(&self) -> bool {
        self.source.is_some()
    }

    pub fn source(&self) -> Option<Control> {
        self.source
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Cooldown the next [`arm`](Self::arm) will start with.
    pub fn next_cooldown(&self) -> u32 {
        self.next_init
    }

    /// Counts down only while the source is held. A source held through the
    /// whole cooldown makes the next one short, so holding auto-repeats.
    pub fn poll(&mut self, host: &dyn HostInput) -> DebouncePoll {
        let Some(source) = self.source else {
            return DebouncePoll::Inactive;
        };
        if host.is_down(source) {
            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining > 0 {
                return DebouncePoll::Blocking;
            }
        }
        self.next_init = if self.remaining != 0 {
            DEBOUNCE_NORMAL
        } else {
            DEBOUNCE_FAST
        };
        self.source = None;
        DebouncePoll::Ended
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new()
    }
}

/// Joystick to key mapping for the windowed host.
#[derive(Debug, Clone, Default)]
pub struct JoystickMapper {
    map: JoystickMap,
    last: [bool; 5],
}

const JOYSTICK_INPUTS: [PadButton; 5] = [
    PadButton::Up,
    PadButton::Down,
    PadButton::Left,
    PadButton::Right,
    PadButton::A,
];

impl JoystickMapper {
    pub fn new(map: JoystickMap) -> Self {
        Self {
            map,
            last: [false; 5],
        }
    }

    pub fn map(&self) -> JoystickMap {
        self.map
    }

    /// Switch layouts, releasing whatever the old layout held.
    pub fn set_map(&mut self, map: JoystickMap, matrix: &mut KeyMatrix) {
        if map == self.map {
            return;
        }
        self.release_held(matrix);
        self.map = map;
    }

    fn release_held(&mut self, matrix: &mut KeyMatrix) {
        for (held, &code) in self.last.iter_mut().zip(self.map.codes()) {
            if *held {
                matrix.release(code);
                *held = false;
            }
        }
    }

    /// Held inputs press their key every tick; a key is released once, on the
    /// tick its input lets go.
    pub fn apply(&mut self, host: &dyn HostInput, matrix: &mut KeyMatrix) {
        let codes = self.map.codes();
        for i in 0..JOYSTICK_INPUTS.len() {
            if host.is_down(Control::Pad(JOYSTICK_INPUTS[i])) {
                matrix.press(codes[i]);
                self.last[i] = true;
            } else {
                if self.last[i] {
                    matrix.release(codes[i]);
                }
                self.last[i] = false;
            }
        }
    }
}

/// Windowed host keyboard, joystick and menu key mapping.
#[derive(Debug, Clone)]
pub struct InputMapper {
    mode: MappingMode,
    queued: Vec<bool>,
    active: Vec<bool>,
    combo: ComboKeyQueue,
    joystick: Option<JoystickMapper>,
}

impl InputMapper {
    pub fn new(mode: MappingMode) -> Self {
        Self {
            mode,
            queued: vec![false; SYMBOLIC_MAP.len()],
            active: vec![false; SYMBOLIC_MAP.len()],
            combo: ComboKeyQueue::new(),
            joystick: None,
        }
    }

    pub fn mode(&self) -> MappingMode {
        self.mode
    }

    /// Change the mapping mode. Every key is released so nothing stays stuck
    /// from the old interpretation.
    pub fn set_mode(&mut self, mode: MappingMode, matrix: &mut KeyMatrix) {
        if mode == self.mode {
            return;
        }
        log(LogCategory::Input, LogLevel::Info, || {
            format!("keyboard mapping {:?} -> {:?}", self.mode, mode)
        });
        self.mode = mode;
        self.queued.iter_mut().for_each(|q| *q = false);
        self.active.iter_mut().for_each(|a| *a = false);
        self.combo.clear();
        matrix.release_all();
    }

    /// Enable, re-map or disable (`None`) the joystick.
    pub fn set_joystick(&mut self, map: Option<JoystickMap>, matrix: &mut KeyMatrix) {
        match map {
            Some(map) => {
                if let Some(joystick) = self.joystick.as_mut() {
                    joystick.set_map(map, matrix);
                } else {
                    self.joystick = Some(JoystickMapper::new(map));
                }
            }
            None => {
                if let Some(joystick) = self.joystick.as_mut() {
                    joystick.release_held(matrix);
                }
                self.joystick = None;
            }
        }
    }

    pub fn joystick(&self) -> Option<&JoystickMapper> {
        self.joystick.as_ref()
    }

    pub fn combo(&self) -> &ComboKeyQueue {
        &self.combo
    }

    /// Queue a machine key from a menu action.
    pub fn request_machine_key(&mut self, key: MachineKey, matrix: &mut KeyMatrix) -> bool {
        self.combo.request(key.code(), matrix)
    }

    pub fn tick(&mut self, host: &dyn HostInput, matrix: &mut KeyMatrix) {
        if self.combo.advance_timed(matrix) {
            return;
        }
        match self.mode {
            MappingMode::Positional => Self::map_positional(host, matrix),
            MappingMode::Symbolic => self.map_symbolic(host, matrix),
        }
        if let Some(joystick) = self.joystick.as_mut() {
            joystick.apply(host, matrix);
        }
    }

    fn map_positional(host: &dyn HostInput, matrix: &mut KeyMatrix) {
        for code in 0..KEY_COUNT {
            if let Some(key) = POSITIONAL_MAP[code as usize] {
                matrix.set(code, host.is_down(Control::Key(key)));
            }
        }
    }

    fn map_symbolic(&mut self, host: &dyn HostInput, matrix: &mut KeyMatrix) {
        let host_shift = host.host_shift();
        // Sampled once so a shift forced this tick is only seen next tick
        let emulated_shift = matrix.row(SHIFT_ROW) != ROW_RELEASED;
        let mut special = false;

        for (i, row) in SYMBOLIC_MAP.iter().enumerate() {
            let (code, needs_shift) = row.wanted(host_shift);
            let normal = row.is_normal();

            if self.queued[i] || host.is_down(Control::Key(row.trigger)) {
                if row.is_combi() {
                    matrix.release(row.alternate(host_shift));
                }
                if normal || needs_shift == emulated_shift {
                    self.queued[i] = false;
                    matrix.press(code);
                } else {
                    matrix.set_row(
                        SHIFT_ROW,
                        if needs_shift {
                            SHIFT_ROW_LSHIFT
                        } else {
                            ROW_RELEASED
                        },
                    );
                    self.queued[i] = true;
                }
                self.active[i] = true;
                if !normal {
                    special = true;
                }
            } else if self.active[i] {
                Self::release_row(row, host_shift, matrix);
                self.active[i] = false;
            }
        }

        if !special {
            for (key, code) in [
                (HostKey::LeftShift, keys::LSHIFT),
                (HostKey::RightShift, keys::RSHIFT),
                (HostKey::CapsLock, keys::SHIFT_LOCK),
            ] {
                matrix.set(code, host.is_down(Control::Key(key)));
            }
        }
    }

    fn release_row(row: &SymbolicKey, host_shift: bool, matrix: &mut KeyMatrix) {
        if row.is_combi() {
            matrix.release(row.alternate(host_shift));
        }
        matrix.release(row.wanted(host_shift).0);
    }
}

/// Plugin host keyboard and joypad handling.
#[derive(Debug, Clone, Default)]
pub struct PluginInput {
    combo: ComboKeyQueue,
    debounce: Debounce,
    /// Combo came from a menu action and runs on the timed path
    timed: bool,
    osk: OnScreenKeyboard,
}

impl PluginInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn combo(&self) -> &ComboKeyQueue {
        &self.combo
    }

    pub fn debounce(&self) -> &Debounce {
        &self.debounce
    }

    pub fn osk(&self) -> &OnScreenKeyboard {
        &self.osk
    }

    /// Machine key from a menu action. There is no control to wait for, so
    /// the combo is released by the timed path.
    pub fn request_machine_key(&mut self, key: MachineKey, matrix: &mut KeyMatrix) -> bool {
        let accepted = self.combo.request(key.code(), matrix);
        self.timed |= accepted;
        accepted
    }

    /// Combo requested by a host control. Only an accepted combo debounces
    /// its control, so a rejected one cannot steal the cooldown.
    fn trigger(&mut self, control: Control, code: u8, matrix: &mut KeyMatrix) {
        if self.combo.request(code, matrix) {
            self.debounce.arm(control);
        }
    }

    /// Pad input while the on-screen keyboard is up. Returns false when the
    /// keyboard is hidden and normal mapping applies.
    fn on_screen_keyboard(&mut self, host: &dyn HostInput, matrix: &mut KeyMatrix) -> bool {
        let held = |buttons: [PadButton; 2]| {
            buttons
                .into_iter()
                .find(|&button| host.is_down(Control::Pad(button)))
        };
        self.osk.set_visible(held([PadButton::L, PadButton::L2]).is_some());
        if !self.osk.is_visible() {
            return false;
        }

        if let Some(button) = held([PadButton::Left, PadButton::Down]) {
            self.osk.select_previous();
            self.debounce.arm(Control::Pad(button));
        } else if let Some(button) = held([PadButton::Right, PadButton::Up]) {
            self.osk.select_next();
            self.debounce.arm(Control::Pad(button));
        }

        if let Some(button) = held([PadButton::A, PadButton::B]) {
            let key = self.osk.selected();
            log(LogCategory::Input, LogLevel::Debug, || {
                format!("on-screen key {:?}", key.ascii as char)
            });
            if key.shifted {
                self.trigger(Control::Pad(button), key.code, matrix);
            } else {
                matrix.press(key.code);
                self.debounce.arm(Control::Pad(button));
            }
        }
        true
    }

    pub fn tick(&mut self, host: &dyn HostInput, matrix: &mut KeyMatrix) {
        if self.timed {
            let consumed = self.combo.advance_timed(matrix);
            self.timed = self.combo.is_pending();
            if consumed {
                return;
            }
        }

        self.combo.hold(matrix);

        match self.debounce.poll(host) {
            DebouncePoll::Blocking => return,
            DebouncePoll::Ended => {
                log(LogCategory::Input, LogLevel::Trace, || {
                    format!("debounce ended, next cooldown {}", self.debounce.next_init)
                });
                self.combo.clear();
            }
            DebouncePoll::Inactive => {}
        }

        matrix.release_all();

        if self.on_screen_keyboard(host, matrix) {
            return;
        }

        let shift = host.host_shift();
        for &(code, primary, alternate) in PLUGIN_KEY_MAP {
            let counts =
                |key: HostKey| host.is_down(Control::Key(key)) && (key != SHIFT_ONLY_KEY || shift);
            if counts(primary) || alternate.is_some_and(counts) {
                matrix.press(code);
            }
        }

        for (key, machine_key) in [
            (HostKey::F1, MachineKey::Start),
            (HostKey::F2, MachineKey::Stop),
            (HostKey::F3, MachineKey::Zoek),
        ] {
            let control = Control::Key(key);
            if host.is_down(control) {
                self.trigger(control, machine_key.code(), matrix);
            }
        }

        for (button, code) in [
            (PadButton::Up, keys::UP),
            (PadButton::Down, keys::DOWN),
            (PadButton::Left, keys::LEFT),
            (PadButton::Right, keys::RIGHT),
        ] {
            if host.is_down(Control::Pad(button)) {
                matrix.press(code);
            }
        }
        if host.is_down(Control::Pad(PadButton::A)) || host.is_down(Control::Pad(PadButton::B)) {
            matrix.press(keys::SPACE);
        }

        for (button, machine_key) in [
            (PadButton::Start, MachineKey::Start),
            (PadButton::Select, MachineKey::Stop),
        ] {
            let control = Control::Pad(button);
            if host.is_down(control) {
                self.trigger(control, machine_key.code(), matrix);
            }
        }
    }
}

/// Host style selected in the machine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStyle {
    #[default]
    Windowed,
    Plugin,
}

/// The active input adapter of a session.
#[derive(Debug, Clone)]
pub enum InputFrontend {
    Windowed(InputMapper),
    Plugin(PluginInput),
}

impl InputFrontend {
    pub fn new(style: HostStyle, mode: MappingMode, joystick: Option<JoystickMap>) -> Self {
        match style {
            HostStyle::Windowed => {
                let mut mapper = InputMapper::new(mode);
                mapper.joystick = joystick.map(JoystickMapper::new);
                InputFrontend::Windowed(mapper)
            }
            HostStyle::Plugin => InputFrontend::Plugin(PluginInput::new()),
        }
    }

    pub fn tick(&mut self, host: &dyn HostInput, matrix: &mut KeyMatrix) {
        match self {
            InputFrontend::Windowed(mapper) => mapper.tick(host, matrix),
            InputFrontend::Plugin(plugin) => plugin.tick(host, matrix),
        }
    }

    /// Queue a machine key from a menu action.
    pub fn request_machine_key(&mut self, key: MachineKey, matrix: &mut KeyMatrix) -> bool {
        match self {
            InputFrontend::Windowed(mapper) => mapper.request_machine_key(key, matrix),
            InputFrontend::Plugin(plugin) => plugin.request_machine_key(key, matrix),
        }
    }

    /// The on-screen keyboard while it is shown.
    pub fn osk(&self) -> Option<&OnScreenKeyboard> {
        match self {
            InputFrontend::Plugin(plugin) if plugin.osk.is_visible() => Some(&plugin.osk),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(controls: &[Control]) -> HashSet<Control> {
        controls.iter().copied().collect()
    }

    fn key(k: HostKey) -> Control {
        Control::Key(k)
    }

    #[test]
    fn combo_rejects_while_pending() {
        let mut matrix = KeyMatrix::new();
        let mut combo = ComboKeyQueue::new();
        assert!(combo.request(keys::START, &mut matrix));
        assert!(!combo.request(keys::STOP, &mut matrix));
        assert_eq!(combo.phase(), ComboPhase::ShiftDown(keys::START));
        assert!(!matrix.is_pressed(keys::STOP));
    }

    #[test]
    fn timed_combo_sequence() {
        let mut matrix = KeyMatrix::new();
        let mut combo = ComboKeyQueue::new();
        combo.request(keys::ZOEK, &mut matrix);
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert!(!matrix.is_pressed(keys::ZOEK));

        assert!(combo.advance_timed(&mut matrix));
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert!(matrix.is_pressed(keys::ZOEK));

        assert!(combo.advance_timed(&mut matrix));
        assert_eq!(matrix, KeyMatrix::new());
        assert!(!combo.advance_timed(&mut matrix));
        assert!(!combo.is_pending());
    }

    #[test]
    fn debounce_normal_after_early_release() {
        let mut debounce = Debounce::new();
        let source = Control::Key(HostKey::F1);
        debounce.arm(source);
        assert_eq!(debounce.remaining(), DEBOUNCE_NORMAL);

        let pressed = held(&[source]);
        for _ in 0..10 {
            assert_eq!(debounce.poll(&pressed), DebouncePoll::Blocking);
        }
        assert_eq!(debounce.poll(&HashSet::new()), DebouncePoll::Ended);
        assert_eq!(debounce.next_cooldown(), DEBOUNCE_NORMAL);
        assert_eq!(debounce.poll(&pressed), DebouncePoll::Inactive);
    }

    #[test]
    fn debounce_fast_after_running_out() {
        let mut debounce = Debounce::new();
        let source = Control::Pad(PadButton::Start);
        let pressed = held(&[source]);
        debounce.arm(source);

        // 29 blocking ticks, the 30th decrement reaches zero and ends it
        for _ in 0..DEBOUNCE_NORMAL - 1 {
            assert_eq!(debounce.poll(&pressed), DebouncePoll::Blocking);
        }
        assert_eq!(debounce.poll(&pressed), DebouncePoll::Ended);
        assert_eq!(debounce.next_cooldown(), DEBOUNCE_FAST);

        debounce.arm(source);
        assert_eq!(debounce.remaining(), DEBOUNCE_FAST);
    }

    #[test]
    fn positional_follows_host_keys() {
        let mut matrix = KeyMatrix::new();
        let mut mapper = InputMapper::new(MappingMode::Positional);
        mapper.tick(&held(&[key(HostKey::Q), key(HostKey::LeftShift)]), &mut matrix);
        assert!(matrix.is_pressed(keys::Q));
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert_eq!(matrix.pressed_count(), 2);

        mapper.tick(&HashSet::new(), &mut matrix);
        assert_eq!(matrix, KeyMatrix::new());
    }

    #[test]
    fn symbolic_normal_key_presses_immediately() {
        let mut matrix = KeyMatrix::new();
        let mut mapper = InputMapper::new(MappingMode::Symbolic);
        mapper.tick(&held(&[key(HostKey::A)]), &mut matrix);
        assert!(matrix.is_pressed(keys::A));
        assert!(!matrix.shift_down());

        mapper.tick(&HashSet::new(), &mut matrix);
        assert!(!matrix.is_pressed(keys::A));
    }

    #[test]
    fn symbolic_shift_then_key_on_next_tick() {
        let mut matrix = KeyMatrix::new();
        let mut mapper = InputMapper::new(MappingMode::Symbolic);
        // Unshifted quote needs the emulated shift
        let input = held(&[key(HostKey::Quote)]);

        mapper.tick(&input, &mut matrix);
        assert_eq!(matrix.row(SHIFT_ROW), SHIFT_ROW_LSHIFT);
        assert!(!matrix.is_pressed(keys::DIGIT_7));

        mapper.tick(&input, &mut matrix);
        assert!(matrix.shift_down());
        assert!(matrix.is_pressed(keys::DIGIT_7));

        // Release: the key goes, then shift follows the host again
        mapper.tick(&HashSet::new(), &mut matrix);
        assert!(!matrix.is_pressed(keys::DIGIT_7));
        assert!(!matrix.shift_down());
    }

    #[test]
    fn symbolic_shifted_host_key_without_emulated_shift() {
        let mut matrix = KeyMatrix::new();
        let mut mapper = InputMapper::new(MappingMode::Symbolic);

        // Host shift alone passes through
        mapper.tick(&held(&[key(HostKey::LeftShift)]), &mut matrix);
        assert!(matrix.is_pressed(keys::LSHIFT));

        // Shift + ';' is ':' which the P2000 types unshifted
        let input = held(&[key(HostKey::LeftShift), key(HostKey::Semicolon)]);
        mapper.tick(&input, &mut matrix);
        assert!(!matrix.shift_down());
        assert!(!matrix.is_pressed(keys::COLON));

        mapper.tick(&input, &mut matrix);
        assert!(!matrix.shift_down());
        assert!(matrix.is_pressed(keys::COLON));
        assert!(!matrix.is_pressed(keys::SEMICOLON));
    }

    #[test]
    fn mode_switch_releases_everything() {
        let mut matrix = KeyMatrix::new();
        let mut mapper = InputMapper::new(MappingMode::Positional);
        mapper.tick(&held(&[key(HostKey::Z)]), &mut matrix);
        assert!(matrix.is_pressed(keys::Z));

        mapper.set_mode(MappingMode::Symbolic, &mut matrix);
        assert_eq!(matrix, KeyMatrix::new());
        assert_eq!(mapper.mode(), MappingMode::Symbolic);
    }

    #[test]
    fn menu_combo_blocks_other_input() {
        let mut matrix = KeyMatrix::new();
        let mut mapper = InputMapper::new(MappingMode::Positional);
        assert!(mapper.request_machine_key(MachineKey::Start, &mut matrix));

        let input = held(&[key(HostKey::Q)]);
        mapper.tick(&input, &mut matrix);
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert!(matrix.is_pressed(keys::NUM_3));
        assert!(!matrix.is_pressed(keys::Q));

        mapper.tick(&input, &mut matrix);
        assert!(!matrix.is_pressed(keys::NUM_3));
        assert!(!matrix.is_pressed(keys::Q));

        mapper.tick(&input, &mut matrix);
        assert!(matrix.is_pressed(keys::Q));
    }

    #[test]
    fn joystick_releases_on_edge_only() {
        let mut matrix = KeyMatrix::new();
        let mut joystick = JoystickMapper::new(JoystickMap::Cursor);
        joystick.apply(&held(&[Control::Pad(PadButton::A)]), &mut matrix);
        assert!(matrix.is_pressed(keys::SPACE));

        joystick.apply(&HashSet::new(), &mut matrix);
        assert!(!matrix.is_pressed(keys::SPACE));

        // A key pressed by someone else is not released by an idle stick
        matrix.press(keys::SPACE);
        joystick.apply(&HashSet::new(), &mut matrix);
        assert!(matrix.is_pressed(keys::SPACE));
    }

    #[test]
    fn joystick_keypad_map() {
        let mut matrix = KeyMatrix::new();
        let mut joystick = JoystickMapper::new(JoystickMap::Keypad);
        joystick.apply(&held(&[Control::Pad(PadButton::Left)]), &mut matrix);
        assert!(matrix.is_pressed(keys::NUM_4));

        joystick.set_map(JoystickMap::Cursor, &mut matrix);
        assert!(!matrix.is_pressed(keys::NUM_4));
        assert_eq!(joystick.map(), JoystickMap::Cursor);
    }

    #[test]
    fn plugin_rebuilds_matrix_each_tick() {
        let mut matrix = KeyMatrix::new();
        let mut plugin = PluginInput::new();
        plugin.tick(&held(&[key(HostKey::Kp0), Control::Pad(PadButton::Up)]), &mut matrix);
        assert!(matrix.is_pressed(keys::NUM_0));
        assert!(matrix.is_pressed(keys::UP));

        plugin.tick(&held(&[key(HostKey::Delete)]), &mut matrix);
        assert!(!matrix.is_pressed(keys::NUM_0));
        assert!(matrix.is_pressed(keys::NUM_PERIOD));
    }

    #[test]
    fn plugin_quote_needs_shift() {
        let mut matrix = KeyMatrix::new();
        let mut plugin = PluginInput::new();
        plugin.tick(&held(&[key(HostKey::Quote)]), &mut matrix);
        assert!(!matrix.is_pressed(keys::DIGIT_2));

        plugin.tick(&held(&[key(HostKey::Quote), key(HostKey::RightShift)]), &mut matrix);
        assert!(matrix.is_pressed(keys::DIGIT_2));
        assert!(matrix.is_pressed(keys::RSHIFT));
    }

    #[test]
    fn plugin_shortcut_combo_with_debounce() {
        let mut matrix = KeyMatrix::new();
        let mut plugin = PluginInput::new();
        let f1 = held(&[key(HostKey::F1)]);

        plugin.tick(&f1, &mut matrix);
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert!(!matrix.is_pressed(keys::NUM_3));

        // Held: target pressed, rest of input ignored
        plugin.tick(&held(&[key(HostKey::F1), key(HostKey::Q)]), &mut matrix);
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert!(matrix.is_pressed(keys::NUM_3));
        assert!(!matrix.is_pressed(keys::Q));

        // Released: combo gone, matrix rebuilt
        plugin.tick(&held(&[key(HostKey::Q)]), &mut matrix);
        assert!(!plugin.combo().is_pending());
        assert!(!matrix.is_pressed(keys::LSHIFT));
        assert!(!matrix.is_pressed(keys::NUM_3));
        assert!(matrix.is_pressed(keys::Q));
        assert_eq!(plugin.debounce().next_cooldown(), DEBOUNCE_NORMAL);
    }

    #[test]
    fn plugin_select_is_stop() {
        let mut matrix = KeyMatrix::new();
        let mut plugin = PluginInput::new();
        let select = held(&[Control::Pad(PadButton::Select)]);
        plugin.tick(&select, &mut matrix);
        plugin.tick(&select, &mut matrix);
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert!(matrix.is_pressed(keys::STOP));
    }

    #[test]
    fn plugin_menu_key_uses_timed_combo() {
        let mut matrix = KeyMatrix::new();
        let mut frontend = InputFrontend::new(HostStyle::Plugin, MappingMode::Symbolic, None);
        assert!(frontend.request_machine_key(MachineKey::Zoek, &mut matrix));
        assert!(matrix.is_pressed(keys::LSHIFT));

        let idle = held(&[]);
        frontend.tick(&idle, &mut matrix);
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert!(matrix.is_pressed(keys::ZOEK));

        frontend.tick(&idle, &mut matrix);
        assert!(!matrix.is_pressed(keys::LSHIFT));
        assert!(!matrix.is_pressed(keys::ZOEK));

        frontend.tick(&held(&[key(HostKey::A)]), &mut matrix);
        assert!(matrix.is_pressed(keys::A));
        assert!(frontend.request_machine_key(MachineKey::Start, &mut matrix));
    }

    #[test]
    fn symbolic_combi_row_released_after_shift() {
        let mut matrix = KeyMatrix::new();
        let mut mapper = InputMapper::new(MappingMode::Symbolic);
        // Shift + '=' is '+', typed as shift + ';'
        let plus = held(&[key(HostKey::LeftShift), key(HostKey::Equals)]);
        mapper.tick(&plus, &mut matrix);
        mapper.tick(&plus, &mut matrix);
        assert!(matrix.is_pressed(keys::SEMICOLON));
        assert!(matrix.shift_down());

        // Both keys let go together: the host no longer reports shift
        mapper.tick(&HashSet::new(), &mut matrix);
        assert!(!matrix.is_pressed(keys::SEMICOLON));
        assert!(!matrix.is_pressed(keys::MINUS));
        assert!(!matrix.shift_down());

        // Shift up first: the row switches to '=' and then releases it
        mapper.tick(&plus, &mut matrix);
        mapper.tick(&plus, &mut matrix);
        mapper.tick(&held(&[key(HostKey::Equals)]), &mut matrix);
        assert!(matrix.is_pressed(keys::MINUS));
        assert!(!matrix.is_pressed(keys::SEMICOLON));
        mapper.tick(&HashSet::new(), &mut matrix);
        assert!(!matrix.is_pressed(keys::MINUS));
        assert!(!matrix.is_pressed(keys::SEMICOLON));
        assert!(!matrix.shift_down());
    }

    #[test]
    fn rejected_shortcut_does_not_take_the_debounce() {
        let mut matrix = KeyMatrix::new();
        let mut plugin = PluginInput::new();
        plugin.tick(&held(&[key(HostKey::F1), key(HostKey::F2)]), &mut matrix);
        assert_eq!(plugin.combo().phase(), ComboPhase::ShiftDown(keys::START));
        assert_eq!(plugin.debounce().source(), Some(key(HostKey::F1)));

        // Releasing F1 ends its cooldown, then the held F2 gets its turn
        plugin.tick(&held(&[key(HostKey::F2)]), &mut matrix);
        assert_eq!(plugin.combo().phase(), ComboPhase::ShiftDown(keys::STOP));
        assert_eq!(plugin.debounce().source(), Some(key(HostKey::F2)));
    }

    fn pad(button: PadButton) -> Control {
        Control::Pad(button)
    }

    #[test]
    fn osk_shown_while_shoulder_held() {
        let mut matrix = KeyMatrix::new();
        let mut frontend = InputFrontend::new(HostStyle::Plugin, MappingMode::Symbolic, None);

        frontend.tick(&held(&[pad(PadButton::L), key(HostKey::Q)]), &mut matrix);
        assert!(frontend.osk().is_some());
        assert!(!matrix.is_pressed(keys::Q));

        frontend.tick(&held(&[pad(PadButton::L2)]), &mut matrix);
        assert!(frontend.osk().is_some());

        frontend.tick(&held(&[key(HostKey::Q)]), &mut matrix);
        assert!(frontend.osk().is_none());
        assert!(matrix.is_pressed(keys::Q));

        let windowed = InputFrontend::new(HostStyle::Windowed, MappingMode::Symbolic, None);
        assert!(windowed.osk().is_none());
    }

    #[test]
    fn osk_navigation_is_debounced() {
        let mut matrix = KeyMatrix::new();
        let mut plugin = PluginInput::new();
        let shoulder = held(&[pad(PadButton::L)]);
        let left = held(&[pad(PadButton::L), pad(PadButton::Left)]);

        plugin.tick(&left, &mut matrix);
        assert_eq!(plugin.osk().selected().ascii, b'z');
        assert_eq!(plugin.debounce().source(), Some(pad(PadButton::Left)));
        assert!(!matrix.is_pressed(keys::LEFT));

        // Held inside the cooldown: no further movement
        plugin.tick(&left, &mut matrix);
        plugin.tick(&left, &mut matrix);
        assert_eq!(plugin.osk().selected().ascii, b'z');

        plugin.tick(&shoulder, &mut matrix);
        assert!(!plugin.debounce().is_armed());
        plugin.tick(&held(&[pad(PadButton::L), pad(PadButton::Right)]), &mut matrix);
        assert_eq!(plugin.osk().selected().ascii, b' ');
        plugin.tick(&shoulder, &mut matrix);
        plugin.tick(&held(&[pad(PadButton::L), pad(PadButton::Up)]), &mut matrix);
        assert_eq!(plugin.osk().selected().ascii, b'!');
    }

    #[test]
    fn osk_fire_types_plain_key() {
        let mut matrix = KeyMatrix::new();
        let mut plugin = PluginInput::new();
        let fire = held(&[pad(PadButton::L), pad(PadButton::A)]);

        plugin.tick(&fire, &mut matrix);
        assert!(matrix.is_pressed(keys::SPACE));
        assert!(!matrix.shift_down());
        assert_eq!(plugin.debounce().source(), Some(pad(PadButton::A)));

        plugin.tick(&fire, &mut matrix);
        assert!(matrix.is_pressed(keys::SPACE));

        plugin.tick(&held(&[pad(PadButton::L)]), &mut matrix);
        assert_eq!(matrix, KeyMatrix::new());
    }

    #[test]
    fn osk_fire_types_shifted_key_through_combo() {
        let mut matrix = KeyMatrix::new();
        let mut plugin = PluginInput::new();
        let shoulder = held(&[pad(PadButton::L)]);
        plugin.tick(&held(&[pad(PadButton::L), pad(PadButton::Right)]), &mut matrix);
        plugin.tick(&shoulder, &mut matrix);
        assert_eq!(plugin.osk().selected().ascii, b'!');

        let fire = held(&[pad(PadButton::L), pad(PadButton::B)]);
        plugin.tick(&fire, &mut matrix);
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert!(!matrix.is_pressed(keys::DIGIT_1));
        assert_eq!(plugin.combo().phase(), ComboPhase::ShiftDown(keys::DIGIT_1));

        plugin.tick(&fire, &mut matrix);
        assert!(matrix.is_pressed(keys::LSHIFT));
        assert!(matrix.is_pressed(keys::DIGIT_1));

        plugin.tick(&shoulder, &mut matrix);
        assert!(!plugin.combo().is_pending());
        assert_eq!(matrix, KeyMatrix::new());
    }
}
