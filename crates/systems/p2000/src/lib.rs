//! Philips P2000T system core
//!
//! Owns one emulation session: memories, key matrix, teletext timing, screen
//! cache, beeper synthesizer and input mapping. The Z80 itself lives outside
//! this crate and is driven through [`CpuBridge`]; rendered cells leave
//! through [`CellRenderer`].

pub mod bus;
pub mod config;
pub mod input;
pub mod keyboard;
pub mod keymap;
pub mod media;
pub mod mono;
pub mod osk;
pub mod palette;
pub mod saa5050;
pub mod savestate;
pub mod screen_cache;
pub mod sound;

pub use bus::P2000Bus;
pub use config::{ConfigError, MachineConfig};
pub use input::{Control, HostInput, InputFrontend, MachineKey, MappingMode, PadButton};
pub use keyboard::KeyMatrix;
pub use saa5050::{CellCommand, FlashTimer};
pub use savestate::{StateError, StateSerializer, Z80Registers};
pub use screen_cache::{DisplayEvent, DisplayModel, ScreenCache};
pub use sound::AudioSynthesizer;

use config::CPU_SPEEDS;
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::types::{AudioSample, InterruptRate};
use emu_core::{CycleCounter, MountPointInfo, System};
use input::JoystickMap;
use media::MediaError;
use sound::Volume;
use std::path::Path;

pub const CASSETTE: &str = "Cassette";
pub const CARTRIDGE: &str = "Cartridge";

#[derive(thiserror::Error, Debug)]
pub enum P2000Error {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid mount point {0}")]
    InvalidMountPoint(String),
    #[error("No data for mount point {0}")]
    EmptyMedia(String),
}

/// The Z80 side of the machine.
pub trait CpuBridge: CycleCounter {
    fn registers(&self) -> Z80Registers;
    fn set_registers(&mut self, registers: &Z80Registers);

    /// Run one interrupt period of `cycles` cycles against `bus`. Port writes
    /// pass the cycle position inside the period.
    fn execute_period(&mut self, bus: &mut P2000Bus, cycles: u32);

    fn reset(&mut self);
}

/// Receives the cells that changed since they were last drawn.
pub trait CellRenderer {
    fn draw_cell(&mut self, cell: &CellCommand);

    fn frame_done(&mut self) {}
}

pub struct P2000System<C: CpuBridge> {
    config: MachineConfig,
    cpu: C,
    bus: P2000Bus,
    flash: FlashTimer,
    cache: ScreenCache,
    audio: AudioSynthesizer,
    input: InputFrontend,
    state: StateSerializer,
    cassette: Option<Vec<u8>>,
    cartridge_loaded: bool,
    frames: u64,
}

impl<C: CpuBridge> P2000System<C> {
    pub fn new(config: MachineConfig, cpu: C) -> Result<Self, P2000Error> {
        config.validate()?;
        let mut audio =
            AudioSynthesizer::new(config.audio_model, config.interrupt_rate, config.volume);
        audio.set_enabled(config.sound);

        log(LogCategory::State, LogLevel::Info, || {
            format!(
                "P2000{:?}: {} KiB RAM, {} Hz, {}% CPU",
                config.model,
                config.ram_kb,
                config.interrupt_rate.hz(),
                config.cpu_speed
            )
        });

        Ok(Self {
            bus: P2000Bus::new(config.ram_len()),
            flash: FlashTimer::new(config.update_period),
            cache: ScreenCache::new(config.model),
            input: InputFrontend::new(config.host, config.keyboard, config.joystick),
            state: StateSerializer::new(config.ram_len()),
            audio,
            cpu,
            config,
            cassette: None,
            cartridge_loaded: false,
            frames: 0,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    pub fn bus(&self) -> &P2000Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut P2000Bus {
        &mut self.bus
    }

    pub fn audio(&self) -> &AudioSynthesizer {
        &self.audio
    }

    pub fn input(&self) -> &InputFrontend {
        &self.input
    }

    /// Bytes of the mounted cassette, for the tape routines of the CPU side.
    pub fn cassette(&self) -> Option<&[u8]> {
        self.cassette.as_deref()
    }

    /// One video interrupt: CPU burst, audio, screen, then input for the
    /// next burst. Returns the audio of the period.
    pub fn tick(
        &mut self,
        host: &dyn HostInput,
        renderer: &mut dyn CellRenderer,
    ) -> Vec<AudioSample> {
        let cycles = self.config.cycles_per_period();
        self.cpu.execute_period(&mut self.bus, cycles);
        log(LogCategory::CPU, LogLevel::Trace, || {
            format!("period {} ran {cycles} cycles", self.frames + 1)
        });

        for toggle in self.bus.drain_toggles() {
            self.audio.on_toggle(toggle.cycle_pos, toggle.level);
        }
        let samples = self.audio.flush(cycles);

        self.frames += 1;
        if self.frames % u64::from(self.config.update_period) == 0 {
            self.refresh_screen(renderer);
        }

        self.input.tick(host, self.bus.keys_mut());
        samples
    }

    fn refresh_screen(&mut self, renderer: &mut dyn CellRenderer) {
        let blank = self.flash.advance();
        let cache = &mut self.cache;
        let vram = self.bus.vram();
        let scroll = self.bus.scroll();
        let osk = self.input.osk();

        match self.config.model {
            DisplayModel::T => saa5050::decode_frame(vram, scroll, blank, |mut cell| {
                if let Some(osk) = osk {
                    osk.overlay(&mut cell);
                }
                if cache.should_draw(cell.col as usize, cell.row as usize, cell.fingerprint()) {
                    renderer.draw_cell(&cell);
                }
            }),
            DisplayModel::M => mono::decode_frame_mono(vram, scroll, |cell, fingerprint| {
                if cache.should_draw(cell.col as usize, cell.row as usize, fingerprint) {
                    renderer.draw_cell(&cell);
                }
            }),
        }
        renderer.frame_done();
    }

    /// Force every cell to be drawn on the next screen update.
    pub fn redraw(&mut self) {
        self.cache.invalidate_all();
    }

    pub fn display_event(&mut self, event: DisplayEvent) {
        self.cache.handle_event(event);
    }

    pub fn set_interrupt_rate(&mut self, rate: InterruptRate) {
        if rate == self.config.interrupt_rate {
            return;
        }
        self.config.set_interrupt_rate(rate);
        self.audio.set_interrupt_rate(rate);
        log(LogCategory::State, LogLevel::Info, || {
            format!("{} Hz, CPU speed {}%", rate.hz(), self.config.cpu_speed)
        });
    }

    pub fn set_model(&mut self, model: DisplayModel) {
        self.config.model = model;
        self.cache.resize(model);
    }

    pub fn set_cpu_speed(&mut self, percent: u32) -> Result<(), P2000Error> {
        if !CPU_SPEEDS.contains(&percent) {
            return Err(ConfigError::CpuSpeed(percent).into());
        }
        self.config.cpu_speed = percent;
        Ok(())
    }

    /// Only the windowed host has mapping modes and a joystick; the plugin
    /// host keeps the setting for the next session.
    pub fn set_mapping_mode(&mut self, mode: MappingMode) {
        self.config.keyboard = mode;
        if let InputFrontend::Windowed(mapper) = &mut self.input {
            mapper.set_mode(mode, self.bus.keys_mut());
        }
    }

    pub fn set_joystick(&mut self, map: Option<JoystickMap>) {
        self.config.joystick = map;
        if let InputFrontend::Windowed(mapper) = &mut self.input {
            mapper.set_joystick(map, self.bus.keys_mut());
        }
    }

    pub fn set_sound(&mut self, enabled: bool) {
        self.config.sound = enabled;
        self.audio.set_enabled(enabled);
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.config.volume = volume;
        self.audio.set_volume(volume);
    }

    /// Returns false when another machine key is still in progress.
    pub fn press_machine_key(&mut self, key: MachineKey) -> bool {
        self.input.request_machine_key(key, self.bus.keys_mut())
    }

    pub fn load_cassette_file(&mut self, path: &Path) -> Result<(), P2000Error> {
        let data = media::load_cassette(path)?;
        self.mount(CASSETTE, &data)
    }

    pub fn load_cartridge_file(&mut self, path: &Path) -> Result<(), P2000Error> {
        let data = media::load_cartridge(path)?;
        self.mount(CARTRIDGE, &data)
    }

    /// Save the visible screen; `.vram` is appended when missing.
    pub fn save_video_ram(&self, path: &Path) -> Result<(), P2000Error> {
        let path = media::append_extension_if_missing(path, "vram");
        media::save_video_ram_file(&path, self.bus.vram(), self.bus.scroll())?;
        Ok(())
    }

    pub fn load_video_ram(&mut self, path: &Path) -> Result<(), P2000Error> {
        let scroll = self.bus.scroll();
        media::load_video_ram_file(path, self.bus.vram_mut(), scroll)?;
        self.cache.invalidate_all();
        Ok(())
    }
}

impl<C: CpuBridge> System for P2000System<C> {
    type Error = P2000Error;

    fn reset(&mut self) {
        self.cpu.reset();
        self.bus.reset();
        self.flash = FlashTimer::new(self.config.update_period);
        self.cache.invalidate_all();
        self.input = InputFrontend::new(self.config.host, self.config.keyboard, self.config.joystick);
        self.audio = AudioSynthesizer::new(
            self.config.audio_model,
            self.config.interrupt_rate,
            self.config.volume,
        );
        self.audio.set_enabled(self.config.sound);
        self.frames = 0;
    }

    fn state_size(&self) -> usize {
        self.state.size()
    }

    fn save_state(&self, out: &mut [u8]) -> Result<(), Self::Error> {
        self.state
            .serialize(&self.cpu.registers(), self.bus.vram(), self.bus.ram(), out)?;
        Ok(())
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let image = self.state.deserialize(data)?;
        self.bus.vram_mut().copy_from_slice(image.vram);
        self.bus.ram_mut().copy_from_slice(image.ram);
        self.cpu.set_registers(&image.registers);
        self.cache.invalidate_all();
        log(LogCategory::State, LogLevel::Info, || {
            format!("state restored, PC {:04X}", image.registers.pc)
        });
        Ok(())
    }

    fn supports_save_states(&self) -> bool {
        true
    }

    fn mount_points(&self) -> Vec<MountPointInfo> {
        vec![
            MountPointInfo {
                id: CASSETTE.to_string(),
                name: "Cassette Deck".to_string(),
                extensions: vec!["cas".to_string(), "p2000t".to_string()],
                required: false,
            },
            MountPointInfo {
                id: CARTRIDGE.to_string(),
                name: "Cartridge Slot".to_string(),
                extensions: vec!["bin".to_string()],
                required: false,
            },
        ]
    }

    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
        if mount_point_id != CASSETTE && mount_point_id != CARTRIDGE {
            return Err(P2000Error::InvalidMountPoint(mount_point_id.to_string()));
        }
        if data.is_empty() {
            return Err(P2000Error::EmptyMedia(mount_point_id.to_string()));
        }

        if mount_point_id == CASSETTE {
            self.cassette = Some(data.to_vec());
        } else {
            self.bus.set_cartridge(data);
            self.cartridge_loaded = true;
        }
        log(LogCategory::State, LogLevel::Info, || {
            format!("{mount_point_id} mounted, {} bytes", data.len())
        });
        Ok(())
    }

    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
        match mount_point_id {
            CASSETTE => self.cassette = None,
            CARTRIDGE => {
                self.bus.clear_cartridge();
                self.cartridge_loaded = false;
            }
            _ => return Err(P2000Error::InvalidMountPoint(mount_point_id.to_string())),
        }
        Ok(())
    }

    fn is_mounted(&self, mount_point_id: &str) -> bool {
        match mount_point_id {
            CASSETTE => self.cassette.is_some(),
            CARTRIDGE => self.cartridge_loaded,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::PORT_BEEPER;
    use crate::input::HostStyle;
    use crate::keyboard::keys;
    use crate::sound::FilterModel;
    use std::collections::HashSet;

    #[derive(Default)]
    struct MockCpu {
        registers: Z80Registers,
        period: u32,
        /// Overrides the period length the CPU reports
        reported_period: Option<u32>,
        position: u32,
        beeps: Vec<(u32, bool)>,
        resets: u32,
    }

    impl CycleCounter for MockCpu {
        fn cycle_count(&self) -> u32 {
            self.position
        }

        fn cycles_per_period(&self) -> u32 {
            self.reported_period.unwrap_or(self.period)
        }
    }

    impl CpuBridge for MockCpu {
        fn registers(&self) -> Z80Registers {
            self.registers
        }

        fn set_registers(&mut self, registers: &Z80Registers) {
            self.registers = *registers;
        }

        fn execute_period(&mut self, bus: &mut P2000Bus, cycles: u32) {
            self.period = cycles;
            for &(pos, level) in &self.beeps {
                self.position = pos;
                bus.write_port(PORT_BEEPER, level as u8, pos);
            }
            self.position = cycles;
        }

        fn reset(&mut self) {
            self.resets += 1;
            self.registers = Z80Registers::default();
        }
    }

    #[derive(Default)]
    struct Recorder {
        cells: Vec<CellCommand>,
        frames: usize,
    }

    impl CellRenderer for Recorder {
        fn draw_cell(&mut self, cell: &CellCommand) {
            self.cells.push(*cell);
        }

        fn frame_done(&mut self) {
            self.frames += 1;
        }
    }

    fn system(config: MachineConfig) -> P2000System<MockCpu> {
        P2000System::new(config, MockCpu::default()).unwrap()
    }

    fn no_input() -> HashSet<Control> {
        HashSet::new()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = MachineConfig {
            ram_kb: 20,
            ..MachineConfig::default()
        };
        assert!(matches!(
            P2000System::new(config, MockCpu::default()),
            Err(P2000Error::Config(ConfigError::RamSize(20)))
        ));
    }

    #[test]
    fn unchanged_screen_is_drawn_once() {
        let mut sys = system(MachineConfig::default());
        let mut out = Recorder::default();

        sys.tick(&no_input(), &mut out);
        assert_eq!(out.cells.len(), saa5050::CELLS_PER_FRAME);
        assert_eq!(out.frames, 1);

        out.cells.clear();
        sys.tick(&no_input(), &mut out);
        assert!(out.cells.is_empty());

        sys.bus_mut().write(0x5000 + 3, b'A');
        sys.tick(&no_input(), &mut out);
        assert_eq!(out.cells.len(), 1);
        assert_eq!((out.cells[0].col, out.cells[0].row), (3, 0));
        assert_eq!(out.cells[0].glyph, b'A' - 32);

        out.cells.clear();
        sys.display_event(DisplayEvent::ScanlinesChanged);
        sys.tick(&no_input(), &mut out);
        assert_eq!(out.cells.len(), saa5050::CELLS_PER_FRAME);
    }

    #[test]
    fn update_period_skips_frames() {
        let config = MachineConfig {
            update_period: 2,
            ..MachineConfig::default()
        };
        let mut sys = system(config);
        let mut out = Recorder::default();
        sys.tick(&no_input(), &mut out);
        assert_eq!(out.frames, 0);
        sys.tick(&no_input(), &mut out);
        assert_eq!(out.frames, 1);
    }

    #[test]
    fn mono_model_draws_eighty_columns() {
        let mut sys = system(MachineConfig::default());
        sys.set_model(DisplayModel::M);
        let mut out = Recorder::default();
        sys.tick(&no_input(), &mut out);
        assert_eq!(out.cells.len(), 80 * 24);
        assert!(out.cells.iter().any(|c| c.col == 79));
    }

    #[test]
    fn beeper_reaches_audio_buffer() {
        let mut sys = system(MachineConfig::default());
        sys.cpu_mut().beeps = vec![(25_000, true)];
        let samples = sys.tick(&no_input(), &mut Recorder::default());
        assert_eq!(samples.len(), sys.audio().buffer_len());
        assert_eq!(samples[0], 0);
        assert!(samples.iter().any(|&s| s != 0));

        sys.set_sound(false);
        let samples = sys.tick(&no_input(), &mut Recorder::default());
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn interrupt_rate_switch_reconfigures() {
        let config = MachineConfig {
            audio_model: FilterModel::LowPass,
            ..MachineConfig::default()
        };
        let mut sys = system(config);
        assert_eq!(sys.audio().buffer_len(), 600);

        sys.set_interrupt_rate(InterruptRate::Hz60);
        assert_eq!(sys.config().cpu_speed, 120);
        assert_eq!(sys.audio().buffer_len(), 500);
        let samples = sys.tick(&no_input(), &mut Recorder::default());
        assert_eq!(samples.len(), 500);
        assert_eq!(sys.cpu().cycles_per_period(), 50_000);
    }

    #[test]
    fn cpu_speed_is_validated() {
        let mut sys = system(MachineConfig::default());
        assert!(sys.set_cpu_speed(200).is_ok());
        assert_eq!(sys.config().cycles_per_period(), 100_000);
        assert!(sys.set_cpu_speed(150).is_err());
        assert_eq!(sys.config().cpu_speed, 200);
    }

    #[test]
    fn input_is_applied_after_the_frame() {
        let mut sys = system(MachineConfig::default());
        let host: HashSet<Control> = [Control::Key(keymap::HostKey::A)].into_iter().collect();
        sys.tick(&host, &mut Recorder::default());
        assert!(sys.bus().keys().is_pressed(keys::A));
        assert_eq!(sys.bus().read_port(4), sys.bus().keys().row(4));
    }

    #[test]
    fn machine_key_runs_as_combo() {
        let mut sys = system(MachineConfig::default());
        assert!(sys.press_machine_key(MachineKey::Start));
        assert!(sys.bus().keys().is_pressed(keys::LSHIFT));
        assert!(!sys.press_machine_key(MachineKey::Stop));

        sys.tick(&no_input(), &mut Recorder::default());
        assert!(sys.bus().keys().is_pressed(keys::START));
        sys.tick(&no_input(), &mut Recorder::default());
        assert_eq!(sys.bus().keys().pressed_count(), 0);
    }

    #[test]
    fn mapping_mode_switch_releases_keys() {
        let mut sys = system(MachineConfig::default());
        sys.bus_mut().keys_mut().press(keys::Q);
        sys.set_mapping_mode(MappingMode::Positional);
        assert_eq!(sys.bus().keys().pressed_count(), 0);
        assert_eq!(sys.config().keyboard, MappingMode::Positional);
    }

    #[test]
    fn save_and_load_state() {
        let mut sys = system(MachineConfig::default());
        assert!(sys.supports_save_states());
        assert_eq!(sys.state_size(), 30 + 4096 + 16 * 1024);

        sys.bus_mut().write(0x5010, 0x41);
        sys.bus_mut().write(0x7000, 0x99);
        sys.cpu_mut().registers.pc = 0x1234;

        let mut blob = vec![0u8; sys.state_size()];
        sys.save_state(&mut blob).unwrap();

        sys.reset();
        assert_eq!(sys.bus().read(0x7000), 0);
        assert_eq!(sys.cpu().registers.pc, 0);

        sys.load_state(&blob).unwrap();
        assert_eq!(sys.bus().read(0x5010), 0x41);
        assert_eq!(sys.bus().read(0x7000), 0x99);
        assert_eq!(sys.cpu().registers.pc, 0x1234);
    }

    #[test]
    fn bad_state_leaves_machine_alone() {
        let mut sys = system(MachineConfig::default());
        sys.bus_mut().write(0x6000, 7);

        let mut short = vec![0xAAu8; 10];
        assert!(matches!(
            sys.save_state(&mut short),
            Err(P2000Error::State(StateError::SizeMismatch { .. }))
        ));
        assert!(short.iter().all(|&b| b == 0xAA));

        let wrong = vec![0u8; sys.state_size() + 1];
        assert!(sys.load_state(&wrong).is_err());
        assert_eq!(sys.bus().read(0x6000), 7);
    }

    #[test]
    fn mount_points_and_media() {
        let mut sys = system(MachineConfig::default());
        let points = sys.mount_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, CASSETTE);
        assert!(points[0].extensions.contains(&"p2000t".to_string()));

        assert!(matches!(
            sys.mount("Disk", &[1]),
            Err(P2000Error::InvalidMountPoint(_))
        ));
        assert!(matches!(
            sys.mount(CASSETTE, &[]),
            Err(P2000Error::EmptyMedia(_))
        ));
        assert!(!sys.is_mounted(CASSETTE));

        sys.mount(CASSETTE, &[1, 2, 3]).unwrap();
        sys.mount(CARTRIDGE, &[0xC3]).unwrap();
        assert_eq!(sys.cassette(), Some(&[1u8, 2, 3][..]));
        assert_eq!(sys.bus().read(0x1000), 0xC3);

        // Media survives a reset
        sys.reset();
        assert!(sys.is_mounted(CARTRIDGE));
        assert_eq!(sys.cpu().resets, 1);

        sys.unmount(CARTRIDGE).unwrap();
        assert!(!sys.is_mounted(CARTRIDGE));
        assert_eq!(sys.bus().read(0x1000), 0xFF);
        assert!(sys.unmount("Disk").is_err());
    }

    #[test]
    fn video_ram_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("p2000-lib-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut sys = system(MachineConfig::default());
        sys.bus_mut().write(0x5000 + 80, b'Z');
        sys.save_video_ram(&dir.join("screen")).unwrap();

        let mut other = system(MachineConfig::default());
        other.load_video_ram(&dir.join("screen.vram")).unwrap();
        assert_eq!(other.bus().read(0x5000 + 80), b'Z');

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn audio_uses_the_period_given_to_the_cpu() {
        let mut sys = system(MachineConfig::default());
        sys.cpu_mut().reported_period = Some(1_000_000);
        sys.cpu_mut().beeps = vec![(25_000, true)];
        let samples = sys.tick(&no_input(), &mut Recorder::default());

        // The toggle lands half way through the buffer
        let half = samples.len() / 2;
        assert_eq!(samples[half - 8], 0);
        assert_ne!(samples[half + 8], 0);
    }

    #[test]
    fn osk_replaces_the_bottom_row() {
        let config = MachineConfig {
            host: HostStyle::Plugin,
            ..MachineConfig::default()
        };
        let mut sys = system(config);
        let shoulder: HashSet<Control> = [Control::Pad(PadButton::L)].into_iter().collect();
        let mut out = Recorder::default();
        let strip = |out: &Recorder| -> Vec<CellCommand> {
            out.cells
                .iter()
                .filter(|c| c.row == osk::OSK_ROW)
                .copied()
                .collect()
        };

        // Input follows the frame, so the strip shows one tick later
        sys.tick(&shoulder, &mut out);
        out.cells.clear();
        sys.tick(&shoulder, &mut out);
        let row = strip(&out);
        assert_eq!(row.len(), saa5050::COLUMNS);
        let highlight = row[osk::OSK_HIGHLIGHT_COL as usize];
        assert_eq!(highlight.glyph, 0);
        assert_eq!((highlight.fg, highlight.bg), (0, 3));
        let next = row[osk::OSK_HIGHLIGHT_COL as usize + 1];
        assert_eq!(next.glyph, b'!' - 32);
        assert_eq!(next.bg, 6);
        assert!(out.cells.iter().all(|c| c.row == osk::OSK_ROW));

        // Hidden again: the row is redrawn from video RAM
        sys.tick(&no_input(), &mut out);
        out.cells.clear();
        sys.tick(&no_input(), &mut out);
        let row = strip(&out);
        assert_eq!(row.len(), saa5050::COLUMNS);
        assert!(row.iter().all(|c| c.bg == 0));
    }
}
