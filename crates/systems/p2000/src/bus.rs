//! P2000 memory and I/O bus
//!
//! Memory map:
//! - 0x0000-0x0FFF: monitor ROM (supplied by the CPU side, reads 0xFF here)
//! - 0x1000-0x4FFF: cartridge ROM
//! - 0x5000-0x5FFF: video RAM
//! - 0x6000-     : main RAM (16, 32 or 48 KiB)
//!
//! I/O ports:
//! - 0x00-0x09: keyboard matrix rows (read)
//! - 0x30: scroll register (write)
//! - 0x50: beeper, bit 0 (write)

use crate::keyboard::{KeyMatrix, MATRIX_ROWS, ROW_RELEASED};
use crate::saa5050::VRAM_SIZE;
use crate::sound::ToggleEvent;
use emu_core::logging::{log, LogCategory, LogLevel};

const CARTRIDGE_BASE: u16 = 0x1000;
const CARTRIDGE_SIZE: usize = 0x4000;
const VRAM_BASE: u16 = 0x5000;
const RAM_BASE: u16 = 0x6000;

pub const PORT_SCROLL: u8 = 0x30;
pub const PORT_BEEPER: u8 = 0x50;

pub struct P2000Bus {
    vram: Box<[u8; VRAM_SIZE]>,
    ram: Vec<u8>,
    cartridge: Vec<u8>,
    keys: KeyMatrix,
    scroll: u16,
    toggles: Vec<ToggleEvent>,
}

impl P2000Bus {
    pub fn new(ram_len: usize) -> Self {
        Self {
            vram: Box::new([0; VRAM_SIZE]),
            ram: vec![0; ram_len],
            cartridge: Vec::new(),
            keys: KeyMatrix::new(),
            scroll: 0,
            toggles: Vec::new(),
        }
    }

    /// Power-on state. The cartridge stays inserted.
    pub fn reset(&mut self) {
        self.vram.fill(0);
        self.ram.fill(0);
        self.keys.release_all();
        self.scroll = 0;
        self.toggles.clear();
    }

    pub fn vram(&self) -> &[u8; VRAM_SIZE] {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut [u8; VRAM_SIZE] {
        &mut self.vram
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    pub fn keys(&self) -> &KeyMatrix {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut KeyMatrix {
        &mut self.keys
    }

    /// Video RAM offset of the first displayed row.
    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn set_scroll(&mut self, scroll: u16) {
        self.scroll = scroll % VRAM_SIZE as u16;
    }

    pub fn set_cartridge(&mut self, data: &[u8]) {
        self.cartridge = data[..data.len().min(CARTRIDGE_SIZE)].to_vec();
    }

    pub fn clear_cartridge(&mut self) {
        self.cartridge.clear();
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            CARTRIDGE_BASE..=0x4FFF => self
                .cartridge
                .get((addr - CARTRIDGE_BASE) as usize)
                .copied()
                .unwrap_or(0xFF),
            VRAM_BASE..=0x5FFF => self.vram[(addr - VRAM_BASE) as usize],
            RAM_BASE..=0xFFFF => self
                .ram
                .get((addr - RAM_BASE) as usize)
                .copied()
                .unwrap_or(0xFF),
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            VRAM_BASE..=0x5FFF => self.vram[(addr - VRAM_BASE) as usize] = value,
            RAM_BASE..=0xFFFF => {
                if let Some(cell) = self.ram.get_mut((addr - RAM_BASE) as usize) {
                    *cell = value;
                }
            }
            _ => {
                log(LogCategory::Bus, LogLevel::Trace, || {
                    format!("write {value:02X} to read-only {addr:04X} ignored")
                });
            }
        }
    }

    pub fn read_port(&self, port: u8) -> u8 {
        let row = port as usize;
        if row < MATRIX_ROWS {
            self.keys.row(row)
        } else {
            ROW_RELEASED
        }
    }

    /// Port write at `cycle_pos` cycles into the current period.
    pub fn write_port(&mut self, port: u8, value: u8, cycle_pos: u32) {
        match port {
            PORT_SCROLL => {
                self.set_scroll(value as u16);
                log(LogCategory::Video, LogLevel::Debug, || {
                    format!("scroll register {value:02X}")
                });
            }
            PORT_BEEPER => self.toggles.push(ToggleEvent {
                cycle_pos,
                level: value & 1 != 0,
            }),
            _ => log(LogCategory::Bus, LogLevel::Trace, || {
                format!("unhandled port write {port:02X} <- {value:02X}")
            }),
        }
    }

    /// Beeper writes of the period in the order they happened.
    pub fn drain_toggles(&mut self) -> std::vec::Drain<'_, ToggleEvent> {
        self.toggles.drain(..)
    }
}
