//! Machine configuration
//!
//! Loaded from JSON; every field is optional and falls back to a stock
//! P2000T with 16 KiB RAM at 50 Hz.
//!
//! ```json
//! { "model": "T", "interrupt_rate": "60", "cpu_speed": 120, "ram_kb": 32 }
//! ```

use crate::input::{HostStyle, JoystickMap, MappingMode};
use crate::screen_cache::DisplayModel;
use crate::sound::{FilterModel, Volume};
use emu_core::types::InterruptRate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Clock of the Z80 at 100% speed.
pub const CPU_CLOCK_HZ: u32 = 2_500_000;

/// Selectable CPU speeds in percent.
pub const CPU_SPEEDS: [u32; 7] = [10, 20, 50, 100, 120, 200, 500];

/// Selectable main RAM sizes in KiB.
pub const RAM_SIZES_KB: [u32; 3] = [16, 32, 48];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported CPU speed {0}%")]
    CpuSpeed(u32),
    #[error("unsupported RAM size {0} KiB")]
    RamSize(u32),
    #[error("screen update period must be at least 1")]
    UpdatePeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub model: DisplayModel,
    pub interrupt_rate: InterruptRate,
    /// Percent of the real 2.5 MHz clock
    pub cpu_speed: u32,
    pub ram_kb: u32,
    pub sound: bool,
    pub volume: Volume,
    pub host: HostStyle,
    pub keyboard: MappingMode,
    /// `None` leaves the joystick unmapped
    pub joystick: Option<JoystickMap>,
    pub audio_model: FilterModel,
    /// Interrupts per screen update
    pub update_period: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            model: DisplayModel::T,
            interrupt_rate: InterruptRate::Hz50,
            cpu_speed: 100,
            ram_kb: 16,
            sound: true,
            volume: Volume::Medium,
            host: HostStyle::Windowed,
            keyboard: MappingMode::Symbolic,
            joystick: None,
            audio_model: FilterModel::StepDecay,
            update_period: 1,
        }
    }
}

impl MachineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: MachineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !CPU_SPEEDS.contains(&self.cpu_speed) {
            return Err(ConfigError::CpuSpeed(self.cpu_speed));
        }
        if !RAM_SIZES_KB.contains(&self.ram_kb) {
            return Err(ConfigError::RamSize(self.ram_kb));
        }
        if self.update_period == 0 {
            return Err(ConfigError::UpdatePeriod);
        }
        Ok(())
    }

    pub fn ram_len(&self) -> usize {
        self.ram_kb as usize * 1024
    }

    /// Z80 cycles executed between two interrupts.
    pub fn cycles_per_period(&self) -> u32 {
        CPU_CLOCK_HZ * self.cpu_speed / (100 * self.interrupt_rate.hz())
    }

    /// Change the interrupt rate. Real time speed is kept across the switch:
    /// 100% at 50 Hz and 120% at 60 Hz run the same cycles per interrupt.
    pub fn set_interrupt_rate(&mut self, rate: InterruptRate) {
        let hz = rate.hz();
        if (hz == 50 && self.cpu_speed == 120) || (hz == 60 && self.cpu_speed == 100) {
            self.cpu_speed = 2 * hz;
        }
        self.interrupt_rate = rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());

        let config = MachineConfig::from_json(r#"{ "ram_kb": 48, "keyboard": "positional" }"#)
            .unwrap();
        assert_eq!(config.ram_kb, 48);
        assert_eq!(config.keyboard, MappingMode::Positional);
        assert_eq!(config.cpu_speed, 100);
        assert_eq!(config.ram_len(), 48 * 1024);
    }

    #[test]
    fn enum_fields_parse() {
        let config = MachineConfig::from_json(
            r#"{ "model": "M", "interrupt_rate": "60", "cpu_speed": 120, "volume": "high",
                 "host": "plugin", "joystick": "keypad", "audio_model": "lowpass" }"#,
        )
        .unwrap();
        assert_eq!(config.model, DisplayModel::M);
        assert_eq!(config.interrupt_rate, InterruptRate::Hz60);
        assert_eq!(config.volume, Volume::High);
        assert_eq!(config.host, HostStyle::Plugin);
        assert_eq!(config.joystick, Some(JoystickMap::Keypad));
        assert_eq!(config.audio_model, FilterModel::LowPass);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            MachineConfig::from_json(r#"{ "cpu_speed": 99 }"#),
            Err(ConfigError::CpuSpeed(99))
        ));
        assert!(matches!(
            MachineConfig::from_json(r#"{ "ram_kb": 64 }"#),
            Err(ConfigError::RamSize(64))
        ));
        assert!(matches!(
            MachineConfig::from_json(r#"{ "update_period": 0 }"#),
            Err(ConfigError::UpdatePeriod)
        ));
        assert!(matches!(
            MachineConfig::from_json(r#"{ "interrupt_rate": "55" }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn cycles_per_period_arithmetic() {
        let mut config = MachineConfig::default();
        assert_eq!(config.cycles_per_period(), 50_000);
        config.cpu_speed = 500;
        assert_eq!(config.cycles_per_period(), 250_000);
        config.cpu_speed = 10;
        config.interrupt_rate = InterruptRate::Hz60;
        assert_eq!(config.cycles_per_period(), 4_166);
    }

    #[test]
    fn rate_switch_keeps_real_time() {
        let mut config = MachineConfig::default();
        config.set_interrupt_rate(InterruptRate::Hz60);
        assert_eq!(config.cpu_speed, 120);
        assert_eq!(config.cycles_per_period(), 50_000);

        config.set_interrupt_rate(InterruptRate::Hz50);
        assert_eq!(config.cpu_speed, 100);

        config.cpu_speed = 200;
        config.set_interrupt_rate(InterruptRate::Hz60);
        assert_eq!(config.cpu_speed, 200);
        assert_eq!(config.cycles_per_period(), 2_500_000 * 2 / 60);
    }
}
