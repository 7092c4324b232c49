//! One-bit beeper synthesis
//!
//! The P2000 produces sound by toggling a single output bit. Toggles arrive
//! stamped with their cycle position inside the current interrupt period; at
//! the end of the period they are placed in a PCM buffer covering that period
//! and shaped by one of two decay filters:
//!
//! - [`FilterModel::LowPass`]: a one-pole average whose input level halves
//!   after every period. Buffers hold `30000 / IFreq` samples.
//! - [`FilterModel::StepDecay`]: the level is output directly and moves one
//!   unit toward zero every millisecond. Buffers are the largest power of two
//!   between 128 and 4096 that keeps the sample rate at or below 44.1 kHz.

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::types::{AudioSample, InterruptRate};
use serde::{Deserialize, Serialize};

const LOW_PASS_RATE: u32 = 30_000;
const LOW_PASS_STEP: i32 = 1 << 10;
const STEP_DECAY_STEP: i32 = 8;
const MAX_STEP_DECAY_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterModel {
    LowPass,
    #[default]
    StepDecay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volume {
    Low,
    #[default]
    Medium,
    High,
}

impl Volume {
    pub fn level(self) -> i32 {
        match self {
            Volume::Low => 1,
            Volume::Medium => 4,
            Volume::High => 10,
        }
    }
}

/// Samples per interrupt period for a model and interrupt rate.
pub fn buffer_len(model: FilterModel, rate: InterruptRate) -> usize {
    match model {
        FilterModel::LowPass => (LOW_PASS_RATE / rate.hz()) as usize,
        FilterModel::StepDecay => {
            let mut len = 4096;
            while len > 128 && len * rate.hz() > MAX_STEP_DECAY_RATE {
                len /= 2;
            }
            len as usize
        }
    }
}

/// Output sample rate in Hz.
pub fn sample_rate(model: FilterModel, rate: InterruptRate) -> u32 {
    buffer_len(model, rate) as u32 * rate.hz()
}

/// Buffer index for a cycle position inside a period of `period` cycles.
pub fn sample_index(cycle_pos: u32, period: u32, len: usize) -> usize {
    if len == 0 || period == 0 {
        return 0;
    }
    let last = (len - 1) as u64;
    let remaining = period.saturating_sub(cycle_pos) as u64;
    let pos = last - (last * remaining / period as u64).min(last);
    pos as usize
}

/// A change of the beeper bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleEvent {
    pub cycle_pos: u32,
    pub level: bool,
}

#[derive(Debug, Clone)]
pub struct AudioSynthesizer {
    model: FilterModel,
    volume: Volume,
    enabled: bool,
    rate: InterruptRate,
    len: usize,
    last_level: Option<bool>,
    pending: Option<ToggleEvent>,
    held: i32,
    smooth: i32,
    decay_count: u32,
}

impl AudioSynthesizer {
    pub fn new(model: FilterModel, rate: InterruptRate, volume: Volume) -> Self {
        Self {
            model,
            volume,
            enabled: true,
            rate,
            len: buffer_len(model, rate),
            last_level: None,
            pending: None,
            held: 0,
            smooth: 0,
            decay_count: 1,
        }
    }

    pub fn model(&self) -> FilterModel {
        self.model
    }

    pub fn buffer_len(&self) -> usize {
        self.len
    }

    pub fn sample_rate(&self) -> u32 {
        sample_rate(self.model, self.rate)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pending(&self) -> Option<ToggleEvent> {
        self.pending
    }

    /// Disabling silences output and drops any toggle in flight.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.pending = None;
            self.held = 0;
            self.smooth = 0;
        }
        self.enabled = enabled;
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
    }

    /// New interrupt rate: the buffer is resized before the next flush.
    pub fn set_interrupt_rate(&mut self, rate: InterruptRate) {
        self.rate = rate;
        self.len = buffer_len(self.model, rate);
        log(LogCategory::Audio, LogLevel::Info, || {
            format!(
                "audio buffer {} samples at {} Hz",
                self.len,
                self.sample_rate()
            )
        });
    }

    fn amplitude(&self) -> i32 {
        let step = match self.model {
            FilterModel::LowPass => LOW_PASS_STEP,
            FilterModel::StepDecay => STEP_DECAY_STEP,
        };
        self.volume.level() * step
    }

    fn decay_interval(&self) -> u32 {
        (self.sample_rate() / 1000).max(1)
    }

    /// Sound port write. Writes that do not change the level are ignored; of
    /// several changes in one period only the latest is kept.
    pub fn on_toggle(&mut self, cycle_pos: u32, level: bool) {
        if !self.enabled || self.last_level == Some(level) {
            return;
        }
        self.last_level = Some(level);
        self.pending = Some(ToggleEvent { cycle_pos, level });
        log(LogCategory::Audio, LogLevel::Trace, || {
            format!("toggle {} at cycle {cycle_pos}", level as u8)
        });
    }

    /// Render the period that just ended.
    pub fn flush(&mut self, period: u32) -> Vec<AudioSample> {
        let mut out = vec![0; self.len];
        if !self.enabled {
            return out;
        }

        let toggle = self
            .pending
            .take()
            .map(|t| (sample_index(t.cycle_pos, period, self.len), t.level));
        let amplitude = self.amplitude();
        let interval = self.decay_interval();

        for (i, sample) in out.iter_mut().enumerate() {
            if let Some((index, level)) = toggle {
                if index == i {
                    self.held = if level { -amplitude } else { amplitude };
                    self.decay_count = interval;
                }
            }
            match self.model {
                FilterModel::LowPass => {
                    self.smooth = (self.smooth + self.held) / 2;
                    *sample = self.smooth.clamp(i16::MIN as i32, i16::MAX as i32) as AudioSample;
                }
                FilterModel::StepDecay => {
                    *sample = self.held as AudioSample;
                    self.decay_count -= 1;
                    if self.decay_count == 0 {
                        self.decay_count = interval;
                        self.held -= self.held.signum();
                    }
                }
            }
        }

        if self.model == FilterModel::LowPass {
            self.held /= 2;
        }
        out
    }
}
