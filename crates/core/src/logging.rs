//! Centralized logging configuration for the emulator.
//!
//! Components log through [`log()`] with a category and a level. Each category
//! carries its own verbosity, falling back to a global level when unset, and a
//! per-category rate limit keeps a misbehaving guest program from flooding the
//! output at 50 ticks per second.
//!
//! Accepted messages are forwarded to the `log` facade with the target
//! `p2000::<category>`, so the frontend decides where they end up (the CLI
//! installs `env_logger`).
//!
//! # Usage
//!
//! ```rust
//! use emu_core::logging::{log, LogCategory, LogLevel};
//!
//! // Message closure only runs when the category is enabled
//! log(LogCategory::Video, LogLevel::Debug, || {
//!     format!("scroll register now {:02X}", 0x50)
//! });
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }

    /// Matching `log` crate level; `None` for `Off`.
    fn as_log_level(self) -> Option<log::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(log::Level::Error),
            LogLevel::Warn => Some(log::Level::Warn),
            LogLevel::Info => Some(log::Level::Info),
            LogLevel::Debug => Some(log::Level::Debug),
            LogLevel::Trace => Some(log::Level::Trace),
        }
    }
}

/// Log category for the emulated machine's components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// CPU collaborator (period execution, register transfer)
    CPU,
    /// Memory and I/O port traffic
    Bus,
    /// Teletext decoding and the screen cache
    Video,
    /// Beeper toggles and sample buffers
    Audio,
    /// Key matrix, mappers, combo keys and debounce
    Input,
    /// Save states and media
    State,
}

const CATEGORY_COUNT: usize = 6;

impl LogCategory {
    fn index(self) -> usize {
        match self {
            LogCategory::CPU => 0,
            LogCategory::Bus => 1,
            LogCategory::Video => 2,
            LogCategory::Audio => 3,
            LogCategory::Input => 4,
            LogCategory::State => 5,
        }
    }

    /// Target name handed to the `log` facade
    pub fn target(self) -> &'static str {
        match self {
            LogCategory::CPU => "p2000::cpu",
            LogCategory::Bus => "p2000::bus",
            LogCategory::Video => "p2000::video",
            LogCategory::Audio => "p2000::audio",
            LogCategory::Input => "p2000::input",
            LogCategory::State => "p2000::state",
        }
    }
}

/// Sliding one-second window per category.
struct RateLimiter {
    max_logs_per_second: AtomicUsize,
    window_duration: Duration,
    windows: Mutex<[VecDeque<Instant>; CATEGORY_COUNT]>,
    dropped: Mutex<[usize; CATEGORY_COUNT]>,
}

impl RateLimiter {
    fn new(max_logs_per_second: usize) -> Self {
        Self {
            max_logs_per_second: AtomicUsize::new(max_logs_per_second),
            window_duration: Duration::from_secs(1),
            windows: Mutex::new(std::array::from_fn(|_| VecDeque::new())),
            dropped: Mutex::new([0; CATEGORY_COUNT]),
        }
    }

    /// Returns whether the message may pass, and how many were dropped since
    /// the last one that passed (reported once, on the next allowed message).
    fn should_allow(&self, category: LogCategory) -> (bool, usize) {
        let now = Instant::now();
        let idx = category.index();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut dropped = self.dropped.lock().unwrap_or_else(PoisonError::into_inner);

        let window = &mut windows[idx];
        while let Some(&front) = window.front() {
            if now.duration_since(front) > self.window_duration {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < self.max_logs_per_second.load(Ordering::Relaxed) {
            window.push_back(now);
            let missed = std::mem::take(&mut dropped[idx]);
            (true, missed)
        } else {
            dropped[idx] += 1;
            (false, 0)
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    global_level: AtomicU8,
    levels: [AtomicU8; CATEGORY_COUNT],
    rate_limiter: RateLimiter,
}

impl LogConfig {
    /// All logging off, 60 messages per second per category.
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            levels: std::array::from_fn(|_| AtomicU8::new(LogLevel::Off as u8)),
            rate_limiter: RateLimiter::new(60),
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.levels[category.index()].load(Ordering::Relaxed))
    }

    /// A category-specific level wins; `Off` there means "use the global level".
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for level in &self.levels {
            level.store(LogLevel::Off as u8, Ordering::Relaxed);
        }
    }

    pub fn set_rate_limit(&self, max_logs_per_second: usize) {
        self.rate_limiter
            .max_logs_per_second
            .store(max_logs_per_second, Ordering::Relaxed);
    }

    pub fn get_rate_limit(&self) -> usize {
        self.rate_limiter.max_logs_per_second.load(Ordering::Relaxed)
    }
}

/// Log a message with the specified category and level.
///
/// The closure is only evaluated when the category is enabled at `level` and
/// the rate limit has room for it.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if !config.should_log(category, level) {
        return;
    }
    let Some(facade_level) = level.as_log_level() else {
        return;
    };

    let (allowed, dropped) = config.rate_limiter.should_allow(category);
    if !allowed {
        return;
    }
    if dropped > 0 {
        log::log!(
            target: category.target(),
            log::Level::Warn,
            "rate limit exceeded, {} message(s) dropped",
            dropped
        );
    }
    log::log!(target: category.target(), facade_level, "{}", message_fn());
}
