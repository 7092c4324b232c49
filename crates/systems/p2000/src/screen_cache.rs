//! Per-cell redraw filter
//!
//! Each decoded cell is reduced to a fingerprint. A cell is only handed to the
//! renderer when its fingerprint differs from the one drawn last time, so an
//! unchanged screen costs no draw calls.

use crate::saa5050::{CellCommand, ROWS};
use emu_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};

/// Fingerprint of a cell that has never been drawn.
pub const SENTINEL: i32 = -1;

/// Display model. The T model is the teletext machine; the M model has an
/// 80 column monochrome text display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayModel {
    #[default]
    T,
    M,
}

impl DisplayModel {
    pub fn columns(self) -> usize {
        match self {
            DisplayModel::T => 40,
            DisplayModel::M => 80,
        }
    }
}

/// Fingerprint for the teletext display.
pub fn fingerprint_t(glyph: u8, fg: u8, bg: u8, band: u8) -> i32 {
    glyph as i32 + ((fg as i32) << 8) + ((bg as i32) << 16) + ((band as i32) << 24)
}

/// Fingerprint for the monochrome display.
pub fn fingerprint_m(glyph: u8, inverted: bool, underline: bool) -> i32 {
    glyph as i32 + ((inverted as i32) << 8) + ((underline as i32) << 16)
}

impl CellCommand {
    pub fn fingerprint(&self) -> i32 {
        fingerprint_t(self.glyph, self.fg, self.bg, self.band.as_u8())
    }
}

/// Host display changes after which the whole screen must be redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    SmoothingChanged,
    ScanlinesChanged,
    Resized,
    DisplayFound,
    LanguageChanged,
}

#[derive(Debug, Clone)]
pub struct ScreenCache {
    columns: usize,
    rows: usize,
    cells: Vec<i32>,
}

impl ScreenCache {
    pub fn new(model: DisplayModel) -> Self {
        Self::with_size(model.columns(), ROWS)
    }

    pub fn with_size(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![SENTINEL; columns * rows],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// True when the cell needs drawing; the fingerprint is then recorded.
    /// Cells outside the grid never draw.
    pub fn should_draw(&mut self, col: usize, row: usize, fingerprint: i32) -> bool {
        if col >= self.columns || row >= self.rows {
            return false;
        }
        let slot = &mut self.cells[row * self.columns + col];
        if *slot == fingerprint {
            false
        } else {
            *slot = fingerprint;
            true
        }
    }

    pub fn invalidate_all(&mut self) {
        self.cells.fill(SENTINEL);
    }

    /// Reallocate for a new display model. Everything redraws afterwards.
    pub fn resize(&mut self, model: DisplayModel) {
        let columns = model.columns();
        if columns != self.columns {
            self.columns = columns;
            self.cells = vec![SENTINEL; columns * self.rows];
        } else {
            self.invalidate_all();
        }
    }

    pub fn handle_event(&mut self, event: DisplayEvent) {
        log(LogCategory::Video, LogLevel::Debug, || {
            format!("{event:?}: screen cache invalidated")
        });
        self.invalidate_all();
    }
}
