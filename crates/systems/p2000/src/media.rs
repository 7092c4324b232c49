//! Cassettes, cartridges and video RAM dumps
//!
//! A video RAM dump (`.vram`) holds the visible part of the screen: 24 rows
//! of 40 bytes, taken from the current scroll offset with the usual 80 byte
//! row stride.

use crate::saa5050::{COLUMNS, ROWS, ROW_STRIDE, VRAM_SIZE};
use emu_core::logging::{log, LogCategory, LogLevel};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Size of a complete dump.
pub const VRAM_DUMP_SIZE: usize = ROWS * COLUMNS;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is empty", .0.display())]
    Empty(PathBuf),
}

/// Visible rows starting at `scroll`.
pub fn save_video_ram_dump(vram: &[u8; VRAM_SIZE], scroll: u16) -> Vec<u8> {
    let mut dump = Vec::with_capacity(VRAM_DUMP_SIZE);
    for row in 0..ROWS {
        let start = scroll as usize + row * ROW_STRIDE;
        dump.extend((0..COLUMNS).map(|col| vram[(start + col) % VRAM_SIZE]));
    }
    dump
}

/// Write a dump back at `scroll`. A short dump fills as far as it reaches;
/// bytes past one full screen are ignored. Returns the bytes written.
pub fn load_video_ram_dump(vram: &mut [u8; VRAM_SIZE], scroll: u16, data: &[u8]) -> usize {
    let data = &data[..data.len().min(VRAM_DUMP_SIZE)];
    for (row, chunk) in data.chunks(COLUMNS).enumerate() {
        let start = scroll as usize + row * ROW_STRIDE;
        for (col, &byte) in chunk.iter().enumerate() {
            vram[(start + col) % VRAM_SIZE] = byte;
        }
    }
    data.len()
}

fn read(path: &Path) -> Result<Vec<u8>, MediaError> {
    fs::read(path).map_err(|source| MediaError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_video_ram_file(
    path: &Path,
    vram: &[u8; VRAM_SIZE],
    scroll: u16,
) -> Result<(), MediaError> {
    fs::write(path, save_video_ram_dump(vram, scroll)).map_err(|source| MediaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log(LogCategory::State, LogLevel::Info, || {
        format!("video RAM dump written to {}", path.display())
    });
    Ok(())
}

pub fn load_video_ram_file(
    path: &Path,
    vram: &mut [u8; VRAM_SIZE],
    scroll: u16,
) -> Result<usize, MediaError> {
    let data = read(path)?;
    Ok(load_video_ram_dump(vram, scroll, &data))
}

fn load_media(path: &Path, kind: &str) -> Result<Vec<u8>, MediaError> {
    let data = read(path)?;
    if data.is_empty() {
        return Err(MediaError::Empty(path.to_path_buf()));
    }
    log(LogCategory::State, LogLevel::Info, || {
        format!("{kind} {} loaded, {} bytes", path.display(), data.len())
    });
    Ok(data)
}

pub fn load_cassette(path: &Path) -> Result<Vec<u8>, MediaError> {
    load_media(path, "cassette")
}

pub fn load_cartridge(path: &Path) -> Result<Vec<u8>, MediaError> {
    load_media(path, "cartridge")
}

/// `name` with `.ext` appended unless it already ends in it (any case).
pub fn append_extension_if_missing(path: &Path, ext: &str) -> PathBuf {
    let has_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext));
    if has_ext {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }
}
