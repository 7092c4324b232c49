//! Flat save state blobs
//!
//! A state is the Z80 register block, then the 4 KiB of video RAM, then main
//! RAM. There is no header: the blob size alone identifies the RAM size it
//! belongs to, and a blob of the wrong size is rejected outright.

use crate::saa5050::VRAM_SIZE;
use thiserror::Error;

/// Bytes taken by [`Z80Registers`] in a state blob.
pub const REGISTER_BLOCK_SIZE: usize = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("state buffer is {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Z80 register file as exchanged with the CPU.
///
/// Layout in a blob: AF BC DE HL IX IY PC SP AF' BC' DE' HL' as little-endian
/// words, followed by the bytes I R IFF1 IFF2 IM HALT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Z80Registers {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub ix: u16,
    pub iy: u16,
    pub pc: u16,
    pub sp: u16,
    pub af_alt: u16,
    pub bc_alt: u16,
    pub de_alt: u16,
    pub hl_alt: u16,
    pub i: u8,
    pub r: u8,
    pub iff1: u8,
    pub iff2: u8,
    pub im: u8,
    pub halt: u8,
}

impl Z80Registers {
    fn words(&self) -> [u16; 12] {
        [
            self.af,
            self.bc,
            self.de,
            self.hl,
            self.ix,
            self.iy,
            self.pc,
            self.sp,
            self.af_alt,
            self.bc_alt,
            self.de_alt,
            self.hl_alt,
        ]
    }

    pub fn to_bytes(&self) -> [u8; REGISTER_BLOCK_SIZE] {
        let mut out = [0u8; REGISTER_BLOCK_SIZE];
        for (chunk, word) in out.chunks_exact_mut(2).zip(self.words()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out[24..].copy_from_slice(&[self.i, self.r, self.iff1, self.iff2, self.im, self.halt]);
        out
    }

    pub fn from_bytes(bytes: &[u8; REGISTER_BLOCK_SIZE]) -> Self {
        let word = |n: usize| u16::from_le_bytes([bytes[2 * n], bytes[2 * n + 1]]);
        Self {
            af: word(0),
            bc: word(1),
            de: word(2),
            hl: word(3),
            ix: word(4),
            iy: word(5),
            pc: word(6),
            sp: word(7),
            af_alt: word(8),
            bc_alt: word(9),
            de_alt: word(10),
            hl_alt: word(11),
            i: bytes[24],
            r: bytes[25],
            iff1: bytes[26],
            iff2: bytes[27],
            im: bytes[28],
            halt: bytes[29],
        }
    }
}

/// Borrowed view of a validated state blob.
#[derive(Debug, Clone, Copy)]
pub struct StateImage<'a> {
    pub registers: Z80Registers,
    pub vram: &'a [u8],
    pub ram: &'a [u8],
}

/// Serializer for one machine configuration (RAM size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSerializer {
    ram_len: usize,
}

impl StateSerializer {
    pub fn new(ram_len: usize) -> Self {
        Self { ram_len }
    }

    pub fn size(&self) -> usize {
        REGISTER_BLOCK_SIZE + VRAM_SIZE + self.ram_len
    }

    fn check(&self, actual: usize) -> Result<(), StateError> {
        let expected = self.size();
        if actual == expected {
            Ok(())
        } else {
            Err(StateError::SizeMismatch { expected, actual })
        }
    }

    /// Write a state into `out`. `out` is left untouched on error.
    pub fn serialize(
        &self,
        registers: &Z80Registers,
        vram: &[u8; VRAM_SIZE],
        ram: &[u8],
        out: &mut [u8],
    ) -> Result<(), StateError> {
        self.check(out.len())?;
        if ram.len() != self.ram_len {
            return Err(StateError::SizeMismatch {
                expected: self.ram_len,
                actual: ram.len(),
            });
        }
        let (regs_out, rest) = out.split_at_mut(REGISTER_BLOCK_SIZE);
        let (vram_out, ram_out) = rest.split_at_mut(VRAM_SIZE);
        regs_out.copy_from_slice(&registers.to_bytes());
        vram_out.copy_from_slice(vram);
        ram_out.copy_from_slice(ram);
        Ok(())
    }

    /// Split a blob into its parts after validating its size.
    pub fn deserialize<'a>(&self, data: &'a [u8]) -> Result<StateImage<'a>, StateError> {
        self.check(data.len())?;
        let (regs, rest) = data.split_at(REGISTER_BLOCK_SIZE);
        let (vram, ram) = rest.split_at(VRAM_SIZE);
        let mut block = [0u8; REGISTER_BLOCK_SIZE];
        block.copy_from_slice(regs);
        Ok(StateImage {
            registers: Z80Registers::from_bytes(&block),
            vram,
            ram,
        })
    }
}
