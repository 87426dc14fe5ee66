// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared helpers: building ELF executables in memory and on disk.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;

use pagein_elf::{EM_X86_64, HOST_MACHINE};
use tempfile::NamedTempFile;

pub const PF_X: u32 = 1;
pub const PF_W: u32 = 2;
pub const PF_R: u32 = 4;

/// One `PT_LOAD` entry and the bytes it maps.
pub struct Load {
    pub vaddr: u64,
    pub offset: u64,
    pub data: Vec<u8>,
    pub mem_size: u64,
    pub flags: u32,
}

/// Deterministic, non-zero content so misplaced bytes are visible.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| ((i % 251) as u8).wrapping_add(seed) | 1)
        .collect()
}

/// Lays out an ELF64 executable with the given segments.
pub fn build_elf(entry: u64, loads: &[Load]) -> Vec<u8> {
    let phnum = loads.len();
    let mut out = vec![0u8; 64 + 56 * phnum];

    out[0..4].copy_from_slice(b"\x7fELF");
    out[4] = 2; // ELFCLASS64
    out[5] = 1; // ELFDATA2LSB
    out[6] = 1;
    out[16..18].copy_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    out[18..20].copy_from_slice(&HOST_MACHINE.unwrap_or(EM_X86_64).to_le_bytes());
    out[20..24].copy_from_slice(&1u32.to_le_bytes());
    out[24..32].copy_from_slice(&entry.to_le_bytes());
    out[32..40].copy_from_slice(&64u64.to_le_bytes());
    out[52..54].copy_from_slice(&64u16.to_le_bytes());
    out[54..56].copy_from_slice(&56u16.to_le_bytes());
    out[56..58].copy_from_slice(&(phnum as u16).to_le_bytes());

    for (i, load) in loads.iter().enumerate() {
        let ph = 64 + 56 * i;
        out[ph..ph + 4].copy_from_slice(&1u32.to_le_bytes()); // PT_LOAD
        out[ph + 4..ph + 8].copy_from_slice(&load.flags.to_le_bytes());
        out[ph + 8..ph + 16].copy_from_slice(&load.offset.to_le_bytes());
        out[ph + 16..ph + 24].copy_from_slice(&load.vaddr.to_le_bytes());
        out[ph + 24..ph + 32].copy_from_slice(&load.vaddr.to_le_bytes());
        out[ph + 32..ph + 40].copy_from_slice(&(load.data.len() as u64).to_le_bytes());
        out[ph + 40..ph + 48].copy_from_slice(&load.mem_size.to_le_bytes());
        out[ph + 48..ph + 56].copy_from_slice(&0x1000u64.to_le_bytes());
    }

    for load in loads {
        let start = load.offset as usize;
        let end = start + load.data.len();
        assert!(start >= 64 + 56 * phnum, "segment data overlaps the headers");
        if out.len() < end {
            out.resize(end, 0);
        }
        out[start..end].copy_from_slice(&load.data);
    }

    out
}

/// Writes `bytes` to a temporary file that lives as long as the handle.
pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
