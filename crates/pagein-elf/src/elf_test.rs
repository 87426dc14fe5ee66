// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the ELF parser.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pagein_abi::perms::{PF_R, PF_W, PF_X};
use std::string::ToString;

fn host_machine() -> u16 {
    HOST_MACHINE.unwrap_or(EM_X86_64)
}

/// Minimal valid ELF64 executable header (64 bytes) with `phnum` program
/// headers starting right after it.
fn minimal_elf_header(phnum: u16) -> [u8; 64] {
    let mut header = [0u8; 64];

    // Magic
    header[0..4].copy_from_slice(&ELF_MAGIC);

    // Class: 64-bit
    header[4] = 2;

    // Data: little-endian
    header[5] = 1;

    // Version
    header[6] = 1;

    // Type: executable
    header[16..18].copy_from_slice(&2u16.to_le_bytes());

    // Machine
    header[18..20].copy_from_slice(&host_machine().to_le_bytes());

    // Version (u32 = 1)
    header[20] = 1;

    // Entry point
    header[24..32].copy_from_slice(&0x40_1000u64.to_le_bytes());

    // Program header offset (right after ELF header)
    header[32..40].copy_from_slice(&64u64.to_le_bytes());

    // ELF header size
    header[52..54].copy_from_slice(&64u16.to_le_bytes());

    // Program header entry size
    header[54..56].copy_from_slice(&56u16.to_le_bytes());

    // Number of program headers
    header[56..58].copy_from_slice(&phnum.to_le_bytes());

    header
}

/// Create a program header of the given type.
fn phdr(seg_type: u32, vaddr: u64, offset: u64, filesz: u64, memsz: u64, flags: u32) -> [u8; 56] {
    let mut phdr = [0u8; 56];
    phdr[0..4].copy_from_slice(&seg_type.to_le_bytes());
    phdr[4..8].copy_from_slice(&flags.to_le_bytes());
    phdr[8..16].copy_from_slice(&offset.to_le_bytes());
    phdr[16..24].copy_from_slice(&vaddr.to_le_bytes());
    phdr[24..32].copy_from_slice(&vaddr.to_le_bytes());
    phdr[32..40].copy_from_slice(&filesz.to_le_bytes());
    phdr[40..48].copy_from_slice(&memsz.to_le_bytes());
    phdr[48..56].copy_from_slice(&0x1000u64.to_le_bytes());
    phdr
}

fn pt_load(vaddr: u64, offset: u64, filesz: u64, memsz: u64, flags: u32) -> [u8; 56] {
    phdr(PT_LOAD, vaddr, offset, filesz, memsz, flags)
}

fn image(phdrs: &[[u8; 56]]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&minimal_elf_header(phdrs.len() as u16));
    for p in phdrs {
        data.extend_from_slice(p);
    }
    data
}

#[test]
fn parse_minimal_elf() {
    let data = image(&[pt_load(0x40_0000, 0, 0x200, 0x200, PF_R | PF_X)]);

    let table = parse(&data).unwrap();

    assert_eq!(table.entry, Vaddr::new(0x40_1000));
    assert_eq!(table.phoff, 64);
    assert_eq!(table.phnum, 1);
    assert_eq!(table.phentsize, 56);
    assert_eq!(table.segments.len(), 1);

    let segment = table.segments[0];
    assert_eq!(segment.vaddr, Vaddr::new(0x40_0000));
    assert_eq!(segment.file_size, 0x200);
    assert_eq!(segment.mem_size, 0x200);
    assert_eq!(segment.file_offset, 0);
    assert_eq!(segment.permissions.as_str(), "RX");
}

#[test]
fn parse_elf_with_bss() {
    let data = image(&[pt_load(0x60_0000, 0x1000, 8, 0x3000, PF_R | PF_W)]);

    let segment = parse(&data).unwrap().segments[0];

    assert_eq!(segment.file_size, 8);
    assert_eq!(segment.mem_size, 0x3000);
    assert_eq!(segment.permissions, Permissions::RW);
}

#[test]
fn two_step_parse_reads_only_headers() {
    let data = image(&[pt_load(0x40_0000, 0, 0x200, 0x200, PF_R | PF_X)]);

    let header = ElfHeader::parse(&data[..ELF64_HEADER_SIZE]).unwrap();
    assert_eq!(header.phdr_offset(), 64);
    assert_eq!(header.phdr_table_len(), 56);

    let table = header.segments(&data[64..]).unwrap();
    assert_eq!(table.segments.len(), 1);
}

#[test]
fn non_load_and_empty_segments_are_skipped() {
    let data = image(&[
        phdr(6, 0x40_0040, 64, 0x70, 0x70, PF_R), // PT_PHDR
        pt_load(0x40_0000, 0, 0x200, 0x200, PF_R | PF_X),
        pt_load(0x50_0000, 0x200, 0, 0, PF_R), // empty
        phdr(0x6474_e551, 0, 0, 0, 0, PF_R | PF_W), // PT_GNU_STACK
    ]);

    let table = parse(&data).unwrap();
    assert_eq!(table.segments.len(), 1);
    assert_eq!(table.phnum, 4);
}

#[test]
fn multiple_segments_keep_program_header_order() {
    let data = image(&[
        pt_load(0x40_0000, 0, 0x1000, 0x1000, PF_R | PF_X),
        pt_load(0x60_0000, 0x1000, 0x10, 0x2000, PF_R | PF_W),
    ]);

    let table = parse(&data).unwrap();
    assert_eq!(table.segments.len(), 2);
    assert_eq!(table.segments[0].permissions.as_str(), "RX");
    assert_eq!(table.segments[1].permissions.as_str(), "RW");
    assert_eq!(table.segments[1].vaddr, Vaddr::new(0x60_0000));
}

#[test]
fn phdr_vaddr_found_in_first_segment() {
    let data = image(&[pt_load(0x40_0000, 0, 0x200, 0x200, PF_R | PF_X)]);
    let table = parse(&data).unwrap();
    assert_eq!(table.phdr_vaddr(), Some(Vaddr::new(0x40_0040)));
}

#[test]
fn phdr_vaddr_absent_when_not_loaded() {
    let data = image(&[pt_load(0x40_0000, 0x1000, 0x200, 0x200, PF_R | PF_X)]);
    let table = parse(&data).unwrap();
    assert_eq!(table.phdr_vaddr(), None);
}

#[test]
fn error_too_small() {
    let data = [0u8; 32];
    assert_eq!(parse(&data).unwrap_err(), ElfError::TooSmall);
}

#[test]
fn error_truncated_program_headers() {
    let mut data = image(&[pt_load(0x40_0000, 0, 0x200, 0x200, PF_R)]);
    data.truncate(100);
    assert_eq!(parse(&data).unwrap_err(), ElfError::TooSmall);
}

#[test]
fn error_invalid_magic() {
    let mut header = minimal_elf_header(0);
    header[0] = 0x00;
    assert_eq!(ElfHeader::parse(&header).unwrap_err(), ElfError::InvalidMagic);
}

#[test]
fn error_not_64_bit() {
    let mut header = minimal_elf_header(0);
    header[4] = 1;
    assert_eq!(ElfHeader::parse(&header).unwrap_err(), ElfError::Not64Bit);
}

#[test]
fn error_not_little_endian() {
    let mut header = minimal_elf_header(0);
    header[5] = 2;
    assert_eq!(
        ElfHeader::parse(&header).unwrap_err(),
        ElfError::NotLittleEndian
    );
}

#[test]
fn error_not_executable() {
    let mut header = minimal_elf_header(0);
    header[16] = 3; // ET_DYN (position independent)
    assert_eq!(
        ElfHeader::parse(&header).unwrap_err(),
        ElfError::NotExecutable
    );
}

#[test]
fn error_foreign_machine() {
    if HOST_MACHINE.is_none() {
        return;
    }
    let mut header = minimal_elf_header(0);
    header[18..20].copy_from_slice(&0x28u16.to_le_bytes()); // EM_ARM
    assert_eq!(
        ElfHeader::parse(&header).unwrap_err(),
        ElfError::WrongMachine(0x28)
    );
}

#[test]
fn error_bad_phentsize() {
    let mut header = minimal_elf_header(1);
    header[54..56].copy_from_slice(&32u16.to_le_bytes());
    assert_eq!(
        ElfHeader::parse(&header).unwrap_err(),
        ElfError::InvalidPhdrEntrySize(32)
    );
}

#[test]
fn error_dynamic_executable() {
    let data = image(&[
        phdr(PT_INTERP, 0x40_0200, 0x200, 0x1c, 0x1c, PF_R),
        pt_load(0x40_0000, 0, 0x200, 0x200, PF_R | PF_X),
    ]);
    assert_eq!(parse(&data).unwrap_err(), ElfError::DynamicExecutable);
}

#[test]
fn error_relro_segment() {
    let data = image(&[
        pt_load(0x40_0000, 0, 0x2000, 0x2000, PF_R | PF_W),
        phdr(PT_GNU_RELRO, 0x40_1000, 0x1000, 0x800, 0x800, PF_R),
    ]);
    assert_eq!(parse(&data).unwrap_err(), ElfError::RelroSegment);
    assert!(ElfError::RelroSegment.to_string().contains("norelro"));
}

#[test]
fn error_no_loadable_segments() {
    let data = image(&[phdr(4, 0, 0, 0, 0, PF_R)]); // PT_NOTE only
    assert_eq!(parse(&data).unwrap_err(), ElfError::NoLoadableSegments);
}

#[test]
fn error_file_larger_than_memory() {
    let data = image(&[pt_load(0x40_0000, 0, 0x300, 0x200, PF_R)]);
    assert_eq!(
        parse(&data).unwrap_err(),
        ElfError::InvalidSegment {
            index: 0,
            error: SegmentError::FileLargerThanMemory
        }
    );
}

#[test]
fn error_overlapping_segments() {
    let data = image(&[
        pt_load(0x40_0000, 0, 0x2000, 0x2000, PF_R | PF_X),
        pt_load(0x40_1000, 0x2000, 0x10, 0x10, PF_R | PF_W),
    ]);
    assert_eq!(
        parse(&data).unwrap_err(),
        ElfError::OverlappingSegments {
            first: 0,
            second: 1
        }
    );
}

#[test]
fn error_messages_name_the_problem() {
    assert_eq!(ElfError::InvalidMagic.to_string(), "not an ELF file");
    assert_eq!(
        ElfError::OverlappingSegments {
            first: 1,
            second: 3
        }
        .to_string(),
        "program headers 1 and 3 overlap"
    );
}
