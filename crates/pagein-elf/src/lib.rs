// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Minimal ELF64 parser for static executables.
//!
//! This crate turns the ELF header and program header table of a statically
//! linked executable into the ordered segment table the loader works from.
//! Parsing happens in two steps so the caller never has to read segment
//! bodies:
//!
//! 1. [`ElfHeader::parse`] over the first [`ELF64_HEADER_SIZE`] bytes
//! 2. [`ElfHeader::segments`] over the program header table bytes
//!
//! It does not support:
//! - Relocations (assumes position-dependent code at fixed addresses)
//! - Dynamic linking (`PT_INTERP` is rejected)
//! - Post-relocation protection (`PT_GNU_RELRO` is rejected)
//! - Section headers (only program headers)
//! - 32-bit ELF
//! - Big-endian targets

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod elf_test;

use alloc::vec::Vec;
use core::fmt;
use core::mem::size_of;

use pagein_abi::{Permissions, Segment, SegmentError, Vaddr};

// =============================================================================
// Constants
// =============================================================================

/// ELF magic bytes.
const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

/// ELF class: 64-bit.
const ELFCLASS64: u8 = 2;

/// ELF data encoding: little-endian.
const ELFDATA2LSB: u8 = 1;

/// ELF type: executable.
const ET_EXEC: u16 = 2;

/// Program header type: loadable segment.
const PT_LOAD: u32 = 1;

/// Program header type: interpreter path (dynamic executables).
const PT_INTERP: u32 = 3;

/// Program header type: range the runtime re-protects read-only after relocation.
const PT_GNU_RELRO: u32 = 0x6474_e552;

/// Machine: AMD x86-64.
pub const EM_X86_64: u16 = 62;

/// Machine: ARM `AArch64`.
pub const EM_AARCH64: u16 = 183;

/// Machine the running loader can execute, if known.
#[cfg(target_arch = "x86_64")]
pub const HOST_MACHINE: Option<u16> = Some(EM_X86_64);

/// Machine the running loader can execute, if known.
#[cfg(target_arch = "aarch64")]
pub const HOST_MACHINE: Option<u16> = Some(EM_AARCH64);

/// Machine the running loader can execute, if known.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub const HOST_MACHINE: Option<u16> = None;

/// ELF header size for 64-bit.
pub const ELF64_HEADER_SIZE: usize = 64;

/// Program header entry size for 64-bit.
pub const ELF64_PHDR_SIZE: usize = 56;

// =============================================================================
// ELF Structures
// =============================================================================

/// ELF64 file header (layout matches ELF specification).
#[derive(Clone, Copy, Debug)]
#[repr(C)]
struct Elf64Header {
    /// Magic number and identification bytes.
    ident: [u8; 16],
    /// Object file type (`ET_EXEC` = 2).
    file_type: u16,
    /// Target architecture.
    machine: u16,
    /// ELF version (1).
    version: u32,
    /// Entry point virtual address.
    entry: u64,
    /// Program header table offset.
    phoff: u64,
    /// Section header table offset (unused).
    shoff: u64,
    /// Processor-specific flags.
    flags: u32,
    /// ELF header size.
    ehsize: u16,
    /// Program header entry size.
    phentsize: u16,
    /// Number of program headers.
    phnum: u16,
    /// Section header entry size (unused).
    shentsize: u16,
    /// Number of section headers (unused).
    shnum: u16,
    /// Section name string table index (unused).
    shstrndx: u16,
}

/// ELF64 program header (layout matches ELF specification).
#[derive(Clone, Copy, Debug)]
#[repr(C)]
struct Elf64Phdr {
    /// Segment type (`PT_LOAD` = 1).
    seg_type: u32,
    /// Segment flags (`PF_R`, `PF_W`, `PF_X`).
    flags: u32,
    /// Offset in file.
    offset: u64,
    /// Virtual address in memory.
    vaddr: u64,
    /// Physical address (unused).
    paddr: u64,
    /// Size in file.
    filesz: u64,
    /// Size in memory (>= `filesz`).
    memsz: u64,
    /// Alignment.
    align: u64,
}

const _: () = {
    assert!(size_of::<Elf64Header>() == ELF64_HEADER_SIZE);
    assert!(size_of::<Elf64Phdr>() == ELF64_PHDR_SIZE);
};

// =============================================================================
// Public Types
// =============================================================================

/// Error during ELF parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfError {
    /// Input too small for the ELF header or program header table.
    TooSmall,
    /// Invalid ELF magic bytes.
    InvalidMagic,
    /// Not a 64-bit ELF.
    Not64Bit,
    /// Not little-endian.
    NotLittleEndian,
    /// Not a static (`ET_EXEC`) executable.
    NotExecutable,
    /// Built for a different machine than the loader runs on.
    WrongMachine(u16),
    /// Program header entry size is not 56 bytes.
    InvalidPhdrEntrySize(u16),
    /// Program header table offset or size overflows.
    InvalidPhdrOffset,
    /// The executable requests a program interpreter.
    DynamicExecutable,
    /// The executable carries a `PT_GNU_RELRO` range.
    ///
    /// The C runtime calls `mprotect` on that range during startup, before
    /// any of its pages have been touched, which fails on lazily mapped
    /// memory. Such binaries must be linked with `-z norelro`.
    RelroSegment,
    /// No `PT_LOAD` segment with a non-zero memory size.
    NoLoadableSegments,
    /// A `PT_LOAD` entry violates a segment invariant.
    InvalidSegment {
        /// Index of the program header.
        index: u16,
        /// The violated invariant.
        error: SegmentError,
    },
    /// Two `PT_LOAD` entries occupy intersecting address ranges.
    OverlappingSegments {
        /// Index of the earlier program header.
        first: u16,
        /// Index of the later program header.
        second: u16,
    },
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall => write!(f, "file too small for ELF headers"),
            Self::InvalidMagic => write!(f, "not an ELF file"),
            Self::Not64Bit => write!(f, "not a 64-bit ELF file"),
            Self::NotLittleEndian => write!(f, "not a little-endian ELF file"),
            Self::NotExecutable => write!(f, "not a static executable (ET_EXEC)"),
            Self::WrongMachine(machine) => write!(f, "built for foreign machine {machine}"),
            Self::InvalidPhdrEntrySize(size) => {
                write!(f, "unexpected program header size {size}")
            }
            Self::InvalidPhdrOffset => write!(f, "program header table out of range"),
            Self::DynamicExecutable => {
                write!(f, "dynamically linked executables are not supported")
            }
            Self::RelroSegment => {
                write!(f, "PT_GNU_RELRO is not supported (link with -z norelro)")
            }
            Self::NoLoadableSegments => write!(f, "no loadable segments"),
            Self::InvalidSegment { index, error } => {
                write!(f, "program header {index}: {error}")
            }
            Self::OverlappingSegments { first, second } => {
                write!(f, "program headers {first} and {second} overlap")
            }
        }
    }
}

impl core::error::Error for ElfError {}

/// Validated ELF header of a static executable.
#[derive(Debug, Clone, Copy)]
pub struct ElfHeader {
    header: Elf64Header,
}

/// Ordered segment table of an executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    /// Entry point virtual address.
    pub entry: Vaddr,
    /// File offset of the program header table.
    pub phoff: u64,
    /// Number of program headers.
    pub phnum: u16,
    /// Size of one program header.
    pub phentsize: u16,
    /// `PT_LOAD` segments in program header order.
    pub segments: Vec<Segment>,
}

impl ElfHeader {
    /// Parse and validate an ELF header.
    ///
    /// `data` must hold at least the first [`ELF64_HEADER_SIZE`] bytes of the
    /// file; any additional bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not a 64-bit little-endian static
    /// executable for the host machine.
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        if data.len() < ELF64_HEADER_SIZE {
            return Err(ElfError::TooSmall);
        }

        // SAFETY: We verified the slice is large enough, and the struct is repr(C).
        let header: Elf64Header = unsafe { read_struct(data) };

        if header.ident[0..4] != ELF_MAGIC {
            return Err(ElfError::InvalidMagic);
        }
        if header.ident[4] != ELFCLASS64 {
            return Err(ElfError::Not64Bit);
        }
        if header.ident[5] != ELFDATA2LSB {
            return Err(ElfError::NotLittleEndian);
        }
        if header.file_type != ET_EXEC {
            return Err(ElfError::NotExecutable);
        }
        if let Some(host) = HOST_MACHINE {
            if header.machine != host {
                return Err(ElfError::WrongMachine(header.machine));
            }
        }
        if usize::from(header.phentsize) != ELF64_PHDR_SIZE {
            return Err(ElfError::InvalidPhdrEntrySize(header.phentsize));
        }

        header
            .phoff
            .checked_add(u64::from(header.phnum) * u64::from(header.phentsize))
            .ok_or(ElfError::InvalidPhdrOffset)?;

        Ok(Self { header })
    }

    /// Returns the entry point virtual address.
    #[must_use]
    pub const fn entry_point(&self) -> Vaddr {
        Vaddr::new(self.header.entry)
    }

    /// Returns the target machine.
    #[must_use]
    pub const fn machine(&self) -> u16 {
        self.header.machine
    }

    /// File offset of the program header table.
    #[must_use]
    pub const fn phdr_offset(&self) -> u64 {
        self.header.phoff
    }

    /// Size in bytes of the whole program header table.
    #[must_use]
    pub const fn phdr_table_len(&self) -> usize {
        self.header.phnum as usize * self.header.phentsize as usize
    }

    /// Parse the program header table into a segment table.
    ///
    /// `table` must hold exactly the bytes starting at [`Self::phdr_offset`];
    /// at least [`Self::phdr_table_len`] of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is truncated, the executable is dynamic,
    /// or a `PT_LOAD` entry is malformed or overlaps another one.
    pub fn segments(&self, table: &[u8]) -> Result<SegmentTable, ElfError> {
        if table.len() < self.phdr_table_len() {
            return Err(ElfError::TooSmall);
        }

        let mut segments: Vec<Segment> = Vec::new();
        let mut indices: Vec<u16> = Vec::new();

        for index in 0..self.header.phnum {
            let phdr = self.program_header(table, index);
            if phdr.seg_type == PT_INTERP {
                return Err(ElfError::DynamicExecutable);
            }
            if phdr.seg_type == PT_GNU_RELRO {
                return Err(ElfError::RelroSegment);
            }
            if phdr.seg_type != PT_LOAD || phdr.memsz == 0 {
                continue;
            }

            let segment = Segment {
                vaddr: Vaddr::new(phdr.vaddr),
                file_size: phdr.filesz,
                mem_size: phdr.memsz,
                file_offset: phdr.offset,
                permissions: Permissions::from_elf_flags(phdr.flags),
            };
            segment
                .validate()
                .map_err(|error| ElfError::InvalidSegment { index, error })?;

            if let Some(pos) = segments.iter().position(|s| s.overlaps(&segment)) {
                return Err(ElfError::OverlappingSegments {
                    first: indices[pos],
                    second: index,
                });
            }

            segments.push(segment);
            indices.push(index);
        }

        if segments.is_empty() {
            return Err(ElfError::NoLoadableSegments);
        }

        Ok(SegmentTable {
            entry: self.entry_point(),
            phoff: self.header.phoff,
            phnum: self.header.phnum,
            phentsize: self.header.phentsize,
            segments,
        })
    }

    /// Read a program header by index.
    fn program_header(&self, table: &[u8], index: u16) -> Elf64Phdr {
        let offset = usize::from(index) * usize::from(self.header.phentsize);

        // SAFETY: The caller validated the table length against phnum * phentsize,
        // and phentsize equals size_of::<Elf64Phdr>().
        unsafe { read_struct(&table[offset..]) }
    }
}

/// Parse a complete in-memory ELF image.
///
/// # Errors
///
/// Returns an error if the header or program header table is invalid.
pub fn parse(data: &[u8]) -> Result<SegmentTable, ElfError> {
    let header = ElfHeader::parse(data)?;
    let start = usize::try_from(header.phdr_offset()).map_err(|_| ElfError::InvalidPhdrOffset)?;
    let table = data.get(start..).ok_or(ElfError::TooSmall)?;
    header.segments(table)
}

impl SegmentTable {
    /// Virtual address of the program header table, if a segment maps it.
    #[must_use]
    pub fn phdr_vaddr(&self) -> Option<Vaddr> {
        self.segments.iter().find_map(|seg| {
            let start = seg.file_offset;
            let end = start + seg.file_size;
            (self.phoff >= start && self.phoff < end).then(|| seg.vaddr.add(self.phoff - start))
        })
    }
}

/// Read a struct from a byte slice.
///
/// # Safety
///
/// The slice must be at least `size_of::<T>()` bytes.
/// The struct must be `repr(C)` with no padding requirements beyond the slice.
unsafe fn read_struct<T: Copy>(data: &[u8]) -> T {
    debug_assert!(data.len() >= size_of::<T>());
    // SAFETY: Caller ensures data is large enough. Use read_unaligned since ELF data may not be aligned.
    unsafe { data.as_ptr().cast::<T>().read_unaligned() }
}
