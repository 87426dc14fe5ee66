// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Segment descriptors.
//!
//! A [`Segment`] describes one contiguous virtual-address range of a program
//! image together with the byte range of the backing file that supplies its
//! leading `file_size` bytes. Bytes in `[file_size, mem_size)` (the bss tail)
//! read as zero.

use core::fmt;

use crate::perms::Permissions;
use crate::types::{PageSize, Vaddr};

/// One loadable segment of a program image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// First virtual address of the segment.
    pub vaddr: Vaddr,
    /// Number of bytes backed by the file.
    pub file_size: u64,
    /// Number of bytes occupied in memory (`>= file_size`).
    pub mem_size: u64,
    /// Offset of the first file-backed byte in the backing file.
    pub file_offset: u64,
    /// Final protection of every page of this segment.
    pub permissions: Permissions,
}

/// Error describing an ill-formed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    /// `file_size` exceeds `mem_size`.
    FileLargerThanMemory,
    /// `vaddr + mem_size` or `file_offset + file_size` overflows.
    AddressOverflow,
    /// The file offset is too small to widen the segment to a page boundary.
    MisalignedOffset,
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileLargerThanMemory => write!(f, "file size exceeds memory size"),
            Self::AddressOverflow => write!(f, "segment range overflows the address space"),
            Self::MisalignedOffset => {
                write!(f, "file offset cannot be aligned with the virtual address")
            }
        }
    }
}

impl core::error::Error for SegmentError {}

impl Segment {
    /// Checks the size and overflow invariants of this segment.
    pub const fn validate(&self) -> Result<(), SegmentError> {
        if self.file_size > self.mem_size {
            return Err(SegmentError::FileLargerThanMemory);
        }
        if self.vaddr.checked_add(self.mem_size).is_none() {
            return Err(SegmentError::AddressOverflow);
        }
        if self.file_offset.checked_add(self.file_size).is_none() {
            return Err(SegmentError::AddressOverflow);
        }
        Ok(())
    }

    /// One past the last virtual address of the segment.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Vaddr {
        self.vaddr.add(self.mem_size)
    }

    /// One past the last file-backed virtual address of the segment.
    #[inline]
    #[must_use]
    pub const fn file_end(&self) -> Vaddr {
        self.vaddr.add(self.file_size)
    }

    /// Returns true if `addr` lies in `[vaddr, vaddr + mem_size)`.
    #[inline]
    #[must_use]
    pub const fn contains(&self, addr: Vaddr) -> bool {
        addr.as_u64() >= self.vaddr.as_u64() && addr.as_u64() < self.end().as_u64()
    }

    /// Returns true if the virtual ranges of both segments intersect.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.vaddr.as_u64() < other.end().as_u64() && other.vaddr.as_u64() < self.end().as_u64()
    }

    /// Number of pages covering `mem_size`.
    #[inline]
    #[must_use]
    pub const fn page_count(&self, page: PageSize) -> u64 {
        page.pages_for(self.mem_size)
    }

    /// Widens the segment down to a page boundary.
    ///
    /// The bytes between the page boundary and the original start come from
    /// the file when the segment is file-backed, and are zero otherwise.
    pub const fn page_aligned(&self, page: PageSize) -> Result<Self, SegmentError> {
        let delta = page.offset_in_page(self.vaddr);
        if delta == 0 {
            return Ok(*self);
        }

        let Some(mem_size) = self.mem_size.checked_add(delta) else {
            return Err(SegmentError::AddressOverflow);
        };

        let (file_offset, file_size) = if self.file_size == 0 {
            (self.file_offset, 0)
        } else if self.file_offset < delta {
            return Err(SegmentError::MisalignedOffset);
        } else {
            (self.file_offset - delta, self.file_size + delta)
        };

        Ok(Self {
            vaddr: page.align_down(self.vaddr),
            file_size,
            mem_size,
            file_offset,
            permissions: self.permissions,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}) {} file {:#x}+{:#x}",
            self.vaddr,
            self.end(),
            self.permissions,
            self.file_offset,
            self.file_size
        )
    }
}

impl AsRef<Self> for Segment {
    fn as_ref(&self) -> &Self {
        self
    }
}
