// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Page granularity.
//!
//! The loader never assumes a fixed page size. The platform adapter queries
//! the granularity once at startup and every page computation (fault address
//! to page index, mapping length, tracking-array size) goes through the same
//! [`PageSize`] value.

use core::fmt;

use super::Vaddr;

/// A power-of-two page granularity in bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PageSize(u64);

impl PageSize {
    /// The common 4 KiB page, used as a fallback and in tests.
    pub const SIZE_4K: Self = Self(4096);

    /// The 64 KiB allocation granularity of `VirtualAlloc`.
    pub const SIZE_64K: Self = Self(64 * 1024);

    /// Create a page size.
    ///
    /// Returns `None` if `bytes` is zero or not a power of two.
    #[inline]
    #[must_use]
    pub const fn new(bytes: u64) -> Option<Self> {
        if bytes.is_power_of_two() {
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Page size in bytes.
    #[inline]
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Page size in bytes as `usize`.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Number of pages needed to cover `len` bytes (ceiling division).
    #[inline]
    #[must_use]
    pub const fn pages_for(self, len: u64) -> u64 {
        len.div_ceil(self.0)
    }

    /// Index of the page containing byte `offset` of a page-aligned range.
    #[inline]
    #[must_use]
    pub const fn page_index(self, offset: u64) -> u64 {
        offset / self.0
    }

    /// Byte offset of page `index` within a page-aligned range.
    #[inline]
    #[must_use]
    pub const fn page_offset(self, index: u64) -> u64 {
        index * self.0
    }

    /// Offset of `addr` inside its page.
    #[inline]
    #[must_use]
    pub const fn offset_in_page(self, addr: Vaddr) -> u64 {
        addr.as_u64() & (self.0 - 1)
    }

    /// Align `addr` down to a page boundary.
    #[inline]
    #[must_use]
    pub const fn align_down(self, addr: Vaddr) -> Vaddr {
        Vaddr::new(addr.as_u64() & !(self.0 - 1))
    }

    /// Align a byte count up to a whole number of pages.
    ///
    /// Returns `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn align_len_up(self, len: u64) -> Option<u64> {
        match len.checked_add(self.0 - 1) {
            Some(v) => Some(v & !(self.0 - 1)),
            None => None,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::SIZE_4K
    }
}

impl fmt::Debug for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageSize({:#x})", self.0)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

// Compile-time verification of the well-known sizes
const _: () = {
    assert!(PageSize::SIZE_4K.bytes().is_power_of_two());
    assert!(PageSize::SIZE_64K.bytes().is_power_of_two());
    assert!(PageSize::SIZE_4K.bytes() < PageSize::SIZE_64K.bytes());
};
