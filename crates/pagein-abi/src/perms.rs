// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Segment permission bits.
//!
//! A segment's permissions are an arbitrary subset of read, write and
//! execute. All eight combinations are valid values here; whether a platform
//! can express a combination exactly is the protection translator's problem,
//! not this type's.

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// ELF segment flag: executable.
pub const PF_X: u32 = 1;

/// ELF segment flag: writable.
pub const PF_W: u32 = 2;

/// ELF segment flag: readable.
pub const PF_R: u32 = 4;

/// Memory access permissions of a segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Permissions(u8);

impl Permissions {
    /// No access.
    pub const NONE: Self = Self(0);

    /// Reading is allowed.
    pub const READ: Self = Self(1);

    /// Writing is allowed.
    pub const WRITE: Self = Self(2);

    /// Instruction fetch is allowed.
    pub const EXECUTE: Self = Self(4);

    /// Read-write (data, bss).
    pub const RW: Self = Self(Self::READ.0 | Self::WRITE.0);

    /// Read-execute (code).
    pub const RX: Self = Self(Self::READ.0 | Self::EXECUTE.0);

    /// Every right.
    pub const RWX: Self = Self(Self::READ.0 | Self::WRITE.0 | Self::EXECUTE.0);

    /// All eight combinations, in bit order.
    pub const ALL_COMBINATIONS: [Self; 8] = [
        Self(0),
        Self(1),
        Self(2),
        Self(3),
        Self(4),
        Self(5),
        Self(6),
        Self(7),
    ];

    /// Creates permissions from raw bits, ignoring unknown bits.
    #[inline]
    #[must_use]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::RWX.0)
    }

    /// Creates permissions from ELF `p_flags`.
    #[inline]
    #[must_use]
    pub const fn from_elf_flags(flags: u32) -> Self {
        let mut bits = 0;
        if flags & PF_R != 0 {
            bits |= Self::READ.0;
        }
        if flags & PF_W != 0 {
            bits |= Self::WRITE.0;
        }
        if flags & PF_X != 0 {
            bits |= Self::EXECUTE.0;
        }
        Self(bits)
    }

    /// Raw bit value.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every right in `other` is also in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if reading is allowed.
    #[inline]
    #[must_use]
    pub const fn can_read(self) -> bool {
        self.contains(Self::READ)
    }

    /// Returns true if writing is allowed.
    #[inline]
    #[must_use]
    pub const fn can_write(self) -> bool {
        self.contains(Self::WRITE)
    }

    /// Returns true if execution is allowed.
    #[inline]
    #[must_use]
    pub const fn can_execute(self) -> bool {
        self.contains(Self::EXECUTE)
    }

    /// Returns a short string representation (e.g., "RX", "RW").
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match (self.can_read(), self.can_write(), self.can_execute()) {
            (true, false, true) => "RX",
            (true, true, false) => "RW",
            (true, false, false) => "RO",
            (true, true, true) => "RWX",
            (false, false, true) => "X",
            (false, true, false) => "W",
            (false, false, false) => "--",
            (false, true, true) => "WX",
        }
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({})", self.as_str())
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
