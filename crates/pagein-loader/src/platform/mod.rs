// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Mapping primitives.
//!
//! The fault handler needs exactly two operations from the operating
//! system: install a fresh writable page at a fixed address, and change the
//! protection of that page afterwards. [`PageMapper`] captures both so the
//! handler is written once and tested against [`MockMapper`].

#[cfg(test)]
mod mock_test;

mod mock;
#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

use std::io;

use pagein_abi::{PageSize, Permissions, Vaddr};

use crate::error::MapError;

pub use mock::{MapperCall, MockMapper, MockPage};

#[cfg(unix)]
pub use unix::UnixMapper as NativeMapper;
#[cfg(windows)]
pub use windows::WindowsMapper as NativeMapper;

/// Installs and protects pages of the loaded program.
pub trait PageMapper {
    /// Maps `len` zeroed, writable bytes at exactly `base`.
    ///
    /// The returned slice covers the new mapping and is valid until the
    /// next call on this mapper.
    fn map_writable(&mut self, base: Vaddr, len: usize) -> Result<&mut [u8], MapError>;

    /// Sets the protection of `[base, base + len)` to `permissions`.
    fn protect(&mut self, base: Vaddr, len: usize, permissions: Permissions)
    -> Result<(), MapError>;
}

/// Page granularity used for every fault computation on this host.
///
/// On Windows this is the allocation granularity of `VirtualAlloc`, which is
/// coarser than the CPU page.
pub fn page_size() -> io::Result<PageSize> {
    #[cfg(unix)]
    {
        unix::page_size()
    }
    #[cfg(windows)]
    {
        windows::page_size()
    }
    #[cfg(not(any(unix, windows)))]
    {
        Ok(PageSize::default())
    }
}
