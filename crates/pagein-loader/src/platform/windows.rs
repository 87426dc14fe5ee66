// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `VirtualAlloc`/`VirtualProtect` backed mapping.

use std::io;
use std::mem;
use std::slice;

use pagein_abi::{PageSize, Permissions, Vaddr};
use winapi::shared::minwindef::DWORD;
use winapi::um::memoryapi::{VirtualAlloc, VirtualProtect};
use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};
use winapi::um::winnt::{MEM_COMMIT, MEM_RESERVE, PAGE_READWRITE};

use super::PageMapper;
use crate::error::MapError;
use crate::protection::windows_protect;

/// Maps pages of the running process with `VirtualAlloc`.
#[derive(Debug, Default)]
pub struct WindowsMapper;

impl WindowsMapper {
    /// Creates the mapper.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PageMapper for WindowsMapper {
    fn map_writable(&mut self, base: Vaddr, len: usize) -> Result<&mut [u8], MapError> {
        // SAFETY: reserving and committing at a fixed address fails rather
        // than overlapping an existing allocation.
        let ptr = unsafe {
            VirtualAlloc(
                base.as_mut_ptr(),
                len,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_READWRITE,
            )
        };
        if ptr.is_null() {
            return Err(MapError::last_os_error("VirtualAlloc", base, len));
        }

        // SAFETY: the allocation is committed, zeroed, writable and `len`
        // bytes long.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.cast::<u8>(), len) })
    }

    fn protect(
        &mut self,
        base: Vaddr,
        len: usize,
        permissions: Permissions,
    ) -> Result<(), MapError> {
        let mut old: DWORD = 0;
        // SAFETY: `base` is the start of an allocation made by `map_writable`.
        let ok = unsafe {
            VirtualProtect(
                base.as_mut_ptr(),
                len,
                windows_protect(permissions),
                &raw mut old,
            )
        };
        if ok == 0 {
            return Err(MapError::last_os_error("VirtualProtect", base, len));
        }
        Ok(())
    }
}

/// Allocation granularity of `VirtualAlloc`.
pub fn page_size() -> io::Result<PageSize> {
    // SAFETY: SYSTEM_INFO is plain data; GetSystemInfo fills every field.
    let mut info: SYSTEM_INFO = unsafe { mem::zeroed() };
    // SAFETY: `info` is a valid out pointer.
    unsafe { GetSystemInfo(&raw mut info) };
    PageSize::new(u64::from(info.dwAllocationGranularity))
        .ok_or_else(|| io::Error::other("allocation granularity is not a power of two"))
}
