// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `mmap`/`mprotect` backed mapping.

use std::io;
use std::slice;

use pagein_abi::{PageSize, Permissions, Vaddr};

use super::PageMapper;
use crate::error::MapError;
use crate::protection::unix_prot;

/// Maps pages of the running process with `mmap`.
#[derive(Debug, Default)]
pub struct UnixMapper;

impl UnixMapper {
    /// Creates the mapper.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PageMapper for UnixMapper {
    fn map_writable(&mut self, base: Vaddr, len: usize) -> Result<&mut [u8], MapError> {
        // SAFETY: MAP_FIXED replaces whatever is mapped at `base`. The fault
        // handler only maps pages of segments, which the image guarantees are
        // disjoint and were unmapped when the fault was raised.
        let ptr = unsafe {
            libc::mmap(
                base.as_mut_ptr(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_FIXED | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(MapError::last_os_error("mmap", base, len));
        }
        if ptr.cast::<u8>() != base.as_mut_ptr::<u8>() {
            return Err(MapError::Misplaced {
                requested: base,
                actual: Vaddr::new(ptr as u64),
            });
        }

        // SAFETY: the kernel just created a private, writable, zeroed mapping
        // of exactly `len` bytes at `ptr`; nothing else references it yet.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.cast::<u8>(), len) })
    }

    fn protect(
        &mut self,
        base: Vaddr,
        len: usize,
        permissions: Permissions,
    ) -> Result<(), MapError> {
        // SAFETY: `base` is the start of a mapping installed by `map_writable`.
        let rc = unsafe { libc::mprotect(base.as_mut_ptr(), len, unix_prot(permissions)) };
        if rc != 0 {
            return Err(MapError::last_os_error("mprotect", base, len));
        }
        Ok(())
    }
}

/// Maps an anonymous read-write region anywhere in the address space.
pub fn map_anonymous(len: usize) -> Result<Vaddr, MapError> {
    // SAFETY: a non-fixed anonymous mapping cannot clobber existing memory.
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        return Err(MapError::last_os_error("mmap", Vaddr::null(), len));
    }
    Ok(Vaddr::new(ptr as u64))
}

/// CPU page size from `sysconf(_SC_PAGESIZE)`.
pub fn page_size() -> io::Result<PageSize> {
    // SAFETY: sysconf has no preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if raw <= 0 {
        return Err(io::Error::last_os_error());
    }
    u64::try_from(raw)
        .ok()
        .and_then(PageSize::new)
        .ok_or_else(|| io::Error::other(format!("page size {raw} is not a power of two")))
}
