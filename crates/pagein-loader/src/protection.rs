// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Segment permissions to native protection constants.
//!
//! Every one of the eight read/write/execute combinations has a defined
//! translation. Where a platform cannot express a combination the result
//! grants the largest subset of the requested rights, never more.

use pagein_abi::Permissions;

// =============================================================================
// Unix
// =============================================================================

/// `PROT_*` flags for `permissions`. Exact for all combinations.
#[cfg(unix)]
#[must_use]
pub const fn unix_prot(permissions: Permissions) -> libc::c_int {
    let mut prot = libc::PROT_NONE;
    if permissions.can_read() {
        prot |= libc::PROT_READ;
    }
    if permissions.can_write() {
        prot |= libc::PROT_WRITE;
    }
    if permissions.can_execute() {
        prot |= libc::PROT_EXEC;
    }
    prot
}

// =============================================================================
// Windows
// =============================================================================

/// `PAGE_NOACCESS`.
pub const PAGE_NOACCESS: u32 = 0x01;
/// `PAGE_READONLY`.
pub const PAGE_READONLY: u32 = 0x02;
/// `PAGE_READWRITE`.
pub const PAGE_READWRITE: u32 = 0x04;
/// `PAGE_EXECUTE`.
pub const PAGE_EXECUTE: u32 = 0x10;
/// `PAGE_EXECUTE_READ`.
pub const PAGE_EXECUTE_READ: u32 = 0x20;
/// `PAGE_EXECUTE_READWRITE`.
pub const PAGE_EXECUTE_READWRITE: u32 = 0x40;

/// `PAGE_*` constant for `permissions`.
///
/// Windows has no write-only protection, and write access always implies
/// read access. Write-only therefore maps to `PAGE_NOACCESS` and
/// write-execute to `PAGE_EXECUTE`; both drop the write right rather than
/// add a read right the segment never asked for.
#[must_use]
pub const fn windows_protect(permissions: Permissions) -> u32 {
    match (
        permissions.can_read(),
        permissions.can_write(),
        permissions.can_execute(),
    ) {
        (false, _, false) => PAGE_NOACCESS,
        (true, false, false) => PAGE_READONLY,
        (true, true, false) => PAGE_READWRITE,
        (false, _, true) => PAGE_EXECUTE,
        (true, false, true) => PAGE_EXECUTE_READ,
        (true, true, true) => PAGE_EXECUTE_READWRITE,
    }
}

/// Rights actually granted by a `PAGE_*` constant.
#[must_use]
pub const fn windows_granted(protect: u32) -> Permissions {
    match protect {
        PAGE_READONLY => Permissions::READ,
        PAGE_READWRITE => Permissions::RW,
        PAGE_EXECUTE => Permissions::EXECUTE,
        PAGE_EXECUTE_READ => Permissions::RX,
        PAGE_EXECUTE_READWRITE => Permissions::RWX,
        _ => Permissions::NONE,
    }
}

#[cfg(windows)]
const _: () = {
    use winapi::um::winnt;
    assert!(PAGE_NOACCESS == winnt::PAGE_NOACCESS);
    assert!(PAGE_READONLY == winnt::PAGE_READONLY);
    assert!(PAGE_READWRITE == winnt::PAGE_READWRITE);
    assert!(PAGE_EXECUTE == winnt::PAGE_EXECUTE);
    assert!(PAGE_EXECUTE_READ == winnt::PAGE_EXECUTE_READ);
    assert!(PAGE_EXECUTE_READWRITE == winnt::PAGE_EXECUTE_READWRITE);
};
