// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Page content: file-backed prefix and zero-filled tail.
//!
//! For a page at byte offset `b` inside its segment the first
//! `k = clip(file_size - b, 0, page_len)` bytes come from the file at
//! `file_offset + b`; bytes `[k, page_len)` are zero. [`clear`] and [`fill`]
//! cover those two disjoint ranges and may run in either order.

use std::io::{self, Read, Seek, SeekFrom};

use pagein_abi::{Segment, Vaddr};

/// Number of leading bytes of the page at `page_addr` backed by the file.
#[inline]
#[must_use]
pub const fn file_backed_len(segment: &Segment, page_addr: Vaddr, page_len: usize) -> usize {
    let offset = page_addr.diff(segment.vaddr);
    if offset >= segment.file_size {
        return 0;
    }
    let remaining = segment.file_size - offset;
    if remaining < page_len as u64 {
        remaining as usize
    } else {
        page_len
    }
}

/// Zeroes the part of `page` at or beyond `file_size`.
///
/// A page entirely below `file_size` is left untouched.
pub fn clear(segment: &Segment, page_addr: Vaddr, page: &mut [u8]) {
    let split = file_backed_len(segment, page_addr, page.len());
    page[split..].fill(0);
}

/// Copies the file-backed prefix of `page` from `file`.
///
/// Short reads are accumulated until the prefix is complete. Returns the
/// number of bytes copied, which is zero for pages entirely past
/// `file_size`.
///
/// # Errors
///
/// Fails on the first read or seek error, or with
/// [`io::ErrorKind::UnexpectedEof`] if the file ends before the prefix does.
pub fn fill<R: Read + Seek>(
    segment: &Segment,
    page_addr: Vaddr,
    page: &mut [u8],
    file: &mut R,
) -> io::Result<usize> {
    let len = file_backed_len(segment, page_addr, page.len());
    if len == 0 {
        return Ok(0);
    }

    file.seek(SeekFrom::Start(file_offset(segment, page_addr)))?;

    let buf = &mut page[..len];
    let mut done = 0;
    while done < len {
        match file.read(&mut buf[done..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "file ends inside a segment",
                ));
            }
            Ok(n) => done += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }

    Ok(done)
}

/// File offset holding the first byte of the page at `page_addr`.
#[inline]
#[must_use]
pub const fn file_offset(segment: &Segment, page_addr: Vaddr) -> u64 {
    segment.file_offset + page_addr.diff(segment.vaddr)
}
