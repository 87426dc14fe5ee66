// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Fault address to segment lookup.

use pagein_abi::{Segment, Vaddr};

/// Returns the index of the segment whose `[vaddr, vaddr + mem_size)`
/// contains `addr`.
///
/// Scans from both ends toward the middle, checking the outer pair on every
/// step. Only disjointness is assumed, not any ordering, so the worst case
/// is a linear scan.
#[must_use]
pub fn locate<S: AsRef<Segment>>(segments: &[S], addr: Vaddr) -> Option<usize> {
    let mut front = 0;
    let mut back = segments.len();

    while front < back {
        back -= 1;
        if segments[front].as_ref().contains(addr) {
            return Some(front);
        }
        if segments[back].as_ref().contains(addr) {
            return Some(back);
        }
        front += 1;
    }

    None
}
