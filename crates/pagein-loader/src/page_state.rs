// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Per-segment record of materialized pages.
//!
//! The array is allocated on the first fault inside a segment, so segments
//! the program never touches cost nothing. Once allocated its length is
//! fixed, and an entry that became `true` stays `true`.

use pagein_abi::PageSize;

/// Materialization state of every page of one segment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageState {
    pages: Option<Box<[bool]>>,
}

impl PageState {
    /// Creates an unallocated tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self { pages: None }
    }

    /// Returns true once [`Self::ensure_allocated`] has run.
    #[inline]
    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        self.pages.is_some()
    }

    /// Allocates one all-false entry per page covering `mem_size`.
    ///
    /// Does nothing if the array already exists.
    pub fn ensure_allocated(&mut self, mem_size: u64, page: PageSize) {
        if self.pages.is_none() {
            let count = page.pages_for(mem_size) as usize;
            self.pages = Some(vec![false; count].into_boxed_slice());
        }
    }

    /// Returns true if page `index` has been materialized.
    ///
    /// An unallocated tracker reports every page as not mapped.
    #[inline]
    #[must_use]
    pub fn is_mapped(&self, index: usize) -> bool {
        self.pages
            .as_deref()
            .and_then(|pages| pages.get(index))
            .copied()
            .unwrap_or(false)
    }

    /// Records page `index` as materialized.
    ///
    /// Returns false if the tracker is unallocated or `index` is out of
    /// range; neither happens for indices produced by the locator.
    #[must_use]
    pub fn mark_mapped(&mut self, index: usize) -> bool {
        match self.pages.as_deref_mut().and_then(|pages| pages.get_mut(index)) {
            Some(entry) => {
                *entry = true;
                true
            }
            None => false,
        }
    }

    /// Number of tracked pages, or zero if unallocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.as_deref().map_or(0, <[bool]>::len)
    }

    /// Returns true if no pages are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of materialized pages.
    #[must_use]
    pub fn mapped_count(&self) -> usize {
        self.pages
            .as_deref()
            .map_or(0, |pages| pages.iter().filter(|&&mapped| mapped).count())
    }
}

#[cfg(test)]
mod page_state_test;
