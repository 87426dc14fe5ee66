// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the page state tracker.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;

const P: PageSize = PageSize::SIZE_4K;

#[test]
fn starts_unallocated() {
    let state = PageState::new();
    assert!(!state.is_allocated());
    assert!(state.is_empty());
    assert!(!state.is_mapped(0));
}

#[test]
fn allocation_rounds_up_to_whole_pages() {
    let mut state = PageState::new();
    state.ensure_allocated(0x1001, P);
    assert!(state.is_allocated());
    assert_eq!(state.len(), 2);
    assert_eq!(state.mapped_count(), 0);
}

#[test]
fn allocation_is_idempotent() {
    let mut state = PageState::new();
    state.ensure_allocated(0x3000, P);
    assert!(state.mark_mapped(1));

    // A second call must not replace the array
    state.ensure_allocated(0x10_0000, P);
    assert_eq!(state.len(), 3);
    assert!(state.is_mapped(1));
}

#[test]
fn mark_sets_exactly_one_page() {
    let mut state = PageState::new();
    state.ensure_allocated(0x4000, P);
    assert!(state.mark_mapped(2));

    assert!(!state.is_mapped(0));
    assert!(!state.is_mapped(1));
    assert!(state.is_mapped(2));
    assert!(!state.is_mapped(3));
    assert_eq!(state.mapped_count(), 1);
}

#[test]
fn mark_is_sticky() {
    let mut state = PageState::new();
    state.ensure_allocated(0x1000, P);
    assert!(state.mark_mapped(0));
    assert!(state.mark_mapped(0));
    assert!(state.is_mapped(0));
    assert_eq!(state.mapped_count(), 1);
}

#[test]
fn out_of_range_is_rejected() {
    let mut state = PageState::new();
    assert!(!state.mark_mapped(0));

    state.ensure_allocated(0x1000, P);
    assert!(!state.mark_mapped(1));
    assert!(!state.is_mapped(1));
}

#[test]
fn coarse_granularity_sizes_the_array() {
    let mut state = PageState::new();
    state.ensure_allocated(0x2_0000, PageSize::SIZE_64K);
    assert_eq!(state.len(), 2);
}
