// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for page granularity arithmetic.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::{PageSize, Vaddr};
use proptest::prelude::*;

#[test]
fn page_size_rejects_invalid() {
    assert!(PageSize::new(0).is_none());
    assert!(PageSize::new(3000).is_none());
    assert!(PageSize::new(4096).is_some());
    assert!(PageSize::new(65536).is_some());
}

#[test]
fn pages_for_rounds_up() {
    let page = PageSize::SIZE_4K;
    assert_eq!(page.pages_for(0), 0);
    assert_eq!(page.pages_for(1), 1);
    assert_eq!(page.pages_for(4096), 1);
    assert_eq!(page.pages_for(4097), 2);
    assert_eq!(page.pages_for(2 * 4096), 2);
}

#[test]
fn page_index_and_offset() {
    let page = PageSize::SIZE_4K;
    assert_eq!(page.page_index(0), 0);
    assert_eq!(page.page_index(4095), 0);
    assert_eq!(page.page_index(4096), 1);
    assert_eq!(page.page_offset(3), 3 * 4096);
}

#[test]
fn alignment_helpers() {
    let page = PageSize::SIZE_4K;
    assert_eq!(page.align_down(Vaddr::new(0x40_17b0)), Vaddr::new(0x40_1000));
    assert_eq!(page.offset_in_page(Vaddr::new(0x40_17b0)), 0x7b0);
    assert_eq!(page.align_len_up(1), Some(4096));
    assert_eq!(page.align_len_up(4096), Some(4096));
    assert_eq!(page.align_len_up(u64::MAX), None);
}

#[test]
fn allocation_granularity_page() {
    let page = PageSize::SIZE_64K;
    assert_eq!(page.pages_for(0x1_0001), 2);
    assert_eq!(page.align_down(Vaddr::new(0x2_3456)), Vaddr::new(0x2_0000));
}

proptest! {
    #[test]
    fn pages_cover_length(len in 0u64..(1 << 40), shift in 12u32..17) {
        let page = PageSize::new(1 << shift).unwrap();
        let pages = page.pages_for(len);
        prop_assert!(pages * page.bytes() >= len);
        prop_assert!(pages == 0 || (pages - 1) * page.bytes() < len);
    }

    #[test]
    fn index_and_offset_agree(offset in 0u64..(1 << 40)) {
        let page = PageSize::SIZE_4K;
        let index = page.page_index(offset);
        let base = page.page_offset(index);
        prop_assert!(base <= offset);
        prop_assert!(offset - base < page.bytes());
    }
}
