// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Address and page-granularity types.
//!
//! These newtypes keep raw addresses, byte lengths and page sizes apart at
//! compile time.

mod addr;
mod page;

#[cfg(test)]
mod page_test;

pub use addr::Vaddr;
pub use page::PageSize;
