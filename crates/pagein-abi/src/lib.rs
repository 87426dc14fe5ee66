// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared data types for the pagein demand-paging loader.
//!
//! This crate defines the vocabulary shared by the ELF parser and the
//! fault-servicing engine:
//! - Address and page-granularity types
//! - Segment descriptors and their permission bits
//! - The normalized fault event and its two-valued outcome
//!
//! # Design Principles
//!
//! - **No dependencies**: Pure data types, 100% host-testable
//! - **Platform neutral**: Nothing here knows about signals, exceptions or `mmap`
//! - **64-bit addresses**: All virtual addresses are `u64`
//!
//! # Modules
//!
//! - [`types`]: `Vaddr` and `PageSize`
//! - [`perms`]: Segment permission bits
//! - [`segment`]: Segment descriptors
//! - [`fault`]: Normalized fault events

#![no_std]

#[cfg(test)]
extern crate std;

pub mod fault;
pub mod perms;
pub mod segment;
pub mod types;

// Re-export commonly used types at crate root
pub use fault::{FaultEvent, FaultOutcome};
pub use perms::Permissions;
pub use segment::{Segment, SegmentError};
pub use types::{PageSize, Vaddr};
