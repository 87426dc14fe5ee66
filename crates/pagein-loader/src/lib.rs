// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Demand-paging loader engine.
//!
//! Starts a static executable without loading its segments. Every page is
//! mapped on the first access to it: the access faults, the fault is
//! delivered to [`handler::FaultHandler`], which locates the owning segment,
//! installs a writable page, copies the file-backed bytes, zeroes the tail,
//! applies the segment's final protection and resumes the faulting
//! instruction.
//!
//! # Layers
//!
//! - [`locator`], [`page_state`], [`materialize`]: pure building blocks
//! - [`handler`]: the fault state machine, written once against
//!   [`platform::PageMapper`] and the normalized [`pagein_abi::FaultEvent`]
//! - [`platform`], [`protection`]: mapping primitives per operating system
//! - [`trap`]: registration of the fault callback and the loader context
//! - [`image`]: the program image and its backing file
//! - [`exec`]: startup stack construction and the jump to the entry point
//!
//! Everything except [`trap`] and the final jump in [`exec`] runs unchanged
//! against [`platform::MockMapper`], so the whole decision path is tested on
//! the host without touching real mappings.

pub mod config;
pub mod error;
#[cfg(any(unix, windows))]
pub mod exec;
pub mod handler;
pub mod image;
pub mod locator;
pub mod materialize;
pub mod page_state;
pub mod platform;
pub mod protection;
#[cfg(any(unix, windows))]
pub mod trap;

pub use error::{ExecError, FaultError, ImageError, LoaderError, MapError, TrapError};
pub use handler::{FaultDisposition, FaultHandler, FaultStats, ForwardReason};
pub use image::{ExecInfo, ImageSegment, ProgramImage};
