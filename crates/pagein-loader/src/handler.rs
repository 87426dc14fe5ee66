// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The page fault state machine.
//!
//! Every fault lands in exactly one of three states:
//!
//! | State | Condition | Action |
//! |-------|-----------|--------|
//! | Unrecognized | address outside every segment | forward |
//! | AlreadyMaterialized | page already marked mapped | forward |
//! | FirstTouch | page not yet mapped | materialize, resume |
//!
//! A fault on a materialized page is a genuine protection violation (a write
//! to a read-only page, say) and belongs to the previously registered
//! handler. Neither forwarding state mutates anything beyond statistics.
//!
//! FirstTouch maps the page writable, zeroes the bss tail, copies the file
//! prefix, applies the segment's protection and only then marks the page.
//! Any primitive failure along the way is a [`FaultError`] and the caller
//! must terminate the process: the page is half-built and the faulting
//! instruction cannot be retried.

use std::fmt;
use std::io::{Read, Seek};

use pagein_abi::{FaultEvent, FaultOutcome, Vaddr};
use tracing::{debug, trace};

use crate::error::FaultError;
use crate::image::ProgramImage;
use crate::locator::locate;
use crate::materialize;
use crate::platform::PageMapper;

/// Why a fault was not serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardReason {
    /// The address lies outside every segment.
    Unrecognized,
    /// The page was already materialized; the access itself is invalid.
    AlreadyMaterialized {
        /// Index of the owning segment.
        segment: usize,
        /// Page index inside the segment.
        page: usize,
    },
}

/// Result of servicing one fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDisposition {
    /// The page was installed; retry the access.
    Materialized {
        /// Index of the owning segment.
        segment: usize,
        /// Page index inside the segment.
        page: usize,
        /// Base address of the installed page.
        base: Vaddr,
    },
    /// Hand the fault to the previous handler.
    Forward(ForwardReason),
}

impl FaultDisposition {
    /// The two-valued outcome reported back to the platform.
    #[must_use]
    pub const fn outcome(self) -> FaultOutcome {
        match self {
            Self::Materialized { .. } => FaultOutcome::Resume,
            Self::Forward(_) => FaultOutcome::Forward,
        }
    }
}

/// Counters of fault decisions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FaultStats {
    /// Pages materialized.
    pub materialized: u64,
    /// Faults outside every segment.
    pub forwarded_unrecognized: u64,
    /// Faults on pages that were already materialized.
    pub forwarded_already_mapped: u64,
}

impl FaultStats {
    /// Total number of faults seen.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.materialized + self.forwarded_unrecognized + self.forwarded_already_mapped
    }
}

impl fmt::Display for FaultStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} faults: {} materialized, {} unrecognized, {} already mapped",
            self.total(),
            self.materialized,
            self.forwarded_unrecognized,
            self.forwarded_already_mapped
        )
    }
}

/// Loader context: the image, its backing file and the mapping primitives.
#[derive(Debug)]
pub struct FaultHandler<M, F> {
    image: ProgramImage<F>,
    mapper: M,
    stats: FaultStats,
}

impl<M: PageMapper, F: Read + Seek> FaultHandler<M, F> {
    /// Creates a handler owning `image` and `mapper`.
    pub const fn new(image: ProgramImage<F>, mapper: M) -> Self {
        Self {
            image,
            mapper,
            stats: FaultStats {
                materialized: 0,
                forwarded_unrecognized: 0,
                forwarded_already_mapped: 0,
            },
        }
    }

    /// Services one fault.
    pub fn handle(&mut self, event: FaultEvent) -> Result<FaultDisposition, FaultError> {
        let page_size = self.image.page_size();
        let page_len = page_size.as_usize();
        let (segments, file) = self.image.parts_mut();

        let Some(index) = locate(segments, event.address) else {
            self.stats.forwarded_unrecognized += 1;
            trace!(address = %event.address, "fault outside every segment");
            return Ok(FaultDisposition::Forward(ForwardReason::Unrecognized));
        };

        let entry = &mut segments[index];
        let segment = entry.segment;
        let page = page_size.page_index(event.address.diff(segment.vaddr)) as usize;

        if entry.pages.is_mapped(page) {
            self.stats.forwarded_already_mapped += 1;
            trace!(
                address = %event.address,
                segment = index,
                page,
                "fault on materialized page"
            );
            return Ok(FaultDisposition::Forward(
                ForwardReason::AlreadyMaterialized {
                    segment: index,
                    page,
                },
            ));
        }

        entry.pages.ensure_allocated(segment.mem_size, page_size);
        let base = segment.vaddr.add(page_size.page_offset(page as u64));

        let buf = self
            .mapper
            .map_writable(base, page_len)
            .map_err(|source| FaultError::Map { page: base, source })?;
        materialize::clear(&segment, base, buf);
        let copied =
            materialize::fill(&segment, base, buf, file).map_err(|source| FaultError::Read {
                page: base,
                offset: materialize::file_offset(&segment, base),
                source,
            })?;

        self.mapper
            .protect(base, page_len, segment.permissions)
            .map_err(|source| FaultError::Protect { page: base, source })?;
        let marked = entry.pages.mark_mapped(page);
        debug_assert!(marked, "page {page} of segment {index} has no tracker entry");
        self.stats.materialized += 1;

        debug!(
            address = %event.address,
            segment = index,
            page,
            %base,
            copied,
            permissions = %segment.permissions,
            stats = %self.stats,
            "materialized page"
        );
        Ok(FaultDisposition::Materialized {
            segment: index,
            page,
            base,
        })
    }
}

impl<M, F> FaultHandler<M, F> {
    /// The program image.
    #[must_use]
    pub const fn image(&self) -> &ProgramImage<F> {
        &self.image
    }

    /// The mapping primitives.
    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Fault counters so far.
    #[must_use]
    pub const fn stats(&self) -> FaultStats {
        self.stats
    }
}
