// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Normalized fault events.
//!
//! Every operating system delivers memory faults in its own record format
//! (`siginfo_t` on Unix, `EXCEPTION_RECORD` on Windows). A thin per-platform
//! adapter reduces that record to a [`FaultEvent`] and translates the
//! [`FaultOutcome`] back into whatever the platform expects. The decision
//! logic only ever sees these two types.

use crate::types::Vaddr;

/// A memory access fault, reduced to what the loader needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultEvent {
    /// Virtual address whose access faulted.
    pub address: Vaddr,
}

impl FaultEvent {
    /// Creates a fault event for the given address.
    #[inline]
    #[must_use]
    pub const fn new(address: Vaddr) -> Self {
        Self { address }
    }
}

/// What the platform adapter should do after the loader has seen a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultOutcome {
    /// The page is now materialized; retry the faulting instruction.
    Resume,
    /// Not ours; hand the fault to the previously registered handler.
    Forward,
}

impl FaultOutcome {
    /// Returns true if the faulting instruction should be retried.
    #[inline]
    #[must_use]
    pub const fn is_resume(self) -> bool {
        matches!(self, Self::Resume)
    }
}
