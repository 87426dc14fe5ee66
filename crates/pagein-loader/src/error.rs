// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Error types of the loader.
//!
//! Errors are split by the phase in which they occur. Everything up to
//! [`TrapError`] is a setup error and ends the loader before the program
//! runs. [`FaultError`] is raised while servicing a fault and is always
//! fatal: the page is left half-built and cannot be resumed.

use std::io;
use std::path::PathBuf;

use pagein_abi::{SegmentError, Vaddr};
use pagein_elf::ElfError;
use thiserror::Error;

/// Failure to open or validate a program image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The backing file could not be opened.
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },
    /// Reading the headers failed.
    #[error("cannot read headers: {0}")]
    Read(#[source] io::Error),
    /// The headers are not a supported executable.
    #[error(transparent)]
    Elf(#[from] ElfError),
    /// A segment cannot be widened to a page boundary.
    #[error("segment {index}: {source}")]
    Segment {
        /// Index into the segment table.
        index: usize,
        /// The violated invariant.
        source: SegmentError,
    },
    /// Two segments share a page after alignment.
    #[error("segments {first} and {second} share a page")]
    SharedPage {
        /// Index of the earlier segment.
        first: usize,
        /// Index of the later segment.
        second: usize,
    },
}

/// Failure of a mapping primitive.
#[derive(Debug, Error)]
pub enum MapError {
    /// The operating system refused the request.
    #[error("{operation} of {len:#x} bytes at {addr} failed: {source}")]
    Os {
        /// Name of the primitive (`mmap`, `mprotect`, ...).
        operation: &'static str,
        /// Base address of the request.
        addr: Vaddr,
        /// Length of the request.
        len: usize,
        /// Underlying OS error.
        source: io::Error,
    },
    /// The mapping landed somewhere other than the requested address.
    #[error("mapping requested at {requested} was placed at {actual}")]
    Misplaced {
        /// Requested base.
        requested: Vaddr,
        /// Base returned by the kernel.
        actual: Vaddr,
    },
    /// The range is already mapped.
    #[error("page at {0} is already mapped")]
    AlreadyMapped(Vaddr),
    /// The range is not mapped.
    #[error("page at {0} is not mapped")]
    NotMapped(Vaddr),
    /// A failure injected by the mock mapper.
    #[error("injected failure at {0}")]
    Injected(Vaddr),
}

impl MapError {
    /// Captures the last OS error for a failed primitive.
    #[must_use]
    pub fn last_os_error(operation: &'static str, addr: Vaddr, len: usize) -> Self {
        Self::Os {
            operation,
            addr,
            len,
            source: io::Error::last_os_error(),
        }
    }
}

/// Failure while servicing a fault. Always fatal.
#[derive(Debug, Error)]
pub enum FaultError {
    /// Installing the writable page failed.
    #[error("cannot map page {page}: {source}")]
    Map {
        /// Page base address.
        page: Vaddr,
        /// Primitive failure.
        source: MapError,
    },
    /// Reading the file-backed bytes failed.
    #[error("cannot read page {page} from file offset {offset:#x}: {source}")]
    Read {
        /// Page base address.
        page: Vaddr,
        /// File offset of the first requested byte.
        offset: u64,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Applying the final protection failed.
    #[error("cannot protect page {page}: {source}")]
    Protect {
        /// Page base address.
        page: Vaddr,
        /// Primitive failure.
        source: MapError,
    },
    /// A fault was raised while another one was being serviced.
    #[error("fault at {0} while servicing another fault")]
    Reentrant(Vaddr),
}

/// Failure to register the fault callback.
#[derive(Debug, Error)]
pub enum TrapError {
    /// The callback is already registered in this process.
    #[error("fault handler already installed")]
    AlreadyInstalled,
    /// The platform rejected the registration.
    #[error("cannot register fault handler: {0}")]
    Register(#[source] io::Error),
}

/// Failure to hand control to the program.
#[derive(Debug, Error)]
pub enum ExecError {
    /// No entry trampoline exists for this target.
    #[error("starting programs is not supported on this target")]
    Unsupported,
    /// An argument or environment string contains a NUL byte.
    #[error("argument contains an interior NUL byte")]
    InteriorNul,
    /// Arguments and environment do not fit into the stack.
    #[error("startup data needs {needed:#x} bytes but the stack has {available:#x}")]
    StackTooSmall {
        /// Bytes needed by the startup data.
        needed: u64,
        /// Size of the stack region.
        available: u64,
    },
    /// Mapping the stack failed.
    #[error("cannot map stack: {0}")]
    Stack(#[source] MapError),
    /// Reading random bytes for `AT_RANDOM` failed.
    #[error("cannot gather random bytes: {0}")]
    Random(#[source] io::Error),
}

/// Any error that ends the loader before the program runs.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Querying the page granularity failed.
    #[error("cannot query page size: {0}")]
    PageSize(#[source] io::Error),
    /// Opening the program image failed.
    #[error("cannot load program image: {0}")]
    Image(#[from] ImageError),
    /// Registering the fault callback failed.
    #[error("cannot install fault handler: {0}")]
    Trap(#[from] TrapError),
    /// Starting the program failed.
    #[error("cannot start program: {0}")]
    Exec(#[from] ExecError),
}
