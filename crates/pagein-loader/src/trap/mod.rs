// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Registration of the fault callback.
//!
//! Neither `sigaction` nor `AddVectoredExceptionHandler` carries a context
//! pointer to the callback, so the loader context lives in a process-wide
//! singleton. Startup goes through two steps:
//!
//! 1. [`install`] registers the platform callback exactly once and keeps
//!    the previously active handler for forwarding. Faults arriving before
//!    a context is attached are forwarded.
//! 2. [`Trap::attach`] moves the [`FaultHandler`] into the singleton and
//!    returns the [`Attached`] token required to start the program.
//!
//! There is no uninstall: the callback stays active for the life of the
//! process.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

use std::fs::File;
use std::process;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use pagein_abi::{FaultEvent, FaultOutcome};
use tracing::{error, info};

use crate::error::{FaultError, TrapError};
use crate::handler::FaultHandler;
use crate::platform::NativeMapper;

/// The handler type serviced by the real fault callback.
pub type NativeHandler = FaultHandler<NativeMapper, File>;

/// Set once the platform callback is registered.
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// The attached loader context, null until [`Trap::attach`].
static CONTEXT: AtomicPtr<NativeHandler> = AtomicPtr::new(ptr::null_mut());

/// Claimed for the duration of one fault.
static SERVICING: AtomicBool = AtomicBool::new(false);

/// Proof that the fault callback is registered.
#[derive(Debug)]
pub struct Trap {
    _private: (),
}

/// Proof that a loader context is attached to the registered callback.
#[derive(Debug)]
pub struct Attached {
    _private: (),
}

/// Registers the fault callback.
///
/// # Errors
///
/// Fails with [`TrapError::AlreadyInstalled`] on every call after the first
/// successful one, and with [`TrapError::Register`] if the platform refuses.
pub fn install() -> Result<Trap, TrapError> {
    if INSTALLED.swap(true, Ordering::AcqRel) {
        return Err(TrapError::AlreadyInstalled);
    }

    #[cfg(unix)]
    let registered = unix::register();
    #[cfg(windows)]
    let registered = windows::register();

    if let Err(err) = registered {
        INSTALLED.store(false, Ordering::Release);
        return Err(err);
    }

    info!("fault handler installed");
    Ok(Trap { _private: () })
}

impl Trap {
    /// Hands the loader context to the fault callback.
    ///
    /// The context is leaked: it must outlive every fault of the program,
    /// which runs until the process exits.
    #[must_use]
    pub fn attach(self, handler: NativeHandler) -> Attached {
        let context = Box::into_raw(Box::new(handler));
        CONTEXT.store(context, Ordering::Release);
        Attached { _private: () }
    }
}

/// Routes a normalized fault to the attached context.
///
/// Called from the platform callback on the faulting thread.
fn dispatch(event: FaultEvent) -> FaultOutcome {
    let context = CONTEXT.load(Ordering::Acquire);
    if context.is_null() {
        return FaultOutcome::Forward;
    }

    if SERVICING.swap(true, Ordering::AcqRel) {
        fatal(&FaultError::Reentrant(event.address));
    }

    // SAFETY: the pointer came from Box::into_raw in `attach` and is never
    // freed. SERVICING guarantees this is the only live reference.
    let handler = unsafe { &mut *context };
    let outcome = match handler.handle(event) {
        Ok(disposition) => disposition.outcome(),
        Err(err) => fatal(&err),
    };

    SERVICING.store(false, Ordering::Release);
    outcome
}

/// Ends the process after an unrecoverable fault.
fn fatal(err: &FaultError) -> ! {
    error!(%err, "fatal error while servicing a page fault");
    process::abort()
}
