// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `SIGSEGV` adapter.

use std::io;
use std::mem;
use std::sync::OnceLock;

use libc::{c_int, c_void, siginfo_t};
use pagein_abi::{FaultEvent, FaultOutcome, Vaddr};

use crate::error::TrapError;

type SigInfoFn = extern "C" fn(c_int, *mut siginfo_t, *mut c_void);
type PlainFn = extern "C" fn(c_int);

/// Disposition of `SIGSEGV` before the loader registered itself.
#[derive(Debug, Clone, Copy)]
enum PreviousHandler {
    Default,
    Ignore,
    Plain(PlainFn),
    SigInfo(SigInfoFn),
}

impl PreviousHandler {
    fn from_action(action: &libc::sigaction) -> Self {
        match action.sa_sigaction {
            libc::SIG_DFL => Self::Default,
            libc::SIG_IGN => Self::Ignore,
            raw if action.sa_flags & libc::SA_SIGINFO != 0 => {
                // SAFETY: with SA_SIGINFO set the kernel calls sa_sigaction
                // with the three-argument signature.
                Self::SigInfo(unsafe { mem::transmute::<libc::sighandler_t, SigInfoFn>(raw) })
            }
            raw => {
                // SAFETY: without SA_SIGINFO sa_sigaction holds a plain
                // one-argument handler.
                Self::Plain(unsafe { mem::transmute::<libc::sighandler_t, PlainFn>(raw) })
            }
        }
    }
}

static PREVIOUS: OnceLock<PreviousHandler> = OnceLock::new();

pub(super) fn register() -> Result<(), TrapError> {
    // SAFETY: an all-zero sigaction is a valid empty value.
    let mut action: libc::sigaction = unsafe { mem::zeroed() };
    action.sa_sigaction = on_sigsegv as SigInfoFn as libc::sighandler_t;
    action.sa_flags = libc::SA_SIGINFO;
    // SAFETY: sa_mask is a valid sigset_t owned by `action`.
    unsafe { libc::sigemptyset(&raw mut action.sa_mask) };

    // SAFETY: as above.
    let mut old: libc::sigaction = unsafe { mem::zeroed() };
    // SAFETY: both pointers reference live sigaction values.
    if unsafe { libc::sigaction(libc::SIGSEGV, &raw const action, &raw mut old) } != 0 {
        return Err(TrapError::Register(io::Error::last_os_error()));
    }

    let _ = PREVIOUS.set(PreviousHandler::from_action(&old));
    Ok(())
}

extern "C" fn on_sigsegv(signum: c_int, info: *mut siginfo_t, context: *mut c_void) {
    // SAFETY: SA_SIGINFO handlers receive a valid siginfo_t.
    let address = unsafe { (*info).si_addr() } as u64;

    match super::dispatch(FaultEvent::new(Vaddr::new(address))) {
        FaultOutcome::Resume => {}
        FaultOutcome::Forward => forward(signum, info, context),
    }
}

fn forward(signum: c_int, info: *mut siginfo_t, context: *mut c_void) {
    match PREVIOUS.get().copied().unwrap_or(PreviousHandler::Default) {
        PreviousHandler::SigInfo(handler) => handler(signum, info, context),
        PreviousHandler::Plain(handler) => handler(signum),
        // Returning re-executes the access, which now hits the default
        // disposition and terminates the process with the original signal.
        PreviousHandler::Default | PreviousHandler::Ignore => {
            // SAFETY: resetting a signal to SIG_DFL has no preconditions.
            unsafe { libc::signal(signum, libc::SIG_DFL) };
        }
    }
}
