// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Vectored exception adapter.

use std::io;

use pagein_abi::{FaultEvent, FaultOutcome, Vaddr};
use winapi::shared::ntdef::LONG;
use winapi::um::errhandlingapi::AddVectoredExceptionHandler;
use winapi::shared::minwindef::DWORD;
use winapi::um::minwinbase::{EXCEPTION_ACCESS_VIOLATION, EXCEPTION_DATATYPE_MISALIGNMENT};
use winapi::um::winnt::{EXCEPTION_POINTERS, EXCEPTION_RECORD};
use winapi::vc::excpt::{EXCEPTION_CONTINUE_EXECUTION, EXCEPTION_CONTINUE_SEARCH};

use crate::error::TrapError;

#[cfg(test)]
mod windows_test;

pub(super) fn register() -> Result<(), TrapError> {
    // SAFETY: the handler is a plain function that lives for the process.
    let handle = unsafe { AddVectoredExceptionHandler(1, Some(on_exception)) };
    if handle.is_null() {
        return Err(TrapError::Register(io::Error::last_os_error()));
    }
    Ok(())
}

unsafe extern "system" fn on_exception(info: *mut EXCEPTION_POINTERS) -> LONG {
    // SAFETY: the system passes valid exception pointers.
    let record = unsafe { &*(*info).ExceptionRecord };
    let Some(address) = fault_address(record) else {
        return EXCEPTION_CONTINUE_SEARCH;
    };

    match super::dispatch(FaultEvent::new(Vaddr::new(address))) {
        FaultOutcome::Resume => EXCEPTION_CONTINUE_EXECUTION,
        FaultOutcome::Forward => EXCEPTION_CONTINUE_SEARCH,
    }
}

/// Faulting address of an exception the loader may service.
///
/// Access violations and misaligned accesses both qualify, as long as the
/// record carries the address in its second information slot.
fn fault_address(record: &EXCEPTION_RECORD) -> Option<u64> {
    if !is_memory_fault(record.ExceptionCode) || record.NumberParameters < 2 {
        return None;
    }
    Some(record.ExceptionInformation[1] as u64)
}

const fn is_memory_fault(code: DWORD) -> bool {
    code == EXCEPTION_ACCESS_VIOLATION || code == EXCEPTION_DATATYPE_MISALIGNMENT
}
