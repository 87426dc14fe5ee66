// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for exception record classification.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;

fn record(code: DWORD, info: &[usize]) -> EXCEPTION_RECORD {
    // SAFETY: EXCEPTION_RECORD is plain data; all-zero is a valid value.
    let mut record: EXCEPTION_RECORD = unsafe { std::mem::zeroed() };
    record.ExceptionCode = code;
    record.NumberParameters = info.len() as DWORD;
    record.ExceptionInformation[..info.len()].copy_from_slice(info);
    record
}

#[test]
fn access_violation_yields_address() {
    let rec = record(EXCEPTION_ACCESS_VIOLATION, &[0, 0x40_1234]);
    assert_eq!(fault_address(&rec), Some(0x40_1234));
}

#[test]
fn misalignment_with_address_is_serviced() {
    let rec = record(EXCEPTION_DATATYPE_MISALIGNMENT, &[0, 0x40_2001]);
    assert_eq!(fault_address(&rec), Some(0x40_2001));
}

#[test]
fn misalignment_without_address_is_forwarded() {
    let rec = record(EXCEPTION_DATATYPE_MISALIGNMENT, &[]);
    assert_eq!(fault_address(&rec), None);
}

#[test]
fn other_exceptions_are_forwarded() {
    // EXCEPTION_INT_DIVIDE_BY_ZERO
    let rec = record(0xC000_0094, &[0, 0x40_1000]);
    assert_eq!(fault_address(&rec), None);
}
