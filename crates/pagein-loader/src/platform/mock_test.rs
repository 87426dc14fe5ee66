// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the mock mapper.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;

#[test]
fn map_returns_zeroed_writable_page() {
    let mut mapper = MockMapper::new();
    let page = mapper.map_writable(Vaddr::new(0x1000), 0x1000).unwrap();
    assert_eq!(page.len(), 0x1000);
    assert!(page.iter().all(|&b| b == 0));
    page[4] = 0x42;

    let installed = mapper.page(Vaddr::new(0x1000)).unwrap();
    assert_eq!(installed.data[4], 0x42);
    assert_eq!(installed.permissions, None);
}

#[test]
fn double_map_is_rejected() {
    let mut mapper = MockMapper::new();
    mapper.map_writable(Vaddr::new(0x1000), 0x1000).unwrap();
    assert!(matches!(
        mapper.map_writable(Vaddr::new(0x1000), 0x1000),
        Err(MapError::AlreadyMapped(_))
    ));
}

#[test]
fn protect_requires_mapping() {
    let mut mapper = MockMapper::new();
    assert!(matches!(
        mapper.protect(Vaddr::new(0x1000), 0x1000, Permissions::RX),
        Err(MapError::NotMapped(_))
    ));

    mapper.map_writable(Vaddr::new(0x1000), 0x1000).unwrap();
    mapper
        .protect(Vaddr::new(0x1000), 0x1000, Permissions::RX)
        .unwrap();
    assert_eq!(
        mapper.page(Vaddr::new(0x1000)).unwrap().permissions,
        Some(Permissions::RX)
    );
}

#[test]
fn calls_are_recorded_in_order() {
    let mut mapper = MockMapper::new();
    mapper.map_writable(Vaddr::new(0x2000), 0x1000).unwrap();
    mapper
        .protect(Vaddr::new(0x2000), 0x1000, Permissions::READ)
        .unwrap();

    assert_eq!(
        mapper.calls(),
        &[
            MapperCall::Map {
                base: Vaddr::new(0x2000),
                len: 0x1000
            },
            MapperCall::Protect {
                base: Vaddr::new(0x2000),
                len: 0x1000,
                permissions: Permissions::READ
            },
        ]
    );
    assert_eq!(mapper.map_count(), 1);
    assert_eq!(mapper.protect_count(), 1);
}

#[test]
fn injected_failures_fire_once() {
    let mut mapper = MockMapper::new();
    mapper.fail_map_at(Vaddr::new(0x1000));
    assert!(matches!(
        mapper.map_writable(Vaddr::new(0x1000), 0x1000),
        Err(MapError::Injected(_))
    ));
    assert!(mapper.map_writable(Vaddr::new(0x1000), 0x1000).is_ok());
}

#[test]
fn read_spans_inside_one_mapping() {
    let mut mapper = MockMapper::new();
    let page = mapper.map_writable(Vaddr::new(0x1000), 0x1000).unwrap();
    page[0x10..0x14].copy_from_slice(&[1, 2, 3, 4]);

    assert_eq!(mapper.read(Vaddr::new(0x1010), 4), Some(&[1u8, 2, 3, 4][..]));
    assert_eq!(mapper.read(Vaddr::new(0x1ffe), 4), None);
    assert_eq!(mapper.read(Vaddr::new(0x0800), 1), None);
}
