// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Mock mapper for testing.
//!
//! Pages are heap buffers keyed by base address. Every call is recorded so
//! tests can assert that a page is mapped and protected exactly once.

use std::collections::BTreeMap;

use pagein_abi::{Permissions, Vaddr};

use super::PageMapper;
use crate::error::MapError;

/// One page (or run of pages) installed by [`MockMapper`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPage {
    /// Page contents.
    pub data: Vec<u8>,
    /// Protection applied after population, `None` while still writable.
    pub permissions: Option<Permissions>,
}

/// A call made on [`MockMapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperCall {
    /// [`PageMapper::map_writable`].
    Map {
        /// Requested base.
        base: Vaddr,
        /// Requested length.
        len: usize,
    },
    /// [`PageMapper::protect`].
    Protect {
        /// Requested base.
        base: Vaddr,
        /// Requested length.
        len: usize,
        /// Requested protection.
        permissions: Permissions,
    },
}

/// A heap-backed stand-in for the process address space.
#[derive(Debug, Default)]
pub struct MockMapper {
    pages: BTreeMap<Vaddr, MockPage>,
    calls: Vec<MapperCall>,
    fail_map: Option<Vaddr>,
    fail_protect: Option<Vaddr>,
}

impl MockMapper {
    /// Creates an empty address space.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `map_writable` at `base` fail.
    pub const fn fail_map_at(&mut self, base: Vaddr) {
        self.fail_map = Some(base);
    }

    /// Makes the next `protect` at `base` fail.
    pub const fn fail_protect_at(&mut self, base: Vaddr) {
        self.fail_protect = Some(base);
    }

    /// The mapping installed at `base`, if any.
    #[must_use]
    pub fn page(&self, base: Vaddr) -> Option<&MockPage> {
        self.pages.get(&base)
    }

    /// Base addresses of every installed mapping, ascending.
    pub fn mapped_bases(&self) -> impl Iterator<Item = Vaddr> + '_ {
        self.pages.keys().copied()
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> &[MapperCall] {
        &self.calls
    }

    /// Number of `map_writable` calls.
    #[must_use]
    pub fn map_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, MapperCall::Map { .. }))
            .count()
    }

    /// Number of `protect` calls.
    #[must_use]
    pub fn protect_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, MapperCall::Protect { .. }))
            .count()
    }

    /// Reads `len` bytes at `addr` if they lie inside one mapping.
    #[must_use]
    pub fn read(&self, addr: Vaddr, len: usize) -> Option<&[u8]> {
        let (base, page) = self.pages.range(..=addr).next_back()?;
        let start = usize::try_from(addr.diff(*base)).ok()?;
        page.data.get(start..start.checked_add(len)?)
    }
}

impl PageMapper for MockMapper {
    fn map_writable(&mut self, base: Vaddr, len: usize) -> Result<&mut [u8], MapError> {
        self.calls.push(MapperCall::Map { base, len });

        if self.fail_map.take_if(|at| *at == base).is_some() {
            return Err(MapError::Injected(base));
        }
        if self.pages.contains_key(&base) {
            return Err(MapError::AlreadyMapped(base));
        }

        let page = self.pages.entry(base).or_insert(MockPage {
            data: vec![0; len],
            permissions: None,
        });
        Ok(&mut page.data)
    }

    fn protect(
        &mut self,
        base: Vaddr,
        len: usize,
        permissions: Permissions,
    ) -> Result<(), MapError> {
        self.calls.push(MapperCall::Protect {
            base,
            len,
            permissions,
        });

        if self.fail_protect.take_if(|at| *at == base).is_some() {
            return Err(MapError::Injected(base));
        }

        let page = self
            .pages
            .get_mut(&base)
            .ok_or(MapError::NotMapped(base))?;
        page.permissions = Some(permissions);
        Ok(())
    }
}
