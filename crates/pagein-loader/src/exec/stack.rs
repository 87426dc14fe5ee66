// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! System V startup stack.
//!
//! At entry the stack pointer addresses `argc`, followed by the `argv`
//! pointers, a null, the `envp` pointers, a null and the auxiliary vector
//! terminated by `AT_NULL`. The strings and the `AT_RANDOM` bytes sit above
//! that, at the top of the stack:
//!
//! ```text
//! top  ->  +------------------+
//!          | random (16)      |  AT_RANDOM
//!          | env strings      |
//!          | argv strings     |
//!          | padding          |
//!          | auxv pairs       |
//!          | 0                |
//!          | envp[]           |
//!          | 0                |
//!          | argv[]           |
//! sp   ->  | argc             |  16-byte aligned
//!          +------------------+
//! ```

use pagein_abi::Vaddr;

use crate::error::ExecError;

// =============================================================================
// Auxiliary vector keys
// =============================================================================

/// End of the auxiliary vector.
pub const AT_NULL: u64 = 0;
/// Address of the program header table.
pub const AT_PHDR: u64 = 3;
/// Size of one program header.
pub const AT_PHENT: u64 = 4;
/// Number of program headers.
pub const AT_PHNUM: u64 = 5;
/// Page size.
pub const AT_PAGESZ: u64 = 6;
/// Program entry point.
pub const AT_ENTRY: u64 = 9;
/// Real user id.
pub const AT_UID: u64 = 11;
/// Effective user id.
pub const AT_EUID: u64 = 12;
/// Real group id.
pub const AT_GID: u64 = 13;
/// Effective group id.
pub const AT_EGID: u64 = 14;
/// CPU capability bits.
pub const AT_HWCAP: u64 = 16;
/// Clock ticks per second.
pub const AT_CLKTCK: u64 = 17;
/// Secure mode flag.
pub const AT_SECURE: u64 = 23;
/// Address of 16 random bytes.
pub const AT_RANDOM: u64 = 25;
/// More CPU capability bits.
pub const AT_HWCAP2: u64 = 26;
/// Address of the program path.
pub const AT_EXECFN: u64 = 31;

const WORD: u64 = 8;
const STACK_ALIGN: u64 = 16;

/// Bytes of the startup stack, ready to be copied to [`Self::sp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupStack {
    sp: Vaddr,
    bytes: Vec<u8>,
}

impl StartupStack {
    /// Lays out the startup data below `top`.
    ///
    /// `auxv` holds `(key, value)` pairs; `AT_RANDOM`, `AT_EXECFN` (when
    /// there is an `argv[0]`) and the terminating `AT_NULL` are appended.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::InteriorNul`] if a string contains a NUL byte.
    pub fn build(
        top: Vaddr,
        args: &[&[u8]],
        env: &[&[u8]],
        auxv: &[(u64, u64)],
        random: [u8; 16],
    ) -> Result<Self, ExecError> {
        let top = top.align_down(STACK_ALIGN).unwrap_or(top);

        let mut strings = Vec::new();
        let mut offsets = Vec::with_capacity(args.len() + env.len());
        for s in args.iter().chain(env) {
            if s.contains(&0) {
                return Err(ExecError::InteriorNul);
            }
            offsets.push(strings.len() as u64);
            strings.extend_from_slice(s);
            strings.push(0);
        }

        let random_addr = top.sub(random.len() as u64);
        let strings_addr = random_addr.sub(strings.len() as u64);
        let string_ptr = |i: usize| strings_addr.add(offsets[i]).as_u64();

        let mut words: Vec<u64> = Vec::new();
        words.push(args.len() as u64);
        words.extend((0..args.len()).map(string_ptr));
        words.push(0);
        words.extend((args.len()..args.len() + env.len()).map(string_ptr));
        words.push(0);
        for &(key, value) in auxv {
            words.extend([key, value]);
        }
        words.extend([AT_RANDOM, random_addr.as_u64()]);
        if !args.is_empty() {
            words.extend([AT_EXECFN, string_ptr(0)]);
        }
        words.extend([AT_NULL, 0]);

        let sp = strings_addr
            .sub(words.len() as u64 * WORD)
            .align_down(STACK_ALIGN)
            .unwrap_or(strings_addr);

        let mut bytes = vec![0u8; top.diff(sp) as usize];
        for (slot, word) in bytes.chunks_exact_mut(WORD as usize).zip(&words) {
            slot.copy_from_slice(&word.to_le_bytes());
        }
        let at = |addr: Vaddr| addr.diff(sp) as usize;
        bytes[at(strings_addr)..at(random_addr)].copy_from_slice(&strings);
        bytes[at(random_addr)..].copy_from_slice(&random);

        Ok(Self { sp, bytes })
    }

    /// Initial stack pointer.
    #[must_use]
    pub const fn sp(&self) -> Vaddr {
        self.sp
    }

    /// Contents of `[sp, top)`.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes between the stack pointer and the top.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a startup stack holds at least `argc` and `AT_NULL`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
