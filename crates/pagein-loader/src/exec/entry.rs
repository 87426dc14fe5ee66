// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Jump to the program entry point.

use pagein_abi::Vaddr;

/// Switches to the startup stack and branches to `entry`.
///
/// The frame pointer and the `rtld_fini` argument register are cleared so
/// the C runtime sees no exit hook to register.
///
/// # Safety
///
/// `sp` must point at a complete startup stack and the fault handler must be
/// attached, since the first instruction at `entry` faults.
#[cfg(target_arch = "x86_64")]
pub(super) unsafe fn jump(entry: Vaddr, sp: Vaddr) -> ! {
    // SAFETY: upheld by the caller; nothing of the loader's stack is used
    // after the switch.
    unsafe {
        core::arch::asm!(
            "mov rsp, rdi",
            "xor ebp, ebp",
            "xor edx, edx",
            "jmp rsi",
            in("rdi") sp.as_u64(),
            in("rsi") entry.as_u64(),
            options(noreturn),
        )
    }
}

/// Switches to the startup stack and branches to `entry`.
///
/// # Safety
///
/// As for x86-64.
#[cfg(target_arch = "aarch64")]
pub(super) unsafe fn jump(entry: Vaddr, sp: Vaddr) -> ! {
    // SAFETY: upheld by the caller.
    unsafe {
        core::arch::asm!(
            "mov sp, x9",
            "mov x29, xzr",
            "mov x30, xzr",
            "mov x0, xzr",
            "br x10",
            in("x9") sp.as_u64(),
            in("x10") entry.as_u64(),
            options(noreturn),
        )
    }
}
