// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Handing control to the loaded program.
//!
//! [`start_execution`] maps a fresh stack, writes the startup data built by
//! [`stack::StartupStack`] into it and jumps to the entry point. No segment
//! is touched beforehand: the very first instruction fetch faults and is
//! serviced by the attached handler.

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
mod entry;
pub mod stack;

use std::convert::Infallible;
use std::ffi::OsString;

use crate::config::LoaderConfig;
use crate::error::ExecError;
use crate::image::ExecInfo;
use crate::trap::Attached;

/// Auxiliary vector entries describing the image.
#[must_use]
pub fn image_auxv(info: &ExecInfo) -> Vec<(u64, u64)> {
    let mut auxv = Vec::new();
    if let Some(phdr) = info.phdr {
        auxv.push((stack::AT_PHDR, phdr.as_u64()));
    }
    auxv.extend([
        (stack::AT_PHENT, u64::from(info.phentsize)),
        (stack::AT_PHNUM, u64::from(info.phnum)),
        (stack::AT_PAGESZ, info.page_size.bytes()),
        (stack::AT_ENTRY, info.entry.as_u64()),
    ]);
    auxv
}

/// Starts the program described by `info` with `args` as its `argv`.
///
/// Requires the [`Attached`] token, so it can only run after the fault
/// handler is installed and the image is open. Never returns on success.
pub fn start_execution(
    attached: &Attached,
    info: &ExecInfo,
    args: &[OsString],
    config: &LoaderConfig,
) -> Result<Infallible, ExecError> {
    #[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        unix::start(attached, info, args, config)
    }
    #[cfg(not(all(unix, any(target_arch = "x86_64", target_arch = "aarch64"))))]
    {
        let _ = (attached, info, args, config);
        Err(ExecError::Unsupported)
    }
}

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
mod unix {
    use std::convert::Infallible;
    use std::env;
    use std::ffi::OsString;
    use std::fs::File;
    use std::io::Read;
    use std::os::unix::ffi::OsStrExt;
    use std::ptr;

    use tracing::info;

    use super::entry;
    use super::stack::StartupStack;
    use crate::config::LoaderConfig;
    use crate::error::ExecError;
    use crate::image::ExecInfo;
    use crate::platform::unix::map_anonymous;
    use crate::trap::Attached;

    pub(super) fn start(
        _attached: &Attached,
        info: &ExecInfo,
        args: &[OsString],
        config: &LoaderConfig,
    ) -> Result<Infallible, ExecError> {
        let stack_len = config.stack_len(info.page_size);
        let base = map_anonymous(stack_len as usize).map_err(ExecError::Stack)?;
        let top = base.add(stack_len);

        let env: Vec<OsString> = env::vars_os()
            .map(|(key, value)| {
                let mut pair = key;
                pair.push("=");
                pair.push(value);
                pair
            })
            .collect();
        let args: Vec<&[u8]> = args.iter().map(|a| a.as_bytes()).collect();
        let env: Vec<&[u8]> = env.iter().map(|e| e.as_bytes()).collect();

        let mut auxv = super::image_auxv(info);
        auxv.extend(host_auxv());

        let stack = StartupStack::build(top, &args, &env, &auxv, random_bytes()?)?;
        if stack.len() as u64 > stack_len {
            return Err(ExecError::StackTooSmall {
                needed: stack.len() as u64,
                available: stack_len,
            });
        }

        // SAFETY: [sp, top) lies inside the stack mapped above.
        unsafe {
            ptr::copy_nonoverlapping(
                stack.bytes().as_ptr(),
                stack.sp().as_mut_ptr::<u8>(),
                stack.len(),
            );
        }

        info!(entry = %info.entry, sp = %stack.sp(), "starting program");

        // SAFETY: the startup stack is complete and the caller holds the
        // Attached token, so the handler services the first fault at entry.
        unsafe { entry::jump(info.entry, stack.sp()) }
    }

    /// Values the kernel gave the loader that the program expects too.
    #[cfg(target_os = "linux")]
    fn host_auxv() -> Vec<(u64, u64)> {
        use super::stack::{
            AT_CLKTCK, AT_EGID, AT_EUID, AT_GID, AT_HWCAP, AT_HWCAP2, AT_SECURE, AT_UID,
        };

        [
            AT_HWCAP, AT_HWCAP2, AT_CLKTCK, AT_UID, AT_EUID, AT_GID, AT_EGID, AT_SECURE,
        ]
        .into_iter()
        // SAFETY: getauxval has no preconditions.
        .map(|key| (key, unsafe { libc::getauxval(key) }))
        .collect()
    }

    #[cfg(not(target_os = "linux"))]
    fn host_auxv() -> Vec<(u64, u64)> {
        Vec::new()
    }

    fn random_bytes() -> Result<[u8; 16], ExecError> {
        let mut bytes = [0u8; 16];
        File::open("/dev/urandom")
            .and_then(|mut f| f.read_exact(&mut bytes))
            .map_err(ExecError::Random)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use pagein_abi::{PageSize, Vaddr};

    #[test]
    fn image_auxv_describes_the_image() {
        let info = ExecInfo {
            entry: Vaddr::new(0x40_1000),
            phdr: Some(Vaddr::new(0x40_0040)),
            phnum: 4,
            phentsize: 56,
            page_size: PageSize::SIZE_4K,
        };

        assert_eq!(
            image_auxv(&info),
            [
                (stack::AT_PHDR, 0x40_0040),
                (stack::AT_PHENT, 56),
                (stack::AT_PHNUM, 4),
                (stack::AT_PAGESZ, 0x1000),
                (stack::AT_ENTRY, 0x40_1000),
            ]
        );
    }

    #[test]
    fn missing_phdr_is_omitted() {
        let info = ExecInfo {
            entry: Vaddr::new(0x40_1000),
            phdr: None,
            phnum: 1,
            phentsize: 56,
            page_size: PageSize::SIZE_4K,
        };
        assert!(image_auxv(&info).iter().all(|(key, _)| *key != stack::AT_PHDR));
    }
}
