// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Command line and loader configuration.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pagein_abi::PageSize;

/// Default stack size of the loaded program.
pub const DEFAULT_STACK_SIZE: u64 = 8 * 1024 * 1024;

/// Smallest stack handed to a program.
pub const MIN_STACK_SIZE: u64 = 64 * 1024;

/// Runs static executables, loading each page on first access.
#[derive(Parser, Debug)]
#[command(name = "pagein", version, about)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,

    /// Log every fault decision (overridden by `PAGEIN_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Subcommands of `pagein`.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and run a program.
    Run(RunArgs),

    /// Print the segment table of a program without running it.
    Inspect(InspectArgs),
}

/// Arguments of `pagein run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Static executable to run.
    pub program: PathBuf,

    /// Stack size for the program (accepts K, M and G suffixes).
    #[arg(long, default_value = "8M", value_parser = parse_size)]
    pub stack_size: u64,

    /// Arguments passed to the program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<OsString>,
}

/// Arguments of `pagein inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Static executable to inspect.
    pub program: PathBuf,
}

/// Settings that shape the program's initial process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Requested stack size in bytes.
    pub stack_size: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl From<&RunArgs> for LoaderConfig {
    fn from(args: &RunArgs) -> Self {
        Self {
            stack_size: args.stack_size,
        }
    }
}

impl LoaderConfig {
    /// Stack length: at least [`MIN_STACK_SIZE`], in whole pages.
    #[must_use]
    pub fn stack_len(&self, page: PageSize) -> u64 {
        let len = self.stack_size.max(MIN_STACK_SIZE);
        page.align_len_up(len).unwrap_or(len)
    }
}

impl RunArgs {
    /// `argv` for the program: its path followed by the extra arguments.
    #[must_use]
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone().into_os_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Parses a byte count such as `65536`, `512K`, `8M` or `1G`.
pub fn parse_size(input: &str) -> Result<u64, String> {
    let input = input.trim();
    let (digits, shift) = match input.char_indices().last() {
        Some((at, 'k' | 'K')) => (&input[..at], 10),
        Some((at, 'm' | 'M')) => (&input[..at], 20),
        Some((at, 'g' | 'G')) => (&input[..at], 30),
        _ => (input, 0),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid size `{input}`"))?;
    value
        .checked_mul(1 << shift)
        .ok_or_else(|| format!("size `{input}` is too large"))
}
