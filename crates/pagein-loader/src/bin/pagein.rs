// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `pagein`: run a static executable with demand paging.

use std::convert::Infallible;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use pagein_loader::config::{Cli, Command, InspectArgs, LoaderConfig, RunArgs};
use pagein_loader::{LoaderError, ProgramImage, platform};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Run(args) => run(&args).map(|never| match never {}),
        Command::Inspect(args) => inspect(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pagein: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so the program's stdout stays untouched.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("PAGEIN_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

#[cfg(any(unix, windows))]
fn run(args: &RunArgs) -> Result<Infallible, LoaderError> {
    use pagein_loader::{FaultHandler, exec, trap};

    let page_size = platform::page_size().map_err(LoaderError::PageSize)?;
    let trap = trap::install()?;
    let image = ProgramImage::open(&args.program, page_size)?;
    let info = image.exec_info();

    info!(
        program = %args.program.display(),
        segments = image.segments().len(),
        pages = image.page_count(),
        %page_size,
        "image opened"
    );

    let attached = trap.attach(FaultHandler::new(image, platform::NativeMapper::new()));
    let never = exec::start_execution(&attached, &info, &args.argv(), &LoaderConfig::from(args))?;
    Ok(never)
}

#[cfg(not(any(unix, windows)))]
fn run(_args: &RunArgs) -> Result<Infallible, LoaderError> {
    Err(pagein_loader::ExecError::Unsupported.into())
}

fn inspect(args: &InspectArgs) -> Result<(), LoaderError> {
    let page_size = platform::page_size().map_err(LoaderError::PageSize)?;
    let image = ProgramImage::open(&args.program, page_size)?;
    print_table(&args.program, &image);
    Ok(())
}

fn print_table<F>(path: &Path, image: &ProgramImage<F>) {
    let info = image.exec_info();
    println!("{}", path.display());
    println!("  entry {}  page size {}", info.entry, info.page_size);
    if let Some(phdr) = info.phdr {
        println!("  program headers at {phdr} ({} x {})", info.phnum, info.phentsize);
    }
    println!();
    println!(
        "  {:>3}  {:<18} {:<18} {:<4} {:<18} {:>6}",
        "#", "start", "end", "perm", "file", "pages"
    );
    for (index, entry) in image.segments().iter().enumerate() {
        let seg = &entry.segment;
        println!(
            "  {:>3}  {:<18} {:<18} {:<4} {:<18} {:>6}",
            index,
            seg.vaddr.to_string(),
            seg.end().to_string(),
            seg.permissions.as_str(),
            format!("{:#x}+{:#x}", seg.file_offset, seg.file_size),
            seg.page_count(info.page_size),
        );
    }
    println!();
    println!("  {} pages total", image.page_count());
}
