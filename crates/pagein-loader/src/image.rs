// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The program image: segment table plus backing file.
//!
//! Opening an image reads the ELF header and program header table, nothing
//! else. Segment bodies are read one page at a time by the fault handler.
//! The file handle is kept for the rest of the process.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use pagein_abi::{PageSize, Segment, Vaddr};
use pagein_elf::{ELF64_HEADER_SIZE, ElfError, ElfHeader, SegmentTable};
use tracing::debug;

use crate::error::ImageError;
use crate::page_state::PageState;

/// A segment together with its page tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSegment {
    /// The page-aligned segment descriptor.
    pub segment: Segment,
    /// Pages materialized so far.
    pub pages: PageState,
}

impl AsRef<Segment> for ImageSegment {
    fn as_ref(&self) -> &Segment {
        &self.segment
    }
}

/// What the entry trampoline needs to know about an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecInfo {
    /// Entry point.
    pub entry: Vaddr,
    /// Address of the program header table in the loaded image.
    pub phdr: Option<Vaddr>,
    /// Number of program headers.
    pub phnum: u16,
    /// Size of one program header.
    pub phentsize: u16,
    /// Page granularity the image was laid out with.
    pub page_size: PageSize,
}

/// Segments of a static executable and the file that backs them.
#[derive(Debug)]
pub struct ProgramImage<F> {
    segments: Vec<ImageSegment>,
    exec: ExecInfo,
    file: F,
}

impl ProgramImage<File> {
    /// Opens the executable at `path`.
    pub fn open(path: &Path, page_size: PageSize) -> Result<Self, ImageError> {
        let file = File::open(path).map_err(|source| ImageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, page_size)
    }
}

impl<F: Read + Seek> ProgramImage<F> {
    /// Reads the headers from `file` and keeps it as backing store.
    pub fn from_reader(mut file: F, page_size: PageSize) -> Result<Self, ImageError> {
        let mut ident = [0u8; ELF64_HEADER_SIZE];
        read_at(&mut file, 0, &mut ident)?;
        let header = ElfHeader::parse(&ident)?;

        let mut table = vec![0u8; header.phdr_table_len()];
        read_at(&mut file, header.phdr_offset(), &mut table)?;
        let table = header.segments(&table)?;

        Self::from_table(table, file, page_size)
    }
}

impl<F> ProgramImage<F> {
    /// Builds an image from an already parsed segment table.
    ///
    /// Every segment is widened down to a page boundary. Segments that end
    /// up sharing a page are rejected, since a page has one protection.
    pub fn from_table(
        table: SegmentTable,
        file: F,
        page_size: PageSize,
    ) -> Result<Self, ImageError> {
        let exec = ExecInfo {
            entry: table.entry,
            phdr: table.phdr_vaddr(),
            phnum: table.phnum,
            phentsize: table.phentsize,
            page_size,
        };

        let mut segments: Vec<ImageSegment> = Vec::with_capacity(table.segments.len());
        for (index, raw) in table.segments.iter().enumerate() {
            raw.validate()
                .map_err(|source| ImageError::Segment { index, source })?;
            let segment = raw
                .page_aligned(page_size)
                .map_err(|source| ImageError::Segment { index, source })?;

            if let Some(first) = segments
                .iter()
                .position(|other| other.segment.overlaps(&segment))
            {
                return Err(ImageError::SharedPage {
                    first,
                    second: index,
                });
            }

            debug!(index, %segment, "segment");
            segments.push(ImageSegment {
                segment,
                pages: PageState::new(),
            });
        }

        Ok(Self {
            segments,
            exec,
            file,
        })
    }

    /// Segments in program header order.
    #[must_use]
    pub fn segments(&self) -> &[ImageSegment] {
        &self.segments
    }

    /// Entry point and auxiliary vector data.
    #[must_use]
    pub const fn exec_info(&self) -> ExecInfo {
        self.exec
    }

    /// Page granularity of every page computation on this image.
    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.exec.page_size
    }

    /// Total number of pages across all segments.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| s.segment.page_count(self.exec.page_size))
            .sum()
    }

    /// Segments and backing file, borrowed separately.
    pub(crate) fn parts_mut(&mut self) -> (&mut [ImageSegment], &mut F) {
        (&mut self.segments, &mut self.file)
    }
}

fn read_at<F: Read + Seek>(file: &mut F, offset: u64, buf: &mut [u8]) -> Result<(), ImageError> {
    file.seek(SeekFrom::Start(offset)).map_err(ImageError::Read)?;
    file.read_exact(buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ImageError::Elf(ElfError::TooSmall)
        } else {
            ImageError::Read(err)
        }
    })
}
