//! # Pager
//!
//! The pager owns the open database file and every resident page buffer.
//! Pages are materialized on demand: the first request for a page either
//! reads it from disk (if the file already covers it) or hands out a zeroed
//! buffer for a page that has not been written yet.
//!
//! ## Residency
//!
//! A materialized page stays in memory until close. `num_pages` tracks the
//! highest allocated page number plus one, whether or not the page has ever
//! reached disk; the file only catches up when the pager flushes.
//!
//! ## Allocation
//!
//! New pages come from a monotonic counter. There is no free list: pages are
//! never released or reused, and a file can hold at most
//! [`TABLE_MAX_PAGES`] pages before allocation fails with [`PagerFull`].
//!
//! ## Failure Model
//!
//! I/O errors, a file whose length is not a whole number of pages, and page
//! indexes past the table limit are unrecoverable and surface as errors that
//! the caller is expected to treat as fatal. `PagerFull` is the one
//! allocation failure a caller may handle.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use eyre::{bail, ensure, Report, Result, WrapErr};
use tracing::{debug, trace};

use crate::config::{PAGE_SIZE, TABLE_MAX_PAGES};

/// A raw page buffer. Exactly one node lives in each page.
pub type PageBuf = [u8; PAGE_SIZE];

/// Returned by [`Pager::allocate_page`] once every page number is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerFull;

impl fmt::Display for PagerFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} pages of the database file are in use", TABLE_MAX_PAGES)
    }
}

impl std::error::Error for PagerFull {}

#[derive(Debug)]
pub struct Pager {
    file: File,
    file_length: u64,
    num_pages: u32,
    pages: Vec<Option<Box<PageBuf>>>,
}

impl Pager {
    /// Opens the database file, creating it if absent. The file length must
    /// be a whole number of pages.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .wrap_err_with(|| format!("failed to open database file '{}'", path.display()))?;

        let file_length = file
            .metadata()
            .wrap_err_with(|| format!("failed to stat database file '{}'", path.display()))?
            .len();

        ensure!(
            file_length % PAGE_SIZE as u64 == 0,
            "database file is not a whole number of pages ({} bytes): corrupt file",
            file_length
        );

        let num_pages = (file_length / PAGE_SIZE as u64) as u32;
        ensure!(
            num_pages as usize <= TABLE_MAX_PAGES,
            "database file holds {} pages, more than the table limit of {}",
            num_pages,
            TABLE_MAX_PAGES
        );

        debug!(num_pages, file_length, "database file opened");

        Ok(Self {
            file,
            file_length,
            num_pages,
            pages: std::iter::repeat_with(|| None).take(TABLE_MAX_PAGES).collect(),
        })
    }

    /// Highest allocated page number plus one.
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    #[cfg(test)]
    pub(crate) fn is_resident(&self, page_num: u32) -> bool {
        self.pages
            .get(page_num as usize)
            .is_some_and(|slot| slot.is_some())
    }

    /// Shared view of a page, materializing it first if needed.
    pub fn page(&mut self, page_num: u32) -> Result<&PageBuf> {
        self.materialize(page_num)?;
        match self.pages[page_num as usize].as_deref() {
            Some(buf) => Ok(buf),
            None => bail!("page {} not resident after materialization", page_num),
        }
    }

    /// Exclusive view of a page, materializing it first if needed.
    pub fn page_mut(&mut self, page_num: u32) -> Result<&mut PageBuf> {
        self.materialize(page_num)?;
        match self.pages[page_num as usize].as_deref_mut() {
            Some(buf) => Ok(buf),
            None => bail!("page {} not resident after materialization", page_num),
        }
    }

    fn materialize(&mut self, page_num: u32) -> Result<()> {
        ensure!(
            (page_num as usize) < TABLE_MAX_PAGES,
            "page number {} out of bounds (limit {})",
            page_num,
            TABLE_MAX_PAGES
        );

        if self.pages[page_num as usize].is_some() {
            return Ok(());
        }

        let mut buf: Box<PageBuf> = Box::new([0u8; PAGE_SIZE]);

        let mut pages_on_disk = self.file_length / PAGE_SIZE as u64;
        if self.file_length % PAGE_SIZE as u64 != 0 {
            pages_on_disk += 1;
        }

        if (page_num as u64) < pages_on_disk {
            self.file
                .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
                .wrap_err_with(|| format!("failed to seek to page {}", page_num))?;

            // A short read only happens at the trailing page of a file that
            // grew past a page boundary; the rest of the buffer stays zeroed.
            match self.file.read_exact(&mut buf[..]) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
                Err(e) => {
                    return Err(e)
                        .wrap_err_with(|| format!("failed to read page {} from disk", page_num))
                }
            }
        }

        self.pages[page_num as usize] = Some(buf);
        if page_num >= self.num_pages {
            self.num_pages = page_num + 1;
        }

        trace!(page_num, "page materialized");
        Ok(())
    }

    /// Hands out the next unallocated page number. There is no free list, so
    /// the counter only ever moves forward.
    pub fn allocate_page(&mut self) -> Result<u32> {
        if self.num_pages as usize >= TABLE_MAX_PAGES {
            return Err(Report::new(PagerFull));
        }

        let page_num = self.num_pages;
        self.num_pages += 1;
        trace!(page_num, "page allocated");
        Ok(page_num)
    }

    /// Writes one full page back to disk. The page must be resident.
    pub fn flush(&mut self, page_num: u32) -> Result<()> {
        ensure!(
            (page_num as usize) < TABLE_MAX_PAGES,
            "page number {} out of bounds (limit {})",
            page_num,
            TABLE_MAX_PAGES
        );

        let Some(buf) = self.pages[page_num as usize].as_deref() else {
            bail!("tried to flush page {} which is not resident", page_num);
        };

        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))
            .wrap_err_with(|| format!("failed to seek to page {}", page_num))?;
        self.file
            .write_all(&buf[..])
            .wrap_err_with(|| format!("failed to write page {} to disk", page_num))?;

        Ok(())
    }

    /// Flushes every resident page and syncs the file. Buffers are released
    /// when the pager is dropped.
    pub fn close(&mut self) -> Result<()> {
        for page_num in 0..self.num_pages {
            if self.pages[page_num as usize].is_some() {
                self.flush(page_num)?;
            }
        }

        self.file
            .sync_all()
            .wrap_err("failed to sync database file")?;

        self.file_length = self.num_pages as u64 * PAGE_SIZE as u64;
        debug!(num_pages = self.num_pages, "database file flushed");
        Ok(())
    }
}
