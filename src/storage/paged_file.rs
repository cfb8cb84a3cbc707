//! # Logical Files over the Page Space
//!
//! A [`PagedFile`] presents one logical byte-addressable stream on top of
//! pages obtained lazily from a shared [`PageManager`]. Writing past the
//! current end transparently allocates new physical pages; reads and writes
//! crossing page boundaries are stitched together; an interior write
//! overwrites in place without truncating what follows.
//!
//! ## Addressing
//!
//! A logical position maps to `(logical page = pos / PAGE_SIZE, offset =
//! pos % PAGE_SIZE)`; the logical page indexes into the file's page table,
//! which holds physical page ids handed out by the manager. The page table
//! and the file length live in the manager's registry and are shared by
//! every handle opened under the same name, so reopening a previously
//! written name on the same manager reproduces identical content - there is
//! no side-car metadata file.
//!
//! ## Handles and Sharing
//!
//! Each handle owns its read and write cursors. Distinct logical files over
//! one manager never touch each other's pages (every physical page belongs
//! to exactly one file), so interleaved writers to different files are
//! safe. A single file's bytes are only mutated through the handle that
//! owns it; concurrent read-only handles over one file are fine.

use std::sync::Arc;

use eyre::{ensure, Result};
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::config::PAGE_SIZE;

use super::page::PageId;
use super::pager::{LogicalFile, PageManager};

pub struct PagedFile {
    name: String,
    manager: Arc<PageManager>,
    meta: Arc<Mutex<LogicalFile>>,
    read_pos: u64,
    write_pos: u64,
}

impl PagedFile {
    /// Opens the named logical file on the given manager, creating it empty
    /// if it has never been written. The write cursor starts at the end of
    /// the file, the read cursor at the beginning.
    pub fn open(name: impl Into<String>, manager: Arc<PageManager>) -> Result<Self> {
        let name = name.into();
        ensure!(!manager.is_closed(), "page manager is closed");
        let meta = manager.logical_file(&name);
        let write_pos = meta.lock().len;
        Ok(Self {
            name,
            manager,
            meta,
            read_pos: 0,
            write_pos,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The furthest byte offset ever written, independent of the cursors.
    pub fn len(&self) -> u64 {
        self.meta.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positions the read cursor, clamped to the current length.
    pub fn seek_for_read(&mut self, position: u64) {
        self.read_pos = position.min(self.len());
    }

    /// Positions the write cursor, clamped to the current length.
    pub fn seek_for_write(&mut self, position: u64) {
        self.write_pos = position.min(self.len());
    }

    /// Writes `buffer` at the write cursor, allocating pages as needed.
    pub fn write(&mut self, buffer: &[u8]) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        let mut meta = self.meta.lock();
        let pos = self.write_pos;
        let first = (pos / PAGE_SIZE as u64) as usize;
        let last = ((pos + buffer.len() as u64 - 1) / PAGE_SIZE as u64) as usize;

        if meta.pages.len() <= last {
            let missing = last + 1 - meta.pages.len();
            let created = self.manager.create_many(missing)?;
            meta.pages.extend(created.iter().map(|page| page.id()));
        }

        let affected: SmallVec<[PageId; 4]> = meta.pages[first..=last].iter().copied().collect();
        let mut consumed = 0usize;
        for (i, &id) in affected.iter().enumerate() {
            let in_page = if i == 0 {
                (pos % PAGE_SIZE as u64) as usize
            } else {
                0
            };
            let take = (PAGE_SIZE - in_page).min(buffer.len() - consumed);
            let mut page = self.manager.get(id)?;
            page.content_mut()[in_page..in_page + take]
                .copy_from_slice(&buffer[consumed..consumed + take]);
            self.manager.modify(&page)?;
            consumed += take;
        }

        self.write_pos += buffer.len() as u64;
        if self.write_pos > meta.len {
            meta.len = self.write_pos;
        }
        Ok(())
    }

    /// Reads at the read cursor into `buffer`, returning the number of
    /// bytes read; `0` means the cursor is at the logical end of file.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let meta = self.meta.lock();
        let available = meta.len.saturating_sub(self.read_pos);
        let want = (buffer.len() as u64).min(available) as usize;
        if want == 0 {
            return Ok(0);
        }
        let pos = self.read_pos;
        let first = (pos / PAGE_SIZE as u64) as usize;
        let last = ((pos + want as u64 - 1) / PAGE_SIZE as u64) as usize;

        let affected: SmallVec<[PageId; 4]> = meta.pages[first..=last].iter().copied().collect();
        let mut filled = 0usize;
        for (i, &id) in affected.iter().enumerate() {
            let in_page = if i == 0 {
                (pos % PAGE_SIZE as u64) as usize
            } else {
                0
            };
            let take = (PAGE_SIZE - in_page).min(want - filled);
            let mut page = self.manager.get(id)?;
            page.seek_for_read(in_page);
            let copied = page.read(&mut buffer[filled..filled + take]);
            debug_assert_eq!(copied, take);
            filled += take;
        }

        self.read_pos += want as u64;
        Ok(want)
    }

    /// Flushes the manager so this file's bytes are all recoverable from
    /// the backing page file. Dropping the handle without closing is fine;
    /// writes go through the manager as they happen.
    pub fn close(self) -> Result<()> {
        self.manager.flush()
    }
}

impl std::fmt::Debug for PagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedFile")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("read_pos", &self.read_pos)
            .field("write_pos", &self.write_pos)
            .finish()
    }
}
