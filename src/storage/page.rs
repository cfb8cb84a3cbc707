//! Fixed-size page snapshots.
//!
//! A [`Page`] is an owned copy of one storage-layer page: a stable physical
//! id plus `PAGE_SIZE` bytes of content. The authoritative copy of a page
//! lives inside the [`super::PageManager`] (resident frame or disk slot);
//! callers receive snapshots from `get`/`create` and push edits back with
//! `modify`. In-page read/write cursors mirror stream semantics: `read`
//! returns `0` once the cursor reaches the end of the page.

use eyre::{ensure, Result};

use crate::config::PAGE_SIZE;

/// Physical page identifier, allocated sequentially by the page manager.
pub type PageId = u32;

pub struct Page {
    id: PageId,
    content: Box<[u8; PAGE_SIZE]>,
    read_pos: usize,
    write_pos: usize,
}

impl Page {
    pub(crate) fn empty(id: PageId) -> Self {
        Self::with_content(id, Box::new([0u8; PAGE_SIZE]))
    }

    pub(crate) fn with_content(id: PageId, content: Box<[u8; PAGE_SIZE]>) -> Self {
        Self {
            id,
            content,
            read_pos: 0,
            write_pos: 0,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn content(&self) -> &[u8; PAGE_SIZE] {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.content
    }

    /// Positions the read cursor, clamped to the page size.
    pub fn seek_for_read(&mut self, position: usize) {
        self.read_pos = position.min(PAGE_SIZE);
    }

    /// Positions the write cursor, clamped to the page size.
    pub fn seek_for_write(&mut self, position: usize) {
        self.write_pos = position.min(PAGE_SIZE);
    }

    /// Copies `buffer` into the page at the write cursor.
    ///
    /// Fails if the remaining capacity from the cursor is smaller than the
    /// buffer; a page never grows.
    pub fn write(&mut self, buffer: &[u8]) -> Result<()> {
        let capacity = PAGE_SIZE - self.write_pos;
        ensure!(
            buffer.len() <= capacity,
            "page {} capacity {} is smaller than write of {} bytes",
            self.id,
            capacity,
            buffer.len()
        );
        self.content[self.write_pos..self.write_pos + buffer.len()].copy_from_slice(buffer);
        self.write_pos += buffer.len();
        Ok(())
    }

    /// Copies from the read cursor into `buffer`, returning the number of
    /// bytes copied; `0` means the cursor is at the end of the page.
    pub fn read(&mut self, buffer: &mut [u8]) -> usize {
        let remaining = PAGE_SIZE - self.read_pos;
        let take = buffer.len().min(remaining);
        buffer[..take].copy_from_slice(&self.content[self.read_pos..self.read_pos + take]);
        self.read_pos += take;
        take
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("read_pos", &self.read_pos)
            .field("write_pos", &self.write_pos)
            .finish()
    }
}
