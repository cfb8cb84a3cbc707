//! # Binary Content Store
//!
//! Out-of-line storage for oversized cell values. Driver-issued LOB handles
//! (BLOB/CLOB/binary streams) are only valid while their statement is open;
//! this store drains them to local disk the moment they are seen and hands
//! back a small, freely copyable [`BinaryContentMeta`] pointer instead of
//! the payload. Any time later, long after the statement is closed and the
//! connection reused, [`BinaryStore::read`] turns the pointer back into a
//! fresh, independent byte stream.
//!
//! ## Data File Packing
//!
//! Payloads are appended to a shared logical data file over the store's
//! private [`PageManager`]; one file per payload would litter the working
//! directory with small files, so the writer packs payloads until the
//! current file reaches the size cap (64MB by default) and then rolls over
//! to a freshly named file. A pointer is `(file id, offset, length)` -
//! everything needed to relocate exactly that byte range.
//!
//! ```text
//! write(stream A) ──┐
//! write(stream B) ──┼──> blob_000000.data: [ A ][ B ][ C ]...  (<= cap)
//! write(stream C) ──┘                       ▲
//!                                           └ meta = (blob_000000, off, len)
//! ```
//!
//! ## Read Semantics
//!
//! `read` is non-destructive and repeatable: every call opens its own
//! cursor over the page space, so concurrent readers of one pointer never
//! interfere. A pointer whose range falls outside the named file is
//! reported as a not-found error rather than truncated.

use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use eyre::{ensure, Result, WrapErr};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::{DEFAULT_MAX_PAGES_IN_MEMORY, MAX_DATA_FILE_SIZE, PAGE_SIZE};
use crate::storage::{PageManager, PagedFile};

/// Pointer to one stored payload: which data file, where in it, how long.
///
/// Holding a pointer keeps no buffer resident; it stays valid for the life
/// of the store that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryContentMeta {
    file_id: String,
    offset: u64,
    length: u64,
}

impl BinaryContentMeta {
    pub fn new(file_id: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            file_id: file_id.into(),
            offset,
            length,
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }
}

pub struct BinaryStore {
    manager: Arc<PageManager>,
    max_file_size: u64,
    writer: Mutex<Writer>,
}

struct Writer {
    current: PagedFile,
    seq: u64,
}

fn data_file_name(seq: u64) -> String {
    format!("blob_{seq:06}.data")
}

impl BinaryStore {
    /// Opens a store rooted at `working_dir` with default limits.
    pub fn new(working_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_limits(working_dir, DEFAULT_MAX_PAGES_IN_MEMORY, MAX_DATA_FILE_SIZE)
    }

    /// Opens a store with an explicit resident-page budget and data-file
    /// size cap. The working directory must exist and be a directory.
    pub fn with_limits(
        working_dir: impl AsRef<Path>,
        max_pages_in_memory: usize,
        max_file_size: u64,
    ) -> Result<Self> {
        let dir = working_dir.as_ref();
        ensure!(
            dir.exists(),
            "working directory {} does not exist",
            dir.display()
        );
        ensure!(dir.is_dir(), "{} is not a directory", dir.display());
        ensure!(max_file_size > 0, "data file size cap must be positive");

        let manager = Arc::new(PageManager::with_capacity(dir, max_pages_in_memory)?);
        let current = PagedFile::open(data_file_name(0), Arc::clone(&manager))?;
        Ok(Self {
            manager,
            max_file_size,
            writer: Mutex::new(Writer { current, seq: 0 }),
        })
    }

    /// Streams `source` to disk in full and returns the pointer to it.
    ///
    /// The source is read to exhaustion during this call - for a live
    /// cursor stream that is the only moment the bytes are reachable.
    pub fn write<R: Read>(&self, source: &mut R) -> Result<BinaryContentMeta> {
        let mut writer = self.writer.lock();
        if writer.current.len() >= self.max_file_size {
            writer.seq += 1;
            let name = data_file_name(writer.seq);
            debug!(file = %name, "binary data file rolled over");
            writer.current = PagedFile::open(name, Arc::clone(&self.manager))?;
        }

        let offset = writer.current.len();
        writer.current.seek_for_write(offset);
        let mut chunk = vec![0u8; PAGE_SIZE];
        let mut length = 0u64;
        loop {
            let n = source
                .read(&mut chunk)
                .wrap_err("failed to read binary content from source")?;
            if n == 0 {
                break;
            }
            writer.current.write(&chunk[..n])?;
            length += n as u64;
        }
        Ok(BinaryContentMeta::new(writer.current.name(), offset, length))
    }

    /// Opens a fresh stream over the pointed-to bytes. Callable any number
    /// of times, from any thread, independent of the writer's lifetime.
    pub fn read(&self, meta: &BinaryContentMeta) -> Result<BinaryReader> {
        let mut file = PagedFile::open(meta.file_id(), Arc::clone(&self.manager))?;
        let end = meta
            .offset()
            .checked_add(meta.length())
            .ok_or_else(|| eyre::eyre!("binary content range overflows"))?;
        ensure!(
            end <= file.len(),
            "binary content {}@{}+{} does not exist",
            meta.file_id(),
            meta.offset(),
            meta.length()
        );
        file.seek_for_read(meta.offset());
        Ok(BinaryReader {
            file,
            remaining: meta.length(),
        })
    }

    /// Closes the underlying page manager. Terminal; reads and writes fail
    /// afterwards.
    pub fn close(&self) -> Result<()> {
        self.manager.close()
    }
}

impl std::fmt::Debug for BinaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let writer = self.writer.lock();
        f.debug_struct("BinaryStore")
            .field("current_file", &writer.current.name())
            .field("max_file_size", &self.max_file_size)
            .finish()
    }
}

/// Bounded read cursor over one stored payload.
#[derive(Debug)]
pub struct BinaryReader {
    file: PagedFile,
    remaining: u64,
}

impl BinaryReader {
    /// Bytes left before this cursor reaches the end of the payload.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Read for BinaryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let cap = (buf.len() as u64).min(self.remaining) as usize;
        let n = self
            .file
            .read(&mut buf[..cap])
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e:#}")))?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn meta_is_a_plain_value() {
        let meta = BinaryContentMeta::new("blob_000000.data", 128, 4096);
        let copy = meta.clone();
        assert_eq!(meta, copy);
        assert_eq!(copy.file_id(), "blob_000000.data");
        assert_eq!(copy.offset(), 128);
        assert_eq!(copy.length(), 4096);
    }

    #[test]
    fn write_then_read_returns_identical_bytes() {
        let dir = tempdir().unwrap();
        let store = BinaryStore::new(dir.path()).unwrap();

        let payload = b"some binary payload".to_vec();
        let meta = store.write(&mut payload.as_slice()).unwrap();
        assert_eq!(meta.length(), payload.len() as u64);

        let mut out = Vec::new();
        store.read(&meta).unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn consecutive_writes_pack_into_one_file() {
        let dir = tempdir().unwrap();
        let store = BinaryStore::new(dir.path()).unwrap();

        let first = store.write(&mut &b"aaaa"[..]).unwrap();
        let second = store.write(&mut &b"bbbbbb"[..]).unwrap();
        assert_eq!(first.file_id(), second.file_id());
        assert_eq!(second.offset(), first.offset() + first.length());
    }

    #[test]
    fn out_of_range_pointer_is_reported() {
        let dir = tempdir().unwrap();
        let store = BinaryStore::new(dir.path()).unwrap();
        store.write(&mut &b"short"[..]).unwrap();

        let bogus = BinaryContentMeta::new("blob_000000.data", 3, 1024);
        let err = store.read(&bogus).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn empty_payload_roundtrips() {
        let dir = tempdir().unwrap();
        let store = BinaryStore::new(dir.path()).unwrap();
        let meta = store.write(&mut &b""[..]).unwrap();
        assert_eq!(meta.length(), 0);

        let mut out = Vec::new();
        store.read(&meta).unwrap().read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
