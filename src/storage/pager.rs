//! # Page Manager with LRU Disk Spill
//!
//! The shared paging service. A [`PageManager`] owns one backing page file
//! and a bounded set of resident pages; pages beyond the budget are swapped
//! out to their fixed file slot (`id * PAGE_SIZE`) in least-recently-used
//! order and swapped back in on demand.
//!
//! ## Snapshot Contract
//!
//! The manager never hands out references into its resident frames.
//! `create` and `get` return owned [`Page`] snapshots; `modify` copies the
//! caller's bytes back into the authoritative copy (the resident frame, or
//! the disk slot directly when the page has been evicted). A `get` after a
//! `modify` always observes the latest write, whether or not the page was
//! swapped out in between. Because every operation runs under the interior
//! mutex, a reader can never observe a page mid-write from another thread
//! and the resident set can never double-admit an id.
//!
//! ## Eviction
//!
//! ```text
//! create/get (miss)                admission
//!       │                              │
//!       ▼                              ▼
//! [resident full?] ──yes──> pop LRU tail ──dirty──> write slot to disk
//!       │                                          (clean frames are
//!       no                                          dropped silently)
//!       ▼
//! push frame to MRU head
//! ```
//!
//! Freshly created frames are born dirty so that their first eviction
//! always persists them; frames read back from disk are clean until the
//! next `modify`, so re-evicting an untouched page costs no I/O.
//!
//! ## Failure Semantics
//!
//! Construction validates the working directory eagerly (missing path and
//! non-directory are distinct errors). Operations on a closed manager fail
//! with a state error; `get`/`modify` of an unallocated id fail with a
//! not-found error. Disk failures propagate to the caller; there is no
//! retry and no background error channel.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use eyre::{ensure, Result, WrapErr};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::{DEFAULT_MAX_PAGES_IN_MEMORY, PAGE_SIZE};

use super::lru::{Frame, IndexedPageList};
use super::page::{Page, PageId};

/// Distinguishes backing files of managers living in the same directory.
static FILE_SEQ: AtomicU32 = AtomicU32::new(0);

pub struct PageManager {
    file_path: PathBuf,
    max_pages_in_memory: usize,
    state: Mutex<PagerState>,
    files: Mutex<HashMap<String, Arc<Mutex<LogicalFile>>>>,
}

struct PagerState {
    resident: IndexedPageList,
    backing: File,
    next_page_id: PageId,
    closed: bool,
}

/// Metadata of one named logical file multiplexed over the page space:
/// logical page index -> physical page id, plus the furthest byte written.
/// Shared by every `PagedFile` handle opened under the same name.
pub(crate) struct LogicalFile {
    pub(crate) pages: Vec<PageId>,
    pub(crate) len: u64,
}

impl PageManager {
    /// Opens a manager with the default resident budget.
    pub fn new(working_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_capacity(working_dir, DEFAULT_MAX_PAGES_IN_MEMORY)
    }

    /// Opens a manager keeping at most `max_pages_in_memory` pages resident.
    ///
    /// The working directory must already exist; the backing page file is
    /// created inside it with a generated unique name.
    pub fn with_capacity(working_dir: impl AsRef<Path>, max_pages_in_memory: usize) -> Result<Self> {
        let dir = working_dir.as_ref();
        ensure!(max_pages_in_memory > 0, "page budget must be positive");
        ensure!(
            dir.exists(),
            "working directory {} does not exist",
            dir.display()
        );
        ensure!(dir.is_dir(), "{} is not a directory", dir.display());

        let file_path = dir.join(format!(
            "pages_{:08x}_{:04x}.data",
            std::process::id(),
            FILE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let backing = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&file_path)
            .wrap_err_with(|| format!("failed to create page file {}", file_path.display()))?;
        debug!(path = %file_path.display(), budget = max_pages_in_memory, "page file created");

        Ok(Self {
            file_path,
            max_pages_in_memory,
            state: Mutex::new(PagerState {
                resident: IndexedPageList::new(),
                backing,
                next_page_id: 0,
                closed: false,
            }),
            files: Mutex::new(HashMap::new()),
        })
    }

    /// Allocates one zeroed page and admits it most-recently-used.
    pub fn create(&self) -> Result<Page> {
        let mut state = self.state.lock();
        check_open(&state)?;
        create_locked(&mut state, self.max_pages_in_memory)
    }

    /// Allocates `count` zeroed pages with consecutive ids.
    pub fn create_many(&self, count: usize) -> Result<Vec<Page>> {
        ensure!(count > 0, "page count must be positive");
        let mut state = self.state.lock();
        check_open(&state)?;
        let mut pages = Vec::with_capacity(count);
        for _ in 0..count {
            pages.push(create_locked(&mut state, self.max_pages_in_memory)?);
        }
        Ok(pages)
    }

    /// Returns a snapshot of the page, promoting it to most-recently-used.
    /// Swaps the page in from disk when it is not resident.
    pub fn get(&self, id: PageId) -> Result<Page> {
        let mut state = self.state.lock();
        check_open(&state)?;
        get_locked(&mut state, self.max_pages_in_memory, id)
    }

    /// Snapshot of several pages, in request order.
    pub fn get_many(&self, ids: &[PageId]) -> Result<Vec<Page>> {
        let mut state = self.state.lock();
        check_open(&state)?;
        let mut pages = Vec::with_capacity(ids.len());
        for &id in ids {
            pages.push(get_locked(&mut state, self.max_pages_in_memory, id)?);
        }
        Ok(pages)
    }

    /// Copies the caller's page content back into the authoritative copy:
    /// into the resident frame (marking it dirty) when the page is in
    /// memory, directly into the page's file slot otherwise.
    pub fn modify(&self, page: &Page) -> Result<()> {
        let mut state = self.state.lock();
        check_open(&state)?;
        modify_locked(&mut state, page)
    }

    pub fn modify_many(&self, pages: &[Page]) -> Result<()> {
        let mut state = self.state.lock();
        check_open(&state)?;
        for page in pages {
            modify_locked(&mut state, page)?;
        }
        Ok(())
    }

    /// Writes every dirty resident frame to its file slot.
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        check_open(&state)?;
        flush_locked(&mut state)
    }

    /// Flushes and shuts the manager down. Idempotent; every subsequent
    /// operation fails with a state error.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        flush_locked(&mut state)?;
        state.resident.clear();
        state.closed = true;
        info!(path = %self.file_path.display(), "page manager closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of pages currently resident in memory.
    pub fn resident_count(&self) -> usize {
        self.state.lock().resident.len()
    }

    pub fn max_pages_in_memory(&self) -> usize {
        self.max_pages_in_memory
    }

    /// The shared metadata of the named logical file, created empty on
    /// first use. Content bytes live in the page file; this registry only
    /// carries the logical-to-physical page mapping and the length.
    pub(crate) fn logical_file(&self, name: &str) -> Arc<Mutex<LogicalFile>> {
        let mut files = self.files.lock();
        let entry = files.entry(name.to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(LogicalFile {
                pages: Vec::new(),
                len: 0,
            }))
        });
        Arc::clone(entry)
    }
}

impl Drop for PageManager {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for PageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PageManager")
            .field("file", &self.file_path)
            .field("max_pages_in_memory", &self.max_pages_in_memory)
            .field("resident", &state.resident.len())
            .field("allocated", &state.next_page_id)
            .field("closed", &state.closed)
            .finish()
    }
}

fn check_open(state: &PagerState) -> Result<()> {
    ensure!(!state.closed, "page manager is closed");
    Ok(())
}

fn create_locked(state: &mut PagerState, budget: usize) -> Result<Page> {
    let id = state.next_page_id;
    state.next_page_id += 1;
    let frame = Frame {
        content: Box::new([0u8; PAGE_SIZE]),
        dirty: true,
    };
    admit(state, budget, id, frame)?;
    Ok(Page::empty(id))
}

fn get_locked(state: &mut PagerState, budget: usize, id: PageId) -> Result<Page> {
    ensure!(id < state.next_page_id, "page {id} does not exist");
    if state.resident.contains(id) {
        state.resident.touch(id);
        let frame = state.resident.get(id).expect("touched page is resident");
        return Ok(Page::with_content(id, frame.content.clone()));
    }
    let content = read_slot(&mut state.backing, id)?;
    debug!(page = id, "page swapped in");
    let page = Page::with_content(id, content.clone());
    admit(
        state,
        budget,
        id,
        Frame {
            content,
            dirty: false,
        },
    )?;
    Ok(page)
}

fn modify_locked(state: &mut PagerState, page: &Page) -> Result<()> {
    let id = page.id();
    ensure!(id < state.next_page_id, "page {id} does not exist");
    if let Some(frame) = state.resident.get_mut(id) {
        frame.content.copy_from_slice(page.content());
        frame.dirty = true;
        state.resident.touch(id);
    } else {
        write_slot(&mut state.backing, id, page.content())?;
    }
    Ok(())
}

fn flush_locked(state: &mut PagerState) -> Result<()> {
    let PagerState {
        resident, backing, ..
    } = state;
    let dirty: Vec<PageId> = resident
        .iter()
        .filter(|(_, frame)| frame.dirty)
        .map(|(id, _)| id)
        .collect();
    for id in dirty {
        let frame = resident.get_mut(id).expect("dirty page is resident");
        write_slot(backing, id, &frame.content)?;
        frame.dirty = false;
    }
    Ok(())
}

/// Admits a frame as most-recently-used, swapping out the LRU tail first
/// when the resident budget is full.
fn admit(state: &mut PagerState, budget: usize, id: PageId, frame: Frame) -> Result<()> {
    if state.resident.len() >= budget {
        if let Some((victim, victim_frame)) = state.resident.pop_back() {
            if victim_frame.dirty {
                write_slot(&mut state.backing, victim, &victim_frame.content)?;
            }
            debug!(page = victim, dirty = victim_frame.dirty, "page swapped out");
        }
    }
    let admitted = state.resident.push_front(id, frame);
    debug_assert!(admitted, "page {id} admitted twice");
    Ok(())
}

fn slot_offset(id: PageId) -> u64 {
    id as u64 * PAGE_SIZE as u64
}

fn write_slot(backing: &mut File, id: PageId, content: &[u8; PAGE_SIZE]) -> Result<()> {
    backing.seek(SeekFrom::Start(slot_offset(id)))?;
    backing
        .write_all(content)
        .wrap_err_with(|| format!("failed to write page {id} to disk"))?;
    Ok(())
}

fn read_slot(backing: &mut File, id: PageId) -> Result<Box<[u8; PAGE_SIZE]>> {
    let mut content = Box::new([0u8; PAGE_SIZE]);
    backing.seek(SeekFrom::Start(slot_offset(id)))?;
    backing
        .read_exact(&mut content[..])
        .wrap_err_with(|| format!("failed to read page {id} from disk"))?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_get_roundtrip() {
        let dir = tempdir().unwrap();
        let manager = PageManager::with_capacity(dir.path(), 4).unwrap();

        let page = manager.create().unwrap();
        let read_back = manager.get(page.id()).unwrap();
        assert_eq!(read_back.id(), page.id());
        assert_eq!(read_back.content(), page.content());
    }

    #[test]
    fn test_ids_are_sequential() {
        let dir = tempdir().unwrap();
        let manager = PageManager::with_capacity(dir.path(), 4).unwrap();

        let pages = manager.create_many(3).unwrap();
        let ids: Vec<PageId> = pages.iter().map(Page::id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_get_unknown_page_fails() {
        let dir = tempdir().unwrap();
        let manager = PageManager::with_capacity(dir.path(), 4).unwrap();
        manager.create_many(2).unwrap();

        let err = manager.get(16).unwrap_err();
        assert!(err.to_string().contains("page 16 does not exist"));
    }

    #[test]
    fn test_missing_working_directory_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = PageManager::new(&missing).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_file_as_working_directory_fails() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("plain_file");
        std::fs::write(&file_path, b"x").unwrap();
        let err = PageManager::new(&file_path).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_zero_budget_fails() {
        let dir = tempdir().unwrap();
        let err = PageManager::with_capacity(dir.path(), 0).unwrap_err();
        assert!(err.to_string().contains("page budget must be positive"));
    }

    #[test]
    fn test_closed_manager_rejects_operations() {
        let dir = tempdir().unwrap();
        let manager = PageManager::with_capacity(dir.path(), 4).unwrap();
        let page = manager.create().unwrap();
        manager.close().unwrap();
        manager.close().unwrap();

        let err = manager.get(page.id()).unwrap_err();
        assert!(err.to_string().contains("page manager is closed"));
        assert!(manager.create().is_err());
        assert!(manager.modify(&page).is_err());
    }

    #[test]
    fn test_resident_count_respects_budget() {
        let dir = tempdir().unwrap();
        let manager = PageManager::with_capacity(dir.path(), 5).unwrap();
        manager.create_many(13).unwrap();
        assert_eq!(manager.resident_count(), 5);
    }
}
