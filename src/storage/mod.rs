//! # Storage Module
//!
//! The paging layer of rowspool: fixed-size pages, a bounded resident set
//! with LRU swap-out, and logical byte-addressable files multiplexed over
//! the shared page space.
//!
//! ## Architecture Overview
//!
//! A [`PageManager`] owns one backing page file on disk and a bounded set of
//! resident pages in memory. Pages are created, read and mutated through the
//! manager; when the in-memory budget is exceeded, the least-recently-used
//! page is serialized to its fixed slot (`id * PAGE_SIZE`) in the backing
//! file and evicted. The manager hands out [`Page`] snapshots rather than
//! shared references, so a caller can never observe a page mid-write.
//!
//! [`PagedFile`] builds a single logical byte stream on top of pages
//! obtained lazily from a shared manager: seek/read/write across page
//! boundaries, transparent append growth, interior overwrite without
//! truncation. Many paged files can share one manager; a logical file's
//! bytes are only ever mutated through the handle that owns them.
//!
//! ## Why explicit file I/O instead of mmap
//!
//! The point of this layer is deterministic control over which pages are
//! resident: a console session caching a 10GB result must stay inside its
//! configured page budget no matter what the OS page cache does. Explicit
//! swap-in/swap-out against a plain file keeps that budget exact.
//!
//! ## Module Organization
//!
//! - `page`: the fixed-size page snapshot and its in-page cursors
//! - `lru`: the arena-backed LRU list with O(1) id lookup
//! - `pager`: the shared page manager (admission, eviction, disk spill)
//! - `paged_file`: logical files over the shared page space
//!
//! ## Thread Safety
//!
//! [`PageManager`] is `Send + Sync`; all state sits behind one interior
//! mutex, so admission, eviction and slot I/O are atomic with respect to
//! each other. [`PagedFile`] handles are `Send` and meant for one writer
//! each; any number of handles over distinct logical files may hammer the
//! same manager from different threads.

mod lru;
mod page;
mod paged_file;
mod pager;

pub use lru::{Frame, IndexedPageList};
pub use page::{Page, PageId};
pub use paged_file::PagedFile;
pub use pager::PageManager;
