//! # rowspool - Result-Set Paging Cache
//!
//! rowspool is a disk-backed, bounded-memory cache that lets a SQL console
//! materialize arbitrarily large query results (including LOB columns)
//! without holding them in heap memory, and without depending on a live
//! database cursor. Large-object handles obtained from a driver are only
//! valid while their statement is open; rowspool drains them to local disk
//! while the cursor is live and serves every later read from its own pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   ResultSetTable / CachedElementFactory      │  drains a RowCursor
//! ├──────────────────────┬───────────────────────┤
//! │     VirtualTable     │      BinaryStore      │  cells / LOB pointers
//! ├──────────────────────┴───────────────────────┤
//! │                  PagedFile                   │  logical byte streams
//! ├──────────────────────────────────────────────┤
//! │        PageManager (LRU + disk spill)        │  bounded page budget
//! ├──────────────────────────────────────────────┤
//! │             backing page file                │  id * PAGE_SIZE slots
//! └──────────────────────────────────────────────┘
//! ```
//!
//! A single writer fills a [`table::VirtualTable`] row by row while the
//! cursor is open; any number of readers then query it by row/column. Cell
//! values are either inline scalars or small [`binary::BinaryContentMeta`]
//! pointers whose bytes are re-read on demand through
//! [`binary::BinaryStore::read`].
//!
//! ## Module Overview
//!
//! - [`config`]: centralized constants (page size, in-memory page budget)
//! - [`storage`]: pages, the LRU resident set, the page manager, paged files
//! - [`binary`]: large-object storage and retrieval by pointer
//! - [`table`]: the sparse virtual table, its views and listeners
//! - [`resultset`]: the cursor-draining adapter
//!
//! ## Concurrency Model
//!
//! Plain OS threads, no async. [`storage::PageManager`] and
//! [`binary::BinaryStore`] are shared services guarded by interior mutexes;
//! callers block while a swap-out or swap-in completes. A given
//! [`storage::PagedFile`] or [`table::VirtualTable`] has exactly one writer.

pub mod binary;
pub mod config;
pub mod resultset;
pub mod storage;
pub mod table;

pub use binary::{BinaryContentMeta, BinaryReader, BinaryStore};
pub use resultset::{CachedElementFactory, ResultSetTable, RowCursor};
pub use storage::{Page, PageId, PageManager, PagedFile};
pub use table::{CellContent, ScalarValue, TableListener, VirtualElement, VirtualTable};
