//! # Paging Constants
//!
//! All sizing constants for the storage layer, grouped by the component
//! they configure.
//!
//! ```text
//! PAGE_SIZE (32768 bytes)
//!       │
//!       ├─> backing-file slot addressing: page id * PAGE_SIZE
//!       │
//!       └─> MAX_DATA_FILE_SIZE (multiple of PAGE_SIZE so a binary data
//!           file always ends on a page boundary)
//!
//! DEFAULT_MAX_PAGES_IN_MEMORY (512)
//!       │
//!       └─> default resident-set budget: 512 * 32KB = 16MB per manager
//! ```

/// Size of one storage-layer page in bytes (32KB).
/// The unit of disk/memory transfer and of backing-file addressing.
pub const PAGE_SIZE: usize = 32 * 1024;

/// Default number of pages a `PageManager` keeps resident in memory.
/// Beyond this budget the least-recently-used page is swapped out to disk.
pub const DEFAULT_MAX_PAGES_IN_MEMORY: usize = 512;

/// Maximum size of one binary data file (64MB).
///
/// The binary store packs many payloads into a shared logical file to avoid
/// producing one file per LOB; once the current file reaches this cap the
/// writer rolls over to a new one.
pub const MAX_DATA_FILE_SIZE: u64 = 64 * 1024 * 1024;

const _: () = assert!(PAGE_SIZE.is_power_of_two(), "PAGE_SIZE must be a power of two");

const _: () = assert!(
    MAX_DATA_FILE_SIZE % PAGE_SIZE as u64 == 0,
    "MAX_DATA_FILE_SIZE must be a multiple of PAGE_SIZE"
);
