//! usnjrnl - NTFS update journal ($UsnJrnl:$J) stream reader
//!
//! Streams the change journal's $J data stream across its resolved extents
//! and hands back cluster-aligned byte blocks ready for USN record
//! decoding. Works against disk images, raw volume files, and memory maps.
//!
//! # Features
//!
//! - **Extent stitching**: returned blocks are cluster-sized except the
//!   final tail, even when extents fragment mid-cluster
//! - **Sparse awareness**: sparse extents come back zero-filled with no I/O
//! - **Positioned accessors**: files, byte slices, memory maps and
//!   partition-offset wrappers, all shareable across readers
//! - **Byte-stream adapter**: `std::io::Read` on top of the block reader
//!
//! # Example
//!
//! ```no_run
//! use usnjrnl::{
//!     DataAttribute, DirectoryEntry, Extent, FileReference, IoHandle, StreamDescriptor,
//!     UpdateJournal, JOURNAL_STREAM_NAME, UPDATE_JOURNAL_NAME,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let image = std::fs::File::open("ntfs.img")?;
//!     let io_handle = IoHandle::new(4096)?;
//!
//!     // Resolved externally by an MFT/attribute walker
//!     let descriptor = StreamDescriptor::new(
//!         81920,
//!         vec![
//!             Extent::sparse(0, 40960),
//!             Extent::allocated(40960, 0x1F4000, 40960),
//!         ],
//!     );
//!     let attribute = DataAttribute::new(JOURNAL_STREAM_NAME, true, Some(descriptor));
//!     let entry = DirectoryEntry::new(UPDATE_JOURNAL_NAME, FileReference(0x2000000000823));
//!
//!     let mut journal =
//!         UpdateJournal::open(&io_handle, &image, entry.file_reference, &entry, &attribute)?;
//!     while let Some(block) = journal.read_block()? {
//!         // hand the cluster block to a USN record decoder
//!         println!("block of {} bytes, cursor now at {}", block.len(), journal.offset());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod io;
pub mod journal;
pub mod stream;
pub mod types;

// Re-export the reader surface
pub use error::{ErrorKind, JournalError, Result};
pub use io::{IoHandle, PartitionAccessor, ReadAt};
pub use journal::UpdateJournal;
pub use stream::JournalStream;

// Re-export the resolved stream shapes callers hand in
pub use types::{
    extent_flags, DataAttribute, DirectoryEntry, Extent, FileReference, StreamDescriptor,
    JOURNAL_STREAM_NAME, UPDATE_JOURNAL_NAME,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
