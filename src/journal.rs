//! Sequential reader for the $UsnJrnl:$J change journal stream
//!
//! The stream arrives as a resolved extent map; the reader walks it
//! forward, zero-filling sparse extents and stitching extent tails so
//! every returned block is cluster-sized except the last one.

use std::fmt;

use log::{debug, trace, warn};

use crate::error::{JournalError, Result};
use crate::io::{IoHandle, ReadAt};
use crate::types::{
    DataAttribute, DirectoryEntry, FileReference, StreamDescriptor, JOURNAL_STREAM_NAME,
};

// ============================================================================
// Reader state
// ============================================================================

/// Traversal state. A reader starts READY; the call that consumes the
/// final byte moves it to AT_END, close() to CLOSED. No state returns to
/// READY, re-scanning takes a fresh reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Ready,
    AtEnd,
    Closed,
}

/// Mutable cursor over the extent map
#[derive(Debug, Clone, Copy)]
struct ReadCursor {
    /// Current position in the logical stream
    logical_offset: u64,
    /// Index of the extent containing logical_offset
    extent_index: usize,
    /// Position within that extent
    extent_offset: u64,
}

// ============================================================================
// UpdateJournal
// ============================================================================

/// Sequential reader over the $J data stream of $UsnJrnl.
///
/// Borrows its collaborators and never closes them; the cursor is the only
/// owned state. Returned blocks are cluster-sized except at the true end
/// of the stream, so callers can decode USN records without re-aligning.
pub struct UpdateJournal<'a> {
    io_handle: &'a IoHandle,
    accessor: &'a dyn ReadAt,
    /// Identity of the $UsnJrnl file record, diagnostics only
    mft_entry: FileReference,
    /// Directory entry that resolved the journal, diagnostics only
    directory_entry: &'a DirectoryEntry,
    stream: &'a StreamDescriptor,
    state: ReaderState,
    cursor: ReadCursor,
}

/// Reports identity and cursor state; the accessor has no useful rendering
impl fmt::Debug for UpdateJournal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateJournal")
            .field("mft_entry", &self.mft_entry)
            .field("directory_entry", &self.directory_entry)
            .field("total_size", &self.stream.total_size())
            .field("cluster_block_size", &self.io_handle.cluster_block_size())
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl<'a> UpdateJournal<'a> {
    /// Open a reader over the $J data stream.
    ///
    /// `data_attribute` must be the non-resident $DATA attribute named
    /// `$J`, resolved by the caller together with the journal's MFT entry
    /// and directory entry. The cursor starts at logical offset 0.
    pub fn open(
        io_handle: &'a IoHandle,
        accessor: &'a dyn ReadAt,
        mft_entry: FileReference,
        directory_entry: &'a DirectoryEntry,
        data_attribute: &'a DataAttribute,
    ) -> Result<Self> {
        if data_attribute.name() != JOURNAL_STREAM_NAME {
            return Err(JournalError::WrongStreamName(
                data_attribute.name().to_string(),
            ));
        }
        if !data_attribute.is_non_resident() {
            return Err(JournalError::ResidentAttribute);
        }
        let stream = data_attribute
            .stream()
            .ok_or(JournalError::MissingDataStream)?;

        debug!(
            "opening journal {} (MFT entry {}): {} bytes in {} extents, cluster block {}",
            directory_entry.name,
            mft_entry,
            stream.total_size(),
            stream.number_of_extents(),
            io_handle.cluster_block_size(),
        );
        if stream.extents().iter().any(|extent| extent.is_compressed()) {
            warn!("journal stream contains compressed extents, returning raw cluster data");
        }

        Ok(Self {
            io_handle,
            accessor,
            mft_entry,
            directory_entry,
            stream,
            state: ReaderState::Ready,
            cursor: ReadCursor {
                logical_offset: 0,
                extent_index: 0,
                extent_offset: 0,
            },
        })
    }

    /// Read the next block of the journal stream into `into`.
    ///
    /// `into` must be exactly one cluster block long. Sparse extents come
    /// back zero-filled without touching the accessor; allocated extents
    /// are read at their disk offset; extents shorter than a cluster are
    /// stitched together, so every block is full-length until the final
    /// tail of the stream. Returns 0 once the whole stream has been handed
    /// out, forever after.
    pub fn read_next_block(&mut self, into: &mut [u8]) -> Result<usize> {
        let cluster_block_size = self.io_handle.cluster_block_size() as usize;
        if into.len() != cluster_block_size {
            return Err(JournalError::BadBlockBuffer {
                expected: cluster_block_size,
                got: into.len(),
            });
        }
        match self.state {
            ReaderState::Closed => return Err(JournalError::Closed),
            ReaderState::AtEnd => return Ok(0),
            ReaderState::Ready => {}
        }

        let total_size = self.stream.total_size();
        let extents = self.stream.extents();
        let mut written = 0;

        while written < into.len() && self.cursor.logical_offset < total_size {
            if self.cursor.extent_index >= extents.len() {
                return Err(JournalError::ExtentUnderrun {
                    covered: self.cursor.logical_offset,
                    total_size,
                });
            }
            let extent = &extents[self.cursor.extent_index];

            // Step over zero-size extents
            if self.cursor.extent_offset >= extent.size {
                self.cursor.extent_index += 1;
                self.cursor.extent_offset = 0;
                continue;
            }

            // Entering an extent: its start must line up with the cursor
            if self.cursor.extent_offset == 0
                && extent.logical_offset != self.cursor.logical_offset
            {
                return Err(JournalError::MisalignedExtent {
                    index: self.cursor.extent_index,
                    expected: self.cursor.logical_offset,
                    found: extent.logical_offset,
                });
            }

            let remaining_in_extent = extent.size - self.cursor.extent_offset;
            let remaining_in_stream = total_size - self.cursor.logical_offset;
            let to_read = ((into.len() - written) as u64)
                .min(remaining_in_extent)
                .min(remaining_in_stream) as usize;
            let chunk = &mut into[written..written + to_read];

            if extent.is_sparse() {
                trace!(
                    "sparse fill of {} bytes at logical offset {}",
                    to_read,
                    self.cursor.logical_offset
                );
                chunk.fill(0);
            } else {
                if !extent.is_allocated() {
                    return Err(JournalError::UnresolvedExtent {
                        index: self.cursor.extent_index,
                        logical_offset: self.cursor.logical_offset,
                    });
                }
                let disk_offset = extent.disk_offset + self.cursor.extent_offset;
                let count = self
                    .accessor
                    .read_at(disk_offset, chunk)
                    .map_err(|source| JournalError::ReadFailed {
                        disk_offset,
                        wanted: to_read,
                        source,
                    })?;
                if count < to_read {
                    return Err(JournalError::ShortRead {
                        disk_offset,
                        wanted: to_read,
                        got: count,
                    });
                }
                trace!(
                    "read {} bytes at disk offset {} for logical offset {}",
                    to_read,
                    disk_offset,
                    self.cursor.logical_offset
                );
            }

            written += to_read;
            self.cursor.logical_offset += to_read as u64;
            self.cursor.extent_offset += to_read as u64;
            if self.cursor.extent_offset == extent.size {
                self.cursor.extent_index += 1;
                self.cursor.extent_offset = 0;
            }
        }

        if self.cursor.logical_offset == total_size {
            self.state = ReaderState::AtEnd;
        }
        Ok(written)
    }

    /// Read the next block into a fresh buffer trimmed to its real length.
    /// `None` signals end-of-stream.
    pub fn read_block(&mut self) -> Result<Option<Vec<u8>>> {
        let mut block = vec![0u8; self.io_handle.cluster_block_size() as usize];
        let count = self.read_next_block(&mut block)?;
        if count == 0 {
            return Ok(None);
        }
        block.truncate(count);
        Ok(Some(block))
    }

    /// Close the reader. Idempotent; any later read fails instead of
    /// touching the accessor again.
    pub fn close(&mut self) {
        if self.state != ReaderState::Closed {
            trace!(
                "closing journal reader at logical offset {}",
                self.cursor.logical_offset
            );
            self.state = ReaderState::Closed;
        }
    }

    /// Current logical offset; equals `total_size()` once the stream is
    /// fully handed out
    pub fn offset(&self) -> u64 {
        self.cursor.logical_offset
    }

    /// Declared size of the $J stream in bytes
    pub fn total_size(&self) -> u64 {
        self.stream.total_size()
    }

    /// Cluster block size the reader buffers with
    pub fn cluster_block_size(&self) -> u32 {
        self.io_handle.cluster_block_size()
    }

    /// Whether the final byte has been handed out
    pub fn is_exhausted(&self) -> bool {
        self.state == ReaderState::AtEnd
    }

    /// MFT entry of the $UsnJrnl file record this reader was opened from
    pub fn mft_entry(&self) -> FileReference {
        self.mft_entry
    }

    /// Directory entry that resolved the journal file
    pub fn directory_entry(&self) -> &DirectoryEntry {
        self.directory_entry
    }
}
