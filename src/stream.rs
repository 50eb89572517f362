//! Byte-stream adapter over the journal reader
//!
//! Pure glue for callers that want `std::io::Read` instead of cluster
//! blocks. All traversal logic stays in the reader; this only buffers one
//! block and maps error kinds onto `io::Error`.

use std::io::{self, Read};

use crate::error::{ErrorKind, JournalError};
use crate::journal::UpdateJournal;

/// `std::io::Read` wrapper owning one reader plus one cluster block.
///
/// Arbitrary read sizes are served from the buffered block; refills happen
/// one cluster block at a time, so the alignment underneath never shifts.
pub struct JournalStream<'a> {
    journal: UpdateJournal<'a>,
    block: Vec<u8>,
    /// Bytes of `block` that are valid
    block_len: usize,
    /// Next unread byte within `block`
    block_pos: usize,
}

impl<'a> JournalStream<'a> {
    /// Wrap a reader; allocates the one cluster-block buffer
    pub fn new(journal: UpdateJournal<'a>) -> Self {
        let block = vec![0u8; journal.cluster_block_size() as usize];
        Self {
            journal,
            block,
            block_len: 0,
            block_pos: 0,
        }
    }

    /// The wrapped reader
    pub fn journal(&self) -> &UpdateJournal<'a> {
        &self.journal
    }

    /// Unwrap, dropping any buffered bytes
    pub fn into_inner(self) -> UpdateJournal<'a> {
        self.journal
    }

    fn refill(&mut self) -> io::Result<()> {
        let count = self
            .journal
            .read_next_block(&mut self.block)
            .map_err(to_io_error)?;
        self.block_len = count;
        self.block_pos = 0;
        Ok(())
    }
}

impl Read for JournalStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.block_pos == self.block_len {
            self.refill()?;
            if self.block_len == 0 {
                return Ok(0);
            }
        }
        let count = buf.len().min(self.block_len - self.block_pos);
        buf[..count].copy_from_slice(&self.block[self.block_pos..self.block_pos + count]);
        self.block_pos += count;
        Ok(count)
    }
}

/// Map reader errors onto the `io::ErrorKind` std consumers expect
fn to_io_error(error: JournalError) -> io::Error {
    let kind = match error.kind() {
        ErrorKind::InvalidArgument => io::ErrorKind::InvalidInput,
        ErrorKind::Format => io::ErrorKind::InvalidData,
        ErrorKind::Io => match &error {
            JournalError::ShortRead { .. } => io::ErrorKind::UnexpectedEof,
            JournalError::ReadFailed { source, .. } => source.kind(),
            _ => io::ErrorKind::Other,
        },
    };
    io::Error::new(kind, error)
}
