//! Positioned I/O over the backing image or volume
//!
//! Every read names its offset explicitly; nothing here keeps a seek
//! cursor, so one accessor can back any number of readers at once.

#[cfg(any(unix, windows))]
use std::fs::File;
use std::io;

use crate::error::{JournalError, Result};

// ============================================================================
// IoHandle: volume-wide constants
// ============================================================================

/// Volume-wide constants shared read-only by every reader on the volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoHandle {
    cluster_block_size: u32,
}

impl IoHandle {
    /// Create a handle for a volume with the given cluster block size.
    /// A zero size is rejected.
    pub fn new(cluster_block_size: u32) -> Result<Self> {
        if cluster_block_size == 0 {
            return Err(JournalError::ZeroClusterBlockSize);
        }
        Ok(Self { cluster_block_size })
    }

    /// Cluster block size in bytes
    pub fn cluster_block_size(&self) -> u32 {
        self.cluster_block_size
    }
}

// ============================================================================
// ReadAt: positioned reads
// ============================================================================

/// Positioned read over a backing image or volume.
///
/// Implementations must not rely on shared seek state. `read_at` should
/// return `buf.len()` bytes except at the end of the media; the journal
/// reader treats any shorter count as fatal.
pub trait ReadAt {
    /// Read up to `buf.len()` bytes at `offset`, returning the count read
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: ReadAt + ?Sized> ReadAt for &T {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

impl ReadAt for [u8] {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let count = buf.len().min(self.len() - start);
        buf[..count].copy_from_slice(&self[start..start + count]);
        Ok(count)
    }
}

impl ReadAt for Vec<u8> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.as_slice().read_at(offset, buf)
    }
}

#[cfg(any(unix, windows))]
impl ReadAt for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        read_file_at(self, offset, buf)
    }
}

impl ReadAt for memmap2::Mmap {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self[..].read_at(offset, buf)
    }
}

/// Fill `buf` from `file` starting at `offset`, retrying partial reads
/// until the buffer is full or the file ends
#[cfg(unix)]
fn read_file_at(file: &File, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;

    let mut total = 0;
    while total < buf.len() {
        match FileExt::read_at(file, &mut buf[total..], offset + total as u64) {
            Ok(0) => break,
            Ok(count) => total += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(total)
}

#[cfg(windows)]
fn read_file_at(file: &File, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;

    let mut total = 0;
    while total < buf.len() {
        match FileExt::seek_read(file, &mut buf[total..], offset + total as u64) {
            Ok(0) => break,
            Ok(count) => total += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(total)
}

// ============================================================================
// PartitionAccessor: volume embedded in a larger image
// ============================================================================

/// Accessor for a volume that starts partway into a full-disk image.
/// Adds the partition's base offset to every read, so journal offsets
/// stay volume-relative.
#[derive(Debug)]
pub struct PartitionAccessor<A> {
    inner: A,
    partition_offset: u64,
}

impl<A: ReadAt> PartitionAccessor<A> {
    pub fn new(inner: A, partition_offset: u64) -> Self {
        Self {
            inner,
            partition_offset,
        }
    }

    /// Base offset of the partition within the underlying image
    pub fn partition_offset(&self) -> u64 {
        self.partition_offset
    }
}

impl<A: ReadAt> ReadAt for PartitionAccessor<A> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let physical_offset = self.partition_offset.checked_add(offset).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "partition offset overflow")
        })?;
        self.inner.read_at(physical_offset, buf)
    }
}
