//! Resolved NTFS stream shapes consumed by the journal reader
//!
//! Nothing here parses on-disk bytes. The attribute layer that walks the
//! MFT hands these over already resolved; the reader only traverses them.

use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// File name of the change journal inside \$Extend
pub const UPDATE_JOURNAL_NAME: &str = "$UsnJrnl";

/// Name of the $DATA stream holding the journal records
pub const JOURNAL_STREAM_NAME: &str = "$J";

/// Extent flags
pub mod extent_flags {
    /// Extent is backed by clusters on disk
    pub const ALLOCATED: u32 = 0x00000001;
    /// Extent is a sparse hole: logically zero, no physical storage
    pub const SPARSE: u32 = 0x00000002;
    /// Extent belongs to a compression unit
    pub const COMPRESSED: u32 = 0x00000004;
}

// ============================================================================
// FileReference
// ============================================================================

/// 8-byte NTFS file reference: 48-bit MFT record number plus 16-bit
/// sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileReference(pub u64);

impl FileReference {
    /// MFT record number (lower 48 bits)
    pub fn record_number(&self) -> u64 {
        self.0 & 0x0000_FFFF_FFFF_FFFF
    }

    /// Sequence number (upper 16 bits), incremented each time the record
    /// is reused
    pub fn sequence_number(&self) -> u16 {
        (self.0 >> 48) as u16
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.record_number(), self.sequence_number())
    }
}

// ============================================================================
// Extent
// ============================================================================

/// One contiguous logical range of a data stream.
///
/// `disk_offset` is meaningful only when the ALLOCATED flag is set; a
/// sparse extent has no physical storage behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// Offset of this extent within the logical stream
    pub logical_offset: u64,
    /// Length in bytes
    pub size: u64,
    /// Volume-relative byte offset of the backing clusters
    pub disk_offset: u64,
    /// Combination of `extent_flags` bits
    pub flags: u32,
}

impl Extent {
    /// Allocated extent backed by clusters at `disk_offset`
    pub fn allocated(logical_offset: u64, disk_offset: u64, size: u64) -> Self {
        Self {
            logical_offset,
            size,
            disk_offset,
            flags: extent_flags::ALLOCATED,
        }
    }

    /// Sparse extent: `size` logical zero bytes without physical storage
    pub fn sparse(logical_offset: u64, size: u64) -> Self {
        Self {
            logical_offset,
            size,
            disk_offset: 0,
            flags: extent_flags::SPARSE,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.flags & extent_flags::ALLOCATED != 0
    }

    pub fn is_sparse(&self) -> bool {
        self.flags & extent_flags::SPARSE != 0
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & extent_flags::COMPRESSED != 0
    }

    /// Logical offset one past the last byte of this extent
    pub fn end_offset(&self) -> u64 {
        self.logical_offset + self.size
    }
}

// ============================================================================
// StreamDescriptor
// ============================================================================

/// Resolved extent map of a data stream.
///
/// Extents are expected ordered by ascending logical offset, covering
/// `[0, total_size)` without gaps; a sparse range is an explicit entry,
/// never an omission. The reader verifies this lazily and reports a format
/// error on the read that would cross a violation.
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    total_size: u64,
    extents: Vec<Extent>,
}

impl StreamDescriptor {
    pub fn new(total_size: u64, extents: Vec<Extent>) -> Self {
        Self { total_size, extents }
    }

    /// Logical size of the stream in bytes
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Resolved extents, ordered by logical offset
    pub fn extents(&self) -> &[Extent] {
        &self.extents
    }

    pub fn number_of_extents(&self) -> usize {
        self.extents.len()
    }
}

// ============================================================================
// DirectoryEntry
// ============================================================================

/// Directory entry that resolved the journal file, kept for diagnostics
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// File name recorded in the parent index, normally `$UsnJrnl`
    pub name: String,
    /// File reference the entry points at
    pub file_reference: FileReference,
}

impl DirectoryEntry {
    pub fn new(name: &str, file_reference: FileReference) -> Self {
        Self {
            name: name.to_string(),
            file_reference,
        }
    }
}

// ============================================================================
// DataAttribute
// ============================================================================

/// Resolved surface of the $DATA attribute a stream lives in.
///
/// Produced by the external attribute layer. `stream` is `None` when the
/// attribute header carried no usable run list.
#[derive(Debug, Clone)]
pub struct DataAttribute {
    name: String,
    non_resident: bool,
    stream: Option<StreamDescriptor>,
}

impl DataAttribute {
    pub fn new(name: &str, non_resident: bool, stream: Option<StreamDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            non_resident,
            stream,
        }
    }

    /// Stream name of the attribute ($J for the change journal)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the attribute data lives outside the MFT record
    pub fn is_non_resident(&self) -> bool {
        self.non_resident
    }

    /// Extent map, present only for non-resident attributes with a run list
    pub fn stream(&self) -> Option<&StreamDescriptor> {
        self.stream.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_reference_splits_record_and_sequence() {
        let reference = FileReference(0x0005_0000_0000_0823);
        assert_eq!(reference.record_number(), 0x823);
        assert_eq!(reference.sequence_number(), 5);
        assert_eq!(reference.to_string(), "2083-5");
    }

    #[test]
    fn extent_constructors_set_flags() {
        let allocated = Extent::allocated(0, 0x10000, 4096);
        assert!(allocated.is_allocated());
        assert!(!allocated.is_sparse());
        assert_eq!(allocated.end_offset(), 4096);

        let sparse = Extent::sparse(4096, 8192);
        assert!(sparse.is_sparse());
        assert!(!sparse.is_allocated());
        assert_eq!(sparse.end_offset(), 12288);
    }

    #[test]
    fn descriptor_reports_geometry() {
        let descriptor = StreamDescriptor::new(
            6144,
            vec![Extent::allocated(0, 0x8000, 4096), Extent::sparse(4096, 2048)],
        );
        assert_eq!(descriptor.total_size(), 6144);
        assert_eq!(descriptor.number_of_extents(), 2);
        assert_eq!(descriptor.extents()[1].logical_offset, 4096);
    }
}
