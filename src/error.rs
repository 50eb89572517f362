//! Error types for the update journal reader
//!
//! Every failure is reported at the point it was detected, carrying the
//! offset or extent context needed to locate it on the volume.

use thiserror::Error;

/// Main error type for journal read operations
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("data attribute names stream '{0}', expected '$J'")]
    WrongStreamName(String),

    #[error("$J data attribute is resident; the change journal is always a non-resident stream")]
    ResidentAttribute,

    #[error("$J data attribute carries no data stream")]
    MissingDataStream,

    #[error("cluster block size must be non-zero")]
    ZeroClusterBlockSize,

    #[error("block buffer holds {got} bytes, expected exactly {expected}")]
    BadBlockBuffer { expected: usize, got: usize },

    #[error("journal reader was closed")]
    Closed,

    #[error("extents end at logical offset {covered} but the stream declares {total_size} bytes")]
    ExtentUnderrun { covered: u64, total_size: u64 },

    #[error("extent {index} starts at logical offset {found}, cursor expected {expected}")]
    MisalignedExtent { index: usize, expected: u64, found: u64 },

    #[error("extent {index} at logical offset {logical_offset} is neither sparse nor allocated")]
    UnresolvedExtent { index: usize, logical_offset: u64 },

    #[error("short read at disk offset {disk_offset}: wanted {wanted} bytes, got {got}")]
    ShortRead { disk_offset: u64, wanted: usize, got: usize },

    #[error("read of {wanted} bytes at disk offset {disk_offset} failed: {source}")]
    ReadFailed {
        disk_offset: u64,
        wanted: usize,
        source: std::io::Error,
    },
}

/// Result type alias for journal operations
pub type Result<T> = std::result::Result<T, JournalError>;

/// Coarse failure classification callers dispatch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller misuse: wrong attribute, bad buffer, use after close
    InvalidArgument,
    /// The stream descriptor contradicts the declared layout
    Format,
    /// A positioned read failed or came back short
    Io,
}

impl JournalError {
    /// Classify this error into the kind callers dispatch on
    pub fn kind(&self) -> ErrorKind {
        match self {
            JournalError::WrongStreamName(_)
            | JournalError::ResidentAttribute
            | JournalError::ZeroClusterBlockSize
            | JournalError::BadBlockBuffer { .. }
            | JournalError::Closed => ErrorKind::InvalidArgument,
            JournalError::MissingDataStream
            | JournalError::ExtentUnderrun { .. }
            | JournalError::MisalignedExtent { .. }
            | JournalError::UnresolvedExtent { .. } => ErrorKind::Format,
            JournalError::ShortRead { .. } | JournalError::ReadFailed { .. } => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_the_three_families() {
        assert_eq!(
            JournalError::Closed.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            JournalError::ExtentUnderrun { covered: 4096, total_size: 8192 }.kind(),
            ErrorKind::Format
        );
        assert_eq!(
            JournalError::ShortRead { disk_offset: 512, wanted: 4096, got: 100 }.kind(),
            ErrorKind::Io
        );
    }

    #[test]
    fn messages_carry_context() {
        let err = JournalError::ShortRead { disk_offset: 8192, wanted: 4096, got: 12 };
        let text = err.to_string();
        assert!(text.contains("8192"));
        assert!(text.contains("4096"));
        assert!(text.contains("12"));
    }
}
