//! End-to-end journal reads over a synthesized disk image
//!
//! Builds a full-disk image holding one NTFS-like volume at a partition
//! offset, with the $J stream fragmented across sparse and allocated
//! extents, then checks that every accessor reassembles the same bytes.

use std::io::{Read, Write};

use tempfile::NamedTempFile;

use usnjrnl::{
    DataAttribute, DirectoryEntry, Extent, FileReference, IoHandle, JournalStream,
    PartitionAccessor, StreamDescriptor, UpdateJournal, JOURNAL_STREAM_NAME, UPDATE_JOURNAL_NAME,
};

const CLUSTER: u32 = 4096;
const PARTITION_OFFSET: u64 = 65536;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic byte pattern, distinct per seed
fn patterned(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u64).wrapping_mul(31).wrapping_add(seed as u64) as u8)
        .collect()
}

struct Fixture {
    file: NamedTempFile,
    attribute: DataAttribute,
    expected: Vec<u8>,
}

/// One volume at PARTITION_OFFSET inside a full-disk image. The journal
/// stream is a sparse front followed by two allocated runs placed out of
/// order on disk; the declared size ends partway into the last run.
fn build_fixture() -> Fixture {
    let run_a = patterned(4096, 3); // logical [8192, 12288) at volume offset 409600
    let run_b = patterned(4096, 7); // logical [12288, 16384) at volume offset 204800

    let mut volume = vec![0u8; 1 << 20];
    volume[409600..413696].copy_from_slice(&run_a);
    volume[204800..208896].copy_from_slice(&run_b);

    let mut disk = vec![0xEEu8; PARTITION_OFFSET as usize];
    disk.extend_from_slice(&volume);

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&disk).unwrap();
    file.flush().unwrap();

    let descriptor = StreamDescriptor::new(
        15000,
        vec![
            Extent::sparse(0, 8192),
            Extent::allocated(8192, 409600, 4096),
            Extent::allocated(12288, 204800, 4096),
        ],
    );
    let attribute = DataAttribute::new(JOURNAL_STREAM_NAME, true, Some(descriptor));

    let mut expected = vec![0u8; 8192];
    expected.extend_from_slice(&run_a);
    expected.extend_from_slice(&run_b[..2712]);

    Fixture {
        file,
        attribute,
        expected,
    }
}

fn entry() -> DirectoryEntry {
    DirectoryEntry::new(UPDATE_JOURNAL_NAME, FileReference(0x0003_0000_0000_0823))
}

#[test]
fn journal_reassembles_over_partitioned_image() {
    init_logging();
    let fixture = build_fixture();
    let io_handle = IoHandle::new(CLUSTER).unwrap();
    let accessor = PartitionAccessor::new(fixture.file.reopen().unwrap(), PARTITION_OFFSET);
    let entry = entry();

    let mut journal = UpdateJournal::open(
        &io_handle,
        &accessor,
        entry.file_reference,
        &entry,
        &fixture.attribute,
    )
    .unwrap();
    assert_eq!(journal.total_size(), 15000);
    assert_eq!(journal.cluster_block_size(), CLUSTER);

    let mut collected = Vec::new();
    let mut lengths = Vec::new();
    let mut buf = vec![0u8; CLUSTER as usize];
    loop {
        let count = journal.read_next_block(&mut buf).unwrap();
        if count == 0 {
            break;
        }
        lengths.push(count);
        collected.extend_from_slice(&buf[..count]);
    }

    assert_eq!(lengths, vec![4096, 4096, 4096, 2712]);
    assert_eq!(collected, fixture.expected);
    assert!(journal.is_exhausted());
    assert_eq!(journal.offset(), journal.total_size());
}

#[test]
fn mmap_accessor_matches_file_reads() {
    init_logging();
    let fixture = build_fixture();
    let io_handle = IoHandle::new(CLUSTER).unwrap();
    let file = fixture.file.reopen().unwrap();
    let map = unsafe { memmap2::Mmap::map(&file).unwrap() };
    let accessor = PartitionAccessor::new(map, PARTITION_OFFSET);
    let entry = entry();

    let mut journal = UpdateJournal::open(
        &io_handle,
        &accessor,
        entry.file_reference,
        &entry,
        &fixture.attribute,
    )
    .unwrap();

    let mut collected = Vec::new();
    while let Some(block) = journal.read_block().unwrap() {
        collected.extend_from_slice(&block);
    }
    assert_eq!(collected, fixture.expected);
}

#[test]
fn io_read_adapter_streams_whole_journal() {
    init_logging();
    let fixture = build_fixture();
    let io_handle = IoHandle::new(CLUSTER).unwrap();
    let accessor = PartitionAccessor::new(fixture.file.reopen().unwrap(), PARTITION_OFFSET);
    let entry = entry();

    let journal = UpdateJournal::open(
        &io_handle,
        &accessor,
        entry.file_reference,
        &entry,
        &fixture.attribute,
    )
    .unwrap();

    let mut collected = Vec::new();
    JournalStream::new(journal)
        .read_to_end(&mut collected)
        .unwrap();
    assert_eq!(collected, fixture.expected);
}
