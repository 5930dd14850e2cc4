//! Failure exits: oversized records and corrupt data.

use crate::common::*;

#[test]
fn record_of_exactly_capacity_is_rejected_before_mutation() {
    let capacity = 2048;
    let region = region(capacity);
    let kept = vec![record_with_len(0, 300), record_with_len(1, 300)];
    append_all(&region, &kept);
    let before = region.status().unwrap();

    let exact = record_with_len(2, capacity);
    assert!(matches!(
        region.append_record(&exact),
        Err(Error::RecordTooLarge { size, capacity: c }) if size == capacity && c == capacity
    ));
    assert!(matches!(
        region.append(&vec![0u8; capacity + 1]),
        Err(Error::RecordTooLarge { .. })
    ));

    assert_eq!(region.status().unwrap(), before);
    let drained: Vec<LogRecord> = drain_records(&region, true)
        .into_iter()
        .map(|s| s.record)
        .collect();
    assert_eq!(drained, kept);
}

#[test]
fn largest_record_fits_in_empty_region() {
    let capacity = 2048;
    let region = region(capacity);
    let largest = record_with_len(0, capacity - 1);
    assert_eq!(region.append_record(&largest).unwrap(), 0);
    assert_eq!(drain_records(&region, true)[0].record, largest);
}

#[test]
fn corrupt_record_ends_scan_without_commit() {
    let region = region(4096);
    append_all(&region, &[record_with_len(0, 300)]);
    let mut garbage = codec::encode(&record_with_len(1, 300), 4096).unwrap();
    garbage[0] ^= 0xFF;
    region.append(&garbage).unwrap();
    append_all(&region, &[record_with_len(2, 300)]);

    let mut scan = drain(&region, true).unwrap();
    assert_eq!(scan.next().unwrap().unwrap().record.sequence, 0);
    assert!(matches!(scan.next(), Some(Err(Error::CorruptRecord(_)))));
    assert!(scan.next().is_none());
    drop(scan);

    assert_eq!(region.status().unwrap().read_position, 0);
}

#[test]
fn bad_length_is_corrupt() {
    let region = region(4096);
    let mut bytes = codec::encode(&record_with_len(0, 300), 4096).unwrap();
    // total_len says 5000, more than the region holds
    bytes[4..8].copy_from_slice(&5000u32.to_le_bytes());
    region.append(&bytes).unwrap();

    let result = drain(&region, false).unwrap().next();
    assert!(matches!(result, Some(Err(Error::CorruptRecord(_)))));
}

#[test]
fn lock_released_on_error_exit() {
    let region = region(4096);
    append_all(&region, &[record_with_len(0, 300)]);

    let failed = seek_and_drain(&region, 1, false).unwrap().count();
    assert_eq!(failed, 1);

    // Same thread: a leaked lease would deadlock here
    region.append_record(&record_with_len(1, 300)).unwrap();
    assert_eq!(drain_sequences(&region, true), vec![0, 1]);
}

#[test]
fn repeated_overruns_end_in_corrupt_record() {
    let region = region(1024);
    // Each record overwrites part of the one before it
    append_all(
        &region,
        &[
            record_with_len(0, 600),
            record_with_len(1, 600),
            record_with_len(2, 600),
        ],
    );

    let status = region.status().unwrap();
    assert!(status.overruns >= 2);
    assert!(status.unread_bytes <= status.capacity);

    // Offset 0 now holds the tail of record 1's body
    let mut scan = drain(&region, true).unwrap();
    assert!(matches!(scan.next(), Some(Err(Error::CorruptRecord(_)))));
    assert!(scan.next().is_none());
    drop(scan);

    // Reset recovers the region
    region.reset(None).unwrap();
    append_all(&region, &[record_with_len(3, 600)]);
    assert_eq!(drain_sequences(&region, true), vec![3]);
}
