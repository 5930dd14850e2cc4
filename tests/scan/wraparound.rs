//! Records that cross the end of the data array.

use crate::common::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn short_tail_is_skipped_and_region_wraps() {
    let capacity = 1024;
    let region = region(capacity);

    append_all(&region, &[record_with_len(0, 507)]);
    assert_eq!(drain_sequences(&region, true), vec![0]);
    // capacity - 10 bytes written, the second record still unread
    let pending = record_with_len(1, 507);
    append_all(&region, &[pending.clone()]);

    // 20 bytes of body past the header: the 10 byte tail cannot hold it
    let next = record_with_len(2, HDR + 20);
    let position = region.append_record(&next).unwrap();
    assert_eq!(position, 0);

    let status = region.status().unwrap();
    assert!(status.wrapped);
    assert_eq!(status.read_position, 507);
    assert_eq!(status.end_position as usize, HDR + 20);
    assert_eq!(status.unread_bytes, 507 + 10 + HDR + 20);
    assert_eq!(status.overruns, 0);

    let drained: Vec<LogRecord> = drain_records(&region, true)
        .into_iter()
        .map(|s| s.record)
        .collect();
    assert_eq!(drained, vec![pending, next]);
    assert!(!region.status().unwrap().wrapped);
}

#[test]
fn short_tail_on_drained_region_restarts_at_zero() {
    let capacity = 1024;
    let region = region(capacity);

    append_all(&region, &[record_with_len(0, 1000)]);
    assert_eq!(drain_sequences(&region, true), vec![0]);

    // 24 byte tail, nothing unread: both cursors move to 0
    let next = record_with_len(1, 1010);
    assert_eq!(region.append_record(&next).unwrap(), 0);

    let status = region.status().unwrap();
    assert_eq!(status.read_position, 0);
    assert_eq!(status.end_position, 1010);
    assert!(!status.wrapped);
    assert_eq!(status.unread_bytes, 1010);
    assert!(status.unread_bytes <= status.capacity);
    assert_eq!(status.overruns, 0);

    let drained = drain_records(&region, true);
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].position, 0);
    assert_eq!(drained[0].record, next);
}

#[test]
fn split_record_reads_as_one() {
    let capacity = 1024;
    let region = region(capacity);

    append_all(&region, &[record_with_len(0, 600)]);
    drain_records(&region, true);

    // header at 600 fits, body runs 76 bytes past the end
    let split = record_with_len(1, 500);
    let position = region.append_record(&split).unwrap();
    assert_eq!(position, 600);

    let status = region.status().unwrap();
    assert!(status.wrapped);
    assert_eq!(status.end_position, 76);
    assert_eq!(status.read_position, 600);

    let drained = drain_records(&region, true);
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].position, 600);
    assert_eq!(drained[0].record, split);

    let status = region.status().unwrap();
    assert_eq!(status.read_position, 76);
    assert!(!status.wrapped);
}

#[test]
fn records_on_both_sides_of_the_end() {
    let region = region(1024);
    append_all(&region, &[record_with_len(0, 350), record_with_len(1, 350)]);
    drain_records(&region, true);

    let records = vec![
        record_with_len(2, 150),
        record_with_len(3, 300),
        record_with_len(4, 200),
    ];
    let positions = append_all(&region, &records);
    assert_eq!(positions, vec![700, 850, 126]);

    let drained: Vec<LogRecord> = drain_records(&region, true)
        .into_iter()
        .map(|s| s.record)
        .collect();
    assert_eq!(drained, records);
}

#[test]
fn exactly_full_region_drains_completely() {
    let region = region(1024);
    append_all(&region, &[record_with_len(0, 512), record_with_len(1, 512)]);

    let status = region.status().unwrap();
    assert_eq!(status.end_position, 0);
    assert!(status.wrapped);
    assert_eq!(status.unread_bytes, 1024);

    assert_eq!(drain_sequences(&region, true), vec![0, 1]);
    let status = region.status().unwrap();
    assert_eq!(status.read_position, 0);
    assert_eq!(status.unread_bytes, 0);
}

#[test]
fn many_laps_keep_order() {
    let mut rng = StdRng::seed_from_u64(42);
    let region = region(2048);
    let mut sequence = 0;

    for _ in 0..200 {
        let batch: Vec<LogRecord> = (0..rng.gen_range(1..4))
            .map(|_| {
                sequence += 1;
                record_with_len(sequence, rng.gen_range(HDR + 1..500))
            })
            .collect();
        append_all(&region, &batch);

        let drained: Vec<LogRecord> = drain_records(&region, true)
            .into_iter()
            .map(|s| s.record)
            .collect();
        assert_eq!(drained, batch);
    }
    assert_eq!(region.status().unwrap().overruns, 0);
}
