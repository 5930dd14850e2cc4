//! Resume scans: skip to a known record and rewind the read cursor there.

use crate::common::*;
use logring::ScanPhase;

fn five_records(region: &Region) -> Vec<u32> {
    let records: Vec<LogRecord> = (1..=5).map(|n| record_with_len(n, 200)).collect();
    append_all(region, &records)
}

#[test]
fn seek_yields_from_target_on() {
    let region = region(4096);
    let positions = five_records(&region);

    let sequences: Vec<u64> = seek_and_drain(&region, positions[2], false)
        .unwrap()
        .map(|r| r.unwrap().record.sequence)
        .collect();
    assert_eq!(sequences, vec![3, 4, 5]);

    let status = region.status().unwrap();
    assert_eq!(status.read_position, positions[2]);
    assert!(!status.wrapped);
}

#[test]
fn rewind_survives_abort_after_match() {
    let region = region(4096);
    let positions = five_records(&region);

    let mut scan = seek_and_drain(&region, positions[2], false).unwrap();
    assert_eq!(scan.phase(), ScanPhase::Searching);
    let first = scan.next().unwrap().unwrap();
    assert_eq!(first.record.sequence, 3);
    assert_eq!(scan.phase(), ScanPhase::Yielding);
    drop(scan);

    assert_eq!(drain_sequences(&region, false), vec![3, 4, 5]);
}

#[test]
fn seek_without_finish_commit_leaves_cursor_at_target() {
    let region = region(4096);
    let positions = five_records(&region);

    seek_and_drain(&region, positions[1], false)
        .unwrap()
        .for_each(|r| assert!(r.is_ok()));
    assert_eq!(region.status().unwrap().read_position, positions[1]);
}

#[test]
fn seek_with_finish_commit_consumes_everything() {
    let region = region(4096);
    let positions = five_records(&region);

    let count = seek_and_drain(&region, positions[3], true).unwrap().count();
    assert_eq!(count, 2);

    let status = region.status().unwrap();
    assert_eq!(status.read_position, status.end_position);
    assert!(drain_sequences(&region, false).is_empty());
}

#[test]
fn seek_to_non_record_offset_fails_without_mutation() {
    let region = region(4096);
    let positions = five_records(&region);
    let before = region.status().unwrap();

    let results: Vec<_> = seek_and_drain(&region, positions[2] + 1, true)
        .unwrap()
        .collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(Error::ResumeTargetNotFound(target)) if target == positions[2] + 1
    ));
    assert_eq!(region.status().unwrap(), before);
}

#[test]
fn seek_to_consumed_record_fails() {
    let region = region(4096);
    let positions = five_records(&region);

    let count = seek_and_drain(&region, positions[3], false).unwrap().count();
    assert_eq!(count, 2);

    let result = seek_and_drain(&region, positions[1], false)
        .unwrap()
        .find_map(|r| r.err());
    assert!(matches!(result, Some(Error::ResumeTargetNotFound(_))));
    assert_eq!(region.status().unwrap().read_position, positions[3]);
}

#[test]
fn seek_on_empty_region_fails() {
    let region = region(4096);
    let mut scan = seek_and_drain(&region, 0, true).unwrap();
    assert!(matches!(
        scan.next(),
        Some(Err(Error::ResumeTargetNotFound(0)))
    ));
    assert!(scan.next().is_none());
}

#[test]
fn seek_across_the_end_records_wrap_sense() {
    let region = region(1024);
    append_all(&region, &[record_with_len(0, 400), record_with_len(1, 400)]);
    drain_records(&region, true);

    // 800: record 2 splits across the end; 76: record 3
    let positions = append_all(&region, &[record_with_len(2, 300), record_with_len(3, 200)]);
    assert_eq!(positions, vec![800, 76]);

    // Matching before the crossing keeps the region wrapped
    seek_and_drain(&region, 800, false).unwrap().for_each(drop);
    let status = region.status().unwrap();
    assert_eq!(status.read_position, 800);
    assert!(status.wrapped);

    // Matching after the crossing clears it
    let sequences: Vec<u64> = seek_and_drain(&region, 76, false)
        .unwrap()
        .map(|r| r.unwrap().record.sequence)
        .collect();
    assert_eq!(sequences, vec![3]);
    let status = region.status().unwrap();
    assert_eq!(status.read_position, 76);
    assert!(!status.wrapped);

    // Record 2 now lies behind the read cursor
    let result = seek_and_drain(&region, 800, false)
        .unwrap()
        .find_map(|r| r.err());
    assert!(matches!(result, Some(Error::ResumeTargetNotFound(800))));
}
