//! A scan excludes producers for its whole pass, not per record.

use crate::common::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn scan_blocks_appends_until_dropped() {
    let region = Arc::new(region(4096));
    append_all(&region, &[record_with_len(0, 300), record_with_len(1, 300)]);

    let mut scan = drain(&region, true).unwrap();
    assert_eq!(scan.next().unwrap().unwrap().record.sequence, 0);

    let appended = Arc::new(AtomicBool::new(false));
    let producer = {
        let region = Arc::clone(&region);
        let appended = Arc::clone(&appended);
        thread::spawn(move || {
            region.append_record(&record_with_len(2, 300)).unwrap();
            appended.store(true, Ordering::SeqCst);
        })
    };

    // Between records the producer still waits
    thread::sleep(Duration::from_millis(100));
    assert!(!appended.load(Ordering::SeqCst));
    assert_eq!(scan.next().unwrap().unwrap().record.sequence, 1);
    thread::sleep(Duration::from_millis(50));
    assert!(!appended.load(Ordering::SeqCst));

    // The snapshot limit excludes the waiting append
    assert!(scan.next().is_none());
    drop(scan);

    producer.join().unwrap();
    assert!(appended.load(Ordering::SeqCst));
    assert_eq!(drain_sequences(&region, true), vec![2]);
}

#[test]
fn scan_blocks_other_scans_and_resets() {
    let region = Arc::new(region(4096));
    append_all(&region, &[record_with_len(0, 300)]);

    let scan = drain(&region, false).unwrap();
    let done = Arc::new(AtomicBool::new(false));
    let other = {
        let region = Arc::clone(&region);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let seen = drain_sequences(&region, true);
            region.reset(None).unwrap();
            done.store(true, Ordering::SeqCst);
            seen
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(!done.load(Ordering::SeqCst));
    drop(scan);

    assert_eq!(other.join().unwrap(), vec![0]);
    assert_eq!(region.status().unwrap().end_position, 0);
}

#[test]
fn append_after_scan_sees_committed_cursor() {
    let region = Arc::new(region(4096));
    append_all(&region, &[record_with_len(0, 300)]);

    let scan = drain(&region, true).unwrap();
    let observer = {
        let region = Arc::clone(&region);
        thread::spawn(move || region.status().unwrap())
    };
    thread::sleep(Duration::from_millis(50));
    assert_eq!(scan.count(), 1);

    // The waiting reader only ran after the commit
    let status = observer.join().unwrap();
    assert_eq!(status.read_position, 300);
    assert_eq!(status.unread_bytes, 0);
}
