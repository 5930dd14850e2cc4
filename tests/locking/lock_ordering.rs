//! Randomized concurrent load against an instrumented lock.

use crate::common::*;
use logring::{LeaseKind, LockObserver};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Acquired(LeaseKind),
    Released(LeaseKind),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl LockObserver for Recorder {
    fn acquired(&self, kind: LeaseKind) {
        self.events.lock().push(Event::Acquired(kind));
    }

    fn released(&self, kind: LeaseKind) {
        self.events.lock().push(Event::Released(kind));
    }
}

const PRODUCERS: usize = 4;
const PER_PRODUCER: u64 = 150;

fn tag(producer: usize, n: u64) -> u64 {
    (producer as u64) << 32 | n
}

#[test]
fn critical_sections_never_interleave() {
    let recorder = Arc::new(Recorder::default());
    let region = Arc::new(
        Region::anonymous(&RegionConfig::default())
            .unwrap()
            .with_observer(recorder.clone()),
    );
    let consumed = Arc::new(Mutex::new(Vec::new()));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let region = Arc::clone(&region);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(p as u64);
                for n in 0..PER_PRODUCER {
                    let len = rng.gen_range(HDR + 1..HDR + 400);
                    let mut record = record_with_len(tag(p, n), len);
                    record.pid = p as i32;
                    region.append_record(&record).unwrap();
                    if rng.gen_bool(0.2) {
                        thread::sleep(Duration::from_micros(rng.gen_range(0..300)));
                    }
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..2)
        .map(|c| {
            let region = Arc::clone(&region);
            let consumed = Arc::clone(&consumed);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(100 + c);
                for _ in 0..60 {
                    // Record while the lease is still held so batches land in
                    // drain order.
                    let mut scan = drain(&region, true).unwrap();
                    let mut sink = consumed.lock();
                    for scanned in scan.by_ref() {
                        sink.push(scanned.unwrap().record.sequence);
                    }
                    drop(sink);
                    drop(scan);
                    if rng.gen_bool(0.1) {
                        region.status().unwrap();
                    }
                    thread::sleep(Duration::from_micros(rng.gen_range(0..500)));
                }
            })
        })
        .collect();

    for handle in producers.into_iter().chain(consumers) {
        handle.join().unwrap();
    }
    consumed.lock().extend(drain_sequences(&region, true));

    // Every acquisition is followed by its own release before the next one
    let events = recorder.events.lock();
    assert_eq!(events.len() % 2, 0);
    let mut counts: HashMap<LeaseKind, usize> = HashMap::new();
    for pair in events.chunks(2) {
        match (pair[0], pair[1]) {
            (Event::Acquired(a), Event::Released(r)) => {
                assert_eq!(a, r);
                *counts.entry(a).or_default() += 1;
            }
            other => panic!("interleaved critical sections: {:?}", other),
        }
    }
    assert_eq!(counts[&LeaseKind::Append], PRODUCERS * PER_PRODUCER as usize);
    assert!(counts[&LeaseKind::Scan] >= 121);
    // Release the recorder before `region.status()` re-enters it
    drop(events);

    // Each record was consumed exactly once, in each producer's order
    let consumed = consumed.lock();
    assert_eq!(consumed.len(), PRODUCERS * PER_PRODUCER as usize);
    for p in 0..PRODUCERS {
        let mine: Vec<u64> = consumed
            .iter()
            .copied()
            .filter(|s| (s >> 32) as usize == p)
            .collect();
        let expected: Vec<u64> = (0..PER_PRODUCER).map(|n| tag(p, n)).collect();
        assert_eq!(mine, expected);
    }
    assert_eq!(region.status().unwrap().overruns, 0);
}

#[test]
fn every_exit_path_releases() {
    let recorder = Arc::new(Recorder::default());
    let region = region(4096).with_observer(recorder.clone());
    append_all(&region, &[record_with_len(0, 300), record_with_len(1, 300)]);
    recorder.events.lock().clear();

    // abandoned part way
    let mut scan = drain(&region, true).unwrap();
    scan.next();
    drop(scan);
    // resume target missing
    seek_and_drain(&region, 5, false).unwrap().for_each(drop);
    // rejected append
    assert!(region.append(&vec![0u8; 4096]).is_err());
    // rejected reset
    assert!(region.reset(Some(0)).is_err());

    let events = recorder.events.lock();
    assert_eq!(
        *events,
        vec![
            Event::Acquired(LeaseKind::Scan),
            Event::Released(LeaseKind::Scan),
            Event::Acquired(LeaseKind::Scan),
            Event::Released(LeaseKind::Scan),
            Event::Acquired(LeaseKind::Append),
            Event::Released(LeaseKind::Append),
        ]
    );
}
