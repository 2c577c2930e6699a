//! Receiver counters.
//!
//! One [`Metrics`] set lives next to each frame receiver and can be shared
//! (behind an `Arc`) with whoever wants to report on it while the worker runs.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    cycles: AtomicU64,
    bytes_ingested: AtomicU64,
    overflow_resets: AtomicU64,
    bytes_discarded: AtomicU64,
    candidates: AtomicU64,
    header_checksum_errors: AtomicU64,
    payload_checksum_errors: AtomicU64,
    ignored_frames: AtomicU64,
    events: AtomicU64,
    publish_failures: AtomicU64,
    partial_dropped: AtomicU64,
    partial_carried: AtomicU64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_cycles(&self) {
        bump(&self.cycles, 1);
    }
    pub fn inc_bytes_ingested(&self) {
        bump(&self.bytes_ingested, 1);
    }
    pub fn record_overflow(&self, discarded: usize) {
        bump(&self.overflow_resets, 1);
        bump(&self.bytes_discarded, discarded as u64);
    }
    pub fn inc_candidates(&self) {
        bump(&self.candidates, 1);
    }
    pub fn inc_header_checksum_errors(&self) {
        bump(&self.header_checksum_errors, 1);
    }
    pub fn inc_payload_checksum_errors(&self) {
        bump(&self.payload_checksum_errors, 1);
    }
    pub fn inc_ignored_frames(&self) {
        bump(&self.ignored_frames, 1);
    }
    pub fn inc_events(&self) {
        bump(&self.events, 1);
    }
    pub fn inc_publish_failures(&self) {
        bump(&self.publish_failures, 1);
    }
    pub fn inc_partial_dropped(&self) {
        bump(&self.partial_dropped, 1);
    }
    pub fn inc_partial_carried(&self) {
        bump(&self.partial_carried, 1);
    }

    pub fn snapshot(&self) -> Snapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        Snapshot {
            cycles: load(&self.cycles),
            bytes_ingested: load(&self.bytes_ingested),
            overflow_resets: load(&self.overflow_resets),
            bytes_discarded: load(&self.bytes_discarded),
            candidates: load(&self.candidates),
            header_checksum_errors: load(&self.header_checksum_errors),
            payload_checksum_errors: load(&self.payload_checksum_errors),
            ignored_frames: load(&self.ignored_frames),
            events: load(&self.events),
            publish_failures: load(&self.publish_failures),
            partial_dropped: load(&self.partial_dropped),
            partial_carried: load(&self.partial_carried),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub cycles: u64,
    pub bytes_ingested: u64,
    pub overflow_resets: u64,
    pub bytes_discarded: u64,
    pub candidates: u64,
    pub header_checksum_errors: u64,
    pub payload_checksum_errors: u64,
    pub ignored_frames: u64,
    pub events: u64,
    pub publish_failures: u64,
    pub partial_dropped: u64,
    pub partial_carried: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot(), Snapshot::default());

        metrics.inc_cycles();
        metrics.record_overflow(256);
        metrics.record_overflow(10);
        metrics.inc_header_checksum_errors();

        let snap = metrics.snapshot();
        assert_eq!(snap.cycles, 1);
        assert_eq!(snap.overflow_resets, 2);
        assert_eq!(snap.bytes_discarded, 266);
        assert_eq!(snap.header_checksum_errors, 1);
        assert_eq!(snap.events, 0);
    }
}
