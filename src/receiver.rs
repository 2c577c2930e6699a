//! The drive loop: collects bytes from a [`ByteSource`], runs scan cycles on a
//! timed or buffer-full trigger, and forwards decoded events to a
//! [`PublishSink`].
//!
//! A single worker owns the [`FrameReceiver`]. Draining the source and
//! scanning are sequential phases of that worker, so the buffer never changes
//! during a scan.
//!
//! ```rust
//! use fallwatch::config::FramingConfig;
//! use fallwatch::ld6002::encode_frame;
//! use fallwatch::publish::LineSink;
//! use fallwatch::receiver::FrameReceiver;
//! use std::time::Instant;
//!
//! let mut receiver = FrameReceiver::new(&FramingConfig::default(), "ld6002/fall_status");
//! receiver.ingest_slice(&encode_frame(0x01, 0x0E02, &[0x01]).unwrap());
//!
//! let mut sink = LineSink::new(Vec::new(), false);
//! let report = receiver.scan_cycle(&mut sink, Instant::now());
//! assert_eq!(report.events.len(), 1);
//! assert_eq!(
//!     String::from_utf8(sink.into_inner()).unwrap(),
//!     "ld6002/fall_status {\"status\":\"fall\"}\n"
//! );
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};

use crate::config::{Config, FramingConfig};
use crate::ld6002::{
    decode, validate, Append, ChecksumError, Event, FrameScanner, Framing, IngestBuffer, ScanStop,
    StatusMessage,
};
use crate::logutil::hex_snippet;
use crate::metrics::Metrics;
use crate::publish::PublishSink;
use crate::source::{ByteSource, SourceError};

/// What one scan cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub scanned_bytes: usize,
    pub candidates: usize,
    pub header_errors: usize,
    pub payload_errors: usize,
    pub ignored: usize,
    /// Decoded events, in scan order.
    pub events: Vec<Event>,
    pub publish_failures: usize,
    pub stop: ScanStop,
    /// Bytes of an incomplete trailing frame kept for the next cycle.
    pub carried: usize,
}

pub struct FrameReceiver {
    buffer: IngestBuffer,
    framing: Framing,
    scan_interval: Duration,
    carry_partial: bool,
    topic: String,
    last_scan: Instant,
    metrics: Arc<Metrics>,
}

impl FrameReceiver {
    pub fn new(cfg: &FramingConfig, topic: impl Into<String>) -> Self {
        Self {
            buffer: IngestBuffer::with_capacity(cfg.buffer_capacity),
            framing: cfg.framing(),
            scan_interval: cfg.scan_interval(),
            carry_partial: cfg.carry_partial_frame,
            topic: topic.into(),
            last_scan: Instant::now(),
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.framing, config.publish.topic.clone())
    }

    /// Share an existing metrics set instead of the receiver's own.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Bytes accumulated since the last cycle.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn ingest(&mut self, byte: u8) -> Append {
        self.metrics.inc_bytes_ingested();
        let outcome = self.buffer.append(byte);
        if let Append::Overflowed { discarded } = outcome {
            warn!(
                "Ingest buffer full ({} bytes); discarded {} unparsed bytes",
                self.buffer.capacity(),
                discarded
            );
            self.metrics.record_overflow(discarded);
        }
        outcome
    }

    pub fn ingest_slice(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.ingest(b);
        }
    }

    /// A cycle is due once the scan interval has been exceeded or the buffer
    /// is full.
    pub fn scan_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_scan) > self.scan_interval || self.buffer.is_full()
    }

    /// Run a cycle if one is due.
    pub fn poll<S: PublishSink + ?Sized>(&mut self, sink: &mut S, now: Instant) -> Option<CycleReport> {
        if self.scan_due(now) {
            Some(self.scan_cycle(sink, now))
        } else {
            None
        }
    }

    /// Scan the buffer, validate and decode every candidate, publish each
    /// event, then clear the buffer and restart the interval timer.
    pub fn scan_cycle<S: PublishSink + ?Sized>(&mut self, sink: &mut S, now: Instant) -> CycleReport {
        self.metrics.inc_cycles();
        let data = self.buffer.as_slice();
        let mut report = CycleReport {
            scanned_bytes: data.len(),
            candidates: 0,
            header_errors: 0,
            payload_errors: 0,
            ignored: 0,
            events: Vec::new(),
            publish_failures: 0,
            stop: ScanStop::Exhausted,
            carried: 0,
        };
        if !data.is_empty() {
            trace!("Scanning {} bytes: {}", data.len(), hex_snippet(data, 64));
        }

        let mut scanner = FrameScanner::new(data, self.framing.sof);
        for candidate in scanner.by_ref() {
            report.candidates += 1;
            self.metrics.inc_candidates();
            let header = *candidate.header();
            debug!(
                "Frame at offset {}: type {:#06x}, {} payload bytes",
                candidate.offset(),
                header.frame_type,
                header.payload_len
            );

            let frame = match validate(candidate, &self.framing) {
                Ok(frame) => frame,
                Err(e @ ChecksumError::Header { .. }) => {
                    warn!("{}", e);
                    report.header_errors += 1;
                    self.metrics.inc_header_checksum_errors();
                    continue;
                }
                Err(e @ ChecksumError::Payload { .. }) => {
                    warn!("{}", e);
                    report.payload_errors += 1;
                    self.metrics.inc_payload_checksum_errors();
                    continue;
                }
            };

            let Some(event) = decode(&frame, &self.framing) else {
                debug!(
                    "Ignoring frame type {:#06x} (payload {})",
                    header.frame_type,
                    hex_snippet(frame.payload(), 16)
                );
                report.ignored += 1;
                self.metrics.inc_ignored_frames();
                continue;
            };

            info!("Fall status: {}", event);
            report.events.push(event);
            self.metrics.inc_events();

            let body = StatusMessage { status: event }.to_json();
            if let Err(e) = sink.publish(&self.topic, &body) {
                warn!("Publish to {} failed ({}): {}", self.topic, body, e);
                report.publish_failures += 1;
                self.metrics.inc_publish_failures();
            }
        }
        report.stop = scanner.stop().unwrap_or(ScanStop::Exhausted);

        self.finish_cycle(&mut report);
        self.last_scan = now;
        report
    }

    fn finish_cycle(&mut self, report: &mut CycleReport) {
        let Some(offset) = report.stop.pending_offset() else {
            self.buffer.clear();
            return;
        };

        let fits = match report.stop {
            ScanStop::IncompleteFrame { frame_len, .. } => frame_len <= self.buffer.capacity(),
            _ => true,
        };
        if self.carry_partial && fits {
            self.buffer.retain_from(offset);
            report.carried = self.buffer.len();
            self.metrics.inc_partial_carried();
            debug!(
                "Carrying {} bytes of incomplete frame into next cycle",
                report.carried
            );
        } else {
            debug!(
                "Dropping {} bytes of incomplete frame at offset {}",
                report.scanned_bytes - offset,
                offset
            );
            self.metrics.inc_partial_dropped();
            self.buffer.clear();
        }
    }

    /// Move every byte the source currently holds into the buffer.
    pub fn drain<B: ByteSource + ?Sized>(&mut self, source: &mut B) -> Result<usize, SourceError> {
        let mut count = 0;
        while let Some(byte) = source.try_read_byte()? {
            self.ingest(byte);
            count += 1;
        }
        Ok(count)
    }

    fn next_wait(&self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last_scan);
        self.scan_interval
            .saturating_sub(elapsed)
            .max(Duration::from_millis(1))
    }

    /// Worker loop. Returns when `stop` is set (checked after every wait) or
    /// when the source reports it is closed, in which case a final cycle runs
    /// over whatever is still buffered.
    pub fn run<B, S>(&mut self, source: &mut B, sink: &mut S, stop: &AtomicBool) -> Result<(), SourceError>
    where
        B: ByteSource + ?Sized,
        S: PublishSink + ?Sized,
    {
        info!(
            "Frame receiver running: {} byte buffer, scan every {} ms",
            self.buffer.capacity(),
            self.scan_interval.as_millis()
        );
        self.last_scan = Instant::now();

        loop {
            match source.wait_for_data(self.next_wait(Instant::now())) {
                Ok(_) => {}
                Err(SourceError::Closed) => {
                    self.drain(source)?;
                    info!("Byte source closed; running final scan cycle");
                    self.scan_cycle(sink, Instant::now());
                    return Ok(());
                }
                Err(e) => return Err(e),
            }

            if stop.load(Ordering::Relaxed) {
                info!("Frame receiver stopping");
                return Ok(());
            }

            self.drain(source)?;
            self.poll(sink, Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ld6002::encode_frame;
    use crate::publish::TransportError;

    #[derive(Default)]
    struct Recorder {
        published: Vec<(String, String)>,
        fail: bool,
    }

    impl PublishSink for Recorder {
        fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::NotConnected);
            }
            self.published.push((topic.to_string(), payload.to_string()));
            Ok(())
        }
    }

    fn framing(capacity: usize, carry: bool) -> FramingConfig {
        FramingConfig {
            buffer_capacity: capacity,
            carry_partial_frame: carry,
            ..FramingConfig::default()
        }
    }

    #[test]
    fn cycle_publishes_in_scan_order_and_clears() {
        let mut rx = FrameReceiver::new(&framing(256, false), "t");
        rx.ingest_slice(&encode_frame(0x01, 0x0E02, &[0x01]).unwrap());
        rx.ingest_slice(&[0xAA, 0xBB]);
        rx.ingest_slice(&encode_frame(0x01, 0x0E02, &[0x00]).unwrap());

        let mut sink = Recorder::default();
        let report = rx.scan_cycle(&mut sink, Instant::now());
        assert_eq!(report.events, vec![Event::Fall, Event::Normal]);
        assert_eq!(
            sink.published,
            vec![
                ("t".to_string(), r#"{"status":"fall"}"#.to_string()),
                ("t".to_string(), r#"{"status":"normal"}"#.to_string()),
            ]
        );
        assert!(rx.buffered().is_empty());
    }

    #[test]
    fn scan_due_on_interval_or_full_buffer() {
        let mut rx = FrameReceiver::new(&framing(16, false), "t");
        let start = Instant::now();
        let mut sink = Recorder::default();
        rx.scan_cycle(&mut sink, start);

        assert!(!rx.scan_due(start + Duration::from_millis(4999)));
        assert!(!rx.scan_due(start + Duration::from_millis(5000)));
        assert!(rx.scan_due(start + Duration::from_millis(5001)));

        rx.ingest_slice(&[0u8; 16]);
        assert!(rx.scan_due(start));
        assert!(rx.poll(&mut sink, start).is_some());
        assert!(rx.poll(&mut sink, start).is_none());
    }

    #[test]
    fn publish_failure_is_counted_not_retried() {
        let mut rx = FrameReceiver::new(&framing(64, false), "t");
        rx.ingest_slice(&encode_frame(0x01, 0x0E02, &[0x01]).unwrap());
        let mut sink = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let report = rx.scan_cycle(&mut sink, Instant::now());
        assert_eq!(report.events, vec![Event::Fall]);
        assert_eq!(report.publish_failures, 1);
        assert_eq!(rx.metrics().snapshot().publish_failures, 1);
        assert!(sink.published.is_empty());
    }

    #[test]
    fn straddling_frame_is_dropped_by_default() {
        let frame = encode_frame(0x01, 0x0E02, &[0x01]).unwrap();
        let mut rx = FrameReceiver::new(&framing(64, false), "t");
        let mut sink = Recorder::default();

        rx.ingest_slice(&frame[..6]);
        let report = rx.scan_cycle(&mut sink, Instant::now());
        assert_eq!(report.stop, ScanStop::IncompleteHeader { offset: 0 });
        assert_eq!(report.carried, 0);

        rx.ingest_slice(&frame[6..]);
        let report = rx.scan_cycle(&mut sink, Instant::now());
        assert!(report.events.is_empty());
        assert!(sink.published.is_empty());
        // The orphaned status byte 0x01 reads as another truncated header.
        assert_eq!(report.stop, ScanStop::IncompleteHeader { offset: 2 });
        assert_eq!(rx.metrics().snapshot().partial_dropped, 2);
    }

    #[test]
    fn straddling_frame_is_completed_when_carried() {
        let frame = encode_frame(0x01, 0x0E02, &[0x01]).unwrap();
        let mut rx = FrameReceiver::new(&framing(64, true), "t");
        let mut sink = Recorder::default();

        rx.ingest_slice(&[0x55, 0x55]);
        rx.ingest_slice(&frame[..9]);
        let report = rx.scan_cycle(&mut sink, Instant::now());
        assert_eq!(
            report.stop,
            ScanStop::IncompleteFrame {
                offset: 2,
                frame_len: 10,
                available: 9,
            }
        );
        assert_eq!(report.carried, 9);
        assert_eq!(rx.buffered(), &frame[..9]);

        rx.ingest_slice(&frame[9..]);
        let report = rx.scan_cycle(&mut sink, Instant::now());
        assert_eq!(report.events, vec![Event::Fall]);
        assert!(rx.buffered().is_empty());
    }

    #[test]
    fn oversize_partial_is_never_carried() {
        let mut rx = FrameReceiver::new(&framing(32, true), "t");
        // Declares a 0x0100-byte payload, which can never fit in 32 bytes.
        rx.ingest_slice(&[0x01, 0x00, 0x00, 0x01, 0x00, 0x0E, 0x02, 0x00, 0x00]);
        let mut sink = Recorder::default();
        let report = rx.scan_cycle(&mut sink, Instant::now());
        assert_eq!(report.carried, 0);
        assert!(rx.buffered().is_empty());
    }

    #[test]
    fn overflow_is_logged_and_counted() {
        let mut rx = FrameReceiver::new(&framing(10, false), "t");
        rx.ingest_slice(&[0u8; 10]);
        assert_eq!(rx.ingest(0x42), Append::Overflowed { discarded: 10 });
        assert_eq!(rx.buffered(), &[0x42]);
        let snap = rx.metrics().snapshot();
        assert_eq!(snap.overflow_resets, 1);
        assert_eq!(snap.bytes_discarded, 10);
        assert_eq!(snap.bytes_ingested, 11);
    }
}
