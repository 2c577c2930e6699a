//! Locates candidate frames in an ingest buffer snapshot.
//!
//! The scanner walks the buffer left to right looking for the SOF marker. A
//! marker with a complete frame behind it is emitted and the cursor jumps to
//! the first byte after that frame, so marker values inside a consumed frame
//! are never revisited. Markers inside payloads the cursor has not yet reached
//! are evaluated like any other byte; the protocol has no escaping.

use super::frame::{CandidateFrame, FrameHeader};

/// Why a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// Every byte was examined.
    Exhausted,
    /// A marker was found with fewer than a header's worth of bytes behind it.
    IncompleteHeader { offset: usize },
    /// A header was read but the declared frame runs past the valid data.
    IncompleteFrame {
        offset: usize,
        frame_len: usize,
        available: usize,
    },
}

impl ScanStop {
    /// Offset of the trailing partial frame, if the scan stopped on one.
    pub fn pending_offset(&self) -> Option<usize> {
        match *self {
            ScanStop::Exhausted => None,
            ScanStop::IncompleteHeader { offset } | ScanStop::IncompleteFrame { offset, .. } => {
                Some(offset)
            }
        }
    }
}

/// Iterator over the complete candidate frames in `data`.
pub struct FrameScanner<'a> {
    data: &'a [u8],
    sof: u8,
    cursor: usize,
    stop: Option<ScanStop>,
}

impl<'a> FrameScanner<'a> {
    pub fn new(data: &'a [u8], sof: u8) -> Self {
        Self {
            data,
            sof,
            cursor: 0,
            stop: None,
        }
    }

    /// `None` until the iterator has been driven to completion.
    pub fn stop(&self) -> Option<ScanStop> {
        self.stop
    }
}

impl<'a> Iterator for FrameScanner<'a> {
    type Item = CandidateFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stop.is_some() {
            return None;
        }

        while self.cursor < self.data.len() {
            let offset = self.cursor;
            if self.data[offset] != self.sof {
                self.cursor += 1;
                continue;
            }

            let rest = &self.data[offset..];
            let Some(header) = FrameHeader::parse(rest) else {
                self.stop = Some(ScanStop::IncompleteHeader { offset });
                return None;
            };

            let frame_len = header.frame_len();
            if frame_len > rest.len() {
                self.stop = Some(ScanStop::IncompleteFrame {
                    offset,
                    frame_len,
                    available: rest.len(),
                });
                return None;
            }

            self.cursor = offset + frame_len;
            return Some(CandidateFrame::new(offset, header, &rest[..frame_len]));
        }

        self.stop = Some(ScanStop::Exhausted);
        None
    }
}

/// Convenience for callers that only need the candidates.
pub fn scan(data: &[u8], sof: u8) -> FrameScanner<'_> {
    FrameScanner::new(data, sof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ld6002::frame::encode_frame;

    fn offsets(data: &[u8]) -> (Vec<usize>, Option<ScanStop>) {
        let mut scanner = FrameScanner::new(data, 0x01);
        let found = scanner.by_ref().map(|f| f.offset()).collect();
        (found, scanner.stop())
    }

    #[test]
    fn finds_frame_after_leading_noise() {
        let mut data = vec![0xAA, 0x55, 0x00];
        data.extend(encode_frame(0x01, 0x0E02, &[0x00]).unwrap());
        let (found, stop) = offsets(&data);
        assert_eq!(found, vec![3]);
        assert_eq!(stop, Some(ScanStop::Exhausted));
    }

    #[test]
    fn back_to_back_frames_in_order() {
        let a = encode_frame(0x01, 0x0E02, &[0x00]).unwrap();
        let b = encode_frame(0x01, 0x0E02, &[0x01]).unwrap();
        let c = encode_frame(0x01, 0x0A14, &[0x01, 0x01, 0x01]).unwrap();
        let mut data = a.clone();
        data.extend(&b);
        data.extend(&c);

        let frames: Vec<_> = FrameScanner::new(&data, 0x01).collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].offset(), 0);
        assert_eq!(frames[1].offset(), a.len());
        assert_eq!(frames[2].offset(), a.len() + b.len());
        assert_eq!(frames[0].bytes(), &a[..]);
        assert_eq!(frames[1].bytes(), &b[..]);
        assert_eq!(frames[2].bytes(), &c[..]);
    }

    #[test]
    fn frame_ending_exactly_at_buffer_end_is_complete() {
        let data = encode_frame(0x01, 0x0E02, &[0x00]).unwrap();
        let (found, stop) = offsets(&data);
        assert_eq!(found, vec![0]);
        assert_eq!(stop, Some(ScanStop::Exhausted));
    }

    #[test]
    fn trailing_checksum_byte_equal_to_sof_is_not_rescanned() {
        // status 0xFE gives a payload checksum of 0x01, the SOF value.
        let frame = encode_frame(0x01, 0x0E02, &[0xFE]).unwrap();
        assert_eq!(*frame.last().unwrap(), 0x01);
        let mut data = frame.clone();
        data.extend([0x00; 8]);
        let (found, stop) = offsets(&data);
        assert_eq!(found, vec![0]);
        assert_eq!(stop, Some(ScanStop::Exhausted));
    }

    #[test]
    fn short_header_stops_scan() {
        let data = [0x00, 0x01, 0x00, 0x00, 0x00];
        let (found, stop) = offsets(&data);
        assert!(found.is_empty());
        assert_eq!(stop, Some(ScanStop::IncompleteHeader { offset: 1 }));
    }

    #[test]
    fn truncated_frame_stops_scan() {
        let mut data = encode_frame(0x01, 0x0E02, &[0x00]).unwrap();
        let partial = encode_frame(0x01, 0x0E02, &[0x00, 0x00, 0x00]).unwrap();
        data.extend(&partial[..9]);
        let (found, stop) = offsets(&data);
        assert_eq!(found, vec![0]);
        assert_eq!(
            stop,
            Some(ScanStop::IncompleteFrame {
                offset: 10,
                frame_len: 12,
                available: 9,
            })
        );
        assert_eq!(stop.unwrap().pending_offset(), Some(10));
    }

    #[test]
    fn markers_inside_consumed_payload_are_skipped() {
        let frame = encode_frame(0x01, 0x0A14, &[0x01; 9]).unwrap();
        let (found, _) = offsets(&frame);
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn custom_marker() {
        let data = encode_frame(0x7E, 0x0E02, &[0x00]).unwrap();
        assert_eq!(FrameScanner::new(&data, 0x7E).count(), 1);
        assert_eq!(FrameScanner::new(&data, 0x01).count(), 0);
    }
}
