//! # LD6002 TinyFrame Protocol
//!
//! The HLK-LD6002 radar reports over its UART using a small length-prefixed,
//! checksum-guarded binary framing. This module holds everything needed to go
//! from raw bytes to fall-status events, independent of where the bytes come
//! from or where the events go.
//!
//! ## Wire Format
//!
//! ```text
//! offset  size        field
//! 0       1           SOF (0x01)
//! 1       2           reserved
//! 3       2           payload length (big-endian)
//! 5       2           frame type (big-endian, 0x0E02 = fall status)
//! 7       1           header checksum over bytes 0..7
//! 8       len         payload (payload[0] = status for 0x0E02)
//! 8+len   1           payload checksum
//! ```
//!
//! Both checksums are `!(XOR of the covered bytes)`.
//!
//! ## Pipeline
//!
//! - [`buffer::IngestBuffer`] - bounded accumulator with reset-on-overflow
//! - [`scanner::FrameScanner`] - finds complete candidate frames in a buffer snapshot
//! - [`frame::validate`] - header then payload checksum checks
//! - [`event::decode`] - turns a verified fall-status frame into an [`Event`]
//!
//! ```rust
//! use fallwatch::ld6002::{decode, encode_frame, validate, Event, FrameScanner, Framing};
//!
//! let framing = Framing::default();
//! let bytes = encode_frame(framing.sof, framing.fall_frame_type, &[0x01]).unwrap();
//! let events: Vec<Event> = FrameScanner::new(&bytes, framing.sof)
//!     .filter_map(|candidate| validate(candidate, &framing).ok())
//!     .filter_map(|frame| decode(&frame, &framing))
//!     .collect();
//! assert_eq!(events, vec![Event::Fall]);
//! ```

pub mod buffer;
pub mod checksum;
pub mod error;
pub mod event;
pub mod frame;
pub mod layout;
pub mod scanner;

pub use buffer::{Append, IngestBuffer};
pub use checksum::checksum;
pub use error::{ChecksumError, FrameError};
pub use event::{decode, Event, StatusMessage};
pub use frame::{encode_frame, validate, CandidateFrame, FrameHeader, ValidatedFrame};
pub use scanner::{scan, FrameScanner, ScanStop};

/// Protocol constants that may differ between firmware builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framing {
    pub sof: u8,
    pub fall_frame_type: u16,
}

impl Framing {
    /// Frame types whose payload checksum is verified and which may decode to
    /// an event.
    pub fn recognizes(&self, frame_type: u16) -> bool {
        frame_type == self.fall_frame_type
    }
}

impl Default for Framing {
    fn default() -> Self {
        Self {
            sof: layout::DEFAULT_SOF,
            fall_frame_type: layout::FALL_STATUS_TYPE,
        }
    }
}
