//! Byte layout of an LD6002 TinyFrame. All multi-byte fields are big-endian.

pub const DEFAULT_SOF: u8 = 0x01;

pub const SOF_OFFSET: usize = 0;
pub const RESERVED_RANGE: std::ops::Range<usize> = 1..3;
pub const LENGTH_RANGE: std::ops::Range<usize> = 3..5;
pub const TYPE_RANGE: std::ops::Range<usize> = 5..7;
pub const HEADER_CHECKSUM_OFFSET: usize = 7;

/// Bytes covered by the header checksum (SOF through frame type).
pub const HEADER_CHECKED_LEN: usize = 7;
pub const HEADER_LEN: usize = 8;
pub const PAYLOAD_OFFSET: usize = HEADER_LEN;
pub const TRAILER_LEN: usize = 1;

/// Fall detection status report.
pub const FALL_STATUS_TYPE: u16 = 0x0E02;
pub const STATUS_NORMAL: u8 = 0x00;
pub const STATUS_FALL: u8 = 0x01;

/// Total on-wire size of a frame carrying `payload_len` bytes.
pub const fn frame_len(payload_len: usize) -> usize {
    HEADER_LEN + payload_len + TRAILER_LEN
}
