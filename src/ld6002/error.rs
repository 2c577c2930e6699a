use thiserror::Error;

/// Integrity failures detected while validating a candidate frame.
///
/// Both kinds are recoverable: the frame is dropped and scanning continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumError {
    #[error("header checksum error at offset {offset}: computed {computed:#04x}, frame carries {carried:#04x}")]
    Header {
        offset: usize,
        computed: u8,
        carried: u8,
    },

    #[error("data checksum error at offset {offset} (type {frame_type:#06x}): computed {computed:#04x}, frame carries {carried:#04x}")]
    Payload {
        offset: usize,
        frame_type: u16,
        computed: u8,
        carried: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("payload too long for a TinyFrame: {len} bytes (max {max})")]
    PayloadTooLong { len: usize, max: usize },
}
