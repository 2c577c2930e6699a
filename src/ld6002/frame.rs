//! Frame views over the ingest buffer and two-stage checksum validation.

use super::checksum::checksum;
use super::error::{ChecksumError, FrameError};
use super::layout;
use super::Framing;

/// Logical header fields of a TinyFrame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub sof: u8,
    pub reserved: [u8; 2],
    pub payload_len: u16,
    pub frame_type: u16,
    pub checksum: u8,
}

impl FrameHeader {
    /// Decode the first [`layout::HEADER_LEN`] bytes. Returns `None` when fewer
    /// bytes are available. No field is validated here.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let header = bytes.get(..layout::HEADER_LEN)?;
        let reserved = &header[layout::RESERVED_RANGE];
        let len = &header[layout::LENGTH_RANGE];
        let ty = &header[layout::TYPE_RANGE];
        Some(Self {
            sof: header[layout::SOF_OFFSET],
            reserved: [reserved[0], reserved[1]],
            payload_len: u16::from_be_bytes([len[0], len[1]]),
            frame_type: u16::from_be_bytes([ty[0], ty[1]]),
            checksum: header[layout::HEADER_CHECKSUM_OFFSET],
        })
    }

    pub fn frame_len(&self) -> usize {
        layout::frame_len(self.payload_len as usize)
    }
}

/// A complete, not yet validated frame borrowed from the ingest buffer.
///
/// Only valid until the buffer is next cleared or compacted.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFrame<'a> {
    offset: usize,
    header: FrameHeader,
    bytes: &'a [u8],
}

impl<'a> CandidateFrame<'a> {
    /// `bytes` must be exactly the frame, header through trailing checksum.
    pub(crate) fn new(offset: usize, header: FrameHeader, bytes: &'a [u8]) -> Self {
        debug_assert_eq!(bytes.len(), header.frame_len());
        Self {
            offset,
            header,
            bytes,
        }
    }

    /// Position of the SOF byte within the scanned buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[layout::PAYLOAD_OFFSET..self.bytes.len() - layout::TRAILER_LEN]
    }

    pub fn payload_checksum(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }
}

/// A frame whose header checksum matched. `payload_verified` is set when the
/// frame type is one we decode and its payload checksum matched too.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedFrame<'a> {
    frame: CandidateFrame<'a>,
    payload_verified: bool,
}

impl<'a> ValidatedFrame<'a> {
    pub fn frame(&self) -> &CandidateFrame<'a> {
        &self.frame
    }

    pub fn header(&self) -> &FrameHeader {
        self.frame.header()
    }

    pub fn payload(&self) -> &'a [u8] {
        self.frame.payload()
    }

    pub fn payload_verified(&self) -> bool {
        self.payload_verified
    }
}

/// Check the header checksum, then the payload checksum for recognized types.
pub fn validate<'a>(
    frame: CandidateFrame<'a>,
    framing: &Framing,
) -> Result<ValidatedFrame<'a>, ChecksumError> {
    let computed = checksum(&frame.bytes()[..layout::HEADER_CHECKED_LEN]);
    if computed != frame.header().checksum {
        return Err(ChecksumError::Header {
            offset: frame.offset(),
            computed,
            carried: frame.header().checksum,
        });
    }

    if !framing.recognizes(frame.header().frame_type) {
        return Ok(ValidatedFrame {
            frame,
            payload_verified: false,
        });
    }

    let computed = checksum(frame.payload());
    if computed != frame.payload_checksum() {
        return Err(ChecksumError::Payload {
            offset: frame.offset(),
            frame_type: frame.header().frame_type,
            computed,
            carried: frame.payload_checksum(),
        });
    }

    Ok(ValidatedFrame {
        frame,
        payload_verified: true,
    })
}

/// Build a well-formed frame (reserved bytes zero) around `payload`.
pub fn encode_frame(sof: u8, frame_type: u16, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let payload_len = u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLong {
        len: payload.len(),
        max: u16::MAX as usize,
    })?;

    let mut out = Vec::with_capacity(layout::frame_len(payload.len()));
    out.push(sof);
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&payload_len.to_be_bytes());
    out.extend_from_slice(&frame_type.to_be_bytes());
    out.push(checksum(&out));
    out.extend_from_slice(payload);
    out.push(checksum(payload));
    Ok(out)
}
