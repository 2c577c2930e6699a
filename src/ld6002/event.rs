//! Fall-status events decoded from validated frames.

use serde::{Deserialize, Serialize};

use super::frame::ValidatedFrame;
use super::layout;
use super::Framing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    Normal,
    Fall,
}

impl Event {
    pub fn from_status(status: u8) -> Option<Self> {
        match status {
            layout::STATUS_NORMAL => Some(Event::Normal),
            layout::STATUS_FALL => Some(Event::Fall),
            _ => None,
        }
    }

    pub fn status_byte(self) -> u8 {
        match self {
            Event::Normal => layout::STATUS_NORMAL,
            Event::Fall => layout::STATUS_FALL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Event::Normal => "normal",
            Event::Fall => "fall",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body published for every decoded event: `{"status":"normal"}` / `{"status":"fall"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: Event,
}

impl StatusMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"status\":\"{}\"}}", self.status))
    }
}

/// Only verified fall-status frames with a known status byte produce an event;
/// every other frame is ignored.
pub fn decode(frame: &ValidatedFrame<'_>, framing: &Framing) -> Option<Event> {
    if frame.header().frame_type != framing.fall_frame_type || !frame.payload_verified() {
        return None;
    }
    frame.payload().first().copied().and_then(Event::from_status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ld6002::frame::{encode_frame, validate, FrameHeader};
    use crate::ld6002::scanner::FrameScanner;

    fn decode_bytes(bytes: &[u8]) -> Option<Event> {
        let framing = Framing::default();
        let candidate = FrameScanner::new(bytes, framing.sof).next()?;
        let validated = validate(candidate, &framing).ok()?;
        decode(&validated, &framing)
    }

    #[test]
    fn status_bytes_map_to_events() {
        assert_eq!(decode_bytes(&encode_frame(0x01, 0x0E02, &[0x00]).unwrap()), Some(Event::Normal));
        assert_eq!(decode_bytes(&encode_frame(0x01, 0x0E02, &[0x01]).unwrap()), Some(Event::Fall));
        assert_eq!(decode_bytes(&encode_frame(0x01, 0x0E02, &[0x02]).unwrap()), None);
    }

    #[test]
    fn only_first_payload_byte_matters() {
        let bytes = encode_frame(0x01, 0x0E02, &[0x01, 0x7F, 0x00]).unwrap();
        assert_eq!(decode_bytes(&bytes), Some(Event::Fall));
    }

    #[test]
    fn unknown_type_and_empty_payload_are_ignored() {
        assert_eq!(decode_bytes(&encode_frame(0x01, 0x0A14, &[0x01]).unwrap()), None);
        let empty = encode_frame(0x01, 0x0E02, &[]).unwrap();
        assert_eq!(FrameHeader::parse(&empty).unwrap().payload_len, 0);
        assert_eq!(decode_bytes(&empty), None);
    }

    #[test]
    fn published_body_is_lowercase_json() {
        assert_eq!(StatusMessage { status: Event::Normal }.to_json(), r#"{"status":"normal"}"#);
        assert_eq!(StatusMessage { status: Event::Fall }.to_json(), r#"{"status":"fall"}"#);
    }
}
