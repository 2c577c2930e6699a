//! Test utilities & fixtures.
//! Recording publish sinks and frame builders shared by the integration tests.
#![allow(dead_code)] // Each test binary uses a different subset.

use std::sync::{Arc, Mutex};

use fallwatch::ld6002::{encode_frame, layout};
use fallwatch::publish::{PublishSink, TransportError};

pub const TOPIC: &str = "ld6002/fall_status";

/// A well-formed fall-status frame carrying `status`.
pub fn status_frame(status: u8) -> Vec<u8> {
    encode_frame(layout::DEFAULT_SOF, layout::FALL_STATUS_TYPE, &[status]).expect("encode")
}

/// A well-formed frame of some other type.
pub fn other_frame(frame_type: u16, payload: &[u8]) -> Vec<u8> {
    encode_frame(layout::DEFAULT_SOF, frame_type, payload).expect("encode")
}

/// Sink recording every publish into shared storage so a test can inspect it
/// after handing the sink to a worker.
#[derive(Clone, Default)]
pub struct RecordingSink {
    published: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.published().into_iter().map(|(_, body)| body).collect()
    }
}

impl PublishSink for RecordingSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}
