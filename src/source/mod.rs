//! Byte sources feeding the frame receiver.
//!
//! The receiver only needs two things from a source: a non-blocking single
//! byte read used to drain whatever has arrived, and a bounded wait for new
//! data. [`SerialSource`] talks to the radar over a serial port;
//! [`ChannelSource`] is fed from another thread and backs replays and tests.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

use thiserror::Error;

#[cfg(feature = "serial")]
mod serial;
#[cfg(feature = "serial")]
pub use serial::SerialSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("failed to open serial port {port}: {reason}")]
    Open { port: String, reason: String },

    /// The producing side went away; no more bytes will arrive.
    #[error("byte source closed")]
    Closed,
}

pub trait ByteSource {
    /// Return the next already-received byte without blocking.
    fn try_read_byte(&mut self) -> Result<Option<u8>, SourceError>;

    /// Block until data is available or `timeout` elapses. Returns `true` when
    /// data arrived.
    fn wait_for_data(&mut self, timeout: Duration) -> Result<bool, SourceError>;
}

/// Sending half of a [`ChannelSource`]. Dropping it closes the source.
#[derive(Debug, Clone)]
pub struct ChannelFeeder {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelFeeder {
    /// Returns `false` if the source has been dropped.
    pub fn feed(&self, bytes: &[u8]) -> bool {
        self.tx.send(bytes.to_vec()).is_ok()
    }
}

/// In-process byte source backed by an mpsc channel of chunks.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    closed: bool,
}

impl ChannelSource {
    pub fn channel() -> (ChannelFeeder, ChannelSource) {
        let (tx, rx) = mpsc::channel();
        (
            ChannelFeeder { tx },
            ChannelSource {
                rx,
                pending: VecDeque::new(),
                closed: false,
            },
        )
    }
}

impl ByteSource for ChannelSource {
    fn try_read_byte(&mut self) -> Result<Option<u8>, SourceError> {
        while self.pending.is_empty() && !self.closed {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => self.closed = true,
            }
        }
        Ok(self.pending.pop_front())
    }

    fn wait_for_data(&mut self, timeout: Duration) -> Result<bool, SourceError> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        if self.closed {
            return Err(SourceError::Closed);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(chunk) => {
                self.pending.extend(chunk);
                Ok(true)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(false),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.closed = true;
                Err(SourceError::Closed)
            }
        }
    }
}
