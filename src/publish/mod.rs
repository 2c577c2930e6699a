//! Publish sinks: where decoded fall-status messages are handed off.
//!
//! The receiver calls [`PublishSink::publish`] once per event with the topic
//! and a JSON body. Sinks report failures but the receiver never retries.
//! Every sink here completes in bounded time; a network transport plugged in
//! behind this trait must apply its own send timeout.

use std::fs::{File, OpenOptions};
use std::io::{Stdout, Write};
use std::path::Path;

use log::info;
use thiserror::Error;

use crate::config::{PublishConfig, SinkKind};

pub const DEFAULT_TOPIC: &str = "ld6002/fall_status";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport not connected")]
    NotConnected,

    #[error("publish rejected: {0}")]
    Rejected(String),
}

pub trait PublishSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError>;
}

impl<S: PublishSink + ?Sized> PublishSink for Box<S> {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        (**self).publish(topic, payload)
    }
}

/// Writes each publish to the log at info level.
#[derive(Debug, Default)]
pub struct LogSink;

impl PublishSink for LogSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        info!("publish {} {}", topic, payload);
        Ok(())
    }
}

/// One line per publish: `[timestamp ]<topic> <payload>`.
pub struct LineSink<W: Write> {
    out: W,
    timestamps: bool,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W, timestamps: bool) -> Self {
        Self { out, timestamps }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl LineSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), false)
    }
}

impl LineSink<File> {
    pub fn append_file<P: AsRef<Path>>(path: P) -> Result<Self, TransportError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file, true))
    }
}

impl<W: Write> PublishSink for LineSink<W> {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        if self.timestamps {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(self.out, "{} {} {}", ts, topic, payload)?;
        } else {
            writeln!(self.out, "{} {}", topic, payload)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Build the sink selected in the `[publish]` section.
pub fn sink_from_config(cfg: &PublishConfig) -> Result<Box<dyn PublishSink + Send>, TransportError> {
    Ok(match cfg.sink {
        SinkKind::Log => Box::new(LogSink),
        SinkKind::Stdout => Box::new(LineSink::stdout()),
        SinkKind::File => {
            let path = cfg.file.as_deref().ok_or_else(|| {
                TransportError::Rejected("publish.sink = \"file\" requires publish.file".to_string())
            })?;
            Box::new(LineSink::append_file(path)?)
        }
    })
}
