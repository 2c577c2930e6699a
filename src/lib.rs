//! # Fallwatch - HLK-LD6002 Fall Detection Bridge
//!
//! Fallwatch reads the binary TinyFrame stream an HLK-LD6002 radar module emits
//! over its UART, validates every frame, and republishes fall-status changes as
//! small JSON messages (`{"status":"fall"}` / `{"status":"normal"}`) on a
//! configurable topic.
//!
//! ## Features
//!
//! - **Serial Ingest**: Direct connection to the module over USB/UART at 115200 8N1.
//! - **Robust Framing**: Bounded ingest buffer, SOF scanning with frame skipping, and
//!   two-stage (header, payload) checksum validation.
//! - **Timed Scan Cycles**: Buffered bytes are scanned every few seconds or as soon as
//!   the buffer fills, matching the module's reporting cadence.
//! - **Pluggable Publishing**: Log, stdout, or file sinks behind one trait.
//! - **Replay Tooling**: Feed captured byte streams through the same pipeline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "serial")]
//! # fn main() -> anyhow::Result<()> {
//! use fallwatch::config::Config;
//! use fallwatch::publish::LogSink;
//! use fallwatch::receiver::FrameReceiver;
//! use fallwatch::source::SerialSource;
//! use std::sync::atomic::AtomicBool;
//!
//! let config = Config::default();
//! let mut source = SerialSource::open(&config.sensor.port, config.sensor.baud_rate)?;
//! let mut receiver = FrameReceiver::from_config(&config);
//! receiver.run(&mut source, &mut LogSink, &AtomicBool::new(false))?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "serial"))]
//! # fn main() {}
//! ```
//!
//! ## Module Organization
//!
//! - [`ld6002`] - TinyFrame layout, checksum, buffer, scanner, validator and decoder
//! - [`receiver`] - the drive loop tying a byte source to a publish sink
//! - [`source`] - byte sources (serial port, in-process channel)
//! - [`publish`] - publish sinks
//! - [`config`] - configuration loading and validation
//! - [`metrics`] - per-receiver counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Byte Source   │ ← serial port / channel
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │ Frame Receiver  │ ← buffer, scan, validate, decode
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Publish Sink   │ ← log / stdout / file
//! └─────────────────┘
//! ```

pub mod config;
pub mod ld6002;
pub mod logutil;
pub mod metrics;
pub mod publish;
pub mod receiver;
pub mod source;
