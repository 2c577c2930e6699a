use std::collections::VecDeque;
use std::io::Read;
use std::time::Duration;

use log::{debug, trace};
use serialport::SerialPort;

use super::{ByteSource, SourceError};
use crate::logutil::hex_snippet;

const READ_CHUNK: usize = 256;

/// The radar's UART, opened 8N1 at the configured baud rate.
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    pending: VecDeque<u8>,
}

impl SerialSource {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, SourceError> {
        debug!("Opening serial port {} at {} baud", port_name, baud_rate);

        let builder = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(50))
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None);
        let mut port = builder.open().map_err(|e| SourceError::Open {
            port: port_name.to_string(),
            reason: e.to_string(),
        })?;

        let _ = port.write_data_terminal_ready(true);
        let _ = port.write_request_to_send(true);
        std::thread::sleep(Duration::from_millis(150));

        // Drop whatever the module sent before we were listening; a frame
        // cut at the start would only produce a checksum error.
        let _ = port.clear(serialport::ClearBuffer::Input);

        debug!("Serial port {} initialized", port_name);
        Ok(Self {
            port,
            pending: VecDeque::with_capacity(READ_CHUNK),
        })
    }

    fn fill(&mut self) -> Result<usize, SourceError> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.port.read(&mut chunk) {
            Ok(n) => {
                if n > 0 {
                    trace!("RAW {} bytes: {}", n, hex_snippet(&chunk[..n], 64));
                    self.pending.extend(&chunk[..n]);
                }
                Ok(n)
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl ByteSource for SerialSource {
    fn try_read_byte(&mut self) -> Result<Option<u8>, SourceError> {
        if self.pending.is_empty() && self.port.bytes_to_read()? > 0 {
            self.fill()?;
        }
        Ok(self.pending.pop_front())
    }

    fn wait_for_data(&mut self, timeout: Duration) -> Result<bool, SourceError> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        self.port.set_timeout(timeout)?;
        Ok(self.fill()? > 0)
    }
}
