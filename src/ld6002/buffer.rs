//! Fixed-capacity ingest buffer fed one byte at a time from the serial link.

/// Outcome of a single [`IngestBuffer::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    Stored,
    /// The buffer was full; everything it held was discarded and the new
    /// byte is now the first byte of an otherwise empty buffer.
    Overflowed { discarded: usize },
}

/// Bounded accumulator for raw bytes awaiting a scan cycle.
///
/// The valid region is always `data[..len]` and `len <= capacity`.
#[derive(Debug)]
pub struct IngestBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl IngestBuffer {
    /// Create an empty buffer. A capacity of zero is bumped to one so that
    /// every append can store its byte.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(1)].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn append(&mut self, byte: u8) -> Append {
        let mut outcome = Append::Stored;
        if self.len >= self.data.len() {
            outcome = Append::Overflowed { discarded: self.len };
            self.len = 0;
        }
        self.data[self.len] = byte;
        self.len += 1;
        outcome
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.data.len()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Keep only `data[from..len]`, moved to the front. Used to carry an
    /// incomplete trailing frame into the next cycle.
    pub fn retain_from(&mut self, from: usize) {
        if from >= self.len {
            self.len = 0;
            return;
        }
        self.data.copy_within(from..self.len, 0);
        self.len -= from;
    }
}
