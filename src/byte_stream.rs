//! A finite-capacity, flow-controlled, in-memory byte stream with a writer
//! side and a reader side.

use std::collections::VecDeque;

/// A FIFO of bytes bounded by a fixed capacity. Short writes (when the
/// buffer is full) are normal and not an error.
#[derive(Debug)]
pub struct ByteStream {
    capacity: usize,
    buffer: VecDeque<u8>,
    bytes_written: u64,
    bytes_read: u64,
    closed: bool,
    error: bool,
}

impl ByteStream {
    pub fn new(capacity: usize) -> Self {
        ByteStream {
            capacity,
            buffer: VecDeque::with_capacity(capacity),
            bytes_written: 0,
            bytes_read: 0,
            closed: false,
            error: false,
        }
    }

    /// Writes as much of `data` as fits in the remaining capacity, returning
    /// the number of bytes actually accepted.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.remaining_capacity());
        self.buffer.extend(data[..n].iter().copied());
        self.bytes_written += n as u64;
        n
    }

    /// Returns a copy of the first `min(len, buffered())` bytes without
    /// consuming them.
    pub fn peek(&self, len: usize) -> Vec<u8> {
        let n = len.min(self.buffered());
        self.buffer.iter().take(n).copied().collect()
    }

    /// Removes the first `min(len, buffered())` bytes from the stream.
    pub fn pop(&mut self, len: usize) {
        let n = len.min(self.buffered());
        self.buffer.drain(..n);
        self.bytes_read += n as u64;
    }

    /// Reads (peeks, then pops) up to `len` bytes.
    pub fn read(&mut self, len: usize) -> Vec<u8> {
        let out = self.peek(len);
        self.pop(out.len());
        out
    }

    /// Signals that no more data will be written.
    pub fn end_input(&mut self) {
        self.closed = true;
    }

    /// Marks the stream as errored (used to propagate an RST).
    pub fn set_error(&mut self) {
        self.error = true;
    }

    pub fn error(&self) -> bool {
        self.error
    }

    pub fn input_ended(&self) -> bool {
        self.closed
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.buffered()
    }

    pub fn eof(&self) -> bool {
        self.closed && self.buffered() == 0
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
