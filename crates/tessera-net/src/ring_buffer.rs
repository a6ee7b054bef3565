//! Fixed-capacity circular byte buffer.
//!
//! Offsets wrap modulo the capacity. One byte is always left unused so that
//! `read == write` unambiguously means empty; a buffer of capacity `n` holds
//! at most `n - 1` bytes.

use crate::cursor::ByteCursor;

/// Circular byte buffer with independent read and write offsets.
#[derive(Debug)]
pub struct RingBuffer {
    data: Box<[u8]>,
    read_offset: usize,
    write_offset: usize,
}

impl RingBuffer {
    /// Creates a buffer of `capacity` bytes (usable space `capacity - 1`).
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 2`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "ring buffer capacity must be at least 2");
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            read_offset: 0,
            write_offset: 0,
        }
    }

    /// Total capacity in bytes, including the reserved byte.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Largest number of bytes the buffer can hold at once.
    pub fn max_len(&self) -> usize {
        self.data.len() - 1
    }

    /// Bytes written but not yet consumed.
    pub fn read_amount(&self) -> usize {
        (self.write_offset + self.data.len() - self.read_offset) % self.data.len()
    }

    /// Bytes that can be written before the buffer is full.
    pub fn free_size(&self) -> usize {
        self.max_len() - self.read_amount()
    }

    /// Returns `true` when no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.read_offset == self.write_offset
    }

    /// Current read offset.
    pub fn read_offset(&self) -> usize {
        self.read_offset
    }

    /// Current write offset.
    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    /// Appends as many bytes of `bytes` as fit and returns how many were taken.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let count = bytes.len().min(self.free_size());
        let capacity = self.data.len();
        let first = count.min(capacity - self.write_offset);

        self.data[self.write_offset..self.write_offset + first].copy_from_slice(&bytes[..first]);
        self.data[..count - first].copy_from_slice(&bytes[first..count]);

        self.write_offset = (self.write_offset + count) % capacity;
        count
    }

    /// Cursor over the buffered bytes. Reads through it do not consume
    /// anything until [`RingBuffer::commit`] is called with its offset.
    pub fn cursor(&self) -> ByteCursor<'_> {
        ByteCursor::new(&self.data, self.read_offset, self.write_offset)
    }

    /// Moves the read offset to `offset`, consuming everything before it.
    pub fn commit(&mut self, offset: usize) {
        debug_assert!(offset < self.data.len());
        self.read_offset = offset;
    }

    /// Discards all buffered bytes.
    pub fn clear(&mut self) {
        self.read_offset = 0;
        self.write_offset = 0;
    }

    /// Empties the buffer and lets `fill` write up to [`RingBuffer::max_len`]
    /// bytes contiguously from offset 0. `fill` returns how many it wrote.
    pub fn refill<E>(
        &mut self,
        fill: impl FnOnce(&mut [u8]) -> Result<usize, E>,
    ) -> Result<usize, E> {
        self.clear();
        let max_len = self.max_len();
        let written = fill(&mut self.data[..max_len])?;
        debug_assert!(written <= max_len);
        self.write_offset = written.min(max_len);
        Ok(self.write_offset)
    }
}
