//! Read cursor over circular buffer contents.
//!
//! A [`ByteCursor`] borrows the backing bytes plus a read and a write offset,
//! both taken modulo the backing length. Every read checks the available
//! amount first and fails with [`DecodeError::Incomplete`] without moving the
//! read offset, so a failed read leaves the cursor exactly where it was.
//! Multi-byte primitives are big-endian.

use crate::error::DecodeError;

/// Longest VarInt encoding accepted (enough for 64-bit values).
pub const MAX_VARINT_BYTES: usize = 10;

/// Saved read offset, restored with [`ByteCursor::revert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot(usize);

impl Snapshot {
    /// The saved offset.
    pub fn offset(self) -> usize {
        self.0
    }
}

/// Borrowing cursor over a circular byte region `[read_offset, write_offset)`.
#[derive(Clone, Copy, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    read_offset: usize,
    write_offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor over `data` between the two offsets.
    pub fn new(data: &'a [u8], read_offset: usize, write_offset: usize) -> Self {
        debug_assert!(!data.is_empty());
        debug_assert!(read_offset < data.len() && write_offset < data.len());
        Self {
            data,
            read_offset,
            write_offset,
        }
    }

    /// Creates a cursor over a contiguous slice. The slice's final byte is
    /// the reserved slot and is never readable.
    pub fn over_slice(data: &'a [u8]) -> Self {
        Self::new(data, 0, data.len().saturating_sub(1))
    }

    /// Length of the backing storage.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current read offset.
    pub fn read_offset(&self) -> usize {
        self.read_offset
    }

    /// Offset where readable data ends.
    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    /// Bytes remaining between the read and write offsets.
    pub fn read_amount(&self) -> usize {
        (self.write_offset + self.data.len() - self.read_offset) % self.data.len()
    }

    /// Returns `true` when nothing is left to read.
    pub fn is_empty(&self) -> bool {
        self.read_offset == self.write_offset
    }

    /// Saves the current read offset.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.read_offset)
    }

    /// Restores a saved read offset.
    pub fn revert(&mut self, snapshot: Snapshot) {
        self.read_offset = snapshot.0;
    }

    /// Offset `n` bytes past the read offset, wrapped.
    pub fn offset_after(&self, n: usize) -> usize {
        (self.read_offset + n) % self.data.len()
    }

    /// Moves the read offset to `offset` unconditionally.
    pub fn seek(&mut self, offset: usize) {
        debug_assert!(offset < self.data.len());
        self.read_offset = offset % self.data.len();
    }

    /// A cursor over the next `len` bytes only.
    pub fn limit(&self, len: usize) -> Result<ByteCursor<'a>, DecodeError> {
        self.ensure(len)?;
        Ok(Self {
            data: self.data,
            read_offset: self.read_offset,
            write_offset: self.offset_after(len),
        })
    }

    /// Fails with [`DecodeError::Incomplete`] unless `n` bytes are readable.
    pub fn ensure(&self, n: usize) -> Result<(), DecodeError> {
        let available = self.read_amount();
        if available < n {
            return Err(DecodeError::Incomplete {
                needed: n,
                available,
            });
        }
        Ok(())
    }

    /// Advances past `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.ensure(n)?;
        self.read_offset = self.offset_after(n);
        Ok(())
    }

    /// Returns the next `n` bytes as up to two contiguous slices (the second
    /// is non-empty only when the region wraps) and advances past them.
    pub fn read_slices(&mut self, n: usize) -> Result<(&'a [u8], &'a [u8]), DecodeError> {
        self.ensure(n)?;
        let start = self.read_offset;
        let first = n.min(self.data.len() - start);
        let head = &self.data[start..start + first];
        let tail = &self.data[..n - first];
        self.read_offset = self.offset_after(n);
        Ok((head, tail))
    }

    /// Copies the next `n` bytes out.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, DecodeError> {
        let (head, tail) = self.read_slices(n)?;
        let mut out = Vec::with_capacity(n);
        out.extend_from_slice(head);
        out.extend_from_slice(tail);
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let (head, tail) = self.read_slices(N)?;
        let mut out = [0u8; N];
        out[..head.len()].copy_from_slice(head);
        out[head.len()..].copy_from_slice(tail);
        Ok(out)
    }

    // --- Fixed-width primitives ---

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a boolean byte (any non-zero value is `true`).
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian `i64`.
    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian IEEE-754 `f32`.
    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian IEEE-754 `f64`.
    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    // --- Variable-length values ---

    /// Reads a VarInt of up to [`MAX_VARINT_BYTES`] bytes.
    ///
    /// A truncated encoding fails with [`DecodeError::Incomplete`] and leaves
    /// the cursor unmoved. An encoding whose continuation bit is still set on
    /// the last permitted byte is [`DecodeError::MalformedVarInt`].
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let available = self.read_amount();
        let mut value = 0u64;
        let mut offset = self.read_offset;

        for i in 0..MAX_VARINT_BYTES {
            if i >= available {
                return Err(DecodeError::Incomplete {
                    needed: i + 1,
                    available,
                });
            }
            let byte = self.data[offset];
            offset = (offset + 1) % self.data.len();
            value |= u64::from(byte & 0x7F) << (7 * i);

            if byte & 0x80 == 0 {
                self.read_offset = offset;
                return Ok(value);
            }
        }

        Err(DecodeError::MalformedVarInt {
            max_bytes: MAX_VARINT_BYTES,
        })
    }

    /// Reads a VarInt and reinterprets its low 32 bits as a signed value.
    pub fn read_var_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_varint()? as u32 as i32)
    }

    /// Reads a VarInt length and narrows it to `usize`, saturating.
    pub fn read_length(&mut self) -> Result<usize, DecodeError> {
        Ok(usize::try_from(self.read_varint()?).unwrap_or(usize::MAX))
    }

    /// Reads a VarInt-prefixed UTF-8 string of at most `max_len` bytes.
    ///
    /// A declared length above `max_len` is [`DecodeError::OversizedString`].
    /// On [`DecodeError::Incomplete`] the cursor is left unmoved.
    pub fn read_string(&mut self, max_len: usize) -> Result<String, DecodeError> {
        let snapshot = self.snapshot();
        let length = self.read_varint()?;
        if length > max_len as u64 {
            return Err(DecodeError::OversizedString {
                length,
                max: max_len,
            });
        }
        match self.read_bytes(length as usize) {
            Ok(bytes) => Ok(String::from_utf8(bytes)?),
            Err(err) => {
                self.revert(snapshot);
                Err(err)
            }
        }
    }

    /// Reads `length` raw bytes as a (lossy) UTF-8 string.
    pub fn read_raw_string(&mut self, length: usize) -> Result<String, DecodeError> {
        let bytes = self.read_bytes(length)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
