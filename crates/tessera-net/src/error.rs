//! Decode error taxonomy.
//!
//! [`DecodeError::Incomplete`] is the only non-fatal variant: it means the
//! bytes needed have not arrived yet. Everything else is a malformed stream
//! that ends the connection.

use crate::compression::CompressionError;

/// Errors produced while reading protocol data.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not enough bytes are buffered yet.
    #[error("need {needed} bytes, {available} available")]
    Incomplete {
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were available.
        available: usize,
    },

    /// A VarInt ran past its maximum encoded length.
    #[error("malformed varint: continuation past {max_bytes} bytes")]
    MalformedVarInt {
        /// The maximum encoded length.
        max_bytes: usize,
    },

    /// A string declared a length above the caller's limit.
    #[error("oversized string: {length} bytes exceeds limit {max}")]
    OversizedString {
        /// Declared length.
        length: u64,
        /// Caller-supplied limit.
        max: usize,
    },

    /// A string was not valid UTF-8.
    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A packed block value pointed past the end of the section palette.
    #[error("palette index {index} out of range for palette of length {length}")]
    PaletteIndexOutOfRange {
        /// The decoded index.
        index: u64,
        /// The palette length.
        length: usize,
    },

    /// A section declared a bits-per-block value that cannot fit a block id.
    #[error("invalid bits per block: {0}")]
    InvalidBitsPerBlock(u8),

    /// A section's packed data held more values than a sub-chunk has cells.
    #[error("section data holds {values} values, more than {capacity}")]
    SectionOverflow {
        /// Values the packed words encode.
        values: u64,
        /// Cells in a sub-chunk.
        capacity: usize,
    },

    /// A tag-structured field carried an unexpected tag type.
    #[error("unexpected tag type {found}, expected {expected}")]
    UnexpectedTag {
        /// The required tag type.
        expected: u8,
        /// The tag type found.
        found: u8,
    },

    /// A length field was negative.
    #[error("negative length: {0}")]
    NegativeLength(i32),

    /// A frame declared a length the read buffer can never hold.
    #[error("frame of {length} bytes cannot fit buffer of capacity {capacity}")]
    FrameTooLarge {
        /// Declared frame length.
        length: u64,
        /// Usable buffer capacity.
        capacity: usize,
    },

    /// Inflating a compressed frame failed.
    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),
}

impl DecodeError {
    /// `true` for the "wait for more bytes" outcome.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }

    /// `true` for errors that must end the connection.
    pub fn is_fatal(&self) -> bool {
        !self.is_incomplete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let incomplete = DecodeError::Incomplete {
            needed: 8,
            available: 3,
        };
        assert!(incomplete.is_incomplete());
        assert!(!incomplete.is_fatal());

        let malformed = DecodeError::MalformedVarInt { max_bytes: 10 };
        assert!(malformed.is_fatal());

        let overflow = DecodeError::PaletteIndexOutOfRange {
            index: 5,
            length: 3,
        };
        assert!(overflow.is_fatal());
    }

    #[test]
    fn test_display() {
        let err = DecodeError::OversizedString {
            length: 40000,
            max: 32767,
        };
        assert_eq!(err.to_string(), "oversized string: 40000 bytes exceeds limit 32767");
    }
}
