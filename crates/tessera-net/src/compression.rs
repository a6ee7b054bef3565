//! Zlib handling for compressed frames.
//!
//! Once compression is switched on, every frame carries its uncompressed
//! length. A non-zero length means the rest of the frame is a zlib stream
//! that inflates to exactly that many bytes.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::ring_buffer::RingBuffer;

/// Errors that can occur while inflating or deflating a frame body.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    /// The zlib stream was corrupt.
    #[error("inflate failed: {0}")]
    Inflate(#[source] io::Error),

    /// The stream inflated to a different size than the frame declared.
    #[error("inflated {actual} bytes, frame declared {declared}")]
    SizeMismatch {
        /// Declared uncompressed length.
        declared: usize,
        /// Bytes the stream actually produced.
        actual: usize,
    },

    /// The declared uncompressed length cannot fit the scratch buffer.
    #[error("declared size {declared} exceeds scratch capacity {capacity}")]
    ScratchOverflow {
        /// Declared uncompressed length.
        declared: usize,
        /// Usable scratch capacity.
        capacity: usize,
    },

    /// Compressing an outbound body failed.
    #[error("deflate failed: {0}")]
    Deflate(#[source] io::Error),
}

/// Inflates the compressed bytes `head ++ tail` into `scratch`.
///
/// `scratch` is emptied first and afterwards holds exactly `declared` bytes
/// starting at offset 0.
pub fn inflate_into(
    head: &[u8],
    tail: &[u8],
    declared: usize,
    scratch: &mut RingBuffer,
) -> Result<usize, CompressionError> {
    let capacity = scratch.max_len();
    if declared > capacity {
        return Err(CompressionError::ScratchOverflow { declared, capacity });
    }

    scratch.refill(|out| {
        let mut decoder = ZlibDecoder::new(head.chain(tail));
        let target = &mut out[..declared];
        let mut filled = 0;
        while filled < declared {
            match decoder.read(&mut target[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(CompressionError::Inflate(err)),
            }
        }

        let surplus = io::copy(&mut decoder, &mut io::sink()).map_err(CompressionError::Inflate)?;
        if filled != declared || surplus > 0 {
            return Err(CompressionError::SizeMismatch {
                declared,
                actual: filled + surplus as usize,
            });
        }
        Ok(filled)
    })
}

/// Compresses `data` into a standalone zlib stream.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(CompressionError::Deflate)?;
    encoder.finish().map_err(CompressionError::Deflate)
}
