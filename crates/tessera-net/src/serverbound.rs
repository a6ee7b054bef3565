//! Serverbound packets the client answers with, and frame encoding.

use crate::compression::{CompressionError, deflate};
use crate::varint::write_varint;

/// Serverbound packet ids.
pub mod ids {
    /// Teleport confirm.
    pub const TELEPORT_CONFIRM: u64 = 0x00;
    /// Keep-alive echo.
    pub const KEEP_ALIVE: u64 = 0x10;
}

/// Packets the client sends back to the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerboundPacket {
    /// Acknowledges a position-and-look.
    TeleportConfirm {
        /// Id from the position-and-look packet.
        teleport_id: u64,
    },
    /// Echo of a received keep-alive.
    KeepAlive {
        /// Id from the keep-alive packet.
        id: u64,
    },
}

impl ServerboundPacket {
    /// Wire id of this packet.
    pub fn id(&self) -> u64 {
        match self {
            Self::TeleportConfirm { .. } => ids::TELEPORT_CONFIRM,
            Self::KeepAlive { .. } => ids::KEEP_ALIVE,
        }
    }

    /// Appends the payload (without id) to `out`.
    pub fn encode_payload(&self, out: &mut Vec<u8>) {
        match *self {
            Self::TeleportConfirm { teleport_id } => write_varint(out, teleport_id),
            Self::KeepAlive { id } => out.extend_from_slice(&id.to_be_bytes()),
        }
    }

    /// Encodes a complete frame. See [`encode_frame`].
    pub fn encode(&self, compression_threshold: Option<i32>) -> Result<Vec<u8>, CompressionError> {
        let mut payload = Vec::with_capacity(9);
        self.encode_payload(&mut payload);
        encode_frame(self.id(), &payload, compression_threshold)
    }
}

/// Encodes a length-prefixed frame for packet `id`.
///
/// Without a threshold the frame is `length | id | payload`. With one, the
/// frame also carries the uncompressed body length: bodies of at least
/// `threshold` bytes are zlib-compressed, smaller ones (and every body when
/// the threshold is negative) are sent as-is with a data length of 0.
pub fn encode_frame(
    id: u64,
    payload: &[u8],
    compression_threshold: Option<i32>,
) -> Result<Vec<u8>, CompressionError> {
    let mut body = Vec::with_capacity(payload.len() + 2);
    write_varint(&mut body, id);
    body.extend_from_slice(payload);

    let inner = match compression_threshold {
        None => body,
        Some(threshold) => {
            let mut inner = Vec::with_capacity(body.len() + 3);
            let compress = usize::try_from(threshold).is_ok_and(|t| body.len() >= t);
            if compress {
                write_varint(&mut inner, body.len() as u64);
                inner.extend_from_slice(&deflate(&body)?);
            } else {
                write_varint(&mut inner, 0);
                inner.extend_from_slice(&body);
            }
            inner
        }
    };

    let mut frame = Vec::with_capacity(inner.len() + 3);
    write_varint(&mut frame, inner.len() as u64);
    frame.extend_from_slice(&inner);
    Ok(frame)
}
