//! Frame decoder: turns buffered bytes into clientbound packets.
//!
//! Every frame is a VarInt length followed by that many bytes. After
//! set-compression, the frame body starts with a VarInt uncompressed length;
//! non-zero means the remainder is a zlib stream that is inflated into a
//! scratch buffer before the packet id and payload are read from it.
//!
//! The decoder only consumes whole frames. After a frame is interpreted the
//! read offset is moved to the frame's end no matter how much the payload
//! parser actually read, so a short or inconsistent parse never shifts later
//! frame boundaries.

use crate::compression::inflate_into;
use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::packets::{ClientboundPacket, PayloadLimits, parse_packet};
use crate::ring_buffer::RingBuffer;
use crate::varint::varint_len;

/// Default scratch capacity for inflated frames.
pub const DEFAULT_INFLATE_BUFFER_SIZE: usize = 65536 * 32;

/// Stateful decoder for one connection.
#[derive(Debug)]
pub struct PacketDecoder {
    /// `Some(threshold)` once the server switched compression on.
    compression: Option<i32>,
    scratch: RingBuffer,
    limits: PayloadLimits,
}

impl PacketDecoder {
    /// Creates a decoder in uncompressed mode.
    ///
    /// The scratch buffer holds up to `inflate_buffer_size - 1` inflated bytes.
    pub fn new(inflate_buffer_size: usize, limits: PayloadLimits) -> Self {
        Self {
            compression: None,
            scratch: RingBuffer::new(inflate_buffer_size.max(2)),
            limits,
        }
    }

    /// Returns `true` once compression has been switched on.
    pub fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }

    /// Threshold announced by the server, once compression is on.
    pub fn compression_threshold(&self) -> Option<i32> {
        self.compression
    }

    /// Decodes every complete frame in `buffer`, handing packets to
    /// `on_packet` in arrival order.
    ///
    /// Stops at the first incomplete frame and leaves its bytes buffered.
    /// Returns the number of frames consumed. A malformed frame is consumed
    /// and its error returned; the connection cannot continue after that.
    pub fn decode(
        &mut self,
        buffer: &mut RingBuffer,
        mut on_packet: impl FnMut(ClientboundPacket),
    ) -> Result<usize, DecodeError> {
        let mut frames = 0;

        loop {
            let mut cursor = buffer.cursor();
            if cursor.is_empty() {
                break;
            }

            let length = match cursor.read_varint() {
                Ok(length) => length,
                Err(err) if err.is_incomplete() => break,
                Err(err) => return Err(err),
            };

            let capacity = buffer.max_len();
            if (varint_len(length) as u64).saturating_add(length) > capacity as u64 {
                return Err(DecodeError::FrameTooLarge { length, capacity });
            }
            let length = length as usize;
            if cursor.read_amount() < length {
                break;
            }

            let frame_end = cursor.offset_after(length);
            let mut frame = cursor.limit(length)?;
            let result = self.decode_frame(&mut frame);
            buffer.commit(frame_end);
            frames += 1;

            match result {
                Ok(packet) => {
                    if let ClientboundPacket::SetCompression { threshold } = packet {
                        self.enable_compression(threshold);
                    }
                    on_packet(packet);
                }
                Err(err) if err.is_incomplete() => {
                    tracing::debug!("Frame of {length} bytes ended before its payload did: {err}");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(frames)
    }

    fn enable_compression(&mut self, threshold: i32) {
        if self.compression.is_none() {
            tracing::info!("Compression enabled (threshold {threshold})");
        }
        self.compression = Some(threshold);
    }

    fn decode_frame(
        &mut self,
        frame: &mut ByteCursor<'_>,
    ) -> Result<ClientboundPacket, DecodeError> {
        if self.compression.is_some() {
            let data_length = frame.read_length()?;
            if data_length > 0 {
                let (head, tail) = frame.read_slices(frame.read_amount())?;
                inflate_into(head, tail, data_length, &mut self.scratch)?;
                let mut body = self.scratch.cursor();
                return read_body(&mut body, &self.limits);
            }
        }
        read_body(frame, &self.limits)
    }
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_INFLATE_BUFFER_SIZE, PayloadLimits::default())
    }
}

fn read_body(
    body: &mut ByteCursor<'_>,
    limits: &PayloadLimits,
) -> Result<ClientboundPacket, DecodeError> {
    let id = body.read_varint()?;
    let packet = parse_packet(id, body, limits)?;
    tracing::trace!("Packet 0x{id:02X}: {} bytes unread", body.read_amount());
    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::ids;
    use crate::serverbound::encode_frame;
    use crate::varint::write_varint;

    fn keep_alive(id: u64, threshold: Option<i32>) -> Vec<u8> {
        encode_frame(ids::KEEP_ALIVE, &id.to_be_bytes(), threshold).expect("encodes")
    }

    fn set_compression(threshold: i32) -> Vec<u8> {
        let mut payload = Vec::new();
        write_varint(&mut payload, threshold as u32 as u64);
        encode_frame(ids::SET_COMPRESSION, &payload, None).expect("encodes")
    }

    fn decode_all(decoder: &mut PacketDecoder, buffer: &mut RingBuffer) -> Vec<ClientboundPacket> {
        let mut packets = Vec::new();
        decoder
            .decode(buffer, |packet| packets.push(packet))
            .expect("well-formed stream");
        packets
    }

    #[test]
    fn test_decodes_consecutive_frames() {
        let mut buffer = RingBuffer::new(256);
        buffer.write(&keep_alive(1, None));
        buffer.write(&keep_alive(2, None));

        let mut decoder = PacketDecoder::default();
        let packets = decode_all(&mut decoder, &mut buffer);
        assert_eq!(
            packets,
            vec![
                ClientboundPacket::KeepAlive { id: 1 },
                ClientboundPacket::KeepAlive { id: 2 }
            ]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_frame_waits() {
        let frame = keep_alive(9, None);
        let mut buffer = RingBuffer::new(256);
        let mut decoder = PacketDecoder::default();

        buffer.write(&frame[..5]);
        assert!(decode_all(&mut decoder, &mut buffer).is_empty());
        assert_eq!(buffer.read_amount(), 5, "incomplete frame stays buffered");

        buffer.write(&frame[5..]);
        assert_eq!(
            decode_all(&mut decoder, &mut buffer),
            vec![ClientboundPacket::KeepAlive { id: 9 }]
        );
    }

    #[test]
    fn test_byte_by_byte_delivery() {
        let mut stream = Vec::new();
        for id in 0..20 {
            stream.extend(keep_alive(id, None));
        }

        let mut buffer = RingBuffer::new(32);
        let mut decoder = PacketDecoder::default();
        let mut packets = Vec::new();
        for byte in stream {
            assert_eq!(buffer.write(&[byte]), 1);
            decoder
                .decode(&mut buffer, |packet| packets.push(packet))
                .expect("well-formed stream");
        }

        let expected: Vec<_> = (0..20).map(|id| ClientboundPacket::KeepAlive { id }).collect();
        assert_eq!(packets, expected);
    }

    #[test]
    fn test_under_read_is_contained() {
        // Keep-alive with 4 extra bytes, then one with a truncated payload.
        let mut padded = 0x55u64.to_be_bytes().to_vec();
        padded.extend_from_slice(&[1, 2, 3, 4]);
        let mut buffer = RingBuffer::new(256);
        buffer.write(&encode_frame(ids::KEEP_ALIVE, &padded, None).expect("encodes"));
        buffer.write(&encode_frame(ids::KEEP_ALIVE, &[1, 2], None).expect("encodes"));
        buffer.write(&keep_alive(7, None));

        let mut decoder = PacketDecoder::default();
        let mut packets = Vec::new();
        let frames = decoder
            .decode(&mut buffer, |packet| packets.push(packet))
            .expect("contained");
        assert_eq!(frames, 3);
        assert_eq!(
            packets,
            vec![
                ClientboundPacket::KeepAlive { id: 0x55 },
                ClientboundPacket::KeepAlive { id: 7 }
            ]
        );
    }

    #[test]
    fn test_unknown_ids_skipped() {
        let mut buffer = RingBuffer::new(256);
        buffer.write(&encode_frame(0x6A, &[9; 30], None).expect("encodes"));
        buffer.write(&keep_alive(3, None));

        let mut decoder = PacketDecoder::default();
        assert_eq!(
            decode_all(&mut decoder, &mut buffer),
            vec![
                ClientboundPacket::Unknown { id: 0x6A },
                ClientboundPacket::KeepAlive { id: 3 }
            ]
        );
    }

    #[test]
    fn test_compression_switch() {
        let mut buffer = RingBuffer::new(4096);
        buffer.write(&set_compression(16));
        // Small body: data length 0, stays uncompressed.
        buffer.write(&keep_alive(1, Some(16)));
        // Force compression of a keep-alive body.
        buffer.write(&keep_alive(2, Some(1)));

        let mut decoder = PacketDecoder::default();
        let packets = decode_all(&mut decoder, &mut buffer);
        assert_eq!(
            packets,
            vec![
                ClientboundPacket::SetCompression { threshold: 16 },
                ClientboundPacket::KeepAlive { id: 1 },
                ClientboundPacket::KeepAlive { id: 2 },
            ]
        );
        assert!(decoder.is_compressed());
        assert_eq!(decoder.compression_threshold(), Some(16));
    }

    #[test]
    fn test_corrupt_compressed_frame_is_fatal_and_consumed() {
        let mut buffer = RingBuffer::new(256);
        buffer.write(&set_compression(0));
        // length 5: data length 9, then garbage.
        buffer.write(&[5, 9, 0xDE, 0xAD, 0xBE, 0xEF]);

        let mut decoder = PacketDecoder::default();
        let err = decoder.decode(&mut buffer, |_| {}).expect_err("corrupt zlib");
        assert!(matches!(err, DecodeError::Compression(_)));
        assert!(buffer.is_empty(), "offending frame is consumed");
    }

    #[test]
    fn test_frame_too_large() {
        let mut buffer = RingBuffer::new(64);
        let mut header = Vec::new();
        write_varint(&mut header, 1000);
        buffer.write(&header);

        let mut decoder = PacketDecoder::default();
        assert!(matches!(
            decoder.decode(&mut buffer, |_| {}),
            Err(DecodeError::FrameTooLarge { length: 1000, .. })
        ));
    }

    #[test]
    fn test_malformed_length_is_fatal() {
        let mut buffer = RingBuffer::new(64);
        buffer.write(&[0xFF; 11]);
        let mut decoder = PacketDecoder::default();
        assert!(matches!(
            decoder.decode(&mut buffer, |_| {}),
            Err(DecodeError::MalformedVarInt { .. })
        ));
    }

    #[test]
    fn test_frames_wrap_around_ring() {
        let mut buffer = RingBuffer::new(24);
        let mut decoder = PacketDecoder::default();
        let mut packets = Vec::new();
        for id in 0..10 {
            buffer.write(&keep_alive(id, None));
            decoder
                .decode(&mut buffer, |packet| packets.push(packet))
                .expect("well-formed stream");
        }
        assert_eq!(packets.len(), 10);
        assert_eq!(packets[9], ClientboundPacket::KeepAlive { id: 9 });
    }
}
