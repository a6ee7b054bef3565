//! Play-state protocol plumbing: circular read buffer, byte cursor, VarInts,
//! zlib frames, clientbound packet parsing, serverbound encoding, and the TCP
//! connection that feeds it all.

pub mod chunk_data;
pub mod compression;
pub mod connection;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod packets;
pub mod ring_buffer;
pub mod serverbound;
pub mod varint;

pub use compression::CompressionError;
pub use connection::{ConnectionError, ConnectionState, ServerConnection};
pub use cursor::{ByteCursor, Snapshot};
pub use decoder::{DEFAULT_INFLATE_BUFFER_SIZE, PacketDecoder};
pub use error::DecodeError;
pub use packets::{
    BlockRecord, ChatMessage, ChunkData, ClientboundPacket, MultiBlockChange, PayloadLimits,
    PositionAndLook,
};
pub use ring_buffer::RingBuffer;
pub use serverbound::{ServerboundPacket, encode_frame};
pub use varint::{SectionPos, extend_sign, write_varint};
