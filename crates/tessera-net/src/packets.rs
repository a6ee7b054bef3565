//! Clientbound play-state packets and their payload parsers.

use tessera_world::{BlockPos, ColumnCoord, SECTIONS_PER_COLUMN, SubChunk};

use crate::chunk_data::read_section;
use crate::cursor::ByteCursor;
use crate::error::DecodeError;
use crate::varint::{SectionPos, unpack_block_position, unpack_section_position};

/// Clientbound packet ids handled by the decoder.
pub mod ids {
    /// Block change.
    pub const BLOCK_CHANGE: u64 = 0x0B;
    /// Chat message.
    pub const CHAT: u64 = 0x0E;
    /// Disconnect with reason.
    pub const DISCONNECT: u64 = 0x19;
    /// Unload chunk column.
    pub const UNLOAD_CHUNK: u64 = 0x1C;
    /// Keep-alive.
    pub const KEEP_ALIVE: u64 = 0x1F;
    /// Chunk data.
    pub const CHUNK_DATA: u64 = 0x20;
    /// Player position and look.
    pub const POSITION_AND_LOOK: u64 = 0x34;
    /// Multi block change.
    pub const MULTI_BLOCK_CHANGE: u64 = 0x3B;
    /// Set compression.
    pub const SET_COMPRESSION: u64 = 0x03;
}

/// A decoded chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    /// JSON chat component.
    pub json: String,
    /// Display position (0 chat, 1 system, 2 game info).
    pub position: u8,
    /// Sender UUID, when the frame carries one.
    pub sender: Option<u128>,
}

/// Relative-component flags of [`PositionAndLook`].
pub mod relative {
    /// X is relative.
    pub const X: u8 = 0x01;
    /// Y is relative.
    pub const Y: u8 = 0x02;
    /// Z is relative.
    pub const Z: u8 = 0x04;
    /// Yaw is relative.
    pub const YAW: u8 = 0x08;
    /// Pitch is relative.
    pub const PITCH: u8 = 0x10;
}

/// Server-authoritative player position and orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionAndLook {
    /// Feet X.
    pub x: f64,
    /// Feet Y.
    pub y: f64,
    /// Feet Z.
    pub z: f64,
    /// Yaw in degrees.
    pub yaw: f32,
    /// Pitch in degrees.
    pub pitch: f32,
    /// Bitfield of [`relative`] flags.
    pub flags: u8,
    /// Id to echo back in a teleport confirm.
    pub teleport_id: u64,
}

/// One entry of a multi block change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRecord {
    /// World position of the block.
    pub position: BlockPos,
    /// New block-state id.
    pub block_id: u32,
}

/// Several block changes inside one sub-chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiBlockChange {
    /// Sub-chunk the records belong to.
    pub section: SectionPos,
    /// Whether the server asks lighting edges to be trusted.
    pub trust_edges: bool,
    /// Block edits in packet order.
    pub records: Vec<BlockRecord>,
}

/// A streamed chunk column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkData {
    /// Column coordinate.
    pub column: ColumnCoord,
    /// Whether this packet carries the whole column.
    pub full: bool,
    /// Sub-chunks carried, bit `i` for sub-chunk `i`.
    pub bitmask: u16,
    /// Biome ids, present on full columns.
    pub biomes: Vec<i32>,
    /// Decoded sub-chunks with their vertical index, in ascending order.
    pub sections: Vec<(usize, SubChunk)>,
    /// Number of trailing block entities (payloads are not interpreted).
    pub block_entity_count: u64,
}

/// A decoded clientbound packet.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientboundPacket {
    /// Switches the stream to compressed frames.
    SetCompression {
        /// Size at which outbound bodies should be compressed.
        threshold: i32,
    },
    /// Chat message for display.
    Chat(ChatMessage),
    /// Server closed the session.
    Disconnect {
        /// JSON reason.
        reason: String,
    },
    /// Liveness probe that must be echoed.
    KeepAlive {
        /// Id to echo.
        id: u64,
    },
    /// Authoritative position update that must be confirmed.
    PositionAndLook(PositionAndLook),
    /// Single block edit.
    BlockChange {
        /// World position.
        position: BlockPos,
        /// New block-state id.
        block_id: u32,
    },
    /// Batch of block edits in one sub-chunk.
    MultiBlockChange(MultiBlockChange),
    /// Column data.
    ChunkData(ChunkData),
    /// Column leaving view.
    UnloadChunk {
        /// Column to unload.
        column: ColumnCoord,
    },
    /// Any id the client does not interpret.
    Unknown {
        /// Packet id.
        id: u64,
    },
}

/// Limits applied while parsing payloads.
#[derive(Clone, Copy, Debug)]
pub struct PayloadLimits {
    /// Longest string accepted, in bytes.
    pub max_string_len: usize,
}

impl Default for PayloadLimits {
    fn default() -> Self {
        Self {
            max_string_len: 32767,
        }
    }
}

/// Parses the payload of packet `id`. `cursor` is bounded to the frame.
pub fn parse_packet(
    id: u64,
    cursor: &mut ByteCursor<'_>,
    limits: &PayloadLimits,
) -> Result<ClientboundPacket, DecodeError> {
    let packet = match id {
        ids::SET_COMPRESSION => ClientboundPacket::SetCompression {
            threshold: cursor.read_var_i32()?,
        },
        ids::CHAT => ClientboundPacket::Chat(read_chat(cursor, limits)?),
        ids::DISCONNECT => ClientboundPacket::Disconnect {
            reason: cursor.read_string(limits.max_string_len)?,
        },
        ids::KEEP_ALIVE => ClientboundPacket::KeepAlive {
            id: cursor.read_u64()?,
        },
        ids::POSITION_AND_LOOK => ClientboundPacket::PositionAndLook(PositionAndLook {
            x: cursor.read_f64()?,
            y: cursor.read_f64()?,
            z: cursor.read_f64()?,
            yaw: cursor.read_f32()?,
            pitch: cursor.read_f32()?,
            flags: cursor.read_u8()?,
            teleport_id: cursor.read_varint()?,
        }),
        ids::BLOCK_CHANGE => ClientboundPacket::BlockChange {
            position: unpack_block_position(cursor.read_u64()?),
            block_id: cursor.read_varint()? as u32,
        },
        ids::MULTI_BLOCK_CHANGE => ClientboundPacket::MultiBlockChange(read_multi_block(cursor)?),
        ids::CHUNK_DATA => ClientboundPacket::ChunkData(read_chunk_data(cursor)?),
        ids::UNLOAD_CHUNK => ClientboundPacket::UnloadChunk {
            column: ColumnCoord::new(cursor.read_i32()?, cursor.read_i32()?),
        },
        id => ClientboundPacket::Unknown { id },
    };
    Ok(packet)
}

fn read_chat(
    cursor: &mut ByteCursor<'_>,
    limits: &PayloadLimits,
) -> Result<ChatMessage, DecodeError> {
    let json = cursor.read_string(limits.max_string_len)?;
    let position = cursor.read_u8()?;
    let sender = if cursor.read_amount() >= 16 {
        let high = u128::from(cursor.read_u64()?);
        let low = u128::from(cursor.read_u64()?);
        Some(high << 64 | low)
    } else {
        None
    };
    Ok(ChatMessage {
        json,
        position,
        sender,
    })
}

fn read_multi_block(cursor: &mut ByteCursor<'_>) -> Result<MultiBlockChange, DecodeError> {
    let section = unpack_section_position(cursor.read_u64()?);
    let trust_edges = cursor.read_bool()?;
    let count = cursor.read_length()?;
    // Each record takes at least one byte.
    cursor.ensure(count)?;

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let data = cursor.read_varint()?;
        records.push(BlockRecord {
            position: section.block(
                ((data >> 8) & 0xF) as u8,
                (data & 0xF) as u8,
                ((data >> 4) & 0xF) as u8,
            ),
            block_id: (data >> 12) as u32,
        });
    }

    Ok(MultiBlockChange {
        section,
        trust_edges,
        records,
    })
}

// --- Chunk data ---

const TAG_END: u8 = 0;
const TAG_COMPOUND: u8 = 10;
const TAG_LONG_ARRAY: u8 = 12;

/// Long-array entries in the heightmap compound.
const HEIGHTMAP_ARRAYS: usize = 2;

fn expect_tag(cursor: &mut ByteCursor<'_>, expected: u8) -> Result<(), DecodeError> {
    let found = cursor.read_u8()?;
    if found != expected {
        return Err(DecodeError::UnexpectedTag { expected, found });
    }
    Ok(())
}

/// Advances over the heightmap compound without interpreting it.
fn skip_heightmaps(cursor: &mut ByteCursor<'_>) -> Result<(), DecodeError> {
    expect_tag(cursor, TAG_COMPOUND)?;
    let name_len = cursor.read_u16()?;
    cursor.skip(usize::from(name_len))?;

    for _ in 0..HEIGHTMAP_ARRAYS {
        expect_tag(cursor, TAG_LONG_ARRAY)?;
        let name_len = cursor.read_u16()?;
        let name = cursor.read_raw_string(usize::from(name_len))?;
        let count = cursor.read_i32()?;
        let count = usize::try_from(count).map_err(|_| DecodeError::NegativeLength(count))?;
        cursor.skip(count.saturating_mul(8))?;
        tracing::trace!("Skipped heightmap {name} ({count} longs)");
    }

    expect_tag(cursor, TAG_END)
}

fn read_chunk_data(cursor: &mut ByteCursor<'_>) -> Result<ChunkData, DecodeError> {
    let column = ColumnCoord::new(cursor.read_i32()?, cursor.read_i32()?);
    let full = cursor.read_bool()?;
    let bitmask = cursor.read_varint()? as u16;

    skip_heightmaps(cursor)?;

    let mut biomes = Vec::new();
    if full {
        let length = cursor.read_length()?;
        cursor.ensure(length)?;
        biomes.reserve(length);
        for _ in 0..length {
            biomes.push(cursor.read_var_i32()?);
        }
    }

    // The declared size may exceed the encoded sections; only it is trusted
    // for finding the block entity count.
    let data_size = cursor.read_length()?;
    let mut data = cursor.limit(data_size)?;
    let data_end = cursor.offset_after(data_size);

    let mut sections = Vec::with_capacity(bitmask.count_ones() as usize);
    if data_size > 0 {
        for index in 0..SECTIONS_PER_COLUMN {
            if bitmask & (1 << index) != 0 {
                sections.push((index, read_section(&mut data)?));
            }
        }
    }
    cursor.seek(data_end);

    let block_entity_count = cursor.read_varint()?;

    Ok(ChunkData {
        column,
        full,
        bitmask,
        biomes,
        sections,
        block_entity_count,
    })
}
