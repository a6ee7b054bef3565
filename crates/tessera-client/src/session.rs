//! A play-state session: bytes in, world cache and meshes updated, replies out.
//!
//! [`Session::process`] runs one turn of the pipeline: every complete frame in
//! the read buffer is decoded and applied to the [`WorldCache`] in arrival
//! order, then the build scheduler meshes whatever columns became ready.
//! Replies (keep-alive echoes and teleport confirms) are encoded with the
//! current compression settings and pushed onto the outbound channel
//! synchronously while their packet is applied.

use crossbeam_channel::Sender;
use tessera_config::Config;
use tessera_mesh::{BuildPassResult, BuildScheduler, MeshConsumer, OpacityTable};
use tessera_net::{
    BlockRecord, ChunkData, ClientboundPacket, CompressionError, DecodeError, PacketDecoder,
    PayloadLimits, RingBuffer, ServerboundPacket,
};
use tessera_world::{ColumnCoord, WorldCache};

use crate::camera::ViewCamera;

/// Errors that end a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server sent a frame the decoder cannot recover from.
    #[error("protocol error: {0}")]
    Decode(#[from] DecodeError),

    /// A reply could not be encoded.
    #[error("failed to encode reply: {0}")]
    Encode(#[from] CompressionError),

    /// Nobody is listening for replies any more.
    #[error("outbound channel closed")]
    OutboundClosed,
}

/// Running counters for one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Packets applied.
    pub packets: u64,
    /// Chunk-data packets applied.
    pub chunks_loaded: u64,
    /// Partial chunk-data packets dropped because their column was not cached.
    pub ignored_chunks: u64,
    /// Unload packets applied.
    pub chunks_unloaded: u64,
    /// Block edits written to the cache.
    pub block_edits: u64,
    /// Block edits dropped because their column was not loaded.
    pub ignored_edits: u64,
    /// Keep-alives echoed.
    pub keep_alives: u64,
    /// Position updates confirmed.
    pub teleports: u64,
    /// Packets with ids the client does not interpret.
    pub unknown_packets: u64,
}

/// Outcome of one [`Session::process`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Frames consumed from the read buffer.
    pub frames: usize,
    /// Result of the build pass that followed.
    pub builds: BuildPassResult,
}

/// Everything packets mutate. Kept apart from the read buffer and decoder so
/// the decoder can borrow the buffer while packets are applied here.
struct SessionWorld<C> {
    cache: WorldCache,
    scheduler: BuildScheduler<OpacityTable>,
    consumer: C,
    camera: ViewCamera,
    outbound: Sender<Vec<u8>>,
    compression_threshold: Option<i32>,
    disconnect_reason: Option<String>,
    stats: SessionStats,
    failure: Option<SessionError>,
}

/// One connection's client-side state.
pub struct Session<C: MeshConsumer> {
    read_buffer: RingBuffer,
    decoder: PacketDecoder,
    world: SessionWorld<C>,
}

impl<C: MeshConsumer> Session<C> {
    /// Creates a session sized from `config`.
    ///
    /// Built geometry goes to `consumer`; encoded replies go to `outbound`.
    pub fn new(config: &Config, consumer: C, outbound: Sender<Vec<u8>>) -> Self {
        let limits = PayloadLimits {
            max_string_len: config.network.max_string_len,
        };
        let opacity = OpacityTable::new(
            config.world.hidden_block_ids.iter().copied(),
            config.world.transparent_block_ids.iter().copied(),
        );

        Self {
            read_buffer: RingBuffer::new(config.network.read_buffer_size),
            decoder: PacketDecoder::new(config.network.inflate_buffer_size, limits),
            world: SessionWorld {
                cache: WorldCache::new(config.world.cache_size),
                scheduler: BuildScheduler::new(opacity, config.mesh.max_builds_per_pass),
                consumer,
                camera: ViewCamera::default(),
                outbound,
                compression_threshold: None,
                disconnect_reason: None,
                stats: SessionStats::default(),
                failure: None,
            },
        }
    }

    /// Buffer the connection writes received bytes into.
    pub fn read_buffer_mut(&mut self) -> &mut RingBuffer {
        &mut self.read_buffer
    }

    /// Appends received bytes. Returns how many fit in the read buffer.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        self.read_buffer.write(bytes)
    }

    /// Decodes and applies every complete frame, then runs a build pass.
    pub fn process(&mut self) -> Result<ProcessSummary, SessionError> {
        let world = &mut self.world;
        let frames = self
            .decoder
            .decode(&mut self.read_buffer, |packet| world.apply(packet))?;

        if let Some(err) = self.world.failure.take() {
            return Err(err);
        }

        let builds = self
            .world
            .scheduler
            .run_pass(&mut self.world.cache, &mut self.world.consumer);
        Ok(ProcessSummary { frames, builds })
    }

    /// Releases every live mesh. The cache keeps its block data.
    pub fn shutdown(&mut self) {
        let meshes = self.world.cache.take_all_meshes();
        tracing::debug!("Releasing {} meshes", meshes.len());
        self.world.consumer.free_all(meshes);
    }

    /// Applies the settings that can change while connected.
    ///
    /// Only the build budget is live; buffer, cache and culling settings are
    /// read once in [`Session::new`].
    pub fn apply_config(&mut self, config: &Config) {
        let budget = config.mesh.max_builds_per_pass;
        if budget != self.world.scheduler.max_builds_per_pass() {
            tracing::info!("Build budget changed to {budget} columns per pass");
            self.world.scheduler.set_max_builds_per_pass(budget);
        }
    }

    /// The column cache.
    pub fn cache(&self) -> &WorldCache {
        &self.world.cache
    }

    /// The build scheduler.
    pub fn scheduler(&self) -> &BuildScheduler<OpacityTable> {
        &self.world.scheduler
    }

    /// The mesh consumer.
    pub fn consumer(&self) -> &C {
        &self.world.consumer
    }

    /// The view camera.
    pub fn camera(&self) -> &ViewCamera {
        &self.world.camera
    }

    /// Session counters.
    pub fn stats(&self) -> SessionStats {
        self.world.stats
    }

    /// Threshold from the server's set-compression packet, if one arrived.
    pub fn compression_threshold(&self) -> Option<i32> {
        self.world.compression_threshold
    }

    /// `true` once the server sent a disconnect.
    pub fn is_disconnected(&self) -> bool {
        self.world.disconnect_reason.is_some()
    }

    /// Reason given by the server's disconnect packet.
    pub fn disconnect_reason(&self) -> Option<&str> {
        self.world.disconnect_reason.as_deref()
    }
}

impl<C: MeshConsumer> SessionWorld<C> {
    fn apply(&mut self, packet: ClientboundPacket) {
        if self.failure.is_some() {
            return;
        }
        self.stats.packets += 1;
        if let Err(err) = self.handle(packet) {
            self.failure = Some(err);
        }
    }

    fn handle(&mut self, packet: ClientboundPacket) -> Result<(), SessionError> {
        match packet {
            ClientboundPacket::SetCompression { threshold } => {
                self.compression_threshold = Some(threshold);
            }
            ClientboundPacket::Chat(message) => {
                tracing::info!("Chat [{}]: {}", message.position, message.json);
            }
            ClientboundPacket::Disconnect { reason } => {
                tracing::info!("Disconnected by server: {reason}");
                self.disconnect_reason = Some(reason);
            }
            ClientboundPacket::KeepAlive { id } => {
                self.send(ServerboundPacket::KeepAlive { id })?;
                self.stats.keep_alives += 1;
            }
            ClientboundPacket::PositionAndLook(update) => {
                self.send(ServerboundPacket::TeleportConfirm {
                    teleport_id: update.teleport_id,
                })?;
                self.camera.apply(&update);
                self.stats.teleports += 1;
            }
            ClientboundPacket::BlockChange { position, block_id } => {
                self.apply_edits(&[BlockRecord { position, block_id }]);
            }
            ClientboundPacket::MultiBlockChange(change) => {
                self.apply_edits(&change.records);
            }
            ClientboundPacket::ChunkData(chunk) => self.load_chunk(chunk),
            ClientboundPacket::UnloadChunk { column } => self.unload_chunk(column),
            ClientboundPacket::Unknown { id } => {
                self.stats.unknown_packets += 1;
                tracing::trace!("Skipped packet 0x{id:02X}");
            }
        }
        Ok(())
    }

    fn send(&mut self, packet: ServerboundPacket) -> Result<(), SessionError> {
        let frame = packet.encode(self.compression_threshold)?;
        self.outbound
            .send(frame)
            .map_err(|_| SessionError::OutboundClosed)
    }

    fn load_chunk(&mut self, chunk: ChunkData) {
        let ChunkData {
            column,
            full,
            sections,
            block_entity_count,
            ..
        } = chunk;

        let Some(evicted) = self.cache.begin_column_load(column, full) else {
            self.stats.ignored_chunks += 1;
            tracing::debug!(
                "Partial chunk data for ({}, {}) ignored: column not cached",
                column.x,
                column.z
            );
            return;
        };
        if !evicted.is_empty() {
            tracing::debug!("Releasing {} meshes of an evicted column", evicted.len());
            self.consumer.free_all(evicted);
        }

        for (index, section) in sections {
            let solid = !section.is_empty();
            if self.cache.store_section(column, index, section) && solid {
                self.cache.mark_subchunk_present(column, index);
            }
        }
        self.cache.finish_column_load(column);
        self.scheduler.enqueue(column);
        self.stats.chunks_loaded += 1;

        if block_entity_count > 0 {
            tracing::debug!(
                "Column ({}, {}) carries {block_entity_count} block entities",
                column.x,
                column.z
            );
        }
    }

    fn unload_chunk(&mut self, column: ColumnCoord) {
        self.scheduler.remove(column);
        let meshes = self.cache.unload_column(column);
        self.consumer.free_all(meshes);
        self.stats.chunks_unloaded += 1;
    }

    fn apply_edits(&mut self, records: &[BlockRecord]) {
        let mut edits = Vec::with_capacity(records.len());
        for record in records {
            match self.cache.apply_block(record.position, record.block_id) {
                Some(edit) => edits.push(edit),
                None => {
                    self.stats.ignored_edits += 1;
                    tracing::warn!(
                        "Block change at ({}, {}, {}) ignored: column not loaded",
                        record.position.x,
                        record.position.y,
                        record.position.z
                    );
                }
            }
        }
        if edits.is_empty() {
            return;
        }

        self.stats.block_edits += edits.len() as u64;
        self.scheduler
            .on_block_edits(&mut self.cache, &edits, &mut self.consumer);
    }
}
