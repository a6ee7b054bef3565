//! Neighbor-gated mesh build scheduler.
//!
//! Columns wait in a [`BuildQueue`] until all four horizontal neighbors are
//! resident, because the halo of every sub-chunk reads from them. A pass then
//! builds every sub-chunk of each ready column. Block edits bypass the queue
//! and rebuild just the affected sub-chunks when the column is already built.

use rustc_hash::FxHashSet;
use tessera_world::{
    BlockEdit, BuildQueue, ColumnCoord, MeshBuffer, SECTIONS_PER_COLUMN, WorldCache,
};

use crate::bordered::BorderedVolume;
use crate::consumer::MeshConsumer;
use crate::invalidation::MeshInvalidator;
use crate::mesher::{SubChunkMesh, mesh_subchunk, subchunk_origin};
use crate::opacity::{BlockOpacity, OpacityTable};

/// Outcome of one [`BuildScheduler::run_pass`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildPassResult {
    /// Columns meshed and removed from the queue.
    pub built: u32,
    /// Columns left pending because a neighbor is missing.
    pub deferred: u32,
    /// Pending columns dropped because they are no longer resident.
    pub dropped: u32,
}

/// Outcome of [`BuildScheduler::on_block_edit`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EditRebuild {
    /// Sub-chunks rebuilt immediately.
    pub rebuilt: u32,
    /// Columns queued because a neighbor was missing.
    pub queued: u32,
}

/// Drives (re)meshing of cached columns.
pub struct BuildScheduler<O: BlockOpacity = OpacityTable> {
    queue: BuildQueue,
    opacity: O,
    /// Upper bound on columns built per pass; `0` means unlimited.
    max_builds_per_pass: usize,
}

impl<O: BlockOpacity> BuildScheduler<O> {
    /// Creates a scheduler with an empty queue.
    pub fn new(opacity: O, max_builds_per_pass: usize) -> Self {
        Self {
            queue: BuildQueue::new(),
            opacity,
            max_builds_per_pass,
        }
    }

    /// Opacity table used for culling.
    pub fn opacity(&self) -> &O {
        &self.opacity
    }

    /// Upper bound on columns built per pass; `0` means unlimited.
    pub fn max_builds_per_pass(&self) -> usize {
        self.max_builds_per_pass
    }

    /// Changes the per-pass build budget.
    pub fn set_max_builds_per_pass(&mut self, max: usize) {
        self.max_builds_per_pass = max;
    }

    /// Pending columns.
    pub fn queue(&self) -> &BuildQueue {
        &self.queue
    }

    /// Queues `coord` for a full build. Returns `false` if already pending.
    pub fn enqueue(&mut self, coord: ColumnCoord) -> bool {
        let added = self.queue.push(coord);
        if added {
            tracing::trace!("Column ({}, {}) queued for meshing", coord.x, coord.z);
        }
        added
    }

    /// Drops `coord` from the queue. Returns `true` if it was pending.
    pub fn remove(&mut self, coord: ColumnCoord) -> bool {
        self.queue.remove(coord)
    }

    /// Returns `true` if `coord` is waiting for a full build.
    pub fn is_pending(&self, coord: ColumnCoord) -> bool {
        self.queue.contains(coord)
    }

    /// `true` when all four horizontal neighbors of `coord` are resident.
    pub fn neighbors_resident(cache: &WorldCache, coord: ColumnCoord) -> bool {
        coord
            .horizontal_neighbors()
            .into_iter()
            .all(|neighbor| cache.is_resident(neighbor))
    }

    /// Builds every pending column whose neighbors are resident.
    pub fn run_pass(
        &mut self,
        cache: &mut WorldCache,
        consumer: &mut impl MeshConsumer,
    ) -> BuildPassResult {
        let mut result = BuildPassResult::default();
        if self.queue.is_empty() {
            return result;
        }

        let budget = match self.max_builds_per_pass {
            0 => usize::MAX,
            n => n,
        };

        let mut finished = FxHashSet::default();
        for coord in self.queue.pending() {
            if !cache.is_resident(coord) {
                tracing::debug!(
                    "Dropping queued column ({}, {}): no longer resident",
                    coord.x,
                    coord.z
                );
                finished.insert(coord);
                result.dropped += 1;
                continue;
            }
            if (result.built as usize) >= budget || !Self::neighbors_resident(cache, coord) {
                result.deferred += 1;
                continue;
            }

            self.build_column(cache, coord, consumer);
            finished.insert(coord);
            result.built += 1;
        }

        if !finished.is_empty() {
            self.queue.retain(|coord| !finished.contains(&coord));
        }

        if result.built > 0 {
            tracing::debug!(
                "Build pass: {} built, {} deferred, {} pending",
                result.built,
                result.deferred,
                self.queue.len()
            );
        }
        result
    }

    /// Meshes all sub-chunks of `coord`. Sub-chunks without their presence
    /// bit get an empty mesh. Returns `false` if `coord` is not resident.
    pub fn build_column(
        &self,
        cache: &mut WorldCache,
        coord: ColumnCoord,
        consumer: &mut impl MeshConsumer,
    ) -> bool {
        let Some(presence) = cache.column(coord).map(|column| column.presence()) else {
            return false;
        };

        for section in 0..SECTIONS_PER_COLUMN {
            let mesh = if presence & (1 << section) != 0 {
                self.mesh_section(cache, coord, section)
            } else {
                None
            };
            install(cache, coord, section, mesh, consumer);
        }
        true
    }

    /// Rebuilds one sub-chunk of `coord`. Returns `false` if `coord` is not
    /// resident.
    pub fn rebuild_subchunk(
        &self,
        cache: &mut WorldCache,
        coord: ColumnCoord,
        section: usize,
        consumer: &mut impl MeshConsumer,
    ) -> bool {
        if section >= SECTIONS_PER_COLUMN || !cache.is_resident(coord) {
            return false;
        }
        let mesh = self.mesh_section(cache, coord, section);
        install(cache, coord, section, mesh, consumer)
    }

    /// Reacts to an applied block edit.
    ///
    /// Every sub-chunk whose mesh depends on the edited block is rebuilt now
    /// if its column is resident, not pending, and has resident neighbors.
    /// A resident column that lost a neighbor is queued instead. Pending
    /// columns are left to their full build.
    pub fn on_block_edit(
        &mut self,
        cache: &mut WorldCache,
        edit: &BlockEdit,
        consumer: &mut impl MeshConsumer,
    ) -> EditRebuild {
        self.on_block_edits(cache, std::slice::from_ref(edit), consumer)
    }

    /// [`BuildScheduler::on_block_edit`] for a batch, rebuilding each
    /// affected sub-chunk once.
    pub fn on_block_edits(
        &mut self,
        cache: &mut WorldCache,
        edits: &[BlockEdit],
        consumer: &mut impl MeshConsumer,
    ) -> EditRebuild {
        let mut outcome = EditRebuild::default();
        let mut seen = FxHashSet::default();

        for target in edits.iter().flat_map(MeshInvalidator::for_edit) {
            if !seen.insert(target) {
                continue;
            }
            if self.is_pending(target.column) || !cache.is_resident(target.column) {
                continue;
            }
            if Self::neighbors_resident(cache, target.column) {
                if self.rebuild_subchunk(cache, target.column, target.section, consumer) {
                    outcome.rebuilt += 1;
                }
            } else if self.enqueue(target.column) {
                outcome.queued += 1;
            }
        }
        outcome
    }

    fn mesh_section(
        &self,
        cache: &WorldCache,
        coord: ColumnCoord,
        section: usize,
    ) -> Option<SubChunkMesh> {
        let volume = BorderedVolume::gather(cache, coord, section)?;
        let mesh = mesh_subchunk(&volume, subchunk_origin(coord, section), &self.opacity);
        (!mesh.is_empty()).then_some(mesh)
    }
}

impl Default for BuildScheduler<OpacityTable> {
    fn default() -> Self {
        Self::new(OpacityTable::default(), 0)
    }
}

/// Replaces the mesh record of `(coord, section)`.
///
/// The previous geometry is released before the new one is allocated.
fn install(
    cache: &mut WorldCache,
    coord: ColumnCoord,
    section: usize,
    mesh: Option<SubChunkMesh>,
    consumer: &mut impl MeshConsumer,
) -> bool {
    let Ok(old) = cache.replace_mesh(coord, section, MeshBuffer::EMPTY) else {
        return false;
    };
    if let Some(id) = old.mesh {
        consumer.free(id);
    }

    let Some(mesh) = mesh else {
        return true;
    };

    let vertex_count = mesh.vertex_count() as u32;
    let id = consumer.allocate(coord, section, mesh.as_bytes(), vertex_count);
    let buffer = MeshBuffer {
        mesh: Some(id),
        vertex_count,
    };
    match cache.replace_mesh(coord, section, buffer) {
        Ok(_) => true,
        Err(rejected) => {
            if let Some(id) = rejected.mesh {
                consumer.free(id);
            }
            false
        }
    }
}
