//! Fixed-size toroidal cache of chunk columns.
//!
//! Columns live in a `size × size` grid addressed by
//! [`cache_slot_index`] on each horizontal axis, so the grid wraps as the
//! viewer moves and slots are reused for new coordinates. Each slot records
//! the absolute coordinate occupying it; every coordinate-based accessor
//! compares against that occupant before trusting the slot, so a request for
//! a coordinate whose slot has been taken over by another column is a no-op.

use crate::column::{ChunkColumn, SubChunk};
use crate::coords::{BlockPos, ColumnCoord, LocalPos, SECTIONS_PER_COLUMN, cache_slot_index};

/// Handle to geometry owned by the external renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub u64);

/// Per-sub-chunk geometry record. Empty when no face was visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshBuffer {
    /// Renderer-side buffer, if one was allocated.
    pub mesh: Option<MeshId>,
    /// Number of vertices in the buffer.
    pub vertex_count: u32,
}

impl MeshBuffer {
    /// The empty mesh.
    pub const EMPTY: Self = Self {
        mesh: None,
        vertex_count: 0,
    };

    /// Returns `true` if this record holds no geometry.
    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }
}

/// Load state of a cache slot's occupant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnState {
    /// No valid data.
    #[default]
    Unloaded,
    /// A chunk-data packet is being applied.
    Loading,
    /// Holds valid streamed data.
    Loaded,
}

/// One cell of the toroidal grid.
#[derive(Clone, Debug, Default)]
pub struct CacheSlot {
    occupant: Option<ColumnCoord>,
    state: ColumnState,
    column: ChunkColumn,
    meshes: [MeshBuffer; SECTIONS_PER_COLUMN],
}

impl CacheSlot {
    /// Absolute coordinate currently occupying the slot, if any ever did.
    pub fn occupant(&self) -> Option<ColumnCoord> {
        self.occupant
    }

    /// Load state of the occupant.
    pub fn state(&self) -> ColumnState {
        self.state
    }

    /// `true` when the occupant holds valid streamed data.
    pub fn is_loaded(&self) -> bool {
        self.state == ColumnState::Loaded
    }

    /// Block storage of the occupant (possibly stale).
    pub fn column(&self) -> &ChunkColumn {
        &self.column
    }

    /// Mesh records of the occupant, indexed by sub-chunk.
    pub fn meshes(&self) -> &[MeshBuffer; SECTIONS_PER_COLUMN] {
        &self.meshes
    }

    fn holds(&self, coord: ColumnCoord) -> bool {
        self.occupant == Some(coord)
    }

    fn take_meshes(&mut self) -> Vec<MeshId> {
        self.meshes
            .iter_mut()
            .filter_map(|buffer| std::mem::replace(buffer, MeshBuffer::EMPTY).mesh)
            .collect()
    }
}

/// Result of applying a single block edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockEdit {
    /// Column that was modified.
    pub column: ColumnCoord,
    /// Sub-chunk index inside the column.
    pub section: usize,
    /// Offset inside the sub-chunk.
    pub local: LocalPos,
    /// Id before the edit.
    pub old_id: u32,
}

/// Toroidal grid of chunk columns, the single owner of streamed block data
/// and per-sub-chunk mesh records.
pub struct WorldCache {
    size: usize,
    /// Row-major: `slots[z_index * size + x_index]`.
    slots: Vec<CacheSlot>,
}

impl WorldCache {
    /// Default cache side length.
    pub const DEFAULT_SIZE: usize = 24;

    /// Creates an empty cache of `size × size` slots.
    ///
    /// `size` must be at least 3 so a column never shares a slot with its
    /// horizontal neighbors.
    pub fn new(size: usize) -> Self {
        debug_assert!(size >= 3, "cache size must be at least 3");
        let mut slots = Vec::with_capacity(size * size);
        slots.resize_with(size * size, CacheSlot::default);
        Self { size, slots }
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// `(x_index, z_index)` of the slot `coord` maps to.
    pub fn slot_index(&self, coord: ColumnCoord) -> (usize, usize) {
        (
            cache_slot_index(coord.x, self.size),
            cache_slot_index(coord.z, self.size),
        )
    }

    /// Returns the slot `coord` maps to, whatever occupies it.
    pub fn slot(&self, coord: ColumnCoord) -> &CacheSlot {
        let (x, z) = self.slot_index(coord);
        &self.slots[z * self.size + x]
    }

    fn slot_mut(&mut self, coord: ColumnCoord) -> &mut CacheSlot {
        let (x, z) = self.slot_index(coord);
        &mut self.slots[z * self.size + x]
    }

    /// `true` when `coord` occupies its slot and is loaded.
    pub fn is_resident(&self, coord: ColumnCoord) -> bool {
        let slot = self.slot(coord);
        slot.holds(coord) && slot.is_loaded()
    }

    /// Column data for `coord` if it occupies its slot and is loaded.
    pub fn column(&self, coord: ColumnCoord) -> Option<&ChunkColumn> {
        let slot = self.slot(coord);
        (slot.holds(coord) && slot.is_loaded()).then_some(&slot.column)
    }

    /// Starts streaming data for `coord` into its slot.
    ///
    /// Only a `full` load may claim a slot held by another coordinate. The
    /// slot is then reset and the previous occupant's meshes are returned so
    /// the caller can release them. A `full` load of the same coordinate also
    /// resets block data. Returns `None` when the load is refused.
    pub fn begin_column_load(&mut self, coord: ColumnCoord, full: bool) -> Option<Vec<MeshId>> {
        let slot = self.slot_mut(coord);
        let mut evicted = Vec::new();

        if !slot.holds(coord) {
            if !full {
                return None;
            }
            if let Some(previous) = slot.occupant {
                tracing::debug!(
                    "Cache slot reused: ({}, {}) replaces ({}, {})",
                    coord.x,
                    coord.z,
                    previous.x,
                    previous.z
                );
            }
            evicted = slot.take_meshes();
            slot.column.reset();
            slot.occupant = Some(coord);
        } else if full {
            slot.column.reset();
        }

        slot.state = ColumnState::Loading;
        Some(evicted)
    }

    /// Stores a decoded sub-chunk for a column that is mid-load.
    ///
    /// The section's presence bit is cleared; callers mark it with
    /// [`WorldCache::mark_subchunk_present`] once they know it holds blocks.
    /// Returns `false` if `coord` is not loading in its slot.
    pub fn store_section(&mut self, coord: ColumnCoord, index: usize, section: SubChunk) -> bool {
        let slot = self.slot_mut(coord);
        let loading = slot.holds(coord) && slot.state == ColumnState::Loading;
        if !loading || index >= SECTIONS_PER_COLUMN {
            return false;
        }
        slot.column.set_section(index, section);
        true
    }

    /// Sets the presence bit of sub-chunk `section` for `coord`.
    ///
    /// A no-op when another coordinate occupies the slot.
    pub fn mark_subchunk_present(&mut self, coord: ColumnCoord, section: usize) {
        let slot = self.slot_mut(coord);
        if slot.holds(coord) && section < SECTIONS_PER_COLUMN {
            slot.column.mark_present(section);
        }
    }

    /// Marks a column that is mid-load as loaded.
    ///
    /// Returns `false` if `coord` is not loading in its slot.
    pub fn finish_column_load(&mut self, coord: ColumnCoord) -> bool {
        let slot = self.slot_mut(coord);
        if !slot.holds(coord) || slot.state != ColumnState::Loading {
            return false;
        }
        slot.state = ColumnState::Loaded;
        true
    }

    /// Writes `new_id` at world position `pos`.
    ///
    /// Only loaded, non-stale columns are mutated; `y` outside the world is
    /// ignored. A non-air id sets the sub-chunk's presence bit.
    pub fn apply_block(&mut self, pos: BlockPos, new_id: u32) -> Option<BlockEdit> {
        let section = pos.section()?;
        let column = pos.column();
        let local = pos.local();

        let slot = self.slot_mut(column);
        if !slot.holds(column) || !slot.is_loaded() {
            return None;
        }

        let old_id = slot.column.set_block(section, local, new_id);
        Some(BlockEdit {
            column,
            section,
            local,
            old_id,
        })
    }

    /// Unloads `coord`, returning the meshes it owned for release.
    ///
    /// A no-op when another coordinate has taken over the slot.
    pub fn unload_column(&mut self, coord: ColumnCoord) -> Vec<MeshId> {
        let slot = self.slot_mut(coord);
        if !slot.holds(coord) {
            return Vec::new();
        }
        slot.state = ColumnState::Unloaded;
        slot.take_meshes()
    }

    /// Mesh record for sub-chunk `section` of `coord`.
    pub fn mesh(&self, coord: ColumnCoord, section: usize) -> Option<MeshBuffer> {
        let slot = self.slot(coord);
        slot.holds(coord).then(|| slot.meshes[section])
    }

    /// Stores a freshly built mesh record and returns the one it replaced.
    ///
    /// Returns `Err(buffer)` unchanged when `coord` does not occupy its slot.
    pub fn replace_mesh(
        &mut self,
        coord: ColumnCoord,
        section: usize,
        buffer: MeshBuffer,
    ) -> Result<MeshBuffer, MeshBuffer> {
        let slot = self.slot_mut(coord);
        if !slot.holds(coord) {
            return Err(buffer);
        }
        Ok(std::mem::replace(&mut slot.meshes[section], buffer))
    }

    /// Detaches every live mesh in the cache for release.
    pub fn take_all_meshes(&mut self) -> Vec<MeshId> {
        self.slots
            .iter_mut()
            .flat_map(CacheSlot::take_meshes)
            .collect()
    }

    /// Iterates over loaded columns with their coordinates.
    pub fn loaded_columns(&self) -> impl Iterator<Item = (ColumnCoord, &ChunkColumn)> {
        self.slots.iter().filter_map(|slot| match slot.occupant {
            Some(coord) if slot.is_loaded() => Some((coord, &slot.column)),
            _ => None,
        })
    }

    /// Total vertex count over all mesh records.
    pub fn total_vertex_count(&self) -> u64 {
        self.slots
            .iter()
            .flat_map(|slot| slot.meshes.iter())
            .map(|buffer| u64::from(buffer.vertex_count))
            .sum()
    }
}

impl Default for WorldCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(cache: &mut WorldCache, coord: ColumnCoord) {
        cache.begin_column_load(coord, true);
        cache.finish_column_load(coord);
    }

    #[test]
    fn test_slot_index_wraps_negative() {
        let cache = WorldCache::new(24);
        assert_eq!(cache.slot_index(ColumnCoord::new(-1, -1)), (23, 23));
        assert_eq!(cache.slot_index(ColumnCoord::new(25, 3)), (1, 3));
    }

    #[test]
    fn test_apply_block_negative_coordinates() {
        let mut cache = WorldCache::new(24);
        let coord = ColumnCoord::new(-1, 1);
        load(&mut cache, coord);

        let edit = cache
            .apply_block(BlockPos::new(-1, 5, 16), 7)
            .expect("column is loaded");
        assert_eq!(edit.column, coord);
        assert_eq!(edit.local, LocalPos::new(15, 5, 0));
        assert_eq!(edit.section, 0);
        assert_eq!(edit.old_id, 0);

        let column = cache.column(coord).expect("loaded");
        assert_eq!(column.section(0).get(15, 5, 0), 7);
        assert!(column.is_present(0));
    }

    #[test]
    fn test_apply_block_requires_loaded_column() {
        let mut cache = WorldCache::new(24);
        assert!(cache.apply_block(BlockPos::new(0, 0, 0), 1).is_none());

        let coord = ColumnCoord::new(0, 0);
        cache.begin_column_load(coord, true);
        assert!(
            cache.apply_block(BlockPos::new(0, 0, 0), 1).is_none(),
            "mid-load columns are not edited"
        );
    }

    #[test]
    fn test_apply_block_outside_world_height_ignored() {
        let mut cache = WorldCache::new(24);
        load(&mut cache, ColumnCoord::new(0, 0));
        assert!(cache.apply_block(BlockPos::new(0, 256, 0), 1).is_none());
        assert!(cache.apply_block(BlockPos::new(0, -1, 0), 1).is_none());
    }

    #[test]
    fn test_stale_slot_is_not_trusted() {
        let mut cache = WorldCache::new(24);
        let old = ColumnCoord::new(0, 0);
        let new = ColumnCoord::new(24, 0);
        load(&mut cache, old);
        load(&mut cache, new);

        assert!(!cache.is_resident(old));
        assert!(cache.is_resident(new));
        assert!(cache.column(old).is_none());
        assert!(cache.apply_block(BlockPos::new(0, 0, 0), 1).is_none());
    }

    #[test]
    fn test_slot_reuse_returns_evicted_meshes() {
        let mut cache = WorldCache::new(24);
        let old = ColumnCoord::new(1, 1);
        load(&mut cache, old);
        cache
            .replace_mesh(old, 2, MeshBuffer { mesh: Some(MeshId(9)), vertex_count: 6 })
            .expect("occupant matches");

        let evicted = cache.begin_column_load(ColumnCoord::new(25, 1), true);
        assert_eq!(evicted, Some(vec![MeshId(9)]));
    }

    #[test]
    fn test_partial_reload_keeps_blocks() {
        let mut cache = WorldCache::new(24);
        let coord = ColumnCoord::new(2, 2);
        load(&mut cache, coord);
        cache.apply_block(BlockPos::new(32, 40, 32), 5);

        cache.begin_column_load(coord, false);
        cache.finish_column_load(coord);
        assert_eq!(cache.column(coord).map(|c| c.section(2).get(0, 8, 0)), Some(5));

        cache.begin_column_load(coord, true);
        cache.finish_column_load(coord);
        assert_eq!(cache.column(coord).map(|c| c.section(2).get(0, 8, 0)), Some(0));
    }

    #[test]
    fn test_unload_releases_meshes_and_clears_loaded() {
        let mut cache = WorldCache::new(24);
        let coord = ColumnCoord::new(3, 4);
        load(&mut cache, coord);
        cache
            .replace_mesh(coord, 0, MeshBuffer { mesh: Some(MeshId(1)), vertex_count: 36 })
            .expect("occupant matches");
        cache
            .replace_mesh(coord, 5, MeshBuffer { mesh: Some(MeshId(2)), vertex_count: 12 })
            .expect("occupant matches");

        let released = cache.unload_column(coord);
        assert_eq!(released, vec![MeshId(1), MeshId(2)]);
        assert!(!cache.is_resident(coord));
        assert_eq!(cache.mesh(coord, 0), Some(MeshBuffer::EMPTY));
        assert_eq!(cache.total_vertex_count(), 0);
    }

    #[test]
    fn test_unload_of_overwritten_slot_is_noop() {
        let mut cache = WorldCache::new(24);
        let old = ColumnCoord::new(0, 0);
        let new = ColumnCoord::new(0, 24);
        load(&mut cache, old);
        load(&mut cache, new);
        cache
            .replace_mesh(new, 0, MeshBuffer { mesh: Some(MeshId(4)), vertex_count: 6 })
            .expect("occupant matches");

        assert!(cache.unload_column(old).is_empty());
        assert!(cache.is_resident(new), "newer occupant must stay loaded");
        assert_eq!(cache.mesh(new, 0).and_then(|m| m.mesh), Some(MeshId(4)));
    }

    #[test]
    fn test_replace_mesh_on_stale_coord_is_rejected() {
        let mut cache = WorldCache::new(24);
        load(&mut cache, ColumnCoord::new(0, 0));
        let buffer = MeshBuffer { mesh: Some(MeshId(3)), vertex_count: 6 };
        assert_eq!(
            cache.replace_mesh(ColumnCoord::new(24, 24), 0, buffer),
            Err(buffer)
        );
    }

    #[test]
    fn test_store_section_only_while_loading() {
        let mut cache = WorldCache::new(24);
        let coord = ColumnCoord::new(5, 5);
        cache.begin_column_load(coord, true);
        assert!(cache.store_section(coord, 1, SubChunk::from_blocks(vec![2])));
        cache.mark_subchunk_present(coord, 1);
        assert!(cache.finish_column_load(coord));

        assert!(!cache.store_section(coord, 2, SubChunk::from_blocks(vec![3])));
        assert!(!cache.store_section(ColumnCoord::new(29, 5), 1, SubChunk::empty()));
        let column = cache.column(coord).expect("loaded");
        assert_eq!(column.presence(), 0b10);
        assert_eq!(column.section(1).get(0, 0, 0), 2);
        assert!(column.section(2).is_empty());
    }

    #[test]
    fn test_mark_subchunk_present_checks_occupant() {
        let mut cache = WorldCache::new(24);
        let coord = ColumnCoord::new(3, 3);
        load(&mut cache, coord);

        cache.mark_subchunk_present(coord, 7);
        cache.mark_subchunk_present(ColumnCoord::new(27, 3), 9);
        cache.mark_subchunk_present(coord, SECTIONS_PER_COLUMN);
        assert_eq!(cache.column(coord).map(ChunkColumn::presence), Some(1 << 7));
    }

    #[test]
    fn test_partial_load_cannot_claim_aliased_slot() {
        let mut cache = WorldCache::new(24);
        let resident = ColumnCoord::new(0, 0);
        let alias = ColumnCoord::new(24, 0);
        load(&mut cache, resident);
        cache.apply_block(BlockPos::new(1, 1, 1), 4);
        cache
            .replace_mesh(resident, 0, MeshBuffer { mesh: Some(MeshId(6)), vertex_count: 6 })
            .expect("occupant matches");

        assert_eq!(cache.begin_column_load(alias, false), None);
        assert!(!cache.store_section(alias, 0, SubChunk::from_blocks(vec![9])));
        assert!(!cache.finish_column_load(alias));

        assert!(cache.is_resident(resident));
        assert!(!cache.is_resident(alias));
        assert_eq!(cache.mesh(resident, 0).and_then(|m| m.mesh), Some(MeshId(6)));
        assert_eq!(cache.column(resident).map(|c| c.section(0).get(1, 1, 1)), Some(4));
    }

    #[test]
    fn test_partial_load_of_empty_slot_is_refused() {
        let mut cache = WorldCache::new(24);
        let coord = ColumnCoord::new(7, 7);
        assert_eq!(cache.begin_column_load(coord, false), None);
        assert!(!cache.finish_column_load(coord));
        assert!(cache.slot(coord).occupant().is_none());
    }

    #[test]
    fn test_loaded_columns_iterates_residents() {
        let mut cache = WorldCache::new(8);
        load(&mut cache, ColumnCoord::new(0, 0));
        load(&mut cache, ColumnCoord::new(1, 0));
        cache.begin_column_load(ColumnCoord::new(2, 0), true);

        let mut coords: Vec<_> = cache.loaded_columns().map(|(c, _)| c).collect();
        coords.sort();
        assert_eq!(coords, vec![ColumnCoord::new(0, 0), ColumnCoord::new(1, 0)]);
    }
}
