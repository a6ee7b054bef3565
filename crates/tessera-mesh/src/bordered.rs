//! Sub-chunk block volume padded with a one-block halo.
//!
//! [`BorderedVolume`] copies one sub-chunk into the interior of an 18³ grid
//! and fills the six face layers of the border from the neighboring
//! sub-chunks, so visibility tests never special-case the sub-chunk edge.
//! Halo cells with no loaded source (world top and bottom, missing columns)
//! stay air. Halo edges and corners are never consulted and stay air too.

use tessera_world::{AIR, ColumnCoord, SECTION_SIZE, SECTIONS_PER_COLUMN, SubChunk, WorldCache};

/// Side length of the padded volume.
pub const BORDERED_SIZE: usize = SECTION_SIZE + 2;

const BORDERED_VOLUME: usize = BORDERED_SIZE * BORDERED_SIZE * BORDERED_SIZE;

/// An 18×18×18 copy of block ids: a sub-chunk at `1..=16` plus its halo.
#[derive(Clone)]
pub struct BorderedVolume {
    /// Indexed `(y * 18 + z) * 18 + x`.
    blocks: Box<[u32; BORDERED_VOLUME]>,
}

impl BorderedVolume {
    /// An all-air volume.
    pub fn empty() -> Self {
        Self {
            blocks: Box::new([AIR; BORDERED_VOLUME]),
        }
    }

    fn index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < BORDERED_SIZE && y < BORDERED_SIZE && z < BORDERED_SIZE);
        (y * BORDERED_SIZE + z) * BORDERED_SIZE + x
    }

    /// Id at padded coordinates (each in `0..18`).
    pub fn get(&self, x: usize, y: usize, z: usize) -> u32 {
        self.blocks[Self::index(x, y, z)]
    }

    /// Sets the id at padded coordinates.
    pub fn set(&mut self, x: usize, y: usize, z: usize, id: u32) {
        self.blocks[Self::index(x, y, z)] = id;
    }

    /// Copies `sub` into the interior.
    pub fn fill_interior(&mut self, sub: &SubChunk) {
        let Some(blocks) = sub.blocks() else {
            return;
        };
        for y in 0..SECTION_SIZE {
            for z in 0..SECTION_SIZE {
                let src = SubChunk::linear_index(0, y, z);
                let dst = Self::index(1, y + 1, z + 1);
                let row = &blocks[src..src + SECTION_SIZE];
                self.blocks[dst..dst + SECTION_SIZE].copy_from_slice(row);
            }
        }
    }

    /// Copies one boundary layer of `source` into the halo.
    ///
    /// `map` turns the two in-layer coordinates `(a, b)` into
    /// `(source_xyz, padded_xyz)`.
    fn copy_layer(
        &mut self,
        source: &SubChunk,
        map: impl Fn(usize, usize) -> ((usize, usize, usize), (usize, usize, usize)),
    ) {
        if source.is_empty() {
            return;
        }
        for a in 0..SECTION_SIZE {
            for b in 0..SECTION_SIZE {
                let ((sx, sy, sz), (dx, dy, dz)) = map(a, b);
                self.set(dx, dy, dz, source.get(sx, sy, sz));
            }
        }
    }

    /// Builds the padded volume for sub-chunk `section` of `coord`.
    ///
    /// Returns `None` when `coord` is not resident in `cache`.
    pub fn gather(cache: &WorldCache, coord: ColumnCoord, section: usize) -> Option<Self> {
        let column = cache.column(coord)?;
        let mut volume = Self::empty();
        volume.fill_interior(column.section(section));

        const LAST: usize = SECTION_SIZE - 1;
        const HALO_MAX: usize = BORDERED_SIZE - 1;

        if let Some(neg_x) = cache.column(coord.offset(-1, 0)) {
            volume.copy_layer(neg_x.section(section), |y, z| ((LAST, y, z), (0, y + 1, z + 1)));
        }
        if let Some(pos_x) = cache.column(coord.offset(1, 0)) {
            volume.copy_layer(pos_x.section(section), |y, z| ((0, y, z), (HALO_MAX, y + 1, z + 1)));
        }
        if let Some(neg_z) = cache.column(coord.offset(0, -1)) {
            volume.copy_layer(neg_z.section(section), |x, y| ((x, y, LAST), (x + 1, y + 1, 0)));
        }
        if let Some(pos_z) = cache.column(coord.offset(0, 1)) {
            volume.copy_layer(pos_z.section(section), |x, y| ((x, y, 0), (x + 1, y + 1, HALO_MAX)));
        }
        if section + 1 < SECTIONS_PER_COLUMN {
            volume.copy_layer(column.section(section + 1), |x, z| {
                ((x, 0, z), (x + 1, HALO_MAX, z + 1))
            });
        }
        if section > 0 {
            volume.copy_layer(column.section(section - 1), |x, z| {
                ((x, LAST, z), (x + 1, 0, z + 1))
            });
        }

        Some(volume)
    }
}

impl Default for BorderedVolume {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_world::BlockPos;

    fn load(cache: &mut WorldCache, coord: ColumnCoord) {
        cache.begin_column_load(coord, true);
        cache.finish_column_load(coord);
    }

    fn cache_with_neighbors(center: ColumnCoord) -> WorldCache {
        let mut cache = WorldCache::new(8);
        load(&mut cache, center);
        for neighbor in center.horizontal_neighbors() {
            load(&mut cache, neighbor);
        }
        cache
    }

    #[test]
    fn test_interior_copy() {
        let center = ColumnCoord::new(0, 0);
        let mut cache = cache_with_neighbors(center);
        cache.apply_block(BlockPos::new(3, 20, 7), 11);

        let volume = BorderedVolume::gather(&cache, center, 1).expect("resident");
        assert_eq!(volume.get(4, 5, 8), 11);
    }

    #[test]
    fn test_horizontal_halo_comes_from_facing_layer() {
        let center = ColumnCoord::new(0, 0);
        let mut cache = cache_with_neighbors(center);
        // -X neighbor's x = 15 layer, +X neighbor's x = 0 layer.
        cache.apply_block(BlockPos::new(-1, 2, 3), 21);
        cache.apply_block(BlockPos::new(16, 2, 3), 22);
        // -Z neighbor's z = 15 layer, +Z neighbor's z = 0 layer.
        cache.apply_block(BlockPos::new(4, 2, -1), 23);
        cache.apply_block(BlockPos::new(4, 2, 16), 24);
        // Not on a facing layer: must not leak into the halo.
        cache.apply_block(BlockPos::new(-16, 2, 3), 99);

        let volume = BorderedVolume::gather(&cache, center, 0).expect("resident");
        assert_eq!(volume.get(0, 3, 4), 21);
        assert_eq!(volume.get(17, 3, 4), 22);
        assert_eq!(volume.get(5, 3, 0), 23);
        assert_eq!(volume.get(5, 3, 17), 24);
        for y in 0..BORDERED_SIZE {
            for z in 0..BORDERED_SIZE {
                assert_ne!(volume.get(0, y, z), 99);
            }
        }
    }

    #[test]
    fn test_vertical_halo_from_adjacent_sections() {
        let center = ColumnCoord::new(2, -3);
        let mut cache = cache_with_neighbors(center);
        let (bx, bz) = center.block_origin();
        // Section 1 is the center; section 2's y = 0 layer and section 0's y = 15 layer.
        cache.apply_block(BlockPos::new(bx + 6, 32, bz + 9), 31);
        cache.apply_block(BlockPos::new(bx + 6, 15, bz + 9), 32);

        let volume = BorderedVolume::gather(&cache, center, 1).expect("resident");
        assert_eq!(volume.get(7, 17, 10), 31);
        assert_eq!(volume.get(7, 0, 10), 32);
    }

    #[test]
    fn test_world_extremes_are_air() {
        let center = ColumnCoord::new(0, 0);
        let mut cache = cache_with_neighbors(center);
        cache.apply_block(BlockPos::new(0, 0, 0), 1);
        cache.apply_block(BlockPos::new(0, 255, 0), 1);

        let bottom = BorderedVolume::gather(&cache, center, 0).expect("resident");
        let top = BorderedVolume::gather(&cache, center, 15).expect("resident");
        for x in 0..BORDERED_SIZE {
            for z in 0..BORDERED_SIZE {
                assert_eq!(bottom.get(x, 0, z), AIR);
                assert_eq!(top.get(x, 17, z), AIR);
            }
        }
    }

    #[test]
    fn test_not_resident() {
        let cache = WorldCache::new(8);
        assert!(BorderedVolume::gather(&cache, ColumnCoord::new(0, 0), 0).is_none());
    }
}
