//! World, column, and section-local block coordinates.
//!
//! World block coordinates are split into a column coordinate and a local
//! offset with floor division (`div_euclid`), so `-1` belongs to column `-1`
//! at local `15`, never to column `0`.

/// Side length of a sub-chunk in blocks.
pub const SECTION_SIZE: usize = 16;

/// Number of blocks in one horizontal layer of a sub-chunk (16²).
pub const SECTION_AREA: usize = SECTION_SIZE * SECTION_SIZE;

/// Number of blocks in a sub-chunk (16³).
pub const SECTION_VOLUME: usize = SECTION_AREA * SECTION_SIZE;

/// Sub-chunks stacked in one column.
pub const SECTIONS_PER_COLUMN: usize = 16;

/// Height of the world in blocks.
pub const WORLD_HEIGHT: i32 = (SECTION_SIZE * SECTIONS_PER_COLUMN) as i32;

/// The reserved empty block-state id.
pub const AIR: u32 = 0;

const SECTION_SIZE_I32: i32 = SECTION_SIZE as i32;

/// Absolute coordinate of a chunk column in world space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnCoord {
    /// Column X (world block X divided by 16, floored).
    pub x: i32,
    /// Column Z (world block Z divided by 16, floored).
    pub z: i32,
}

impl ColumnCoord {
    /// Creates a column coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Returns the column offset by `(dx, dz)`.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// The four horizontal neighbors: −X, +X, −Z, +Z.
    pub fn horizontal_neighbors(self) -> [ColumnCoord; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }

    /// World-space block coordinate of the column's minimum corner.
    pub fn block_origin(self) -> (i32, i32) {
        (self.x * SECTION_SIZE_I32, self.z * SECTION_SIZE_I32)
    }
}

/// Block offset inside a sub-chunk, each component in `0..16`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalPos {
    /// Local X.
    pub x: usize,
    /// Local Y.
    pub y: usize,
    /// Local Z.
    pub z: usize,
}

impl LocalPos {
    /// Creates a local position. Components are expected to be in `0..16`.
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        debug_assert!(x < SECTION_SIZE && y < SECTION_SIZE && z < SECTION_SIZE);
        Self { x, y, z }
    }
}

/// Absolute world block coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockPos {
    /// World X.
    pub x: i32,
    /// World Y.
    pub y: i32,
    /// World Z.
    pub z: i32,
}

impl BlockPos {
    /// Creates a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Column containing this block.
    pub fn column(self) -> ColumnCoord {
        ColumnCoord::new(
            self.x.div_euclid(SECTION_SIZE_I32),
            self.z.div_euclid(SECTION_SIZE_I32),
        )
    }

    /// Index of the sub-chunk containing this block, or `None` outside `0..256`.
    pub fn section(self) -> Option<usize> {
        if (0..WORLD_HEIGHT).contains(&self.y) {
            Some((self.y / SECTION_SIZE_I32) as usize)
        } else {
            None
        }
    }

    /// Offset of this block inside its sub-chunk.
    pub fn local(self) -> LocalPos {
        LocalPos::new(
            self.x.rem_euclid(SECTION_SIZE_I32) as usize,
            self.y.rem_euclid(SECTION_SIZE_I32) as usize,
            self.z.rem_euclid(SECTION_SIZE_I32) as usize,
        )
    }
}

/// Maps one axis of a column coordinate onto a cache of side `size`.
///
/// Equivalent to `((coord mod size) + size) mod size`, so negative coordinates
/// wrap to the top of the range: `-1` maps to `size - 1`.
pub fn cache_slot_index(coord: i32, size: usize) -> usize {
    debug_assert!(size > 0 && size <= i32::MAX as usize);
    coord.rem_euclid(size as i32) as usize
}
