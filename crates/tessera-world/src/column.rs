//! Dense block-state storage for sub-chunks and chunk columns.
//!
//! A [`SubChunk`] stores 16³ global block-state ids in `(y, z, x)` raster
//! order (x varies fastest, then z, then y), which is the order streamed
//! sections arrive in. An all-air sub-chunk keeps no storage at all.

use crate::coords::{AIR, LocalPos, SECTION_AREA, SECTION_SIZE, SECTION_VOLUME, SECTIONS_PER_COLUMN};

/// A 16×16×16 volume of block-state ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubChunk {
    /// `None` means every block is air. When present, holds exactly
    /// [`SECTION_VOLUME`] ids.
    blocks: Option<Box<[u32]>>,
}

impl SubChunk {
    /// Creates an all-air sub-chunk without allocating.
    pub fn empty() -> Self {
        Self { blocks: None }
    }

    /// Builds a sub-chunk from ids in `(y, z, x)` raster order.
    ///
    /// `blocks` shorter than [`SECTION_VOLUME`] is padded with air; longer input
    /// is truncated.
    pub fn from_blocks(mut blocks: Vec<u32>) -> Self {
        blocks.resize(SECTION_VOLUME, AIR);
        if blocks.iter().all(|&id| id == AIR) {
            return Self::empty();
        }
        Self {
            blocks: Some(blocks.into_boxed_slice()),
        }
    }

    /// Linear index of `(x, y, z)` in raster order.
    pub fn linear_index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < SECTION_SIZE && y < SECTION_SIZE && z < SECTION_SIZE);
        y * SECTION_AREA + z * SECTION_SIZE + x
    }

    /// Returns the block-state id at `(x, y, z)`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> u32 {
        match &self.blocks {
            Some(blocks) => blocks[Self::linear_index(x, y, z)],
            None => AIR,
        }
    }

    /// Returns the block-state id at `pos`.
    pub fn get_local(&self, pos: LocalPos) -> u32 {
        self.get(pos.x, pos.y, pos.z)
    }

    /// Sets the id at `(x, y, z)` and returns the previous id.
    ///
    /// Writing air into an unallocated sub-chunk stays allocation-free.
    pub fn set(&mut self, x: usize, y: usize, z: usize, id: u32) -> u32 {
        let index = Self::linear_index(x, y, z);
        match &mut self.blocks {
            Some(blocks) => std::mem::replace(&mut blocks[index], id),
            None if id == AIR => AIR,
            None => {
                let mut blocks = vec![AIR; SECTION_VOLUME].into_boxed_slice();
                blocks[index] = id;
                self.blocks = Some(blocks);
                AIR
            }
        }
    }

    /// Returns the raw ids, or `None` when the sub-chunk holds no storage.
    pub fn blocks(&self) -> Option<&[u32]> {
        self.blocks.as_deref()
    }

    /// Returns `true` if no block is non-air.
    pub fn is_empty(&self) -> bool {
        match &self.blocks {
            Some(blocks) => blocks.iter().all(|&id| id == AIR),
            None => true,
        }
    }

    /// Counts the non-air blocks.
    pub fn non_air_count(&self) -> usize {
        self.blocks
            .as_deref()
            .map_or(0, |blocks| blocks.iter().filter(|&&id| id != AIR).count())
    }
}

/// A vertical stack of 16 sub-chunks plus a presence bitmask.
///
/// Bit `i` of the presence mask is set when sub-chunk `i` may hold a non-air
/// block. Meshing skips sub-chunks whose bit is clear.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkColumn {
    sections: Vec<SubChunk>,
    presence: u16,
}

impl ChunkColumn {
    /// Creates an all-air column.
    pub fn new() -> Self {
        Self {
            sections: vec![SubChunk::empty(); SECTIONS_PER_COLUMN],
            presence: 0,
        }
    }

    /// Drops all block storage and clears the presence mask.
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            *section = SubChunk::empty();
        }
        self.presence = 0;
    }

    /// Returns sub-chunk `index` (0 = lowest).
    ///
    /// # Panics
    ///
    /// Panics if `index >= 16`.
    pub fn section(&self, index: usize) -> &SubChunk {
        &self.sections[index]
    }

    /// Replaces sub-chunk `index` and clears its presence bit.
    pub fn set_section(&mut self, index: usize, section: SubChunk) {
        self.presence &= !(1 << index);
        self.sections[index] = section;
    }

    /// Sets one block and returns the previous id.
    ///
    /// A non-air id sets the sub-chunk's presence bit. Air never clears it.
    pub fn set_block(&mut self, section: usize, pos: LocalPos, id: u32) -> u32 {
        let old = self.sections[section].set(pos.x, pos.y, pos.z, id);
        if id != AIR {
            self.mark_present(section);
        }
        old
    }

    /// Returns the block at `pos` inside sub-chunk `section`.
    pub fn block(&self, section: usize, pos: LocalPos) -> u32 {
        self.sections[section].get_local(pos)
    }

    /// The 16-bit presence mask.
    pub fn presence(&self) -> u16 {
        self.presence
    }

    /// Returns `true` if sub-chunk `index` is marked present.
    pub fn is_present(&self, index: usize) -> bool {
        self.presence & (1 << index) != 0
    }

    /// Sets the presence bit for sub-chunk `index`.
    pub fn mark_present(&mut self, index: usize) {
        debug_assert!(index < SECTIONS_PER_COLUMN);
        self.presence |= 1 << index;
    }
}

impl Default for ChunkColumn {
    fn default() -> Self {
        Self::new()
    }
}
