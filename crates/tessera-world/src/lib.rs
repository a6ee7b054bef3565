//! Streamed world state: block coordinates, chunk columns, the toroidal column
//! cache, and the queue of columns waiting for a mesh build.

pub mod build_queue;
pub mod cache;
pub mod column;
pub mod coords;

pub use build_queue::BuildQueue;
pub use cache::{BlockEdit, CacheSlot, ColumnState, MeshBuffer, MeshId, WorldCache};
pub use column::{ChunkColumn, SubChunk};
pub use coords::{
    AIR, BlockPos, ColumnCoord, LocalPos, SECTION_AREA, SECTION_SIZE, SECTION_VOLUME,
    SECTIONS_PER_COLUMN, WORLD_HEIGHT, cache_slot_index,
};
