//! Block-state opacity lookup used for face culling.
//!
//! Every id is treated as a full opaque cube unless the table says
//! otherwise. Air (id 0) never occludes and is never meshed.

use rustc_hash::FxHashSet;
use tessera_world::AIR;

/// Barrier marker id in the 1.16.4 block-state table.
pub const BARRIER_BLOCK_ID: u32 = 7540;

/// Answers the two questions the mesher asks about a block-state id.
pub trait BlockOpacity {
    /// `true` if a face next to this id is hidden by it.
    fn is_opaque(&self, id: u32) -> bool;

    /// `true` if this id produces geometry of its own.
    fn is_rendered(&self, id: u32) -> bool;
}

/// Set-backed opacity table.
#[derive(Clone, Debug)]
pub struct OpacityTable {
    /// Ids that are never meshed. They still occlude unless also transparent.
    hidden: FxHashSet<u32>,
    /// Ids that are meshed but do not occlude neighbors.
    transparent: FxHashSet<u32>,
}

impl OpacityTable {
    /// Builds a table from explicit id lists.
    pub fn new(
        hidden: impl IntoIterator<Item = u32>,
        transparent: impl IntoIterator<Item = u32>,
    ) -> Self {
        Self {
            hidden: hidden.into_iter().collect(),
            transparent: transparent.into_iter().collect(),
        }
    }

    /// Every non-air id is an opaque, rendered cube.
    pub fn all_opaque() -> Self {
        Self::new(std::iter::empty(), std::iter::empty())
    }
}

impl Default for OpacityTable {
    /// Hides the barrier marker only.
    fn default() -> Self {
        Self::new([BARRIER_BLOCK_ID], std::iter::empty())
    }
}

impl BlockOpacity for OpacityTable {
    fn is_opaque(&self, id: u32) -> bool {
        id != AIR && !self.transparent.contains(&id)
    }

    fn is_rendered(&self, id: u32) -> bool {
        id != AIR && !self.hidden.contains(&id)
    }
}
