//! Determines which sub-chunk meshes a block edit makes stale.

use tessera_world::{BlockEdit, ColumnCoord, LocalPos, SECTION_SIZE, SECTIONS_PER_COLUMN};

/// One sub-chunk mesh to rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshTarget {
    /// Owning column.
    pub column: ColumnCoord,
    /// Sub-chunk index.
    pub section: usize,
}

impl MeshTarget {
    /// Creates a target.
    pub fn new(column: ColumnCoord, section: usize) -> Self {
        Self { column, section }
    }
}

/// Determines which sub-chunks need remeshing after a block edit.
pub struct MeshInvalidator;

impl MeshInvalidator {
    /// Sub-chunks whose meshes depend on the block at `local` inside
    /// sub-chunk `section` of `column`.
    ///
    /// The edited sub-chunk is always first. Neighbors are included when the
    /// edit is on a boundary, because their face culling reads this block
    /// through their halo. Sub-chunks outside the world's height are skipped.
    pub fn invalidate(column: ColumnCoord, section: usize, local: LocalPos) -> Vec<MeshTarget> {
        const LAST: usize = SECTION_SIZE - 1;

        let mut dirty = vec![MeshTarget::new(column, section)];

        if local.x == 0 {
            dirty.push(MeshTarget::new(column.offset(-1, 0), section));
        }
        if local.x == LAST {
            dirty.push(MeshTarget::new(column.offset(1, 0), section));
        }
        if local.z == 0 {
            dirty.push(MeshTarget::new(column.offset(0, -1), section));
        }
        if local.z == LAST {
            dirty.push(MeshTarget::new(column.offset(0, 1), section));
        }
        if local.y == 0 && section > 0 {
            dirty.push(MeshTarget::new(column, section - 1));
        }
        if local.y == LAST && section + 1 < SECTIONS_PER_COLUMN {
            dirty.push(MeshTarget::new(column, section + 1));
        }

        dirty
    }

    /// [`MeshInvalidator::invalidate`] for an applied edit.
    pub fn for_edit(edit: &BlockEdit) -> Vec<MeshTarget> {
        Self::invalidate(edit.column, edit.section, edit.local)
    }
}
