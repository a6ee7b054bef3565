//! Seam between the CPU-side mesher and whatever owns GPU geometry.

use tessera_world::{ColumnCoord, MeshId};

/// Receives built geometry and releases superseded geometry.
///
/// `allocate` is only called with non-empty vertex data. Every id it returns
/// is eventually passed to `free` exactly once.
pub trait MeshConsumer {
    /// Takes ownership of `vertex_count` vertices encoded in `vertices`
    /// for sub-chunk `section` of `column`.
    fn allocate(
        &mut self,
        column: ColumnCoord,
        section: usize,
        vertices: &[u8],
        vertex_count: u32,
    ) -> MeshId;

    /// Releases geometry returned by an earlier `allocate`.
    fn free(&mut self, mesh: MeshId);

    /// Releases a batch of meshes.
    fn free_all(&mut self, meshes: impl IntoIterator<Item = MeshId>)
    where
        Self: Sized,
    {
        for mesh in meshes {
            self.free(mesh);
        }
    }
}
