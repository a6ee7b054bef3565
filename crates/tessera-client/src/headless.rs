//! CPU-side mesh store used when no renderer is attached.
//!
//! Keeps every allocated vertex buffer in memory and tracks usage, so the
//! replay driver and tests can inspect exactly what a renderer would have
//! been handed.

use rustc_hash::FxHashMap;
use tessera_mesh::MeshConsumer;
use tessera_world::{ColumnCoord, MeshId};

/// One allocated buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMesh {
    /// Owning column.
    pub column: ColumnCoord,
    /// Sub-chunk index.
    pub section: usize,
    /// Vertex count.
    pub vertex_count: u32,
    /// Copy of the vertex bytes.
    pub bytes: Vec<u8>,
}

/// A [`MeshConsumer`] that keeps geometry in host memory.
#[derive(Debug, Default)]
pub struct HeadlessMeshStore {
    next_id: u64,
    live: FxHashMap<MeshId, StoredMesh>,
    bytes_in_use: usize,
    allocations: u64,
    frees: u64,
}

impl HeadlessMeshStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `id`, if still live.
    pub fn get(&self, id: MeshId) -> Option<&StoredMesh> {
        self.live.get(&id)
    }

    /// Number of live buffers.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Bytes held by live buffers.
    pub fn bytes_in_use(&self) -> usize {
        self.bytes_in_use
    }

    /// Vertices held by live buffers.
    pub fn vertices_in_use(&self) -> u64 {
        self.live.values().map(|m| u64::from(m.vertex_count)).sum()
    }

    /// Total allocations so far.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Total frees so far.
    pub fn frees(&self) -> u64 {
        self.frees
    }
}

impl MeshConsumer for HeadlessMeshStore {
    fn allocate(
        &mut self,
        column: ColumnCoord,
        section: usize,
        vertices: &[u8],
        vertex_count: u32,
    ) -> MeshId {
        self.next_id += 1;
        let id = MeshId(self.next_id);
        self.allocations += 1;
        self.bytes_in_use += vertices.len();
        self.live.insert(
            id,
            StoredMesh {
                column,
                section,
                vertex_count,
                bytes: vertices.to_vec(),
            },
        );
        id
    }

    fn free(&mut self, mesh: MeshId) {
        match self.live.remove(&mesh) {
            Some(stored) => {
                self.frees += 1;
                self.bytes_in_use -= stored.bytes.len();
            }
            None => tracing::warn!("Free of unknown mesh {}", mesh.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_free_track_usage() {
        let mut store = HeadlessMeshStore::new();
        let a = store.allocate(ColumnCoord::new(0, 0), 1, &[0; 48], 2);
        let b = store.allocate(ColumnCoord::new(1, 0), 2, &[0; 24], 1);
        assert_ne!(a, b);
        assert_eq!(store.bytes_in_use(), 72);
        assert_eq!(store.vertices_in_use(), 3);

        store.free(a);
        assert_eq!(store.live_count(), 1);
        assert_eq!(store.bytes_in_use(), 24);
        assert!(store.get(a).is_none());
        assert_eq!(store.get(b).map(|m| m.section), Some(2));
    }

    #[test]
    fn test_unknown_free_is_ignored() {
        let mut store = HeadlessMeshStore::new();
        store.free(MeshId(99));
        assert_eq!(store.frees(), 0);
    }
}
