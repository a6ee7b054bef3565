//! Face-culling cube mesher.
//!
//! Each rendered block is a unit cube. A face is emitted when the neighbor
//! across it does not occlude, as two triangles (six vertices) wound
//! counter-clockwise around the outward normal. No per-block shape data is
//! consulted, so every rendered id occludes like a full cube unless the
//! opacity table marks it transparent.

use glam::Vec3;
use tessera_world::{ColumnCoord, SECTION_SIZE};

use crate::bordered::BorderedVolume;
use crate::opacity::BlockOpacity;
use crate::vertex::{ChunkVertex, debug_color};
use crate::visible_faces::VisibleFaces;

/// Vertices emitted per visible face.
pub const VERTICES_PER_FACE: usize = 6;

/// Geometry for one sub-chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubChunkMesh {
    /// Triangle list, three vertices per triangle.
    pub vertices: Vec<ChunkVertex>,
}

impl SubChunkMesh {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (quads).
    pub fn face_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_FACE
    }

    /// Returns `true` if no face was visible.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Raw vertex bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// World-space minimum corner of sub-chunk `section` of `coord`.
pub fn subchunk_origin(coord: ColumnCoord, section: usize) -> Vec3 {
    let (x, z) = coord.block_origin();
    Vec3::new(x as f32, (section * SECTION_SIZE) as f32, z as f32)
}

/// Meshes the interior of `volume`, placing cell `(1, 1, 1)` at `origin`.
pub fn mesh_subchunk(
    volume: &BorderedVolume,
    origin: Vec3,
    opacity: &impl BlockOpacity,
) -> SubChunkMesh {
    let mut mesh = SubChunkMesh::default();

    for y in 1..=SECTION_SIZE {
        for z in 1..=SECTION_SIZE {
            for x in 1..=SECTION_SIZE {
                let id = volume.get(x, y, z);
                if !opacity.is_rendered(id) {
                    continue;
                }

                let faces = VisibleFaces::of_cell(volume, x, y, z, opacity);
                if faces == VisibleFaces::NONE {
                    continue;
                }

                let cell = origin + Vec3::new((x - 1) as f32, (y - 1) as f32, (z - 1) as f32);
                for dir in faces.iter() {
                    let [bl, br, tr, tl] = dir.corners(cell);
                    let color = debug_color(id, dir);
                    mesh.vertices.extend(
                        [bl, br, tr, tr, tl, bl]
                            .into_iter()
                            .map(|corner| ChunkVertex::new(corner, color)),
                    );
                }
            }
        }
    }

    mesh
}
