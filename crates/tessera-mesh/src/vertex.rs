//! Vertex format handed to the renderer.

use glam::Vec3;

use crate::face_direction::FaceDirection;

/// A mesh vertex: world-space position plus a flat debug color.
///
/// Layout (24 bytes total):
///   - `[0..12]`  position `[f32; 3]`
///   - `[12..24]` color `[f32; 3]`, linear RGB in `0..=1`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Linear RGB color.
    pub color: [f32; 3],
}

static_assertions::assert_eq_size!(ChunkVertex, [u8; 24]);

impl ChunkVertex {
    /// Size of one vertex in bytes.
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    /// Creates a vertex.
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }
}

/// Deterministic debug color for block `id`, shaded per face.
pub fn debug_color(id: u32, face: FaceDirection) -> Vec3 {
    // Integer hash so neighboring ids land on unrelated hues.
    let mut h = id.wrapping_mul(0x9E37_79B9);
    h ^= h >> 15;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;

    let channel = |shift: u32| 0.35 + 0.65 * f32::from(((h >> shift) & 0xFF) as u8) / 255.0;
    Vec3::new(channel(0), channel(8), channel(16)) * face.shade()
}
