//! The six axis-aligned directions a block face can point.

use glam::Vec3;

/// One of the six cardinal directions a block face can point.
///
/// The `repr(u8)` discriminant doubles as the bit index inside
/// [`super::VisibleFaces`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceDirection {
    /// +X direction.
    PosX = 0,
    /// −X direction.
    NegX = 1,
    /// +Y direction (top).
    PosY = 2,
    /// −Y direction (bottom).
    NegY = 3,
    /// +Z direction.
    PosZ = 4,
    /// −Z direction.
    NegZ = 5,
}

impl FaceDirection {
    /// All six directions in order.
    pub const ALL: [FaceDirection; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// Unit normal of this face.
    pub fn normal(self) -> Vec3 {
        match self {
            Self::PosX => Vec3::X,
            Self::NegX => Vec3::NEG_X,
            Self::PosY => Vec3::Y,
            Self::NegY => Vec3::NEG_Y,
            Self::PosZ => Vec3::Z,
            Self::NegZ => Vec3::NEG_Z,
        }
    }

    /// Neighbor offset `(dx, dy, dz)` in this direction.
    pub fn delta(self) -> (isize, isize, isize) {
        match self {
            Self::PosX => (1, 0, 0),
            Self::NegX => (-1, 0, 0),
            Self::PosY => (0, 1, 0),
            Self::NegY => (0, -1, 0),
            Self::PosZ => (0, 0, 1),
            Self::NegZ => (0, 0, -1),
        }
    }

    /// Corners of the unit face of the block whose minimum corner is
    /// `origin`, as `[bottom_left, bottom_right, top_right, top_left]` seen
    /// from outside the block. The order winds counter-clockwise around the
    /// outward normal.
    pub fn corners(self, origin: Vec3) -> [Vec3; 4] {
        let o = origin;
        let c = |x: f32, y: f32, z: f32| o + Vec3::new(x, y, z);
        match self {
            Self::PosY => [c(0., 1., 0.), c(0., 1., 1.), c(1., 1., 1.), c(1., 1., 0.)],
            Self::NegY => [c(1., 0., 0.), c(1., 0., 1.), c(0., 0., 1.), c(0., 0., 0.)],
            Self::NegZ => [c(1., 0., 0.), c(0., 0., 0.), c(0., 1., 0.), c(1., 1., 0.)],
            Self::PosZ => [c(0., 0., 1.), c(1., 0., 1.), c(1., 1., 1.), c(0., 1., 1.)],
            Self::PosX => [c(1., 0., 1.), c(1., 0., 0.), c(1., 1., 0.), c(1., 1., 1.)],
            Self::NegX => [c(0., 0., 0.), c(0., 0., 1.), c(0., 1., 1.), c(0., 1., 0.)],
        }
    }

    /// Brightness multiplier for flat debug shading.
    pub fn shade(self) -> f32 {
        match self {
            Self::PosY => 1.0,
            Self::PosX | Self::NegX => 0.8,
            Self::PosZ | Self::NegZ => 0.7,
            Self::NegY => 0.5,
        }
    }
}
