//! Bitmask of which of a block's six faces are exposed.

use crate::bordered::BorderedVolume;
use crate::face_direction::FaceDirection;
use crate::opacity::BlockOpacity;

/// Bitmask indicating which of a block's 6 faces are visible.
///
/// Bit `i` corresponds to [`FaceDirection`] with index `i`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibleFaces(pub u8);

impl VisibleFaces {
    /// No faces visible.
    pub const NONE: Self = Self(0);
    /// All six faces visible.
    pub const ALL: Self = Self(0b0011_1111);

    /// Visible faces of the interior cell `(x, y, z)` (each in `1..=16`) of
    /// `volume`: a face shows when its neighbor does not occlude.
    pub fn of_cell(
        volume: &BorderedVolume,
        x: usize,
        y: usize,
        z: usize,
        opacity: &impl BlockOpacity,
    ) -> Self {
        let mut faces = Self::NONE;
        for dir in FaceDirection::ALL {
            let (dx, dy, dz) = dir.delta();
            let neighbor = volume.get(
                x.wrapping_add_signed(dx),
                y.wrapping_add_signed(dy),
                z.wrapping_add_signed(dz),
            );
            if !opacity.is_opaque(neighbor) {
                faces.set_visible(dir);
            }
        }
        faces
    }

    /// Returns `true` if the face in the given direction is visible.
    pub fn is_visible(self, direction: FaceDirection) -> bool {
        self.0 & (1 << direction as u8) != 0
    }

    /// Marks the face in the given direction as visible.
    pub fn set_visible(&mut self, direction: FaceDirection) {
        self.0 |= 1 << direction as u8;
    }

    /// Iterates over the visible directions.
    pub fn iter(self) -> impl Iterator<Item = FaceDirection> {
        FaceDirection::ALL
            .into_iter()
            .filter(move |&dir| self.is_visible(dir))
    }

    /// Returns the number of visible faces (0–6).
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opacity::OpacityTable;

    #[test]
    fn test_isolated_cell_shows_all_faces() {
        let mut volume = BorderedVolume::empty();
        volume.set(5, 5, 5, 1);
        let faces = VisibleFaces::of_cell(&volume, 5, 5, 5, &OpacityTable::default());
        assert_eq!(faces, VisibleFaces::ALL);
    }

    #[test]
    fn test_neighbor_hides_shared_face() {
        let mut volume = BorderedVolume::empty();
        volume.set(5, 5, 5, 1);
        volume.set(6, 5, 5, 1);
        volume.set(5, 4, 5, 2);
        let faces = VisibleFaces::of_cell(&volume, 5, 5, 5, &OpacityTable::default());
        assert!(!faces.is_visible(FaceDirection::PosX));
        assert!(!faces.is_visible(FaceDirection::NegY));
        assert_eq!(faces.count(), 4);
    }

    #[test]
    fn test_halo_cells_occlude() {
        let mut volume = BorderedVolume::empty();
        volume.set(1, 1, 1, 1);
        volume.set(0, 1, 1, 3);
        let faces = VisibleFaces::of_cell(&volume, 1, 1, 1, &OpacityTable::default());
        assert!(!faces.is_visible(FaceDirection::NegX));
    }

    #[test]
    fn test_transparent_neighbor_exposes_face() {
        let mut volume = BorderedVolume::empty();
        volume.set(5, 5, 5, 1);
        volume.set(5, 6, 5, 230);
        let table = OpacityTable::new(std::iter::empty(), [230]);
        let faces = VisibleFaces::of_cell(&volume, 5, 5, 5, &table);
        assert!(faces.is_visible(FaceDirection::PosY));
    }

    #[test]
    fn test_iter_yields_set_directions() {
        let mut faces = VisibleFaces::NONE;
        faces.set_visible(FaceDirection::PosZ);
        faces.set_visible(FaceDirection::NegX);
        let dirs: Vec<_> = faces.iter().collect();
        assert_eq!(dirs, vec![FaceDirection::NegX, FaceDirection::PosZ]);
    }
}
