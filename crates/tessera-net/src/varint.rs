//! VarInt encoding and packed coordinate unpacking.

use tessera_world::BlockPos;

/// Appends the VarInt encoding of `value` to `out`.
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Number of bytes [`write_varint`] produces for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Sign-extends the low `bits` bits of `value` as a two's-complement number.
pub fn extend_sign(value: u64, bits: u32) -> i64 {
    debug_assert!((1..=64).contains(&bits));
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Unpacks a block-change position: 26 bits X, 26 bits Z, 12 bits Y
/// (X in the high bits, Y in the low bits).
pub fn unpack_block_position(packed: u64) -> BlockPos {
    BlockPos::new(
        extend_sign(packed >> 38, 26) as i32,
        extend_sign(packed & 0xFFF, 12) as i32,
        extend_sign((packed >> 12) & 0x3FF_FFFF, 26) as i32,
    )
}

/// Sub-chunk coordinate in section units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionPos {
    /// Column X.
    pub x: i32,
    /// Sub-chunk Y.
    pub y: i32,
    /// Column Z.
    pub z: i32,
}

impl SectionPos {
    /// World block position of cell `(rel_x, rel_y, rel_z)` in this section.
    pub fn block(self, rel_x: u8, rel_y: u8, rel_z: u8) -> BlockPos {
        BlockPos::new(
            self.x * 16 + i32::from(rel_x),
            self.y * 16 + i32::from(rel_y),
            self.z * 16 + i32::from(rel_z),
        )
    }
}

/// Unpacks a multi-block-change section position: 22 bits X, 22 bits Z,
/// 20 bits Y.
pub fn unpack_section_position(packed: u64) -> SectionPos {
    SectionPos {
        x: extend_sign(packed >> 42, 22) as i32,
        y: extend_sign(packed & 0xF_FFFF, 20) as i32,
        z: extend_sign((packed >> 20) & 0x3F_FFFF, 22) as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack_block(x: i64, y: i64, z: i64) -> u64 {
        (((x as u64) & 0x3FF_FFFF) << 38) | (((z as u64) & 0x3FF_FFFF) << 12) | ((y as u64) & 0xFFF)
    }

    #[test]
    fn test_varint_known_encodings() {
        let cases: [(u64, &[u8]); 5] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (25565, &[0xDD, 0xC7, 0x01]),
        ];
        for (value, expected) in cases {
            let mut out = Vec::new();
            write_varint(&mut out, value);
            assert_eq!(out, expected, "encoding of {value}");
            assert_eq!(varint_len(value), expected.len());
        }
        assert_eq!(varint_len(u64::MAX), 10);
    }

    #[test]
    fn test_extend_sign() {
        assert_eq!(extend_sign(0x3FF_FFFF, 26), -1);
        assert_eq!(extend_sign(0x200_0000, 26), -(1 << 25));
        assert_eq!(extend_sign(0x1FF_FFFF, 26), (1 << 25) - 1);
        assert_eq!(extend_sign(0x800, 12), -2048);
        assert_eq!(extend_sign(0x7FF, 12), 2047);
        assert_eq!(extend_sign(5, 4), 5);
        assert_eq!(extend_sign(u64::MAX, 64), -1);
    }

    #[test]
    fn test_unpack_block_position() {
        assert_eq!(unpack_block_position(pack_block(-1, 5, 16)), BlockPos::new(-1, 5, 16));
        assert_eq!(
            unpack_block_position(pack_block(183, 67, -346)),
            BlockPos::new(183, 67, -346)
        );
        assert_eq!(
            unpack_block_position(pack_block(-33_554_432, 255, 33_554_431)),
            BlockPos::new(-33_554_432, 255, 33_554_431)
        );
    }

    #[test]
    fn test_unpack_section_position() {
        let packed = ((-2i64 as u64 & 0x3F_FFFF) << 42) | ((7u64 & 0x3F_FFFF) << 20) | 4;
        let pos = unpack_section_position(packed);
        assert_eq!(pos, SectionPos { x: -2, y: 4, z: 7 });
        assert_eq!(pos.block(15, 3, 0), BlockPos::new(-17, 67, 112));
    }
}
