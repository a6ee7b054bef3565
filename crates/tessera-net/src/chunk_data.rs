//! Bit-packed, palette-compressed block section decoding.
//!
//! A section on the wire is:
//!
//! ```text
//! u16     non-air block count (informational)
//! u8      bits per block, clamped to at least 4
//! VarInt  palette length      } only when bits per block < 9
//! VarInt  palette entries...  }
//! VarInt  packed word count
//! u64...  packed words, floor(64 / bpb) values each, low bits first
//! ```
//!
//! Values never straddle a word boundary. Decoded values fill the 4096 cells
//! in `(y, z, x)` raster order; padding values past the last cell are ignored.

use tessera_world::{SECTION_VOLUME, SubChunk};

use crate::cursor::ByteCursor;
use crate::error::DecodeError;

/// Smallest bits-per-block value; smaller declarations are raised to it.
pub const MIN_BITS_PER_BLOCK: u8 = 4;

/// Bits-per-block values at or above this carry global ids directly.
pub const DIRECT_BITS_PER_BLOCK: u8 = 9;

/// Largest bits-per-block value a `u32` block id can use.
pub const MAX_BITS_PER_BLOCK: u8 = 32;

/// Decodes one block section.
///
/// With an indirect palette, every decoded value must index into it. An
/// empty palette means the values are global ids.
pub fn read_section(cursor: &mut ByteCursor<'_>) -> Result<SubChunk, DecodeError> {
    let _block_count = cursor.read_u16()?;
    let bits_per_block = cursor.read_u8()?.max(MIN_BITS_PER_BLOCK);
    if bits_per_block > MAX_BITS_PER_BLOCK {
        return Err(DecodeError::InvalidBitsPerBlock(bits_per_block));
    }

    let palette = if bits_per_block < DIRECT_BITS_PER_BLOCK {
        read_palette(cursor)?
    } else {
        Vec::new()
    };

    let word_count = cursor.read_length()?;
    let per_word = usize::from(64 / bits_per_block);
    let needed_words = SECTION_VOLUME.div_ceil(per_word);
    if word_count > needed_words {
        return Err(DecodeError::SectionOverflow {
            values: (word_count as u64).saturating_mul(per_word as u64),
            capacity: SECTION_VOLUME,
        });
    }
    cursor.ensure(word_count * 8)?;

    let mask = (1u64 << bits_per_block) - 1;
    let mut blocks = Vec::with_capacity(SECTION_VOLUME);
    for _ in 0..word_count {
        let word = cursor.read_u64()?;
        for slot in 0..per_word {
            if blocks.len() == SECTION_VOLUME {
                break;
            }
            let value = (word >> (slot * usize::from(bits_per_block))) & mask;
            blocks.push(resolve(value, &palette)?);
        }
    }

    Ok(SubChunk::from_blocks(blocks))
}

fn read_palette(cursor: &mut ByteCursor<'_>) -> Result<Vec<u32>, DecodeError> {
    let length = cursor.read_length()?;
    // Each entry takes at least one byte.
    cursor.ensure(length)?;
    let mut palette = Vec::with_capacity(length);
    for _ in 0..length {
        palette.push(cursor.read_varint()? as u32);
    }
    Ok(palette)
}

fn resolve(value: u64, palette: &[u32]) -> Result<u32, DecodeError> {
    if palette.is_empty() {
        return Ok(value as u32);
    }
    palette
        .get(value as usize)
        .copied()
        .ok_or(DecodeError::PaletteIndexOutOfRange {
            index: value,
            length: palette.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::write_varint;

    /// Encodes a section body with the given palette and packed words.
    fn encode(bpb: u8, palette: Option<&[u64]>, words: &[u64]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0u16.to_be_bytes());
        out.push(bpb);
        if let Some(palette) = palette {
            write_varint(&mut out, palette.len() as u64);
            for &entry in palette {
                write_varint(&mut out, entry);
            }
        }
        write_varint(&mut out, words.len() as u64);
        for word in words {
            out.extend_from_slice(&word.to_be_bytes());
        }
        out.push(0);
        out
    }

    #[test]
    fn test_palette_lookup_bpb_5() {
        let data = encode(5, Some(&[1, 9, 33]), &[0b00010]);
        let mut cursor = ByteCursor::over_slice(&data);
        let section = read_section(&mut cursor).expect("valid section");
        assert_eq!(section.get(0, 0, 0), 33);
        // Remaining values in the word are index 0.
        assert_eq!(section.get(1, 0, 0), 1);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_values_low_bits_first() {
        // bpb 4: sixteen values per word.
        let word = 0x0000_0000_0000_0321u64;
        let data = encode(4, Some(&[0, 10, 20, 30]), &[word]);
        let mut cursor = ByteCursor::over_slice(&data);
        let section = read_section(&mut cursor).expect("valid section");
        assert_eq!(section.get(0, 0, 0), 10);
        assert_eq!(section.get(1, 0, 0), 20);
        assert_eq!(section.get(2, 0, 0), 30);
        assert_eq!(section.get(3, 0, 0), 0);
        assert_eq!(section.non_air_count(), 3);
    }

    #[test]
    fn test_bits_per_block_clamped_to_four() {
        // Declared 2, decoded as 4: 0x51 yields values 1 then 5.
        let data = encode(2, Some(&[0, 7, 0, 0, 0, 8]), &[0x51]);
        let mut cursor = ByteCursor::over_slice(&data);
        let section = read_section(&mut cursor).expect("valid section");
        assert_eq!(section.get(0, 0, 0), 7);
        assert_eq!(section.get(1, 0, 0), 8);
    }

    #[test]
    fn test_direct_ids_above_eight_bits() {
        // bpb 14: four values per word.
        let word = 7540u64 | (1u64 << 14) | (2u64 << 28);
        let data = encode(14, None, &[word]);
        let mut cursor = ByteCursor::over_slice(&data);
        let section = read_section(&mut cursor).expect("valid section");
        assert_eq!(section.get(0, 0, 0), 7540);
        assert_eq!(section.get(1, 0, 0), 1);
        assert_eq!(section.get(2, 0, 0), 2);
        assert_eq!(section.get(3, 0, 0), 0);
    }

    #[test]
    fn test_empty_palette_means_direct_ids() {
        let data = encode(4, Some(&[]), &[5]);
        let mut cursor = ByteCursor::over_slice(&data);
        let section = read_section(&mut cursor).expect("valid section");
        assert_eq!(section.get(0, 0, 0), 5);
        assert_eq!(section.non_air_count(), 1);
    }

    #[test]
    fn test_palette_index_out_of_range() {
        let data = encode(4, Some(&[1, 2, 3]), &[3]);
        let mut cursor = ByteCursor::over_slice(&data);
        let err = read_section(&mut cursor).expect_err("index 3 of 3");
        assert!(matches!(
            err,
            DecodeError::PaletteIndexOutOfRange {
                index: 3,
                length: 3
            }
        ));
    }

    #[test]
    fn test_raster_fill_order() {
        // bpb 4, 256 words: word k holds cells 16k..16k+16, i.e. row (y, z) = divmod(k, 16).
        let mut words = vec![0u64; 256];
        words[16 + 2] = 1 << (4 * 7); // y=1, z=2, x=7
        let data = encode(4, Some(&[0, 42]), &words);
        let mut cursor = ByteCursor::over_slice(&data);
        let section = read_section(&mut cursor).expect("valid section");
        assert_eq!(section.get(7, 1, 2), 42);
        assert_eq!(section.non_air_count(), 1);
    }

    #[test]
    fn test_padding_values_ignored() {
        // bpb 5: 12 values per word, 342 words cover 4104 values.
        let mut words = vec![0u64; 342];
        words[341] = u64::MAX >> 4;
        let data = encode(5, Some(&[0, 1]), &words);
        let mut cursor = ByteCursor::over_slice(&data);
        let err = read_section(&mut cursor).expect_err("index 31 in last word");
        assert!(matches!(err, DecodeError::PaletteIndexOutOfRange { .. }));

        // Only the padding slots (cells 4096..4104) are out of range here.
        let mut words = vec![0u64; 342];
        words[341] = (!0u64 << 20) & (u64::MAX >> 4);
        let data = encode(5, Some(&[0, 1]), &words);
        let mut cursor = ByteCursor::over_slice(&data);
        let section = read_section(&mut cursor).expect("padding ignored");
        assert!(section.is_empty());
    }

    #[test]
    fn test_too_many_words() {
        let words = vec![0u64; 257];
        let data = encode(4, Some(&[0]), &words);
        let mut cursor = ByteCursor::over_slice(&data);
        assert!(matches!(
            read_section(&mut cursor),
            Err(DecodeError::SectionOverflow { .. })
        ));
    }

    #[test]
    fn test_truncated_section_is_incomplete() {
        let mut data = encode(4, Some(&[0, 1]), &[1, 1]);
        data.truncate(data.len() - 5);
        data.push(0);
        let mut cursor = ByteCursor::over_slice(&data);
        assert!(read_section(&mut cursor).expect_err("short").is_incomplete());
    }

    #[test]
    fn test_oversized_bits_per_block() {
        let data = encode(40, None, &[]);
        let mut cursor = ByteCursor::over_slice(&data);
        assert!(matches!(
            read_section(&mut cursor),
            Err(DecodeError::InvalidBitsPerBlock(40))
        ));
    }
}
