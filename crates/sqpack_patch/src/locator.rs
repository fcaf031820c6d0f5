//! Packed offset encoding used by index records.
//!
//! Each index record addresses its data with one `u32`:
//!
//! ```text
//!  31                              4 3     1  0
//! +---------------------------------+-------+---+
//! |      byte offset / ALIGNMENT    |segment|syn|
//! +---------------------------------+-------+---+
//! ```
//!
//! - bit 0 is the synonym flag, set when the record's hash collides and the
//!   real location lives in the index's synonym table. It is never touched here.
//! - bits 1..=3 select the data segment (`.dat0`, `.dat1`, ...).
//! - the remaining bits store the byte offset divided by [`ALIGNMENT`].

use crate::error::{Error, Result};

/// Quantization step of byte offsets inside a data segment.
pub const ALIGNMENT: u64 = 0x80;

/// Number of low bits reserved for the synonym flag.
pub const SYNONYM_FLAG_BITS: u32 = 1;

/// Width of the segment index field.
pub const SEGMENT_INDEX_BITS: u32 = 3;

/// First bit of the quantized offset field.
pub const OFFSET_SHIFT: u32 = SYNONYM_FLAG_BITS + SEGMENT_INDEX_BITS;

/// Largest segment index that fits the packed field.
pub const MAX_SEGMENT_INDEX: u8 = (1 << SEGMENT_INDEX_BITS) - 1;

const SYNONYM_FLAG_MASK: u32 = (1 << SYNONYM_FLAG_BITS) - 1;
const SEGMENT_INDEX_MASK: u32 = (MAX_SEGMENT_INDEX as u32) << SYNONYM_FLAG_BITS;
const MAX_QUANTIZED_OFFSET: u64 = (u32::MAX >> OFFSET_SHIFT) as u64;

/// Round `offset` up to the next multiple of [`ALIGNMENT`].
pub fn align_up(offset: u64) -> u64 {
    offset.div_ceil(ALIGNMENT) * ALIGNMENT
}

/// Decoded location of a file's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLocator {
    pub segment_index: u8,
    pub offset: u64,
}

impl DataLocator {
    pub fn new(segment_index: u8, offset: u64) -> Self {
        Self {
            segment_index,
            offset,
        }
    }

    /// Encode into a packed offset with the synonym flag cleared.
    pub fn encode(self) -> Result<PackedOffset> {
        if self.segment_index > MAX_SEGMENT_INDEX {
            return Err(Error::SegmentIndexOutOfRange {
                index: self.segment_index,
                max: MAX_SEGMENT_INDEX,
            });
        }
        if self.offset % ALIGNMENT != 0 {
            return Err(Error::Alignment {
                offset: self.offset,
                alignment: ALIGNMENT,
            });
        }

        let quantized = self.offset / ALIGNMENT;
        if quantized > MAX_QUANTIZED_OFFSET {
            return Err(Error::OffsetOutOfRange(self.offset));
        }

        let raw = ((quantized as u32) << OFFSET_SHIFT)
            | (u32::from(self.segment_index) << SYNONYM_FLAG_BITS);
        Ok(PackedOffset(raw))
    }
}

/// Raw packed offset as stored in an index record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedOffset(pub u32);

impl PackedOffset {
    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_synonym(self) -> bool {
        self.0 & SYNONYM_FLAG_MASK != 0
    }

    pub fn segment_index(self) -> u8 {
        ((self.0 & SEGMENT_INDEX_MASK) >> SYNONYM_FLAG_BITS) as u8
    }

    pub fn offset(self) -> u64 {
        u64::from(self.0 >> OFFSET_SHIFT) * ALIGNMENT
    }

    pub fn decode(self) -> DataLocator {
        DataLocator::new(self.segment_index(), self.offset())
    }

    /// Re-point this packed offset at `locator`, keeping the synonym flag.
    pub fn relocate(self, locator: DataLocator) -> Result<PackedOffset> {
        let encoded = locator.encode()?;
        Ok(PackedOffset(encoded.0 | (self.0 & SYNONYM_FLAG_MASK)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_layout() {
        // offset 0x800 / 0x80 = 0x10, segment 1, synonym set
        let packed = PackedOffset((0x10 << 4) | (1 << 1) | 1);
        assert!(packed.is_synonym());
        assert_eq!(packed.decode(), DataLocator::new(1, 0x800));
    }

    #[test]
    fn test_encode_layout() {
        let packed = DataLocator::new(2, 0x1000).encode().unwrap();
        assert_eq!(packed.raw(), (0x20 << 4) | (2 << 1));
        assert!(!packed.is_synonym());
    }

    #[test]
    fn test_encode_misaligned() {
        let err = DataLocator::new(1, 0x801).encode().unwrap_err();
        assert!(matches!(
            err,
            Error::Alignment {
                offset: 0x801,
                alignment: 0x80
            }
        ));
    }

    #[test]
    fn test_encode_segment_out_of_range() {
        let err = DataLocator::new(8, 0).encode().unwrap_err();
        assert!(matches!(err, Error::SegmentIndexOutOfRange { index: 8, max: 7 }));
    }

    #[test]
    fn test_encode_offset_out_of_range() {
        let too_far = (MAX_QUANTIZED_OFFSET + 1) * ALIGNMENT;
        assert!(matches!(
            DataLocator::new(0, too_far).encode(),
            Err(Error::OffsetOutOfRange(_))
        ));
        assert!(DataLocator::new(0, MAX_QUANTIZED_OFFSET * ALIGNMENT)
            .encode()
            .is_ok());
    }

    #[test]
    fn test_relocate_keeps_synonym_flag() {
        let original = PackedOffset((0x42 << 4) | 1);
        let moved = original.relocate(DataLocator::new(1, 0x800)).unwrap();
        assert!(moved.is_synonym());
        assert_eq!(moved.decode(), DataLocator::new(1, 0x800));
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), 0x80);
        assert_eq!(align_up(0x80), 0x80);
        assert_eq!(align_up(0x840), 0x880);
    }

    proptest! {
        #[test]
        fn locator_round_trips(segment in 0u8..=MAX_SEGMENT_INDEX, quantized in 0u64..=MAX_QUANTIZED_OFFSET) {
            let locator = DataLocator::new(segment, quantized * ALIGNMENT);
            prop_assert_eq!(locator.encode().unwrap().decode(), locator);
        }
    }
}
