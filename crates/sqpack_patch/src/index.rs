//! In-memory SqPack index for record lookup and offset rewriting.
//!
//! The [`IndexStore`] owns the raw bytes of a `.index` file and is the single
//! source of truth for every record in it. Lookups return a lightweight
//! [`IndexRecord`] copy that remembers the *slot* the record was read from;
//! rewriting a record's location means writing new bytes into that slot via
//! [`IndexStore::update_offset`]. After patching, [`IndexStore::into_bytes`]
//! hands back the buffer, byte-identical to the input except for the rewritten
//! packed offsets.
//!
//! # Layout
//!
//! ```text
//! 0x0C                  u32  offset of the index header block
//! header + 0x08         u32  offset of the file table
//! header + 0x0C         u32  byte length of the file table
//! file table            16-byte records:
//!                         u32 file hash
//!                         u32 directory hash
//!                         u32 packed offset
//!                         u32 reserved
//! ```

use crate::error::{Error, Result};
use crate::hash::PathKey;
use crate::locator::{DataLocator, PackedOffset};
use byteorder::{ByteOrder, LE};
use std::collections::HashMap;

/// Absolute position of the header-block offset.
pub const HEADER_OFFSET_POSITION: usize = 0x0C;

/// Position of the file-table offset, relative to the header block.
pub const FILE_TABLE_OFFSET_FIELD: usize = 0x08;

/// Position of the file-table byte length, relative to the header block.
pub const FILE_TABLE_LENGTH_FIELD: usize = 0x0C;

/// Size of one record in the file table.
pub const RECORD_STRIDE: usize = 0x10;

const RECORD_FILE_HASH: usize = 0x00;
const RECORD_DIRECTORY_HASH: usize = 0x04;
const RECORD_PACKED_OFFSET: usize = 0x08;

/// One file record, as read from its slot in the file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    pub key: PathKey,
    pub packed_offset: PackedOffset,
    /// Position of the record within the file table.
    pub slot: usize,
}

impl IndexRecord {
    pub fn locator(&self) -> DataLocator {
        self.packed_offset.decode()
    }
}

/// Parsed SqPack index with a combined-key lookup table.
#[derive(Debug)]
pub struct IndexStore {
    bytes: Vec<u8>,
    file_table_offset: usize,
    record_count: usize,
    /// `PathKey::combined()` -> slot.
    lookup: HashMap<u64, usize>,
    duplicate_keys: usize,
}

impl IndexStore {
    /// Parse an index file.
    ///
    /// Fails with [`Error::MalformedIndex`] if the header or the file table
    /// does not fit inside `bytes`. A key that appears in more than one slot
    /// resolves to its first slot.
    pub fn build(bytes: Vec<u8>) -> Result<Self> {
        let header_offset = read_u32_at(&bytes, HEADER_OFFSET_POSITION, "header offset")? as usize;
        let file_table_offset = read_u32_at(
            &bytes,
            header_offset + FILE_TABLE_OFFSET_FIELD,
            "file table offset",
        )? as usize;
        let file_table_length = read_u32_at(
            &bytes,
            header_offset + FILE_TABLE_LENGTH_FIELD,
            "file table length",
        )? as usize;

        if file_table_length % RECORD_STRIDE != 0 {
            return Err(Error::MalformedIndex(format!(
                "file table length {:#x} is not a multiple of {:#x}",
                file_table_length, RECORD_STRIDE
            )));
        }

        let file_table_end = file_table_offset
            .checked_add(file_table_length)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| {
                Error::MalformedIndex(format!(
                    "file table {:#x}+{:#x} exceeds index of {:#x} bytes",
                    file_table_offset,
                    file_table_length,
                    bytes.len()
                ))
            })?;

        let record_count = file_table_length / RECORD_STRIDE;
        let mut lookup = HashMap::with_capacity(record_count);
        let mut duplicate_keys = 0usize;

        for (slot, record) in bytes[file_table_offset..file_table_end]
            .chunks_exact(RECORD_STRIDE)
            .enumerate()
        {
            let key = PathKey::new(
                LE::read_u32(&record[RECORD_DIRECTORY_HASH..]),
                LE::read_u32(&record[RECORD_FILE_HASH..]),
            );

            if let Some(&first_slot) = lookup.get(&key.combined()) {
                duplicate_keys += 1;
                tracing::warn!(
                    "Duplicate index key {} in slot {} (first seen in slot {})",
                    key,
                    slot,
                    first_slot
                );
                continue;
            }
            lookup.insert(key.combined(), slot);
        }

        tracing::debug!(
            "Index parsed: {} records, file table at {:#x}, {} duplicate keys",
            record_count,
            file_table_offset,
            duplicate_keys
        );

        Ok(Self {
            bytes,
            file_table_offset,
            record_count,
            lookup,
            duplicate_keys,
        })
    }

    /// Number of record slots in the file table.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Number of distinct keys that can be looked up.
    pub fn key_count(&self) -> usize {
        self.lookup.len()
    }

    /// Number of slots whose key was already taken by an earlier slot.
    pub fn duplicate_keys(&self) -> usize {
        self.duplicate_keys
    }

    pub fn file_table_offset(&self) -> usize {
        self.file_table_offset
    }

    /// Look up a record by its hash pair.
    pub fn lookup(&self, key: PathKey) -> Option<IndexRecord> {
        self.lookup
            .get(&key.combined())
            .map(|&slot| self.record_at(slot))
    }

    /// Read the record stored in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`record_count`](Self::record_count).
    pub fn record_at(&self, slot: usize) -> IndexRecord {
        let record = &self.bytes[self.slot_position(slot)..][..RECORD_STRIDE];
        IndexRecord {
            key: PathKey::new(
                LE::read_u32(&record[RECORD_DIRECTORY_HASH..]),
                LE::read_u32(&record[RECORD_FILE_HASH..]),
            ),
            packed_offset: PackedOffset(LE::read_u32(&record[RECORD_PACKED_OFFSET..])),
            slot,
        }
    }

    /// Iterate over every record in file-table order.
    pub fn records(&self) -> impl Iterator<Item = IndexRecord> + '_ {
        (0..self.record_count).map(|slot| self.record_at(slot))
    }

    /// Overwrite the packed offset stored in `slot`.
    ///
    /// This is the only way records are mutated.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`record_count`](Self::record_count).
    pub fn update_offset(&mut self, slot: usize, packed_offset: PackedOffset) {
        assert!(slot < self.record_count, "slot {slot} out of range");
        let position = self.slot_position(slot) + RECORD_PACKED_OFFSET;
        LE::write_u32(&mut self.bytes[position..position + 4], packed_offset.raw());
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the store and return the (possibly rewritten) index bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn slot_position(&self, slot: usize) -> usize {
        self.file_table_offset + slot * RECORD_STRIDE
    }
}

fn read_u32_at(bytes: &[u8], position: usize, field: &str) -> Result<u32> {
    bytes
        .get(position..position.saturating_add(4))
        .filter(|field_bytes| field_bytes.len() == 4)
        .map(LE::read_u32)
        .ok_or_else(|| {
            Error::MalformedIndex(format!(
                "{} at {:#x} lies outside index of {:#x} bytes",
                field,
                position,
                bytes.len()
            ))
        })
}

/// Assemble a minimal index buffer from records. Used by tests across the crate.
#[cfg(test)]
pub(crate) fn build_index_bytes(records: &[(PathKey, PackedOffset)]) -> Vec<u8> {
    const HEADER_BLOCK: usize = 0x400;
    const FILE_TABLE: usize = 0x800;

    let mut bytes = vec![0u8; FILE_TABLE + records.len() * RECORD_STRIDE];
    LE::write_u32(&mut bytes[HEADER_OFFSET_POSITION..], HEADER_BLOCK as u32);
    LE::write_u32(
        &mut bytes[HEADER_BLOCK + FILE_TABLE_OFFSET_FIELD..],
        FILE_TABLE as u32,
    );
    LE::write_u32(
        &mut bytes[HEADER_BLOCK + FILE_TABLE_LENGTH_FIELD..],
        (records.len() * RECORD_STRIDE) as u32,
    );
    for (i, (key, packed)) in records.iter().enumerate() {
        let at = FILE_TABLE + i * RECORD_STRIDE;
        LE::write_u32(&mut bytes[at + RECORD_FILE_HASH..], key.file_hash);
        LE::write_u32(&mut bytes[at + RECORD_DIRECTORY_HASH..], key.directory_hash);
        LE::write_u32(&mut bytes[at + RECORD_PACKED_OFFSET..], packed.raw());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records(n: u32) -> Vec<(PathKey, PackedOffset)> {
        (0..n)
            .map(|i| (PathKey::new(0xd000 + i, 0xf000 + i), PackedOffset(i << 4)))
            .collect()
    }

    #[test]
    fn test_build_resolves_every_record() {
        let records = sample_records(32);
        let store = IndexStore::build(build_index_bytes(&records)).unwrap();

        assert_eq!(store.record_count(), 32);
        assert_eq!(store.key_count(), 32);
        for (slot, (key, packed)) in records.iter().enumerate() {
            let record = store.lookup(*key).unwrap();
            assert_eq!(record.slot, slot);
            assert_eq!(record.packed_offset, *packed);
        }
        assert!(store.lookup(PathKey::new(0x1, 0x2)).is_none());
        // swapped halves are a different key
        assert!(store.lookup(PathKey::new(0xf000, 0xd000)).is_none());
    }

    #[test]
    fn test_build_empty_table() {
        let store = IndexStore::build(build_index_bytes(&[])).unwrap();
        assert_eq!(store.record_count(), 0);
        assert_eq!(store.records().count(), 0);
    }

    #[test]
    fn test_update_offset_only_touches_slot() {
        let records = sample_records(4);
        let original = build_index_bytes(&records);
        let mut store = IndexStore::build(original.clone()).unwrap();

        let packed = DataLocator::new(1, 0x800).encode().unwrap();
        store.update_offset(2, packed);

        assert_eq!(store.record_at(2).locator(), DataLocator::new(1, 0x800));
        assert_eq!(store.lookup(records[2].0).unwrap().packed_offset, packed);

        let patched = store.into_bytes();
        let changed: Vec<usize> = original
            .iter()
            .zip(&patched)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        let field = 0x800 + 2 * RECORD_STRIDE + RECORD_PACKED_OFFSET;
        assert!(changed.iter().all(|&i| (field..field + 4).contains(&i)));
        assert!(!changed.is_empty());
    }

    #[test]
    fn test_duplicate_keys_keep_first_slot() {
        let key = PathKey::new(7, 9);
        let records = vec![(key, PackedOffset(0x10)), (key, PackedOffset(0x20))];
        let store = IndexStore::build(build_index_bytes(&records)).unwrap();

        assert_eq!(store.record_count(), 2);
        assert_eq!(store.key_count(), 1);
        assert_eq!(store.duplicate_keys(), 1);
        assert_eq!(store.lookup(key).unwrap().slot, 0);
    }

    #[test]
    fn test_truncated_header() {
        let err = IndexStore::build(vec![0u8; 0x0E]).unwrap_err();
        assert!(matches!(err, Error::MalformedIndex(_)));
    }

    #[test]
    fn test_header_block_out_of_bounds() {
        let mut bytes = build_index_bytes(&sample_records(1));
        LE::write_u32(&mut bytes[HEADER_OFFSET_POSITION..], 0xFFFF_FFF0);
        assert!(matches!(
            IndexStore::build(bytes),
            Err(Error::MalformedIndex(_))
        ));
    }

    #[test]
    fn test_file_table_out_of_bounds() {
        let mut bytes = build_index_bytes(&sample_records(2));
        LE::write_u32(&mut bytes[0x400 + FILE_TABLE_LENGTH_FIELD..], 0x30);
        assert!(matches!(
            IndexStore::build(bytes),
            Err(Error::MalformedIndex(_))
        ));
    }

    #[test]
    fn test_file_table_length_not_multiple_of_stride() {
        let mut bytes = build_index_bytes(&sample_records(2));
        LE::write_u32(&mut bytes[0x400 + FILE_TABLE_LENGTH_FIELD..], 0x18);
        assert!(matches!(
            IndexStore::build(bytes),
            Err(Error::MalformedIndex(_))
        ));
    }
}
