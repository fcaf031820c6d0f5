//! Mod package descriptor (`.mpl`) reading.
//!
//! The descriptor is a text file holding one JSON object per line. Only the
//! fields needed to locate a payload are read; everything else in the object
//! (name, category, dat file, ...) is ignored.
//!
//! ```json
//! {"Name":"Font","Category":"UI","FullPath":"common/font/font1.tex","ModOffset":0,"ModSize":4096,"DatFile":"000000"}
//! ```

use crate::error::{Error, Result};
use crate::hash::normalize_path;
use serde::Deserialize;
use std::io::BufRead;

/// One payload override from the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModEntry {
    #[serde(rename = "FullPath")]
    pub full_path: String,
    /// Start of the payload in the payload blob.
    #[serde(rename = "ModOffset")]
    pub payload_offset: u64,
    #[serde(rename = "ModSize")]
    pub payload_size: u64,
}

impl ModEntry {
    pub fn new(full_path: impl Into<String>, payload_offset: u64, payload_size: u64) -> Self {
        Self {
            full_path: full_path.into(),
            payload_offset,
            payload_size,
        }
    }

    /// Target path with `/` separators.
    pub fn normalized_path(&self) -> String {
        normalize_path(&self.full_path)
    }

    /// Borrow this entry's payload from `blob`.
    pub fn payload<'a>(&self, blob: &'a [u8]) -> Result<&'a [u8]> {
        let truncated = || Error::TruncatedPayload {
            path: self.full_path.clone(),
            offset: self.payload_offset,
            size: self.payload_size,
            blob_len: blob.len(),
        };

        let start = usize::try_from(self.payload_offset).map_err(|_| truncated())?;
        let size = usize::try_from(self.payload_size).map_err(|_| truncated())?;
        let end = start.checked_add(size).ok_or_else(truncated)?;
        blob.get(start..end).ok_or_else(truncated)
    }
}

/// Parse a descriptor, skipping blank lines.
pub fn read_mod_list<R: BufRead>(reader: R) -> Result<Vec<ModEntry>> {
    let mut entries = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let entry = serde_json::from_str::<ModEntry>(&line)
            .map_err(|source| Error::InvalidDescriptor { line: i + 1, source })?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_mod_list() {
        let text = concat!(
            r#"{"Name":"Font","FullPath":"common\\font\\font1.tex","ModOffset":0,"ModSize":128,"DatFile":"000000"}"#,
            "\n\n   \n",
            r#"{"FullPath":"common/font/font2.tex","ModOffset":128,"ModSize":64}"#,
            "\n",
        );

        let entries = read_mod_list(text.as_bytes()).unwrap();
        assert_eq!(
            entries,
            vec![
                ModEntry::new("common\\font\\font1.tex", 0, 128),
                ModEntry::new("common/font/font2.tex", 128, 64),
            ]
        );
        assert_eq!(entries[0].normalized_path(), "common/font/font1.tex");
    }

    #[test]
    fn test_read_mod_list_reports_line() {
        let text = "\n{\"FullPath\":\"a/b\",\"ModOffset\":0,\"ModSize\":1}\n{\"FullPath\":\"a/c\"}\n";
        let err = read_mod_list(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor { line: 3, .. }));
    }

    #[test]
    fn test_payload_slice() {
        let blob: Vec<u8> = (0..=255).collect();
        let entry = ModEntry::new("a/b", 16, 4);
        assert_eq!(entry.payload(&blob).unwrap(), &[16, 17, 18, 19]);
        assert_eq!(ModEntry::new("a/b", 256, 0).payload(&blob).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_payload_out_of_bounds() {
        let blob = vec![0u8; 64];
        for entry in [
            ModEntry::new("a/b", 60, 8),
            ModEntry::new("a/b", 65, 0),
            ModEntry::new("a/b", u64::MAX, 1),
        ] {
            assert!(matches!(
                entry.payload(&blob),
                Err(Error::TruncatedPayload { blob_len: 64, .. })
            ));
        }
    }
}
