//! Path normalization and hash resolution.
//!
//! SqPack index files never store path strings. A game path such as
//! `common/font/font1.tex` is split into its parent directory and file name,
//! and each half is hashed independently into a `u32`. The pair of hashes is
//! the [`PathKey`] used to find a record in the index.

use std::fmt;

/// Hash a single path component the way SqPack index files do.
///
/// This is CRC-32 (IEEE) over the ASCII-lowercased bytes, without the final
/// XOR. The empty string hashes to `0xFFFF_FFFF`, which is the directory hash
/// of a file that sits at the archive root.
pub fn hash_component(component: &str) -> u32 {
    let lowered = component.to_ascii_lowercase();
    !crc32fast::hash(lowered.as_bytes())
}

/// Normalize a game path for hashing.
///
/// Backslashes are converted to forward slashes. Case is left untouched since
/// [`hash_component`] is already case-insensitive.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Split a normalized path into `(directory, file name)` on the last `/`.
///
/// A path without a separator has an empty directory.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Two-level lookup key of an index record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey {
    pub directory_hash: u32,
    pub file_hash: u32,
}

impl PathKey {
    pub fn new(directory_hash: u32, file_hash: u32) -> Self {
        Self {
            directory_hash,
            file_hash,
        }
    }

    /// Compute the key of a game path. Separators are normalized first.
    pub fn from_path(path: &str) -> Self {
        let normalized = normalize_path(path);
        let (directory, file_name) = split_path(&normalized);
        Self::new(hash_component(directory), hash_component(file_name))
    }

    /// Combined 64-bit form: directory hash in the high half, file hash in the low half.
    pub fn combined(self) -> u64 {
        (u64::from(self.directory_hash) << 32) | u64::from(self.file_hash)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}/{:08x}", self.directory_hash, self.file_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_check_value() {
        // CRC-32 check value is 0xCBF43926; the index hash omits the final XOR.
        assert_eq!(hash_component("123456789"), !0xCBF4_3926);
    }

    #[test]
    fn test_hash_empty() {
        assert_eq!(hash_component(""), 0xFFFF_FFFF);
    }

    #[test]
    fn test_hash_case_insensitive() {
        assert_eq!(hash_component("Common/Font"), hash_component("common/font"));
        assert_ne!(hash_component("common"), hash_component("commons"));
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("common/font/font1.tex"), ("common/font", "font1.tex"));
        assert_eq!(split_path("font1.tex"), ("", "font1.tex"));
        assert_eq!(split_path("common/"), ("common", ""));
    }

    #[test]
    fn test_path_key_normalizes_separators() {
        assert_eq!(
            PathKey::from_path("common\\font\\font1.tex"),
            PathKey::from_path("common/font/font1.tex")
        );
    }

    #[test]
    fn test_path_key_components() {
        let key = PathKey::from_path("common/font.tex");
        assert_eq!(key.directory_hash, hash_component("common"));
        assert_eq!(key.file_hash, hash_component("font.tex"));
    }

    #[test]
    fn test_path_key_root_file() {
        let key = PathKey::from_path("font.tex");
        assert_eq!(key.directory_hash, 0xFFFF_FFFF);
    }

    #[test]
    fn test_combined_key() {
        let key = PathKey::new(0x1234_5678, 0x9abc_def0);
        assert_eq!(key.combined(), 0x1234_5678_9abc_def0);
    }

    proptest! {
        #[test]
        fn hash_ignores_ascii_case(s in "[ -~]{0,64}") {
            prop_assert_eq!(hash_component(&s), hash_component(&s.to_ascii_uppercase()));
            prop_assert_eq!(hash_component(&s), hash_component(&s));
        }
    }
}
