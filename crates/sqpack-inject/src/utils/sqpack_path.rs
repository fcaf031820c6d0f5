use camino::{Utf8Path, Utf8PathBuf};

/// Install locations used by the official launcher, relative to a drive root.
const DEFAULT_INSTALL_DIRS: &[&str] = &[
    "Program Files (x86)/SquareEnix/FINAL FANTASY XIV - A Realm Reborn",
    "Program Files/SquareEnix/FINAL FANTASY XIV - A Realm Reborn",
    "SquareEnix/FINAL FANTASY XIV - A Realm Reborn",
    "Program Files (x86)/Steam/steamapps/common/FINAL FANTASY XIV Online",
    "Program Files (x86)/Steam/steamapps/common/FINAL FANTASY XIV - A Realm Reborn",
];

/// The `game/sqpack` directory below an install directory.
const SQPACK_SUBDIR: &str = "game/sqpack";

/// Returns true if `path` is a sqpack directory containing the base archive index.
pub fn is_valid_sqpack_path(path: &Utf8Path) -> bool {
    archive_file(path, "000000", "win32.index").is_file()
}

/// Path of `<archive>.<suffix>` inside the `ffxiv` repository of a sqpack directory.
pub fn archive_file(sqpack_path: &Utf8Path, archive: &str, suffix: &str) -> Utf8PathBuf {
    sqpack_path
        .join("ffxiv")
        .join(format!("{}.{}", archive, suffix))
}

/// Look for a sqpack directory under the default install locations of every drive.
pub fn auto_detect_sqpack_path() -> Option<Utf8PathBuf> {
    candidate_roots()
        .into_iter()
        .flat_map(|root| {
            DEFAULT_INSTALL_DIRS
                .iter()
                .map(move |dir| root.join(dir).join(SQPACK_SUBDIR))
        })
        .find(|candidate| is_valid_sqpack_path(candidate))
}

fn candidate_roots() -> Vec<Utf8PathBuf> {
    if cfg!(target_os = "windows") {
        ('C'..='Z')
            .map(|letter| Utf8PathBuf::from(format!("{}:/", letter)))
            .filter(|root| root.exists())
            .collect()
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_file_layout() {
        assert_eq!(
            archive_file(Utf8Path::new("game/sqpack"), "040000", "win32.dat0"),
            Utf8PathBuf::from("game/sqpack/ffxiv/040000.win32.dat0")
        );
    }

    #[test]
    fn validates_sqpack_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        assert!(!is_valid_sqpack_path(&root));

        std::fs::create_dir_all(root.join("ffxiv")).unwrap();
        std::fs::write(root.join("ffxiv/000000.win32.index"), b"").unwrap();
        assert!(is_valid_sqpack_path(&root));
    }
}
