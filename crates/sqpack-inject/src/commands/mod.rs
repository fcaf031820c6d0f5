mod config;
mod inspect;
mod patch;

pub use config::{auto_detect_sqpack_path, reset_config, set_sqpack_path, show_config};
pub use inspect::{inspect_index, InspectIndexArgs};
pub use patch::{patch_archive, PatchArchiveArgs};

use crate::errors::CliError;
use crate::utils::{config::load_config, sqpack_path::archive_file};
use camino::{Utf8Path, Utf8PathBuf};

/// Use the explicit path if given, otherwise derive `<archive>.<suffix>` from the configured sqpack directory.
fn resolve_archive_path(
    explicit: Option<String>,
    archive: &str,
    suffix: &str,
    what: &'static str,
) -> Result<Utf8PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(Utf8PathBuf::from(path));
    }

    let sqpack_path = load_config()
        .sqpack_path
        .ok_or_else(|| CliError::sqpack_path_missing(what))?;
    Ok(archive_file(&sqpack_path, archive, suffix))
}

fn ensure_file_exists(path: &Utf8Path) -> Result<(), CliError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::file_not_found(path.as_std_path().to_path_buf()))
    }
}
