use super::{ensure_file_exists, resolve_archive_path};
use crate::errors::CliError;
use crate::println_pad;
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use sqpack_patch::{ArchivePatcher, Error as PatchError, PatchConfig};

#[derive(Debug)]
pub struct PatchArchiveArgs {
    pub index: Option<String>,
    pub dat: Option<String>,
    pub archive: String,
    pub mod_list: String,
    pub mod_data: String,
    pub output_dir: String,
    pub segment: u8,
    pub backup: bool,
}

pub fn patch_archive(args: PatchArchiveArgs) -> Result<()> {
    let index_path = resolve_archive_path(args.index, &args.archive, "win32.index", "index")?;
    let dat_path = resolve_archive_path(args.dat, &args.archive, "win32.dat0", "dat")?;
    let mod_list_path = Utf8PathBuf::from(args.mod_list);
    let mod_data_path = Utf8PathBuf::from(args.mod_data);

    for path in [&index_path, &dat_path, &mod_list_path, &mod_data_path] {
        ensure_file_exists(path)?;
    }
    tracing::debug!(
        "Resolved inputs index={} dat={} mod_list={} mod_data={}",
        index_path,
        dat_path,
        mod_list_path,
        mod_data_path
    );

    println_pad!(
        "{} {}",
        "📦 Patching archive:".bright_blue().bold(),
        index_path.as_str().bright_cyan().bold()
    );
    println_pad!(
        "{} {} + {}",
        "🧩 Mod package:".bright_yellow(),
        mod_list_path.as_str().bright_white(),
        mod_data_path.as_str().bright_white()
    );

    let config = PatchConfig::new(
        index_path,
        dat_path,
        mod_list_path,
        mod_data_path,
        Utf8PathBuf::from(args.output_dir),
    )
    .with_new_segment_index(args.segment)
    .with_backup(args.backup);
    tracing::info!(
        "Starting patch output_dir={} segment={} backup={}",
        config.output_dir,
        config.new_segment_index,
        config.backup_original_index
    );

    let output = match ArchivePatcher::new(config).run() {
        Ok(output) => output,
        Err(PatchError::UnresolvedTarget { path, .. }) => {
            tracing::error!("Patch aborted, unresolved target {}", path);
            return Err(CliError::unresolved_target(path).into());
        }
        Err(e) => {
            tracing::error!("Patch aborted: {}", e);
            return Err(e).into_diagnostic();
        }
    };
    tracing::info!(
        "Patch published entries={} payload_bytes={} segment_length={}",
        output.summary.entries_applied,
        output.summary.payload_bytes,
        output.summary.segment_length
    );

    println_pad!(
        "{} {}",
        "📝 Index:".bright_green(),
        output.index_path.as_str().bright_white().bold()
    );
    println_pad!(
        "{} {} {}",
        "🗄️  Segment:".bright_green(),
        output.segment_path.as_str().bright_white().bold(),
        format!("({} bytes)", output.summary.segment_length).dimmed()
    );
    if let Some(backup) = &output.backup_path {
        println_pad!(
            "{} {}",
            "💾 Original index backup:".bright_magenta(),
            backup.as_str().bright_white()
        );
    }
    println_pad!(
        "{}",
        format!(
            "✅ Redirected {} file(s), {} payload bytes",
            output.summary.entries_applied, output.summary.payload_bytes
        )
        .bright_green()
        .bold()
    );

    Ok(())
}
