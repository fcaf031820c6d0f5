//! Patch engine: redirect index records to payloads appended in a new segment.
//!
//! [`apply_mod_entries`] is the in-memory core. For every [`ModEntry`], in
//! order, it resolves the target record, appends the payload to the segment,
//! and rewrites the record's packed offset to point at the appended bytes.
//! Any failure aborts the whole run.
//!
//! [`ArchivePatcher`] wraps the core with file handling: it reads the inputs,
//! stages both outputs as temporary files inside the output directory, and
//! only renames them into place once every entry has been applied.
//!
//! Entries are expected to target distinct paths. If two entries target the
//! same path, the later one wins and the earlier payload stays in the segment
//! unreferenced.

use crate::error::{Error, Result};
use crate::hash::PathKey;
use crate::index::IndexStore;
use crate::locator::{DataLocator, MAX_SEGMENT_INDEX};
use crate::mod_list::{read_mod_list, ModEntry};
use crate::segment::SegmentWriter;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use tempfile::NamedTempFile;

/// Segment index assigned to the appended segment when none is configured.
pub const DEFAULT_NEW_SEGMENT_INDEX: u8 = 1;

/// Name of the directory (inside the output directory) that receives index backups.
pub const BACKUP_DIR_NAME: &str = "orig";

/// Unix mode of the published index and segment.
#[cfg(unix)]
const PUBLISHED_FILE_MODE: u32 = 0o644;

/// Statistics from applying a mod package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSummary {
    /// Number of index records rewritten.
    pub entries_applied: usize,
    /// Payload bytes copied into the segment, excluding padding.
    pub payload_bytes: u64,
    /// Final length of the new segment.
    pub segment_length: u64,
}

/// Apply `entries` to `index`, appending payloads from `payload_blob` to `segment`.
///
/// Every rewritten record points at `segment_index`. On success the segment
/// is flushed and returned along with a summary; the rewritten index bytes
/// remain in `index`.
pub fn apply_mod_entries<W: Write>(
    index: &mut IndexStore,
    mut segment: SegmentWriter<W>,
    segment_index: u8,
    entries: &[ModEntry],
    payload_blob: &[u8],
) -> Result<(W, PatchSummary)> {
    let mut payload_bytes = 0u64;

    for entry in entries {
        let path = entry.normalized_path();
        let key = PathKey::from_path(&path);

        let record = index.lookup(key).ok_or_else(|| Error::UnresolvedTarget {
            path: path.clone(),
            directory_hash: key.directory_hash,
            file_hash: key.file_hash,
        })?;

        let payload = entry.payload(payload_blob)?;
        let offset = segment.append(payload)?;

        let packed = record
            .packed_offset
            .relocate(DataLocator::new(segment_index, offset))?;
        index.update_offset(record.slot, packed);
        payload_bytes += payload.len() as u64;

        tracing::debug!(
            "Redirected {} ({}) slot={} {:?} -> segment={} offset={:#x} size={}",
            path,
            key,
            record.slot,
            record.locator(),
            segment_index,
            offset,
            payload.len()
        );
    }

    let summary = PatchSummary {
        entries_applied: entries.len(),
        payload_bytes,
        segment_length: segment.position(),
    };
    Ok((segment.finish()?, summary))
}

/// Input and output locations of a patch run. No path is implied.
#[derive(Debug, Clone)]
pub struct PatchConfig {
    /// Original `.index` file.
    pub index_path: Utf8PathBuf,
    /// Original data segment (`.dat0`), used as header template.
    pub segment_path: Utf8PathBuf,
    /// Mod descriptor (`.mpl`).
    pub mod_list_path: Utf8PathBuf,
    /// Mod payload blob (`.mpd`).
    pub mod_data_path: Utf8PathBuf,
    /// Directory that receives the patched index and new segment.
    pub output_dir: Utf8PathBuf,
    /// Index of the appended segment; the archive's segment count becomes this plus one.
    pub new_segment_index: u8,
    /// Copy the original index into `<output_dir>/orig/` before publishing.
    pub backup_original_index: bool,
}

impl PatchConfig {
    pub fn new(
        index_path: impl Into<Utf8PathBuf>,
        segment_path: impl Into<Utf8PathBuf>,
        mod_list_path: impl Into<Utf8PathBuf>,
        mod_data_path: impl Into<Utf8PathBuf>,
        output_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            index_path: index_path.into(),
            segment_path: segment_path.into(),
            mod_list_path: mod_list_path.into(),
            mod_data_path: mod_data_path.into(),
            output_dir: output_dir.into(),
            new_segment_index: DEFAULT_NEW_SEGMENT_INDEX,
            backup_original_index: true,
        }
    }

    pub fn with_new_segment_index(mut self, new_segment_index: u8) -> Self {
        self.new_segment_index = new_segment_index;
        self
    }

    pub fn with_backup(mut self, backup_original_index: bool) -> Self {
        self.backup_original_index = backup_original_index;
        self
    }
}

/// Result of a published patch run.
#[derive(Debug, Clone)]
pub struct PatchOutput {
    pub index_path: Utf8PathBuf,
    pub segment_path: Utf8PathBuf,
    pub backup_path: Option<Utf8PathBuf>,
    pub summary: PatchSummary,
}

/// File-level driver around [`apply_mod_entries`].
pub struct ArchivePatcher {
    config: PatchConfig,
}

impl ArchivePatcher {
    pub fn new(config: PatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Run the patch and publish both outputs.
    ///
    /// Nothing is written to the final output locations unless every entry
    /// was applied. The original index is backed up only after both outputs
    /// were published.
    pub fn run(&self) -> Result<PatchOutput> {
        let config = &self.config;
        validate_new_segment_index(config.new_segment_index)?;

        let index_name = config.index_path.file_name().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("index path has no file name: {}", config.index_path),
            ))
        })?;
        let segment_name = segment_file_name(&config.segment_path, config.new_segment_index)?;

        tracing::info!("Patching archive index={}", config.index_path);
        tracing::info!("Header template: {}", config.segment_path);
        tracing::info!(
            "Mod package: {} + {}",
            config.mod_list_path,
            config.mod_data_path
        );

        let index_bytes = std::fs::read(config.index_path.as_std_path())?;
        let mut index = IndexStore::build(index_bytes)?;
        tracing::info!(
            "Index loaded: {} records ({} duplicate keys)",
            index.record_count(),
            index.duplicate_keys()
        );

        let entries = read_mod_list(BufReader::new(File::open(
            config.mod_list_path.as_std_path(),
        )?))?;
        let payload_blob = std::fs::read(config.mod_data_path.as_std_path())?;
        let template = read_segment_header(&config.segment_path)?;
        tracing::info!(
            "Mod entries: {} (payload blob {} bytes)",
            entries.len(),
            payload_blob.len()
        );

        std::fs::create_dir_all(config.output_dir.as_std_path())?;

        let staged_segment = NamedTempFile::new_in(config.output_dir.as_std_path())?;
        let segment = SegmentWriter::initialize(
            &template,
            u32::from(config.new_segment_index) + 1,
            BufWriter::new(staged_segment),
        )?;

        let (segment_sink, summary) = apply_mod_entries(
            &mut index,
            segment,
            config.new_segment_index,
            &entries,
            &payload_blob,
        )?;
        let staged_segment = segment_sink.into_inner().map_err(|e| e.into_error())?;

        let mut staged_index = NamedTempFile::new_in(config.output_dir.as_std_path())?;
        staged_index.write_all(index.as_bytes())?;
        staged_index.flush()?;

        let segment_path = config.output_dir.join(&segment_name);
        let index_path = config.output_dir.join(index_name);
        publish(staged_segment, staged_index, &segment_path, &index_path)?;

        let backup_path = if config.backup_original_index {
            Some(backup_index(&config.index_path, &config.output_dir, index_name)?)
        } else {
            None
        };

        tracing::info!(
            "Patch complete index={} segment={} entries={} payload_bytes={} segment_length={}",
            index_path,
            segment_path,
            summary.entries_applied,
            summary.payload_bytes,
            summary.segment_length
        );

        Ok(PatchOutput {
            index_path,
            segment_path,
            backup_path,
            summary,
        })
    }
}

/// Segment 0 is the original data segment and must never be replaced.
fn validate_new_segment_index(index: u8) -> Result<()> {
    if index == 0 || index > MAX_SEGMENT_INDEX {
        return Err(Error::InvalidNewSegmentIndex {
            index,
            max: MAX_SEGMENT_INDEX,
        });
    }
    Ok(())
}

/// Derive the file name of segment `segment_index` from an existing segment path.
///
/// `000000.win32.dat0` becomes `000000.win32.dat1` for index 1.
pub fn segment_file_name(segment_path: &Utf8Path, segment_index: u8) -> Result<String> {
    let invalid = || Error::InvalidSegmentName(segment_path.to_path_buf());
    let name = segment_path.file_name().ok_or_else(invalid)?;

    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if stem.len() == name.len() || !stem.to_ascii_lowercase().ends_with(".dat") {
        return Err(invalid());
    }

    Ok(format!("{}{}", stem, segment_index))
}

/// Read just the header block of the original segment; data segments can be gigabytes.
fn read_segment_header(path: &Utf8Path) -> Result<Vec<u8>> {
    use std::io::Read;

    let file = File::open(path.as_std_path())?;
    let mut header = Vec::with_capacity(crate::segment::SEGMENT_HEADER_SIZE);
    file.take(crate::segment::SEGMENT_HEADER_SIZE as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}

fn backup_index(index_path: &Utf8Path, output_dir: &Utf8Path, index_name: &str) -> Result<Utf8PathBuf> {
    let backup_dir = output_dir.join(BACKUP_DIR_NAME);
    std::fs::create_dir_all(backup_dir.as_std_path())?;

    let backup_path = backup_dir.join(index_name);
    std::fs::copy(index_path.as_std_path(), backup_path.as_std_path())?;
    tracing::info!("Backed up original index to {}", backup_path);
    Ok(backup_path)
}

/// Rename both staged outputs into place. If the index cannot be published,
/// the already published segment is removed again.
fn publish(
    staged_segment: NamedTempFile,
    staged_index: NamedTempFile,
    segment_path: &Utf8Path,
    index_path: &Utf8Path,
) -> Result<()> {
    set_published_permissions(&staged_segment)?;
    set_published_permissions(&staged_index)?;

    staged_segment.persist(segment_path.as_std_path())?;

    if let Err(e) = staged_index.persist(index_path.as_std_path()) {
        if let Err(cleanup) = std::fs::remove_file(segment_path.as_std_path()) {
            tracing::warn!(
                "Failed to remove published segment {} after index publish failure: {}",
                segment_path,
                cleanup
            );
        }
        return Err(e.into());
    }

    Ok(())
}

/// Temporary files are created owner-only; published outputs get regular file permissions.
#[cfg(unix)]
fn set_published_permissions(staged: &NamedTempFile) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    staged
        .as_file()
        .set_permissions(std::fs::Permissions::from_mode(PUBLISHED_FILE_MODE))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_published_permissions(_staged: &NamedTempFile) -> Result<()> {
    Ok(())
}
