//! Error types for archive patching.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. Every variant is fatal for a patch run: the patcher never
//! publishes a partially rewritten index.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, patching or writing an archive.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading inputs, writing staged outputs, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A staged output could not be renamed into place.
    #[error("Failed to publish output: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// The index header or file table points outside the index buffer.
    #[error("Malformed index: {0}")]
    MalformedIndex(String),

    /// The original data segment is too small to supply a header template.
    #[error("Malformed data segment: expected at least {expected:#x} header bytes, found {actual:#x}")]
    MalformedSegment { expected: usize, actual: usize },

    /// A mod entry targets a path that has no record in the index.
    #[error("Unresolved target '{path}' (directory hash {directory_hash:08x}, file hash {file_hash:08x})")]
    UnresolvedTarget {
        path: String,
        directory_hash: u32,
        file_hash: u32,
    },

    /// A mod entry's payload range exceeds the payload blob.
    #[error("Truncated payload for '{path}': range {offset}+{size} exceeds blob of {blob_len} bytes")]
    TruncatedPayload {
        path: String,
        offset: u64,
        size: u64,
        blob_len: usize,
    },

    /// An offset is not a multiple of the format's quantization step.
    #[error("Offset {offset:#x} is not aligned to {alignment:#x}")]
    Alignment { offset: u64, alignment: u64 },

    /// A quantized offset does not fit into the packed offset field.
    #[error("Offset {0:#x} exceeds the addressable range of a packed offset")]
    OffsetOutOfRange(u64),

    /// A segment index does not fit into the packed offset field.
    #[error("Segment index {index} exceeds the maximum of {max}")]
    SegmentIndexOutOfRange { index: u8, max: u8 },

    /// The configured index of the appended segment would overwrite the
    /// original segment or does not fit into a packed offset.
    #[error("New segment index {index} must be between 1 and {max}")]
    InvalidNewSegmentIndex { index: u8, max: u8 },

    /// A line of the mod descriptor could not be parsed.
    #[error("Invalid mod descriptor at line {line}: {source}")]
    InvalidDescriptor {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The original segment file name does not end in `.dat<N>`.
    #[error("Cannot derive segment file name from {0}")]
    InvalidSegmentName(Utf8PathBuf),
}
