//! SqPack index injection for FINAL FANTASY XIV mod packages.
//!
//! This crate merges the payloads of a mod package into a SqPack archive
//! without touching the archive's existing data segments. Payloads are
//! appended to a brand new segment (`.dat1`) and the archive's index is
//! rewritten so the affected paths resolve to the appended bytes.
//!
//! The building blocks are:
//!
//! - [`hash`]: the path component hash and the two-level [`PathKey`]
//! - [`locator`]: the packed offset encoding of index records
//! - [`index`]: the [`IndexStore`] that owns and rewrites the index bytes
//! - [`segment`]: the [`SegmentWriter`] for the appended segment
//! - [`mod_list`]: the mod descriptor reader
//! - [`patcher`]: the patch engine and the file-level [`ArchivePatcher`]
//!
//! # Example
//!
//! ```no_run
//! use sqpack_patch::{ArchivePatcher, PatchConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PatchConfig::new(
//!     "sqpack/ffxiv/000000.win32.index",
//!     "sqpack/ffxiv/000000.win32.dat0",
//!     "TTMPL.mpl",
//!     "TTMPD.mpd",
//!     "distrib",
//! );
//!
//! let output = ArchivePatcher::new(config).run()?;
//! println!(
//!     "Redirected {} files into {}",
//!     output.summary.entries_applied, output.segment_path
//! );
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod hash;
pub mod index;
pub mod locator;
pub mod mod_list;
pub mod patcher;
pub mod segment;

pub use error::{Error, Result};
pub use hash::{hash_component, PathKey};
pub use index::{IndexRecord, IndexStore};
pub use locator::{DataLocator, PackedOffset, ALIGNMENT};
pub use mod_list::{read_mod_list, ModEntry};
pub use patcher::{
    apply_mod_entries, segment_file_name, ArchivePatcher, PatchConfig, PatchOutput, PatchSummary,
};
pub use segment::SegmentWriter;
