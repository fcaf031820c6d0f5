use super::{ensure_file_exists, resolve_archive_path};
use crate::println_pad;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use sqpack_patch::{IndexStore, PathKey};
use std::collections::BTreeMap;

pub struct InspectIndexArgs {
    pub index: Option<String>,
    pub archive: String,
    pub paths: Vec<String>,
}

pub fn inspect_index(args: InspectIndexArgs) -> Result<()> {
    let index_path = resolve_archive_path(args.index, &args.archive, "win32.index", "index")?;
    ensure_file_exists(&index_path)?;

    let bytes = std::fs::read(index_path.as_std_path()).into_diagnostic()?;
    tracing::debug!("Read {} bytes from {}", bytes.len(), index_path);
    let store = IndexStore::build(bytes).into_diagnostic()?;

    println_pad!(
        "{} {}",
        "📇 Index:".bright_blue().bold(),
        index_path.as_str().bright_cyan().bold()
    );
    println_pad!(
        "{} {:#x}",
        "📍 File table offset:".bright_yellow(),
        store.file_table_offset()
    );
    println_pad!(
        "{} {} {}",
        "🗂️  Records:".bright_yellow(),
        store.record_count().to_string().bright_white().bold(),
        format!("({} duplicate keys)", store.duplicate_keys()).dimmed()
    );

    let mut per_segment: BTreeMap<u8, usize> = BTreeMap::new();
    let mut synonyms = 0usize;
    for record in store.records() {
        *per_segment.entry(record.packed_offset.segment_index()).or_default() += 1;
        if record.packed_offset.is_synonym() {
            synonyms += 1;
        }
    }

    println_pad!("\n{}", "🗄️  Segments:".bright_magenta().bold());
    for (segment, count) in &per_segment {
        println_pad!(
            "   {} {} {}",
            "•".bright_cyan(),
            format!("dat{}", segment).bright_cyan().bold(),
            format!("({} records)", count).dimmed()
        );
    }
    if synonyms > 0 {
        println_pad!(
            "   {} {}",
            "•".bright_cyan(),
            format!("{} records flagged as synonyms", synonyms).dimmed()
        );
    }

    if args.paths.is_empty() {
        return Ok(());
    }

    println_pad!("\n{}", "🔎 Paths:".bright_magenta().bold());
    for path in &args.paths {
        let key = PathKey::from_path(path);
        tracing::debug!("Looking up {} ({})", path, key);
        match store.lookup(key) {
            Some(record) => {
                let locator = record.locator();
                println_pad!(
                    "   {} {} {} -> dat{} @ {:#x}",
                    "✓".bright_green(),
                    path.bright_white().bold(),
                    format!("[{}]", key).dimmed(),
                    locator.segment_index,
                    locator.offset
                );
            }
            None => println_pad!(
                "   {} {} {} {}",
                "✗".bright_red(),
                path.bright_white().bold(),
                format!("[{}]", key).dimmed(),
                "not found".bright_red()
            ),
        }
    }

    Ok(())
}
