//! Cache management CLI commands.

use std::io;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use glyphpack::cache::{CacheEntry, CacheStore};

use super::common::{format_size, load_config};
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show the fonts recorded in the cache
    Show {
        /// Only show this font
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget cached builds so the next build regenerates everything
    Clear {
        /// Only forget this font
        #[arg(long)]
        name: Option<String>,
    },
}

/// Run a cache subcommand.
pub fn run(
    action: CacheAction,
    file: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<(), CliError> {
    let path = match file {
        Some(path) => path,
        None => load_config(config_path)?.paths.cache.ok_or_else(|| {
            CliError::Config(
                "Caching is disabled in the configuration; pass --file to choose a cache file"
                    .to_string(),
            )
        })?,
    };

    match action {
        CacheAction::Show { name } => run_show(&path, name.as_deref()),
        CacheAction::Clear { name } => run_clear(&path, name.as_deref()),
    }
}

fn run_show(path: &Path, name: Option<&str>) -> Result<(), CliError> {
    let Some(store) = load_existing(path)? else {
        println!("No cache at {}", path.display());
        return Ok(());
    };

    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    println!("Cache: {} ({})", path.display(), format_size(size));

    let mut shown = 0;
    for font in store.font_names() {
        if name.is_some_and(|wanted| wanted != font) {
            continue;
        }
        if let Some(entry) = store.get(font) {
            print_entry(font, entry);
            shown += 1;
        }
    }

    if shown == 0 {
        match name {
            Some(name) => println!("  No entry for font '{}'", name),
            None => println!("  (empty)"),
        }
    }
    Ok(())
}

fn print_entry(font: &str, entry: &CacheEntry) {
    println!();
    println!("[{}]", font);
    println!("  Glyphs:      {}", entry.glyphs.len());
    println!("  Sources:     {}", entry.file_mod_times.len());
    println!(
        "  Fingerprint: {}",
        entry.fingerprint.as_deref().unwrap_or("(none)")
    );
    if let (Some(first), Some(last)) = (entry.glyphs.first(), entry.glyphs.last()) {
        println!("  Code points: U+{:04X}..U+{:04X}", first.codepoint, last.codepoint);
    }
}

fn run_clear(path: &Path, name: Option<&str>) -> Result<(), CliError> {
    let Some(mut store) = load_existing(path)? else {
        println!("No cache at {}", path.display());
        return Ok(());
    };

    match name {
        Some(name) => {
            if store.remove(name).is_none() {
                println!("No entry for font '{}'", name);
                return Ok(());
            }
            store
                .save(path)
                .map_err(|e| CliError::Cache(format!("{}: {}", path.display(), e)))?;
            println!("Removed '{}' from {}", name, path.display());
        }
        None => {
            std::fs::remove_file(path)
                .map_err(|e| CliError::Cache(format!("{}: {}", path.display(), e)))?;
            println!("Deleted {} ({} fonts)", path.display(), store.len());
        }
    }
    Ok(())
}

/// Loads the store, distinguishing "no cache yet" from a broken file.
fn load_existing(path: &Path) -> Result<Option<CacheStore>, CliError> {
    match CacheStore::try_load(path) {
        Ok(store) => Ok(Some(store)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CliError::Cache(format!("{}: {}", path.display(), e))),
    }
}
