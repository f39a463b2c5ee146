//! Persisted build cache.
//!
//! The store is a single JSON object mapping font names to the state of their
//! last successful build:
//!
//! ```text
//! {
//!   "icons": {
//!     "glyphs": [{ "name": "star", "sourceFile": "/src/star.svg", "codepoint": 59905 }],
//!     "fileModTimes": { "/src/star.svg": 1700000000000 },
//!     "fingerprint": "cbf43926"
//!   }
//! }
//! ```
//!
//! A missing or unreadable store is an empty store. Writes go to a sibling
//! temp file that is renamed into place, so readers never see a torn file.
//! Separate processes building against the same store are not coordinated.

use std::collections::BTreeMap;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::glyph::Glyph;

/// State of one font's last successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Glyphs in code point order.
    pub glyphs: Vec<Glyph>,
    /// Source path → modification time (ms since the Unix epoch).
    pub file_mod_times: BTreeMap<String, u64>,
    /// CRC-32 fingerprint of the generated SVG font.
    #[serde(default)]
    pub fingerprint: Option<String>,
}

impl CacheEntry {
    pub fn new(
        glyphs: Vec<Glyph>,
        file_mod_times: BTreeMap<String, u64>,
        fingerprint: Option<String>,
    ) -> Self {
        Self {
            glyphs,
            file_mod_times,
            fingerprint,
        }
    }
}

/// Font name → [`CacheEntry`] partitions sharing one cache file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheStore {
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store at `path`, falling back to an empty store when the
    /// file is missing, unreadable or not a valid cache document.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => {
                debug!(
                    path = %path.display(),
                    fonts = store.len(),
                    "Loaded font cache"
                );
                store
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No font cache yet, starting cold");
                Self::new()
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable font cache"
                );
                Self::new()
            }
        }
    }

    /// Loads the store at `path`, reporting every failure.
    pub fn try_load(path: &Path) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);

        serde_json::from_reader(reader).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to deserialize font cache: {}", e),
            )
        })
    }

    /// Persists the store to `path`.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = temp_path_for(path);
        {
            let file = std::fs::File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, self)
                .map_err(|e| io::Error::other(format!("Failed to serialize font cache: {}", e)))?;
            writer.flush()?;
        }

        std::fs::rename(&temp_path, path)?;

        debug!(path = %path.display(), fonts = self.len(), "Saved font cache");
        Ok(())
    }

    /// Returns the entry for `font_name`.
    pub fn get(&self, font_name: &str) -> Option<&CacheEntry> {
        self.entries.get(font_name)
    }

    /// Replaces the entry for `font_name`.
    pub fn insert(&mut self, font_name: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(font_name.into(), entry);
    }

    /// Removes the entry for `font_name`, returning it.
    pub fn remove(&mut self, font_name: &str) -> Option<CacheEntry> {
        self.entries.remove(font_name)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Cached font names, sorted.
    pub fn font_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn temp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
