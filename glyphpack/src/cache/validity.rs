//! Cache validity evaluation.
//!
//! A cached build is reused only as a whole. The entry for the font must
//! track exactly as many files as are currently resolved, every tracked file
//! must still exist with the same modification time, and an output file must
//! already be on disk for every requested format. Any single mismatch forces
//! a full regeneration; there is no per-format partial hit.

use std::collections::BTreeMap;
use std::fmt;

use crate::format::FontFormat;
use crate::glyph::Glyph;
use crate::request::BuildRequest;

use super::store::CacheStore;

/// Why a cached build cannot be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// Caching is turned off for this build.
    Disabled,
    /// The store has no entry for the font.
    NoEntry,
    /// Files were added or removed.
    FileCountChanged { cached: usize, current: usize },
    /// A tracked file disappeared or its modification time changed.
    SourceChanged(String),
    /// A requested output file is not on disk.
    OutputMissing(FontFormat),
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::Disabled => write!(f, "cache disabled"),
            MissReason::NoEntry => write!(f, "no cache entry"),
            MissReason::FileCountChanged { cached, current } => {
                write!(f, "source count changed ({} -> {})", cached, current)
            }
            MissReason::SourceChanged(path) => write!(f, "source changed: {}", path),
            MissReason::OutputMissing(format) => write!(f, "{} output missing", format),
        }
    }
}

/// Outcome of checking the cache for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// The previous outputs are valid; reuse these glyphs and fingerprint.
    Hit {
        glyphs: Vec<Glyph>,
        fingerprint: Option<String>,
    },
    /// Everything must be regenerated.
    Miss(MissReason),
}

impl CacheDecision {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheDecision::Hit { .. })
    }
}

/// Decides whether the cached build of `request.font_name` is still valid.
///
/// `current_mod_times` is the freshly stat'd source set, keyed like the
/// cache (see [`crate::source::source_key`]).
pub fn evaluate(
    store: Option<&CacheStore>,
    request: &BuildRequest,
    current_mod_times: &BTreeMap<String, u64>,
) -> CacheDecision {
    let Some(store) = store else {
        return CacheDecision::Miss(MissReason::Disabled);
    };
    let Some(entry) = store.get(&request.font_name) else {
        return CacheDecision::Miss(MissReason::NoEntry);
    };

    if entry.file_mod_times.len() != current_mod_times.len() {
        return CacheDecision::Miss(MissReason::FileCountChanged {
            cached: entry.file_mod_times.len(),
            current: current_mod_times.len(),
        });
    }

    // Every cached key present with the same mtime. Together with the count
    // check and a deduplicated current set this means the sets are equal.
    for (path, cached_time) in &entry.file_mod_times {
        if current_mod_times.get(path) != Some(cached_time) {
            return CacheDecision::Miss(MissReason::SourceChanged(path.clone()));
        }
    }

    if let Some(format) = request
        .formats
        .iter()
        .find(|format| !request.output_path(*format).exists())
    {
        return CacheDecision::Miss(MissReason::OutputMissing(format));
    }

    CacheDecision::Hit {
        glyphs: entry.glyphs.clone(),
        fingerprint: entry.fingerprint.clone(),
    }
}
