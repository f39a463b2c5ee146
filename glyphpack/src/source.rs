//! Source set resolution.
//!
//! Turns a glob pattern or an explicit list of glyph files into a
//! deduplicated, absolute, deterministically ordered file set, and reads the
//! modification times the cache validity check is keyed on.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::{BuildError, PipelineResult};

/// Where the glyph sources of a build come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A glob pattern such as `icons/**/*.svg`.
    Pattern(String),
    /// An explicit list of files.
    Paths(Vec<PathBuf>),
}

impl SourceSpec {
    /// Convenience constructor for a glob pattern.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }

    /// Convenience constructor for an explicit file list.
    pub fn paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::Paths(paths.into_iter().map(Into::into).collect())
    }

    /// Expands the pattern or path list into an absolute, duplicate-free file set.
    ///
    /// Pattern matches that are not regular files (directories matched by a
    /// broad glob) are dropped. Explicit paths are taken as given; a missing
    /// file surfaces later as an I/O error when it is stat'd.
    ///
    /// An empty result is valid and means "nothing to build".
    pub fn resolve(&self) -> PipelineResult<Vec<PathBuf>> {
        let cwd = std::env::current_dir().map_err(|e| BuildError::io(".", e))?;

        let files: BTreeSet<PathBuf> = match self {
            SourceSpec::Pattern(pattern) => {
                let entries = glob::glob(pattern).map_err(|e| BuildError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;

                let mut files = BTreeSet::new();
                for entry in entries {
                    match entry {
                        Ok(path) if path.is_file() => {
                            files.insert(absolutize(&cwd, &path));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            // Unreadable directory below the pattern root
                            debug!(error = %e, "Skipping unreadable glob entry");
                        }
                    }
                }
                files
            }
            SourceSpec::Paths(paths) => paths.iter().map(|p| absolutize(&cwd, p)).collect(),
        };

        debug!(count = files.len(), "Resolved glyph sources");
        Ok(files.into_iter().collect())
    }
}

impl From<&str> for SourceSpec {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

impl From<Vec<PathBuf>> for SourceSpec {
    fn from(paths: Vec<PathBuf>) -> Self {
        Self::Paths(paths)
    }
}

/// Joins relative paths onto `cwd` and strips `.` components.
fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    joined
        .components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

/// Key under which a source file is tracked in the cache.
pub fn source_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Reads the modification time of every file, in milliseconds since the
/// Unix epoch, keyed by [`source_key`].
pub fn stat_mod_times(files: &[PathBuf]) -> PipelineResult<BTreeMap<String, u64>> {
    files
        .iter()
        .map(|file| {
            let modified = file
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|e| BuildError::io(file, e))?;
            Ok((source_key(file), millis_since_epoch(modified)))
        })
        .collect()
}

fn millis_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
