//! Glyph metadata and build results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One icon source mapped to exactly one code point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Glyph {
    /// Glyph name, the source file's stem (`star` for `icons/star.svg`).
    pub name: String,
    /// Absolute path of the SVG source.
    pub source_file: PathBuf,
    /// Assigned private-use code point.
    pub codepoint: u32,
}

impl Glyph {
    pub fn new(name: impl Into<String>, source_file: impl Into<PathBuf>, codepoint: u32) -> Self {
        Self {
            name: name.into(),
            source_file: source_file.into(),
            codepoint,
        }
    }

    /// The CSS escape for this glyph's character, e.g. `\EA01`.
    pub fn css_escape(&self) -> String {
        format!("\\{:X}", self.codepoint)
    }

    /// The glyph's character, if the code point is a Unicode scalar value.
    pub fn as_char(&self) -> Option<char> {
        char::from_u32(self.codepoint)
    }
}

/// How a build arrived at its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// No source files matched; nothing was read or written.
    Empty,
    /// The cache was valid; previous outputs were left in place.
    Reused,
    /// Fonts were generated and the cache entry was refreshed.
    Regenerated,
}

/// The result of one build call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// Glyphs in code point assignment order.
    pub glyphs: Vec<Glyph>,
    /// Cache-busting token, or `None` when disabled or nothing was built.
    pub fingerprint: Option<String>,
    pub outcome: BuildOutcome,
}

impl BuildResult {
    /// The result of a build whose source set was empty.
    pub fn empty() -> Self {
        Self {
            glyphs: Vec::new(),
            fingerprint: None,
            outcome: BuildOutcome::Empty,
        }
    }

    /// Looks up a glyph by name.
    pub fn glyph(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}
