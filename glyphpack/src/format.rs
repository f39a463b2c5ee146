//! Output font formats.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A font container format the pipeline can produce.
///
/// The declaration order is also the stage order: SVG is assembled first,
/// TTF is derived from SVG, and the remaining formats are derived from TTF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontFormat {
    Svg,
    Ttf,
    Woff,
    Woff2,
    Eot,
}

impl FontFormat {
    /// Every supported format, in stage order.
    pub const ALL: [FontFormat; 5] = [
        FontFormat::Svg,
        FontFormat::Ttf,
        FontFormat::Woff,
        FontFormat::Woff2,
        FontFormat::Eot,
    ];

    /// File extension (without the dot), also used as the format's name.
    pub fn extension(&self) -> &'static str {
        match self {
            FontFormat::Svg => "svg",
            FontFormat::Ttf => "ttf",
            FontFormat::Woff => "woff",
            FontFormat::Woff2 => "woff2",
            FontFormat::Eot => "eot",
        }
    }

    /// True for formats transcoded from the TTF buffer.
    pub fn is_derived_from_ttf(&self) -> bool {
        matches!(self, FontFormat::Woff | FontFormat::Woff2 | FontFormat::Eot)
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Error returned when a format name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown font format '{0}' (expected svg, ttf, woff, woff2 or eot)")]
pub struct UnknownFormat(pub String);

impl FromStr for FontFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('.').to_ascii_lowercase();
        FontFormat::ALL
            .into_iter()
            .find(|format| format.extension() == name)
            .ok_or_else(|| UnknownFormat(s.trim().to_string()))
    }
}

/// The set of formats requested for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSet(BTreeSet<FontFormat>);

impl FormatSet {
    /// Creates a set from any collection of formats.
    pub fn new(formats: impl IntoIterator<Item = FontFormat>) -> Self {
        Self(formats.into_iter().collect())
    }

    /// An empty set.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true if `format` is requested.
    pub fn contains(&self, format: FontFormat) -> bool {
        self.0.contains(&format)
    }

    /// Adds a format to the set.
    pub fn insert(&mut self, format: FontFormat) {
        self.0.insert(format);
    }

    /// Returns true when the TTF stage has to run: TTF itself, or any format
    /// transcoded from it, is requested.
    pub fn needs_ttf(&self) -> bool {
        self.0
            .iter()
            .any(|f| *f == FontFormat::Ttf || f.is_derived_from_ttf())
    }

    /// Iterates over the requested formats in stage order.
    pub fn iter(&self) -> impl Iterator<Item = FontFormat> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FormatSet {
    /// `eot`, `woff` and `ttf`, the classic web-font bundle.
    fn default() -> Self {
        Self::new([FontFormat::Eot, FontFormat::Woff, FontFormat::Ttf])
    }
}

impl FromStr for FormatSet {
    type Err = UnknownFormat;

    /// Parses a comma or whitespace separated list such as `"eot, woff,ttf"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(FontFormat::from_str)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for FormatSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|f| f.extension()).collect();
        f.write_str(&names.join(","))
    }
}

impl FromIterator<FontFormat> for FormatSet {
    fn from_iter<I: IntoIterator<Item = FontFormat>>(iter: I) -> Self {
        Self::new(iter)
    }
}
