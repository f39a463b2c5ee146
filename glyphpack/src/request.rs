//! Build request: everything one build call needs, fixed for its duration.

use std::path::{Path, PathBuf};

use crate::codepoint::DEFAULT_START_CODEPOINT;
use crate::error::{BuildError, PipelineResult};
use crate::format::{FontFormat, FormatSet};
use crate::source::SourceSpec;

/// Default cache file name, created next to the working directory.
pub const DEFAULT_CACHE_FILE: &str = ".fontcache.json";

/// Default font name when none is configured.
pub const DEFAULT_FONT_NAME: &str = "iconfont";

/// Glyph shaping options handed to the SVG font encoder.
///
/// The pipeline never interprets these; they only travel to the encoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapingOptions {
    /// Units per em. `None` lets the encoder use the tallest glyph.
    pub font_height: Option<u32>,
    /// Ascent in font units. `None` means `font_height - descent`.
    pub ascent: Option<i32>,
    /// Descent in font units (positive, below the baseline).
    pub descent: Option<i32>,
    /// Scale every glyph to the font height.
    pub normalize: bool,
    /// Center glyphs horizontally in their advance.
    pub center_horizontally: bool,
    /// Give every glyph the same advance width.
    pub fixed_width: bool,
}

/// Which token the build result carries for cache busting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Cachebuster {
    /// The CRC-32 fingerprint of the generated SVG font.
    #[default]
    Hash,
    /// A caller-chosen constant.
    Fixed(String),
    /// No token.
    Disabled,
}

impl Cachebuster {
    /// Applies the policy to a computed fingerprint.
    pub fn apply(&self, fingerprint: Option<String>) -> Option<String> {
        match self {
            Cachebuster::Hash => fingerprint,
            Cachebuster::Fixed(token) => Some(token.clone()),
            Cachebuster::Disabled => None,
        }
    }
}

/// Parameters of one font build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Glyph sources.
    pub sources: SourceSpec,
    /// Directory receiving `<font_name>.<ext>` files.
    pub dest_dir: PathBuf,
    /// Cache store location; `None` disables incremental builds.
    pub cache: Option<PathBuf>,
    /// Font family name, also the output file stem and cache partition key.
    pub font_name: String,
    /// Formats to write.
    pub formats: FormatSet,
    /// First assigned code point.
    pub start_codepoint: u32,
    /// Count code points downwards from `start_codepoint`.
    pub prepend: bool,
    pub shaping: ShapingOptions,
    pub cachebuster: Cachebuster,
}

impl BuildRequest {
    /// Creates a request with default formats, code points and cache file.
    pub fn new(sources: impl Into<SourceSpec>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            sources: sources.into(),
            dest_dir: dest_dir.into(),
            cache: Some(PathBuf::from(DEFAULT_CACHE_FILE)),
            font_name: DEFAULT_FONT_NAME.to_string(),
            formats: FormatSet::default(),
            start_codepoint: DEFAULT_START_CODEPOINT,
            prepend: false,
            shaping: ShapingOptions::default(),
            cachebuster: Cachebuster::default(),
        }
    }

    /// Set the font name.
    pub fn with_font_name(mut self, name: impl Into<String>) -> Self {
        self.font_name = name.into();
        self
    }

    /// Set the requested formats.
    pub fn with_formats(mut self, formats: impl IntoIterator<Item = FontFormat>) -> Self {
        self.formats = FormatSet::new(formats);
        self
    }

    /// Set the cache store location.
    pub fn with_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache = Some(path.into());
        self
    }

    /// Disable the cache store.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Set the first code point and its direction.
    pub fn with_start_codepoint(mut self, start: u32, prepend: bool) -> Self {
        self.start_codepoint = start;
        self.prepend = prepend;
        self
    }

    /// Set the shaping options.
    pub fn with_shaping(mut self, shaping: ShapingOptions) -> Self {
        self.shaping = shaping;
        self
    }

    /// Set the cache-busting policy.
    pub fn with_cachebuster(mut self, cachebuster: Cachebuster) -> Self {
        self.cachebuster = cachebuster;
        self
    }

    /// Output file for `format`: `<dest_dir>/<font_name>.<ext>`.
    pub fn output_path(&self, format: FontFormat) -> PathBuf {
        self.dest_dir
            .join(format!("{}.{}", self.font_name, format.extension()))
    }

    /// Cache store location, if caching is enabled.
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache.as_deref()
    }

    /// Rejects requests whose font name cannot be used as a file stem.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.font_name.trim().is_empty() {
            return Err(BuildError::InvalidRequest(
                "font name must not be empty".to_string(),
            ));
        }
        if self.font_name.contains(['/', '\\']) {
            return Err(BuildError::InvalidRequest(format!(
                "font name '{}' must not contain path separators",
                self.font_name
            )));
        }
        Ok(())
    }
}
