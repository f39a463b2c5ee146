//! Format encoders.
//!
//! Encoders are plain buffer-in/buffer-out transformations behind two traits:
//!
//! - [`SvgFontEncoder`] assembles the glyph sources into an SVG font.
//! - [`FontTranscoder`] converts one font buffer into another format
//!   (SVG → TTF, TTF → WOFF/WOFF2/EOT).
//!
//! Encoders never spawn work of their own; the stage executor decides what
//! runs concurrently. Both traits return boxed futures so they can be held
//! as `Arc<dyn ...>` in an [`EncoderSet`].
//!
//! # Built-in encoders
//!
//! | Stage       | Encoder                | Notes                              |
//! |-------------|------------------------|------------------------------------|
//! | glyphs→SVG  | [`SvgFontAssembler`]   | path data is embedded untransformed |
//! | TTF→WOFF    | [`WoffEncoder`]        | WOFF 1.0, zlib per table            |
//! | TTF→EOT     | [`EotEncoder`]         | EOT 2.1 header, uncompressed        |
//! | any         | [`CommandTranscoder`]  | delegates to an external program    |
//!
//! SVG→TTF and TTF→WOFF2 have no built-in encoder; register one with
//! [`EncoderSet::with_transcoder`], typically a [`CommandTranscoder`].

mod command;
mod eot;
mod sfnt;
mod svg;
mod woff;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{BuildError, EncodeError, PipelineResult};
use crate::format::FontFormat;
use crate::glyph::Glyph;
use crate::request::ShapingOptions;

pub use command::CommandTranscoder;
pub use eot::EotEncoder;
pub use sfnt::{SfntFont, TableRecord};
pub use svg::SvgFontAssembler;
pub use woff::WoffEncoder;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result type returned by encoders.
pub type EncodeResult = Result<Vec<u8>, EncodeError>;

/// Assembles glyph sources into an SVG font document.
pub trait SvgFontEncoder: Send + Sync {
    /// Encodes `glyphs` (already in code point order) into an SVG font.
    fn encode<'a>(
        &'a self,
        glyphs: &'a [Glyph],
        font_name: &'a str,
        shaping: &'a ShapingOptions,
    ) -> BoxFuture<'a, EncodeResult>;
}

/// Converts a font buffer into another format.
pub trait FontTranscoder: Send + Sync {
    /// Transcodes `input` into the encoder's output format.
    fn transcode<'a>(&'a self, input: &'a [u8]) -> BoxFuture<'a, EncodeResult>;
}

/// The encoders available to a build, one per format.
#[derive(Clone)]
pub struct EncoderSet {
    svg: Arc<dyn SvgFontEncoder>,
    transcoders: HashMap<FontFormat, Arc<dyn FontTranscoder>>,
}

impl EncoderSet {
    /// Creates a set with the given SVG font encoder and no transcoders.
    pub fn new(svg: Arc<dyn SvgFontEncoder>) -> Self {
        Self {
            svg,
            transcoders: HashMap::new(),
        }
    }

    /// The reference encoders shipped with the crate: SVG font assembly,
    /// TTF→WOFF and TTF→EOT.
    pub fn builtin() -> Self {
        Self::new(Arc::new(SvgFontAssembler::new()))
            .with_transcoder(FontFormat::Woff, Arc::new(WoffEncoder::new()))
            .with_transcoder(FontFormat::Eot, Arc::new(EotEncoder::new()))
    }

    /// Replace the SVG font encoder.
    pub fn with_svg_encoder(mut self, svg: Arc<dyn SvgFontEncoder>) -> Self {
        self.svg = svg;
        self
    }

    /// Register the transcoder producing `format`.
    ///
    /// `FontFormat::Svg` is produced by the SVG font encoder; registering a
    /// transcoder for it has no effect on builds.
    pub fn with_transcoder(
        mut self,
        format: FontFormat,
        transcoder: Arc<dyn FontTranscoder>,
    ) -> Self {
        self.transcoders.insert(format, transcoder);
        self
    }

    /// The SVG font encoder.
    pub fn svg(&self) -> Arc<dyn SvgFontEncoder> {
        Arc::clone(&self.svg)
    }

    /// The transcoder for `format`, if registered.
    pub fn transcoder(&self, format: FontFormat) -> Option<Arc<dyn FontTranscoder>> {
        self.transcoders.get(&format).cloned()
    }

    /// The transcoder for `format`, or [`BuildError::MissingEncoder`].
    pub fn require(&self, format: FontFormat) -> PipelineResult<Arc<dyn FontTranscoder>> {
        self.transcoder(format)
            .ok_or(BuildError::MissingEncoder(format))
    }

    /// Returns true if a transcoder for `format` is registered.
    pub fn supports(&self, format: FontFormat) -> bool {
        format == FontFormat::Svg || self.transcoders.contains_key(&format)
    }
}

impl Default for EncoderSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for EncoderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<_> = self.transcoders.keys().collect();
        formats.sort();
        f.debug_struct("EncoderSet")
            .field("transcoders", &formats)
            .finish()
    }
}
