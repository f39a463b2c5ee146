//! glyphpack - incremental icon-font builds
//!
//! Turns a set of SVG glyph sources into an icon-font bundle (svg, ttf,
//! woff, woff2, eot), gives every glyph a stable private-use code point and
//! skips regeneration when the source timestamps recorded in a cache file
//! show the previous outputs are still current.
//!
//! The entry point is [`build`] (or [`FontPipeline::build`] with a custom
//! [`EncoderSet`]); everything a build needs is described by a
//! [`BuildRequest`].

pub mod cache;
pub mod codepoint;
pub mod config;
pub mod encoder;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod glyph;
pub mod pipeline;
pub mod request;
pub mod source;

pub use encoder::EncoderSet;
pub use error::{BuildError, EncodeError, PipelineResult};
pub use format::{FontFormat, FormatSet};
pub use glyph::{BuildOutcome, BuildResult, Glyph};
pub use pipeline::{build, FontPipeline};
pub use request::{BuildRequest, Cachebuster, ShapingOptions};
pub use source::SourceSpec;

/// Library version, as recorded in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
