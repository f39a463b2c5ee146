//! Shared, read-only state of one build.

use crate::encoder::EncoderSet;
use crate::glyph::Glyph;
use crate::request::BuildRequest;

/// Everything a stage may read. Built once per build and shared behind an
/// `Arc`; stages never mutate it.
#[derive(Debug)]
pub struct BuildContext {
    pub request: BuildRequest,
    /// Glyphs in code point order.
    pub glyphs: Vec<Glyph>,
    /// When set, the SVG stage reports `Unchanged` and every stage after it
    /// skips, leaving the previous outputs on disk untouched.
    pub reuse_previous: bool,
    pub encoders: EncoderSet,
}

impl BuildContext {
    /// Context for a full regeneration.
    pub fn regenerate(request: BuildRequest, glyphs: Vec<Glyph>, encoders: EncoderSet) -> Self {
        Self {
            request,
            glyphs,
            reuse_previous: false,
            encoders,
        }
    }

    /// Context for a build answered from a valid cache entry.
    pub fn reuse(request: BuildRequest, glyphs: Vec<Glyph>, encoders: EncoderSet) -> Self {
        Self {
            request,
            glyphs,
            reuse_previous: true,
            encoders,
        }
    }
}
