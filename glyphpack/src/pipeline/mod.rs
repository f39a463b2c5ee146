//! Font build pipeline.
//!
//! A build resolves the glyph sources, checks the cache store and then runs
//! a small stage graph:
//!
//! ```text
//! glyph sources ─► svg ─► ttf ─┬─► woff
//!                              ├─► woff2
//!                              └─► eot
//! ```
//!
//! When the cache entry for the font is still valid, the graph runs in reuse
//! mode: the SVG stage reports [`StageArtifact::Unchanged`], every later
//! stage propagates it, and nothing on disk is touched. Otherwise every
//! requested format is regenerated and the cache entry is rewritten once the
//! whole graph has succeeded.
//!
//! # Example
//!
//! ```ignore
//! use glyphpack::{build, BuildRequest, FontFormat};
//!
//! let request = BuildRequest::new("icons/*.svg", "dist/fonts")
//!     .with_font_name("icons")
//!     .with_formats([FontFormat::Svg, FontFormat::Woff]);
//! let result = build(&request).await?;
//! for glyph in &result.glyphs {
//!     println!(".icon-{}:before {{ content: \"{}\"; }}", glyph.name, glyph.css_escape());
//! }
//! ```

mod context;
mod executor;
mod stage;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::cache::{evaluate, CacheDecision, CacheEntry, CacheStore};
use crate::codepoint::assign_codepoints;
use crate::encoder::EncoderSet;
use crate::error::{BuildError, PipelineResult};
use crate::glyph::{BuildOutcome, BuildResult, Glyph};
use crate::request::BuildRequest;
use crate::source::stat_mod_times;

pub use context::BuildContext;
pub use executor::execute;
pub use stage::{Stage, StageArtifact, StageOutputs, StagePlan};

/// Builds icon fonts with a fixed set of encoders.
#[derive(Debug, Clone, Default)]
pub struct FontPipeline {
    encoders: EncoderSet,
}

impl FontPipeline {
    pub fn new(encoders: EncoderSet) -> Self {
        Self { encoders }
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    /// Runs one build.
    ///
    /// Returns the glyph list and cache-busting token. On failure nothing
    /// is written to the cache store, though output files of stages that
    /// completed before the failure may already be on disk.
    #[instrument(skip_all, fields(font = %request.font_name))]
    pub async fn build(&self, request: &BuildRequest) -> PipelineResult<BuildResult> {
        let started = Instant::now();
        request.validate()?;

        let files = request.sources.resolve()?;
        if files.is_empty() {
            info!("No glyph sources matched, nothing to build");
            return Ok(BuildResult::empty());
        }

        let mod_times = stat_mod_times(&files)?;
        let store = request.cache_path().map(CacheStore::load);
        let plan = StagePlan::for_request(&request.formats);

        let result = match evaluate(store.as_ref(), request, &mod_times) {
            CacheDecision::Hit {
                glyphs,
                fingerprint,
            } => {
                debug!(glyphs = glyphs.len(), "Font cache is valid");
                self.reuse(request, glyphs, fingerprint, &plan).await?
            }
            CacheDecision::Miss(reason) => {
                debug!(reason = %reason, "Font cache miss");
                self.regenerate(request, &files, store, &plan).await?
            }
        };

        info!(
            glyphs = result.glyphs.len(),
            outcome = ?result.outcome,
            duration_ms = started.elapsed().as_millis() as u64,
            "Font build complete"
        );
        Ok(result)
    }

    async fn reuse(
        &self,
        request: &BuildRequest,
        glyphs: Vec<Glyph>,
        fingerprint: Option<String>,
        plan: &StagePlan,
    ) -> PipelineResult<BuildResult> {
        let ctx = BuildContext::reuse(request.clone(), glyphs, self.encoders.clone());
        let ctx = Arc::new(ctx);
        execute(Arc::clone(&ctx), plan).await?;

        Ok(BuildResult {
            glyphs: ctx.glyphs.clone(),
            fingerprint: request.cachebuster.apply(fingerprint),
            outcome: BuildOutcome::Reused,
        })
    }

    async fn regenerate(
        &self,
        request: &BuildRequest,
        files: &[PathBuf],
        store: Option<CacheStore>,
        plan: &StagePlan,
    ) -> PipelineResult<BuildResult> {
        // Refuse before any file is written if an encoder is missing
        for stage in plan.stages().filter(|stage| stage.input().is_some()) {
            self.encoders.require(stage.format())?;
        }

        let glyphs = assign_codepoints(files, request.start_codepoint, request.prepend)?;
        let ctx = BuildContext::regenerate(request.clone(), glyphs, self.encoders.clone());
        let ctx = Arc::new(ctx);

        let outputs = execute(Arc::clone(&ctx), plan).await?;
        let digest = outputs
            .get(Stage::Svg)
            .and_then(StageArtifact::fingerprint);

        if let (Some(path), Some(mut store)) = (request.cache_path(), store) {
            let mod_times = stat_mod_times(files)?;
            store.insert(
                request.font_name.clone(),
                CacheEntry::new(ctx.glyphs.clone(), mod_times, digest.clone()),
            );
            store
                .save(path)
                .map_err(|source| BuildError::CacheWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        Ok(BuildResult {
            glyphs: ctx.glyphs.clone(),
            fingerprint: request.cachebuster.apply(digest),
            outcome: BuildOutcome::Regenerated,
        })
    }
}

/// Builds `request` with the built-in encoders.
pub async fn build(request: &BuildRequest) -> PipelineResult<BuildResult> {
    FontPipeline::default().build(request).await
}
