//! Integration tests for the font build pipeline.
//!
//! These tests drive `FontPipeline::build` against real files in a temp
//! directory and verify:
//! - Warm-cache rebuilds leave every output untouched
//! - Touching, adding or deleting inputs forces a full regeneration
//! - Code point assignment is stable under input reordering
//! - Failures abort later stages and never write the cache
//!
//! Run with: `cargo test --test build_integration`

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use filetime::FileTime;
use tempfile::TempDir;

use glyphpack::cache::CacheStore;
use glyphpack::encoder::{BoxFuture, EncodeResult, FontTranscoder};
use glyphpack::{
    BuildError, BuildOutcome, BuildRequest, Cachebuster, EncodeError, EncoderSet, FontFormat,
    FontPipeline, SourceSpec,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Fixed source timestamp so reruns are not sensitive to clock granularity.
const SOURCE_TIME: i64 = 1_600_000_000;

/// Timestamp given to outputs before a rerun, to detect rewrites.
const OLD_OUTPUT_TIME: i64 = 1_500_000_000;

const ALL_FORMATS: [FontFormat; 5] = FontFormat::ALL;

fn icon_svg(width: u32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} 24"><path d="M0 0h{w}v24H0z"/></svg>"#,
        w = width
    )
}

/// Wraps its input in a minimal sfnt so the built-in WOFF and EOT encoders
/// have real tables to work with.
struct SfntWrapper {
    calls: Arc<AtomicUsize>,
}

impl FontTranscoder for SfntWrapper {
    fn transcode<'a>(&'a self, input: &'a [u8]) -> BoxFuture<'a, EncodeResult> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(wrap_sfnt(&[
                (b"OS/2", vec![0u8; 86]),
                (b"glyf", input.to_vec()),
                (b"head", vec![0u8; 54]),
            ]))
        })
    }
}

fn wrap_sfnt(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let pad = |n: usize| (n + 3) & !3;
    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&[0u8; 6]);

    let mut offset = 12 + tables.len() * 16;
    for (tag, data) in tables {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += pad(data.len());
    }
    for (_, data) in tables {
        out.extend_from_slice(data);
        out.resize(pad(out.len()), 0);
    }
    out
}

/// Stands in for a WOFF2 compressor.
struct FakeWoff2;

impl FontTranscoder for FakeWoff2 {
    fn transcode<'a>(&'a self, input: &'a [u8]) -> BoxFuture<'a, EncodeResult> {
        Box::pin(async move {
            let mut out = b"wOF2".to_vec();
            out.extend_from_slice(input);
            Ok(out)
        })
    }
}

struct FailingTtf;

impl FontTranscoder for FailingTtf {
    fn transcode<'a>(&'a self, _input: &'a [u8]) -> BoxFuture<'a, EncodeResult> {
        Box::pin(async { Err(EncodeError::Invalid("self-intersecting contour".to_string())) })
    }
}

/// A temp directory with an `icons/` source folder, an `out/` destination
/// and a cache file next to them.
struct Workspace {
    temp: TempDir,
    ttf_calls: Arc<AtomicUsize>,
}

impl Workspace {
    fn new(icons: &[&str]) -> Self {
        let ws = Self {
            temp: TempDir::new().unwrap(),
            ttf_calls: Arc::new(AtomicUsize::new(0)),
        };
        std::fs::create_dir_all(ws.icons_dir()).unwrap();
        for (i, name) in icons.iter().enumerate() {
            ws.add_icon(name, 24 + i as u32);
        }
        ws
    }

    fn icons_dir(&self) -> PathBuf {
        self.temp.path().join("icons")
    }

    fn out_dir(&self) -> PathBuf {
        self.temp.path().join("out")
    }

    fn cache_file(&self) -> PathBuf {
        self.temp.path().join(".fontcache.json")
    }

    fn icon(&self, name: &str) -> PathBuf {
        self.icons_dir().join(format!("{}.svg", name))
    }

    fn add_icon(&self, name: &str, width: u32) {
        let path = self.icon(name);
        std::fs::write(&path, icon_svg(width)).unwrap();
        set_mtime(&path, SOURCE_TIME);
    }

    fn pattern(&self) -> String {
        format!("{}/*.svg", self.icons_dir().display())
    }

    fn request(&self, formats: &[FontFormat]) -> BuildRequest {
        BuildRequest::new(self.pattern().as_str(), self.out_dir())
            .with_font_name("icons")
            .with_formats(formats.iter().copied())
            .with_cache(self.cache_file())
    }

    fn encoders(&self) -> EncoderSet {
        EncoderSet::builtin()
            .with_transcoder(
                FontFormat::Ttf,
                Arc::new(SfntWrapper {
                    calls: Arc::clone(&self.ttf_calls),
                }),
            )
            .with_transcoder(FontFormat::Woff2, Arc::new(FakeWoff2))
    }

    fn pipeline(&self) -> FontPipeline {
        FontPipeline::new(self.encoders())
    }

    fn ttf_calls(&self) -> usize {
        self.ttf_calls.load(Ordering::SeqCst)
    }

    /// Back-dates every output of `request` so rewrites become visible.
    fn age_outputs(&self, request: &BuildRequest) {
        for format in request.formats.iter() {
            set_mtime(&request.output_path(format), OLD_OUTPUT_TIME);
        }
    }
}

fn set_mtime(path: &Path, unix_seconds: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_seconds, 0)).unwrap();
}

fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&std::fs::metadata(path).unwrap())
}

fn read_outputs(request: &BuildRequest) -> Vec<(FontFormat, Vec<u8>)> {
    request
        .formats
        .iter()
        .map(|format| (format, std::fs::read(request.output_path(format)).unwrap()))
        .collect()
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A cold build writes every requested format and records a cache entry.
#[tokio::test]
async fn test_cold_build_writes_all_formats() {
    let ws = Workspace::new(&["home", "search", "star"]);
    let request = ws.request(&ALL_FORMATS);

    let result = ws.pipeline().build(&request).await.unwrap();

    assert_eq!(result.outcome, BuildOutcome::Regenerated);
    assert_eq!(result.glyphs.len(), 3);
    assert_eq!(ws.ttf_calls(), 1);

    for (format, data) in read_outputs(&request) {
        assert!(!data.is_empty(), "{} output is empty", format);
    }
    let woff = std::fs::read(request.output_path(FontFormat::Woff)).unwrap();
    assert_eq!(&woff[..4], b"wOFF");
    let woff2 = std::fs::read(request.output_path(FontFormat::Woff2)).unwrap();
    assert!(woff2.starts_with(b"wOF2"));

    let svg = std::fs::read_to_string(request.output_path(FontFormat::Svg)).unwrap();
    assert!(svg.contains(r#"glyph-name="home" unicode="&#xEA01;""#));
    assert_eq!(
        result.fingerprint,
        Some(glyphpack::fingerprint::fingerprint(svg.as_bytes()))
    );

    let store = CacheStore::try_load(&ws.cache_file()).unwrap();
    let entry = store.get("icons").unwrap();
    assert_eq!(entry.glyphs, result.glyphs);
    assert_eq!(entry.file_mod_times.len(), 3);
    assert_eq!(entry.fingerprint, result.fingerprint);
}

/// Rebuilding with a warm cache returns the cached result and touches no
/// output file.
#[tokio::test]
async fn test_warm_rebuild_is_idempotent() {
    let ws = Workspace::new(&["home", "search", "star"]);
    let request = ws.request(&ALL_FORMATS);
    let pipeline = ws.pipeline();

    let first = pipeline.build(&request).await.unwrap();
    ws.age_outputs(&request);
    let cache_before = std::fs::read(ws.cache_file()).unwrap();

    let second = pipeline.build(&request).await.unwrap();

    assert_eq!(second.outcome, BuildOutcome::Reused);
    assert_eq!(second.glyphs, first.glyphs);
    assert_eq!(second.fingerprint, first.fingerprint);
    assert_eq!(ws.ttf_calls(), 1);

    for format in request.formats.iter() {
        assert_eq!(
            mtime(&request.output_path(format)),
            FileTime::from_unix_time(OLD_OUTPUT_TIME, 0),
            "{} output was rewritten",
            format
        );
    }
    assert_eq!(std::fs::read(ws.cache_file()).unwrap(), cache_before);
}

/// Touching one source regenerates every requested format.
#[tokio::test]
async fn test_touched_source_regenerates_everything() {
    let ws = Workspace::new(&["home", "search", "star"]);
    let request = ws.request(&[FontFormat::Svg, FontFormat::Woff, FontFormat::Eot]);
    let pipeline = ws.pipeline();

    pipeline.build(&request).await.unwrap();
    ws.age_outputs(&request);

    set_mtime(&ws.icon("search"), SOURCE_TIME + 60);
    let result = pipeline.build(&request).await.unwrap();

    assert_eq!(result.outcome, BuildOutcome::Regenerated);
    assert_eq!(ws.ttf_calls(), 2);
    for format in request.formats.iter() {
        assert_ne!(
            mtime(&request.output_path(format)),
            FileTime::from_unix_time(OLD_OUTPUT_TIME, 0),
            "{} output was not regenerated",
            format
        );
    }

    // The refreshed entry makes the next build a hit again
    let again = pipeline.build(&request).await.unwrap();
    assert_eq!(again.outcome, BuildOutcome::Reused);
}

/// Adding a source renumbers glyphs in natural order.
#[tokio::test]
async fn test_added_source_renumbers() {
    let ws = Workspace::new(&["b", "c"]);
    let request = ws.request(&[FontFormat::Svg]);
    let pipeline = ws.pipeline();

    let first = pipeline.build(&request).await.unwrap();
    assert_eq!(first.glyph("b").unwrap().codepoint, 0xEA01);

    ws.add_icon("a", 16);
    let second = pipeline.build(&request).await.unwrap();

    assert_eq!(second.outcome, BuildOutcome::Regenerated);
    assert_eq!(second.glyph("a").unwrap().codepoint, 0xEA01);
    assert_eq!(second.glyph("b").unwrap().codepoint, 0xEA02);
    assert_eq!(second.glyph("c").unwrap().codepoint, 0xEA03);
    assert_ne!(second.fingerprint, first.fingerprint);
}

/// A deleted output file is regenerated even though no source changed.
#[tokio::test]
async fn test_missing_output_regenerates() {
    let ws = Workspace::new(&["home"]);
    let request = ws.request(&[FontFormat::Ttf, FontFormat::Woff]);
    let pipeline = ws.pipeline();

    pipeline.build(&request).await.unwrap();
    std::fs::remove_file(request.output_path(FontFormat::Woff)).unwrap();

    let result = pipeline.build(&request).await.unwrap();
    assert_eq!(result.outcome, BuildOutcome::Regenerated);
    assert!(request.output_path(FontFormat::Woff).exists());
}

/// Natural ordering decides code points, whatever order the inputs arrive in.
#[tokio::test]
async fn test_codepoints_follow_natural_order() {
    let ws = Workspace::new(&["z", "a", "m2", "m10"]);
    let pipeline = ws.pipeline();

    let by_glob = pipeline
        .build(&ws.request(&[FontFormat::Svg]).without_cache())
        .await
        .unwrap();

    let shuffled = ["m10", "z", "m2", "a"].map(|name| ws.icon(name));
    let mut request = ws.request(&[FontFormat::Svg]).without_cache();
    request.sources = SourceSpec::paths(shuffled);
    let by_list = pipeline.build(&request).await.unwrap();

    for result in [&by_glob, &by_list] {
        let mapping: Vec<(&str, u32)> = result
            .glyphs
            .iter()
            .map(|g| (g.name.as_str(), g.codepoint))
            .collect();
        assert_eq!(
            mapping,
            vec![("a", 0xEA01), ("m2", 0xEA02), ("m10", 0xEA03), ("z", 0xEA04)]
        );
    }
    assert_eq!(by_glob.fingerprint, by_list.fingerprint);
}

/// Prepending counts down from the start code point.
#[tokio::test]
async fn test_prepend_counts_down() {
    let ws = Workspace::new(&["a", "b"]);
    let request = ws
        .request(&[FontFormat::Svg])
        .without_cache()
        .with_start_codepoint(0xF8FF, true);

    let result = ws.pipeline().build(&request).await.unwrap();
    assert_eq!(result.glyph("a").unwrap().codepoint, 0xF8FF);
    assert_eq!(result.glyph("b").unwrap().codepoint, 0xF8FE);
}

/// An empty glob yields an empty result without touching the filesystem.
#[tokio::test]
async fn test_empty_glob_builds_nothing() {
    let ws = Workspace::new(&[]);
    let request = ws.request(&ALL_FORMATS);

    let result = ws.pipeline().build(&request).await.unwrap();

    assert_eq!(result.outcome, BuildOutcome::Empty);
    assert!(result.glyphs.is_empty());
    assert_eq!(result.fingerprint, None);
    assert!(!ws.out_dir().exists());
    assert!(!ws.cache_file().exists());
    assert_eq!(ws.ttf_calls(), 0);
}

/// A failing TTF encoder stops the build before any TTF-derived format and
/// leaves the cache untouched.
#[tokio::test]
async fn test_failing_ttf_aborts_derived_formats() {
    let ws = Workspace::new(&["home", "star"]);
    let request = ws.request(&ALL_FORMATS);
    let pipeline = FontPipeline::new(
        ws.encoders()
            .with_transcoder(FontFormat::Ttf, Arc::new(FailingTtf)),
    );

    let err = pipeline.build(&request).await.unwrap_err();

    let (format, source) = err.encode_error().expect("encoder error");
    assert_eq!(format, FontFormat::Ttf);
    assert!(source.to_string().contains("self-intersecting contour"));

    for format in [FontFormat::Ttf, FontFormat::Woff, FontFormat::Woff2, FontFormat::Eot] {
        assert!(
            !request.output_path(format).exists(),
            "{} written after TTF failure",
            format
        );
    }
    assert!(!ws.cache_file().exists());
}

/// An unwritable destination fails the build with an I/O error and leaves
/// the cache untouched.
#[tokio::test]
async fn test_unwritable_destination_skips_cache_write() {
    let ws = Workspace::new(&["home", "star"]);
    std::fs::write(ws.out_dir(), b"not a directory").unwrap();
    let request = ws.request(&ALL_FORMATS);

    let err = ws.pipeline().build(&request).await.unwrap_err();

    match err {
        BuildError::Io { path, .. } => assert!(path.starts_with(ws.out_dir())),
        other => panic!("expected I/O error, got {:?}", other),
    }
    assert!(ws.out_dir().is_file());
    assert!(!ws.cache_file().exists());
}

/// A missing encoder is reported before anything is written.
#[tokio::test]
async fn test_missing_encoder_fails_before_writing() {
    let ws = Workspace::new(&["home"]);
    let request = ws.request(&[FontFormat::Svg, FontFormat::Woff2]);

    let err = FontPipeline::new(EncoderSet::builtin())
        .build(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::MissingEncoder(FontFormat::Ttf)));
    assert!(!ws.out_dir().exists());
    assert!(!ws.cache_file().exists());
}

/// A warm cache is honoured even when the encoders it needed are gone.
#[tokio::test]
async fn test_warm_cache_needs_no_encoders() {
    let ws = Workspace::new(&["home"]);
    let request = ws.request(&[FontFormat::Ttf, FontFormat::Woff2]);
    ws.pipeline().build(&request).await.unwrap();

    let result = FontPipeline::new(EncoderSet::builtin())
        .build(&request)
        .await
        .unwrap();
    assert_eq!(result.outcome, BuildOutcome::Reused);
}

/// Rebuilding from scratch reproduces byte-identical outputs.
#[tokio::test]
async fn test_cold_start_equivalence() {
    let ws = Workspace::new(&["home", "search", "star"]);
    let request = ws.request(&ALL_FORMATS);
    let pipeline = ws.pipeline();

    let first = pipeline.build(&request).await.unwrap();
    let first_outputs = read_outputs(&request);

    std::fs::remove_file(ws.cache_file()).unwrap();
    std::fs::remove_dir_all(ws.out_dir()).unwrap();

    let second = pipeline.build(&request).await.unwrap();

    assert_eq!(second.outcome, BuildOutcome::Regenerated);
    assert_eq!(second.glyphs, first.glyphs);
    assert_eq!(second.fingerprint, first.fingerprint);
    assert_eq!(read_outputs(&request), first_outputs);
}

/// Fonts with different names share one cache file without interfering.
#[tokio::test]
async fn test_fonts_share_cache_file() {
    let ws = Workspace::new(&["home", "star"]);
    let pipeline = ws.pipeline();
    let icons = ws.request(&[FontFormat::Svg]);
    let glyphs = ws.request(&[FontFormat::Svg]).with_font_name("glyphs");

    pipeline.build(&icons).await.unwrap();
    pipeline.build(&glyphs).await.unwrap();

    let store = CacheStore::try_load(&ws.cache_file()).unwrap();
    assert_eq!(store.font_names().collect::<Vec<_>>(), vec!["glyphs", "icons"]);

    assert_eq!(
        pipeline.build(&icons).await.unwrap().outcome,
        BuildOutcome::Reused
    );
}

/// The cache-busting policy shapes the returned token but not the cache.
#[tokio::test]
async fn test_cachebuster_policies() {
    let ws = Workspace::new(&["home"]);
    let pipeline = ws.pipeline();
    let base = ws.request(&[FontFormat::Svg]);

    let hashed = pipeline.build(&base).await.unwrap();
    let digest = hashed.fingerprint.clone().unwrap();
    assert_eq!(digest.len(), 8);

    let fixed = pipeline
        .build(
            &base
                .clone()
                .with_cachebuster(Cachebuster::Fixed("v7".to_string())),
        )
        .await
        .unwrap();
    assert_eq!(fixed.outcome, BuildOutcome::Reused);
    assert_eq!(fixed.fingerprint.as_deref(), Some("v7"));

    let disabled = pipeline
        .build(&base.clone().with_cachebuster(Cachebuster::Disabled))
        .await
        .unwrap();
    assert_eq!(disabled.fingerprint, None);

    let store = CacheStore::try_load(&ws.cache_file()).unwrap();
    assert_eq!(store.get("icons").unwrap().fingerprint, Some(digest));
}

/// An unreadable cache file degrades to a cold build and is then replaced.
#[tokio::test]
async fn test_corrupt_cache_is_rebuilt() {
    let ws = Workspace::new(&["home"]);
    std::fs::write(ws.cache_file(), "{ definitely not json").unwrap();

    let request = ws.request(&[FontFormat::Svg]);
    let result = ws.pipeline().build(&request).await.unwrap();

    assert_eq!(result.outcome, BuildOutcome::Regenerated);
    assert!(CacheStore::try_load(&ws.cache_file()).is_ok());
}

/// With caching disabled every build regenerates and no cache file appears.
#[tokio::test]
async fn test_disabled_cache_always_regenerates() {
    let ws = Workspace::new(&["home"]);
    let request = ws.request(&[FontFormat::Ttf]).without_cache();
    let pipeline = ws.pipeline();

    for _ in 0..2 {
        let result = pipeline.build(&request).await.unwrap();
        assert_eq!(result.outcome, BuildOutcome::Regenerated);
    }
    assert_eq!(ws.ttf_calls(), 2);
    assert!(!ws.cache_file().exists());
}
