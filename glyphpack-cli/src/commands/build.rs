//! Build command - generate the font bundle.

use std::path::{Path, PathBuf};

use clap::Args;
use glyphpack::config::parse_codepoint;
use glyphpack::{BuildOutcome, BuildRequest, BuildResult, FontPipeline, FormatSet, SourceSpec};
use tracing::debug;

use super::common::load_config;
use crate::error::CliError;

/// Arguments of `glyphpack build`.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Glob pattern (quoted) or list of SVG files
    #[arg(required = true, value_name = "PATTERN")]
    pub sources: Vec<String>,

    /// Font name, also the output file stem
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Cache file location
    #[arg(long, value_name = "FILE", conflicts_with = "no_cache")]
    pub cache: Option<PathBuf>,

    /// Always regenerate and do not record a cache entry
    #[arg(long)]
    pub no_cache: bool,

    /// Comma separated formats (svg,ttf,woff,woff2,eot)
    #[arg(short, long)]
    pub formats: Option<FormatSet>,

    /// First code point, e.g. 0xEA01
    #[arg(long, value_parser = parse_start)]
    pub start: Option<u32>,

    /// Assign code points downwards from the start
    #[arg(long)]
    pub prepend: bool,
}

impl BuildArgs {
    fn source_spec(&self) -> SourceSpec {
        match self.sources.as_slice() {
            [pattern] => SourceSpec::pattern(pattern.as_str()),
            files => SourceSpec::paths(files.iter().map(PathBuf::from)),
        }
    }

    /// Applies flags on top of a request built from the configuration.
    fn apply(&self, mut request: BuildRequest) -> BuildRequest {
        if let Some(name) = &self.name {
            request.font_name = name.clone();
        }
        if let Some(out) = &self.out {
            request.dest_dir = out.clone();
        }
        if let Some(formats) = &self.formats {
            request.formats = formats.clone();
        }
        if let Some(start) = self.start {
            request.start_codepoint = start;
        }
        if self.prepend {
            request.prepend = true;
        }
        if let Some(cache) = &self.cache {
            request.cache = Some(cache.clone());
        }
        if self.no_cache {
            request.cache = None;
        }
        request
    }
}

fn parse_start(value: &str) -> Result<u32, String> {
    parse_codepoint(value).map_err(|e| e.to_string())
}

/// Run the build command.
pub fn run(args: BuildArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let pipeline = FontPipeline::new(config.encoder_set()?);
    let request = args.apply(config.to_request(args.source_spec()));
    debug!(request = ?request, "Build request");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    let result = runtime.block_on(pipeline.build(&request))?;

    print_result(&request, &result);
    Ok(())
}

fn print_result(request: &BuildRequest, result: &BuildResult) {
    match result.outcome {
        BuildOutcome::Empty => {
            println!("No glyph sources matched.");
            return;
        }
        BuildOutcome::Reused => println!("Fonts are up to date."),
        BuildOutcome::Regenerated => {
            println!("Built {} into {}:", request.font_name, request.dest_dir.display());
            for format in request.formats.iter() {
                println!("  {}", request.output_path(format).display());
            }
        }
    }

    println!();
    for glyph in &result.glyphs {
        println!("  {:<32} U+{:04X}  {}", glyph.name, glyph.codepoint, glyph.css_escape());
    }
    if let Some(fingerprint) = &result.fingerprint {
        println!();
        println!("Cachebuster: {}", fingerprint);
    }
}
