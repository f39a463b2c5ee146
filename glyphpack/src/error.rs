//! Error types for the font build pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::format::FontFormat;
use crate::pipeline::Stage;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, BuildError>;

/// Errors that abort a font build.
///
/// A build fails fast: the first error raised by any stage is returned as-is
/// and nothing is written to the cache store.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Filesystem operation failed (stat, directory creation, write).
    #[error("I/O error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The source glob could not be parsed.
    #[error("invalid source pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The build request is malformed.
    #[error("invalid build request: {0}")]
    InvalidRequest(String),

    /// Code point assignment left the Unicode scalar range.
    #[error("code point out of range for glyph '{glyph}' (start {start:#X}, index {index})")]
    CodepointOutOfRange {
        glyph: String,
        start: u32,
        index: usize,
    },

    /// No encoder registered for a requested format.
    #[error("no encoder registered for {0}")]
    MissingEncoder(FontFormat),

    /// An encoder rejected its input.
    #[error("{format} encoder failed: {source}")]
    Encode {
        format: FontFormat,
        #[source]
        source: EncodeError,
    },

    /// A stage task panicked or was torn down by the runtime.
    #[error("stage {stage} aborted: {reason}")]
    StageAborted { stage: Stage, reason: String },

    /// The cache store could not be persisted after a successful build.
    #[error("failed to write cache {}: {source}", .path.display())]
    CacheWrite { path: PathBuf, source: io::Error },
}

impl BuildError {
    /// Wraps an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the encoder error if this build failed inside an encoder.
    pub fn encode_error(&self) -> Option<(FontFormat, &EncodeError)> {
        match self {
            Self::Encode { format, source } => Some((*format, source)),
            _ => None,
        }
    }
}

/// Errors reported by format encoders.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The input buffer is not a valid font/glyph for this encoder.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// The input uses a feature the encoder does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Reading a glyph source or scratch file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An external encoder command exited unsuccessfully.
    #[error("command '{program}' failed with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },
}
