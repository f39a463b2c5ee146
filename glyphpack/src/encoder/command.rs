//! External-program transcoder.
//!
//! Lets any command-line converter act as a [`FontTranscoder`]. The command
//! template is split on whitespace; `{input}` and `{output}` are replaced by
//! scratch file paths carrying the right extensions. Without an `{input}`
//! placeholder the buffer is piped to stdin; without `{output}` the result is
//! read from stdout.
//!
//! ```ignore
//! let ttf = CommandTranscoder::new("svg2ttf {input} {output}", FontFormat::Svg, FontFormat::Ttf)?;
//! let woff2 = CommandTranscoder::new("woff2_compress {input}", FontFormat::Ttf, FontFormat::Woff2)?;
//! ```

use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{BoxFuture, EncodeResult, FontTranscoder};
use crate::error::EncodeError;
use crate::format::FontFormat;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Runs an external program to convert a font buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTranscoder {
    program: String,
    args: Vec<String>,
    input_format: FontFormat,
    output_format: FontFormat,
}

impl CommandTranscoder {
    /// Parses `template` into a program and its arguments.
    pub fn new(
        template: &str,
        input_format: FontFormat,
        output_format: FontFormat,
    ) -> Result<Self, EncodeError> {
        let mut words = template.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| EncodeError::Invalid("empty encoder command".to_string()))?;

        Ok(Self {
            program,
            args: words.collect(),
            input_format,
            output_format,
        })
    }

    /// The program that will be executed.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn uses(&self, placeholder: &str) -> bool {
        self.args.iter().any(|arg| arg.contains(placeholder))
    }

    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input.to_string_lossy())
                    .replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy())
            })
            .collect()
    }

    async fn run(&self, input: &[u8]) -> EncodeResult {
        let scratch = tempfile::Builder::new().prefix("glyphpack-").tempdir()?;
        let input_path = scratch
            .path()
            .join(format!("input.{}", self.input_format.extension()));
        let output_path = scratch
            .path()
            .join(format!("output.{}", self.output_format.extension()));

        let file_input = self.uses(INPUT_PLACEHOLDER);
        let file_output = self.uses(OUTPUT_PLACEHOLDER);

        if file_input {
            tokio::fs::write(&input_path, input).await?;
        }

        let args = self.expand_args(&input_path, &output_path);
        debug!(program = %self.program, args = ?args, "Running external encoder");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(if file_input {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            // Dropping stdin at the end closes the pipe so the program sees EOF
            match stdin.write_all(input).await {
                // The program stopped reading; its exit status is reported instead
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };

        // stdout must drain while stdin is fed, or a streaming filter blocks
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        if !output.status.success() {
            return Err(EncodeError::Command {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        fed?;

        if file_output {
            Ok(tokio::fs::read(&output_path).await?)
        } else {
            Ok(output.stdout)
        }
    }
}

impl FontTranscoder for CommandTranscoder {
    fn transcode<'a>(&'a self, input: &'a [u8]) -> BoxFuture<'a, EncodeResult> {
        Box::pin(self.run(input))
    }
}
