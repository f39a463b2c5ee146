//! Stage graph executor.
//!
//! Groups run strictly one after another. Every stage of a group is spawned
//! as its own tokio task and the group is joined with `try_join_all`: the
//! first failing stage ends the build at once. Its still-running siblings
//! are detached (their handles are dropped), their results are discarded,
//! and no later group is started.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::try_join_all;
use tracing::{debug, warn};

use super::context::BuildContext;
use super::stage::{Stage, StageArtifact, StageOutputs, StagePlan};
use crate::error::{BuildError, PipelineResult};

/// Runs `plan` against `ctx`, returning the artifact of every stage.
pub async fn execute(ctx: Arc<BuildContext>, plan: &StagePlan) -> PipelineResult<StageOutputs> {
    let mut outputs = StageOutputs::new();

    for group in plan.groups() {
        let tasks = group.iter().map(|&stage| {
            let input = stage.input().and_then(|input| outputs.get(input).cloned());
            let handle = tokio::spawn(run_stage(Arc::clone(&ctx), stage, input));

            async move {
                match handle.await {
                    Ok(result) => result.map(|artifact| (stage, artifact)),
                    Err(e) => Err(BuildError::StageAborted {
                        stage,
                        reason: e.to_string(),
                    }),
                }
            }
        });

        let finished = try_join_all(tasks).await.inspect_err(|e| {
            warn!(error = %e, "Stage failed, abandoning build");
        })?;

        // Group barrier: artifacts become visible only once all siblings are done
        for (stage, artifact) in finished {
            outputs.insert(stage, artifact);
        }
    }

    Ok(outputs)
}

async fn run_stage(
    ctx: Arc<BuildContext>,
    stage: Stage,
    input: Option<StageArtifact>,
) -> PipelineResult<StageArtifact> {
    let format = stage.format();

    let data = match stage.input() {
        None => {
            if ctx.reuse_previous {
                debug!(stage = %stage, "Reusing previous output");
                return Ok(StageArtifact::Unchanged);
            }
            ctx.encoders
                .svg()
                .encode(&ctx.glyphs, &ctx.request.font_name, &ctx.request.shaping)
                .await
                .map_err(|source| BuildError::Encode { format, source })?
        }
        Some(input_stage) => {
            let source = match input {
                Some(StageArtifact::Produced(bytes)) => bytes,
                Some(StageArtifact::Unchanged) => {
                    debug!(stage = %stage, "Input unchanged, skipping");
                    return Ok(StageArtifact::Unchanged);
                }
                None => {
                    return Err(BuildError::StageAborted {
                        stage,
                        reason: format!("input stage {} did not run", input_stage),
                    })
                }
            };
            ctx.encoders
                .require(format)?
                .transcode(&source)
                .await
                .map_err(|source| BuildError::Encode { format, source })?
        }
    };

    let bytes = Bytes::from(data);
    if ctx.request.formats.contains(format) {
        write_output(&ctx.request.output_path(format), &bytes).await?;
    }

    debug!(stage = %stage, size_bytes = bytes.len(), "Stage complete");
    Ok(StageArtifact::Produced(bytes))
}

async fn write_output(path: &Path, data: &[u8]) -> PipelineResult<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| BuildError::io(dir, e))?;
    }
    tokio::fs::write(path, data)
        .await
        .map_err(|e| BuildError::io(path, e))?;

    debug!(path = %path.display(), size_bytes = data.len(), "Wrote font file");
    Ok(())
}
