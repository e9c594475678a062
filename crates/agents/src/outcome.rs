use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use switchyard_core::{PipelineKind, PipelinePayload, RoutingDecision};
use tracing::info;

/// A routed and processed request.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub decision: RoutingDecision,
    pub pipeline: PipelineKind,
    pub payload: PipelinePayload,
    pub result: String,
}

impl Outcome {
    pub fn render(&self) -> Result<String> {
        let routing_info =
            serde_json::to_string(&self.decision).context("failed to serialize routing decision")?;
        Ok(format!(
            "User Input: {}\nPipeline: {}\nRouting Info: {}\nResult:\n{}\n",
            self.decision.input(),
            self.pipeline,
            routing_info,
            self.result
        ))
    }
}

/// Saves outcomes as `<dir>/<pipeline>_result.txt`; a later outcome for the same
/// pipeline overwrites the earlier file.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, pipeline: PipelineKind) -> PathBuf {
        self.dir.join(format!("{}_result.txt", pipeline.as_str()))
    }

    pub fn write(&self, outcome: &Outcome) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed creating result directory {}", self.dir.display()))?;
        let path = self.path_for(outcome.pipeline);
        fs::write(&path, outcome.render()?)
            .with_context(|| format!("failed writing result file {}", path.display()))?;
        info!(path = %path.display(), pipeline = %outcome.pipeline, "result saved");
        Ok(path)
    }
}
