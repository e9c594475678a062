use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::{rng, RngCore};
use switchyard_core::{
    Category, NumberWordConverter, PipelineKind, PipelinePayload, RoutingDecision,
};
use switchyard_observability::AppMetrics;
use tracing::debug;

use crate::pipelines::{
    MathPipeline, MathTextPipeline, Pipeline, PoemPipeline, RagPipeline, MAX_SENTENCES,
};

/// Runs the pipeline a routing decision points at.
#[derive(Clone)]
pub struct Dispatcher {
    pipelines: HashMap<PipelineKind, Arc<dyn Pipeline>>,
}

impl Dispatcher {
    pub fn empty() -> Self {
        Self {
            pipelines: HashMap::new(),
        }
    }

    /// The four built-in pipelines.
    pub fn standard(converter: Arc<NumberWordConverter>, metrics: Arc<AppMetrics>) -> Self {
        Self::empty()
            .with_pipeline(Arc::new(RagPipeline))
            .with_pipeline(Arc::new(MathPipeline::new(metrics.clone())))
            .with_pipeline(Arc::new(MathTextPipeline::new(converter, metrics)))
            .with_pipeline(Arc::new(PoemPipeline))
    }

    /// Registers `pipeline`, replacing any pipeline of the same kind.
    pub fn with_pipeline(mut self, pipeline: Arc<dyn Pipeline>) -> Self {
        self.pipelines.insert(pipeline.kind(), pipeline);
        self
    }

    /// Builds the payload a decision's pipeline expects. Poems get `sentence_count`
    /// when given, otherwise a uniform draw from 1..=5.
    pub fn payload_for(decision: &RoutingDecision, sentence_count: Option<u8>) -> PipelinePayload {
        match decision.category() {
            Category::Rag => PipelinePayload::Query {
                query: decision.input().to_string(),
            },
            Category::Math => PipelinePayload::MathExpression {
                math_expression: decision.input().to_string(),
            },
            Category::Poem => PipelinePayload::SentenceCount {
                sentence_count: sentence_count.unwrap_or_else(random_sentence_count),
            },
        }
    }

    pub fn dispatch(&self, decision: &RoutingDecision, payload: &PipelinePayload) -> Result<String> {
        let kind = decision.pipeline();
        let pipeline = self
            .pipelines
            .get(&kind)
            .with_context(|| format!("no pipeline registered for {kind}"))?;
        debug!(pipeline = %kind, "dispatching");
        pipeline
            .run(payload)
            .with_context(|| format!("{kind} pipeline failed"))
    }
}

fn random_sentence_count() -> u8 {
    (rng().next_u32() % u32::from(MAX_SENTENCES)) as u8 + 1
}
