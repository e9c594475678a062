mod dispatch;
mod outcome;
mod pipelines;
mod router;

use std::sync::Arc;

use anyhow::Result;
use switchyard_core::{
    evaluate, ExpressionError, IntentRules, Language, MathNotationClassifier, Number, NumberLexicon,
    NumberWordConverter, RoutingDecision, RoutingError,
};
use switchyard_ml::{build_intent_classifier, IntentClassifier, ModelConfig};
use switchyard_observability::AppMetrics;
use tracing::instrument;

pub use dispatch::Dispatcher;
pub use outcome::{Outcome, ResultWriter};
pub use pipelines::{
    extract_expression, MathPipeline, MathTextPipeline, Pipeline, PoemPipeline, RagPipeline,
    MAX_SENTENCES,
};
pub use router::Router;

/// Everything a request needs: router, dispatcher and the shared lexicon-backed
/// converter, built once and shared by reference.
#[derive(Clone)]
pub struct Switchboard {
    router: Router,
    dispatcher: Dispatcher,
    converter: Arc<NumberWordConverter>,
    metrics: Arc<AppMetrics>,
}

impl Switchboard {
    pub fn new(classifier: IntentClassifier, metrics: Arc<AppMetrics>) -> Self {
        let lexicon = Arc::new(NumberLexicon::new());
        let converter = Arc::new(NumberWordConverter::new(lexicon.clone()));
        Self {
            router: Router::new(
                classifier,
                MathNotationClassifier::new(lexicon),
                metrics.clone(),
            ),
            dispatcher: Dispatcher::standard(converter.clone(), metrics.clone()),
            converter,
            metrics,
        }
    }

    /// Pattern rules only, no model.
    pub fn rules_only(metrics: Arc<AppMetrics>) -> Self {
        Self::new(
            IntentClassifier::rules_only(Arc::new(IntentRules::standard())),
            metrics,
        )
    }

    /// Classifier chosen from `SWITCHYARD_*` environment settings.
    pub fn load_default(metrics: Arc<AppMetrics>) -> Self {
        let config = ModelConfig::from_env();
        let classifier = build_intent_classifier(&config, Arc::new(IntentRules::standard()));
        Self::new(classifier, metrics)
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    pub async fn route(&self, text: &str) -> Result<RoutingDecision, RoutingError> {
        self.router.route(text).await
    }

    /// Routes `text` and runs the selected pipeline.
    #[instrument(skip(self, text))]
    pub async fn handle(&self, text: &str, sentence_count: Option<u8>) -> Result<Outcome> {
        let decision = self.router.route(text).await?;
        let payload = Dispatcher::payload_for(&decision, sentence_count);
        let result = self.dispatcher.dispatch(&decision, &payload)?;
        Ok(Outcome {
            pipeline: decision.pipeline(),
            decision,
            payload,
            result,
        })
    }

    pub fn evaluate(&self, expression: &str) -> Result<Number, ExpressionError> {
        evaluate(expression).inspect_err(|_| self.metrics.inc_evaluation_error())
    }

    pub fn convert(&self, text: &str) -> String {
        self.converter.convert(text)
    }

    pub fn detect_language(&self, text: &str) -> Option<Language> {
        self.converter.detect_language(text)
    }
}
