use std::sync::Arc;
use std::time::Instant;

use switchyard_core::{Category, ConfidenceSource, MathNotationClassifier, RoutingDecision, RoutingError};
use switchyard_ml::IntentClassifier;
use switchyard_observability::AppMetrics;
use tracing::{info, instrument};

/// Intent classification followed, for MATH only, by notation classification.
#[derive(Clone)]
pub struct Router {
    classifier: IntentClassifier,
    notation: MathNotationClassifier,
    metrics: Arc<AppMetrics>,
}

impl Router {
    pub fn new(
        classifier: IntentClassifier,
        notation: MathNotationClassifier,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            classifier,
            notation,
            metrics,
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    #[instrument(skip(self, text))]
    pub async fn route(&self, text: &str) -> Result<RoutingDecision, RoutingError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let classification = self.classifier.classify(text).await?;
        match classification.source {
            ConfidenceSource::Model => self.metrics.inc_model_classification(),
            ConfidenceSource::Pattern => self.metrics.inc_pattern_fallback(),
        }

        let decision = match classification.category {
            Category::Math => RoutingDecision::math(
                text,
                self.notation.classify_math(text),
                classification.source,
            ),
            category => RoutingDecision::general(text, category, classification.source),
        };

        self.metrics.inc_routed(decision.category().as_str());
        self.metrics.observe_latency(started.elapsed());
        info!(
            category = %decision.category(),
            subcategory = decision.subcategory().map(|notation| notation.as_str()),
            source = ?decision.confidence_source(),
            rule = classification.rule,
            pipeline = %decision.pipeline(),
            "request routed"
        );

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use switchyard_core::{IntentRules, MathNotation, NumberLexicon, PipelineKind};

    use super::*;

    fn router() -> Router {
        Router::new(
            IntentClassifier::rules_only(Arc::new(IntentRules::standard())),
            MathNotationClassifier::new(Arc::new(NumberLexicon::new())),
            AppMetrics::shared(),
        )
    }

    #[tokio::test]
    async fn routes_demonstration_inputs() {
        let router = router();
        let cases = [
            ("What is artificial intelligence?", Category::Rag, None, PipelineKind::Rag),
            (
                "Calculate 15 + 27 * 3",
                Category::Math,
                Some(MathNotation::Numeric),
                PipelineKind::Math,
            ),
            (
                "What is two plus three times five?",
                Category::Math,
                Some(MathNotation::Textual),
                PipelineKind::MathText,
            ),
            ("Write a poem about the ocean", Category::Poem, None, PipelineKind::Poem),
            ("Explain quantum computing", Category::Rag, None, PipelineKind::Rag),
            (
                "Solve: twenty-five divided by five",
                Category::Math,
                Some(MathNotation::Textual),
                PipelineKind::MathText,
            ),
        ];

        for (text, category, subcategory, pipeline) in cases {
            let decision = router.route(text).await.unwrap();
            assert_eq!(decision.input(), text);
            assert_eq!(decision.category(), category, "{text}");
            assert_eq!(decision.subcategory(), subcategory, "{text}");
            assert_eq!(decision.pipeline(), pipeline, "{text}");
            assert_eq!(decision.confidence_source(), ConfidenceSource::Pattern);
        }
    }

    #[tokio::test]
    async fn empty_input_propagates() {
        assert_eq!(router().route(" \n ").await, Err(RoutingError::EmptyInput));
    }

    #[tokio::test]
    async fn digits_with_operator_are_numeric_math() {
        let router = router();
        for text in ["tell me 3+4", "poem 7*8", "x = 2 - 1", "12/4 please"] {
            let decision = router.route(text).await.unwrap();
            assert_eq!(decision.category(), Category::Math, "{text}");
            assert_eq!(decision.subcategory(), Some(MathNotation::Numeric), "{text}");
        }
    }

    #[tokio::test]
    async fn counts_routed_requests() {
        let metrics = AppMetrics::shared();
        let router = Router::new(
            IntentClassifier::rules_only(Arc::new(IntentRules::standard())),
            MathNotationClassifier::new(Arc::new(NumberLexicon::new())),
            metrics.clone(),
        );
        router.route("Write a haiku").await.unwrap();
        router.route("2 + 2").await.unwrap();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.pattern_fallbacks_total, 2);
        assert_eq!(snapshot.routed_poem_total, 1);
        assert_eq!(snapshot.routed_math_total, 1);
    }
}
