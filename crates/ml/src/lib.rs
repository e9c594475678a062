mod centroid;
mod config;
mod embedding;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use switchyard_core::{require_text, Category, ConfidenceSource, IntentRules, RoutingError};
use thiserror::Error;
use tracing::{debug, warn};

pub use centroid::CentroidIntentModel;
pub use config::{build_intent_classifier, ClassifierBackend, ModelConfig, OpenAiConfig};
pub use embedding::{EmbeddingModel, HashEmbeddingModel};
pub use openai::OpenAiIntentModel;

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("classifier is unavailable: {0}")]
    Unavailable(String),
    #[error("classifier request failed: {0}")]
    Transport(String),
    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("classifier returned an unknown label: {0:?}")]
    InvalidLabel(String),
    #[error("classifier confidence {confidence:.2} is below {threshold:.2}")]
    LowConfidence { confidence: f32, threshold: f32 },
    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),
}

/// Probabilistic intent classification capability: one of RAG/MATH/POEM or a failure.
#[async_trait]
pub trait IntentModel: Send + Sync {
    fn name(&self) -> &'static str;
    async fn classify(&self, text: &str) -> Result<Category, ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultPolicy {
    /// Ask the model for every request.
    #[default]
    Always,
    /// Ask the model only when the rule table matches several categories or none.
    Ambiguous,
}

impl ConsultPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "always" => Some(Self::Always),
            "ambiguous" => Some(Self::Ambiguous),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub category: Category,
    pub source: ConfidenceSource,
    pub rule: Option<&'static str>,
    /// Why the model answer was not used, when a model was consulted and failed.
    pub model_error: Option<ModelError>,
}

/// RAG/MATH/POEM classifier: optional model first, rule table as the fallback.
#[derive(Clone)]
pub struct IntentClassifier {
    rules: Arc<IntentRules>,
    model: Option<Arc<dyn IntentModel>>,
    timeout: Duration,
    consult: ConsultPolicy,
}

impl IntentClassifier {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

    pub fn rules_only(rules: Arc<IntentRules>) -> Self {
        Self {
            rules,
            model: None,
            timeout: Self::DEFAULT_TIMEOUT,
            consult: ConsultPolicy::Always,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn IntentModel>, timeout: Duration) -> Self {
        self.model = Some(model);
        self.timeout = timeout;
        self
    }

    pub fn with_consult(mut self, consult: ConsultPolicy) -> Self {
        self.consult = consult;
        self
    }

    pub fn model_name(&self) -> Option<&'static str> {
        self.model.as_ref().map(|model| model.name())
    }

    pub fn rules(&self) -> &IntentRules {
        &self.rules
    }

    /// Deterministic pattern classification, no model involved.
    pub fn classify_fallback(&self, text: &str) -> Result<Category, RoutingError> {
        let text = require_text(text)?;
        Ok(self.rules.classify(&text).category)
    }

    pub async fn classify(&self, text: &str) -> Result<Classification, RoutingError> {
        let text = require_text(text)?;
        let matched = self.rules.classify(&text);
        let pattern = |model_error| Classification {
            category: matched.category,
            source: ConfidenceSource::Pattern,
            rule: matched.rule,
            model_error,
        };

        let Some(model) = self.model.as_ref() else {
            return Ok(pattern(None));
        };
        if self.consult == ConsultPolicy::Ambiguous && !self.rules.is_ambiguous(&text) {
            debug!(rule = ?matched.rule, "rule table is unambiguous, model not consulted");
            return Ok(pattern(None));
        }

        let outcome = match tokio::time::timeout(self.timeout, model.classify(&text)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(category) => Ok(Classification {
                category,
                source: ConfidenceSource::Model,
                rule: None,
                model_error: None,
            }),
            Err(error) => {
                warn!(model = model.name(), error = %error, "model classification failed, using patterns");
                Ok(pattern(Some(error)))
            }
        }
    }
}
