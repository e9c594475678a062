use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use switchyard_core::IntentRules;
use tracing::{info, warn};

use crate::{
    CentroidIntentModel, ConsultPolicy, HashEmbeddingModel, IntentClassifier, IntentModel,
    OpenAiIntentModel,
};

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/responses";
const DEFAULT_DATASET: &str = "data/intent.jsonl";
const EMBEDDING_DIMS: usize = 192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    /// OpenAI when a key is configured, else the centroid model when its dataset exists.
    Auto,
    OpenAi,
    Centroid,
    None,
}

impl ClassifierBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "openai" => Some(Self::OpenAi),
            "centroid" => Some(Self::Centroid),
            "none" | "rules" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub url: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("url", &self.url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub backend: ClassifierBackend,
    pub openai: Option<OpenAiConfig>,
    pub dataset_path: PathBuf,
    pub min_confidence: f32,
    pub timeout: Duration,
    pub consult: ConsultPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Auto,
            openai: None,
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            min_confidence: 0.55,
            timeout: IntentClassifier::DEFAULT_TIMEOUT,
            consult: ConsultPolicy::Always,
        }
    }
}

impl ModelConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads `SWITCHYARD_*` settings through `lookup`; unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = value("SWITCHYARD_CLASSIFIER")
            .and_then(|raw| {
                let parsed = ClassifierBackend::parse(&raw);
                if parsed.is_none() {
                    warn!(value = %raw, "unknown SWITCHYARD_CLASSIFIER, using auto");
                }
                parsed
            })
            .unwrap_or(defaults.backend);

        let openai = value("SWITCHYARD_OPENAI_API_KEY").map(|api_key| OpenAiConfig {
            api_key,
            model: value("SWITCHYARD_OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            url: value("SWITCHYARD_OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
        });

        let dataset_path = value("SWITCHYARD_INTENT_DATASET")
            .map(PathBuf::from)
            .unwrap_or(defaults.dataset_path);
        let min_confidence = value("SWITCHYARD_CENTROID_MIN_CONFIDENCE")
            .and_then(|raw| raw.parse::<f32>().ok())
            .filter(|confidence| (0.0..=1.0).contains(confidence))
            .unwrap_or(defaults.min_confidence);
        let timeout = value("SWITCHYARD_CLASSIFIER_TIMEOUT_MS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.timeout);
        let consult = value("SWITCHYARD_CONSULT")
            .and_then(|raw| ConsultPolicy::parse(&raw))
            .unwrap_or(defaults.consult);

        Self {
            backend,
            openai,
            dataset_path,
            min_confidence,
            timeout,
            consult,
        }
    }
}

/// Builds the classifier described by `config`. A model that cannot be set up is
/// logged and skipped, leaving the rule table in charge.
pub fn build_intent_classifier(config: &ModelConfig, rules: Arc<IntentRules>) -> IntentClassifier {
    let classifier = IntentClassifier::rules_only(rules).with_consult(config.consult);
    match build_model(config) {
        Some(model) => {
            info!(model = model.name(), timeout_ms = config.timeout.as_millis() as u64, "intent model enabled");
            classifier.with_model(model, config.timeout)
        }
        None => {
            info!("intent model disabled, using pattern rules only");
            classifier
        }
    }
}

fn build_model(config: &ModelConfig) -> Option<Arc<dyn IntentModel>> {
    match config.backend {
        ClassifierBackend::None => None,
        ClassifierBackend::OpenAi => openai_model(config),
        ClassifierBackend::Centroid => centroid_model(config),
        ClassifierBackend::Auto => {
            if config.openai.is_some() {
                openai_model(config)
            } else if config.dataset_path.exists() {
                centroid_model(config)
            } else {
                None
            }
        }
    }
}

fn openai_model(config: &ModelConfig) -> Option<Arc<dyn IntentModel>> {
    let Some(openai) = config.openai.clone() else {
        warn!("openai classifier selected but SWITCHYARD_OPENAI_API_KEY is not set");
        return None;
    };
    match OpenAiIntentModel::new(openai) {
        Ok(model) => Some(Arc::new(model)),
        Err(error) => {
            warn!(error = %error, "failed to set up openai classifier");
            None
        }
    }
}

fn centroid_model(config: &ModelConfig) -> Option<Arc<dyn IntentModel>> {
    let embedder = Arc::new(HashEmbeddingModel::new(EMBEDDING_DIMS));
    match CentroidIntentModel::from_jsonl(&config.dataset_path, embedder, config.min_confidence) {
        Ok(model) => Some(Arc::new(model)),
        Err(error) => {
            warn!(path = %config.dataset_path.display(), error = %error, "failed to load centroid classifier");
            None
        }
    }
}
