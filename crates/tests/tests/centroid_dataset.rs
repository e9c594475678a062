use std::path::PathBuf;
use std::sync::Arc;

use switchyard_core::{Category, IntentRules};
use switchyard_ml::{
    build_intent_classifier, CentroidIntentModel, ClassifierBackend, HashEmbeddingModel,
    IntentModel, ModelConfig,
};

fn dataset() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/intent.sample.jsonl")
}

#[tokio::test]
async fn sample_dataset_trains_every_category() {
    let model =
        CentroidIntentModel::from_jsonl(dataset(), Arc::new(HashEmbeddingModel::new(192)), 0.0)
            .expect("sample dataset should load");

    assert_eq!(model.classify("Calculate 15 + 27 * 3").await.unwrap(), Category::Math);
    assert_eq!(model.classify("Write a sonnet about love").await.unwrap(), Category::Poem);
    assert_eq!(model.classify("Explain quantum computing").await.unwrap(), Category::Rag);
}

#[test]
fn centroid_backend_loads_from_config() {
    let config = ModelConfig {
        backend: ClassifierBackend::Centroid,
        dataset_path: dataset(),
        ..ModelConfig::default()
    };
    let classifier = build_intent_classifier(&config, Arc::new(IntentRules::standard()));
    assert_eq!(classifier.model_name(), Some("centroid"));
}
