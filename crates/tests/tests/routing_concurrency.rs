use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use switchyard_agents::Switchboard;
use switchyard_core::{Category, ConfidenceSource, IntentRules, RoutingDecision};
use switchyard_ml::{IntentClassifier, IntentModel, ModelError};
use switchyard_observability::AppMetrics;

fn inputs() -> Vec<String> {
    let mut inputs = vec![
        "What is artificial intelligence?".to_string(),
        "Calculate 15 + 27 * 3".to_string(),
        "What is two plus three times five?".to_string(),
        "Write a poem about the ocean".to_string(),
        "Explain quantum computing".to_string(),
        "Solve: twenty-five divided by five".to_string(),
        "quanto fa ventitré per due".to_string(),
        "Scrivi una poesia sul mare".to_string(),
    ];
    for n in 0..40 {
        inputs.push(format!("Compute {n} * {}", n + 1));
        inputs.push(format!("Tell me about topic number {n}"));
    }
    inputs
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_routes_match_sequential_results() {
    let switchboard = Arc::new(Switchboard::rules_only(AppMetrics::shared()));
    let inputs = inputs();

    let mut expected: Vec<RoutingDecision> = Vec::new();
    for input in &inputs {
        expected.push(switchboard.route(input).await.unwrap());
    }

    let handles = inputs
        .iter()
        .cloned()
        .map(|input| {
            let switchboard = switchboard.clone();
            tokio::spawn(async move { switchboard.route(&input).await })
        })
        .collect::<Vec<_>>();

    for (handle, expected) in handles.into_iter().zip(expected) {
        let decision = handle.await.unwrap().unwrap();
        assert_eq!(decision, expected);
    }

    assert_eq!(
        switchboard.metrics().snapshot().requests_total,
        2 * inputs.len() as u64
    );
}

/// Echoes a category derived from the input after a short delay, so concurrent
/// calls overlap inside the model.
struct SlowEchoModel;

#[async_trait]
impl IntentModel for SlowEchoModel {
    fn name(&self) -> &'static str {
        "slow-echo"
    }

    async fn classify(&self, text: &str) -> Result<Category, ModelError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(if text.len() % 2 == 0 {
            Category::Poem
        } else {
            Category::Rag
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_model_calls_do_not_cross_talk() {
    let classifier = IntentClassifier::rules_only(Arc::new(IntentRules::standard()))
        .with_model(Arc::new(SlowEchoModel), Duration::from_secs(2));
    let switchboard = Arc::new(Switchboard::new(classifier, AppMetrics::shared()));

    let texts = (0..64).map(|n| "x".repeat(n + 1)).collect::<Vec<_>>();
    let handles = texts
        .iter()
        .cloned()
        .map(|text| {
            let switchboard = switchboard.clone();
            tokio::spawn(async move { (text.clone(), switchboard.route(&text).await) })
        })
        .collect::<Vec<_>>();

    for joined in join_all(handles).await {
        let (text, decision) = joined.unwrap();
        let decision = decision.unwrap();
        let expected = if text.len() % 2 == 0 {
            Category::Poem
        } else {
            Category::Rag
        };
        assert_eq!(decision.input(), text);
        assert_eq!(decision.category(), expected);
        assert_eq!(decision.confidence_source(), ConfidenceSource::Model);
    }

    assert_eq!(switchboard.metrics().snapshot().model_classifications_total, 64);
}
