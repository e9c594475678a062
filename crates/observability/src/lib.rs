use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Process-wide routing counters. Every update is also forwarded to the `metrics`
/// facade so an installed recorder sees the same numbers.
#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    routed_rag_total: AtomicU64,
    routed_math_total: AtomicU64,
    routed_poem_total: AtomicU64,
    model_classifications_total: AtomicU64,
    pattern_fallbacks_total: AtomicU64,
    evaluation_errors_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub routed_rag_total: u64,
    pub routed_math_total: u64,
    pub routed_poem_total: u64,
    pub model_classifications_total: u64,
    pub pattern_fallbacks_total: u64,
    pub evaluation_errors_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("switchyard_requests_total").increment(1);
    }

    /// Counts one routed request under its category label (`RAG`, `MATH` or `POEM`).
    pub fn inc_routed(&self, category: &'static str) {
        let counter = match category {
            "MATH" => &self.routed_math_total,
            "POEM" => &self.routed_poem_total,
            _ => &self.routed_rag_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("switchyard_routed_total", "category" => category).increment(1);
    }

    pub fn inc_model_classification(&self) {
        self.model_classifications_total
            .fetch_add(1, Ordering::Relaxed);
        metrics::counter!("switchyard_model_classifications_total").increment(1);
    }

    pub fn inc_pattern_fallback(&self) {
        self.pattern_fallbacks_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("switchyard_pattern_fallbacks_total").increment(1);
    }

    pub fn inc_evaluation_error(&self) {
        self.evaluation_errors_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("switchyard_evaluation_errors_total").increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        metrics::histogram!("switchyard_route_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            routed_rag_total: self.routed_rag_total.load(Ordering::Relaxed),
            routed_math_total: self.routed_math_total.load(Ordering::Relaxed),
            routed_poem_total: self.routed_poem_total.load(Ordering::Relaxed),
            model_classifications_total: self.model_classifications_total.load(Ordering::Relaxed),
            pattern_fallbacks_total: self.pattern_fallbacks_total.load(Ordering::Relaxed),
            evaluation_errors_total: self.evaluation_errors_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64 / 1000.0
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,switchyard_agents=info,switchyard_ml=info,switchyard_api=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
