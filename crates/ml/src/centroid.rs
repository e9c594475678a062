use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use switchyard_core::Category;

use crate::embedding::{cosine_similarity, normalize, EmbeddingModel};
use crate::{IntentModel, ModelError};

#[derive(Debug, Deserialize)]
struct LabeledExample {
    text: String,
    category: String,
}

/// Nearest-centroid classifier over hashed embeddings, trained from JSONL lines
/// of the form `{"text": "...", "category": "MATH"}`.
#[derive(Clone)]
pub struct CentroidIntentModel {
    centroids: Vec<(Category, Vec<f32>)>,
    embedder: Arc<dyn EmbeddingModel>,
    min_confidence: f32,
}

impl CentroidIntentModel {
    pub fn from_jsonl(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingModel>,
        min_confidence: f32,
    ) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "failed reading intent training dataset at {}",
                path.as_ref().display()
            )
        })?;

        let mut examples = Vec::new();
        for (number, line) in raw
            .lines()
            .map(str::trim)
            .enumerate()
            .filter(|(_, line)| !line.is_empty())
        {
            let example: LabeledExample = serde_json::from_str(line)
                .with_context(|| format!("invalid jsonl training line {}", number + 1))?;
            match Category::parse(&example.category) {
                Some(category) => examples.push((category, example.text)),
                None => tracing::warn!(line = number + 1, label = %example.category, "skipping unknown category"),
            }
        }

        Self::from_examples(examples, embedder, min_confidence)
    }

    pub fn from_examples<I, S>(
        examples: I,
        embedder: Arc<dyn EmbeddingModel>,
        min_confidence: f32,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (Category, S)>,
        S: AsRef<str>,
    {
        let mut by_category: HashMap<Category, Vec<Vec<f32>>> = HashMap::new();
        for (category, text) in examples {
            by_category
                .entry(category)
                .or_default()
                .push(embedder.embed(text.as_ref()));
        }

        // fixed order keeps ties deterministic
        let centroids = Category::ALL
            .into_iter()
            .filter_map(|category| {
                by_category
                    .get(&category)
                    .filter(|vectors| !vectors.is_empty())
                    .map(|vectors| (category, centroid(vectors)))
            })
            .collect::<Vec<_>>();

        if centroids.is_empty() {
            anyhow::bail!("training dataset produced zero intent centroids");
        }

        Ok(Self {
            centroids,
            embedder,
            min_confidence,
        })
    }

    pub fn predict(&self, text: &str) -> (Category, f32) {
        let query = self.embedder.embed(text);
        let mut best_category = Category::Rag;
        let mut best_score = -1.0_f32;

        for (category, center) in &self.centroids {
            let score = cosine_similarity(&query, center);
            if score > best_score {
                best_score = score;
                best_category = *category;
            }
        }

        (best_category, ((best_score + 1.0) / 2.0).clamp(0.0, 1.0))
    }
}

#[async_trait]
impl IntentModel for CentroidIntentModel {
    fn name(&self) -> &'static str {
        "centroid"
    }

    async fn classify(&self, text: &str) -> Result<Category, ModelError> {
        let (category, confidence) = self.predict(text);
        if confidence < self.min_confidence {
            return Err(ModelError::LowConfidence {
                confidence,
                threshold: self.min_confidence,
            });
        }
        Ok(category)
    }
}

fn centroid(vectors: &[Vec<f32>]) -> Vec<f32> {
    let dims = vectors.first().map(Vec::len).unwrap_or(0);
    let mut acc = vec![0.0_f32; dims];

    for vector in vectors {
        for (idx, value) in vector.iter().enumerate() {
            acc[idx] += value;
        }
    }

    for value in &mut acc {
        *value /= vectors.len() as f32;
    }
    normalize(&mut acc);
    acc
}
