use std::sync::Arc;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use switchyard_core::{
    evaluate, spell_out, Language, Number, NumberWordConverter, PipelineKind, PipelinePayload,
};
use switchyard_observability::AppMetrics;

/// One downstream processor, selected by the dispatcher from a routing decision.
pub trait Pipeline: Send + Sync {
    fn kind(&self) -> PipelineKind;
    fn run(&self, payload: &PipelinePayload) -> Result<String>;
}

static REQUEST_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:please|can you|could you)\s+)?(?:(?:calculate|compute|solve|evaluate|work out|what\s+is|what's|how\s+much\s+is|quanto\s+fa|calcola|risolvi|dimmi)\b\s*:?\s*)+",
    )
    .expect("valid request prefix pattern")
});

static QUESTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:what\s+is|what\s+are|who\s+is|who\s+was|how\s+does|how\s+do|why\s+is|explain|describe|tell\s+me\s+about|information\s+about|cos'è|chi\s+è|spiega|descrivi|dimmi)\b\s*:?\s*",
    )
    .expect("valid question prefix pattern")
});

/// Operator phrases, longest first so `diviso per` wins over `per`.
static OPERATOR_WORDS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"raised\s+to(?:\s+the\s+power\s+of)?", "^"),
        (r"to\s+the\s+power\s+of", "^"),
        (r"multiplied\s+by", "*"),
        (r"divided\s+by", "/"),
        (r"moltiplicato\s+per", "*"),
        (r"diviso\s+per", "/"),
        (r"elevato\s+(?:a|alla)", "^"),
        (r"plus", "+"),
        (r"minus", "-"),
        (r"times", "*"),
        (r"over", "/"),
        (r"più", "+"),
        (r"meno", "-"),
        (r"per", "*"),
        (r"diviso", "/"),
        (r"x", "*"),
    ]
    .into_iter()
    .map(|(pattern, symbol)| {
        let regex = Regex::new(&format!(r"(?i)\b{pattern}\b")).expect("valid operator word pattern");
        (regex, symbol)
    })
    .collect()
});

fn strip_request(text: &str) -> &str {
    let start = REQUEST_PREFIX.find(text).map(|found| found.end()).unwrap_or(0);
    text[start..].trim().trim_end_matches(['?', '!', '=', '.']).trim()
}

/// Digit-form math: `Calculate 15 + 27 * 3` → `Result: 96`.
pub struct MathPipeline {
    metrics: Arc<AppMetrics>,
}

impl MathPipeline {
    pub fn new(metrics: Arc<AppMetrics>) -> Self {
        Self { metrics }
    }
}

/// Normalizes the usual typed spellings of operators before evaluation.
pub fn extract_expression(text: &str) -> String {
    strip_request(text)
        .replace("**", "^")
        .replace(['×', 'x', 'X'], "*")
        .replace('÷', "/")
}

impl Pipeline for MathPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Math
    }

    fn run(&self, payload: &PipelinePayload) -> Result<String> {
        let PipelinePayload::MathExpression { math_expression } = payload else {
            bail!("math pipeline expects a math_expression payload");
        };
        let expression = extract_expression(math_expression);
        Ok(match evaluate(&expression) {
            Ok(value) => format!("Result: {value}"),
            Err(error) => {
                self.metrics.inc_evaluation_error();
                format!("Error: {error}")
            }
        })
    }
}

/// Word-form math in English or Italian: number words become digits, operator words
/// become symbols, and the answer is also spelled out in the request's language.
pub struct MathTextPipeline {
    converter: Arc<NumberWordConverter>,
    metrics: Arc<AppMetrics>,
}

impl MathTextPipeline {
    pub fn new(converter: Arc<NumberWordConverter>, metrics: Arc<AppMetrics>) -> Self {
        Self { converter, metrics }
    }

    pub fn to_expression(&self, text: &str) -> String {
        let mut expression = self.converter.convert(strip_request(text));
        for (regex, symbol) in OPERATOR_WORDS.iter() {
            expression = regex.replace_all(&expression, *symbol).into_owned();
        }
        expression
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Pipeline for MathTextPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::MathText
    }

    fn run(&self, payload: &PipelinePayload) -> Result<String> {
        let PipelinePayload::MathExpression { math_expression } = payload else {
            bail!("math_text pipeline expects a math_expression payload");
        };
        let language = self
            .converter
            .detect_language(math_expression)
            .unwrap_or(Language::English);
        let expression = self.to_expression(math_expression);

        Ok(match evaluate(&expression) {
            Ok(value) => match spell_number(value, language) {
                Some(words) => format!("Result: {value} ({words})"),
                None => format!("Result: {value}"),
            },
            Err(error) => {
                self.metrics.inc_evaluation_error();
                format!("Error: {error} (from \"{expression}\")")
            }
        })
    }
}

fn spell_number(value: Number, language: Language) -> Option<String> {
    let integer = value.as_integer()?;
    let words = spell_out(integer.unsigned_abs(), language)?;
    if integer >= 0 {
        return Some(words);
    }
    let sign = match language {
        Language::English => "minus",
        Language::Italian => "meno",
    };
    Some(format!("{sign} {words}"))
}

/// Information requests. Produces a deterministic research outline for the topic.
#[derive(Debug, Default)]
pub struct RagPipeline;

impl RagPipeline {
    pub fn topic(query: &str) -> String {
        let start = QUESTION_PREFIX.find(query).map(|found| found.end()).unwrap_or(0);
        let topic = query[start..].trim().trim_end_matches(['?', '!', '.']).trim();
        if topic.is_empty() {
            query.trim().to_string()
        } else {
            topic.to_string()
        }
    }
}

impl Pipeline for RagPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Rag
    }

    fn run(&self, payload: &PipelinePayload) -> Result<String> {
        let PipelinePayload::Query { query } = payload else {
            bail!("rag pipeline expects a query payload");
        };
        let topic = Self::topic(query);
        Ok(format!(
            "Research brief: {topic}\n\
             1. Definition: what {topic} is and where the term comes from.\n\
             2. Key concepts: the main ideas and components behind {topic}.\n\
             3. Applications: where {topic} is used today.\n\
             4. Limits: open questions and common misconceptions about {topic}."
        ))
    }
}

const VERSES: [&str; 5] = [
    "Quiet circuits hum beneath the evening light,",
    "each question folds into a patient thought,",
    "numbers drift like lanterns through the night,",
    "and every answer carries what it sought.",
    "So words and reason walk the road as one.",
];

pub const MAX_SENTENCES: u8 = VERSES.len() as u8;

/// Creative requests. Writes `sentence_count` lines of verse.
#[derive(Debug, Default)]
pub struct PoemPipeline;

impl Pipeline for PoemPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Poem
    }

    fn run(&self, payload: &PipelinePayload) -> Result<String> {
        let PipelinePayload::SentenceCount { sentence_count } = payload else {
            bail!("poem pipeline expects a sentence_count payload");
        };
        if !(1..=MAX_SENTENCES).contains(sentence_count) {
            bail!("sentence_count must be between 1 and {MAX_SENTENCES}, got {sentence_count}");
        }
        let poem = VERSES[..usize::from(*sentence_count)].join("\n");
        if poem.ends_with('.') {
            Ok(poem)
        } else {
            Ok(format!("{}.", poem.trim_end_matches(',')))
        }
    }
}
