use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Rag,
    Math,
    Poem,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Rag, Category::Math, Category::Poem];

    /// Parses a bare label such as `"MATH"` or `"poem"`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "RAG" => Some(Self::Rag),
            "MATH" => Some(Self::Math),
            "POEM" => Some(Self::Poem),
            _ => None,
        }
    }

    /// Finds the first category label inside free model output, e.g. `"Category: MATH."`.
    pub fn find_label(output: &str) -> Option<Self> {
        output
            .split(|ch: char| !ch.is_ascii_alphabetic())
            .find_map(Self::parse)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rag => "RAG",
            Self::Math => "MATH",
            Self::Poem => "POEM",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MathNotation {
    Numeric,
    Textual,
}

impl MathNotation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "NUMERIC",
            Self::Textual => "TEXTUAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceSource {
    Model,
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Rag,
    Math,
    MathText,
    Poem,
}

impl PipelineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rag => "rag",
            Self::Math => "math",
            Self::MathText => "math_text",
            Self::Poem => "poem",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "rag" => Some(Self::Rag),
            "math" => Some(Self::Math),
            "math_text" => Some(Self::MathText),
            "poem" => Some(Self::Poem),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single classification outcome for one request.
///
/// Fields are private so a decision cannot be altered after the router hands it
/// to the dispatcher. `subcategory` is present exactly when the category is MATH.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    input: String,
    category: Category,
    subcategory: Option<MathNotation>,
    confidence_source: ConfidenceSource,
}

impl RoutingDecision {
    pub fn general(input: impl Into<String>, category: Category, source: ConfidenceSource) -> Self {
        debug_assert!(category != Category::Math, "math decisions need a notation");
        Self {
            input: input.into(),
            category,
            subcategory: None,
            confidence_source: source,
        }
    }

    pub fn math(input: impl Into<String>, notation: MathNotation, source: ConfidenceSource) -> Self {
        Self {
            input: input.into(),
            category: Category::Math,
            subcategory: Some(notation),
            confidence_source: source,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn subcategory(&self) -> Option<MathNotation> {
        self.subcategory
    }

    pub fn confidence_source(&self) -> ConfidenceSource {
        self.confidence_source
    }

    pub fn pipeline(&self) -> PipelineKind {
        match (self.category, self.subcategory) {
            (Category::Rag, _) => PipelineKind::Rag,
            (Category::Poem, _) => PipelineKind::Poem,
            (Category::Math, Some(MathNotation::Numeric)) => PipelineKind::Math,
            (Category::Math, _) => PipelineKind::MathText,
        }
    }
}

/// Input handed to a pipeline; serialises to `{query}`, `{math_expression}` or
/// `{sentence_count}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelinePayload {
    Query { query: String },
    MathExpression { math_expression: String },
    SentenceCount { sentence_count: u8 },
}
