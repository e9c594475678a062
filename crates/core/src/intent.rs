use regex::Regex;

use crate::error::RoutingError;
use crate::models::Category;

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Rejects empty or whitespace-only input and returns the normalized text.
pub fn require_text(input: &str) -> Result<String, RoutingError> {
    let normalized = normalize_text(input);
    if normalized.is_empty() {
        Err(RoutingError::EmptyInput)
    } else {
        Ok(normalized)
    }
}

/// Source form of one classification rule, compiled by [`IntentRules::new`].
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub name: &'static str,
    pub category: Category,
    pub pattern: &'static str,
}

pub const MATH_RULES: &[RuleSpec] = &[
    RuleSpec {
        name: "numeric_operation",
        category: Category::Math,
        pattern: r"\d+(?:\.\d+)?\s*[-+*/^x×÷]\s*\(?\s*-?\d",
    },
    RuleSpec {
        name: "digits_with_operator",
        category: Category::Math,
        pattern: r"(?s)\d.*[-+*/^]|[-+*/^].*\d",
    },
    RuleSpec {
        name: "math_verb",
        category: Category::Math,
        pattern: r"\b(?:calculate|compute|solve|evaluate|math|arithmetic|calcola|risolvi|quanto fa)\b",
    },
    RuleSpec {
        name: "operator_word",
        category: Category::Math,
        pattern: r"\b(?:plus|minus|times|divided by|multiplied by|add|subtract|multiply|divide|più|meno|diviso|moltiplicato)\b",
    },
];

pub const POEM_RULES: &[RuleSpec] = &[
    RuleSpec {
        name: "verse_form",
        category: Category::Poem,
        pattern: r"\b(?:poem|poetry|verse|rhyme|haiku|sonnet|ballad|limerick|poesia|filastrocca|rima|sonetto)\b",
    },
    RuleSpec {
        name: "creative_request",
        category: Category::Poem,
        pattern: r"\b(?:write|create|compose|craft|scrivi|componi|inventa)\b.*\b(?:story|song|tale|lyrics|storia|canzone|racconto|favola)\b",
    },
];

pub const RAG_RULES: &[RuleSpec] = &[
    RuleSpec {
        name: "question_word",
        category: Category::Rag,
        pattern: r"\b(?:what|who|where|when|why|how|explain|describe|tell me about|information about)\b",
    },
    RuleSpec {
        name: "definition",
        category: Category::Rag,
        pattern: r"\b(?:define|definition|meaning|concept|theory|principle|history|background|overview|summary)\b",
    },
    RuleSpec {
        name: "italian_question",
        category: Category::Rag,
        pattern: r"(?:\bcos'è|\bchi è|\bdove\b|\bquando\b|\bperché|\bcome\b|\bspiega\b|\bdescrivi\b|\bdimmi\b)",
    },
];

#[derive(Debug, Clone)]
pub struct ClassificationPattern {
    pub name: &'static str,
    pub category: Category,
    pub regex: Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    pub category: Category,
    pub rule: Option<&'static str>,
}

/// Ordered rule table. Categories are tried in priority order MATH > POEM > RAG and
/// the first matching rule wins; with no match the table answers RAG.
#[derive(Debug, Clone)]
pub struct IntentRules {
    patterns: Vec<ClassificationPattern>,
}

impl IntentRules {
    pub const PRIORITY: [Category; 3] = [Category::Math, Category::Poem, Category::Rag];

    pub fn new(specs: &[RuleSpec]) -> Result<Self, regex::Error> {
        let mut patterns = Vec::with_capacity(specs.len());
        for category in Self::PRIORITY {
            for spec in specs.iter().filter(|spec| spec.category == category) {
                patterns.push(ClassificationPattern {
                    name: spec.name,
                    category: spec.category,
                    regex: Regex::new(&format!("(?i){}", spec.pattern))?,
                });
            }
        }
        Ok(Self { patterns })
    }

    pub fn standard() -> Self {
        let specs = [MATH_RULES, POEM_RULES, RAG_RULES].concat();
        Self::new(&specs).expect("valid built-in intent patterns")
    }

    pub fn patterns(&self) -> &[ClassificationPattern] {
        &self.patterns
    }

    pub fn classify(&self, text: &str) -> RuleMatch {
        self.patterns
            .iter()
            .find(|pattern| pattern.regex.is_match(text))
            .map(|pattern| RuleMatch {
                category: pattern.category,
                rule: Some(pattern.name),
            })
            .unwrap_or(RuleMatch {
                category: Category::Rag,
                rule: None,
            })
    }

    /// Every category with at least one matching rule, in priority order.
    pub fn matched_categories(&self, text: &str) -> Vec<Category> {
        Self::PRIORITY
            .into_iter()
            .filter(|category| {
                self.patterns
                    .iter()
                    .any(|pattern| pattern.category == *category && pattern.regex.is_match(text))
            })
            .collect()
    }

    /// True when the table alone cannot give a single confident answer.
    pub fn is_ambiguous(&self, text: &str) -> bool {
        self.matched_categories(text).len() != 1
    }
}

impl Default for IntentRules {
    fn default() -> Self {
        Self::standard()
    }
}

pub fn classify_intent_rules(rules: &IntentRules, text: &str) -> Category {
    rules.classify(text).category
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> IntentRules {
        IntentRules::standard()
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(require_text("  \t\n"), Err(RoutingError::EmptyInput));
        assert_eq!(require_text("  hi   there ").unwrap(), "hi there");
    }

    #[test]
    fn routes_demonstration_inputs() {
        let rules = rules();
        let cases = [
            ("What is artificial intelligence?", Category::Rag),
            ("Calculate 15 + 27 * 3", Category::Math),
            ("What is two plus three times five?", Category::Math),
            ("Write a poem about the ocean", Category::Poem),
            ("Explain quantum computing", Category::Rag),
            ("Solve: twenty-five divided by five", Category::Math),
            ("How does photosynthesis work?", Category::Rag),
            ("Compute 100 / 5 + 2", Category::Math),
            ("Tell me about the history of Rome", Category::Rag),
            ("Create a haiku about stars", Category::Poem),
            ("Scrivi una poesia sul mare", Category::Poem),
            ("quanto fa due più tre", Category::Math),
        ];
        for (text, expected) in cases {
            assert_eq!(classify_intent_rules(&rules, text), expected, "{text}");
        }
    }

    #[test]
    fn math_outranks_poem() {
        let rules = rules();
        let matched = rules.classify("write a poem about 2+2");
        assert_eq!(matched.category, Category::Math);
        assert_eq!(matched.rule, Some("numeric_operation"));
        assert!(rules.is_ambiguous("write a poem about 2+2"));
    }

    #[test]
    fn unmatched_text_defaults_to_rag() {
        let matched = rules().classify("the quick brown fox");
        assert_eq!(matched, RuleMatch { category: Category::Rag, rule: None });
    }

    #[test]
    fn digits_and_operator_anywhere_is_math() {
        let rules = rules();
        for text in ["3 apples + pears", "a+b 7", "route 66 - history", "(4)*"] {
            assert_eq!(classify_intent_rules(&rules, text), Category::Math, "{text}");
        }
    }

    #[test]
    fn word_boundaries_are_respected() {
        let rules = rules();
        assert_eq!(classify_intent_rules(&rules, "visit the Adda river"), Category::Rag);
        assert_eq!(classify_intent_rules(&rules, "a story about mathematicians"), Category::Rag);
    }

    #[test]
    fn custom_rules_keep_priority_order() {
        let specs = [
            RuleSpec { name: "any_rag", category: Category::Rag, pattern: "." },
            RuleSpec { name: "any_poem", category: Category::Poem, pattern: "." },
        ];
        let rules = IntentRules::new(&specs).unwrap();
        assert_eq!(rules.classify("x").rule, Some("any_poem"));
        assert!(IntentRules::new(&[RuleSpec { name: "bad", category: Category::Rag, pattern: "(" }]).is_err());
    }
}
