use std::sync::Arc;

use crate::lexicon::NumberLexicon;
use crate::models::MathNotation;

/// Tells digit-form math (`15 + 27`) from word-form math (`fifteen plus ventisette`).
#[derive(Debug, Clone)]
pub struct MathNotationClassifier {
    lexicon: Arc<NumberLexicon>,
}

impl MathNotationClassifier {
    pub fn new(lexicon: Arc<NumberLexicon>) -> Self {
        Self { lexicon }
    }

    pub fn classify_math(&self, text: &str) -> MathNotation {
        if text.chars().any(|ch| ch.is_ascii_digit()) {
            return MathNotation::Numeric;
        }

        let lower = text.to_lowercase();
        let has_number_word = lower
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .any(|token| self.lexicon.is_number_word(token));

        if !has_number_word {
            tracing::debug!("math input without digits or number words, assuming textual");
        }
        // Math-routed text carries a number in some form; words are the only option left.
        MathNotation::Textual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> MathNotationClassifier {
        MathNotationClassifier::new(Arc::new(NumberLexicon::new()))
    }

    #[test]
    fn classifies_reference_inputs() {
        let classifier = classifier();
        let cases = [
            ("15 + 27 * 3", MathNotation::Numeric),
            ("two plus three times five", MathNotation::Textual),
            ("100 / 5 + 2", MathNotation::Numeric),
            ("twenty-five divided by five", MathNotation::Textual),
            ("due più tre", MathNotation::Textual),
            ("5 * 6 - 2", MathNotation::Numeric),
            ("ten minus four", MathNotation::Textual),
            ("quanto fa ventitré per due?", MathNotation::Textual),
        ];
        for (text, expected) in cases {
            assert_eq!(classifier.classify_math(text), expected, "{text}");
        }
    }

    #[test]
    fn digits_win_over_words() {
        assert_eq!(classifier().classify_math("seven plus 3"), MathNotation::Numeric);
    }

    #[test]
    fn no_signal_defaults_to_textual() {
        assert_eq!(classifier().classify_math("solve it"), MathNotation::Textual);
    }
}
