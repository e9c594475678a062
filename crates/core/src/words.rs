use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use crate::lexicon::{compose, Language, NumberLexicon, WordKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Number {
        text: &'a str,
        language: Language,
        parts: Vec<WordKind>,
    },
    Connective {
        text: &'a str,
        language: Language,
    },
    Hyphen(&'a str),
    Space(&'a str),
    Other(&'a str),
}

impl<'a> Token<'a> {
    fn text(&self) -> &'a str {
        match self {
            Token::Number { text, .. } | Token::Connective { text, .. } => text,
            Token::Hyphen(text) | Token::Space(text) | Token::Other(text) => text,
        }
    }

    fn number_in(&self, language: Language) -> Option<&[WordKind]> {
        match self {
            Token::Number {
                language: found,
                parts,
                ..
            } if *found == language => Some(parts),
            _ => None,
        }
    }

    fn is_connective_in(&self, language: Language) -> bool {
        matches!(self, Token::Connective { language: found, .. } if *found == language)
    }
}

/// Replaces English and Italian number words with digits, leaving every other
/// token (operator words, punctuation, whitespace, casing) untouched.
#[derive(Debug, Clone)]
pub struct NumberWordConverter {
    lexicon: Arc<NumberLexicon>,
}

impl NumberWordConverter {
    pub fn new(lexicon: Arc<NumberLexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &NumberLexicon {
        &self.lexicon
    }

    pub fn convert(&self, text: &str) -> String {
        let tokens = self.tokenize(text);
        let mut output = String::with_capacity(text.len());
        let mut index = 0;

        while index < tokens.len() {
            let Token::Number { language, parts, .. } = &tokens[index] else {
                output.push_str(tokens[index].text());
                index += 1;
                continue;
            };

            let language = *language;
            let mut run_parts = parts.clone();
            let mut end = index + 1;
            while let Some((next_end, parts)) = extend_run(&tokens, end, language, &run_parts) {
                run_parts.extend(parts);
                end = next_end;
            }

            match compose(&run_parts) {
                Some(value) => output.push_str(&value.to_string()),
                None => tokens[index..end]
                    .iter()
                    .for_each(|token| output.push_str(token.text())),
            }
            index = end;
        }

        output
    }

    /// Detects the dominant number-word language, used to phrase answers.
    pub fn detect_language(&self, text: &str) -> Option<Language> {
        let mut english = 0_usize;
        let mut italian = 0_usize;
        for word in text.unicode_words() {
            match self.lexicon.recognize(word, None).map(|found| found.language) {
                Some(Language::English) => english += 1,
                Some(Language::Italian) => italian += 1,
                None => {}
            }
        }
        match (english, italian) {
            (0, 0) => None,
            (en, it) if it > en => Some(Language::Italian),
            _ => Some(Language::English),
        }
    }

    fn tokenize<'a>(&self, text: &'a str) -> Vec<Token<'a>> {
        let mut tokens: Vec<Token<'a>> = Vec::new();
        let mut last_language = None;
        for piece in text.split_word_bounds() {
            let token = if piece.chars().all(char::is_whitespace) {
                Token::Space(piece)
            } else if piece == "-" {
                Token::Hyphen(piece)
            } else if let Some(language) = self.lexicon.connective(piece) {
                Token::Connective {
                    text: piece,
                    language,
                }
            } else {
                match self.lexicon.recognize(piece, last_language) {
                    Some(found) => {
                        last_language = Some(found.language);
                        Token::Number {
                            text: piece,
                            language: found.language,
                            parts: found.parts,
                        }
                    }
                    None => Token::Other(piece),
                }
            };
            tokens.push(token);
        }
        tokens
    }
}

/// Tries to grow a run at `start`; returns the new end and the parts consumed.
///
/// Accepted continuations: `<space> number`, `- number` (no spaces, as in
/// `twenty-five`), and `<space> and <space> number` right after a multiplier.
fn extend_run(
    tokens: &[Token<'_>],
    start: usize,
    language: Language,
    run: &[WordKind],
) -> Option<(usize, Vec<WordKind>)> {
    let first = tokens.get(start)?;
    match first {
        Token::Space(_) => {
            let next = tokens.get(start + 1)?;
            if let Some(parts) = next.number_in(language) {
                return Some((start + 2, parts.to_vec()));
            }
            let after_multiplier = matches!(
                run.last(),
                Some(WordKind::Hundred) | Some(WordKind::Scale(_))
            );
            if after_multiplier
                && next.is_connective_in(language)
                && matches!(tokens.get(start + 2), Some(Token::Space(_)))
            {
                let parts = tokens.get(start + 3)?.number_in(language)?;
                let mut consumed = vec![WordKind::Connective];
                consumed.extend_from_slice(parts);
                return Some((start + 4, consumed));
            }
            None
        }
        Token::Hyphen(_) => {
            let parts = tokens.get(start + 1)?.number_in(language)?;
            Some((start + 2, parts.to_vec()))
        }
        _ => None,
    }
}

const EN_UNITS: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];
const EN_TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
const IT_UNITS: [&str; 20] = [
    "zero", "uno", "due", "tre", "quattro", "cinque", "sei", "sette", "otto", "nove", "dieci",
    "undici", "dodici", "tredici", "quattordici", "quindici", "sedici", "diciassette",
    "diciotto", "diciannove",
];
const IT_TENS: [&str; 10] = [
    "", "", "venti", "trenta", "quaranta", "cinquanta", "sessanta", "settanta", "ottanta",
    "novanta",
];

pub const MAX_SPELLED: u64 = 999_999;

/// Writes `n` in words, or `None` above [`MAX_SPELLED`].
pub fn spell_out(n: u64, language: Language) -> Option<String> {
    if n > MAX_SPELLED {
        return None;
    }
    Some(match language {
        Language::English => spell_english(n),
        Language::Italian => spell_italian(n),
    })
}

fn spell_english(n: u64) -> String {
    if n == 0 {
        return EN_UNITS[0].to_string();
    }
    let mut words = Vec::new();
    let thousands = n / 1_000;
    if thousands > 0 {
        words.push(english_below_thousand(thousands));
        words.push("thousand".to_string());
    }
    let rest = n % 1_000;
    if rest > 0 {
        words.push(english_below_thousand(rest));
    }
    words.join(" ")
}

fn english_below_thousand(n: u64) -> String {
    let mut words = Vec::new();
    let hundreds = (n / 100) as usize;
    if hundreds > 0 {
        words.push(format!("{} hundred", EN_UNITS[hundreds]));
    }
    let rest = (n % 100) as usize;
    match rest {
        0 => {}
        1..=19 => words.push(EN_UNITS[rest].to_string()),
        _ if rest % 10 == 0 => words.push(EN_TENS[rest / 10].to_string()),
        _ => words.push(format!("{}-{}", EN_TENS[rest / 10], EN_UNITS[rest % 10])),
    }
    words.join(" ")
}

fn spell_italian(n: u64) -> String {
    if n == 0 {
        return IT_UNITS[0].to_string();
    }
    let mut word = String::new();
    match n / 1_000 {
        0 => {}
        1 => word.push_str("mille"),
        thousands => {
            word.push_str(&italian_below_thousand(thousands));
            word.push_str("mila");
        }
    }
    word.push_str(&italian_below_thousand(n % 1_000));
    word
}

fn italian_below_thousand(n: u64) -> String {
    let mut word = String::new();
    match n / 100 {
        0 => {}
        1 => word.push_str("cento"),
        hundreds => {
            word.push_str(IT_UNITS[hundreds as usize]);
            word.push_str("cento");
        }
    }
    let rest = (n % 100) as usize;
    match rest {
        0 => {}
        1..=19 => word.push_str(IT_UNITS[rest]),
        _ => {
            let tens = IT_TENS[rest / 10];
            let unit = rest % 10;
            match unit {
                0 => word.push_str(tens),
                1 | 8 => {
                    word.push_str(&tens[..tens.len() - 1]);
                    word.push_str(IT_UNITS[unit]);
                }
                3 => {
                    word.push_str(tens);
                    word.push_str("tré");
                }
                _ => {
                    word.push_str(tens);
                    word.push_str(IT_UNITS[unit]);
                }
            }
        }
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> NumberWordConverter {
        NumberWordConverter::new(Arc::new(NumberLexicon::new()))
    }

    #[test]
    fn converts_english_expression() {
        assert_eq!(converter().convert("twenty-five minus ten"), "25 minus 10");
    }

    #[test]
    fn converts_italian_expression() {
        assert_eq!(converter().convert("due più tre fa cinque"), "2 più 3 fa 5");
    }

    #[test]
    fn keeps_punctuation_and_case() {
        let converter = converter();
        assert_eq!(
            converter.convert("What is Two plus three, times five?"),
            "What is 2 plus 3, times 5?"
        );
        assert_eq!(converter.convert("Solve: twenty-five divided by five"), "Solve: 25 divided by 5");
    }

    #[test]
    fn joins_multipliers_and_connectives() {
        let converter = converter();
        assert_eq!(converter.convert("one hundred and five apples"), "105 apples");
        assert_eq!(converter.convert("two thousand three hundred"), "2300");
        assert_eq!(converter.convert("cento e due"), "102");
        assert_eq!(converter.convert("ventitré per quattro"), "23 per 4");
    }

    #[test]
    fn connectives_between_plain_numbers_are_kept() {
        let converter = converter();
        assert_eq!(converter.convert("two and three"), "2 and 3");
        assert_eq!(converter.convert("one hundred and"), "100 and");
        assert_eq!(converter.convert("five - three"), "5 - 3");
    }

    #[test]
    fn languages_do_not_mix_within_a_run() {
        assert_eq!(converter().convert("twenty due"), "20 2");
    }

    #[test]
    fn ungrammatical_runs_are_summed() {
        assert_eq!(converter().convert("five twenty"), "25");
    }

    #[test]
    fn digit_text_is_a_fixed_point() {
        let converter = converter();
        for text in ["12 + 7", "3.5 * (2 - 1)", "100", ""] {
            let once = converter.convert(text);
            assert_eq!(once, text);
            assert_eq!(converter.convert(&once), once);
        }
    }

    #[test]
    fn round_trips_zero_to_one_thousand() {
        let converter = converter();
        for language in [Language::English, Language::Italian] {
            for n in 0..=1_000 {
                let words = spell_out(n, language).unwrap();
                assert_eq!(converter.convert(&words), n.to_string(), "{words}");
            }
        }
    }

    #[test]
    fn spells_larger_numbers() {
        assert_eq!(
            spell_out(21_018, Language::English).as_deref(),
            Some("twenty-one thousand eighteen")
        );
        assert_eq!(spell_out(2_023, Language::Italian).as_deref(), Some("duemilaventitré"));
        assert_eq!(spell_out(1_000_000, Language::English), None);
        let converter = converter();
        assert_eq!(converter.convert("duemilaventitré"), "2023");
        assert_eq!(converter.convert("twenty-one thousand eighteen"), "21018");
    }

    #[test]
    fn long_inputs_convert_in_one_pass() {
        let converter = converter();
        let filler = "a ".repeat(8_000);
        assert_eq!(converter.convert(&filler), filler);

        let text = format!("due {filler}più tre");
        assert_eq!(converter.convert(&text), format!("2 {filler}più 3"));
    }

    #[test]
    fn detects_dominant_language() {
        let converter = converter();
        assert_eq!(converter.detect_language("due più tre"), Some(Language::Italian));
        assert_eq!(converter.detect_language("two plus three"), Some(Language::English));
        assert_eq!(converter.detect_language("hello"), None);
    }
}
