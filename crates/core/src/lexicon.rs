use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Italian,
}

impl Language {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "en" | "english" | "inglese" => Some(Self::English),
            "it" | "italian" | "italiano" => Some(Self::Italian),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    /// Units, teens and tens.
    Value(u64),
    /// `hundred` / `cento`: multiplies the group being built.
    Hundred,
    /// `thousand`, `million`, `mila`, ...: closes the group being built.
    Scale(u64),
    /// `and` / `e`: recognized, carries no value.
    Connective,
}

#[derive(Debug, Clone, Copy)]
pub struct LexiconEntry {
    pub word: &'static str,
    pub language: Language,
    pub kind: WordKind,
}

/// A token the lexicon understands, possibly made of several Italian morphemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognized {
    pub language: Language,
    pub parts: Vec<WordKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Anywhere,
    /// Elided tens (`vent`, `trent`): only before `uno`/`otto` and their compounds.
    BeforeVowel,
    /// `tré`: only as the final morpheme of a compound.
    FinalOnly,
}

#[derive(Debug, Clone, Copy)]
struct Morpheme {
    text: &'static str,
    kind: WordKind,
    placement: Placement,
}

const ENGLISH_VALUES: &[(&str, u64)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

const ITALIAN_VALUES: &[(&str, u64)] = &[
    ("zero", 0),
    ("uno", 1),
    ("due", 2),
    ("tre", 3),
    ("quattro", 4),
    ("cinque", 5),
    ("sei", 6),
    ("sette", 7),
    ("otto", 8),
    ("nove", 9),
    ("dieci", 10),
    ("undici", 11),
    ("dodici", 12),
    ("tredici", 13),
    ("quattordici", 14),
    ("quindici", 15),
    ("sedici", 16),
    ("diciassette", 17),
    ("diciotto", 18),
    ("diciannove", 19),
    ("venti", 20),
    ("trenta", 30),
    ("quaranta", 40),
    ("cinquanta", 50),
    ("sessanta", 60),
    ("settanta", 70),
    ("ottanta", 80),
    ("novanta", 90),
];

const ENGLISH_MULTIPLIERS: &[(&str, WordKind)] = &[
    ("hundred", WordKind::Hundred),
    ("thousand", WordKind::Scale(1_000)),
    ("million", WordKind::Scale(1_000_000)),
    ("billion", WordKind::Scale(1_000_000_000)),
];

const ITALIAN_MULTIPLIERS: &[(&str, WordKind)] = &[
    ("cento", WordKind::Hundred),
    ("mille", WordKind::Scale(1_000)),
    ("mila", WordKind::Scale(1_000)),
    ("milione", WordKind::Scale(1_000_000)),
    ("milioni", WordKind::Scale(1_000_000)),
    ("miliardo", WordKind::Scale(1_000_000_000)),
    ("miliardi", WordKind::Scale(1_000_000_000)),
];

/// Number words of both supported languages. Built once and shared read-only.
#[derive(Debug, Clone)]
pub struct NumberLexicon {
    entries: Vec<LexiconEntry>,
    index: HashMap<&'static str, Vec<usize>>,
    morphemes: Vec<Morpheme>,
}

impl NumberLexicon {
    pub fn new() -> Self {
        let mut entries = Vec::new();
        for &(word, value) in ENGLISH_VALUES {
            entries.push(LexiconEntry {
                word,
                language: Language::English,
                kind: WordKind::Value(value),
            });
        }
        for &(word, kind) in ENGLISH_MULTIPLIERS {
            entries.push(LexiconEntry {
                word,
                language: Language::English,
                kind,
            });
        }
        entries.push(LexiconEntry {
            word: "and",
            language: Language::English,
            kind: WordKind::Connective,
        });
        for &(word, value) in ITALIAN_VALUES {
            entries.push(LexiconEntry {
                word,
                language: Language::Italian,
                kind: WordKind::Value(value),
            });
        }
        for &(word, kind) in ITALIAN_MULTIPLIERS {
            entries.push(LexiconEntry {
                word,
                language: Language::Italian,
                kind,
            });
        }
        entries.push(LexiconEntry {
            word: "e",
            language: Language::Italian,
            kind: WordKind::Connective,
        });

        let mut index: HashMap<&'static str, Vec<usize>> = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            index.entry(entry.word).or_default().push(position);
        }

        Self {
            entries,
            index,
            morphemes: italian_morphemes(),
        }
    }

    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    /// Looks up a whole word. `word` must already be lower-cased.
    pub fn lookup(&self, word: &str) -> impl Iterator<Item = &LexiconEntry> + '_ {
        self.index
            .get(word)
            .into_iter()
            .flatten()
            .map(|position| &self.entries[*position])
    }

    /// Language of a connective word (`and`, `e`), if it is one.
    pub fn connective(&self, word: &str) -> Option<Language> {
        let lower = word.to_lowercase();
        self.lookup(&lower)
            .find(|entry| entry.kind == WordKind::Connective)
            .map(|entry| entry.language)
    }

    /// Recognizes a number word or Italian compound. Connectives are not numbers.
    ///
    /// `preferred` breaks ties for words spelled the same in both languages (`zero`).
    pub fn recognize(&self, word: &str, preferred: Option<Language>) -> Option<Recognized> {
        let lower = word.to_lowercase();
        let mut candidates = self
            .lookup(&lower)
            .filter(|entry| entry.kind != WordKind::Connective);
        let first = candidates.next();
        let chosen = match (first, candidates.next(), preferred) {
            (Some(a), Some(b), Some(language)) if b.language == language && a.language != language => Some(b),
            (found, _, _) => found,
        };
        if let Some(entry) = chosen {
            return Some(Recognized {
                language: entry.language,
                parts: vec![entry.kind],
            });
        }

        self.segment_italian(&lower).map(|parts| Recognized {
            language: Language::Italian,
            parts,
        })
    }

    pub fn is_number_word(&self, word: &str) -> bool {
        self.recognize(word, None).is_some()
    }

    fn segment_italian(&self, word: &str) -> Option<Vec<WordKind>> {
        if !word.chars().all(char::is_alphabetic) {
            return None;
        }
        let mut chosen = Vec::new();
        if self.segment_from(word, &mut chosen) && chosen.len() > 1 {
            Some(chosen.iter().map(|morpheme| morpheme.kind).collect())
        } else {
            None
        }
    }

    fn segment_from(&self, rest: &str, chosen: &mut Vec<Morpheme>) -> bool {
        if rest.is_empty() {
            return true;
        }
        for morpheme in &self.morphemes {
            let Some(tail) = rest.strip_prefix(morpheme.text) else {
                continue;
            };
            let allowed = match morpheme.placement {
                Placement::Anywhere => true,
                Placement::BeforeVowel => tail.starts_with("uno") || tail.starts_with('o'),
                Placement::FinalOnly => tail.is_empty() && !chosen.is_empty(),
            };
            if !allowed {
                continue;
            }
            chosen.push(*morpheme);
            if self.segment_from(tail, chosen) {
                return true;
            }
            chosen.pop();
        }
        false
    }
}

impl Default for NumberLexicon {
    fn default() -> Self {
        Self::new()
    }
}

fn italian_morphemes() -> Vec<Morpheme> {
    let mut morphemes = Vec::new();
    for &(word, value) in ITALIAN_VALUES.iter().filter(|(_, value)| *value > 0) {
        morphemes.push(Morpheme {
            text: word,
            kind: WordKind::Value(value),
            placement: Placement::Anywhere,
        });
        if value >= 20 {
            // "venti" -> "vent" before "uno"/"otto"
            let elided = &word[..word.len() - 1];
            morphemes.push(Morpheme {
                text: elided,
                kind: WordKind::Value(value),
                placement: Placement::BeforeVowel,
            });
        }
    }
    for &(word, kind) in ITALIAN_MULTIPLIERS {
        morphemes.push(Morpheme {
            text: word,
            kind,
            placement: Placement::Anywhere,
        });
    }
    morphemes.push(Morpheme {
        text: "cent",
        kind: WordKind::Hundred,
        placement: Placement::BeforeVowel,
    });
    morphemes.push(Morpheme {
        text: "tré",
        kind: WordKind::Value(3),
        placement: Placement::FinalOnly,
    });
    morphemes.sort_by(|a, b| b.text.len().cmp(&a.text.len()));
    morphemes
}

/// Short-scale composition of a run of number words, summing groups left to right.
///
/// Ungrammatical runs such as `five twenty` are added as encountered (25).
/// Returns `None` only on overflow.
pub fn compose(parts: &[WordKind]) -> Option<u64> {
    let mut total = 0_u64;
    let mut current = 0_u64;
    for part in parts {
        match part {
            WordKind::Value(value) => current = current.checked_add(*value)?,
            WordKind::Hundred => current = current.max(1).checked_mul(100)?,
            WordKind::Scale(scale) => {
                total = total.checked_add(current.max(1).checked_mul(*scale)?)?;
                current = 0;
            }
            WordKind::Connective => {}
        }
    }
    total.checked_add(current)
}
