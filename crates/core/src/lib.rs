pub mod error;
pub mod expression;
pub mod intent;
pub mod lexicon;
pub mod models;
pub mod notation;
pub mod words;

pub use error::{ExpressionError, RoutingError};
pub use expression::{evaluate, is_safe, ExpressionToken, Number, Operator};
pub use intent::{classify_intent_rules, normalize_text, require_text, IntentRules, RuleMatch, RuleSpec};
pub use lexicon::{Language, NumberLexicon};
pub use models::*;
pub use notation::MathNotationClassifier;
pub use words::{spell_out, NumberWordConverter};
