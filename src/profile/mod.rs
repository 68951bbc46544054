//! User profile: what the assistant has learned about the user so far, and
//! the heuristics that fill it in from free-form chat.

pub mod extractor;
pub mod model;

pub use extractor::{FieldUpdate, KeywordExtractor, ProfileExtractor, RuleAction};
pub use model::{IncomeLevel, ProfileField, UserProfile};
