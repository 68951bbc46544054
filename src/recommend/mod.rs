//! Recommendation engine: matches a complete user profile against the
//! product catalog and renders the result for chat.

pub mod catalog;
pub mod engine;
pub mod format;

pub use catalog::{ALL_AUDIENCES, Product, ProductCatalog};
pub use engine::{MatchReason, Recommendation, RecommendationResult, recommend};
pub use format::{NO_MATCH_MESSAGE, format_reasons, format_rupiah, render_result};
