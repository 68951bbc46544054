//! Turning engine output into chat-ready text.

use super::engine::{Recommendation, RecommendationResult};

/// Shown when no product reaches the acceptance threshold.
pub const NO_MATCH_MESSAGE: &str = "I couldn't find a product that clearly fits your profile yet. \
Tell me a bit more about what worries you most, and I'll take another look.";

const FIRST_REASON_PREFIX: &str = "Why it fits: ";
const NEXT_REASON_JOINER: &str = ", and also ";

/// Join reasons into one sentence, keeping their order. The first reason is
/// prefixed, later ones start lower-case so the sentence reads as one clause.
pub fn format_reasons(reasons: &[String]) -> String {
    let mut out = String::new();
    for (i, reason) in reasons.iter().enumerate() {
        if i == 0 {
            out.push_str(FIRST_REASON_PREFIX);
            out.push_str(reason);
        } else {
            out.push_str(NEXT_REASON_JOINER);
            out.push_str(&lowercase_first(reason));
        }
    }
    if !out.is_empty() {
        out.push('.');
    }
    out
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Format a rupiah amount with dot thousands separators, e.g. `Rp25.000`.
pub fn format_rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("Rp{grouped}")
}

fn render_recommendation(index: usize, rec: &Recommendation) -> String {
    let product = &rec.product;
    let sharia = if product.is_sharia_compliant {
        ", sharia"
    } else {
        ""
    };
    format!(
        "{}. **{}** ({}{}): {}/month\n   {}\n   {}",
        index + 1,
        product.name,
        product.kind,
        sharia,
        format_rupiah(product.premium),
        product.benefits,
        format_reasons(&rec.reasons),
    )
}

/// Render a recommendation result as a chat message.
pub fn render_result(result: &RecommendationResult) -> String {
    if result.recommendations.is_empty() {
        return NO_MATCH_MESSAGE.to_string();
    }

    let mut parts = vec!["Based on what you've told me, these products look like a good fit:".to_string()];
    parts.extend(
        result
            .recommendations
            .iter()
            .enumerate()
            .map(|(i, rec)| render_recommendation(i, rec)),
    );
    parts.join("\n\n")
}
