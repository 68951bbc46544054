//! Rule-based recommendation engine.
//!
//! Each product is judged on its own, in catalog order. A product is either
//! excluded outright by a hard rule, or collects match reasons; it is
//! recommended once it has at least [`MIN_REASONS`] of them.
//!
//! The engine is a pure function of the profile and the catalog: no I/O, no
//! logging, no errors. An empty recommendation list is a normal outcome.

use serde::{Deserialize, Serialize};

use super::catalog::{Product, ProductCatalog};
use crate::profile::{IncomeLevel, UserProfile};

/// Minimum number of match reasons for a product to be recommended.
pub const MIN_REASONS: usize = 2;

/// Households with at least this many dependents get the premium cap below.
pub const LARGE_HOUSEHOLD_DEPENDENTS: u32 = 3;
/// Highest premium offered to large households.
pub const LARGE_HOUSEHOLD_PREMIUM_CAP: u64 = 50_000;
/// Highest premium offered to low-income users.
pub const LOW_INCOME_PREMIUM_CAP: u64 = 60_000;
/// Highest premium offered to medium-income users.
pub const MEDIUM_INCOME_PREMIUM_CAP: u64 = 200_000;

/// Category tag of child-education products.
pub const CHILD_EDUCATION_TYPE: &str = "education for children";
/// Category tag of life products.
pub const LIFE_TYPE: &str = "life";

/// Why a product fits the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchReason {
    /// The product category is one of the user's concerns.
    Concern(String),
    /// The product targets the user's occupation, or everyone.
    Occupation(Option<String>),
    ShariaAligned,
    /// Granted whenever the user explicitly has no sharia preference, whatever
    /// the product's own compliance flag.
    ConventionalAvailable,
    ChildEducation,
    FamilyLifeProtection,
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concern(kind) => write!(f, "Matches your concern about {kind}"),
            Self::Occupation(Some(occupation)) => {
                write!(f, "Suits your work as {occupation}")
            }
            Self::Occupation(None) => write!(f, "Suits any kind of work"),
            Self::ShariaAligned => write!(f, "Fits your sharia preference"),
            Self::ConventionalAvailable => write!(f, "Available in a conventional form"),
            Self::ChildEducation => write!(
                f,
                "You have children to support, so their education needs protecting"
            ),
            Self::FamilyLifeProtection => {
                write!(f, "Life protection matters for keeping your family safe")
            }
        }
    }
}

/// A recommended product with the reasons it was picked, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product: Product,
    pub reasons: Vec<String>,
}

/// Engine output: the profile it ran on plus the accepted products in
/// catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub profile: UserProfile,
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationResult {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// Match a profile against the catalog.
pub fn recommend(profile: &UserProfile, catalog: &ProductCatalog) -> RecommendationResult {
    let recommendations = catalog
        .products()
        .iter()
        .filter(|product| !is_excluded(profile, product))
        .filter_map(|product| {
            let reasons = match_reasons(profile, product);
            (reasons.len() >= MIN_REASONS).then(|| Recommendation {
                product: product.clone(),
                reasons: reasons.iter().map(ToString::to_string).collect(),
            })
        })
        .collect();

    RecommendationResult {
        profile: profile.clone(),
        recommendations,
    }
}

/// Hard rules. Any one of them removes the product from consideration.
pub fn is_excluded(profile: &UserProfile, product: &Product) -> bool {
    if profile.sharia_preference == Some(true) && !product.is_sharia_compliant {
        return true;
    }

    if profile
        .dependents
        .is_some_and(|d| d >= LARGE_HOUSEHOLD_DEPENDENTS)
        && product.premium > LARGE_HOUSEHOLD_PREMIUM_CAP
    {
        return true;
    }

    match profile.income_level {
        Some(IncomeLevel::Low) => product.premium > LOW_INCOME_PREMIUM_CAP,
        Some(IncomeLevel::Medium) => product.premium > MEDIUM_INCOME_PREMIUM_CAP,
        Some(IncomeLevel::High) | None => false,
    }
}

/// Soft rules. Each one that holds contributes one reason.
pub fn match_reasons(profile: &UserProfile, product: &Product) -> Vec<MatchReason> {
    let mut reasons = Vec::new();
    let kind = product.kind.trim().to_lowercase();

    if profile.concerns.iter().any(|c| c.trim().to_lowercase() == kind) {
        reasons.push(MatchReason::Concern(product.kind.clone()));
    }

    let occupation = profile.occupation();
    if product.suits_occupation(occupation) {
        reasons.push(MatchReason::Occupation(occupation.map(String::from)));
    }

    match profile.sharia_preference {
        Some(true) if product.is_sharia_compliant => reasons.push(MatchReason::ShariaAligned),
        Some(false) => reasons.push(MatchReason::ConventionalAvailable),
        _ => {}
    }

    let dependents = profile.dependents.unwrap_or(0);
    if dependents >= 1 && kind == CHILD_EDUCATION_TYPE {
        reasons.push(MatchReason::ChildEducation);
    }
    if dependents >= 2 && kind == LIFE_TYPE {
        reasons.push(MatchReason::FamilyLifeProtection);
    }

    reasons
}
