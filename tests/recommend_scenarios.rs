//! Engine properties and end-to-end scenarios over the built-in catalog.

use std::io::Write;

use vitta::profile::{IncomeLevel, UserProfile};
use vitta::recommend::{MatchReason, ProductCatalog, RecommendationResult, recommend};

fn catalog() -> ProductCatalog {
    ProductCatalog::builtin().unwrap()
}

fn profile(
    occupation: Option<&str>,
    income: Option<IncomeLevel>,
    dependents: Option<u32>,
    concerns: &[&str],
    sharia: Option<bool>,
) -> UserProfile {
    let mut p = UserProfile {
        occupation: occupation.map(String::from),
        income_level: income,
        dependents,
        sharia_preference: sharia,
        ..Default::default()
    };
    for c in concerns {
        p.add_concern(c);
    }
    p
}

fn names(result: &RecommendationResult) -> Vec<&str> {
    result
        .recommendations
        .iter()
        .map(|r| r.product.name.as_str())
        .collect()
}

/// A spread of profiles to check the invariants against.
fn sample_profiles() -> Vec<UserProfile> {
    let occupations = [Some("driver ojek"), Some("pedagang"), Some("kurir"), Some("astronaut"), None];
    let incomes = [Some(IncomeLevel::Low), Some(IncomeLevel::Medium), Some(IncomeLevel::High), None];
    let dependents = [Some(0), Some(1), Some(2), Some(3), Some(5), None];
    let concern_sets: [&[&str]; 4] = [
        &[],
        &["accident"],
        &["life", "health"],
        &["education for children", "investment", "business"],
    ];
    let sharia = [Some(true), Some(false), None];

    let mut profiles = Vec::new();
    for occupation in occupations {
        for income in incomes {
            for deps in dependents {
                for concerns in concern_sets {
                    for pref in sharia {
                        profiles.push(profile(occupation, income, deps, concerns, pref));
                    }
                }
            }
        }
    }
    profiles
}

#[test]
fn sharia_preference_yields_only_compliant_products() {
    let catalog = catalog();
    for p in sample_profiles().into_iter().filter(|p| p.sharia_preference == Some(true)) {
        let result = recommend(&p, &catalog);
        assert!(
            result.recommendations.iter().all(|r| r.product.is_sharia_compliant),
            "non-compliant product for {p:?}"
        );
    }
}

#[test]
fn low_income_premium_cap_holds() {
    let catalog = catalog();
    for p in sample_profiles().into_iter().filter(|p| p.income_level == Some(IncomeLevel::Low)) {
        let result = recommend(&p, &catalog);
        assert!(result.recommendations.iter().all(|r| r.product.premium <= 60_000));
    }
}

#[test]
fn large_household_premium_cap_holds() {
    let catalog = catalog();
    for p in sample_profiles().into_iter().filter(|p| p.dependents.is_some_and(|d| d >= 3)) {
        let result = recommend(&p, &catalog);
        assert!(result.recommendations.iter().all(|r| r.product.premium <= 50_000));
    }
}

#[test]
fn every_recommendation_has_two_reasons_and_catalog_order() {
    let catalog = catalog();
    let position = |name: &str| {
        catalog
            .products()
            .iter()
            .position(|p| p.name == name)
            .unwrap()
    };
    for p in sample_profiles() {
        let result = recommend(&p, &catalog);
        assert!(result.recommendations.iter().all(|r| r.reasons.len() >= 2));
        let positions: Vec<usize> = names(&result).into_iter().map(position).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "order broken for {p:?}");
    }
}

#[test]
fn recommend_is_idempotent() {
    let catalog = catalog();
    for p in sample_profiles().into_iter().step_by(7) {
        assert_eq!(recommend(&p, &catalog), recommend(&p, &catalog));
    }
}

#[test]
fn scenario_a_ojek_driver_low_income() {
    let p = profile(
        Some("driver ojek"),
        Some(IncomeLevel::Low),
        Some(0),
        &["accident"],
        Some(false),
    );
    let result = recommend(&p, &catalog());
    let names = names(&result);

    assert!(names.contains(&"Asuransi Kecelakaan Diri"));
    assert!(!names.contains(&"Asuransi Unit Link"));

    let accident = result
        .recommendations
        .iter()
        .find(|r| r.product.name == "Asuransi Kecelakaan Diri")
        .unwrap();
    assert_eq!(
        accident.reasons,
        vec![
            MatchReason::Concern("accident".into()).to_string(),
            MatchReason::Occupation(Some("driver ojek".into())).to_string(),
            MatchReason::ConventionalAvailable.to_string(),
        ]
    );
    assert_eq!(result.profile, p);
}

#[test]
fn scenario_b_sharia_trader_with_child() {
    let p = profile(
        Some("pedagang"),
        Some(IncomeLevel::Medium),
        Some(1),
        &["education for children"],
        Some(true),
    );
    let result = recommend(&p, &catalog());

    assert!(names(&result).contains(&"Asuransi Pendidikan Anak"));
    assert!(result.recommendations.iter().all(|r| r.product.is_sharia_compliant));

    let education = result
        .recommendations
        .iter()
        .find(|r| r.product.name == "Asuransi Pendidikan Anak")
        .unwrap();
    assert!(education.reasons.contains(&MatchReason::ChildEducation.to_string()));
    assert!(education.reasons.contains(&MatchReason::ShariaAligned.to_string()));
}

#[test]
fn scenario_b_accepts_indonesian_income_label() {
    let p: UserProfile = serde_json::from_str(
        r#"{"occupation": "pedagang", "income_level": "menengah", "dependents": 1,
            "concerns": ["education for children"], "sharia_preference": true}"#,
    )
    .unwrap();
    assert!(p.is_complete());
    let result = recommend(&p, &catalog());
    assert!(names(&result).contains(&"Asuransi Pendidikan Anak"));
}

#[test]
fn scenario_c_large_household_life_concern() {
    for income in [IncomeLevel::Low, IncomeLevel::Medium, IncomeLevel::High] {
        let p = profile(Some("buruh"), Some(income), Some(4), &["life"], Some(false));
        let result = recommend(&p, &catalog());
        let names = names(&result);

        assert!(result.recommendations.iter().all(|r| r.product.premium <= 50_000));
        // 50.000 sits exactly on the cap and stays in
        assert!(names.contains(&"Asuransi Jiwa Berjangka"), "{income:?}");
        assert!(!names.contains(&"Asuransi Unit Link"));
    }
}

#[test]
fn scenario_c_life_products_explain_family_protection() {
    let p = profile(Some("buruh"), Some(IncomeLevel::High), Some(4), &["life"], None);
    let result = recommend(&p, &catalog());
    let term_life = result
        .recommendations
        .iter()
        .find(|r| r.product.name == "Asuransi Jiwa Berjangka")
        .unwrap();
    assert!(term_life.reasons.contains(&MatchReason::FamilyLifeProtection.to_string()));
}

#[test]
fn scenario_d_no_signals_no_recommendations() {
    let p = profile(Some("astronaut"), Some(IncomeLevel::High), Some(0), &[], None);
    let result = recommend(&p, &catalog());
    assert!(result.recommendations.is_empty());
}

#[test]
fn scenario_d_catch_all_plus_conventional_reaches_threshold() {
    // The catch-all tag matches any occupation, and an explicit "no sharia"
    // adds a second reason, so catch-all products surface.
    let p = profile(Some("astronaut"), Some(IncomeLevel::High), Some(0), &[], Some(false));
    let result = recommend(&p, &catalog());
    assert_eq!(
        names(&result),
        vec!["Asuransi Jiwa Berjangka", "Asuransi Mikro Syariah", "BPJS Kesehatan"]
    );
}

#[test]
fn overridden_catalog_changes_results_without_engine_changes() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
version = 2

[[products]]
name = "Asuransi Nelayan"
type = "accident"
premium = 15000
benefits = "Cover for fishermen at sea."
is_sharia_compliant = true
suitable_for = ["nelayan"]
"#
    )
    .unwrap();

    let catalog = ProductCatalog::load(file.path()).unwrap();
    assert_eq!(catalog.version(), 2);

    let p = profile(Some("nelayan"), Some(IncomeLevel::Low), Some(2), &["accident"], Some(true));
    let result = recommend(&p, &catalog);
    assert_eq!(names(&result), vec!["Asuransi Nelayan"]);
    assert_eq!(result.recommendations[0].reasons.len(), 3);
}
