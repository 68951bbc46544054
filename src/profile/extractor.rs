//! Keyword-driven profile extraction.
//!
//! Each chat message is matched against an ordered table of regex rules. A
//! matching rule proposes a field update, which is applied with these merge
//! semantics:
//! - occupation and dependents: first write wins
//! - concerns: append only
//! - income level and sharia preference: the latest match wins, including a
//!   later rule in the same message
//!
//! Words that only mean something in a compound are guarded: "sakit" on its
//! own is a health concern, but "rumah sakit" (hospital) is not.
//!
//! This is a heuristic. It is kept behind the `ProfileExtractor` trait so a
//! smarter strategy can replace it.

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::model::{IncomeLevel, UserProfile};

/// Monthly income (millions of rupiah) at or below which the user counts as low income.
pub const LOW_INCOME_MAX_MILLIONS: f64 = 5.0;
/// Monthly income (millions of rupiah) at or below which the user counts as medium income.
pub const MEDIUM_INCOME_MAX_MILLIONS: f64 = 15.0;

/// A single change to a profile field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    Occupation(String),
    IncomeLevel(IncomeLevel),
    Dependents(u32),
    Concern(String),
    ShariaPreference(bool),
}

/// What a rule does when its pattern matches.
#[derive(Debug, Clone)]
pub enum RuleAction {
    /// Apply a fixed update.
    Set(FieldUpdate),
    /// Apply a fixed update if at least one match leaves capture group 1
    /// empty. Group 1 holds a guard prefix that cancels the match.
    SetUnlessGuarded(FieldUpdate),
    /// Capture group 1 holds the number of dependents (digits or a number word).
    DependentsFromCapture,
    /// Capture group 1 holds a monthly income in millions of rupiah.
    IncomeFromMillions,
}

/// A pattern → update rule with a compiled regex.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    /// Human-readable pattern description.
    pub pattern: String,
    /// Compiled regex for matching.
    pub regex: Regex,
    pub action: RuleAction,
}

/// Strategy that turns a raw chat message into profile updates.
pub trait ProfileExtractor: Send + Sync {
    /// Apply whatever the message reveals to `profile`. Returns the updates
    /// that actually changed the profile, in application order.
    fn update(&self, profile: &mut UserProfile, message: &str) -> Vec<FieldUpdate>;
}

/// Rule-table extractor matching Indonesian and English keywords.
pub struct KeywordExtractor {
    rules: Vec<ExtractionRule>,
}

fn rule(pattern: &str, action: RuleAction) -> ExtractionRule {
    ExtractionRule {
        pattern: pattern.into(),
        regex: Regex::new(pattern).unwrap(),
        action,
    }
}

fn occupation(pattern: &str, tag: &str) -> ExtractionRule {
    rule(pattern, RuleAction::Set(FieldUpdate::Occupation(tag.into())))
}

fn concern(pattern: &str, tag: &str) -> ExtractionRule {
    rule(pattern, RuleAction::Set(FieldUpdate::Concern(tag.into())))
}

fn income(pattern: &str, level: IncomeLevel) -> ExtractionRule {
    rule(pattern, RuleAction::Set(FieldUpdate::IncomeLevel(level)))
}

fn sharia(pattern: &str, preference: bool) -> ExtractionRule {
    rule(pattern, RuleAction::Set(FieldUpdate::ShariaPreference(preference)))
}

impl KeywordExtractor {
    /// Create an extractor with the default keyword table. Tags line up with
    /// the occupation and category tags of the built-in catalog.
    pub fn default_rules() -> Self {
        let rules = vec![
            // Occupation, most specific first
            occupation(r"(?i)\b(ojek|ojol|gojek|grab ?bike|motorcycle taxi|ride[- ]?hailing)\b", "driver ojek"),
            occupation(r"(?i)\b(sopir (truk|logistik|ekspedisi)|truck driver|logistics driver)\b", "sopir logistik"),
            occupation(r"(?i)\b(kurir|courier|delivery (driver|rider))\b", "kurir"),
            occupation(r"(?i)\b(buruh harian|daily (worker|labou?rer))\b", "buruh harian"),
            occupation(r"(?i)\b(pekerja kasar|manual (worker|labou?rer))\b", "pekerja kasar"),
            occupation(r"(?i)\b(buruh|factory worker|labou?rer)\b", "buruh"),
            occupation(r"(?i)\b(pemilik warung|punya warung|buka warung|warung owner)\b", "pemilik warung"),
            occupation(r"(?i)\b(penjual online|jualan online|jual online|online seller|olshop)\b", "penjual online"),
            occupation(r"(?i)\b(reseller)\b", "reseller"),
            occupation(r"(?i)\b(dropship(per)?)\b", "dropshipper"),
            occupation(r"(?i)\b(penjahit|tailor|seamstress)\b", "penjahit"),
            occupation(r"(?i)\b(pedagang|berdagang|jualan|trader|merchant|street vendor|seller)\b", "pedagang"),
            occupation(r"(?i)\b(ibu rumah tangga|housewife|stay[- ]at[- ]home (mom|mother|parent))\b", "ibu rumah tangga"),
            occupation(r"(?i)\b(freelancer?|serabutan|pekerja lepas|pekerja informal|informal worker)\b", "pekerja informal"),
            // Income level: keywords first, a stated amount is more specific and overrides
            income(r"(?i)\b(low income|penghasilan (kecil|rendah|pas-?pasan)|gaji (kecil|pas-?pasan|umr)|pas-?pasan)\b", IncomeLevel::Low),
            income(r"(?i)\b(medium income|middle income|penghasilan (menengah|sedang|cukup)|gaji (menengah|cukup))\b", IncomeLevel::Medium),
            income(r"(?i)\b(high income|penghasilan (tinggi|besar)|gaji (besar|tinggi)|well[- ]off)\b", IncomeLevel::High),
            rule(r"(?i)\b(\d+(?:[.,]\d+)?)\s*(?:juta|jt|million)\b", RuleAction::IncomeFromMillions),
            // Dependents
            rule(
                r"(?i)\b(belum punya anak|tidak punya anak|gak punya anak|nggak punya anak|no (kids|children|dependents)|lajang|belum menikah|single)\b",
                RuleAction::Set(FieldUpdate::Dependents(0)),
            ),
            rule(
                r"(?i)\b(\d{1,2}|satu|dua|tiga|empat|lima|one|two|three|four|five)\s+(?:orang\s+)?(?:anak|kids?|children|child|dependents?|tanggungan)\b",
                RuleAction::DependentsFromCapture,
            ),
            // Concerns, tagged with catalog categories
            concern(r"(?i)\b(kecelakaan|celaka|tabrakan|accidents?|crash)\b", "accident"),
            concern(r"(?i)\b(rawat inap|opname|rumah sakit|hospitali[sz]ed|hospital|inpatient)\b", "inpatient"),
            rule(
                r"(?i)(\brumah\s+)?\b(kesehatan|sakit|berobat|dokter|health|medical|doctor)\b",
                RuleAction::SetUnlessGuarded(FieldUpdate::Concern("health".into())),
            ),
            concern(r"(?i)\b(penyakit kritis|kanker|stroke|jantung|critical illness|cancer|heart attack)\b", "critical illness"),
            concern(r"(?i)\b(jiwa|meninggal|life insurance|death|pass(es)? away)\b", "life"),
            concern(r"(?i)\b(pendidikan|sekolah|kuliah|education|school|tuition)\b", "education for children"),
            concern(r"(?i)\b(pensiun|hari tua|retire(ment)?|old age)\b", "pension"),
            concern(r"(?i)\b(investasi|unit link|invest(ment|ing)?)\b", "investment"),
            concern(r"(?i)\b(kebakaran|banjir|properti|fire|flood|property)\b", "property"),
            concern(r"(?i)\b(gadget|hp|handphone|smartphone|phone|laptop)\b", "gadget"),
            concern(r"(?i)\b(usaha|bisnis|toko|business|shop)\b", "business"),
            concern(r"(?i)\b(pengiriman|kiriman|paket|shipping|shipment|cargo)\b", "logistics"),
            concern(r"(?i)\b(perjalanan|mudik|travel(ling)?|trip)\b", "travel"),
            // Sharia preference: the negative forms contain the positive keyword, so they come last
            sharia(r"(?i)\b(syariah|sharia|syariat|halal|takaful)\b", true),
            sharia(
                r"(?i)\b((tidak|tak|gak|nggak|enggak|ga|ndak|bukan)\s+(\w+\s+){0,2}(syariah|sharia)|non[- ]?(syariah|sharia)|konvensional|conventional|no sharia|(don[’']?t|do not) (need|want|care about)( an?)? (sharia|syariah))\b",
                false,
            ),
        ];

        Self { rules }
    }

    /// Create an empty extractor (for testing).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a custom rule. It is evaluated after the existing ones.
    pub fn add_rule(&mut self, pattern: &str, action: RuleAction) -> Result<(), regex::Error> {
        self.rules.push(ExtractionRule {
            pattern: pattern.into(),
            regex: Regex::new(pattern)?,
            action,
        });
        Ok(())
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    /// Evaluate one rule against a message, producing the proposed update.
    fn propose(rule: &ExtractionRule, message: &str) -> Option<FieldUpdate> {
        match &rule.action {
            RuleAction::Set(update) => rule.regex.is_match(message).then(|| update.clone()),
            RuleAction::SetUnlessGuarded(update) => rule
                .regex
                .captures_iter(message)
                .any(|captures| captures.get(1).is_none())
                .then(|| update.clone()),
            RuleAction::DependentsFromCapture => {
                let captures = rule.regex.captures(message)?;
                parse_count(captures.get(1)?.as_str()).map(FieldUpdate::Dependents)
            }
            RuleAction::IncomeFromMillions => {
                let captures = rule.regex.captures(message)?;
                let amount: f64 = captures.get(1)?.as_str().replace(',', ".").parse().ok()?;
                Some(FieldUpdate::IncomeLevel(income_band(amount)))
            }
        }
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::default_rules()
    }
}

impl ProfileExtractor for KeywordExtractor {
    fn update(&self, profile: &mut UserProfile, message: &str) -> Vec<FieldUpdate> {
        let mut applied = Vec::new();

        for rule in &self.rules {
            let Some(update) = Self::propose(rule, message) else {
                continue;
            };
            if apply_update(profile, &update) {
                debug!(rule = %rule.pattern, update = ?update, "Profile field updated");
                applied.push(update);
            }
        }

        applied
    }
}

/// Merge one update into the profile. Returns true if the profile changed.
pub fn apply_update(profile: &mut UserProfile, update: &FieldUpdate) -> bool {
    match update {
        FieldUpdate::Occupation(occupation) => {
            if profile.occupation().is_some() {
                return false;
            }
            profile.occupation = Some(occupation.clone());
            true
        }
        FieldUpdate::Dependents(count) => {
            if profile.dependents.is_some() {
                return false;
            }
            profile.dependents = Some(*count);
            true
        }
        FieldUpdate::Concern(tag) => profile.add_concern(tag),
        FieldUpdate::IncomeLevel(level) => {
            let changed = profile.income_level != Some(*level);
            profile.income_level = Some(*level);
            changed
        }
        FieldUpdate::ShariaPreference(preference) => {
            let changed = profile.sharia_preference != Some(*preference);
            profile.sharia_preference = Some(*preference);
            changed
        }
    }
}

fn income_band(monthly_millions: f64) -> IncomeLevel {
    if monthly_millions <= LOW_INCOME_MAX_MILLIONS {
        IncomeLevel::Low
    } else if monthly_millions <= MEDIUM_INCOME_MAX_MILLIONS {
        IncomeLevel::Medium
    } else {
        IncomeLevel::High
    }
}

fn parse_count(raw: &str) -> Option<u32> {
    match raw.to_lowercase().as_str() {
        "satu" | "one" => Some(1),
        "dua" | "two" => Some(2),
        "tiga" | "three" => Some(3),
        "empat" | "four" => Some(4),
        "lima" | "five" => Some(5),
        digits => digits.parse().ok(),
    }
}
