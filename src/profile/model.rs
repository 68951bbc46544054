//! User profile data model gathered during the intake conversation.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Coarse monthly income bracket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum IncomeLevel {
    #[serde(rename = "low", alias = "rendah")]
    Low,
    #[serde(rename = "medium", alias = "menengah")]
    Medium,
    #[serde(rename = "high", alias = "tinggi")]
    High,
}

impl std::fmt::Display for IncomeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for IncomeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "rendah" => Ok(Self::Low),
            "medium" | "menengah" => Ok(Self::Medium),
            "high" | "tinggi" => Ok(Self::High),
            other => Err(format!("unknown income level: {other}")),
        }
    }
}

/// Profile fields, in the order the assistant asks about them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Occupation,
    IncomeLevel,
    Dependents,
    Concerns,
    ShariaPreference,
}

impl ProfileField {
    pub const ALL: [ProfileField; 5] = [
        Self::Occupation,
        Self::IncomeLevel,
        Self::Dependents,
        Self::Concerns,
        Self::ShariaPreference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Occupation => "occupation",
            Self::IncomeLevel => "income_level",
            Self::Dependents => "dependents",
            Self::Concerns => "concerns",
            Self::ShariaPreference => "sharia_preference",
        }
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What we know about the user so far. Every field starts unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_level: Option<IncomeLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependents: Option<u32>,
    /// Lower-case, trimmed, non-blank tags. Deserialized input is normalised
    /// the same way as `add_concern`.
    #[serde(deserialize_with = "deserialize_concerns")]
    pub concerns: BTreeSet<String>,
    /// `None` means the user has not expressed a preference either way.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharia_preference: Option<bool>,
}

fn normalise_concern(concern: &str) -> Option<String> {
    let tag = concern.trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

fn deserialize_concerns<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw.iter().filter_map(|c| normalise_concern(c)).collect())
}

impl UserProfile {
    /// Add a concern tag, normalised to lower case. Returns false for
    /// duplicates and blank tags.
    pub fn add_concern(&mut self, concern: &str) -> bool {
        match normalise_concern(concern) {
            Some(tag) => self.concerns.insert(tag),
            None => false,
        }
    }

    /// Occupation, if known and non-blank.
    pub fn occupation(&self) -> Option<&str> {
        self.occupation
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }

    fn has(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Occupation => self.occupation().is_some(),
            ProfileField::IncomeLevel => self.income_level.is_some(),
            ProfileField::Dependents => self.dependents.is_some(),
            ProfileField::Concerns => !self.concerns.is_empty(),
            ProfileField::ShariaPreference => self.sharia_preference.is_some(),
        }
    }

    /// Fields that are still unknown.
    pub fn missing_fields(&self) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|f| !self.has(*f))
            .collect()
    }

    /// A profile is complete once all five fields are known. Only complete
    /// profiles are handed to the recommendation engine.
    pub fn is_complete(&self) -> bool {
        ProfileField::ALL.iter().all(|f| self.has(*f))
    }

    /// Render the profile as a markdown section for system prompt injection.
    pub fn to_prompt_section(&self) -> String {
        let mut parts = vec!["# What we know about the user".to_string()];

        if let Some(occupation) = self.occupation() {
            parts.push(format!("- **Occupation:** {occupation}"));
        }
        if let Some(income) = self.income_level {
            parts.push(format!("- **Income level:** {income}"));
        }
        if let Some(dependents) = self.dependents {
            parts.push(format!("- **Dependents:** {dependents}"));
        }
        if !self.concerns.is_empty() {
            let concerns: Vec<&str> = self.concerns.iter().map(String::as_str).collect();
            parts.push(format!("- **Concerns:** {}", concerns.join(", ")));
        }
        match self.sharia_preference {
            Some(true) => parts.push("- **Sharia:** prefers sharia-compliant products".to_string()),
            Some(false) => parts.push("- **Sharia:** conventional products are fine".to_string()),
            None => {}
        }

        let missing = self.missing_fields();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
            parts.push(format!("- **Still unknown:** {}", names.join(", ")));
        }

        parts.join("\n")
    }
}
