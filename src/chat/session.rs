//! Per-conversation state: message history and the profile built so far.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::llm::{ChatMessage, Role};
use crate::profile::UserProfile;

/// One message in the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// State owned by a single conversation. Mutated only by the turn that is
/// currently being processed.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    history: Vec<Turn>,
    pub profile: UserProfile,
    /// Profile the last recommendation was rendered for.
    #[serde(skip)]
    last_recommended: Option<UserProfile>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            history: Vec::new(),
            profile: UserProfile::default(),
            last_recommended: None,
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(Turn::new(role, content));
    }

    /// The last `window` turns as LLM chat messages.
    pub fn recent_messages(&self, window: usize) -> Vec<ChatMessage> {
        let start = self.history.len().saturating_sub(window);
        self.history[start..]
            .iter()
            .map(|t| ChatMessage::new(t.role, t.content.clone()))
            .collect()
    }

    /// Whether the current profile is complete and has not been recommended
    /// on yet.
    pub fn needs_recommendation(&self) -> bool {
        self.profile.is_complete() && self.last_recommended.as_ref() != Some(&self.profile)
    }

    pub fn mark_recommended(&mut self) {
        self.last_recommended = Some(self.profile.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::IncomeLevel;

    fn complete_profile() -> UserProfile {
        let mut p = UserProfile {
            occupation: Some("kurir".into()),
            income_level: Some(IncomeLevel::Low),
            dependents: Some(1),
            sharia_preference: Some(false),
            ..Default::default()
        };
        p.add_concern("gadget");
        p
    }

    #[test]
    fn new_session_is_empty() {
        let session = Session::new();
        assert!(session.history().is_empty());
        assert!(!session.needs_recommendation());
    }

    #[test]
    fn recent_messages_respects_window() {
        let mut session = Session::new();
        for i in 0..5 {
            session.push(Role::User, format!("u{i}"));
            session.push(Role::Assistant, format!("a{i}"));
        }
        let recent = session.recent_messages(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "a3");
        assert_eq!(recent[2].content, "a4");
        assert_eq!(recent[2].role, Role::Assistant);
        assert_eq!(session.recent_messages(100).len(), 10);
    }

    #[test]
    fn recommendation_is_needed_again_after_profile_changes() {
        let mut session = Session::new();
        session.profile = complete_profile();
        assert!(session.needs_recommendation());

        session.mark_recommended();
        assert!(!session.needs_recommendation());

        session.profile.add_concern("accident");
        assert!(session.needs_recommendation());
    }
}
