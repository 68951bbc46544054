//! Turn processing: profile extraction, LLM reply, and recommendations once
//! the profile is complete.

use std::sync::Arc;

use tracing::{info, warn};

use super::session::Session;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, Role};
use crate::profile::{FieldUpdate, ProfileExtractor};
use crate::recommend::{ProductCatalog, RecommendationResult, recommend, render_result};

/// Prefix of the assistant turn that replaces a failed LLM reply.
pub const FAILURE_MARKER: &str = "❌";

/// What happened during one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant's conversational reply, or the inline failure message.
    pub reply: String,
    pub llm_failed: bool,
    /// Profile updates extracted from the user's message.
    pub updates: Vec<FieldUpdate>,
    /// Set when the profile became complete (or changed while complete).
    pub recommendation: Option<RecommendationResult>,
}

impl TurnOutcome {
    /// The recommendation as chat text, if one was produced this turn.
    pub fn rendered_recommendation(&self) -> Option<String> {
        self.recommendation.as_ref().map(render_result)
    }
}

/// Drives the intake conversation. Holds no per-conversation state; every
/// call works on the `Session` it is given.
pub struct ChatAssistant {
    llm: Arc<dyn LlmProvider>,
    extractor: Arc<dyn ProfileExtractor>,
    catalog: Arc<ProductCatalog>,
    system_prompt: String,
    history_window: usize,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ChatAssistant {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        extractor: Arc<dyn ProfileExtractor>,
        catalog: Arc<ProductCatalog>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            extractor,
            catalog,
            system_prompt: system_prompt.into(),
            history_window: 10,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the length of each reply. Unset leaves it to the backend.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Shared handle to the catalog, for surfaces that serve it directly.
    pub fn catalog(&self) -> Arc<ProductCatalog> {
        Arc::clone(&self.catalog)
    }

    /// System prompt plus the most recent turns.
    fn build_messages(&self, session: &Session) -> Vec<ChatMessage> {
        let system = format!(
            "{}\n\n{}",
            self.system_prompt,
            session.profile.to_prompt_section()
        );
        let mut messages = vec![ChatMessage::system(system)];
        messages.extend(session.recent_messages(self.history_window));
        messages
    }

    /// Process one user message.
    ///
    /// 1. Record the user turn and update the profile from it.
    /// 2. Ask the LLM for a reply. A failure becomes an inline error turn.
    /// 3. If the profile is complete and changed since the last
    ///    recommendation, run the engine and append the rendered result.
    pub async fn process_turn(&self, session: &mut Session, message: &str) -> TurnOutcome {
        let message = message.trim();
        session.push(Role::User, message);

        let updates = self.extractor.update(&mut session.profile, message);
        if !updates.is_empty() {
            info!(
                session = %session.id,
                updates = updates.len(),
                missing = session.profile.missing_fields().len(),
                "Profile updated"
            );
        }

        let mut request = CompletionRequest::new(self.build_messages(session))
            .with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        let (reply, llm_failed) = match self.llm.complete(request).await {
            Ok(response) => (response.content.trim().to_string(), false),
            Err(e) => {
                warn!(session = %session.id, model = self.llm.model_name(), "LLM call failed: {}", e);
                (format!("{FAILURE_MARKER} Failed to get response: {e}"), true)
            }
        };
        session.push(Role::Assistant, reply.clone());

        let recommendation = if session.needs_recommendation() {
            let result = recommend(&session.profile, &self.catalog);
            info!(
                session = %session.id,
                matches = result.recommendations.len(),
                "Profile complete, recommending"
            );
            session.push(Role::Assistant, render_result(&result));
            session.mark_recommended();
            Some(result)
        } else {
            None
        };

        TurnOutcome {
            reply,
            llm_failed,
            updates,
            recommendation,
        }
    }

    /// Recommendations for the session's current profile, if it is complete.
    pub fn recommend_now(&self, session: &Session) -> Option<RecommendationResult> {
        session
            .profile
            .is_complete()
            .then(|| recommend(&session.profile, &self.catalog))
    }
}
