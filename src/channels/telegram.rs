//! Telegram channel: long-polls the Bot API and keeps one session per chat.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::cli::{Command, render_history};
use crate::chat::{ChatAssistant, Session, SessionStore};
use crate::config::TelegramConfig;
use crate::error::ChannelError;

const NAME: &str = "telegram";

/// Bot API host.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Long-poll timeout passed to getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

pub const WELCOME_MESSAGE: &str = "Halo! Saya Vitta. Ceritakan sedikit tentang pekerjaan \
dan keluargamu, nanti saya bantu carikan asuransi mikro yang cocok.";

/// Envelope of every Bot API reply.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

/// A text message pulled out of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingText {
    pub chat_id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub text: String,
}

impl IncomingText {
    /// Text messages only. Stickers, photos, edits and the like yield `None`.
    pub fn from_update(update: &Update) -> Option<Self> {
        let message = update.message.as_ref()?;
        let text = message.text.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            chat_id: message.chat.id,
            user_id: message.from.as_ref().map(|u| u.id),
            username: message.from.as_ref().and_then(|u| u.username.clone()),
            text: text.to_string(),
        })
    }
}

/// Telegram channel, connected to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    allowed_users: Vec<String>,
    api_base: String,
    client: reqwest::Client,
    sessions: SessionStore<i64>,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            allowed_users: config.allowed_users.clone(),
            api_base: TELEGRAM_API_BASE.to_string(),
            client: reqwest::Client::new(),
            sessions: SessionStore::new(),
        }
    }

    /// Point the channel at another Bot API server.
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token.expose_secret())
    }

    /// Check the sender against the allowlist, by username or numeric id.
    pub fn is_allowed(&self, incoming: &IncomingText) -> bool {
        let user_id = incoming.user_id.map(|id| id.to_string());
        let identities = [incoming.username.as_deref(), user_id.as_deref()];
        self.allowed_users
            .iter()
            .any(|u| u == "*" || identities.iter().flatten().any(|id| id == u))
    }

    /// Verify the bot token with getMe.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: NAME.into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: NAME.into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    /// Poll for updates and answer them until the task is dropped. Fails
    /// only if the bot token is rejected at startup.
    pub async fn run(&self, assistant: &ChatAssistant) -> Result<(), ChannelError> {
        self.health_check().await?;
        tracing::info!("Telegram channel listening for messages...");

        let mut offset: i64 = 0;
        loop {
            let updates = match self.poll(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);

                let Some(incoming) = IncomingText::from_update(&update) else {
                    continue;
                };
                if !self.is_allowed(&incoming) {
                    tracing::warn!(
                        "Telegram: ignoring message from unauthorized user: username={}, user_id={}",
                        incoming.username.as_deref().unwrap_or("unknown"),
                        incoming.user_id.map(|id| id.to_string()).unwrap_or_default()
                    );
                    continue;
                }

                for reply in self.handle(assistant, &incoming).await {
                    if reply.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = self.send_message(incoming.chat_id, &reply).await {
                        tracing::warn!(chat_id = incoming.chat_id, "Telegram reply failed: {e}");
                    }
                }
            }
        }
    }

    async fn poll(&self, offset: i64) -> Result<Vec<Update>, ChannelError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"]
        });
        let resp = self
            .client
            .post(self.api_url("getUpdates"))
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .json(&body)
            .send()
            .await
            .map_err(|e| receive_failed(e.to_string()))?;

        let data: ApiResponse<Vec<Update>> =
            resp.json().await.map_err(|e| receive_failed(e.to_string()))?;
        if !data.ok {
            return Err(receive_failed(data.description.unwrap_or_default()));
        }
        Ok(data.result.unwrap_or_default())
    }

    /// Answer one message. Returns the texts to send back, in order.
    pub async fn handle(&self, assistant: &ChatAssistant, incoming: &IncomingText) -> Vec<String> {
        match Command::parse(&incoming.text) {
            Some(Command::Reset) => {
                self.sessions.insert(incoming.chat_id, Session::new()).await;
                tracing::info!(chat_id = incoming.chat_id, "Telegram session started");
                vec![WELCOME_MESSAGE.to_string()]
            }
            Some(Command::Quit) => {
                self.sessions.remove(&incoming.chat_id).await;
                vec!["Sampai jumpa! Kirim /start untuk mulai lagi.".to_string()]
            }
            Some(Command::Profile) => {
                let session = self.sessions.get_or_create(incoming.chat_id).await;
                let section = session.lock().await.profile.to_prompt_section();
                vec![section]
            }
            Some(Command::History) => {
                let session = self.sessions.get_or_create(incoming.chat_id).await;
                let history = render_history(&*session.lock().await);
                vec![history]
            }
            Some(Command::Unknown(cmd)) => {
                vec![format!("Unknown command {cmd}. Try /profile, /history, /reset or /quit.")]
            }
            None => {
                let session = self.sessions.get_or_create(incoming.chat_id).await;
                let mut session = session.lock().await;
                let outcome = assistant.process_turn(&mut session, &incoming.text).await;
                let mut replies = vec![outcome.reply.clone()];
                replies.extend(outcome.rendered_recommendation());
                replies
            }
        }
    }

    /// Send a text message, trying Markdown first with plain text fallback.
    /// Splits long messages that exceed Telegram's 4096 char limit.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        for chunk in split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH) {
            self.send_message_chunk(chat_id, &chunk).await?;
        }
        Ok(())
    }

    async fn send_message_chunk(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let markdown_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown"
        });
        let markdown_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&markdown_body)
            .send()
            .await
            .map_err(|e| send_failed(e.to_string()))?;

        if markdown_resp.status().is_success() {
            return Ok(());
        }

        let markdown_status = markdown_resp.status();
        tracing::debug!(
            status = ?markdown_status,
            "Telegram sendMessage with Markdown failed; retrying without parse_mode"
        );

        let plain_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        let plain_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&plain_body)
            .send()
            .await
            .map_err(|e| send_failed(e.to_string()))?;

        if !plain_resp.status().is_success() {
            let plain_err = plain_resp.text().await.unwrap_or_default();
            return Err(send_failed(format!(
                "sendMessage failed (markdown: {markdown_status}, plain: {plain_err})"
            )));
        }
        Ok(())
    }
}

fn send_failed(reason: String) -> ChannelError {
    ChannelError::SendFailed {
        name: NAME.into(),
        reason,
    }
}

fn receive_failed(reason: String) -> ChannelError {
    ChannelError::ReceiveFailed {
        name: NAME.into(),
        reason,
    }
}

/// Split a message into chunks of at most `max_len` bytes. Tries to split
/// on newlines, then spaces, then hard-cuts on a character boundary.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.len() > max_len {
        let mut end = max_len;
        while !remaining.is_char_boundary(end) {
            end -= 1;
        }
        let window = &remaining[..end];
        let split_at = match window.rfind('\n').or_else(|| window.rfind(' ')) {
            Some(0) | None => end,
            Some(i) => i,
        };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }
    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining.to_string());
    }

    chunks
}
