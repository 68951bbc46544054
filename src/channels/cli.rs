//! CLI channel: stdin/stdout REPL for chatting locally.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::chat::{ChatAssistant, Session};
use crate::error::ChannelError;

/// A slash command typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Profile,
    History,
    Reset,
    Unknown(String),
}

impl Command {
    /// Parse a line as a command. Returns `None` for ordinary chat text.
    /// A trailing `@botname` (as Telegram group chats send it) is ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let name = line.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        Some(match name.to_lowercase().as_str() {
            "quit" | "exit" => Self::Quit,
            "profile" => Self::Profile,
            "history" => Self::History,
            "reset" | "start" => Self::Reset,
            _ => Self::Unknown(line.to_string()),
        })
    }
}

/// A simple CLI channel. Assistant output goes to the writer (stdout), the
/// prompt and status lines to stderr.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }

    /// Run the REPL on stdin/stdout until `/quit` or EOF.
    pub async fn run(&self, assistant: &ChatAssistant) -> Result<(), ChannelError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        self.run_with(assistant, stdin, &mut stdout).await
    }

    /// Run the REPL over arbitrary reader/writer pairs.
    pub async fn run_with<R, W>(
        &self,
        assistant: &ChatAssistant,
        reader: R,
        writer: &mut W,
    ) -> Result<(), ChannelError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut session = Session::new();
        let mut lines = reader.lines();
        tracing::info!(session = %session.id, "CLI session started");

        eprint!("> ");
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                eprint!("> ");
                continue;
            }

            let output = match Command::parse(line) {
                Some(Command::Quit) => break,
                Some(Command::Profile) => session.profile.to_prompt_section(),
                Some(Command::History) => render_history(&session),
                Some(Command::Reset) => {
                    session = Session::new();
                    tracing::info!(session = %session.id, "CLI session reset");
                    "Starting over. Tell me about yourself!".to_string()
                }
                Some(Command::Unknown(cmd)) => {
                    format!("Unknown command {cmd}. Try /profile, /history, /reset or /quit.")
                }
                None => {
                    let outcome = assistant.process_turn(&mut session, line).await;
                    match outcome.rendered_recommendation() {
                        Some(rec) => format!("{}\n\n{}", outcome.reply, rec),
                        None => outcome.reply,
                    }
                }
            };

            write_block(writer, &output).await?;
            eprint!("> ");
        }

        tracing::info!(session = %session.id, turns = session.history().len(), "CLI session ended");
        Ok(())
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

async fn write_block<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<(), ChannelError> {
    writer
        .write_all(format!("\n{text}\n\n").as_bytes())
        .await
        .map_err(|e| ChannelError::SendFailed {
            name: "cli".to_string(),
            reason: e.to_string(),
        })?;
    writer.flush().await?;
    Ok(())
}

pub(crate) fn render_history(session: &Session) -> String {
    if session.history().is_empty() {
        return "(no messages yet)".to_string();
    }
    session
        .history()
        .iter()
        .map(|t| format!("[{}] {}: {}", t.at.format("%H:%M:%S"), t.role, t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::llm::{CompletionRequest, CompletionResponse, LlmProvider};
    use crate::profile::KeywordExtractor;
    use crate::recommend::ProductCatalog;

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(CompletionResponse {
                content: format!("echo: {last}"),
                input_tokens: 0,
                output_tokens: 0,
            })
        }
    }

    fn assistant() -> ChatAssistant {
        ChatAssistant::new(
            Arc::new(EchoLlm),
            Arc::new(KeywordExtractor::default_rules()),
            Arc::new(ProductCatalog::builtin().unwrap()),
            "You are Vitta.",
        )
    }

    async fn run_script(script: &str) -> String {
        let mut out = Vec::new();
        CliChannel::new()
            .run_with(&assistant(), script.as_bytes(), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/quit"), Some(Command::Quit));
        assert_eq!(Command::parse(" /Profile "), Some(Command::Profile));
        assert_eq!(Command::parse("/exit"), Some(Command::Quit));
        assert_eq!(
            Command::parse("/dance"),
            Some(Command::Unknown("/dance".into()))
        );
        assert_eq!(Command::parse("/start"), Some(Command::Reset));
        assert_eq!(Command::parse("/reset@VittaBot"), Some(Command::Reset));
        assert_eq!(Command::parse("halo"), None);
    }

    #[tokio::test]
    async fn chat_lines_get_replies() {
        let out = run_script("halo\n\n/quit\nignored after quit\n").await;
        assert!(out.contains("echo: halo"));
        assert!(!out.contains("ignored after quit"));
    }

    #[tokio::test]
    async fn profile_command_shows_extracted_fields() {
        let out = run_script("saya kurir\n/profile\n").await;
        assert!(out.contains("**Occupation:** kurir"));
        assert!(out.contains("Still unknown"));
    }

    #[tokio::test]
    async fn reset_clears_the_session() {
        let out = run_script("saya kurir\n/reset\n/history\n").await;
        assert!(out.contains("Starting over"));
        assert!(out.contains("(no messages yet)"));
    }

    #[tokio::test]
    async fn complete_profile_prints_recommendations() {
        let out = run_script(
            "saya driver ojek, gaji pas-pasan, belum punya anak, takut kecelakaan, konvensional saja\n",
        )
        .await;
        assert!(out.contains("Asuransi Kecelakaan Diri"));
        assert!(out.contains("Why it fits:"));
    }
}
