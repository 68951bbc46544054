use std::sync::Arc;

use anyhow::Context;

use vitta::api::{ApiState, serve_api};
use vitta::channels::{CliChannel, TelegramChannel};
use vitta::chat::ChatAssistant;
use vitta::config::AppConfig;
use vitta::llm::create_provider;
use vitta::profile::{KeywordExtractor, ProfileExtractor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // ── Catalog ──────────────────────────────────────────────────────────
    let catalog = Arc::new(config.load_catalog().context("failed to load product catalog")?);

    eprintln!("💬 Vitta v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   LLM: {} (model: {})", config.llm.backend, config.llm.model);
    eprintln!(
        "   Catalog: {} products{}",
        catalog.len(),
        config
            .catalog_path
            .as_ref()
            .map(|p| format!(" from {}", p.display()))
            .unwrap_or_default()
    );

    let llm = create_provider(&config.llm)?;
    let extractor: Arc<dyn ProfileExtractor> = Arc::new(KeywordExtractor::default_rules());

    let assistant = Arc::new(
        ChatAssistant::new(llm, Arc::clone(&extractor), catalog, config.system_prompt.clone())
            .with_history_window(config.history_window)
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens),
    );

    // ── HTTP API ─────────────────────────────────────────────────────────
    if let Some(port) = config.http_port {
        let state = ApiState::new(Arc::clone(&assistant), Arc::clone(&extractor));
        eprintln!("   API: http://0.0.0.0:{port}/api/chat");
        tokio::spawn(async move {
            if let Err(e) = serve_api(port, state).await {
                tracing::error!("HTTP API stopped: {}", e);
            }
        });
    }

    // ── Telegram ─────────────────────────────────────────────────────────
    if let Some(telegram) = &config.telegram {
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            if telegram.allows_everyone() {
                "everyone".to_string()
            } else {
                telegram.allowed_users.join(", ")
            }
        );
        let channel = TelegramChannel::new(telegram);
        let assistant = Arc::clone(&assistant);
        tokio::spawn(async move {
            if let Err(e) = channel.run(&assistant).await {
                tracing::error!("Telegram channel stopped: {}", e);
            }
        });
    }

    eprintln!("   Type a message and press Enter. /profile, /history, /reset, /quit.\n");

    // ── Chat ─────────────────────────────────────────────────────────────
    CliChannel::new().run(&assistant).await?;

    Ok(())
}
