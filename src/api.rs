//! REST endpoints over the catalog, the engine, the extractor and the chat.
//!
//! `/api/recommend` and `/api/profile/extract` are stateless: the caller
//! sends the profile it holds and gets the result back. `/api/chat` keeps
//! conversations in memory, keyed by `chat_id`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::chat::{ChatAssistant, Session, SessionStore};
use crate::error::ChannelError;
use crate::profile::{FieldUpdate, ProfileExtractor, UserProfile};
use crate::recommend::{ProductCatalog, RecommendationResult, recommend, render_result};

/// Shared state for the API routes.
#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<ProductCatalog>,
    pub extractor: Arc<dyn ProfileExtractor>,
    pub assistant: Arc<ChatAssistant>,
    pub sessions: Arc<SessionStore<Uuid>>,
}

impl ApiState {
    /// State sharing the assistant's catalog, with no conversations yet.
    pub fn new(assistant: Arc<ChatAssistant>, extractor: Arc<dyn ProfileExtractor>) -> Self {
        Self {
            catalog: assistant.catalog(),
            extractor,
            assistant,
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

/// Response of `POST /api/recommend`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    /// Whether the profile passes the completeness gate.
    pub complete: bool,
    pub missing_fields: Vec<String>,
    pub result: RecommendationResult,
    /// Chat-ready rendering of `result`.
    pub rendered: String,
}

/// Request body of `POST /api/profile/extract`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub profile: UserProfile,
    pub message: String,
}

/// Response of `POST /api/profile/extract`.
#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub profile: UserProfile,
    pub updates: Vec<FieldUpdate>,
    pub complete: bool,
}

/// Request body of `POST /api/chat`. Omit `chat_id` to start a conversation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub chat_id: Option<Uuid>,
    pub message: String,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub chat_id: Uuid,
    pub reply: String,
    pub llm_failed: bool,
    /// Rendered recommendations, when this turn produced them.
    pub recommendation: Option<String>,
    pub profile: UserProfile,
    pub complete: bool,
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// GET /api/catalog
async fn get_catalog(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.catalog.products().to_vec())
}

/// POST /api/recommend
///
/// Runs the engine on the given profile. The engine runs even for an
/// incomplete profile; `complete` tells the caller whether the chat flow
/// would have shown the result.
async fn post_recommend(
    State(state): State<ApiState>,
    Json(profile): Json<UserProfile>,
) -> impl IntoResponse {
    let result = recommend(&profile, &state.catalog);
    tracing::debug!(
        matches = result.recommendations.len(),
        complete = profile.is_complete(),
        "Recommendation requested"
    );
    Json(RecommendResponse {
        complete: profile.is_complete(),
        missing_fields: profile
            .missing_fields()
            .iter()
            .map(|f| f.to_string())
            .collect(),
        rendered: render_result(&result),
        result,
    })
}

/// POST /api/profile/extract
async fn post_extract(
    State(state): State<ApiState>,
    Json(request): Json<ExtractRequest>,
) -> impl IntoResponse {
    let mut profile = request.profile;
    let updates = state.extractor.update(&mut profile, &request.message);
    Json(ExtractResponse {
        complete: profile.is_complete(),
        profile,
        updates,
    })
}

/// POST /api/chat
///
/// Runs one turn of a conversation. Returns 400 for a blank message and 404
/// for a `chat_id` this process does not know.
async fn post_chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    if request.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message must not be empty");
    }

    let session = match request.chat_id {
        Some(id) => match state.sessions.get(&id).await {
            Some(session) => session,
            None => return error_response(StatusCode::NOT_FOUND, "unknown chat_id"),
        },
        None => {
            let session = Session::new();
            tracing::info!(session = %session.id, "API chat started");
            state.sessions.insert(session.id, session).await
        }
    };

    let mut session = session.lock().await;
    let outcome = state.assistant.process_turn(&mut session, &request.message).await;
    Json(ChatResponse {
        chat_id: session.id,
        recommendation: outcome.rendered_recommendation(),
        reply: outcome.reply,
        llm_failed: outcome.llm_failed,
        complete: session.profile.is_complete(),
        profile: session.profile.clone(),
    })
    .into_response()
}

/// Build the API routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/catalog", get(get_catalog))
        .route("/api/recommend", post(post_recommend))
        .route("/api/profile/extract", post(post_extract))
        .route("/api/chat", post(post_chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `0.0.0.0:port` and serve the API until the server stops.
pub async fn serve_api(port: u16, state: ApiState) -> crate::error::Result<()> {
    let startup_failed = |reason: String| ChannelError::StartupFailed {
        name: "http".into(),
        reason,
    };
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| startup_failed(format!("cannot bind port {port}: {e}")))?;
    tracing::info!(port, "HTTP API started");
    axum::serve(listener, api_routes(state))
        .await
        .map_err(ChannelError::from)?;
    Ok(())
}
