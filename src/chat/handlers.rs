use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use tracing::{error, instrument, warn};

use crate::auth::AuthClient;
use crate::chat::dto::{ChatRequest, ChatResponse};
use crate::chat::repo_types::ConversationTurn;
use crate::error::reject;
use crate::state::AppState;

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/history", get(history))
}

#[instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    AuthClient(client_id): AuthClient,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    if payload.text.trim().is_empty() {
        warn!(%client_id, "empty chat message");
        return Err((StatusCode::BAD_REQUEST, "mensagem vazia".into()));
    }
    let reply = state.engine.respond(client_id, &payload.text).await;
    Ok(Json(ChatResponse { reply }))
}

#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthClient(client_id): AuthClient,
) -> Result<Json<Vec<ConversationTurn>>, (StatusCode, String)> {
    let turns = state.store.conversation_history(client_id).await.map_err(|e| {
        error!(error = %e, %client_id, "load history failed");
        reject(e)
    })?;
    Ok(Json(turns))
}
