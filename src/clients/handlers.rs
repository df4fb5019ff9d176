use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::auth::services::{checked_credentials, normalize_email};
use crate::auth::{AuthClient, AuthNutritionist};
use crate::chat::repo_types::ConversationTurn;
use crate::clients::dto::{CreateClientRequest, ProfileView};
use crate::clients::repo_types::ProfileUpdate;
use crate::clients::services;
use crate::error::{reject, CoreError};
use crate::state::AppState;

pub fn nutritionist_routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/:id",
            get(get_client).patch(update_client).delete(delete_client),
        )
        .route("/clients/:id/history", get(client_history))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn logged(e: CoreError) -> (StatusCode, String) {
    if matches!(e, CoreError::Persistence(_)) {
        error!(error = %e, "client store failure");
    }
    reject(e)
}

#[instrument(skip(state, payload))]
pub async fn create_client(
    State(state): State<AppState>,
    AuthNutritionist(nutritionist_id): AuthNutritionist,
    Json(payload): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ProfileView>), (StatusCode, String)> {
    let email = normalize_email(&payload.email);
    let hash = checked_credentials(&email, &payload.password)
        .map_err(crate::auth::handlers::reject)?;
    let client = services::create_client(&state.store, nutritionist_id, payload, email, hash)
        .await
        .map_err(logged)?;
    Ok((StatusCode::CREATED, Json(client.into())))
}

#[instrument(skip(state))]
pub async fn list_clients(
    State(state): State<AppState>,
    AuthNutritionist(nutritionist_id): AuthNutritionist,
) -> Result<Json<Vec<ProfileView>>, (StatusCode, String)> {
    let clients = state
        .store
        .list_clients(nutritionist_id)
        .await
        .map_err(logged)?;
    Ok(Json(clients.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn get_client(
    State(state): State<AppState>,
    AuthNutritionist(nutritionist_id): AuthNutritionist,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileView>, (StatusCode, String)> {
    let client = services::owned_client(&state.store, nutritionist_id, id)
        .await
        .map_err(logged)?;
    Ok(Json(client.into()))
}

#[instrument(skip(state, update))]
pub async fn update_client(
    State(state): State<AppState>,
    AuthNutritionist(nutritionist_id): AuthNutritionist,
    Path(id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>, (StatusCode, String)> {
    let client = services::update_owned_client(&state.store, nutritionist_id, id, &update)
        .await
        .map_err(logged)?;
    Ok(Json(client.into()))
}

#[instrument(skip(state))]
pub async fn delete_client(
    State(state): State<AppState>,
    AuthNutritionist(nutritionist_id): AuthNutritionist,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::delete_owned_client(&state.store, nutritionist_id, id)
        .await
        .map_err(logged)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn client_history(
    State(state): State<AppState>,
    AuthNutritionist(nutritionist_id): AuthNutritionist,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ConversationTurn>>, (StatusCode, String)> {
    services::owned_client(&state.store, nutritionist_id, id)
        .await
        .map_err(logged)?;
    let turns = state
        .store
        .conversation_history(id)
        .await
        .map_err(logged)?;
    Ok(Json(turns))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthClient(client_id): AuthClient,
) -> Result<Json<ProfileView>, (StatusCode, String)> {
    let client = state
        .store
        .get_client(client_id)
        .await
        .map_err(logged)?
        .ok_or((StatusCode::UNAUTHORIZED, "Client not found".to_string()))?;
    Ok(Json(client.into()))
}
