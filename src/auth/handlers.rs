use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, instrument, warn};

use super::dto::{AuthResponse, LoginRequest, RegisterRequest};
use super::jwt::JwtKeys;
use super::services::{self, AuthError};
use crate::error::CoreError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/nutritionists/register", post(register_nutritionist))
        .route("/auth/nutritionists/login", post(login_nutritionist))
        .route("/auth/clients/login", post(login_client))
}

pub(crate) fn reject(e: AuthError) -> (StatusCode, String) {
    let status = match &e {
        AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
        AuthError::EmailTaken => StatusCode::CONFLICT,
        AuthError::BadCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Store(inner) => {
            if matches!(inner, CoreError::Persistence(_)) {
                error!(error = %inner, "auth store failure");
            }
            return crate::error::reject(inner.clone());
        }
        AuthError::Internal(inner) => {
            error!(error = %inner, "auth failure");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into());
        }
    };
    warn!(error = %e, "auth rejected");
    (status, e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn register_nutritionist(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let auth = services::register_nutritionist(
        &state.store,
        &keys,
        &payload.name,
        &payload.email,
        &payload.password,
    )
    .await
    .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(auth)))
}

#[instrument(skip(state, payload))]
pub async fn login_nutritionist(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    services::login_nutritionist(&state.store, &keys, &payload.email, &payload.password)
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(state, payload))]
pub async fn login_client(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    services::login_client(&state.store, &keys, &payload.email, &payload.password)
        .await
        .map(Json)
        .map_err(reject)
}
