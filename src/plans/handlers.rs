use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::auth::AuthNutritionist;
use crate::clients::services::owned_client;
use crate::error::reject;
use crate::plans::dto::{CreatePlanItemRequest, PlanResponse};
use crate::plans::repo_types::PlanItem;
use crate::plans::services::{add_plan_item, plan_by_slot};
use crate::state::AppState;

pub fn plan_routes() -> Router<AppState> {
    Router::new().route("/clients/:id/plan", get(get_plan).post(create_plan_item))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthNutritionist(nutritionist_id): AuthNutritionist,
    Path(client_id): Path<Uuid>,
) -> Result<Json<PlanResponse>, (StatusCode, String)> {
    owned_client(&state.store, nutritionist_id, client_id)
        .await
        .map_err(reject)?;
    let meals = plan_by_slot(&state.store, client_id).await.map_err(|e| {
        error!(error = %e, %client_id, "list plan failed");
        reject(e)
    })?;
    Ok(Json(PlanResponse { meals }))
}

#[instrument(skip(state, payload))]
pub async fn create_plan_item(
    State(state): State<AppState>,
    AuthNutritionist(nutritionist_id): AuthNutritionist,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<CreatePlanItemRequest>,
) -> Result<(StatusCode, Json<PlanItem>), (StatusCode, String)> {
    payload
        .validate()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    owned_client(&state.store, nutritionist_id, client_id)
        .await
        .map_err(reject)?;
    let item = add_plan_item(
        &state.store,
        state.nlu.embedder.as_ref(),
        client_id,
        &payload.meal_slot,
        &payload.name,
        payload.per_100g,
    )
    .await
    .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(item)))
}
