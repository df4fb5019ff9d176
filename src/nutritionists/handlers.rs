use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{error, instrument};

use crate::auth::AuthNutritionist;
use crate::error::{reject, CoreError};
use crate::nutritionists::dto::UpdateProfileRequest;
use crate::nutritionists::repo_types::{BotConfig, Nutritionist};
use crate::nutritionists::services;
use crate::state::AppState;

pub fn nutritionist_routes() -> Router<AppState> {
    Router::new()
        .route("/nutritionists/me", get(get_profile).put(update_profile))
        .route(
            "/nutritionists/me/bot-config",
            get(get_bot_config).put(update_bot_config),
        )
}

fn logged(e: CoreError) -> (StatusCode, String) {
    if matches!(e, CoreError::Persistence(_)) {
        error!(error = %e, "nutritionist store failure");
    }
    reject(e)
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthNutritionist(id): AuthNutritionist,
) -> Result<Json<Nutritionist>, (StatusCode, String)> {
    services::profile(&state.store, id)
        .await
        .map(Json)
        .map_err(logged)
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthNutritionist(id): AuthNutritionist,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Nutritionist>, (StatusCode, String)> {
    services::update_profile(&state.store, id, payload)
        .await
        .map(Json)
        .map_err(crate::auth::handlers::reject)
}

#[instrument(skip(state))]
pub async fn get_bot_config(
    State(state): State<AppState>,
    AuthNutritionist(id): AuthNutritionist,
) -> Result<Json<BotConfig>, (StatusCode, String)> {
    services::bot_config(&state.store, id)
        .await
        .map(Json)
        .map_err(logged)
}

#[instrument(skip(state, payload))]
pub async fn update_bot_config(
    State(state): State<AppState>,
    AuthNutritionist(id): AuthNutritionist,
    Json(payload): Json<BotConfig>,
) -> Result<Json<BotConfig>, (StatusCode, String)> {
    services::save_bot_config(&state.store, id, payload)
        .await
        .map(Json)
        .map_err(logged)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::jwt::JwtKeys;
    use crate::auth::Role;
    use crate::nutritionists::repo_types::NewNutritionist;

    fn put_json(uri: &str, token: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn profile_and_bot_config_over_http() {
        let state = AppState::fake();
        let keys = JwtKeys::new(&state.config.jwt);
        let mut ids = Vec::new();
        for (name, email) in [("Ana", "ana@x.com"), ("Bia", "bia@x.com")] {
            let n = state
                .store
                .create_nutritionist(NewNutritionist {
                    name: name.into(),
                    email: email.into(),
                    password_hash: "h".into(),
                })
                .await
                .unwrap();
            ids.push(n.id);
        }
        let token = keys.sign(ids[0], Role::Nutritionist).unwrap();
        let app = nutritionist_routes().with_state(state);

        let res = app
            .clone()
            .oneshot(get_with("/nutritionists/me", &token))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["email"], "ana@x.com");
        assert!(body.get("password_hash").is_none());

        let res = app
            .clone()
            .oneshot(put_json(
                "/nutritionists/me",
                &token,
                r#"{"name":"Ana","email":"bia@x.com"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = app
            .clone()
            .oneshot(put_json(
                "/nutritionists/me/bot-config",
                &token,
                r##"{"persona":"Nutri animada","restrictions":null,"color":"#2e7d32"}"##,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .clone()
            .oneshot(get_with("/nutritionists/me/bot-config", &token))
            .await
            .unwrap();
        let body = json_body(res).await;
        assert_eq!(body["persona"], "Nutri animada");
        assert_eq!(body["color"], "#2e7d32");

        let res = app
            .clone()
            .oneshot(put_json(
                "/nutritionists/me/bot-config",
                &token,
                r#"{"color":"verde"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let client_token = keys.sign(ids[1], Role::Client).unwrap();
        let res = app
            .oneshot(get_with("/nutritionists/me", &client_token))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
