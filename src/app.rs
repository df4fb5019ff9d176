use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, chat, clients, nutritionists, plans};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(clients::router())
                .merge(nutritionists::router())
                .merge(plans::router())
                .merge(chat::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::jwt::JwtKeys;
    use crate::auth::Role;
    use crate::clients::repo_types::NewClient;
    use crate::nutrition::ActivityLevel;

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {t}"));
        }
        req.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let res = build_app(AppState::fake())
            .oneshot(get("/api/v1/health", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_requires_a_client_token() {
        let state = AppState::fake();
        let keys = JwtKeys::new(&state.config.jwt);
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(get("/api/v1/chat/history", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let token = keys.sign(uuid::Uuid::new_v4(), Role::Nutritionist).unwrap();
        let res = app
            .oneshot(get("/api/v1/chat/history", Some(&token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn client_chats_and_reads_history() {
        let state = AppState::fake();
        let keys = JwtKeys::new(&state.config.jwt);
        let client = state
            .store
            .create_client(NewClient {
                nutritionist_id: uuid::Uuid::new_v4(),
                name: "Bia".into(),
                email: "bia@exemplo.com".into(),
                password_hash: "x".into(),
                age: Some(30),
                sex: Some("F".into()),
                weight_kg: Some(60.0),
                height_cm: Some(165.0),
                activity: ActivityLevel::Moderate,
                goal: None,
            })
            .await
            .unwrap();
        let token = keys.sign(client.id, Role::Client).unwrap();
        let app = build_app(state);

        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/chat")
            .header("authorization", format!("Bearer {token}"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text":"quanto de água devo beber?"}"#))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["reply"].as_str().unwrap().contains("2100"));

        let res = app
            .oneshot(get("/api/v1/chat/history", Some(&token)))
            .await
            .unwrap();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let turns: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(turns.as_array().unwrap().len(), 2);
    }
}
