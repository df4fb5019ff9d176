use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use tracing::warn;
use uuid::Uuid;

use super::claims::{Claims, Role};
use super::jwt::JwtKeys;

/// Authenticated client; the inner value is the client id.
pub struct AuthClient(pub Uuid);

/// Authenticated nutritionist; the inner value is the nutritionist id.
pub struct AuthNutritionist(pub Uuid);

async fn bearer_claims<S>(parts: &Parts, state: &S) -> Result<Claims, (StatusCode, String)>
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    let keys = JwtKeys::from_ref(state);
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".to_string(),
        ))?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        ))?;

    keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        (
            StatusCode::UNAUTHORIZED,
            "Invalid or expired token".to_string(),
        )
    })
}

fn require(claims: &Claims, role: Role) -> Result<Uuid, (StatusCode, String)> {
    if claims.role != role {
        warn!(sub = %claims.sub, have = ?claims.role, want = ?role, "role mismatch");
        return Err((StatusCode::FORBIDDEN, "Forbidden for this account type".into()));
    }
    Ok(claims.sub)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthClient
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state).await?;
        require(&claims, Role::Client).map(AuthClient)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthNutritionist
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state).await?;
        require(&claims, Role::Nutritionist).map(AuthNutritionist)
    }
}
