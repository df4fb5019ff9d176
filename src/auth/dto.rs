use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Request body for nutritionist registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login, shared by both account types.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub principal: Principal,
}

/// Public part of the authenticated account.
#[derive(Debug, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}
