use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::Role;
use super::dto::{AuthResponse, Principal};
use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};
use crate::error::CoreError;
use crate::nutritionists::repo_types::NewNutritionist;
use crate::store::SharedStore;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Why an authentication attempt was refused.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Password too short")]
    WeakPassword,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    BadCredentials,
    #[error(transparent)]
    Store(CoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<CoreError> for AuthError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Duplicate(_) => AuthError::EmailTaken,
            other => AuthError::Store(other),
        }
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validates the new account's e-mail and password and returns the hash to store.
pub(crate) fn checked_credentials(email: &str, password: &str) -> Result<String, AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::InvalidEmail);
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(hash_password(password)?)
}

fn issue(keys: &JwtKeys, id: uuid::Uuid, email: String, role: Role) -> Result<AuthResponse, AuthError> {
    let access_token = keys.sign(id, role)?;
    Ok(AuthResponse {
        access_token,
        principal: Principal { id, email, role },
    })
}

pub async fn register_nutritionist(
    store: &SharedStore,
    keys: &JwtKeys,
    name: &str,
    email: &str,
    password: &str,
) -> Result<AuthResponse, AuthError> {
    let email = normalize_email(email);
    let password_hash = checked_credentials(&email, password)?;
    if store.find_nutritionist_by_email(&email).await?.is_some() {
        return Err(AuthError::EmailTaken);
    }
    let n = store
        .create_nutritionist(NewNutritionist {
            name: name.trim().to_string(),
            email,
            password_hash,
        })
        .await?;
    info!(nutritionist_id = %n.id, email = %n.email, "nutritionist registered");
    issue(keys, n.id, n.email, Role::Nutritionist)
}

pub async fn login_nutritionist(
    store: &SharedStore,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<AuthResponse, AuthError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidEmail);
    }
    let Some(n) = store.find_nutritionist_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AuthError::BadCredentials);
    };
    if !verify_password(password, &n.password_hash)? {
        warn!(nutritionist_id = %n.id, "login invalid password");
        return Err(AuthError::BadCredentials);
    }
    info!(nutritionist_id = %n.id, "nutritionist logged in");
    issue(keys, n.id, n.email, Role::Nutritionist)
}

pub async fn login_client(
    store: &SharedStore,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<AuthResponse, AuthError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AuthError::InvalidEmail);
    }
    let Some(creds) = store.find_client_credentials(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AuthError::BadCredentials);
    };
    if !verify_password(password, &creds.password_hash)? {
        warn!(client_id = %creds.id, "login invalid password");
        return Err(AuthError::BadCredentials);
    }
    info!(client_id = %creds.id, "client logged in");
    issue(keys, creds.id, email, Role::Client)
}
