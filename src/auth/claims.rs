use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a token was issued to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "Client")]
    Client,
    #[serde(alias = "Nutritionist")]
    Nutritionist,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // client or nutritionist ID
    pub role: Role,  // principal kind
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}
