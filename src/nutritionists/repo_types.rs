use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Nutritionist account; owns clients.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Nutritionist {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewNutritionist {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Replaces name and e-mail; the password hash only when given.
#[derive(Debug, Clone)]
pub struct NutritionistUpdate {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

/// How the nutritionist's chatbot presents itself to their clients.
/// Saving replaces all three fields; `None` clears one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    pub persona: Option<String>,
    pub restrictions: Option<String>,
    pub color: Option<String>,
}

impl BotConfig {
    pub fn validate(&self) -> CoreResult<()> {
        lazy_static! {
            static ref COLOR_RE: Regex = Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
        }
        match &self.color {
            Some(c) if !COLOR_RE.is_match(c) => Err(CoreError::InvalidInput(format!(
                "color must be a hex value like #2e7d32, got '{c}'"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_must_be_hex() {
        let mut cfg = BotConfig {
            color: Some("#2E7D32".into()),
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
        cfg.color = Some("#abc".into());
        assert!(cfg.validate().is_ok());
        cfg.color = Some("verde".into());
        assert!(matches!(cfg.validate(), Err(CoreError::InvalidInput(_))));
        cfg.color = None;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let n = Nutritionist {
            id: Uuid::nil(),
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password_hash: "segredo".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&n).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ana@x.com");
    }
}
