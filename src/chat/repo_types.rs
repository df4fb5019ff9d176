use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }

    pub fn parse(raw: &str) -> CoreResult<Self> {
        match raw {
            "user" => Ok(Role::User),
            "bot" => Ok(Role::Bot),
            other => Err(CoreError::InvalidInput(format!("unknown role {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub client_id: Uuid,
    pub role: Role,
    pub text: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct ConversationTurnRow {
    pub id: i64,
    pub client_id: Uuid,
    pub role: String,
    pub text: String,
    pub created_at: OffsetDateTime,
}

impl TryFrom<ConversationTurnRow> for ConversationTurn {
    type Error = CoreError;

    fn try_from(r: ConversationTurnRow) -> CoreResult<Self> {
        Ok(Self {
            id: r.id,
            client_id: r.client_id,
            role: Role::parse(&r.role)?,
            text: r.text,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConsumptionRecord {
    pub id: i64,
    pub client_id: Uuid,
    pub logged_at: OffsetDateTime,
    pub meal_slot: String,
    pub item_name: String,
    pub grams: f64,
    pub kcal: f64,
}

#[derive(Debug, Clone)]
pub struct NewConsumption {
    pub client_id: Uuid,
    pub meal_slot: String,
    pub item_name: String,
    pub grams: f64,
    pub kcal: f64,
}

impl NewConsumption {
    /// Same bounds as the `consumption_records` CHECK constraints.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.grams.is_finite() && self.grams > 0.0) {
            return Err(CoreError::InvalidInput(format!(
                "grams must be positive, got {}",
                self.grams
            )));
        }
        if !(self.kcal.is_finite() && self.kcal >= 0.0) {
            return Err(CoreError::InvalidInput(format!(
                "kcal must be non-negative, got {}",
                self.kcal
            )));
        }
        Ok(())
    }
}
