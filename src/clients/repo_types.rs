use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::nutrition::ActivityLevel;

#[derive(Debug, Clone, Serialize)]
pub struct ClientProfile {
    pub id: Uuid,
    pub nutritionist_id: Uuid,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity: ActivityLevel,
    pub initial_weight_kg: Option<f64>,
    pub goal: Option<String>,
    pub water_goal_ml: Option<i32>,
    pub created_at: OffsetDateTime,
}

/// `clients` row as stored; activity is free text until parsed.
#[derive(Debug, FromRow)]
pub struct ClientRow {
    pub id: Uuid,
    pub nutritionist_id: Uuid,
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity: String,
    pub initial_weight_kg: Option<f64>,
    pub goal: Option<String>,
    pub water_goal_ml: Option<i32>,
    pub created_at: OffsetDateTime,
}

impl From<ClientRow> for ClientProfile {
    fn from(r: ClientRow) -> Self {
        Self {
            id: r.id,
            nutritionist_id: r.nutritionist_id,
            name: r.name,
            email: r.email,
            age: r.age,
            sex: r.sex,
            weight_kg: r.weight_kg,
            height_cm: r.height_cm,
            activity: ActivityLevel::parse(&r.activity),
            initial_weight_kg: r.initial_weight_kg,
            goal: r.goal,
            water_goal_ml: r.water_goal_ml,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientCredentials {
    pub id: Uuid,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub nutritionist_id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity: ActivityLevel,
    pub goal: Option<String>,
}

impl NewClient {
    pub fn validate(&self) -> CoreResult<()> {
        check_positive("age", self.age.map(f64::from))?;
        check_positive("weight_kg", self.weight_kg)?;
        check_positive("height_cm", self.height_cm)
    }
}

/// The whitelist of profile fields that may change after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity: Option<String>,
    pub goal: Option<String>,
    pub water_goal_ml: Option<i32>,
}

impl ProfileUpdate {
    pub fn weight(weight_kg: f64) -> Self {
        Self {
            weight_kg: Some(weight_kg),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.sex.is_none()
            && self.weight_kg.is_none()
            && self.height_cm.is_none()
            && self.activity.is_none()
            && self.goal.is_none()
            && self.water_goal_ml.is_none()
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.is_empty() {
            return Err(CoreError::InvalidInput("no updatable field given".into()));
        }
        check_positive("age", self.age.map(f64::from))?;
        check_positive("weight_kg", self.weight_kg)?;
        check_positive("height_cm", self.height_cm)?;
        check_positive("water_goal_ml", self.water_goal_ml.map(f64::from))
    }

    /// Canonical activity label to store, unknown labels folded to sedentary.
    pub fn activity_label(&self) -> Option<&'static str> {
        self.activity
            .as_deref()
            .map(|a| ActivityLevel::parse(a).as_str())
    }

    pub fn apply(&self, p: &mut ClientProfile) {
        if let Some(v) = &self.name {
            p.name = v.clone();
        }
        if let Some(v) = self.age {
            p.age = Some(v);
        }
        if let Some(v) = &self.sex {
            p.sex = Some(v.clone());
        }
        if let Some(v) = self.weight_kg {
            p.weight_kg = Some(v);
        }
        if let Some(v) = self.height_cm {
            p.height_cm = Some(v);
        }
        if let Some(v) = &self.activity {
            p.activity = ActivityLevel::parse(v);
        }
        if let Some(v) = &self.goal {
            p.goal = Some(v.clone());
        }
        if let Some(v) = self.water_goal_ml {
            p.water_goal_ml = Some(v);
        }
    }
}

fn check_positive(field: &str, value: Option<f64>) -> CoreResult<()> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(CoreError::InvalidInput(format!(
            "{field} must be positive"
        ))),
        _ => Ok(()),
    }
}
