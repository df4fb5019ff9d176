use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::nlu::embedding::Embedding;

/// Macros per 100 g of a food.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub kcal: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carb: f64,
    #[serde(default)]
    pub fat: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanItem {
    pub id: i64,
    pub client_id: Uuid,
    pub meal_slot: String,
    pub name: String,
    pub per_100g: Macros,
    pub embedding_text: String,
    #[serde(skip)]
    pub embedding: Option<Embedding>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct PlanItemRow {
    pub id: i64,
    pub client_id: Uuid,
    pub meal_slot: String,
    pub name: String,
    pub kcal_100g: f64,
    pub protein_100g: f64,
    pub carb_100g: f64,
    pub fat_100g: f64,
    pub embedding_text: String,
    pub embedding: Option<Vec<u8>>,
    pub created_at: OffsetDateTime,
}

impl TryFrom<PlanItemRow> for PlanItem {
    type Error = crate::error::CoreError;

    fn try_from(r: PlanItemRow) -> CoreResult<Self> {
        let embedding = r
            .embedding
            .as_deref()
            .map(Embedding::from_le_bytes)
            .transpose()?;
        Ok(Self {
            id: r.id,
            client_id: r.client_id,
            meal_slot: r.meal_slot,
            name: r.name,
            per_100g: Macros {
                kcal: r.kcal_100g,
                protein: r.protein_100g,
                carb: r.carb_100g,
                fat: r.fat_100g,
            },
            embedding_text: r.embedding_text,
            embedding,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewPlanItem {
    pub client_id: Uuid,
    pub meal_slot: String,
    pub name: String,
    pub per_100g: Macros,
    pub embedding_text: String,
    pub embedding: Option<Embedding>,
}

impl NewPlanItem {
    /// Normalizes the meal slot and derives the text the embedding is computed from.
    pub fn new(client_id: Uuid, meal_slot: &str, name: &str, per_100g: Macros) -> Self {
        let name = name.trim().to_string();
        let embedding_text = format!("{} - {:.0} kcal por 100g", name, per_100g.kcal);
        Self {
            client_id,
            meal_slot: meal_slot.trim().to_lowercase(),
            name,
            per_100g,
            embedding_text,
            embedding: None,
        }
    }
}
