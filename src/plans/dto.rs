use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::plans::repo_types::{Macros, PlanItem};

#[derive(Debug, Deserialize)]
pub struct CreatePlanItemRequest {
    pub meal_slot: String,
    pub name: String,
    #[serde(flatten)]
    pub per_100g: Macros,
}

impl CreatePlanItemRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.meal_slot.trim().is_empty() || self.name.trim().is_empty() {
            return Err("meal_slot and name are required".into());
        }
        let m = self.per_100g;
        if [m.kcal, m.protein, m.carb, m.fat]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err("macros must be non-negative numbers".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub meals: BTreeMap<String, Vec<PlanItem>>,
}
