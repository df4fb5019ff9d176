use serde::{Deserialize, Serialize};

use crate::clients::repo_types::ClientProfile;
use crate::nutrition::{self, ActivityLevel, BmiClass};

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub activity: Option<String>,
    pub goal: Option<String>,
}

impl CreateClientRequest {
    pub fn activity_level(&self) -> ActivityLevel {
        self.activity
            .as_deref()
            .map(ActivityLevel::parse)
            .unwrap_or_default()
    }
}

/// Profile plus the figures derived from it.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: ClientProfile,
    pub bmi: Option<f64>,
    pub bmi_class: BmiClass,
    pub water_target_ml: Option<f64>,
    pub tdee_kcal: Option<f64>,
}

impl From<ClientProfile> for ProfileView {
    fn from(profile: ClientProfile) -> Self {
        let bmi = match (profile.weight_kg, profile.height_cm) {
            (Some(w), Some(h)) => nutrition::bmi(w, h),
            _ => None,
        };
        let water_target_ml = profile
            .water_goal_ml
            .map(f64::from)
            .or_else(|| profile.weight_kg.map(nutrition::water_target_ml));
        let tdee_kcal = match (profile.weight_kg, profile.height_cm, profile.age) {
            (Some(w), Some(h), Some(a)) => Some(nutrition::tdee(
                nutrition::bmr(w, h, f64::from(a), profile.sex.as_deref()),
                profile.activity,
            )),
            _ => None,
        };
        Self {
            bmi,
            bmi_class: nutrition::classify_bmi(bmi),
            water_target_ml,
            tdee_kcal,
            profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    fn profile() -> ClientProfile {
        ClientProfile {
            id: Uuid::new_v4(),
            nutritionist_id: Uuid::new_v4(),
            name: "Carlos".into(),
            email: "carlos@x.com".into(),
            age: Some(30),
            sex: Some("M".into()),
            weight_kg: Some(85.0),
            height_cm: Some(175.0),
            activity: ActivityLevel::Sedentary,
            initial_weight_kg: Some(85.0),
            goal: None,
            water_goal_ml: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn derived_figures() {
        let view = ProfileView::from(profile());
        assert!((view.bmi.unwrap() - 27.755).abs() < 1e-3);
        assert_eq!(view.bmi_class, BmiClass::Overweight);
        assert_eq!(view.water_target_ml, Some(2975.0));
        assert!((view.tdee_kcal.unwrap() - 2158.5).abs() < 1e-9);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Carlos");
        assert_eq!(json["bmi_class"], "overweight");
    }

    #[test]
    fn explicit_water_goal_wins_and_missing_data_is_none() {
        let mut p = profile();
        p.water_goal_ml = Some(2000);
        p.age = None;
        let view = ProfileView::from(p);
        assert_eq!(view.water_target_ml, Some(2000.0));
        assert_eq!(view.tdee_kcal, None);
    }
}
