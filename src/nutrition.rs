//! Nutrition math: Mifflin-St Jeor BMR, TDEE, BMI, water target and the
//! daily budget helpers the chat responders build on. Everything here is pure.

use serde::{Deserialize, Serialize};

/// A remaining budget at or below this is reported as "goal met".
pub const GOAL_MET_MARGIN_KCAL: f64 = 50.0;

/// Water recommendation per kg of body weight.
pub const WATER_ML_PER_KG: f64 = 35.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    /// Parses a stored activity label. Unknown labels fall back to `Sedentary`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "light" | "leve" => ActivityLevel::Light,
            "moderate" | "moderado" => ActivityLevel::Moderate,
            "active" | "ativo" => ActivityLevel::Active,
            "very_active" | "muito_ativo" => ActivityLevel::VeryActive,
            _ => ActivityLevel::Sedentary,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }
}

/// Basal metabolic rate (Mifflin-St Jeor). Only a sex starting with `f`
/// selects the female offset; anything else, missing included, uses the male one.
pub fn bmr(weight_kg: f64, height_cm: f64, age: f64, sex: Option<&str>) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age;
    let female = sex
        .and_then(|s| s.trim().chars().next())
        .map(|c| c.to_ascii_lowercase() == 'f')
        .unwrap_or(false);
    if female {
        base - 161.0
    } else {
        base + 5.0
    }
}

pub fn tdee(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.factor()
}

pub fn water_target_ml(weight_kg: f64) -> f64 {
    weight_kg * WATER_ML_PER_KG
}

pub fn bmi(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if !weight_kg.is_finite() || !height_cm.is_finite() {
        return None;
    }
    let height_m = height_cm / 100.0;
    if height_m <= 0.0 {
        return None;
    }
    Some(weight_kg / (height_m * height_m))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiClass {
    NotComputable,
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiClass {
    pub fn as_str(self) -> &'static str {
        match self {
            BmiClass::NotComputable => "not computable",
            BmiClass::Underweight => "underweight",
            BmiClass::Normal => "normal",
            BmiClass::Overweight => "overweight",
            BmiClass::Obese => "obese",
        }
    }

    /// Label used in chat replies.
    pub fn describe(self) -> &'static str {
        match self {
            BmiClass::NotComputable => "IMC não calculável",
            BmiClass::Underweight => "Magreza (IMC < 18.5)",
            BmiClass::Normal => "Normal (IMC 18.5–24.9)",
            BmiClass::Overweight => "Sobrepeso (IMC 25–29.9)",
            BmiClass::Obese => "Obesidade (IMC ≥ 30)",
        }
    }
}

pub fn classify_bmi(bmi: Option<f64>) -> BmiClass {
    match bmi {
        None => BmiClass::NotComputable,
        Some(v) if v < 18.5 => BmiClass::Underweight,
        Some(v) if v < 25.0 => BmiClass::Normal,
        Some(v) if v < 30.0 => BmiClass::Overweight,
        Some(_) => BmiClass::Obese,
    }
}

/// `tdee - consumed - margin`. Small or negative results mean the goal was met.
pub fn remaining_budget(tdee: f64, consumed_today: f64, margin: f64) -> f64 {
    tdee - consumed_today - margin
}

pub fn scale_per_100g(per_100g: f64, grams: f64) -> f64 {
    per_100g * (grams / 100.0)
}

/// Largest portion of a food that still fits the remaining budget.
pub fn max_portion_grams(remaining_kcal: f64, kcal_per_100g: f64) -> Option<f64> {
    if kcal_per_100g <= 0.0 {
        return None;
    }
    Some(remaining_kcal / kcal_per_100g * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn bmr_male_and_female() {
        let male = bmr(85.0, 175.0, 30.0, Some("M"));
        assert!(close(male, 1798.75));
        let female = bmr(60.0, 165.0, 25.0, Some("Feminino"));
        assert!(close(female, 600.0 + 1031.25 - 125.0 - 161.0));
    }

    #[test]
    fn bmr_missing_or_unknown_sex_uses_male_offset() {
        let m = bmr(70.0, 170.0, 40.0, Some("m"));
        assert!(close(bmr(70.0, 170.0, 40.0, None), m));
        assert!(close(bmr(70.0, 170.0, 40.0, Some("x")), m));
        assert!(close(bmr(70.0, 170.0, 40.0, Some("")), m));
    }

    #[test]
    fn tdee_for_reference_client() {
        let b = bmr(85.0, 175.0, 30.0, Some("M"));
        let t = tdee(b, ActivityLevel::parse("sedentario"));
        assert!((t - 2158.5).abs() < 1e-6);
    }

    #[test]
    fn activity_parsing_falls_back_to_sedentary() {
        assert_eq!(ActivityLevel::parse("very_active"), ActivityLevel::VeryActive);
        assert_eq!(ActivityLevel::parse("Moderado"), ActivityLevel::Moderate);
        assert_eq!(ActivityLevel::parse("couch potato"), ActivityLevel::Sedentary);
        assert_eq!(ActivityLevel::parse(""), ActivityLevel::Sedentary);
        assert!(close(tdee(1000.0, ActivityLevel::Light), 1375.0));
    }

    #[test]
    fn calculations_are_repeatable() {
        for _ in 0..3 {
            assert!(close(bmr(85.0, 175.0, 30.0, Some("M")), 1798.75));
            assert_eq!(bmi(85.0, 175.0), bmi(85.0, 175.0));
            assert!(close(water_target_ml(85.0), 2975.0));
        }
    }

    #[test]
    fn water_is_35_ml_per_kg() {
        for w in [1.0, 50.5, 72.0, 130.25] {
            assert!(close(water_target_ml(w), 35.0 * w));
        }
    }

    #[test]
    fn bmi_requires_positive_height() {
        assert!(bmi(70.0, 0.0).is_none());
        assert!(bmi(70.0, -10.0).is_none());
        assert!(bmi(f64::NAN, 170.0).is_none());
        let v = bmi(85.0, 175.0).unwrap();
        assert!((v - 27.755).abs() < 0.001);
    }

    #[test]
    fn bmi_class_boundaries() {
        let table = [
            (18.4, BmiClass::Underweight),
            (18.5, BmiClass::Normal),
            (24.9, BmiClass::Normal),
            (25.0, BmiClass::Overweight),
            (29.9, BmiClass::Overweight),
            (30.0, BmiClass::Obese),
        ];
        for (value, expected) in table {
            assert_eq!(classify_bmi(Some(value)), expected, "bmi {value}");
        }
        assert_eq!(classify_bmi(None).as_str(), "not computable");
        assert_eq!(classify_bmi(Some(18.4)).as_str(), "underweight");
    }

    #[test]
    fn budget_helpers() {
        assert!(close(remaining_budget(2000.0, 1500.0, 0.0), 500.0));
        assert!(close(remaining_budget(2000.0, 2100.0, 50.0), -150.0));
        assert!(close(scale_per_100g(200.0, 150.0), 300.0));
        assert!(close(max_portion_grams(300.0, 150.0).unwrap(), 200.0));
        assert!(max_portion_grams(300.0, 0.0).is_none());
    }
}
