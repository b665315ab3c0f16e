//! Daily energy targets and goal handling.

use std::fmt;

/// Fixed "moderately active" multiplier applied to the BMR.
pub const ACTIVITY_FACTOR: f64 = 1.55;

pub const DEFAULT_HEIGHT_CM: f64 = 170.0;
pub const DEFAULT_WEIGHT_KG: f64 = 65.0;
pub const DEFAULT_AGE: i32 = 25;

pub const MEALS_PER_DAY: f64 = 3.0;

/// Canonical dietary goal. Free-form input (UI labels in Korean, English
/// keywords) is folded onto these keys; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Goal {
    Diet,
    MuscleGain,
    Balanced,
    Vegetarian,
    LowSugar,
    Other(String),
}

impl Goal {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Goal> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let lower = raw.to_lowercase();
        let goal = if raw == "다이어트" || lower.contains("diet") {
            Goal::Diet
        } else if matches!(raw, "근육량 증가" | "벌크업" | "근력 증가" | "체중 증가")
            || lower.contains("muscle")
        {
            Goal::MuscleGain
        } else if raw == "균형" || lower.contains("balanced") {
            Goal::Balanced
        } else if raw == "채식" || lower.contains("vegetarian") {
            Goal::Vegetarian
        } else if raw == "저당" || lower.contains("low_sugar") {
            Goal::LowSugar
        } else {
            Goal::Other(raw.to_string())
        };
        Some(goal)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Goal::Diet => "diet",
            Goal::MuscleGain => "muscle_gain",
            Goal::Balanced => "balanced",
            Goal::Vegetarian => "vegetarian",
            Goal::LowSugar => "low_sugar",
            Goal::Other(s) => s,
        }
    }

    pub fn calorie_adjustment(&self) -> f64 {
        match self {
            Goal::Diet => -500.0,
            Goal::MuscleGain => 300.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical key for an optional stored goal string.
pub fn goal_key(raw: Option<&str>) -> Option<String> {
    raw.and_then(Goal::parse).map(|g| g.as_str().to_string())
}

#[derive(Debug, Clone, Default)]
pub struct BodyMetrics {
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

impl BodyMetrics {
    fn is_male(&self) -> bool {
        match self.gender.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(g) => g.eq_ignore_ascii_case("male") || g == "남성" || g == "남자",
        }
    }

    /// Harris-Benedict style basal rate with the documented defaults.
    pub fn basal_metabolic_rate(&self) -> f64 {
        let h = self.height_cm.filter(|v| *v > 0.0).unwrap_or(DEFAULT_HEIGHT_CM);
        let w = self.weight_kg.filter(|v| *v > 0.0).unwrap_or(DEFAULT_WEIGHT_KG);
        let a = f64::from(self.age.filter(|v| *v > 0).unwrap_or(DEFAULT_AGE));
        if self.is_male() {
            66.0 + 13.7 * w + 5.0 * h - 6.8 * a
        } else {
            655.0 + 9.6 * w + 1.8 * h - 4.7 * a
        }
    }

    pub fn daily_energy_expenditure(&self) -> f64 {
        self.basal_metabolic_rate() * ACTIVITY_FACTOR
    }
}

/// Daily calorie target: expenditure adjusted by goal.
pub fn daily_target(metrics: &BodyMetrics, goal: Option<&Goal>) -> f64 {
    let tdee = metrics.daily_energy_expenditure();
    tdee + goal.map(Goal::calorie_adjustment).unwrap_or(0.0)
}

pub fn per_meal_target(daily: f64) -> f64 {
    daily / MEALS_PER_DAY
}

/// BMI rounded to one decimal; `None` unless both inputs are positive.
pub fn body_mass_index(height_cm: Option<f64>, weight_kg: Option<f64>) -> Option<f64> {
    let h = height_cm.filter(|v| *v > 0.0)? / 100.0;
    let w = weight_kg.filter(|v| *v > 0.0)?;
    Some((w / (h * h) * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn male_diet_target_matches_formula() {
        let metrics = BodyMetrics {
            gender: Some("male".into()),
            age: Some(30),
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
        };
        let expected = (66.0 + 13.7 * 70.0 + 5.0 * 175.0 - 6.8 * 30.0) * 1.55 - 500.0;
        assert!(close(daily_target(&metrics, Some(&Goal::Diet)), expected));
    }

    #[test]
    fn female_formula_and_muscle_gain() {
        let metrics = BodyMetrics {
            gender: Some("female".into()),
            age: Some(40),
            height_cm: Some(160.0),
            weight_kg: Some(55.0),
        };
        let expected = (655.0 + 9.6 * 55.0 + 1.8 * 160.0 - 4.7 * 40.0) * 1.55 + 300.0;
        assert!(close(daily_target(&metrics, Some(&Goal::MuscleGain)), expected));
    }

    #[test]
    fn defaults_apply_when_metrics_missing() {
        let expected = (66.0 + 13.7 * 65.0 + 5.0 * 170.0 - 6.8 * 25.0) * 1.55;
        assert!(close(daily_target(&BodyMetrics::default(), None), expected));
        assert!(close(
            daily_target(&BodyMetrics::default(), Some(&Goal::Balanced)),
            expected
        ));
    }

    #[test]
    fn goal_parsing_covers_labels_and_keywords() {
        assert_eq!(Goal::parse("다이어트"), Some(Goal::Diet));
        assert_eq!(Goal::parse("Diet"), Some(Goal::Diet));
        assert_eq!(Goal::parse("벌크업"), Some(Goal::MuscleGain));
        assert_eq!(Goal::parse("muscle_gain"), Some(Goal::MuscleGain));
        assert_eq!(Goal::parse("저당"), Some(Goal::LowSugar));
        assert_eq!(Goal::parse("keto"), Some(Goal::Other("keto".into())));
        assert_eq!(Goal::parse("  "), None);
        assert_eq!(goal_key(Some("체중 증가")).as_deref(), Some("muscle_gain"));
        assert_eq!(goal_key(None), None);
    }

    #[test]
    fn bmi_requires_both_inputs() {
        assert_eq!(body_mass_index(Some(180.0), Some(81.0)), Some(25.0));
        assert_eq!(body_mass_index(Some(170.0), Some(65.0)), Some(22.5));
        assert_eq!(body_mass_index(None, Some(65.0)), None);
        assert_eq!(body_mass_index(Some(0.0), Some(65.0)), None);
    }
}
