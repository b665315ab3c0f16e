use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::meals::{
    cart::CartItem,
    synthesizer::{MealProfile, SynthesizedMeal, DEFAULT_CALORIE_TARGET, DEFAULT_GOAL},
    week::iso_date,
};

/// Profile as sent by the client; every field may be absent.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileInput {
    pub goal: Option<String>,
    pub calorie_target: Option<f64>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub dislike_ingredients: Vec<String>,
}

impl From<ProfileInput> for MealProfile {
    fn from(p: ProfileInput) -> Self {
        MealProfile {
            goal: p
                .goal
                .filter(|g| !g.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GOAL.into()),
            calorie_target: p
                .calorie_target
                .filter(|c| c.is_finite() && *c > 0.0)
                .unwrap_or(DEFAULT_CALORIE_TARGET),
            allergies: p.allergies,
            dislike_ingredients: p.dislike_ingredients,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateMealRequest {
    pub profile: Option<ProfileInput>,
    #[serde(rename = "mealType", alias = "meal_type")]
    pub meal_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateWeekRequest {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DayMeals {
    pub breakfast: SynthesizedMeal,
    pub lunch: SynthesizedMeal,
    pub dinner: SynthesizedMeal,
}

#[derive(Debug, Serialize)]
pub struct EphemeralDay {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meals: DayMeals,
}

#[derive(Debug, Serialize)]
pub struct InitialPlanResponse {
    pub success: bool,
    pub created: u32,
    pub skipped: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialAiPlanResponse {
    pub success: bool,
    pub used_gemini: bool,
    pub created: u32,
    pub skipped: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    #[serde(rename = "weekStart", alias = "week_start")]
    pub week_start: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AiIngredientItem {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiWeekItem {
    pub time: &'static str,
    pub name: String,
    pub kcal: f64,
    pub ingredients: Vec<AiIngredientItem>,
    pub steps: Vec<String>,
    pub image_url: Option<String>,
}

impl AiWeekItem {
    pub fn from_meal(time: &'static str, meal: SynthesizedMeal) -> Self {
        Self {
            time,
            name: meal.recipe_name,
            kcal: meal.total_calories.round(),
            ingredients: meal
                .ingredients
                .into_iter()
                .map(|i| AiIngredientItem {
                    name: i.name,
                    amount: i.amount,
                    unit: i.unit.as_str().to_string(),
                })
                .collect(),
            steps: meal.steps,
            image_url: meal.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingCartResponse {
    #[serde(with = "iso_date")]
    pub week_start: Date,
    #[serde(with = "iso_date")]
    pub week_end: Date,
    pub items: Vec<CartItem>,
    pub total_items: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CronStatus {
    Exists,
    Generated,
    Failed,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronUserResult {
    pub user_id: Uuid,
    pub status: CronStatus,
}

#[derive(Debug, Serialize)]
pub struct CronResponse {
    pub success: bool,
    pub results: Vec<CronUserResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_defaults_fill_gaps() {
        let profile = MealProfile::from(ProfileInput::default());
        assert_eq!(profile.goal, "diet");
        assert_eq!(profile.calorie_target, 1800.0);
        assert!(profile.allergies.is_empty());
    }

    #[test]
    fn generate_request_accepts_camel_case() {
        let req: GenerateMealRequest = serde_json::from_str(
            r#"{"profile":{"goal":"벌크업","calorie_target":700,"allergies":["새우"]},"mealType":"lunch"}"#,
        )
        .unwrap();
        assert_eq!(req.meal_type.as_deref(), Some("lunch"));
        let profile = MealProfile::from(req.profile.unwrap());
        assert_eq!(profile.goal, "벌크업");
        assert_eq!(profile.calorie_target, 700.0);
        assert_eq!(profile.allergies, vec!["새우".to_string()]);
    }

    #[test]
    fn cron_status_serializes_lowercase() {
        let json = serde_json::to_value(CronUserResult {
            user_id: Uuid::nil(),
            status: CronStatus::Exists,
        })
        .unwrap();
        assert_eq!(json["status"], "exists");
        assert!(json.get("userId").is_some());
    }
}
