use serde::Serialize;

use crate::catalog::repo_types::Ingredient;
use crate::meals::synthesizer::MealProfile;
use crate::nutrition::Macros;

/// Shape every provider is asked to answer with.
pub const RESPONSE_SHAPE: &str = r#"Return ONLY a compact JSON object with keys: {"recipe_name": string, "total_calories": number, "protein": number, "carbs": number, "fat": number, "ingredients": [{"id": number, "amount": number, "unit": "g" | "ml" | "piece"}], "steps": [string]}"#;

#[derive(Serialize)]
struct PromptIngredient<'a> {
    id: i64,
    name: &'a str,
    category: Option<&'a str>,
    nutrition: Option<&'a Macros>,
}

/// Prompt for one meal built from the user's profile and the allowed
/// ingredient pool.
pub fn build_meal_prompt(profile: &MealProfile, slot_label: &str, pool: &[Ingredient]) -> String {
    let ingredients: Vec<PromptIngredient<'_>> = pool
        .iter()
        .map(|i| PromptIngredient {
            id: i.id,
            name: &i.name,
            category: i.category.as_deref(),
            nutrition: i.nutrition.as_ref(),
        })
        .collect();
    let ingredients_json = serde_json::to_string(&ingredients).unwrap_or_else(|_| "[]".into());

    format!(
        "User profile\n\
         - Goal: {goal}\n\
         - Calorie target for this meal (approximate): {target}\n\
         - Allergies: {allergies}\n\
         - Disliked ingredients: {dislikes}\n\
         - Meal: {slot}\n\
         \n\
         Available ingredients (nutrition is per 100 g, or per piece for countable items):\n\
         {ingredients_json}\n\
         \n\
         Rules:\n\
         - Write the dish name in Korean as a short dish name, e.g. \"닭가슴살 오트밀 죽\", \"소고기 안심 스테이크\", \"연어 아보카도 샐러드\".\n\
         - Do not use generic words such as breakfast, lunch, dinner or \"추천 식단\" in the dish name.\n\
         - Use only ids from the list above.\n\
         - Every ingredient needs a numeric amount and a unit of \"g\", \"ml\" or \"piece\".\n\
         - Keep the total calories close to the target.\n\
         \n\
         {RESPONSE_SHAPE}",
        goal = profile.goal,
        target = profile.calorie_target.round(),
        allergies = profile.allergies.join(", "),
        dislikes = profile.dislike_ingredients.join(", "),
        slot = slot_label,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_profile_and_pool() {
        let profile = MealProfile {
            goal: "diet".into(),
            calorie_target: 533.4,
            allergies: vec!["땅콩".into(), "새우".into()],
            dislike_ingredients: vec!["오이".into()],
        };
        let pool = vec![Ingredient {
            id: 7,
            name: "닭가슴살".into(),
            category: Some("육류".into()),
            nutrition: Some(Macros {
                kcal: 165.0,
                protein: 31.0,
                carbs: 0.0,
                fat: 3.6,
            }),
        }];
        let prompt = build_meal_prompt(&profile, "lunch", &pool);
        assert!(prompt.contains("Goal: diet"));
        assert!(prompt.contains("approximate): 533"));
        assert!(prompt.contains("땅콩, 새우"));
        assert!(prompt.contains("Meal: lunch"));
        assert!(prompt.contains(r#""id":7"#));
        assert!(prompt.contains("닭가슴살"));
        assert!(prompt.ends_with(RESPONSE_SHAPE));
    }
}
