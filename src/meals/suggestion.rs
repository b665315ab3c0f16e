//! Validation of free-text meal suggestions returned by a provider.

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::repo_types::Ingredient;
use crate::nutrition::{Macros, Unit};

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("recipe_name is empty")]
    EmptyName,
    #[error("no ingredients")]
    NoIngredients,
    #[error("ingredient id {0} is not in the allowed pool")]
    UnknownIngredient(i64),
    #[error("ingredient {0} has an invalid amount")]
    InvalidAmount(i64),
    #[error("{0}")]
    InvalidUnit(String),
    #[error("macro totals must be finite and non-negative")]
    InvalidTotals,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    recipe_name: String,
    total_calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    ingredients: Vec<RawIngredient>,
    #[serde(default, alias = "instructions")]
    steps: Vec<String>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIngredient {
    id: i64,
    amount: f64,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuggestedIngredient {
    pub ingredient_id: i64,
    pub name: String,
    pub amount: f64,
    pub unit: Unit,
}

/// A provider answer that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct MealSuggestion {
    pub recipe_name: String,
    pub totals: Macros,
    pub ingredients: Vec<SuggestedIngredient>,
    pub steps: Vec<String>,
    pub image_url: Option<String>,
}

/// Removes Markdown code-fence markers (```` ``` ```` and ```` ```json ````).
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parses and validates a provider answer against the allowed pool.
pub fn parse_suggestion(raw: &str, pool: &[Ingredient]) -> Result<MealSuggestion, SuggestionError> {
    let text = strip_code_fences(raw);
    let parsed: RawSuggestion = serde_json::from_str(&text)?;

    let recipe_name = parsed.recipe_name.trim().to_string();
    if recipe_name.is_empty() {
        return Err(SuggestionError::EmptyName);
    }
    if parsed.ingredients.is_empty() {
        return Err(SuggestionError::NoIngredients);
    }

    let totals = Macros {
        kcal: parsed.total_calories,
        protein: parsed.protein,
        carbs: parsed.carbs,
        fat: parsed.fat,
    };
    let totals_ok = [totals.kcal, totals.protein, totals.carbs, totals.fat]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0);
    if !totals_ok {
        return Err(SuggestionError::InvalidTotals);
    }

    let ingredients = parsed
        .ingredients
        .into_iter()
        .map(|part| {
            let known = pool
                .iter()
                .find(|i| i.id == part.id)
                .ok_or(SuggestionError::UnknownIngredient(part.id))?;
            if !part.amount.is_finite() || part.amount < 0.0 {
                return Err(SuggestionError::InvalidAmount(part.id));
            }
            let unit = match part.unit.as_deref() {
                None => Unit::Gram,
                Some(u) => u.parse::<Unit>().map_err(SuggestionError::InvalidUnit)?,
            };
            Ok(SuggestedIngredient {
                ingredient_id: part.id,
                name: known.name.clone(),
                amount: part.amount,
                unit,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MealSuggestion {
        recipe_name,
        totals,
        ingredients,
        steps: parsed
            .steps
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        image_url: parsed.image_url.filter(|u| !u.trim().is_empty()),
    })
}
