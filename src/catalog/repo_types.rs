use serde::Serialize;
use sqlx::FromRow;

use crate::nutrition::{Macros, NutritionLine};

/// Ingredient joined with its (optional) nutrition row.
#[derive(Debug, FromRow)]
pub struct IngredientRow {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub nutrition: Option<Macros>,
}

fn macros_from_columns(
    kcal: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
) -> Option<Macros> {
    // all four columns are NULL together when the nutrition join misses
    kcal.map(|kcal| Macros {
        kcal,
        protein: protein.unwrap_or(0.0),
        carbs: carbs.unwrap_or(0.0),
        fat: fat.unwrap_or(0.0),
    })
}

impl From<IngredientRow> for Ingredient {
    fn from(r: IngredientRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            category: r.category,
            nutrition: macros_from_columns(r.kcal, r.protein, r.carbs, r.fat),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub cooking_time: Option<i32>,
    pub instructions: Option<serde_json::Value>,
}

impl RecipeRow {
    /// Instruction steps; anything that is not a JSON array of strings is
    /// treated as having no steps.
    pub fn steps(&self) -> Vec<String> {
        self.instructions
            .as_ref()
            .and_then(|v| v.as_array())
            .map(|steps| {
                steps
                    .iter()
                    .filter_map(|s| s.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, FromRow)]
pub struct RecipeLineRow {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub amount: f64,
    pub unit: String,
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

/// One ingredient of a stored recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeLine {
    pub ingredient_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub amount: f64,
    pub unit: String,
    pub nutrition: Option<Macros>,
}

impl RecipeLine {
    pub fn nutrition_line(&self) -> NutritionLine<'_> {
        NutritionLine {
            nutrition: self.nutrition.as_ref(),
            amount: self.amount,
            unit: &self.unit,
        }
    }
}

impl RecipeLineRow {
    /// Splits the row into its recipe id and the line itself.
    pub fn into_keyed(self) -> (i64, RecipeLine) {
        let r = self;
        (
            r.recipe_id,
            RecipeLine {
                ingredient_id: r.ingredient_id,
                name: r.name,
                category: r.category,
                amount: r.amount,
                unit: r.unit,
                nutrition: macros_from_columns(r.kcal, r.protein, r.carbs, r.fat),
            },
        )
    }
}

/// Stored recipe with its ingredient lines, as used for goal-based picking.
#[derive(Debug, Clone)]
pub struct RecipeWithLines {
    pub id: i64,
    pub name: String,
    pub lines: Vec<RecipeLine>,
}

impl RecipeWithLines {
    pub fn base_macros(&self) -> Macros {
        crate::nutrition::aggregate(self.lines.iter().map(RecipeLine::nutrition_line))
            .or_default_estimate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipeIngredient {
    pub ingredient_id: i64,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub name: String,
    pub image_url: Option<String>,
    pub steps: Vec<String>,
    pub ingredients: Vec<NewRecipeIngredient>,
}
