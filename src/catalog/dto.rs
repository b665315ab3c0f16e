use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub limit: Option<i64>,
}

pub const DEFAULT_PREVIEW_LIMIT: i64 = 6;
pub const MAX_PREVIEW_LIMIT: i64 = 24;

impl PreviewQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PREVIEW_LIMIT)
            .clamp(1, MAX_PREVIEW_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct RecipePreview {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub cooking_time: Option<i32>,
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RecipeIngredientItem {
    pub id: i64,
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub steps: Vec<String>,
    pub ingredients: Vec<RecipeIngredientItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_limit_is_clamped() {
        assert_eq!(PreviewQuery { limit: None }.effective_limit(), 6);
        assert_eq!(PreviewQuery { limit: Some(100) }.effective_limit(), 24);
        assert_eq!(PreviewQuery { limit: Some(0) }.effective_limit(), 1);
        assert_eq!(PreviewQuery { limit: Some(10) }.effective_limit(), 10);
    }
}
