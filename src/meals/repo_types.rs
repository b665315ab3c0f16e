use sqlx::FromRow;
use time::Date;

/// One stored plan cell with its (first) linked recipe.
#[derive(Debug, Clone, FromRow)]
pub struct PlanCellRow {
    pub plan_date: Date,
    pub slot: String,
    pub recipe_id: Option<i64>,
    pub recipe_name: Option<String>,
    pub assigned_kcal: Option<f64>,
}

/// One recipe ingredient reached through a stored plan.
#[derive(Debug, Clone, FromRow)]
pub struct CartLineRow {
    pub ingredient_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub portion_multiplier: Option<f64>,
}
