use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::catalog::{self, repo_types::RecipeWithLines};
use crate::meals::{
    planner::{PlanStore, PlannedMeal, PlannedRecipe},
    repo_types::{CartLineRow, PlanCellRow},
    slot::MealSlot,
};

/// Stored cells in `[start, end)`, ordered by date.
pub async fn plan_cells(
    db: &PgPool,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<PlanCellRow>> {
    let rows = sqlx::query_as::<_, PlanCellRow>(
        r#"
        SELECT mp.plan_date, mp.slot, mpr.recipe_id, r.name AS recipe_name, mpr.assigned_kcal
          FROM meal_plans mp
          LEFT JOIN meal_plan_recipes mpr ON mpr.meal_plan_id = mp.id
          LEFT JOIN recipes r ON r.id = mpr.recipe_id
         WHERE mp.user_id = $1 AND mp.plan_date >= $2 AND mp.plan_date < $3
         ORDER BY mp.plan_date ASC, mpr.id ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
    .context("list plan cells")?;
    Ok(rows)
}

/// Every ingredient line of every recipe planned in `[start, end)`.
pub async fn cart_lines(
    db: &PgPool,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<CartLineRow>> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT ri.ingredient_id, i.name, i.category, ri.amount, ri.unit, mpr.portion_multiplier
          FROM meal_plans mp
          JOIN meal_plan_recipes mpr ON mpr.meal_plan_id = mp.id
          JOIN recipe_ingredients ri ON ri.recipe_id = mpr.recipe_id
          JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE mp.user_id = $1 AND mp.plan_date >= $2 AND mp.plan_date < $3
         ORDER BY mp.plan_date ASC, mp.id ASC, ri.id ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
    .context("list cart lines")?;
    Ok(rows)
}

/// [`PlanStore`] over the Postgres pool.
#[derive(Clone)]
pub struct PgPlanStore {
    db: PgPool,
}

impl PgPlanStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn meal_plan_exists(&self, user_id: Uuid, date: Date, slot: MealSlot) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM meal_plans
                 WHERE user_id = $1 AND plan_date = $2 AND slot = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(slot.as_str())
        .fetch_one(&self.db)
        .await
        .context("check meal plan")?;
        Ok(exists)
    }

    async fn store_planned_meal(&self, meal: &PlannedMeal) -> anyhow::Result<bool> {
        let mut tx = self.db.begin().await?;

        let plan_id: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO meal_plans (user_id, plan_date, slot)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, plan_date, slot) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(meal.user_id)
        .bind(meal.date)
        .bind(meal.slot.as_str())
        .fetch_optional(&mut *tx)
        .await
        .context("insert meal plan")?;

        let Some((plan_id,)) = plan_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        let recipe_id = match &meal.recipe {
            PlannedRecipe::Existing(id) => *id,
            PlannedRecipe::New(recipe) => catalog::repo::insert_recipe_tx(&mut tx, recipe).await?,
        };

        sqlx::query(
            r#"
            INSERT INTO meal_plan_recipes
                (meal_plan_id, recipe_id, portion_multiplier,
                 assigned_kcal, assigned_protein, assigned_carbs, assigned_fat,
                 goal_at_generation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(plan_id)
        .bind(recipe_id)
        .bind(meal.portion_multiplier)
        .bind(meal.assigned.kcal)
        .bind(meal.assigned.protein)
        .bind(meal.assigned.carbs)
        .bind(meal.assigned.fat)
        .bind(&meal.goal_at_generation)
        .execute(&mut *tx)
        .await
        .context("insert meal plan recipe")?;

        tx.commit().await?;
        Ok(true)
    }

    async fn goal_candidates(&self, goal: Option<&str>, limit: i64) -> anyhow::Result<Vec<RecipeWithLines>> {
        catalog::repo::goal_candidates(&self.db, goal, limit).await
    }

    async fn has_plans_between(&self, user_id: Uuid, start: Date, end: Date) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM meal_plans
                 WHERE user_id = $1 AND plan_date >= $2 AND plan_date < $3
            )
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await
        .context("check week plans")?;
        Ok(exists)
    }
}
