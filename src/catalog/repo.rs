use std::collections::HashMap;

use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};

use crate::catalog::repo_types::{
    Ingredient, IngredientRow, NewRecipe, RecipeLine, RecipeLineRow, RecipeRow, RecipeWithLines,
};

// Matches recipes tagged with goal $1 through either the direct goal_id
// column or the recipe_goals link table. A NULL goal matches everything.
const GOAL_FILTER: &str = r#"
    ($1::text IS NULL
     OR EXISTS (SELECT 1 FROM goals g WHERE g.id = r.goal_id AND g.name = $1)
     OR EXISTS (SELECT 1 FROM recipe_goals rg JOIN goals g ON g.id = rg.goal_id
                WHERE rg.recipe_id = r.id AND g.name = $1))
"#;

/// All ingredients with their nutrition, in id order.
pub async fn list_ingredients(db: &PgPool) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, IngredientRow>(
        r#"
        SELECT i.id, i.name, i.category, n.kcal, n.protein, n.carbs, n.fat
          FROM ingredients i
          LEFT JOIN nutrition n ON n.id = i.nutrition_id
         ORDER BY i.id ASC
        "#,
    )
    .fetch_all(db)
    .await
    .context("list ingredients")?;
    Ok(rows.into_iter().map(Ingredient::from).collect())
}

/// Newest recipes first, optionally restricted to a goal key.
pub async fn list_recipes(
    db: &PgPool,
    goal: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<RecipeRow>> {
    let sql = format!(
        r#"
        SELECT r.id, r.name, r.image_url, r.cooking_time, r.instructions
          FROM recipes r
         WHERE {GOAL_FILTER}
         ORDER BY r.id DESC
         LIMIT $2
        "#
    );
    let rows = sqlx::query_as::<_, RecipeRow>(&sql)
        .bind(goal)
        .bind(limit)
        .fetch_all(db)
        .await
        .context("list recipes")?;
    Ok(rows)
}

pub async fn find_recipe(db: &PgPool, id: i64) -> anyhow::Result<Option<RecipeRow>> {
    let row = sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT id, name, image_url, cooking_time, instructions
          FROM recipes
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find recipe")?;
    Ok(row)
}

/// Ingredient lines for the given recipes, keyed by recipe id, in insertion
/// order.
pub async fn recipe_lines(
    db: &PgPool,
    recipe_ids: &[i64],
) -> anyhow::Result<HashMap<i64, Vec<RecipeLine>>> {
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, RecipeLineRow>(
        r#"
        SELECT ri.recipe_id, ri.ingredient_id, i.name, i.category, ri.amount, ri.unit,
               n.kcal, n.protein, n.carbs, n.fat
          FROM recipe_ingredients ri
          JOIN ingredients i ON i.id = ri.ingredient_id
          LEFT JOIN nutrition n ON n.id = i.nutrition_id
         WHERE ri.recipe_id = ANY($1)
         ORDER BY ri.recipe_id, ri.id
        "#,
    )
    .bind(recipe_ids)
    .fetch_all(db)
    .await
    .context("list recipe ingredients")?;

    let mut out: HashMap<i64, Vec<RecipeLine>> = HashMap::new();
    for row in rows {
        let (recipe_id, line) = row.into_keyed();
        out.entry(recipe_id).or_default().push(line);
    }
    Ok(out)
}

/// Up to `limit` recent recipes tagged with `goal`; when none are tagged,
/// the most recent recipes of any goal.
pub async fn goal_candidates(
    db: &PgPool,
    goal: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<RecipeWithLines>> {
    let mut recipes = list_recipes(db, goal, limit).await?;
    if recipes.is_empty() && goal.is_some() {
        recipes = list_recipes(db, None, limit).await?;
    }
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let mut lines = recipe_lines(db, &ids).await?;
    Ok(recipes
        .into_iter()
        .map(|r| RecipeWithLines {
            id: r.id,
            lines: lines.remove(&r.id).unwrap_or_default(),
            name: r.name,
        })
        .collect())
}

/// Insert a recipe and its ingredient lines within a transaction.
pub async fn insert_recipe_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe: &NewRecipe,
) -> anyhow::Result<i64> {
    let steps = (!recipe.steps.is_empty()).then(|| serde_json::json!(recipe.steps));
    let (recipe_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO recipes (name, image_url, instructions)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(&recipe.name)
    .bind(&recipe.image_url)
    .bind(steps)
    .fetch_one(&mut **tx)
    .await
    .context("insert recipe")?;

    for part in &recipe.ingredients {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount, unit)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(recipe_id)
        .bind(part.ingredient_id)
        .bind(part.amount)
        .bind(&part.unit)
        .execute(&mut **tx)
        .await
        .context("insert recipe ingredient")?;
    }

    Ok(recipe_id)
}
