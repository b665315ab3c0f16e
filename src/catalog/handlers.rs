use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};

use crate::{
    auth::extractors::{AuthUser, MaybeAuthUser},
    catalog::{
        dto::{PreviewQuery, RecipeDetail, RecipeIngredientItem, RecipePreview},
        repo,
        repo_types::RecipeLine,
    },
    error::ApiError,
    nutrition::{aggregate, targets::goal_key},
    state::AppState,
    users::repo_types::User,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes/preview", get(preview_recipes))
        .route("/recipe/:id", get(get_recipe))
}

/// Rounded macro totals, or `None` when no line carries nutrition data.
fn preview_macros(lines: &[RecipeLine]) -> Option<crate::nutrition::Macros> {
    if lines.iter().all(|l| l.nutrition.is_none()) {
        return None;
    }
    Some(aggregate(lines.iter().map(RecipeLine::nutrition_line)).rounded())
}

/// Recipe cards for the home page. Signed-in users with a goal only see
/// recipes tagged with that goal.
#[instrument(skip(state, user))]
pub async fn preview_recipes(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Query(q): Query<PreviewQuery>,
) -> Result<Json<Vec<RecipePreview>>, ApiError> {
    let goal = match user {
        Some(user_id) => User::find_by_id(&state.db, user_id)
            .await?
            .and_then(|u| goal_key(u.goal.as_deref())),
        None => None,
    };
    debug!(goal = ?goal, "recipe preview");

    let recipes = repo::list_recipes(&state.db, goal.as_deref(), q.effective_limit()).await?;
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let lines = repo::recipe_lines(&state.db, &ids).await?;

    let items = recipes
        .into_iter()
        .map(|r| {
            let macros = lines.get(&r.id).and_then(|l| preview_macros(l));
            RecipePreview {
                id: r.id,
                name: r.name,
                image_url: r.image_url,
                cooking_time: r.cooking_time,
                kcal: macros.map(|m| m.kcal),
                protein: macros.map(|m| m.protein),
                carbs: macros.map(|m| m.carbs),
                fat: macros.map(|m| m.fat),
            }
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let recipe = repo::find_recipe(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    let mut lines = repo::recipe_lines(&state.db, &[id]).await?;

    let ingredients = lines
        .remove(&id)
        .unwrap_or_default()
        .into_iter()
        .map(|l| RecipeIngredientItem {
            id: l.ingredient_id,
            name: l.name,
            amount: l.amount,
            unit: if l.unit.trim().is_empty() { "g".into() } else { l.unit },
        })
        .collect();

    Ok(Json(RecipeDetail {
        id: recipe.id,
        name: recipe.name.clone(),
        image_url: recipe.image_url.clone(),
        steps: recipe.steps(),
        ingredients,
    }))
}
