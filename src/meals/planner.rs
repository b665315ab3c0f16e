//! Seven-day plan generation. Both paths walk the 21 day/slot cells in
//! order, skip cells that already hold a plan, and store scaled macro
//! snapshots next to the chosen recipe.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Serialize;
use time::{Date, Duration};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::catalog::repo_types::{Ingredient, NewRecipe, RecipeWithLines};
use crate::meals::slot::MealSlot;
use crate::meals::synthesizer::{filter_allowed, MealProfile, MealSynthesizer};
use crate::nutrition::targets::{daily_target, goal_key, per_meal_target};
use crate::nutrition::Macros;
use crate::users::repo_types::User;

pub const DAYS_PER_WEEK: i64 = 7;
pub const MIN_PORTION: f64 = 0.5;
pub const MAX_PORTION: f64 = 2.0;
/// How many recent recipes the goal-based picker chooses from.
pub const CANDIDATE_LIMIT: i64 = 50;

/// Scale applied to a recipe so its calories approach the per-meal target.
pub fn portion_multiplier(target_kcal: f64, raw_kcal: f64) -> f64 {
    (target_kcal / raw_kcal.max(1.0)).clamp(MIN_PORTION, MAX_PORTION)
}

/// Per-meal calorie target derived from the user's body metrics and goal.
pub fn user_per_meal_target(user: &User) -> f64 {
    per_meal_target(daily_target(&user.body_metrics(), user.parsed_goal().as_ref()))
}

/// Any element of the candidate set; no ordering guarantee.
fn pick_random(candidates: &[RecipeWithLines]) -> Option<&RecipeWithLines> {
    candidates.choose(&mut rand::thread_rng())
}

pub fn week_dates(start: Date) -> impl Iterator<Item = Date> {
    (0..DAYS_PER_WEEK).filter_map(move |d| start.checked_add(Duration::days(d)))
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlannedRecipe {
    Existing(i64),
    New(NewRecipe),
}

/// Everything written for one day/slot cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMeal {
    pub user_id: Uuid,
    pub date: Date,
    pub slot: MealSlot,
    pub recipe: PlannedRecipe,
    pub portion_multiplier: f64,
    pub assigned: Macros,
    pub goal_at_generation: Option<String>,
}

impl PlannedMeal {
    fn scaled(
        user_id: Uuid,
        date: Date,
        slot: MealSlot,
        recipe: PlannedRecipe,
        base: Macros,
        target_kcal: f64,
        goal: Option<String>,
    ) -> Self {
        let factor = portion_multiplier(target_kcal, base.kcal);
        Self {
            user_id,
            date,
            slot,
            recipe,
            portion_multiplier: factor,
            assigned: base.scaled(factor),
            goal_at_generation: goal,
        }
    }
}

/// Persistence needed by the plan builder.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn meal_plan_exists(&self, user_id: Uuid, date: Date, slot: MealSlot) -> anyhow::Result<bool>;

    /// Stores the plan, its recipe when new, and the snapshot link as one
    /// unit. Returns `false` when the cell was taken in the meantime.
    async fn store_planned_meal(&self, meal: &PlannedMeal) -> anyhow::Result<bool>;

    async fn goal_candidates(&self, goal: Option<&str>, limit: i64) -> anyhow::Result<Vec<RecipeWithLines>>;

    /// Whether any plan exists in `[start, end)`.
    async fn has_plans_between(&self, user_id: Uuid, start: Date, end: Date) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WeekOutcome {
    pub created: u32,
    pub skipped: u32,
}

impl WeekOutcome {
    fn record(&mut self, stored: bool) {
        if stored {
            self.created += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Goal-based path: picks a random stored recipe per cell.
#[instrument(skip(store, user), fields(user_id = %user.id))]
pub async fn generate_goal_week(
    store: &dyn PlanStore,
    user: &User,
    start: Date,
) -> anyhow::Result<WeekOutcome> {
    let goal = goal_key(user.goal.as_deref());
    let target = user_per_meal_target(user);
    let candidates = store.goal_candidates(goal.as_deref(), CANDIDATE_LIMIT).await?;
    let mut outcome = WeekOutcome::default();

    for date in week_dates(start) {
        for slot in MealSlot::ALL {
            if store.meal_plan_exists(user.id, date, slot).await? {
                outcome.skipped += 1;
                continue;
            }
            let Some(recipe) = pick_random(&candidates) else {
                warn!(%date, %slot, "no recipes available; leaving cell empty");
                outcome.skipped += 1;
                continue;
            };
            debug!(%date, %slot, recipe_id = recipe.id, recipe = %recipe.name, "recipe picked");
            let meal = PlannedMeal::scaled(
                user.id,
                date,
                slot,
                PlannedRecipe::Existing(recipe.id),
                recipe.base_macros(),
                target,
                goal.clone(),
            );
            outcome.record(store.store_planned_meal(&meal).await?);
        }
    }

    info!(created = outcome.created, skipped = outcome.skipped, "goal week generated");
    Ok(outcome)
}

/// Synthesizer path: every empty cell gets a freshly synthesized recipe.
#[instrument(skip(store, synthesizer, user, ingredients), fields(user_id = %user.id))]
pub async fn generate_ai_week(
    store: &dyn PlanStore,
    synthesizer: &MealSynthesizer,
    user: &User,
    ingredients: &[Ingredient],
    start: Date,
) -> anyhow::Result<WeekOutcome> {
    let goal = goal_key(user.goal.as_deref());
    let target = user_per_meal_target(user);
    let profile = MealProfile::for_user(user, target.round());
    let pool = filter_allowed(ingredients, &profile);
    debug!(pool = pool.len(), target, "synthesizing week");
    let mut outcome = WeekOutcome::default();

    for date in week_dates(start) {
        for slot in MealSlot::ALL {
            if store.meal_plan_exists(user.id, date, slot).await? {
                outcome.skipped += 1;
                continue;
            }
            let dish = synthesizer.synthesize(&profile, slot.as_str(), &pool).await;
            debug!(
                %date,
                %slot,
                source = ?dish.source,
                provider = dish.provider.unwrap_or("none"),
                recipe = %dish.recipe_name,
                "dish synthesized"
            );
            let base = dish.computed_macros(&pool).or_default_estimate();
            let meal = PlannedMeal::scaled(
                user.id,
                date,
                slot,
                PlannedRecipe::New(dish.to_new_recipe()),
                base,
                target,
                goal.clone(),
            );
            outcome.record(store.store_planned_meal(&meal).await?);
        }
    }

    info!(created = outcome.created, skipped = outcome.skipped, "ai week generated");
    Ok(outcome)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// In-memory store keyed by (user, date, slot).
    #[derive(Default)]
    pub struct MemoryPlanStore {
        pub meals: Mutex<Vec<PlannedMeal>>,
        pub recipes: Vec<RecipeWithLines>,
        pub fail_for: Option<Uuid>,
    }

    impl MemoryPlanStore {
        pub fn with_recipes(recipes: Vec<RecipeWithLines>) -> Self {
            Self {
                recipes,
                ..Self::default()
            }
        }

        pub fn stored(&self) -> Vec<PlannedMeal> {
            self.meals.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlanStore for MemoryPlanStore {
        async fn meal_plan_exists(&self, user_id: Uuid, date: Date, slot: MealSlot) -> anyhow::Result<bool> {
            if self.fail_for == Some(user_id) {
                anyhow::bail!("store unavailable");
            }
            Ok(self
                .meals
                .lock()
                .unwrap()
                .iter()
                .any(|m| m.user_id == user_id && m.date == date && m.slot == slot))
        }

        async fn store_planned_meal(&self, meal: &PlannedMeal) -> anyhow::Result<bool> {
            let mut meals = self.meals.lock().unwrap();
            if meals
                .iter()
                .any(|m| m.user_id == meal.user_id && m.date == meal.date && m.slot == meal.slot)
            {
                return Ok(false);
            }
            meals.push(meal.clone());
            Ok(true)
        }

        async fn goal_candidates(&self, _goal: Option<&str>, limit: i64) -> anyhow::Result<Vec<RecipeWithLines>> {
            Ok(self.recipes.iter().take(limit as usize).cloned().collect())
        }

        async fn has_plans_between(&self, user_id: Uuid, start: Date, end: Date) -> anyhow::Result<bool> {
            if self.fail_for == Some(user_id) {
                anyhow::bail!("store unavailable");
            }
            Ok(self
                .meals
                .lock()
                .unwrap()
                .iter()
                .any(|m| m.user_id == user_id && m.date >= start && m.date < end))
        }
    }

    pub fn user(goal: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "kim@example.com".into(),
            password_hash: String::new(),
            name: "Kim".into(),
            gender: Some("male".into()),
            age: Some(30),
            goal: goal.map(str::to_string),
            calorie_target: None,
            allergies: vec![],
            dislike_ingredients: vec![],
            height_cm: Some(175.0),
            weight_kg: Some(70.0),
            bmi: None,
            disease: None,
            created_at: time::OffsetDateTime::UNIX_EPOCH,
        }
    }
}
