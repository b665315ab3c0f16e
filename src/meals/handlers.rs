use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use time::{Date, Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    catalog::{self, repo_types::Ingredient},
    error::ApiError,
    meals::{
        cart::aggregate_cart,
        dto::{
            AiWeekItem, CronResponse, CronStatus, CronUserResult, DayMeals, EphemeralDay,
            GenerateMealRequest, GenerateWeekRequest, InitialAiPlanResponse, InitialPlanResponse,
            ShoppingCartResponse, WeekQuery,
        },
        planner::{generate_ai_week, generate_goal_week, user_per_meal_target, week_dates, PlanStore, DAYS_PER_WEEK},
        repo::{self, PgPlanStore},
        slot::MealSlot,
        synthesizer::{filter_allowed, MealProfile, SynthesizedMeal, DEFAULT_CALORIE_TARGET},
        week::{group_week, monday_of, next_week_monday, parse_iso_date, MealGroup, WeekDay, WeekItem},
    },
    state::AppState,
    users::repo_types::User,
};

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meal/generate", post(generate_meal))
        .route("/meal/generate-week", post(generate_week))
        .route("/meal/generate-initial", post(generate_initial))
        .route("/meal/generate-initial-ai", post(generate_initial_ai))
        .route("/meal/week", get(get_week))
        .route("/meal/week-ai", get(get_week_ai))
        .route("/shopping-cart", get(get_shopping_cart))
}

pub fn cron_routes() -> Router<AppState> {
    Router::new().route("/cron/generate-next-week", get(generate_next_week))
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Exclusive end of the 7-day window; `None` past the calendar's range.
fn week_end(start: Date) -> Option<Date> {
    start.checked_add(Duration::days(DAYS_PER_WEEK))
}

/// `[start, end)` from the `weekStart` query value, or this week's Monday.
fn resolve_week(raw: Option<&str>, today: Date) -> Result<(Date, Date), ApiError> {
    let start = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_iso_date(s).map_err(|_| ApiError::bad_request("weekStart must be YYYY-MM-DD"))?,
        None => monday_of(today),
    };
    let end = week_end(start).ok_or_else(|| ApiError::bad_request("weekStart is out of range"))?;
    Ok((start, end))
}

async fn load_user(state: &AppState, id: Uuid) -> Result<User, ApiError> {
    User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

async fn allowed_pool(state: &AppState, profile: &MealProfile) -> Result<Vec<Ingredient>, ApiError> {
    let all = catalog::repo::list_ingredients(&state.db).await?;
    Ok(filter_allowed(&all, profile))
}

/// One synthesized meal, nothing stored.
#[instrument(skip(state, body))]
pub async fn generate_meal(
    State(state): State<AppState>,
    Json(body): Json<GenerateMealRequest>,
) -> Result<Json<SynthesizedMeal>, ApiError> {
    let (Some(profile), Some(meal_type)) = (body.profile, body.meal_type) else {
        return Err(ApiError::bad_request("profile and mealType are required"));
    };
    let slot: MealSlot = meal_type.parse().map_err(ApiError::bad_request)?;
    let profile = MealProfile::from(profile);

    let pool = allowed_pool(&state, &profile).await?;
    let meal = state.synthesizer.synthesize(&profile, slot.as_str(), &pool).await;
    Ok(Json(meal))
}

/// Seven days from today, synthesized on the fly; the three slots of a day
/// run concurrently.
#[instrument(skip(state, body))]
pub async fn generate_week(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(body): Json<GenerateWeekRequest>,
) -> Result<Json<Vec<EphemeralDay>>, ApiError> {
    let user_id = body
        .user_id
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;
    let user = load_user(&state, user_id).await?;
    if user.id != caller {
        warn!(%caller, target = %user.id, "week generation for another user");
        return Err(ApiError::Forbidden);
    }

    let target = user
        .calorie_target
        .filter(|c| *c > 0)
        .map(f64::from)
        .unwrap_or(DEFAULT_CALORIE_TARGET);
    let profile = MealProfile::for_user(&user, target);
    let pool = allowed_pool(&state, &profile).await?;
    let synth = &state.synthesizer;

    let mut days = Vec::with_capacity(DAYS_PER_WEEK as usize);
    for date in week_dates(today()) {
        let (breakfast, lunch, dinner) = tokio::join!(
            synth.synthesize(&profile, MealSlot::Breakfast.as_str(), &pool),
            synth.synthesize(&profile, MealSlot::Lunch.as_str(), &pool),
            synth.synthesize(&profile, MealSlot::Dinner.as_str(), &pool),
        );
        days.push(EphemeralDay {
            date,
            meals: DayMeals {
                breakfast,
                lunch,
                dinner,
            },
        });
    }
    Ok(Json(days))
}

/// Stores seven days of goal-matched recipes starting today.
#[instrument(skip(state))]
pub async fn generate_initial(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<InitialPlanResponse>, ApiError> {
    let user = load_user(&state, user_id).await?;
    let store = PgPlanStore::new(state.db.clone());
    let outcome = generate_goal_week(&store, &user, today()).await?;
    Ok(Json(InitialPlanResponse {
        success: true,
        created: outcome.created,
        skipped: outcome.skipped,
    }))
}

/// Stores seven days of synthesized recipes starting today.
#[instrument(skip(state))]
pub async fn generate_initial_ai(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<InitialAiPlanResponse>, ApiError> {
    let user = load_user(&state, user_id).await?;
    let ingredients = catalog::repo::list_ingredients(&state.db).await?;
    let store = PgPlanStore::new(state.db.clone());
    let outcome = generate_ai_week(&store, &state.synthesizer, &user, &ingredients, today()).await?;
    Ok(Json(InitialAiPlanResponse {
        success: true,
        used_gemini: state.config.ai.gemini_configured(),
        created: outcome.created,
        skipped: outcome.skipped,
    }))
}

#[instrument(skip(state))]
pub async fn get_week(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<WeekQuery>,
) -> Result<Json<Vec<WeekDay<WeekItem>>>, ApiError> {
    let (start, end) = resolve_week(q.week_start.as_deref(), today())?;
    let rows = repo::plan_cells(&state.db, user_id, start, end).await?;
    Ok(Json(group_week(rows)))
}

/// Same board as [`get_week`] but every cell is synthesized, nothing stored.
#[instrument(skip(state))]
pub async fn get_week_ai(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<WeekQuery>,
) -> Result<Json<Vec<WeekDay<AiWeekItem>>>, ApiError> {
    let (start, _) = resolve_week(q.week_start.as_deref(), today())?;
    let user = load_user(&state, user_id).await?;
    let profile = MealProfile::for_user(&user, user_per_meal_target(&user).round());
    let pool = allowed_pool(&state, &profile).await?;

    let mut days = Vec::with_capacity(DAYS_PER_WEEK as usize);
    for date in week_dates(start) {
        let mut meals = Vec::with_capacity(MealSlot::ALL.len());
        for slot in MealSlot::ALL {
            let meal = state.synthesizer.synthesize(&profile, slot.as_str(), &pool).await;
            meals.push(MealGroup {
                label: slot.label(),
                items: vec![AiWeekItem::from_meal(slot.serving_time(), meal)],
            });
        }
        days.push(WeekDay { date, meals });
    }
    Ok(Json(days))
}

#[instrument(skip(state))]
pub async fn get_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<WeekQuery>,
) -> Result<Json<ShoppingCartResponse>, ApiError> {
    let (start, end) = resolve_week(q.week_start.as_deref(), today())?;
    let rows = repo::cart_lines(&state.db, user_id, start, end).await?;
    let items = aggregate_cart(rows);
    Ok(Json(ShoppingCartResponse {
        week_start: start,
        week_end: end,
        total_items: items.len(),
        items,
    }))
}

fn cron_authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return false;
    };
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token.trim() == secret)
}

async fn plan_next_week(store: &dyn PlanStore, user: &User, monday: Date) -> anyhow::Result<CronStatus> {
    let end = week_end(monday).context("next week is out of range")?;
    if store.has_plans_between(user.id, monday, end).await? {
        return Ok(CronStatus::Exists);
    }
    generate_goal_week(store, user, monday).await?;
    Ok(CronStatus::Generated)
}

/// Batch job: fills next week for every user that has nothing planned yet.
/// A failing user is reported and the batch continues.
#[instrument(skip(state, headers))]
pub async fn generate_next_week(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CronResponse>, ApiError> {
    if !cron_authorized(&headers, state.config.cron_secret.as_deref()) {
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    let monday = next_week_monday(today());
    let users = User::list_all(&state.db).await?;
    let store = PgPlanStore::new(state.db.clone());

    let mut results = Vec::with_capacity(users.len());
    for user in &users {
        let status = match plan_next_week(&store, user, monday).await {
            Ok(status) => status,
            Err(e) => {
                error!(user_id = %user.id, error = %e, "next-week generation failed");
                CronStatus::Failed
            }
        };
        results.push(CronUserResult {
            user_id: user.id,
            status,
        });
    }

    info!(%monday, users = results.len(), "next-week generation finished");
    Ok(Json(CronResponse {
        success: true,
        results,
    }))
}
