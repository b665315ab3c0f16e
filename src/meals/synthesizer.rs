use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::CompletionProvider;
use crate::catalog::repo_types::{Ingredient, NewRecipe, NewRecipeIngredient};
use crate::meals::prompt::build_meal_prompt;
use crate::meals::suggestion::{parse_suggestion, MealSuggestion};
use crate::nutrition::{aggregate, Macros, NutritionLine, Unit};
use crate::users::repo_types::User;

/// Number of ingredients the fallback dish is built from.
const FALLBACK_INGREDIENTS: usize = 3;
/// Grams assigned to every fallback ingredient.
const FALLBACK_AMOUNT_G: f64 = 100.0;

pub const DEFAULT_GOAL: &str = "diet";
pub const DEFAULT_CALORIE_TARGET: f64 = 1800.0;

/// What the synthesizer needs to know about the eater.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealProfile {
    pub goal: String,
    pub calorie_target: f64,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub dislike_ingredients: Vec<String>,
}

impl MealProfile {
    pub fn for_user(user: &User, calorie_target: f64) -> Self {
        Self {
            goal: user
                .goal
                .clone()
                .filter(|g| !g.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GOAL.into()),
            calorie_target,
            allergies: user.allergies.clone(),
            dislike_ingredients: user.dislike_ingredients.clone(),
        }
    }
}

/// Drops ingredients whose name matches an allergy or dislike, ignoring case.
pub fn filter_allowed(pool: &[Ingredient], profile: &MealProfile) -> Vec<Ingredient> {
    let excluded: HashSet<String> = profile
        .allergies
        .iter()
        .chain(profile.dislike_ingredients.iter())
        .map(|s| s.trim().to_lowercase())
        .collect();
    pool.iter()
        .filter(|i| !excluded.contains(&i.name.trim().to_lowercase()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealIngredient {
    pub id: i64,
    pub name: String,
    pub amount: f64,
    pub unit: Unit,
}

/// A dish suggestion, always well-formed regardless of how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizedMeal {
    pub recipe_name: String,
    pub total_calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub ingredients: Vec<MealIngredient>,
    pub steps: Vec<String>,
    pub image_url: Option<String>,
    pub source: MealSource,
    #[serde(skip)]
    pub provider: Option<&'static str>,
}

impl SynthesizedMeal {
    fn from_suggestion(s: MealSuggestion, provider: &'static str) -> Self {
        Self {
            recipe_name: s.recipe_name,
            total_calories: s.totals.kcal.round(),
            protein: s.totals.protein.round(),
            carbs: s.totals.carbs.round(),
            fat: s.totals.fat.round(),
            ingredients: s
                .ingredients
                .into_iter()
                .map(|i| MealIngredient {
                    id: i.ingredient_id,
                    name: i.name,
                    amount: i.amount,
                    unit: i.unit,
                })
                .collect(),
            steps: s.steps,
            image_url: s.image_url,
            source: MealSource::Ai,
            provider: Some(provider),
        }
    }

    /// Nutrition recomputed from the pool's own data rather than the
    /// provider's claimed totals.
    pub fn computed_macros(&self, pool: &[Ingredient]) -> Macros {
        aggregate(self.ingredients.iter().map(|part| NutritionLine {
            nutrition: pool
                .iter()
                .find(|i| i.id == part.id)
                .and_then(|i| i.nutrition.as_ref()),
            amount: part.amount,
            unit: part.unit.as_str(),
        }))
    }

    pub fn to_new_recipe(&self) -> NewRecipe {
        NewRecipe {
            name: self.recipe_name.clone(),
            image_url: self.image_url.clone(),
            steps: self.steps.clone(),
            ingredients: self
                .ingredients
                .iter()
                .map(|i| NewRecipeIngredient {
                    ingredient_id: i.id,
                    amount: i.amount,
                    unit: i.unit.as_str().to_string(),
                })
                .collect(),
        }
    }
}

fn dish_suffix(main: &str) -> &'static str {
    const PORRIDGE: &[&str] = &["오트밀", "귀리", "oat", "porridge"];
    const STEAK: &[&str] = &[
        "연어", "안심", "등심", "스테이크", "소고기", "쇠고기", "salmon", "steak", "beef",
    ];
    const SALAD: &[&str] = &[
        "닭가슴살",
        "샐러드채소",
        "상추",
        "양상추",
        "야채",
        "chicken breast",
        "lettuce",
        "salad",
    ];

    let main = main.to_lowercase();
    let hits = |words: &[&str]| words.iter().any(|w| main.contains(w));
    if hits(PORRIDGE) {
        "죽"
    } else if hits(STEAK) {
        "스테이크"
    } else if hits(SALAD) {
        "샐러드"
    } else {
        "요리"
    }
}

/// Deterministic dish from the first few allowed ingredients, 100 g each.
pub fn fallback_meal(pool: &[Ingredient]) -> SynthesizedMeal {
    let base = &pool[..pool.len().min(FALLBACK_INGREDIENTS)];

    let totals = aggregate(base.iter().map(|i| NutritionLine {
        nutrition: i.nutrition.as_ref(),
        amount: FALLBACK_AMOUNT_G,
        unit: Unit::Gram.as_str(),
    }))
    .rounded();

    let first = base.first().map(|i| i.name.as_str()).unwrap_or("영양");
    let suffix = dish_suffix(first);
    let recipe_name = match base.get(1) {
        Some(second) => format!("{first} {} {suffix}", second.name),
        None => format!("{first} {suffix}"),
    };

    SynthesizedMeal {
        recipe_name,
        total_calories: totals.kcal,
        protein: totals.protein,
        carbs: totals.carbs,
        fat: totals.fat,
        ingredients: base
            .iter()
            .map(|i| MealIngredient {
                id: i.id,
                name: i.name.clone(),
                amount: FALLBACK_AMOUNT_G,
                unit: Unit::Gram,
            })
            .collect(),
        steps: Vec::new(),
        image_url: None,
        source: MealSource::Fallback,
        provider: None,
    }
}

/// Tries each configured provider in priority order and falls back to
/// [`fallback_meal`]. Provider failures are logged, never returned.
pub struct MealSynthesizer {
    providers: Vec<Arc<dyn CompletionProvider>>,
}

impl MealSynthesizer {
    pub fn new(providers: Vec<Arc<dyn CompletionProvider>>) -> Self {
        Self { providers }
    }

    async fn try_provider(
        provider: &dyn CompletionProvider,
        prompt: &str,
        pool: &[Ingredient],
    ) -> anyhow::Result<SynthesizedMeal> {
        let text = provider.complete(prompt).await?;
        let suggestion = parse_suggestion(&text, pool)?;
        Ok(SynthesizedMeal::from_suggestion(suggestion, provider.name()))
    }

    /// `pool` must already be filtered for the profile.
    pub async fn synthesize(
        &self,
        profile: &MealProfile,
        slot_label: &str,
        pool: &[Ingredient],
    ) -> SynthesizedMeal {
        if !pool.is_empty() && !self.providers.is_empty() {
            let prompt = build_meal_prompt(profile, slot_label, pool);
            for provider in &self.providers {
                match Self::try_provider(provider.as_ref(), &prompt, pool).await {
                    Ok(meal) => {
                        info!(provider = provider.name(), slot = slot_label, recipe = %meal.recipe_name, "meal suggested");
                        return meal;
                    }
                    Err(e) => {
                        warn!(provider = provider.name(), slot = slot_label, error = %e, "provider failed; trying next");
                    }
                }
            }
        }
        debug!(slot = slot_label, pool = pool.len(), "using fallback meal");
        fallback_meal(pool)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Provider that replays a fixed answer (or failure) and counts calls.
    pub struct ScriptedProvider {
        pub name: &'static str,
        pub answer: Result<String, String>,
        pub calls: AtomicUsize,
    }

    impl ScriptedProvider {
        pub fn ok(name: &'static str, answer: &str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: Ok(answer.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer: Err("connection refused".to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    pub fn chain(providers: &[Arc<ScriptedProvider>]) -> Vec<Arc<dyn CompletionProvider>> {
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn CompletionProvider>)
            .collect()
    }

    pub fn ingredient(id: i64, name: &str, kcal: f64) -> Ingredient {
        Ingredient {
            id,
            name: name.into(),
            category: Some("기타".into()),
            nutrition: Some(Macros {
                kcal,
                protein: kcal / 10.0,
                carbs: kcal / 20.0,
                fat: kcal / 40.0,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn profile() -> MealProfile {
        MealProfile {
            goal: "diet".into(),
            calorie_target: 500.0,
            allergies: vec!["Peanut".into()],
            dislike_ingredients: vec!["오이".into()],
        }
    }

    const AI_ANSWER: &str = r#"```json
{"recipe_name":"닭가슴살 현미밥","total_calories":480,"protein":40,"carbs":50,"fat":8,
 "ingredients":[{"id":1,"amount":150,"unit":"g"},{"id":2,"amount":200,"unit":"g"}],
 "steps":["굽는다"]}
```"#;

    #[test]
    fn filter_is_case_insensitive_exact_match() {
        let pool = vec![
            ingredient(1, "peanut", 500.0),
            ingredient(2, "오이", 15.0),
            ingredient(3, "peanut butter", 600.0),
        ];
        let allowed = filter_allowed(&pool, &profile());
        let ids: Vec<i64> = allowed.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn fallback_uses_first_three_in_order() {
        let pool = vec![
            ingredient(1, "오트밀", 380.0),
            ingredient(2, "우유", 60.0),
            ingredient(3, "바나나", 90.0),
            ingredient(4, "꿀", 300.0),
        ];
        let meal = fallback_meal(&pool);
        assert_eq!(meal.recipe_name, "오트밀 우유 죽");
        assert_eq!(meal.ingredients.len(), 3);
        assert!(meal.ingredients.iter().all(|i| i.amount == 100.0 && i.unit == Unit::Gram));
        assert_eq!(meal.total_calories, 530.0);
        assert_eq!(meal.source, MealSource::Fallback);
    }

    #[test]
    fn fallback_with_fewer_ingredients_uses_them_all() {
        let meal = fallback_meal(&[ingredient(5, "소고기 등심", 250.0)]);
        assert_eq!(meal.ingredients.len(), 1);
        assert_eq!(meal.recipe_name, "소고기 등심 스테이크");

        let meal = fallback_meal(&[ingredient(6, "닭가슴살", 165.0), ingredient(7, "현미", 110.0)]);
        assert_eq!(meal.ingredients.len(), 2);
        assert_eq!(meal.recipe_name, "닭가슴살 현미 샐러드");
    }

    #[test]
    fn fallback_with_empty_pool_is_still_well_formed() {
        let meal = fallback_meal(&[]);
        assert_eq!(meal.recipe_name, "영양 요리");
        assert!(meal.ingredients.is_empty());
        assert_eq!(meal.total_calories, 0.0);
    }

    #[test]
    fn generic_suffix_when_no_keyword_matches() {
        assert_eq!(fallback_meal(&[ingredient(1, "두부", 80.0)]).recipe_name, "두부 요리");
    }

    #[tokio::test]
    async fn no_providers_means_fallback() {
        let synth = MealSynthesizer::new(vec![]);
        let pool = vec![ingredient(1, "두부", 80.0)];
        let meal = synth.synthesize(&profile(), "lunch", &pool).await;
        assert_eq!(meal.source, MealSource::Fallback);
    }

    #[tokio::test]
    async fn first_successful_provider_wins() {
        let first = ScriptedProvider::failing("gemini");
        let second = ScriptedProvider::ok("openai", AI_ANSWER);
        let synth = MealSynthesizer::new(chain(&[first.clone(), second.clone()]));
        let pool = vec![ingredient(1, "닭가슴살", 165.0), ingredient(2, "현미밥", 150.0)];

        let meal = synth.synthesize(&profile(), "dinner", &pool).await;
        assert_eq!(meal.source, MealSource::Ai);
        assert_eq!(meal.provider, Some("openai"));
        assert_eq!(meal.recipe_name, "닭가슴살 현미밥");
        assert_eq!(meal.ingredients[1].name, "현미밥");
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 1);
    }

    #[tokio::test]
    async fn garbage_from_every_provider_falls_back() {
        let a = ScriptedProvider::ok("gemini", "Sure! Here is a tasty meal.");
        let b = ScriptedProvider::ok("openai", r#"{"recipe_name":"x","ingredients":[{"id":42,"amount":1}]}"#);
        let synth = MealSynthesizer::new(chain(&[a, b]));
        let pool = vec![ingredient(1, "두부", 80.0)];
        let meal = synth.synthesize(&profile(), "breakfast", &pool).await;
        assert_eq!(meal.source, MealSource::Fallback);
        assert_eq!(meal.recipe_name, "두부 요리");
    }

    #[tokio::test]
    async fn empty_pool_skips_providers() {
        let p = ScriptedProvider::ok("gemini", AI_ANSWER);
        let synth = MealSynthesizer::new(chain(&[p.clone()]));
        let meal = synth.synthesize(&profile(), "lunch", &[]).await;
        assert_eq!(meal.source, MealSource::Fallback);
        assert_eq!(p.call_count(), 0);
    }

    #[test]
    fn computed_macros_use_pool_nutrition() {
        let pool = vec![ingredient(1, "닭가슴살", 165.0), ingredient(2, "계란", 70.0)];
        let meal = SynthesizedMeal {
            recipe_name: "x".into(),
            total_calories: 9999.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            ingredients: vec![
                MealIngredient {
                    id: 1,
                    name: "닭가슴살".into(),
                    amount: 200.0,
                    unit: Unit::Gram,
                },
                MealIngredient {
                    id: 2,
                    name: "계란".into(),
                    amount: 2.0,
                    unit: Unit::Piece,
                },
            ],
            steps: vec![],
            image_url: None,
            source: MealSource::Ai,
            provider: Some("gemini"),
        };
        let m = meal.computed_macros(&pool);
        assert!((m.kcal - (330.0 + 140.0)).abs() < 1e-9);
        let recipe = meal.to_new_recipe();
        assert_eq!(recipe.ingredients[1].unit, "piece");
    }
}
