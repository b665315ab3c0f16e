pub mod targets;

use serde::{Deserialize, Serialize};

/// Energy and macronutrients, either per reference unit (100 g / 100 ml /
/// one piece) or as an absolute total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Rough meal estimate used when a recipe carries no usable nutrition data.
pub const DEFAULT_MEAL_ESTIMATE: Macros = Macros {
    kcal: 600.0,
    protein: 30.0,
    carbs: 60.0,
    fat: 20.0,
};

impl Macros {
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            kcal: self.kcal * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
        }
    }

    pub fn rounded(self) -> Self {
        Self {
            kcal: self.kcal.round(),
            protein: self.protein.round(),
            carbs: self.carbs.round(),
            fat: self.fat.round(),
        }
    }

    /// Substitutes [`DEFAULT_MEAL_ESTIMATE`] for a non-positive total.
    pub fn or_default_estimate(self) -> Self {
        if self.kcal > 0.0 {
            self
        } else {
            DEFAULT_MEAL_ESTIMATE
        }
    }
}

impl std::ops::Add for Macros {
    type Output = Macros;

    fn add(self, rhs: Self) -> Self {
        Self {
            kcal: self.kcal + rhs.kcal,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl std::ops::AddAssign for Macros {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Macros {
    fn sum<I: Iterator<Item = Macros>>(iter: I) -> Self {
        iter.fold(Macros::default(), |acc, m| acc + m)
    }
}

/// Units accepted from meal suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "ml")]
    Milliliter,
    Piece,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Milliliter => "ml",
            Unit::Piece => "piece",
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g" | "gram" | "grams" => Ok(Unit::Gram),
            "ml" | "milliliter" | "milliliters" => Ok(Unit::Milliliter),
            "piece" | "pieces" | "pc" | "pcs" => Ok(Unit::Piece),
            other => Err(format!("unknown unit {other:?}")),
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_piece_unit(unit: &str) -> bool {
    unit.trim().eq_ignore_ascii_case("piece")
}

/// Multiplier applied to per-reference nutrition for `amount` of `unit`.
///
/// Nutrition is stored per 100 g/ml, except for discrete pieces where it is
/// stored per piece, so a piece amount multiplies directly.
pub fn scale_factor(amount: f64, unit: &str) -> f64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    if is_piece_unit(unit) {
        amount
    } else {
        amount / 100.0
    }
}

/// One ingredient line of a recipe or meal.
#[derive(Debug, Clone, Copy)]
pub struct NutritionLine<'a> {
    pub nutrition: Option<&'a Macros>,
    pub amount: f64,
    pub unit: &'a str,
}

/// Sums scaled nutrition over all lines. Lines without nutrition data
/// contribute nothing.
pub fn aggregate<'a, I>(lines: I) -> Macros
where
    I: IntoIterator<Item = NutritionLine<'a>>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            line.nutrition
                .map(|n| n.scaled(scale_factor(line.amount, line.unit)))
        })
        .sum()
}
