use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three planned meals of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }

    /// Label shown in the weekly board.
    pub fn label(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "아침",
            MealSlot::Lunch => "점심",
            MealSlot::Dinner => "저녁",
        }
    }

    pub fn serving_time(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "08:00",
            MealSlot::Lunch => "12:30",
            MealSlot::Dinner => "18:30",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            other => match other {
                "아침" => Ok(MealSlot::Breakfast),
                "점심" => Ok(MealSlot::Lunch),
                "저녁" => Ok(MealSlot::Dinner),
                _ => Err(format!("unknown meal slot {s:?}")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_english_and_korean_labels() {
        assert_eq!("Breakfast".parse::<MealSlot>(), Ok(MealSlot::Breakfast));
        assert_eq!("저녁".parse::<MealSlot>(), Ok(MealSlot::Dinner));
        assert!("snack".parse::<MealSlot>().is_err());
    }

    #[test]
    fn slots_are_ordered_through_the_day() {
        let mut slots = vec![MealSlot::Dinner, MealSlot::Breakfast, MealSlot::Lunch];
        slots.sort();
        assert_eq!(slots, MealSlot::ALL.to_vec());
    }
}
