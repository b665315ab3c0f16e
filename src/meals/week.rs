//! Calendar helpers and the weekly board built from stored plans.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Duration};

use crate::meals::repo_types::PlanCellRow;
use crate::meals::slot::MealSlot;

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

const DEFAULT_PLAN_NAME: &str = "추천 식단";

/// Monday of the week containing `day`.
pub fn monday_of(day: Date) -> Date {
    day - Duration::days(i64::from(day.weekday().number_days_from_monday()))
}

pub fn next_week_monday(today: Date) -> Date {
    monday_of(today + Duration::days(7))
}

pub fn parse_iso_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw.trim(), time::macros::format_description!("[year]-[month]-[day]"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekItem {
    pub time: &'static str,
    pub name: String,
    pub kcal: f64,
    pub recipe_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealGroup<T> {
    pub label: &'static str,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekDay<T> {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meals: Vec<MealGroup<T>>,
}

/// Groups stored cells by date, then orders each day breakfast to dinner.
/// Days without any plan are omitted.
pub fn group_week(rows: impl IntoIterator<Item = PlanCellRow>) -> Vec<WeekDay<WeekItem>> {
    let mut by_date: BTreeMap<Date, BTreeMap<MealSlot, WeekItem>> = BTreeMap::new();
    for row in rows {
        let Ok(slot) = row.slot.parse::<MealSlot>() else {
            continue;
        };
        let item = WeekItem {
            time: slot.serving_time(),
            name: row
                .recipe_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PLAN_NAME.to_string()),
            kcal: row.assigned_kcal.unwrap_or(0.0).round(),
            recipe_id: row.recipe_id,
        };
        // one recipe per cell; the first link wins
        by_date
            .entry(row.plan_date)
            .or_default()
            .entry(slot)
            .or_insert(item);
    }

    by_date
        .into_iter()
        .map(|(date, slots)| WeekDay {
            date,
            meals: slots
                .into_iter()
                .map(|(slot, item)| MealGroup {
                    label: slot.label(),
                    items: vec![item],
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn cell(d: Date, slot: &str, name: Option<&str>, kcal: Option<f64>) -> PlanCellRow {
        PlanCellRow {
            plan_date: d,
            slot: slot.into(),
            recipe_id: name.map(|_| 1),
            recipe_name: name.map(str::to_string),
            assigned_kcal: kcal,
        }
    }

    #[test]
    fn monday_anchor() {
        assert_eq!(monday_of(date!(2025 - 03 - 05)), date!(2025 - 03 - 03));
        assert_eq!(monday_of(date!(2025 - 03 - 03)), date!(2025 - 03 - 03));
        assert_eq!(monday_of(date!(2025 - 03 - 09)), date!(2025 - 03 - 03));
        assert_eq!(next_week_monday(date!(2025 - 03 - 09)), date!(2025 - 03 - 10));
    }

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(parse_iso_date("2025-01-06").unwrap(), date!(2025 - 01 - 06));
        assert!(parse_iso_date("06/01/2025").is_err());
        assert!(parse_iso_date("2025-02-30").is_err());
    }

    #[test]
    fn groups_by_day_and_orders_slots() {
        let d1 = date!(2025 - 03 - 03);
        let d2 = date!(2025 - 03 - 04);
        let week = group_week([
            cell(d2, "breakfast", Some("오트밀 죽"), Some(410.6)),
            cell(d1, "dinner", Some("연어 스테이크"), Some(702.4)),
            cell(d1, "breakfast", None, None),
            cell(d1, "lunch", Some("닭가슴살 샐러드"), Some(500.5)),
        ]);

        assert_eq!(week.len(), 2);
        assert_eq!(week[0].date, d1);
        let labels: Vec<&str> = week[0].meals.iter().map(|m| m.label).collect();
        assert_eq!(labels, vec!["아침", "점심", "저녁"]);
        assert_eq!(week[0].meals[0].items[0].name, "추천 식단");
        assert_eq!(week[0].meals[0].items[0].kcal, 0.0);
        assert_eq!(week[0].meals[1].items[0].kcal, 501.0);
        assert_eq!(week[0].meals[2].items[0].time, "18:30");
        assert_eq!(week[1].meals[0].items[0].kcal, 411.0);
    }

    #[test]
    fn dates_serialize_as_plain_days() {
        let week = group_week([cell(date!(2025 - 03 - 03), "lunch", Some("두부 요리"), Some(300.0))]);
        let json = serde_json::to_value(&week).unwrap();
        assert_eq!(json[0]["date"], "2025-03-03");
        assert_eq!(json[0]["meals"][0]["items"][0]["recipeId"], 1);
    }
}
