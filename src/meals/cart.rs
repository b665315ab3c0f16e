use std::collections::HashMap;

use serde::Serialize;

use crate::meals::repo_types::CartLineRow;

const DEFAULT_UNIT: &str = "g";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub total_amount: f64,
}

fn normalized_unit(unit: Option<&str>) -> String {
    match unit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(u) => u.to_lowercase(),
        None => DEFAULT_UNIT.to_string(),
    }
}

/// Sums portion-scaled ingredient amounts per (ingredient, unit), ordered by
/// category. Items sharing a category keep first-seen order.
pub fn aggregate_cart(rows: impl IntoIterator<Item = CartLineRow>) -> Vec<CartItem> {
    let mut index: HashMap<(i64, String), usize> = HashMap::new();
    let mut items: Vec<CartItem> = Vec::new();

    for row in rows {
        let unit = normalized_unit(row.unit.as_deref());
        let amount = row.amount.unwrap_or(0.0) * row.portion_multiplier.unwrap_or(1.0);
        match index.get(&(row.ingredient_id, unit.clone())) {
            Some(&i) => items[i].total_amount += amount,
            None => {
                index.insert((row.ingredient_id, unit.clone()), items.len());
                items.push(CartItem {
                    id: row.ingredient_id,
                    name: row.name,
                    category: row.category,
                    unit,
                    total_amount: amount,
                });
            }
        }
    }

    items.sort_by(|a, b| {
        a.category
            .as_deref()
            .unwrap_or("")
            .cmp(b.category.as_deref().unwrap_or(""))
    });
    items
}
