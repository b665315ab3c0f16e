use serde::Deserialize;

use crate::nutrition::targets::body_mass_index;
use crate::users::repo_types::ProfilePatch;

/// Body of `PUT /api/user/:id`. Height and weight arrive camelCased from the
/// profile page.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub goal: Option<String>,
    pub calorie_target: Option<i32>,
    pub allergies: Option<Vec<String>>,
    pub dislike_ingredients: Option<Vec<String>>,
    #[serde(rename = "heightCm", alias = "height_cm")]
    pub height_cm: Option<f64>,
    #[serde(rename = "weightKg", alias = "weight_kg")]
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub disease: Option<String>,
}

impl From<UpdateProfileRequest> for ProfilePatch {
    fn from(r: UpdateProfileRequest) -> Self {
        let bmi = body_mass_index(r.height_cm, r.weight_kg).or(r.bmi);
        Self {
            name: r.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            gender: r.gender,
            age: r.age,
            goal: r.goal,
            calorie_target: r.calorie_target,
            allergies: r.allergies.unwrap_or_default(),
            dislike_ingredients: r.dislike_ingredients.unwrap_or_default(),
            height_cm: r.height_cm,
            weight_kg: r.weight_kg,
            bmi,
            disease: r.disease,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_bmi_and_defaults_lists() {
        let req: UpdateProfileRequest = serde_json::from_str(
            r#"{"name":" Kim ","goal":"다이어트","heightCm":180,"weightKg":81,"bmi":99}"#,
        )
        .unwrap();
        let patch = ProfilePatch::from(req);
        assert_eq!(patch.name.as_deref(), Some("Kim"));
        assert_eq!(patch.bmi, Some(25.0));
        assert!(patch.allergies.is_empty());
        assert!(patch.dislike_ingredients.is_empty());
    }

    #[test]
    fn keeps_supplied_bmi_without_measurements() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"bmi":21.3,"allergies":["땅콩"]}"#).unwrap();
        let patch = ProfilePatch::from(req);
        assert_eq!(patch.bmi, Some(21.3));
        assert_eq!(patch.allergies, vec!["땅콩".to_string()]);
        assert_eq!(patch.name, None);
    }

    #[test]
    fn accepts_snake_case_measurements() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"height_cm":170,"weight_kg":65}"#).unwrap();
        assert_eq!(ProfilePatch::from(req).bmi, Some(22.5));
    }
}
