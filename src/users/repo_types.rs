use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::targets::{BodyMetrics, Goal};

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub name: String,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub goal: Option<String>,
    pub calorie_target: Option<i32>,
    pub allergies: Vec<String>,
    pub dislike_ingredients: Vec<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub disease: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn body_metrics(&self) -> BodyMetrics {
        BodyMetrics {
            gender: self.gender.clone(),
            age: self.age,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
        }
    }

    pub fn parsed_goal(&self) -> Option<Goal> {
        self.goal.as_deref().and_then(Goal::parse)
    }
}

/// Editable profile fields from a profile update.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub goal: Option<String>,
    pub calorie_target: Option<i32>,
    pub allergies: Vec<String>,
    pub dislike_ingredients: Vec<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub disease: Option<String>,
}

impl ProfilePatch {
    /// Merges the patch into `user`. Absent `name`, `gender`, `age`, `goal`
    /// and `calorie_target` keep their stored values; the lists,
    /// measurements, BMI and disease notes are replaced as sent.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if self.gender.is_some() {
            user.gender = self.gender.clone();
        }
        if self.age.is_some() {
            user.age = self.age;
        }
        if self.goal.is_some() {
            user.goal = self.goal.clone();
        }
        if self.calorie_target.is_some() {
            user.calorie_target = self.calorie_target;
        }
        user.allergies = self.allergies.clone();
        user.dislike_ingredients = self.dislike_ingredients.clone();
        user.height_cm = self.height_cm;
        user.weight_kg = self.weight_kg;
        user.bmi = self.bmi;
        user.disease = self.disease.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn stored() -> User {
        User {
            id: Uuid::new_v4(),
            email: "kim@example.com".into(),
            password_hash: String::new(),
            name: "Kim".into(),
            gender: Some("female".into()),
            age: Some(34),
            goal: Some("다이어트".into()),
            calorie_target: Some(1600),
            allergies: vec!["새우".into()],
            dislike_ingredients: vec!["오이".into()],
            height_cm: Some(165.0),
            weight_kg: Some(60.0),
            bmi: Some(22.0),
            disease: Some("none".into()),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn absent_identity_fields_keep_stored_values() {
        let mut user = stored();
        let patch = ProfilePatch {
            allergies: vec!["땅콩".into()],
            ..ProfilePatch::default()
        };
        patch.apply_to(&mut user);

        assert_eq!(user.name, "Kim");
        assert_eq!(user.gender.as_deref(), Some("female"));
        assert_eq!(user.age, Some(34));
        assert_eq!(user.goal.as_deref(), Some("다이어트"));
        assert_eq!(user.calorie_target, Some(1600));
        assert_eq!(user.allergies, vec!["땅콩".to_string()]);
        assert!(user.dislike_ingredients.is_empty());
        assert_eq!(user.height_cm, None);
        assert_eq!(user.bmi, None);
        assert_eq!(user.disease, None);
    }

    #[test]
    fn present_fields_overwrite() {
        let mut user = stored();
        let patch = ProfilePatch {
            name: Some("Lee".into()),
            goal: Some("벌크업".into()),
            age: Some(35),
            height_cm: Some(170.0),
            weight_kg: Some(65.0),
            bmi: Some(22.5),
            ..ProfilePatch::default()
        };
        patch.apply_to(&mut user);

        assert_eq!(user.name, "Lee");
        assert_eq!(user.goal.as_deref(), Some("벌크업"));
        assert_eq!(user.age, Some(35));
        assert_eq!(user.gender.as_deref(), Some("female"));
        assert_eq!(user.bmi, Some(22.5));
    }
}
