use sqlx::PgPool;
use uuid::Uuid;

use crate::users::repo_types::{ProfilePatch, User};

const USER_COLUMNS: &str = r#"
    id, email, password_hash, name, gender, age, goal, calorie_target,
    allergies, dislike_ingredients, height_cm, weight_kg, bmi, disease, created_at
"#;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(db).await?;
        Ok(users)
    }

    /// Create a new user with hashed password.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> anyhow::Result<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(name)
            .fetch_one(db)
            .await?;
        Ok(user)
    }

    /// Applies a profile patch under a row lock; see [`ProfilePatch::apply_to`]
    /// for which fields survive when absent.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        patch: &ProfilePatch,
    ) -> anyhow::Result<Option<User>> {
        let mut tx = db.begin().await?;

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        let Some(mut user) = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        patch.apply_to(&mut user);

        let sql = format!(
            r#"
            UPDATE users
               SET name = $2,
                   gender = $3,
                   age = $4,
                   goal = $5,
                   calorie_target = $6,
                   allergies = $7,
                   dislike_ingredients = $8,
                   height_cm = $9,
                   weight_kg = $10,
                   bmi = $11,
                   disease = $12
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&user.name)
            .bind(&user.gender)
            .bind(user.age)
            .bind(&user.goal)
            .bind(user.calorie_target)
            .bind(&user.allergies)
            .bind(&user.dislike_ingredients)
            .bind(user.height_cm)
            .bind(user.weight_kg)
            .bind(user.bmi)
            .bind(&user.disease)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }
}
