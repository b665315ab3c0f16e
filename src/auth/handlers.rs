use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, is_valid_email, verify_password, MIN_PASSWORD_LEN},
    },
    error::ApiError,
    state::AppState,
    users::repo_types::User,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn required(field: Option<String>) -> Option<String> {
    field.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    JwtKeys::from_ref(state).sign(user.id, &user.email).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e)
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password), Some(name)) = (
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
        required(payload.name),
    ) else {
        return Err(ApiError::bad_request("email, password and name are required"));
    };
    let email = email.to_lowercase();

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }

    if password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::bad_request("Password too short"));
    }

    // Ensure email is not taken
    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal(e)
    })?;

    let user = match User::create(&state.db, &email, &hash, &name).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %email, "email registered concurrently");
            return Err(ApiError::Conflict("Email already registered".into()));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(ApiError::Internal(e));
        }
    };

    let token = issue_token(&state, &user)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("email and password are required"));
    };
    let email = email.to_lowercase();

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let ok = verify_password(&password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        ApiError::Internal(e)
    })?;

    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = issue_token(&state, &user)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id).await?.ok_or_else(|| {
        error!(user_id = %user_id, "user not found");
        ApiError::unauthorized("User not found")
    })?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: "Kim".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"name\":\"Kim\""));
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn register_requires_all_fields() {
        let app = auth_routes().with_state(AppState::fake());
        let resp = app
            .oneshot(
                Request::post("/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"a@b.co","password":"longenough"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let app = auth_routes().with_state(AppState::fake());
        let resp = app
            .oneshot(
                Request::post("/auth/register")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"a@b.co","password":"short","name":"Kim"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_requires_token() {
        let app = me_routes().with_state(AppState::fake());
        let resp = app
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
