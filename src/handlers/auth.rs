use axum::extract::State;
use axum::response::Response;
use chrono::Utc;

use crate::models::user::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest, User, UserProfile,
};
use crate::state::AppState;
use crate::utils::auth::{hash_password, issue_token, verify_password, AuthUser};
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

const USER_SELECT: &str = "SELECT id, first_name, last_name, email, password_hash, role, \
     is_active, last_login, created_at, updated_at FROM users";

pub async fn register(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<RegisterRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let existing: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let user: User = sqlx::query_as(
        "INSERT INTO users (id, first_name, last_name, email, password_hash) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, first_name, last_name, email, password_hash, role, is_active, \
         last_login, created_at, updated_at",
    )
    .bind(uuid::Uuid::new_v4())
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(&payload.email)
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await?;

    let token = issue_token(&user, &state.config.jwt_secret)?;

    Ok(created(
        serde_json::json!({
            "user": UserProfile::from(user),
            "token": token,
        }),
        "User registered successfully",
    ))
}

pub async fn login(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<LoginRequest>,
) -> Result<Response, AppError> {
    let user: Option<User> = sqlx::query_as(&format!("{USER_SELECT} WHERE email = $1"))
        .bind(&payload.email)
        .fetch_optional(&state.pool)
        .await?;

    // Same error for unknown email and wrong password.
    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => return Err(AppError::AuthError("Invalid email or password".to_string())),
    };

    if !user.is_active {
        return Err(AppError::AuthError("Account is deactivated".to_string()));
    }

    sqlx::query("UPDATE users SET last_login = $2, updated_at = NOW() WHERE id = $1")
        .bind(user.id)
        .bind(Utc::now())
        .execute(&state.pool)
        .await?;

    let token = issue_token(&user, &state.config.jwt_secret)?;

    Ok(success(
        serde_json::json!({
            "user": UserProfile::from(user),
            "token": token,
        }),
        "Login successful",
    ))
}

pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Response, AppError> {
    let user: User = sqlx::query_as(&format!("{USER_SELECT} WHERE id = $1"))
        .bind(auth.id)
        .fetch_one(&state.pool)
        .await?;

    Ok(success(
        serde_json::json!({ "user": UserProfile::from(user) }),
        "Profile retrieved successfully",
    ))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    axum::Json(payload): axum::Json<UpdateProfileRequest>,
) -> Result<Response, AppError> {
    let user: User = sqlx::query_as(
        "UPDATE users SET \
         first_name = COALESCE($2, first_name), last_name = COALESCE($3, last_name), \
         updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, first_name, last_name, email, password_hash, role, is_active, \
         last_login, created_at, updated_at",
    )
    .bind(auth.id)
    .bind(payload.first_name.as_deref())
    .bind(payload.last_name.as_deref())
    .fetch_one(&state.pool)
    .await?;

    Ok(success(
        serde_json::json!({ "user": UserProfile::from(user) }),
        "Profile updated successfully",
    ))
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    axum::Json(payload): axum::Json<ChangePasswordRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let user: User = sqlx::query_as(&format!("{USER_SELECT} WHERE id = $1"))
        .bind(auth.id)
        .fetch_one(&state.pool)
        .await?;

    if !verify_password(&payload.current_password, &user.password_hash) {
        return Err(AppError::ValidationError(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(auth.id)
        .bind(&new_hash)
        .execute(&state.pool)
        .await?;

    Ok(empty_success("Password changed successfully"))
}
