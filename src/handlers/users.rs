use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Utc;
use serde::Deserialize;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::models::user::{UpdateRoleRequest, User, UserProfile, UserRole};
use crate::state::AppState;
use crate::utils::auth::AdminUser;
use crate::utils::error::AppError;
use crate::utils::pagination::{PageParams, Pagination};
use crate::utils::response::{empty_success, success};

const USER_SELECT: &str = "SELECT id, first_name, last_name, email, password_hash, role, \
     is_active, last_login, created_at, updated_at FROM users";

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(page): Query<PageParams>,
    Query(filter): Query<UserFilter>,
) -> Result<Response, AppError> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
    push_filters(&mut count_query, &filter);
    let (total,): (i64,) = count_query.build_query_as().fetch_one(&state.pool).await?;

    let mut query = QueryBuilder::new(USER_SELECT);
    query.push(" WHERE TRUE");
    push_filters(&mut query, &filter);
    query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let users: Vec<User> = query.build_query_as().fetch_all(&state.pool).await?;
    let users: Vec<UserProfile> = users.into_iter().map(UserProfile::from).collect();

    Ok(success(
        serde_json::json!({
            "users": users,
            "pagination": Pagination::new(page, total),
        }),
        "Users retrieved successfully",
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let user: Option<User> = sqlx::query_as(&format!("{USER_SELECT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let user = user.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let (created_events,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM events WHERE created_by = $1")
            .bind(id)
            .fetch_one(&state.pool)
            .await?;
    let (confirmed_bookings,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM bookings WHERE user_id = $1 AND status = 'confirmed'",
    )
    .bind(id)
    .fetch_one(&state.pool)
    .await?;

    Ok(success(
        serde_json::json!({
            "user": UserProfile::from(user),
            "created_events": created_events,
            "confirmed_bookings": confirmed_bookings,
        }),
        "User retrieved successfully",
    ))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateRoleRequest>,
) -> Result<Response, AppError> {
    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 \
         RETURNING id, first_name, last_name, email, password_hash, role, is_active, \
         last_login, created_at, updated_at",
    )
    .bind(id)
    .bind(payload.role)
    .fetch_optional(&state.pool)
    .await?;
    let user = user.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(success(
        serde_json::json!({ "user": UserProfile::from(user) }),
        "User role updated successfully",
    ))
}

pub async fn toggle_user_status(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET is_active = NOT is_active, updated_at = NOW() WHERE id = $1 \
         RETURNING id, first_name, last_name, email, password_hash, role, is_active, \
         last_login, created_at, updated_at",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;
    let user = user.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let message = if user.is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    Ok(success(serde_json::json!({ "user": UserProfile::from(user) }), message))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let user: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    if user.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let (active_bookings,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM bookings WHERE user_id = $1 AND status = 'confirmed'",
    )
    .bind(id)
    .fetch_one(&state.pool)
    .await?;
    if active_bookings > 0 {
        return Err(AppError::InvalidState(
            "Cannot delete user with active bookings".to_string(),
        ));
    }

    let (upcoming_events,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM events \
         WHERE created_by = $1 AND is_active = TRUE AND start_time > $2",
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_one(&state.pool)
    .await?;
    if upcoming_events > 0 {
        return Err(AppError::InvalidState(
            "Cannot delete user with upcoming events".to_string(),
        ));
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(empty_success("User deleted successfully"))
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        query.push(" AND role = ").push_bind(role);
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
}
