use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::Utc;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::models::event::{CreateEventRequest, Event, EventFilter, UpdateEventRequest};
use crate::state::AppState;
use crate::utils::auth::{AdminUser, AuthUser};
use crate::utils::error::AppError;
use crate::utils::pagination::{PageParams, Pagination};
use crate::utils::response::{created, empty_success, success};

const EVENT_SELECT: &str = "SELECT id, title, description, start_time, location, category, \
     image_url, total_seats, available_seats, price, is_active, created_by, created_at, \
     updated_at FROM events";

pub async fn list_events(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
    Query(filter): Query<EventFilter>,
) -> Result<Response, AppError> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM events WHERE is_active = TRUE");
    push_filters(&mut count_query, &filter);
    let (total,): (i64,) = count_query.build_query_as().fetch_one(&state.pool).await?;

    let mut query = QueryBuilder::new(EVENT_SELECT);
    query.push(" WHERE is_active = TRUE");
    push_filters(&mut query, &filter);
    query
        .push(" ORDER BY start_time ASC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let events: Vec<Event> = query.build_query_as().fetch_all(&state.pool).await?;

    Ok(success(
        serde_json::json!({
            "events": events,
            "pagination": Pagination::new(page, total),
        }),
        "Events retrieved successfully",
    ))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event: Option<Event> =
        sqlx::query_as(&format!("{EVENT_SELECT} WHERE id = $1 AND is_active = TRUE"))
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    let event = event.ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    Ok(success(
        serde_json::json!({ "event": event }),
        "Event retrieved successfully",
    ))
}

pub async fn create_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    axum::Json(payload): axum::Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    payload.validate(Utc::now())?;

    // available_seats starts at full capacity
    let event: Event = sqlx::query_as(
        "INSERT INTO events (id, title, description, start_time, location, category, \
         image_url, total_seats, available_seats, price, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10) \
         RETURNING id, title, description, start_time, location, category, image_url, \
         total_seats, available_seats, price, is_active, created_by, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(payload.title.trim())
    .bind(payload.description.trim())
    .bind(payload.start_time)
    .bind(payload.location.trim())
    .bind(payload.category.as_deref())
    .bind(payload.image_url.as_deref())
    .bind(payload.total_seats)
    .bind(payload.price)
    .bind(admin.id)
    .fetch_one(&state.pool)
    .await?;

    Ok(created(
        serde_json::json!({ "event": event }),
        "Event created successfully",
    ))
}

pub async fn update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateEventRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    // Capacity edits race with reservations, so the event row is locked the
    // same way the ledger locks it.
    let mut tx = state.pool.begin().await?;

    let event: Option<Event> = sqlx::query_as(&format!("{EVENT_SELECT} WHERE id = $1 FOR UPDATE"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let event = event.ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    if event.created_by != auth.id && !auth.is_admin() {
        return Err(AppError::Forbidden(
            "You can only update your own events".to_string(),
        ));
    }

    let mut available_seats = event.available_seats;
    let total_seats = payload.total_seats.unwrap_or(event.total_seats);
    if total_seats != event.total_seats {
        let (confirmed,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if confirmed > 0 && total_seats < event.total_seats {
            return Err(AppError::InvalidState(
                "Cannot reduce total seats when there are confirmed bookings".to_string(),
            ));
        }

        // Keep the booked count constant, only the headroom changes.
        let booked = event.total_seats - event.available_seats;
        available_seats = total_seats - booked;
    }

    let updated: Event = sqlx::query_as(
        "UPDATE events SET \
         title = COALESCE($2, title), description = COALESCE($3, description), \
         start_time = COALESCE($4, start_time), location = COALESCE($5, location), \
         category = COALESCE($6, category), image_url = COALESCE($7, image_url), \
         total_seats = $8, available_seats = $9, price = COALESCE($10, price), \
         updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, title, description, start_time, location, category, image_url, \
         total_seats, available_seats, price, is_active, created_by, created_at, updated_at",
    )
    .bind(id)
    .bind(payload.title.as_deref())
    .bind(payload.description.as_deref())
    .bind(payload.start_time)
    .bind(payload.location.as_deref())
    .bind(payload.category.as_deref())
    .bind(payload.image_url.as_deref())
    .bind(total_seats)
    .bind(available_seats)
    .bind(payload.price)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(success(
        serde_json::json!({ "event": updated }),
        "Event updated successfully",
    ))
}

pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event: Option<Event> = sqlx::query_as(&format!("{EVENT_SELECT} WHERE id = $1"))
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let event = event.ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    if event.created_by != auth.id && !auth.is_admin() {
        return Err(AppError::Forbidden(
            "You can only delete your own events".to_string(),
        ));
    }

    let (confirmed,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM bookings WHERE event_id = $1 AND status = 'confirmed'",
    )
    .bind(id)
    .fetch_one(&state.pool)
    .await?;
    if confirmed > 0 {
        return Err(AppError::InvalidState(
            "Cannot delete event with confirmed bookings".to_string(),
        ));
    }

    // Soft delete; the row stays for history.
    sqlx::query("UPDATE events SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(empty_success("Event deleted successfully"))
}

pub async fn my_events(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(page): Query<PageParams>,
) -> Result<Response, AppError> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events WHERE created_by = $1")
        .bind(admin.id)
        .fetch_one(&state.pool)
        .await?;

    let events: Vec<Event> = sqlx::query_as(&format!(
        "{EVENT_SELECT} WHERE created_by = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(admin.id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.pool)
    .await?;

    Ok(success(
        serde_json::json!({
            "events": events,
            "pagination": Pagination::new(page, total),
        }),
        "Your events retrieved successfully",
    ))
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &EventFilter) {
    if let Some(category) = &filter.category {
        query
            .push(" AND category ILIKE ")
            .push_bind(format!("%{category}%"));
    }
    if let Some(location) = &filter.location {
        query
            .push(" AND location ILIKE ")
            .push_bind(format!("%{location}%"));
    }
    if let Some(start_date) = filter.start_date {
        query.push(" AND start_time >= ").push_bind(start_date);
    }
    if let Some(end_date) = filter.end_date {
        query.push(" AND start_time <= ").push_bind(end_date);
    }
    if let Some(min_price) = filter.min_price {
        query.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        query.push(" AND price <= ").push_bind(max_price);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        query
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
