use axum::extract::{Path, Query, State};
use axum::response::Response;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder};
use uuid::Uuid;

use crate::ledger::{ReleaseSeats, ReserveSeats};
use crate::models::booking::{Booking, BookingStatus, CancelBookingRequest, CreateBookingRequest};
use crate::state::AppState;
use crate::utils::auth::{AdminUser, AuthUser};
use crate::utils::error::AppError;
use crate::utils::pagination::{PageParams, Pagination};
use crate::utils::response::{created, success};

/// Event columns carried alongside a booking in list/detail responses.
#[derive(Debug, FromRow, Serialize)]
pub struct EventSummary {
    #[serde(rename = "title")]
    pub event_title: String,
    #[serde(rename = "start_time")]
    pub event_start_time: DateTime<Utc>,
    #[serde(rename = "location")]
    pub event_location: String,
    #[serde(rename = "price")]
    pub event_price: Decimal,
}

#[derive(Debug, FromRow, Serialize)]
pub struct BookingWithEvent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    #[sqlx(flatten)]
    pub event: EventSummary,
}

const BOOKING_WITH_EVENT_SELECT: &str = "SELECT b.id, b.user_id, b.event_id, \
     b.number_of_tickets, b.total_amount, b.status, b.booking_date, b.cancellation_date, \
     b.cancellation_reason, b.created_at, b.updated_at, \
     e.title AS event_title, e.start_time AS event_start_time, \
     e.location AS event_location, e.price AS event_price \
     FROM bookings b JOIN events e ON e.id = b.event_id";

#[derive(Debug, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub event_id: Option<Uuid>,
}

pub async fn create_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    axum::Json(payload): axum::Json<CreateBookingRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let booking = state
        .ledger
        .reserve(ReserveSeats {
            user_id: auth.id,
            event_id: payload.event_id,
            number_of_tickets: payload.number_of_tickets,
        })
        .await?;

    Ok(created(
        serde_json::json!({ "booking": booking }),
        "Booking created successfully",
    ))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    axum::Json(payload): axum::Json<CancelBookingRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let booking = state
        .ledger
        .release(ReleaseSeats {
            user_id: auth.id,
            booking_id: id,
            reason: payload.reason,
        })
        .await?;

    Ok(success(
        serde_json::json!({ "booking": booking }),
        "Booking cancelled successfully",
    ))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageParams>,
    Query(filter): Query<BookingFilter>,
) -> Result<Response, AppError> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM bookings b WHERE b.user_id = ");
    count_query.push_bind(auth.id);
    if let Some(status) = filter.status {
        count_query.push(" AND b.status = ").push_bind(status);
    }
    let (total,): (i64,) = count_query.build_query_as().fetch_one(&state.pool).await?;

    let mut query = QueryBuilder::new(BOOKING_WITH_EVENT_SELECT);
    query.push(" WHERE b.user_id = ").push_bind(auth.id);
    if let Some(status) = filter.status {
        query.push(" AND b.status = ").push_bind(status);
    }
    query
        .push(" ORDER BY b.created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let bookings: Vec<BookingWithEvent> =
        query.build_query_as().fetch_all(&state.pool).await?;

    Ok(success(
        serde_json::json!({
            "bookings": bookings,
            "pagination": Pagination::new(page, total),
        }),
        "Bookings retrieved successfully",
    ))
}

pub async fn get_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let mut query = QueryBuilder::new(BOOKING_WITH_EVENT_SELECT);
    query.push(" WHERE b.id = ").push_bind(id);
    // Non-admin callers only see their own bookings.
    if !auth.is_admin() {
        query.push(" AND b.user_id = ").push_bind(auth.id);
    }

    let booking: Option<BookingWithEvent> =
        query.build_query_as().fetch_optional(&state.pool).await?;
    let booking =
        booking.ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    Ok(success(
        serde_json::json!({ "booking": booking }),
        "Booking retrieved successfully",
    ))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(page): Query<PageParams>,
    Query(filter): Query<BookingFilter>,
) -> Result<Response, AppError> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM bookings b WHERE TRUE");
    push_filters(&mut count_query, &filter);
    let (total,): (i64,) = count_query.build_query_as().fetch_one(&state.pool).await?;

    let mut query = QueryBuilder::new(BOOKING_WITH_EVENT_SELECT);
    query.push(" WHERE TRUE");
    push_filters(&mut query, &filter);
    query
        .push(" ORDER BY b.created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let bookings: Vec<BookingWithEvent> =
        query.build_query_as().fetch_all(&state.pool).await?;

    Ok(success(
        serde_json::json!({
            "bookings": bookings,
            "pagination": Pagination::new(page, total),
        }),
        "All bookings retrieved successfully",
    ))
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &BookingFilter) {
    if let Some(status) = filter.status {
        query.push(" AND b.status = ").push_bind(status);
    }
    if let Some(event_id) = filter.event_id {
        query.push(" AND b.event_id = ").push_bind(event_id);
    }
}
