//! Postgres-backed ledger.
//!
//! Each operation is one transaction that takes `SELECT ... FOR UPDATE` on
//! the target event row and holds it until commit. Concurrent reserve and
//! release calls against the same event queue on that lock; unrelated events
//! do not contend. Any error path returns before `commit`, and dropping the
//! uncommitted [`sqlx::Transaction`] rolls everything back, so a rejected
//! call leaves both tables untouched.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use async_trait::async_trait;

use super::rules;
use super::{InventoryLedger, ReleaseSeats, ReserveSeats};
use crate::models::{Booking, Event};
use crate::utils::error::AppError;

const EVENT_COLUMNS: &str = "id, title, description, start_time, location, category, image_url, \
     total_seats, available_seats, price, is_active, created_by, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, user_id, event_id, number_of_tickets, total_amount, status, \
     booking_date, cancellation_date, cancellation_reason, created_at, updated_at";

pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryLedger for PgLedger {
    async fn reserve(&self, cmd: ReserveSeats) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        // Exclusive lock on the event row; seat counts read after this are
        // current, not a snapshot from before the lock was granted.
        let event: Option<Event> = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND is_active = TRUE FOR UPDATE"
        ))
        .bind(cmd.event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let event = event.ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let existing: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM bookings \
             WHERE user_id = $1 AND event_id = $2 AND status = 'confirmed'",
        )
        .bind(cmd.user_id)
        .bind(cmd.event_id)
        .fetch_optional(&mut *tx)
        .await?;

        rules::check_reserve(&event, existing.is_some(), cmd.number_of_tickets, Utc::now())?;

        let total_amount = rules::total_amount(event.price, cmd.number_of_tickets);
        let booking: Booking = sqlx::query_as(&format!(
            "INSERT INTO bookings (id, user_id, event_id, number_of_tickets, total_amount, status) \
             VALUES ($1, $2, $3, $4, $5, 'confirmed') RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(cmd.user_id)
        .bind(cmd.event_id)
        .bind(cmd.number_of_tickets)
        .bind(total_amount)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE events SET available_seats = available_seats - $1, updated_at = NOW() \
             WHERE id = $2",
        )
        .bind(cmd.number_of_tickets)
        .bind(cmd.event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            event_id = %cmd.event_id,
            tickets = cmd.number_of_tickets,
            "Booking confirmed"
        );
        Ok(booking)
    }

    async fn release(&self, cmd: ReleaseSeats) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        // Resolve the booking first to learn its event, then lock the event
        // row. The conditional UPDATE below re-checks the status under the
        // lock, so a concurrent cancellation cannot restore seats twice.
        let booking: Option<Booking> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE id = $1 AND user_id = $2 AND status = 'confirmed'"
        ))
        .bind(cmd.booking_id)
        .bind(cmd.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let booking = booking.ok_or_else(|| {
            AppError::NotFound("Booking not found or already cancelled".to_string())
        })?;

        let event: Event = sqlx::query_as(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(booking.event_id)
        .fetch_one(&mut *tx)
        .await?;

        rules::check_release(event.start_time, Utc::now())?;

        let cancelled: Option<Booking> = sqlx::query_as(&format!(
            "UPDATE bookings \
             SET status = 'cancelled', cancellation_date = $2, cancellation_reason = $3, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'confirmed' RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.id)
        .bind(Utc::now())
        .bind(cmd.reason.as_deref())
        .fetch_optional(&mut *tx)
        .await?;

        let cancelled = cancelled.ok_or_else(|| {
            AppError::NotFound("Booking not found or already cancelled".to_string())
        })?;

        sqlx::query(
            "UPDATE events SET available_seats = available_seats + $1, updated_at = NOW() \
             WHERE id = $2",
        )
        .bind(cancelled.number_of_tickets)
        .bind(cancelled.event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %cancelled.id,
            event_id = %cancelled.event_id,
            tickets = cancelled.number_of_tickets,
            "Booking cancelled, seats restored"
        );
        Ok(cancelled)
    }
}
