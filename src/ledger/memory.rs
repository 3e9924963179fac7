//! In-process ledger.
//!
//! Keeps the event registry and booking set in maps, with one
//! [`tokio::sync::Mutex`] per event standing in for the database row lock.
//! The same admission rules run under that lock, so the semantics match the
//! Postgres implementation check for check. Used by the integration tests
//! and handy for running the service without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::rules;
use super::{InventoryLedger, ReleaseSeats, ReserveSeats};
use crate::models::booking::BookingStatus;
use crate::models::{Booking, Event};
use crate::utils::error::AppError;

#[derive(Default)]
pub struct MemoryLedger {
    // Arc per event so the per-event lock can be held without keeping the
    // registry locked.
    events: Mutex<HashMap<Uuid, Arc<Mutex<Event>>>>,
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_event(&self, event: Event) {
        self.events
            .lock()
            .await
            .insert(event.id, Arc::new(Mutex::new(event)));
    }

    pub async fn event(&self, id: Uuid) -> Option<Event> {
        let slot = self.events.lock().await.get(&id).cloned()?;
        let event = slot.lock().await;
        Some(event.clone())
    }

    pub async fn booking(&self, id: Uuid) -> Option<Booking> {
        self.bookings.lock().await.get(&id).cloned()
    }

    async fn event_slot(&self, id: Uuid) -> Option<Arc<Mutex<Event>>> {
        self.events.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl InventoryLedger for MemoryLedger {
    async fn reserve(&self, cmd: ReserveSeats) -> Result<Booking, AppError> {
        let slot = self
            .event_slot(cmd.event_id)
            .await
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        // Per-event lock held across the whole check-and-update sequence.
        let mut event = slot.lock().await;
        if !event.is_active {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        let mut bookings = self.bookings.lock().await;
        let has_confirmed = bookings.values().any(|b| {
            b.user_id == cmd.user_id
                && b.event_id == cmd.event_id
                && b.status == BookingStatus::Confirmed
        });

        rules::check_reserve(&event, has_confirmed, cmd.number_of_tickets, Utc::now())?;

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: cmd.user_id,
            event_id: cmd.event_id,
            number_of_tickets: cmd.number_of_tickets,
            total_amount: rules::total_amount(event.price, cmd.number_of_tickets),
            status: BookingStatus::Confirmed,
            booking_date: now,
            cancellation_date: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        event.available_seats -= cmd.number_of_tickets;
        event.updated_at = now;
        bookings.insert(booking.id, booking.clone());

        Ok(booking)
    }

    async fn release(&self, cmd: ReleaseSeats) -> Result<Booking, AppError> {
        let event_id = {
            let bookings = self.bookings.lock().await;
            bookings
                .get(&cmd.booking_id)
                .filter(|b| b.user_id == cmd.user_id && b.status == BookingStatus::Confirmed)
                .map(|b| b.event_id)
        }
        .ok_or_else(|| {
            AppError::NotFound("Booking not found or already cancelled".to_string())
        })?;

        let slot = self
            .event_slot(event_id)
            .await
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let mut event = slot.lock().await;

        // Re-read under the event lock: the booking may have been cancelled
        // while we were waiting for it.
        let mut bookings = self.bookings.lock().await;
        let booking = bookings
            .get_mut(&cmd.booking_id)
            .filter(|b| b.user_id == cmd.user_id && b.status == BookingStatus::Confirmed)
            .ok_or_else(|| {
                AppError::NotFound("Booking not found or already cancelled".to_string())
            })?;

        let now = Utc::now();
        rules::check_release(event.start_time, now)?;

        booking.status = BookingStatus::Cancelled;
        booking.cancellation_date = Some(now);
        booking.cancellation_reason = cmd.reason;
        booking.updated_at = now;

        event.available_seats += booking.number_of_tickets;
        event.updated_at = now;

        Ok(booking.clone())
    }
}
