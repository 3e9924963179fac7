//! Seat inventory core.
//!
//! Two invariants live here: an event's `available_seats` always equals
//! `total_seats` minus the tickets of its confirmed bookings, and a user
//! holds at most one confirmed booking per event. Both operations serialize
//! on a per-event exclusive lock held across the full read-check-write
//! sequence, so concurrent calls against the same event are totally ordered
//! by lock acquisition and a failed call leaves no partial writes behind.

pub mod memory;
pub mod postgres;
pub mod rules;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::Booking;
use crate::utils::error::AppError;

pub use memory::MemoryLedger;
pub use postgres::PgLedger;
pub use rules::CANCELLATION_CUTOFF_HOURS;

#[derive(Debug, Clone)]
pub struct ReserveSeats {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub number_of_tickets: i32,
}

#[derive(Debug, Clone)]
pub struct ReleaseSeats {
    pub user_id: Uuid,
    pub booking_id: Uuid,
    pub reason: Option<String>,
}

/// The transaction boundary for seat accounting. Implementations receive
/// their persistence handle at construction; handlers only see this trait.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Creates a confirmed booking and decrements the event's seat counter
    /// as one atomic unit. Ticket-count range validation happens before the
    /// ledger is invoked.
    async fn reserve(&self, cmd: ReserveSeats) -> Result<Booking, AppError>;

    /// Cancels a confirmed booking owned by the caller and restores its
    /// tickets to the event's seat counter, atomically with the status
    /// change.
    async fn release(&self, cmd: ReleaseSeats) -> Result<Booking, AppError>;
}
