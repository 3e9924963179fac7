use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

pub const MIN_TICKETS_PER_BOOKING: i32 = 1;
pub const MAX_TICKETS_PER_BOOKING: i32 = 10;
pub const MAX_CANCELLATION_REASON_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    // Present in the schema for stored data; never produced by the ledger.
    Pending,
}

/// A reservation against an event's seat inventory. `total_amount` is fixed
/// at creation; status moves confirmed -> cancelled and nowhere else.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub number_of_tickets: i32,
    pub total_amount: Decimal,
    pub status: BookingStatus,
    pub booking_date: DateTime<Utc>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub event_id: Uuid,
    pub number_of_tickets: i32,
}

impl CreateBookingRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(MIN_TICKETS_PER_BOOKING..=MAX_TICKETS_PER_BOOKING).contains(&self.number_of_tickets) {
            return Err(AppError::ValidationError(format!(
                "Number of tickets must be between {MIN_TICKETS_PER_BOOKING} and {MAX_TICKETS_PER_BOOKING}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

impl CancelBookingRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(reason) = &self.reason {
            if reason.len() > MAX_CANCELLATION_REASON_LEN {
                return Err(AppError::ValidationError(format!(
                    "Cancellation reason must not exceed {MAX_CANCELLATION_REASON_LEN} characters"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_count_bounds() {
        for n in [1, 5, 10] {
            let req = CreateBookingRequest {
                event_id: Uuid::new_v4(),
                number_of_tickets: n,
            };
            assert!(req.validate().is_ok(), "{n} tickets should be accepted");
        }
        for n in [0, -3, 11] {
            let req = CreateBookingRequest {
                event_id: Uuid::new_v4(),
                number_of_tickets: n,
            };
            assert!(req.validate().is_err(), "{n} tickets should be rejected");
        }
    }

    #[test]
    fn cancellation_reason_length() {
        let ok = CancelBookingRequest {
            reason: Some("change of plans".to_string()),
        };
        assert!(ok.validate().is_ok());

        let too_long = CancelBookingRequest {
            reason: Some("x".repeat(MAX_CANCELLATION_REASON_LEN + 1)),
        };
        assert!(too_long.validate().is_err());

        assert!(CancelBookingRequest::default().validate().is_ok());
    }
}
