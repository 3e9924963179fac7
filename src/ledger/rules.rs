//! Admission rules for the seat inventory.
//!
//! Every ledger implementation runs these checks while holding the event's
//! exclusive lock, so the decision is always made against the current
//! committed state rather than a stale snapshot. The functions are pure:
//! they inspect state and either pass or return the typed error that aborts
//! the whole transaction.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::models::Event;
use crate::utils::error::AppError;

pub const CANCELLATION_CUTOFF_HOURS: i64 = 24;

/// Checks a reservation, short-circuiting on the first
/// failure: event must be upcoming, the user must not already hold a
/// confirmed booking, and the remaining seats must cover the request.
///
/// Event existence and `is_active` are resolved by the caller (a missing or
/// inactive event reads as not found before these rules run).
pub fn check_reserve(
    event: &Event,
    has_confirmed_booking: bool,
    number_of_tickets: i32,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if event.start_time <= now {
        return Err(AppError::InvalidState(
            "Cannot book tickets for past events".to_string(),
        ));
    }
    if has_confirmed_booking {
        return Err(AppError::Conflict(
            "You already have a confirmed booking for this event".to_string(),
        ));
    }
    if event.available_seats < number_of_tickets {
        return Err(AppError::Capacity {
            remaining: event.available_seats,
        });
    }
    Ok(())
}

/// A confirmed booking may only be cancelled while the event start is at
/// least [`CANCELLATION_CUTOFF_HOURS`] away.
pub fn check_release(event_start: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppError> {
    if event_start - now < Duration::hours(CANCELLATION_CUTOFF_HOURS) {
        return Err(AppError::InvalidState(format!(
            "Cannot cancel booking less than {CANCELLATION_CUTOFF_HOURS} hours before the event"
        )));
    }
    Ok(())
}

/// Total charge for a reservation, fixed at creation time.
pub fn total_amount(price: Decimal, number_of_tickets: i32) -> Decimal {
    price * Decimal::from(number_of_tickets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn event(start_in: Duration, available: i32, now: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "RustConf".to_string(),
            description: "A conference about the Rust language".to_string(),
            start_time: now + start_in,
            location: "Portland, OR".to_string(),
            category: None,
            image_url: None,
            total_seats: 10,
            available_seats: available,
            price: Decimal::new(2000, 2),
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn admits_a_plain_reservation() {
        let now = Utc::now();
        let ev = event(Duration::days(7), 10, now);
        assert!(check_reserve(&ev, false, 3, now).is_ok());
    }

    #[test]
    fn rejects_past_events() {
        let now = Utc::now();
        let ev = event(Duration::hours(-1), 10, now);
        assert!(matches!(
            check_reserve(&ev, false, 1, now),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn event_starting_exactly_now_counts_as_past() {
        let now = Utc::now();
        let ev = event(Duration::zero(), 10, now);
        assert!(check_reserve(&ev, false, 1, now).is_err());
    }

    #[test]
    fn rejects_duplicate_confirmed_booking() {
        let now = Utc::now();
        let ev = event(Duration::days(7), 10, now);
        assert!(matches!(
            check_reserve(&ev, true, 1, now),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn rejects_when_capacity_is_short_and_reports_remainder() {
        let now = Utc::now();
        let ev = event(Duration::days(7), 7, now);
        match check_reserve(&ev, false, 8, now) {
            Err(AppError::Capacity { remaining }) => assert_eq!(remaining, 7),
            other => panic!("expected capacity error, got {other:?}"),
        }
    }

    #[test]
    fn capacity_boundary_exact_fit_is_admitted() {
        let now = Utc::now();
        let ev = event(Duration::days(7), 3, now);
        assert!(check_reserve(&ev, false, 3, now).is_ok());
    }

    #[test]
    fn checks_run_in_order() {
        // A past event with a duplicate booking and no seats reports the
        // time-window failure first.
        let now = Utc::now();
        let ev = event(Duration::hours(-1), 0, now);
        assert!(matches!(
            check_reserve(&ev, true, 5, now),
            Err(AppError::InvalidState(_))
        ));

        // Duplicate wins over capacity.
        let ev = event(Duration::days(7), 0, now);
        assert!(matches!(
            check_reserve(&ev, true, 5, now),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn release_allowed_outside_cutoff() {
        let now = Utc::now();
        assert!(check_release(now + Duration::hours(48), now).is_ok());
        assert!(check_release(now + Duration::hours(24), now).is_ok());
    }

    #[test]
    fn release_rejected_inside_cutoff() {
        let now = Utc::now();
        for hours in [10, 23] {
            assert!(matches!(
                check_release(now + Duration::hours(hours), now),
                Err(AppError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn total_amount_is_price_times_tickets() {
        let total = total_amount(Decimal::new(2000, 2), 3);
        assert_eq!(total, Decimal::new(6000, 2));
    }
}
