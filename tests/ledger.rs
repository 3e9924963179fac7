use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use evently_server::ledger::{InventoryLedger, MemoryLedger, ReleaseSeats, ReserveSeats};
use evently_server::models::booking::BookingStatus;
use evently_server::models::Event;
use evently_server::utils::error::AppError;

fn event(start_in: Duration, total_seats: i32, price: Decimal) -> Event {
    let now: DateTime<Utc> = Utc::now();
    Event {
        id: Uuid::new_v4(),
        title: "RustConf".to_string(),
        description: "A conference about the Rust language".to_string(),
        start_time: now + start_in,
        location: "Portland, OR".to_string(),
        category: None,
        image_url: None,
        total_seats,
        available_seats: total_seats,
        price,
        is_active: true,
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

async fn ledger_with(event: Event) -> (MemoryLedger, Uuid) {
    let id = event.id;
    let ledger = MemoryLedger::new();
    ledger.insert_event(event).await;
    (ledger, id)
}

fn reserve(user_id: Uuid, event_id: Uuid, tickets: i32) -> ReserveSeats {
    ReserveSeats {
        user_id,
        event_id,
        number_of_tickets: tickets,
    }
}

#[tokio::test]
async fn reserve_confirms_booking_and_decrements_seats() {
    let (ledger, event_id) =
        ledger_with(event(Duration::days(7), 10, Decimal::new(2000, 2))).await;
    let user = Uuid::new_v4();

    let booking = ledger.reserve(reserve(user, event_id, 3)).await.unwrap();

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.number_of_tickets, 3);
    assert_eq!(booking.total_amount, Decimal::new(6000, 2));
    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, 7);
}

#[tokio::test]
async fn capacity_failure_reports_remaining_and_changes_nothing() {
    let (ledger, event_id) =
        ledger_with(event(Duration::days(7), 10, Decimal::new(2000, 2))).await;
    ledger
        .reserve(reserve(Uuid::new_v4(), event_id, 3))
        .await
        .unwrap();

    let err = ledger
        .reserve(reserve(Uuid::new_v4(), event_id, 8))
        .await
        .unwrap_err();

    match err {
        AppError::Capacity { remaining } => assert_eq!(remaining, 7),
        other => panic!("expected capacity error, got {other:?}"),
    }
    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, 7);
}

#[tokio::test]
async fn second_confirmed_booking_for_same_event_is_a_conflict() {
    let (ledger, event_id) =
        ledger_with(event(Duration::days(7), 10, Decimal::new(2000, 2))).await;
    let user = Uuid::new_v4();

    ledger.reserve(reserve(user, event_id, 2)).await.unwrap();
    let err = ledger.reserve(reserve(user, event_id, 1)).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, 8);
}

#[tokio::test]
async fn unknown_and_inactive_events_read_as_not_found() {
    let ledger = MemoryLedger::new();
    let err = ledger
        .reserve(reserve(Uuid::new_v4(), Uuid::new_v4(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let mut inactive = event(Duration::days(7), 10, Decimal::ONE);
    inactive.is_active = false;
    let (ledger, event_id) = ledger_with(inactive).await;
    let err = ledger
        .reserve(reserve(Uuid::new_v4(), event_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn past_events_cannot_be_booked() {
    let (ledger, event_id) =
        ledger_with(event(Duration::hours(-2), 10, Decimal::ONE)).await;
    let err = ledger
        .reserve(reserve(Uuid::new_v4(), event_id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, 10);
}

#[tokio::test]
async fn cancellation_inside_cutoff_is_rejected_and_booking_stays_confirmed() {
    let (ledger, event_id) =
        ledger_with(event(Duration::hours(10), 10, Decimal::new(2000, 2))).await;
    let user = Uuid::new_v4();
    let booking = ledger.reserve(reserve(user, event_id, 2)).await.unwrap();

    let err = ledger
        .release(ReleaseSeats {
            user_id: user,
            booking_id: booking.id,
            reason: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidState(_)));
    let stored = ledger.booking(booking.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);
    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, 8);
}

#[tokio::test]
async fn cancellation_outside_cutoff_restores_seats() {
    let (ledger, event_id) =
        ledger_with(event(Duration::hours(48), 10, Decimal::new(2000, 2))).await;
    let user = Uuid::new_v4();
    let booking = ledger.reserve(reserve(user, event_id, 3)).await.unwrap();
    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, 7);

    let cancelled = ledger
        .release(ReleaseSeats {
            user_id: user,
            booking_id: booking.id,
            reason: Some("change of plans".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(cancelled.cancellation_date.is_some());
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("change of plans")
    );
    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, 10);
}

#[tokio::test]
async fn release_requires_ownership_and_a_confirmed_booking() {
    let (ledger, event_id) =
        ledger_with(event(Duration::hours(48), 10, Decimal::ONE)).await;
    let owner = Uuid::new_v4();
    let booking = ledger.reserve(reserve(owner, event_id, 1)).await.unwrap();

    // someone else's booking
    let err = ledger
        .release(ReleaseSeats {
            user_id: Uuid::new_v4(),
            booking_id: booking.id,
            reason: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // double cancel
    ledger
        .release(ReleaseSeats {
            user_id: owner,
            booking_id: booking.id,
            reason: None,
        })
        .await
        .unwrap();
    let err = ledger
        .release(ReleaseSeats {
            user_id: owner,
            booking_id: booking.id,
            reason: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, 10);
}

#[tokio::test]
async fn reserve_then_release_round_trips_the_seat_count() {
    let (ledger, event_id) =
        ledger_with(event(Duration::days(3), 25, Decimal::new(1500, 2))).await;
    let user = Uuid::new_v4();
    let before = ledger.event(event_id).await.unwrap().available_seats;

    let booking = ledger.reserve(reserve(user, event_id, 4)).await.unwrap();
    ledger
        .release(ReleaseSeats {
            user_id: user,
            booking_id: booking.id,
            reason: None,
        })
        .await
        .unwrap();

    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_reserves_never_oversell() {
    const SEATS: i32 = 5;
    const CALLERS: usize = 20;

    let (ledger, event_id) =
        ledger_with(event(Duration::days(7), SEATS, Decimal::ONE)).await;
    let ledger = Arc::new(ledger);

    let mut handles = Vec::with_capacity(CALLERS);
    for _ in 0..CALLERS {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger.reserve(reserve(Uuid::new_v4(), event_id, 1)).await
        }));
    }

    let mut successes = 0;
    let mut capacity_failures = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::Capacity { remaining }) => {
                assert!(remaining >= 0);
                capacity_failures += 1;
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    assert_eq!(successes, SEATS as usize);
    assert_eq!(capacity_failures, CALLERS - SEATS as usize);
    assert_eq!(ledger.event(event_id).await.unwrap().available_seats, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_mixed_traffic_keeps_the_counter_in_range() {
    const SEATS: i32 = 10;

    let (ledger, event_id) =
        ledger_with(event(Duration::days(7), SEATS, Decimal::ONE)).await;
    let ledger = Arc::new(ledger);

    // Wave of reserves followed by concurrent cancellations of half of them.
    let mut reserve_handles = Vec::new();
    for _ in 0..SEATS {
        let ledger = Arc::clone(&ledger);
        reserve_handles.push(tokio::spawn(async move {
            ledger.reserve(reserve(Uuid::new_v4(), event_id, 1)).await
        }));
    }

    let mut owned = Vec::new();
    for handle in reserve_handles {
        owned.push(handle.await.unwrap().unwrap());
    }
    assert_eq!(owned.len(), SEATS as usize);

    let mut release_handles = Vec::new();
    for booking in owned.iter().take(5) {
        let ledger = Arc::clone(&ledger);
        let cmd = ReleaseSeats {
            user_id: booking.user_id,
            booking_id: booking.id,
            reason: None,
        };
        release_handles.push(tokio::spawn(async move { ledger.release(cmd).await }));
    }
    for handle in release_handles {
        handle.await.unwrap().unwrap();
    }

    let event = ledger.event(event_id).await.unwrap();
    assert_eq!(event.available_seats, 5);
    assert!(event.available_seats >= 0 && event.available_seats <= event.total_seats);
}
