use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

/// An event with finite seating. `available_seats` is owned exclusively by
/// the inventory ledger: outside of event creation, nothing mutates it except
/// the reserve/release transactions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub location: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub price: Decimal,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub location: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub total_seats: i32,
    pub price: Decimal,
}

impl CreateEventRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.title.trim().len() < 3 || self.title.len() > 200 {
            return Err(AppError::ValidationError(
                "Title must be between 3 and 200 characters".to_string(),
            ));
        }
        if self.description.trim().len() < 10 || self.description.len() > 2000 {
            return Err(AppError::ValidationError(
                "Description must be between 10 and 2000 characters".to_string(),
            ));
        }
        if self.location.trim().len() < 5 || self.location.len() > 200 {
            return Err(AppError::ValidationError(
                "Location must be between 5 and 200 characters".to_string(),
            ));
        }
        if self.start_time <= now {
            return Err(AppError::ValidationError(
                "Event start time must be in the future".to_string(),
            ));
        }
        if !(1..=100_000).contains(&self.total_seats) {
            return Err(AppError::ValidationError(
                "Total seats must be between 1 and 100000".to_string(),
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Price must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub total_seats: Option<i32>,
    pub price: Option<Decimal>,
}

impl UpdateEventRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            if title.trim().len() < 3 || title.len() > 200 {
                return Err(AppError::ValidationError(
                    "Title must be between 3 and 200 characters".to_string(),
                ));
            }
        }
        if let Some(description) = &self.description {
            if description.trim().len() < 10 || description.len() > 2000 {
                return Err(AppError::ValidationError(
                    "Description must be between 10 and 2000 characters".to_string(),
                ));
            }
        }
        if let Some(location) = &self.location {
            if location.trim().len() < 5 || location.len() > 200 {
                return Err(AppError::ValidationError(
                    "Location must be between 5 and 200 characters".to_string(),
                ));
            }
        }
        if let Some(total_seats) = self.total_seats {
            if !(1..=100_000).contains(&total_seats) {
                return Err(AppError::ValidationError(
                    "Total seats must be between 1 and 100000".to_string(),
                ));
            }
        }
        if let Some(price) = self.price {
            if price < Decimal::ZERO {
                return Err(AppError::ValidationError(
                    "Price must not be negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Filters accepted by the public event listing.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(now: DateTime<Utc>) -> CreateEventRequest {
        CreateEventRequest {
            title: "RustConf".to_string(),
            description: "A conference about the Rust language".to_string(),
            start_time: now + Duration::days(30),
            location: "Portland, OR".to_string(),
            category: Some("tech".to_string()),
            image_url: None,
            total_seats: 500,
            price: Decimal::new(9900, 2),
        }
    }

    #[test]
    fn accepts_well_formed_event() {
        let now = Utc::now();
        assert!(request(now).validate(now).is_ok());
    }

    #[test]
    fn rejects_past_start_time() {
        let now = Utc::now();
        let mut req = request(now);
        req.start_time = now - Duration::hours(1);
        assert!(req.validate(now).is_err());
    }

    #[test]
    fn rejects_zero_seats_and_negative_price() {
        let now = Utc::now();
        let mut req = request(now);
        req.total_seats = 0;
        assert!(req.validate(now).is_err());

        let mut req = request(now);
        req.price = Decimal::new(-1, 0);
        assert!(req.validate(now).is_err());
    }
}
