use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serialized view of a user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        if first.len() < 2 || first.len() > 50 {
            return Err(AppError::ValidationError(
                "First name must be between 2 and 50 characters".to_string(),
            ));
        }
        if last.len() < 2 || last.len() > 50 {
            return Err(AppError::ValidationError(
                "Last name must be between 2 and 50 characters".to_string(),
            ));
        }
        if !is_plausible_email(&self.email) {
            return Err(AppError::ValidationError(
                "Email must be a valid email address".to_string(),
            ));
        }
        if self.password.len() < 6 || self.password.len() > 100 {
            return Err(AppError::ValidationError(
                "Password must be between 6 and 100 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.new_password.len() < 6 || self.new_password.len() > 100 {
            return Err(AppError::ValidationError(
                "Password must be between 6 and 100 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter22".to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_registration() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_short_names_and_passwords() {
        let mut req = request();
        req.first_name = "A".to_string();
        assert!(req.validate().is_err());

        let mut req = request();
        req.password = "short".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["not-an-email", "missing@tld", "@example.com", "a@.com"] {
            let mut req = request();
            req.email = email.to_string();
            assert!(req.validate().is_err(), "should reject {email}");
        }
    }
}
