use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::validation;
use crate::error::AppError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CUSTOMER: &str = "customer";

/// User
///
/// Local profile mirroring the identity provider's user id. `role` drives RBAC:
/// `admin` for dashboard staff, `customer` for store shoppers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

/// RegisterUserRequest
///
/// The password is forwarded to the identity provider and never stored or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

pub const MIN_PASSWORD_LEN: usize = 8;

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_email("email", self.email.trim())?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_email("email", self.email.trim())?;
        if self.password.is_empty() {
            return Err(AppError::Validation("password is required".to_string()));
        }
        Ok(())
    }
}

/// LoginResponse
///
/// The store and dashboard keep `access_token` in session storage and send it as
/// `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// UserProfile
///
/// Output of `GET /api/v1/me`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// CsrfTokenResponse
///
/// Sent back as the `x-csrf-token` header on register/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
    pub expires_in: i64,
}
