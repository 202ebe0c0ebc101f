use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ListParams, RecordStatus, validation};
use crate::error::AppError;

/// PaymentMethod
///
/// A checkout option offered by the store (card gateway, cash on delivery, wallet).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub provider: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: RecordStatus,
    /// Display position at checkout, ascending.
    pub sort_order: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub const SORTABLE: &'static [&'static str] =
        &["sort_order", "created_at", "updated_at", "name"];
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreatePaymentMethodRequest {
    pub name: String,
    pub code: String,
    pub provider: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl CreatePaymentMethodRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_length("name", &self.name, 2, 60)?;
        validation::require_code("code", &self.code)?;
        validation::require_length("provider", &self.provider, 2, 60)?;
        validation::require_optional_length("description", self.description.as_deref(), 500)?;
        validation::require_range("sort_order", self.sort_order, 0, 10_000)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePaymentMethodRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

impl UpdatePaymentMethodRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validation::require_length("name", name, 2, 60)?;
        }
        if let Some(code) = &self.code {
            validation::require_code("code", code)?;
        }
        if let Some(provider) = &self.provider {
            validation::require_length("provider", provider, 2, 60)?;
        }
        validation::require_optional_length("description", self.description.as_deref(), 500)?;
        if let Some(order) = self.sort_order {
            validation::require_range("sort_order", order, 0, 10_000)?;
        }
        Ok(())
    }

    pub fn apply(self, method: &mut PaymentMethod) {
        if let Some(name) = self.name {
            method.name = name.trim().to_string();
        }
        if let Some(code) = self.code {
            method.code = code;
        }
        if let Some(provider) = self.provider {
            method.provider = provider.trim().to_string();
        }
        if self.description.is_some() {
            method.description = self.description;
        }
        if let Some(order) = self.sort_order {
            method.sort_order = order;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentMethodFilter {
    pub list: ListParams,
    pub status: Option<RecordStatus>,
}
