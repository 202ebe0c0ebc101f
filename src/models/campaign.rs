use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ListParams, RecordStatus, text_enum, validation};
use crate::error::AppError;

text_enum!(
    /// How a campaign's `discount_value` is interpreted.
    DiscountType {
        Percentage => "PERCENTAGE",
        Fixed => "FIXED",
    }
);

/// Campaign
///
/// A coupon-issuing rule set: the discount, the validity window and usage caps
/// shared by every coupon generated under it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub code_prefix: String,
    #[sqlx(try_from = "String")]
    pub discount_type: DiscountType,
    /// Percent (1-100) for PERCENTAGE, minor units for FIXED.
    pub discount_value: i64,
    pub min_order_cents: i64,
    pub max_discount_cents: Option<i64>,
    #[ts(type = "string")]
    pub starts_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub ends_at: DateTime<Utc>,
    /// Maximum number of coupons that may be issued; `None` is unlimited.
    pub usage_limit: Option<i64>,
    /// Redemptions allowed per customer across the whole campaign.
    pub per_user_limit: i64,
    #[sqlx(try_from = "String")]
    pub status: RecordStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub const SORTABLE: &'static [&'static str] =
        &["created_at", "updated_at", "name", "starts_at", "ends_at"];

    /// Whole-record validation. Runs on create and again on the merged result of a
    /// PATCH so cross-field rules (the window, percentage bounds) always hold.
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_length("name", &self.name, 3, 100)?;
        validation::require_optional_length("description", self.description.as_deref(), 1000)?;
        validation::require_prefix("code_prefix", &self.code_prefix)?;
        match self.discount_type {
            DiscountType::Percentage => {
                validation::require_range("discount_value", self.discount_value, 1, 100)?
            }
            DiscountType::Fixed => validation::require_positive("discount_value", self.discount_value)?,
        }
        validation::require_range("min_order_cents", self.min_order_cents, 0, i64::MAX)?;
        if let Some(cap) = self.max_discount_cents {
            validation::require_positive("max_discount_cents", cap)?;
        }
        if let Some(limit) = self.usage_limit {
            validation::require_positive("usage_limit", limit)?;
        }
        validation::require_positive("per_user_limit", self.per_user_limit)?;
        if self.ends_at <= self.starts_at {
            return Err(AppError::Validation(
                "ends_at must be after starts_at".to_string(),
            ));
        }
        Ok(())
    }

    /// Discount for `subtotal_cents`: floor of the percentage, capped by
    /// `max_discount_cents`, never more than the subtotal itself.
    pub fn discount_for(&self, subtotal_cents: i64) -> i64 {
        let raw = match self.discount_type {
            DiscountType::Percentage => subtotal_cents.saturating_mul(self.discount_value) / 100,
            DiscountType::Fixed => self.discount_value,
        };
        let capped = match self.max_discount_cents {
            Some(cap) => raw.min(cap),
            None => raw,
        };
        capped.clamp(0, subtotal_cents.max(0))
    }

    /// Whether `requested` more coupons fit under `usage_limit` when `issued` already
    /// exist. The error is the message shown to the admin.
    pub fn coupon_allowance(&self, issued: i64, requested: i64) -> Result<(), String> {
        match self.usage_limit {
            Some(limit) if issued + requested > limit => Err(format!(
                "Campaign allows {limit} coupons, {issued} already issued"
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub description: Option<String>,
    pub code_prefix: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    #[serde(default)]
    pub min_order_cents: i64,
    pub max_discount_cents: Option<i64>,
    #[ts(type = "string")]
    pub starts_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub ends_at: DateTime<Utc>,
    pub usage_limit: Option<i64>,
    #[serde(default = "default_per_user_limit")]
    pub per_user_limit: i64,
}

fn default_per_user_limit() -> i64 {
    1
}

impl CreateCampaignRequest {
    /// Builds the campaign (INACTIVE until explicitly activated) and validates it.
    pub fn into_campaign(self, now: DateTime<Utc>) -> Result<Campaign, AppError> {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            description: self.description,
            code_prefix: self.code_prefix.trim().to_string(),
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            min_order_cents: self.min_order_cents,
            max_discount_cents: self.max_discount_cents,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            usage_limit: self.usage_limit,
            per_user_limit: self.per_user_limit,
            status: RecordStatus::Inactive,
            created_at: now,
            updated_at: now,
        };
        campaign.validate()?;
        Ok(campaign)
    }
}

/// UpdateCampaignRequest
///
/// PATCH body. Nullable caps use `Option<Option<_>>`: absent leaves the value, `null`
/// clears it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCampaignRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[ts(type = "number | null")]
    #[schema(value_type = Option<i64>)]
    pub max_discount_cents: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[ts(type = "number | null")]
    #[schema(value_type = Option<i64>)]
    pub usage_limit: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_user_limit: Option<i64>,
}

impl UpdateCampaignRequest {
    /// Merges the patch into a copy of `current` and validates the result.
    pub fn merge(self, current: &Campaign, now: DateTime<Utc>) -> Result<Campaign, AppError> {
        let mut next = current.clone();
        if let Some(name) = self.name {
            next.name = name.trim().to_string();
        }
        if self.description.is_some() {
            next.description = self.description;
        }
        if let Some(prefix) = self.code_prefix {
            next.code_prefix = prefix.trim().to_string();
        }
        if let Some(kind) = self.discount_type {
            next.discount_type = kind;
        }
        if let Some(value) = self.discount_value {
            next.discount_value = value;
        }
        if let Some(min) = self.min_order_cents {
            next.min_order_cents = min;
        }
        if let Some(cap) = self.max_discount_cents {
            next.max_discount_cents = cap;
        }
        if let Some(starts_at) = self.starts_at {
            next.starts_at = starts_at;
        }
        if let Some(ends_at) = self.ends_at {
            next.ends_at = ends_at;
        }
        if let Some(limit) = self.usage_limit {
            next.usage_limit = limit;
        }
        if let Some(per_user) = self.per_user_limit {
            next.per_user_limit = per_user;
        }
        next.updated_at = now;
        next.validate()?;
        Ok(next)
    }
}

/// Distinguishes a missing field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    pub list: ListParams,
    pub status: Option<RecordStatus>,
}

/// GenerateCouponsRequest
///
/// Issues `count` codes under a campaign, optionally bound to one customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GenerateCouponsRequest {
    pub count: u32,
    #[serde(default = "default_max_uses")]
    pub max_uses: i64,
    pub user_id: Option<Uuid>,
}

pub(crate) fn default_max_uses() -> i64 {
    1
}

pub const MAX_COUPONS_PER_BATCH: u32 = 500;

impl GenerateCouponsRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_range("count", self.count, 1, MAX_COUPONS_PER_BATCH)?;
        validation::require_range("max_uses", self.max_uses, 1, 1_000_000)
    }
}
