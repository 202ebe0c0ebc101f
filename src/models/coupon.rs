use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{Campaign, ListParams, RecordStatus, text_enum, validation};
use crate::error::AppError;

text_enum!(
    CouponStatus {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Redeemed => "REDEEMED",
    }
);

/// Coupon
///
/// A single redeemable code issued under a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Coupon {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub code: String,
    /// When set, only this customer may redeem the code.
    pub user_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub status: CouponStatus,
    pub usage_count: i64,
    pub max_uses: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Why a coupon cannot be applied. The message is shown to the shopper as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Coupon is not active")]
    CouponInactive,
    #[error("Coupon campaign is not active")]
    CampaignInactive,
    #[error("Coupon is not valid yet")]
    NotStarted,
    #[error("Coupon has expired")]
    Expired,
    #[error("Coupon usage limit reached")]
    UsageExhausted,
    #[error("Coupon is assigned to another customer")]
    WrongCustomer,
    #[error("You have already used this campaign's coupon the maximum number of times")]
    PerUserLimitReached,
    #[error("Order subtotal must be at least {0} to use this coupon")]
    BelowMinimum(i64),
}

impl From<CouponRejection> for AppError {
    fn from(reason: CouponRejection) -> Self {
        AppError::BadRequest(reason.to_string())
    }
}

impl Coupon {
    pub const SORTABLE: &'static [&'static str] =
        &["created_at", "updated_at", "code", "usage_count"];

    /// Checks every redemption rule for `user_id` at `now` and returns the discount in
    /// minor units. `user_redemptions` is how many times this customer has already
    /// redeemed coupons of the same campaign.
    pub fn evaluate(
        &self,
        campaign: &Campaign,
        user_id: Uuid,
        user_redemptions: i64,
        subtotal_cents: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, CouponRejection> {
        if self.status != CouponStatus::Active {
            return Err(if self.status == CouponStatus::Redeemed {
                CouponRejection::UsageExhausted
            } else {
                CouponRejection::CouponInactive
            });
        }
        if campaign.status != RecordStatus::Active {
            return Err(CouponRejection::CampaignInactive);
        }
        if now < campaign.starts_at {
            return Err(CouponRejection::NotStarted);
        }
        if now > campaign.ends_at {
            return Err(CouponRejection::Expired);
        }
        if self.usage_count >= self.max_uses {
            return Err(CouponRejection::UsageExhausted);
        }
        if self.user_id.is_some_and(|owner| owner != user_id) {
            return Err(CouponRejection::WrongCustomer);
        }
        if user_redemptions >= campaign.per_user_limit {
            return Err(CouponRejection::PerUserLimitReached);
        }
        if subtotal_cents < campaign.min_order_cents {
            return Err(CouponRejection::BelowMinimum(campaign.min_order_cents));
        }
        Ok(campaign.discount_for(subtotal_cents))
    }

    /// State after one successful redemption.
    pub fn redeemed_once(mut self, now: DateTime<Utc>) -> Self {
        self.usage_count += 1;
        if self.usage_count >= self.max_uses {
            self.status = CouponStatus::Redeemed;
        }
        self.updated_at = now;
        self
    }
}

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_SUFFIX_LEN: usize = 8;

/// `<PREFIX>-XXXXXXXX` using an alphabet without look-alike characters.
pub fn generate_code<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{suffix}")
}

/// CouponRedemption
///
/// Audit row written for every successful redemption.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct CouponRedemption {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CreateCouponRequest
///
/// Manually issued coupon with an explicit code.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateCouponRequest {
    pub campaign_id: Uuid,
    pub code: String,
    pub user_id: Option<Uuid>,
    #[serde(default = "super::campaign::default_max_uses")]
    pub max_uses: i64,
}

impl CreateCouponRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_length("code", &self.code, 4, 40)?;
        if !self
            .code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(AppError::Validation(
                "code may only contain uppercase letters, digits and hyphens".to_string(),
            ));
        }
        validation::require_range("max_uses", self.max_uses, 1, 1_000_000)
    }
}

/// ApplyCouponRequest
///
/// Body for both `/coupons/validate` and `/coupons/redeem`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApplyCouponRequest {
    pub code: String,
    pub subtotal_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CouponQuote {
    pub code: String,
    pub campaign_id: Uuid,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CouponQuery {
    pub campaign_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct CouponFilter {
    pub list: ListParams,
    pub status: Option<CouponStatus>,
    pub campaign_id: Option<Uuid>,
}

impl CouponFilter {
    pub fn matches(&self, coupon: &Coupon) -> bool {
        if self.status.is_some_and(|s| s != coupon.status) {
            return false;
        }
        if self.campaign_id.is_some_and(|c| c != coupon.campaign_id) {
            return false;
        }
        match self.list.needle() {
            Some(needle) => coupon.code.to_lowercase().contains(&needle),
            None => true,
        }
    }
}
