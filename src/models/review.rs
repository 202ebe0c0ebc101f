use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{ListParams, text_enum, validation};
use crate::error::AppError;

text_enum!(
    /// Moderation state. Only APPROVED reviews are shown in the store.
    ReviewStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
);

/// Review
///
/// A customer's rating of a product, held for moderation before it is published.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub body: String,
    #[sqlx(try_from = "String")]
    pub status: ReviewStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub const SORTABLE: &'static [&'static str] = &["created_at", "updated_at", "rating"];
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    pub rating: i32,
    pub title: String,
    pub body: String,
}

impl CreateReviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_range("rating", self.rating, 1, 5)?;
        validation::require_length("title", &self.title, 3, 120)?;
        validation::require_length("body", &self.body, 10, 2000)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewQuery {
    pub product_id: Option<Uuid>,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub list: ListParams,
    pub status: Option<ReviewStatus>,
    pub product_id: Option<Uuid>,
    pub rating: Option<i32>,
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        if self.status.is_some_and(|s| s != review.status) {
            return false;
        }
        if self.product_id.is_some_and(|p| p != review.product_id) {
            return false;
        }
        if self.rating.is_some_and(|r| r != review.rating) {
            return false;
        }
        match self.list.needle() {
            Some(needle) => {
                review.title.to_lowercase().contains(&needle)
                    || review.body.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}
