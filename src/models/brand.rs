use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ListParams, RecordStatus, validation};
use crate::error::AppError;

/// Brand
///
/// A manufacturer or label products can be attached to.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: RecordStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    pub const SORTABLE: &'static [&'static str] = &["created_at", "updated_at", "name"];
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateBrandRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

impl CreateBrandRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_length("name", &self.name, 2, 50)?;
        validation::require_slug("slug", &self.slug)?;
        validation::require_optional_length("description", self.description.as_deref(), 500)?;
        validation::require_url("logo_url", self.logo_url.as_deref())
    }
}

/// UpdateBrandRequest
///
/// Partial update: only `Some` fields are applied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateBrandRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl UpdateBrandRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validation::require_length("name", name, 2, 50)?;
        }
        if let Some(slug) = &self.slug {
            validation::require_slug("slug", slug)?;
        }
        validation::require_optional_length("description", self.description.as_deref(), 500)?;
        validation::require_url("logo_url", self.logo_url.as_deref())
    }

    pub fn apply(self, brand: &mut Brand) {
        if let Some(name) = self.name {
            brand.name = name.trim().to_string();
        }
        if let Some(slug) = self.slug {
            brand.slug = slug;
        }
        if self.description.is_some() {
            brand.description = self.description;
        }
        if self.logo_url.is_some() {
            brand.logo_url = self.logo_url;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BrandFilter {
    pub list: ListParams,
    pub status: Option<RecordStatus>,
}
