use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{ListParams, validation};
use crate::error::AppError;

/// Product
///
/// A sellable catalogue entry. Inactive products are hidden from the store and
/// cannot be added to carts, but stay visible in the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub brand_id: Option<Uuid>,
    pub price_cents: i64,
    pub sku: String,
    pub images: Vec<String>,
    pub option_ids: Vec<Uuid>,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub const SORTABLE: &'static [&'static str] =
        &["created_at", "updated_at", "name", "price_cents"];

    /// Whether the product passes the listing filters (search over name, description
    /// and sku; exact category). Pagination is applied afterwards.
    pub fn matches(&self, filter: &ProductFilter) -> bool {
        if filter.active_only && !self.is_active {
            return false;
        }
        if let Some(active) = filter.is_active {
            if self.is_active != active {
                return false;
            }
        }
        if let Some(category) = &filter.category {
            if !self.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(brand_id) = filter.brand_id {
            if self.brand_id != Some(brand_id) {
                return false;
            }
        }
        if let Some(needle) = filter.list.needle() {
            let hit = self.name.to_lowercase().contains(&needle)
                || self.sku.to_lowercase().contains(&needle)
                || self
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

const MAX_PRICE_CENTS: i64 = 100_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub brand_id: Option<Uuid>,
    pub price_cents: i64,
    pub sku: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub option_ids: Vec<Uuid>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_length("name", &self.name, 2, 120)?;
        validation::require_slug("slug", &self.slug)?;
        validation::require_length("category", &self.category, 2, 60)?;
        validation::require_optional_length("description", self.description.as_deref(), 5000)?;
        validation::require_range("price_cents", self.price_cents, 0, MAX_PRICE_CENTS)?;
        validation::require_sku("sku", &self.sku)?;
        validate_images(&self.images)
    }
}

fn validate_images(images: &[String]) -> Result<(), AppError> {
    if images.len() > 10 {
        return Err(AppError::Validation(
            "images may contain at most 10 entries".to_string(),
        ));
    }
    images
        .iter()
        .try_for_each(|i| validation::require_length("images", i, 1, 500))
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_ids: Option<Vec<Uuid>>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validation::require_length("name", name, 2, 120)?;
        }
        if let Some(slug) = &self.slug {
            validation::require_slug("slug", slug)?;
        }
        if let Some(category) = &self.category {
            validation::require_length("category", category, 2, 60)?;
        }
        validation::require_optional_length("description", self.description.as_deref(), 5000)?;
        if let Some(price) = self.price_cents {
            validation::require_range("price_cents", price, 0, MAX_PRICE_CENTS)?;
        }
        if let Some(sku) = &self.sku {
            validation::require_sku("sku", sku)?;
        }
        if let Some(images) = &self.images {
            validate_images(images)?;
        }
        Ok(())
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(slug) = self.slug {
            product.slug = slug;
        }
        if self.description.is_some() {
            product.description = self.description;
        }
        if let Some(category) = self.category {
            product.category = category.trim().to_string();
        }
        if self.brand_id.is_some() {
            product.brand_id = self.brand_id;
        }
        if let Some(price) = self.price_cents {
            product.price_cents = price;
        }
        if let Some(sku) = self.sku {
            product.sku = sku;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(option_ids) = self.option_ids {
            product.option_ids = option_ids;
        }
    }
}

/// ProductQuery
///
/// Product-specific listing parameters, read alongside the shared `ListQuery`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub brand_id: Option<Uuid>,
    /// Dashboard only: restrict to active or inactive products.
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub list: ListParams,
    /// Store listings force this on; it cannot be overridden by query parameters.
    pub active_only: bool,
    pub is_active: Option<bool>,
    pub category: Option<String>,
    pub brand_id: Option<Uuid>,
}

impl ProductFilter {
    pub fn storefront(list: ListParams, query: ProductQuery) -> Self {
        Self {
            list,
            active_only: true,
            is_active: None,
            category: query.category.filter(|c| !c.trim().is_empty()),
            brand_id: query.brand_id,
        }
    }

    pub fn admin(list: ListParams, query: ProductQuery) -> Self {
        Self {
            list,
            active_only: false,
            is_active: query.is_active,
            category: query.category.filter(|c| !c.trim().is_empty()),
            brand_id: query.brand_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, category: &str, active: bool) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: Some("Lightweight and breathable".into()),
            category: category.into(),
            brand_id: None,
            price_cents: 4999,
            sku: format!("SKU-{}", name.len()),
            images: vec![],
            option_ids: vec![],
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn storefront_filter_hides_inactive_products() {
        let filter = ProductFilter::storefront(ListParams::default(), ProductQuery::default());
        assert!(product("Trail Runner", "shoes", true).matches(&filter));
        assert!(!product("Trail Runner", "shoes", false).matches(&filter));
    }

    #[test]
    fn search_covers_description_and_category_is_exact() {
        let mut list = ListParams::default();
        list.search = Some("BREATHABLE".into());
        let filter = ProductFilter::storefront(
            list,
            ProductQuery {
                category: Some("Shoes".into()),
                ..Default::default()
            },
        );
        assert!(product("Trail Runner", "shoes", true).matches(&filter));
        assert!(!product("Trail Runner", "shirts", true).matches(&filter));
    }

    #[test]
    fn negative_price_is_invalid() {
        let req = CreateProductRequest {
            name: "Trail Runner".into(),
            slug: "trail-runner".into(),
            description: None,
            category: "shoes".into(),
            brand_id: None,
            price_cents: -1,
            sku: "TR-001".into(),
            images: vec![],
            option_ids: vec![],
            is_active: true,
        };
        assert!(req.validate().is_err());
    }
}
