use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{ListParams, validation};
use crate::error::AppError;

/// StockStatus
///
/// Derived on read from `quantity` and `low_stock_threshold`; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    /// `quantity <= 0` is out of stock, `quantity <= threshold` is low, anything above
    /// the threshold is in stock.
    pub fn derive(quantity: i32, threshold: i32) -> Self {
        if quantity <= 0 {
            Self::OutOfStock
        } else if quantity <= threshold {
            Self::LowStock
        } else {
            Self::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfStock => "out_of_stock",
            Self::LowStock => "low_stock",
            Self::InStock => "in_stock",
        }
    }
}

impl std::str::FromStr for StockStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "out_of_stock" => Ok(Self::OutOfStock),
            "low_stock" => Ok(Self::LowStock),
            "in_stock" => Ok(Self::InStock),
            other => Err(AppError::Validation(format!("invalid stock_status: {other}"))),
        }
    }
}

/// InventoryRow
///
/// Stored stock level for one product variant.
#[derive(Debug, Clone, FromRow)]
pub struct InventoryRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_sku: String,
    pub quantity: i32,
    pub low_stock_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// InventoryRecord
///
/// API shape of an inventory row: the stored fields plus the derived `stock_status`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_sku: String,
    pub quantity: i32,
    pub low_stock_threshold: i32,
    pub stock_status: StockStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        Self {
            stock_status: StockStatus::derive(row.quantity, row.low_stock_threshold),
            id: row.id,
            product_id: row.product_id,
            variant_sku: row.variant_sku,
            quantity: row.quantity,
            low_stock_threshold: row.low_stock_threshold,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl InventoryRecord {
    pub const SORTABLE: &'static [&'static str] =
        &["updated_at", "created_at", "quantity", "variant_sku"];

    /// Quantity after applying `delta`, refusing to go below zero.
    pub fn adjusted_quantity(&self, delta: i32) -> Result<i32, AppError> {
        let next = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| AppError::Validation("delta is out of range".to_string()))?;
        if next < 0 {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock: {} on hand, adjustment of {}",
                self.quantity, delta
            )));
        }
        Ok(next)
    }
}

const MAX_QUANTITY: i32 = 1_000_000;

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateInventoryRequest {
    pub product_id: Uuid,
    pub variant_sku: String,
    pub quantity: i32,
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i32,
}

fn default_threshold() -> i32 {
    5
}

impl CreateInventoryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_sku("variant_sku", &self.variant_sku)?;
        validation::require_range("quantity", self.quantity, 0, MAX_QUANTITY)?;
        validation::require_range("low_stock_threshold", self.low_stock_threshold, 0, MAX_QUANTITY)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateInventoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i32>,
}

impl UpdateInventoryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(sku) = &self.variant_sku {
            validation::require_sku("variant_sku", sku)?;
        }
        if let Some(q) = self.quantity {
            validation::require_range("quantity", q, 0, MAX_QUANTITY)?;
        }
        if let Some(t) = self.low_stock_threshold {
            validation::require_range("low_stock_threshold", t, 0, MAX_QUANTITY)?;
        }
        Ok(())
    }
}

/// AdjustStockRequest
///
/// Relative stock movement: positive for restocks, negative for shrinkage.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdjustStockRequest {
    pub delta: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryQuery {
    pub product_id: Option<Uuid>,
    /// `out_of_stock`, `low_stock` or `in_stock`.
    pub stock_status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub list: ListParams,
    pub product_id: Option<Uuid>,
    pub stock_status: Option<StockStatus>,
}

impl InventoryFilter {
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        if self.product_id.is_some_and(|p| p != record.product_id) {
            return false;
        }
        if self.stock_status.is_some_and(|s| s != record.stock_status) {
            return false;
        }
        match self.list.needle() {
            Some(needle) => record.variant_sku.to_lowercase().contains(&needle),
            None => true,
        }
    }
}
