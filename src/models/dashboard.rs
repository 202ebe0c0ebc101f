use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// AdminDashboardStats
///
/// Counters for the dashboard landing page (GET /api/v1/admin/stats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_products: i64,
    pub active_products: i64,
    pub low_stock_items: i64,
    pub out_of_stock_items: i64,
    pub pending_reviews: i64,
    pub open_tickets: i64,
    pub active_campaigns: i64,
    pub total_wallet_balance_cents: i64,
}
