use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Product, validation};
use crate::error::AppError;

pub const MAX_LINE_QUANTITY: i32 = 999;

/// CartItem
///
/// One product line. `unit_price_cents` is the product price when the line was last
/// touched; `line_total_cents` is always `unit_price_cents * quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub line_total_cents: i64,
}

/// Cart
///
/// A customer's single open cart. Every mutation recomputes `total_cents` as the sum
/// of the line totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub total_cents: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            items: Vec::new(),
            total_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds `quantity` of `product`, incrementing the existing line if there is one.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        validation::require_range("quantity", quantity, 1, MAX_LINE_QUANTITY)?;
        if !product.is_active {
            return Err(AppError::NotFound("Product"));
        }

        match self.items.iter_mut().find(|i| i.product_id == product.id) {
            Some(line) => {
                let next = line.quantity + quantity;
                validation::require_range("quantity", next, 1, MAX_LINE_QUANTITY)?;
                line.quantity = next;
                line.unit_price_cents = product.price_cents;
                line.name = product.name.clone();
            }
            None => self.items.push(CartItem {
                product_id: product.id,
                name: product.name.clone(),
                unit_price_cents: product.price_cents,
                quantity,
                line_total_cents: 0,
            }),
        }
        self.touch(now);
        Ok(())
    }

    /// Sets the line quantity; `0` removes the line.
    pub fn set_quantity(
        &mut self,
        product_id: Uuid,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        validation::require_range("quantity", quantity, 0, MAX_LINE_QUANTITY)?;
        if quantity == 0 {
            return self.remove_item(product_id, now);
        }
        let line = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(AppError::NotFound("Cart item"))?;
        line.quantity = quantity;
        self.touch(now);
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: Uuid, now: DateTime<Utc>) -> Result<(), AppError> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        if self.items.len() == before {
            return Err(AppError::NotFound("Cart item"));
        }
        self.touch(now);
        Ok(())
    }

    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.items.clear();
        self.touch(now);
    }

    pub fn recalculate(&mut self) {
        for line in &mut self.items {
            line.line_total_cents = line.unit_price_cents * i64::from(line.quantity);
        }
        self.total_cents = self.items.iter().map(|i| i.line_total_cents).sum();
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.recalculate();
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}
