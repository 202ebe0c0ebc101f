use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ListParams, text_enum, validation};
use crate::error::AppError;

text_enum!(
    WalletStatus {
        Active => "ACTIVE",
        Blocked => "BLOCKED",
        Inactive => "INACTIVE",
    }
);

text_enum!(
    TransactionKind {
        Credit => "CREDIT",
        Debit => "DEBIT",
    }
);

/// Wallet
///
/// Stored-balance account, one per customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance_cents: i64,
    pub currency: String,
    #[sqlx(try_from = "String")]
    pub status: WalletStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub const SORTABLE: &'static [&'static str] = &["created_at", "updated_at", "balance_cents"];

    /// Balance after moving `amount_cents` in direction `kind`.
    ///
    /// Credits are refused on BLOCKED wallets; debits need an ACTIVE wallet holding at
    /// least the amount.
    pub fn balance_after(&self, kind: TransactionKind, amount_cents: i64) -> Result<i64, AppError> {
        validation::require_positive("amount_cents", amount_cents)?;
        match kind {
            TransactionKind::Credit => {
                if self.status == WalletStatus::Blocked {
                    return Err(AppError::BadRequest("Wallet is blocked".to_string()));
                }
                self.balance_cents
                    .checked_add(amount_cents)
                    .ok_or_else(|| AppError::BadRequest("Balance overflow".to_string()))
            }
            TransactionKind::Debit => {
                if self.status != WalletStatus::Active {
                    return Err(AppError::BadRequest(format!(
                        "Wallet is {}",
                        self.status.as_str().to_lowercase()
                    )));
                }
                if self.balance_cents < amount_cents {
                    return Err(AppError::BadRequest("Insufficient balance".to_string()));
                }
                Ok(self.balance_cents - amount_cents)
            }
        }
    }
}

/// WalletTransaction
///
/// Append-only ledger line recorded for every balance movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    #[sqlx(try_from = "String")]
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub balance_after_cents: i64,
    pub note: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateWalletRequest {
    pub user_id: Uuid,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl CreateWalletRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_currency("currency", &self.currency.trim().to_ascii_uppercase())
    }
}

/// WalletMovementRequest
///
/// Body of the admin credit/debit endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct WalletMovementRequest {
    pub amount_cents: i64,
    pub note: Option<String>,
}

impl WalletMovementRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validation::require_positive("amount_cents", self.amount_cents)?;
        validation::require_optional_length("note", self.note.as_deref(), 255)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct WalletStatusRequest {
    pub status: WalletStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct WalletMovement {
    pub wallet: Wallet,
    pub transaction: WalletTransaction,
}

#[derive(Debug, Clone, Default)]
pub struct WalletFilter {
    pub list: ListParams,
    pub status: Option<WalletStatus>,
}
