use axum::extract::State;
use chrono::Utc;
use uuid::Uuid;

use super::{CreatedResult, JsonResult, ListResult, created, found, ok, paginated};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    models::{
        CreateWalletRequest, ListParams, ListQuery, TransactionKind, Wallet, WalletFilter,
        WalletMovement, WalletMovementRequest, WalletStatus, WalletStatusRequest,
        WalletTransaction,
    },
    repository::RepositoryState,
};

const TRANSACTION_SORTABLE: &[&str] = &["created_at"];

/// list_wallets
///
/// [Admin Route] Customer wallets. `status` accepts ACTIVE, BLOCKED or INACTIVE.
#[utoipa::path(
    get,
    path = "/api/v1/admin/wallets",
    params(ListQuery),
    responses((status = 200, description = "Wallets", body = [Wallet]))
)]
pub async fn list_wallets(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ListResult<Wallet> {
    user.require_admin()?;
    let filter = WalletFilter {
        list: query.params(Wallet::SORTABLE),
        status: query.status()?,
    };
    let page = state.repo.list_wallets(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/wallets/{id}",
    params(("id" = Uuid, Path, description = "Wallet ID")),
    responses((status = 200, description = "Wallet", body = Wallet))
)]
pub async fn get_wallet(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Wallet> {
    user.require_admin()?;
    ok(found(state.repo.get_wallet(id).await?, "Wallet")?)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/wallets",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Created", body = Wallet),
        (status = 409, description = "User already has a wallet")
    )
)]
pub async fn create_wallet(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateWalletRequest>,
) -> CreatedResult<Wallet> {
    user.require_admin()?;
    payload.validate()?;
    if state.repo.get_user(payload.user_id).await?.is_none() {
        return Err(AppError::Validation(format!(
            "Unknown user_id {}",
            payload.user_id
        )));
    }

    let now = Utc::now();
    let wallet = Wallet {
        id: Uuid::new_v4(),
        user_id: payload.user_id,
        balance_cents: 0,
        currency: payload.currency.trim().to_ascii_uppercase(),
        status: WalletStatus::Active,
        created_at: now,
        updated_at: now,
    };
    let wallet = state.repo.insert_wallet(&wallet).await?;
    tracing::info!(wallet_id = %wallet.id, user_id = %wallet.user_id, "wallet opened");
    created(wallet, "Wallet created")
}

async fn move_balance(
    repo: &RepositoryState,
    wallet_id: Uuid,
    kind: TransactionKind,
    payload: WalletMovementRequest,
) -> AppResult<WalletMovement> {
    payload.validate()?;
    let movement = repo
        .apply_wallet_movement(wallet_id, kind, payload.amount_cents, payload.note)
        .await?;
    let movement = found(movement, "Wallet")?;
    tracing::info!(
        wallet_id = %wallet_id,
        kind = kind.as_str(),
        amount_cents = movement.transaction.amount_cents,
        balance_cents = movement.wallet.balance_cents,
        "wallet balance moved"
    );
    Ok(movement)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/wallets/{id}/credit",
    params(("id" = Uuid, Path, description = "Wallet ID")),
    request_body = WalletMovementRequest,
    responses(
        (status = 200, description = "Credited", body = WalletMovement),
        (status = 400, description = "Wallet blocked or invalid amount")
    )
)]
pub async fn credit_wallet(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WalletMovementRequest>,
) -> JsonResult<WalletMovement> {
    user.require_admin()?;
    ok(move_balance(&state.repo, id, TransactionKind::Credit, payload).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/wallets/{id}/debit",
    params(("id" = Uuid, Path, description = "Wallet ID")),
    request_body = WalletMovementRequest,
    responses(
        (status = 200, description = "Debited", body = WalletMovement),
        (status = 400, description = "Wallet not active or insufficient balance")
    )
)]
pub async fn debit_wallet(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WalletMovementRequest>,
) -> JsonResult<WalletMovement> {
    user.require_admin()?;
    ok(move_balance(&state.repo, id, TransactionKind::Debit, payload).await?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/wallets/{id}/status",
    params(("id" = Uuid, Path, description = "Wallet ID")),
    request_body = WalletStatusRequest,
    responses((status = 200, description = "Status changed", body = Wallet))
)]
pub async fn set_wallet_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WalletStatusRequest>,
) -> JsonResult<Wallet> {
    user.require_admin()?;
    let wallet = state.repo.set_wallet_status(id, payload.status).await?;
    ok(found(wallet, "Wallet")?)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/wallets/{id}/transactions",
    params(("id" = Uuid, Path, description = "Wallet ID"), ListQuery),
    responses((status = 200, description = "Ledger, newest first", body = [WalletTransaction]))
)]
pub async fn list_wallet_transactions(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ListResult<WalletTransaction> {
    user.require_admin()?;
    found(state.repo.get_wallet(id).await?, "Wallet")?;
    let list = query.params(TRANSACTION_SORTABLE);
    let page = state.repo.list_wallet_transactions(id, &list).await?;
    paginated(page, &list)
}

async fn own_wallet(repo: &RepositoryState, user: &AuthUser) -> AppResult<Wallet> {
    found(repo.get_wallet_by_user(user.id).await?, "Wallet")
}

/// my_wallet
///
/// [Customer Route] The caller's wallet; 404 until an admin opens one.
#[utoipa::path(
    get,
    path = "/api/v1/wallet",
    responses(
        (status = 200, description = "Wallet", body = Wallet),
        (status = 404, description = "No wallet yet")
    )
)]
pub async fn my_wallet(user: AuthUser, State(state): State<AppState>) -> JsonResult<Wallet> {
    ok(own_wallet(&state.repo, &user).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/wallet/transactions",
    params(ListQuery),
    responses((status = 200, description = "Ledger, newest first", body = [WalletTransaction]))
)]
pub async fn my_wallet_transactions(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ListResult<WalletTransaction> {
    let wallet = own_wallet(&state.repo, &user).await?;
    let list: ListParams = query.params(TRANSACTION_SORTABLE);
    let page = state.repo.list_wallet_transactions(wallet.id, &list).await?;
    paginated(page, &list)
}
