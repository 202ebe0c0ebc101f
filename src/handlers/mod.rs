//! HTTP handlers, one module per resource.
//!
//! Handlers extract, validate and build complete entities; persistence rules live in
//! the repository and domain rules in `models`. Dashboard handlers start with
//! `user.require_admin()?`.

use axum::http::StatusCode;

use crate::{
    error::{AppError, AppResult},
    extract::Json,
    models::{ListParams, Page},
    response::{ApiResponse, PaginatedResponse},
};

pub mod auth;
pub mod brands;
pub mod campaigns;
pub mod cart;
pub mod coupons;
pub mod dashboard;
pub mod inventory;
pub mod options;
pub mod payment_methods;
pub mod products;
pub mod reviews;
pub mod tickets;
pub mod uploads;
pub mod wallets;

/// `{ success: true, data }` for a single entity.
pub type JsonResult<T> = AppResult<Json<ApiResponse<T>>>;

/// `{ success: true, data: [...], pagination }` for a listing.
pub type ListResult<T> = AppResult<Json<PaginatedResponse<T>>>;

/// `201 Created` with the new entity.
pub type CreatedResult<T> = AppResult<(StatusCode, Json<ApiResponse<T>>)>;

pub(crate) fn created<T>(data: T, message: &str) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(data, message))))
}

pub(crate) fn ok<T>(data: T) -> JsonResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

pub(crate) fn paginated<T>(page: Page<T>, list: &ListParams) -> ListResult<T> {
    Ok(Json(PaginatedResponse::from_page(page, list.page, list.limit)))
}

/// Turns a repository `Option` into a 404 naming `what`.
pub(crate) fn found<T>(value: Option<T>, what: &'static str) -> AppResult<T> {
    value.ok_or(AppError::NotFound(what))
}
