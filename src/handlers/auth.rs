use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;
use uuid::Uuid;

use super::{CreatedResult, JsonResult, created, ok};
use crate::{
    AppState,
    auth::{AuthUser, CSRF_TTL_SECONDS, check_csrf, issue_csrf_token},
    config::AppConfig,
    error::{AppError, AppResult},
    extract::Json,
    models::{
        CsrfTokenResponse, LoginRequest, LoginResponse, ROLE_CUSTOMER, RegisterUserRequest, User,
        UserProfile,
    },
};

/// Minimal shape of the provider's `/auth/v1/signup` response: the new user's id.
#[derive(Deserialize)]
struct ProviderUser {
    id: Uuid,
}

/// Shape of the provider's password-grant response.
#[derive(Deserialize)]
struct ProviderSession {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    user: ProviderUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Base URL and API key of the identity provider.
fn provider(config: &AppConfig) -> AppResult<(&str, &str)> {
    match (config.auth_url.as_deref(), config.auth_api_key.as_deref()) {
        (Some(url), Some(key)) => Ok((url.trim_end_matches('/'), key)),
        _ => Err(AppError::Upstream(
            "identity provider is not configured".to_string(),
        )),
    }
}

/// csrf_token
///
/// [Public Route] Issues a signed one-hour token for the `x-csrf-token` header of
/// register and login.
#[utoipa::path(
    get,
    path = "/api/v1/auth/csrf-token",
    responses((status = 200, description = "CSRF token", body = CsrfTokenResponse))
)]
pub async fn csrf_token(State(state): State<AppState>) -> JsonResult<CsrfTokenResponse> {
    ok(CsrfTokenResponse {
        csrf_token: issue_csrf_token(&state.config.jwt_secret)?,
        expires_in: CSRF_TTL_SECONDS,
    })
}

/// register
///
/// [Public Route] Creates the account at the identity provider, then mirrors it as a
/// local `customer` profile keyed by the provider's user id.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = UserProfile),
        (status = 400, description = "Invalid input or rejected by the provider"),
        (status = 403, description = "Bad CSRF token")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterUserRequest>,
) -> CreatedResult<UserProfile> {
    check_csrf(&headers, &state.config)?;
    payload.validate()?;
    let (url, key) = provider(&state.config)?;
    let email = payload.email.trim().to_lowercase();

    let response = reqwest::Client::new()
        .post(format!("{url}/auth/v1/signup"))
        .header("apikey", key)
        .json(&serde_json::json!({ "email": email, "password": payload.password }))
        .send()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    if !response.status().is_success() {
        tracing::info!(status = %response.status(), "signup rejected by identity provider");
        return Err(AppError::BadRequest("Registration was rejected".to_string()));
    }

    let provider_user = response
        .json::<ProviderUser>()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let user = state
        .repo
        .upsert_user(&User {
            id: provider_user.id,
            email,
            role: ROLE_CUSTOMER.to_string(),
        })
        .await?;
    tracing::info!(user_id = %user.id, "user registered");
    created(UserProfile::from(user), "Registered")
}

/// login
///
/// [Public Route] Password grant against the identity provider. The local profile is
/// created on first login so accounts made outside this API still work.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Bad CSRF token")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> JsonResult<LoginResponse> {
    check_csrf(&headers, &state.config)?;
    payload.validate()?;
    let (url, key) = provider(&state.config)?;
    let email = payload.email.trim().to_lowercase();

    let response = reqwest::Client::new()
        .post(format!("{url}/auth/v1/token?grant_type=password"))
        .header("apikey", key)
        .json(&serde_json::json!({ "email": email, "password": payload.password }))
        .send()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    if !response.status().is_success() {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let session = response
        .json::<ProviderSession>()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    // Existing roles are preserved by the upsert.
    let user = state
        .repo
        .upsert_user(&User {
            id: session.user.id,
            email,
            role: ROLE_CUSTOMER.to_string(),
        })
        .await?;

    ok(LoginResponse {
        access_token: session.access_token,
        token_type: session.token_type,
        expires_in: session.expires_in,
        user: user.into(),
    })
}

/// me
///
/// [Customer Route] Profile of the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Missing or expired token")
    )
)]
pub async fn me(AuthUser { id, email, role }: AuthUser) -> JsonResult<UserProfile> {
    ok(UserProfile { id, email, role })
}
