use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod response;
pub mod storage;

// Routers split by access tier (public, customer, admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, customer, public};

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for every `#[utoipa::path]` handler, served at
/// `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::csrf_token, handlers::auth::register, handlers::auth::login,
        handlers::auth::me,
        handlers::brands::list_public_brands, handlers::brands::list_brands,
        handlers::brands::get_brand, handlers::brands::create_brand,
        handlers::brands::update_brand, handlers::brands::delete_brand,
        handlers::brands::activate_brand, handlers::brands::deactivate_brand,
        handlers::options::list_options, handlers::options::get_option,
        handlers::options::create_option, handlers::options::update_option,
        handlers::options::delete_option, handlers::options::activate_option,
        handlers::options::deactivate_option,
        handlers::products::list_products, handlers::products::get_product,
        handlers::products::list_admin_products, handlers::products::get_admin_product,
        handlers::products::create_product, handlers::products::update_product,
        handlers::products::delete_product, handlers::products::activate_product,
        handlers::products::deactivate_product,
        handlers::inventory::list_inventory, handlers::inventory::get_inventory,
        handlers::inventory::create_inventory, handlers::inventory::update_inventory,
        handlers::inventory::adjust_stock, handlers::inventory::delete_inventory,
        handlers::campaigns::list_campaigns, handlers::campaigns::get_campaign,
        handlers::campaigns::create_campaign, handlers::campaigns::update_campaign,
        handlers::campaigns::delete_campaign, handlers::campaigns::activate_campaign,
        handlers::campaigns::deactivate_campaign, handlers::campaigns::generate_coupons,
        handlers::coupons::list_coupons, handlers::coupons::get_coupon,
        handlers::coupons::create_coupon, handlers::coupons::delete_coupon,
        handlers::coupons::activate_coupon, handlers::coupons::deactivate_coupon,
        handlers::coupons::validate_coupon, handlers::coupons::redeem_coupon,
        handlers::reviews::list_product_reviews, handlers::reviews::create_review,
        handlers::reviews::list_reviews, handlers::reviews::get_review,
        handlers::reviews::approve_review, handlers::reviews::reject_review,
        handlers::reviews::delete_review,
        handlers::wallets::list_wallets, handlers::wallets::get_wallet,
        handlers::wallets::create_wallet, handlers::wallets::credit_wallet,
        handlers::wallets::debit_wallet, handlers::wallets::set_wallet_status,
        handlers::wallets::list_wallet_transactions, handlers::wallets::my_wallet,
        handlers::wallets::my_wallet_transactions,
        handlers::payment_methods::list_public_payment_methods,
        handlers::payment_methods::list_payment_methods,
        handlers::payment_methods::get_payment_method,
        handlers::payment_methods::create_payment_method,
        handlers::payment_methods::update_payment_method,
        handlers::payment_methods::delete_payment_method,
        handlers::payment_methods::activate_payment_method,
        handlers::payment_methods::deactivate_payment_method,
        handlers::tickets::create_ticket, handlers::tickets::list_my_tickets,
        handlers::tickets::get_my_ticket, handlers::tickets::reply_my_ticket,
        handlers::tickets::list_tickets, handlers::tickets::get_ticket,
        handlers::tickets::update_ticket, handlers::tickets::reply_ticket,
        handlers::cart::get_cart, handlers::cart::add_cart_item,
        handlers::cart::update_cart_item, handlers::cart::remove_cart_item,
        handlers::cart::clear_cart,
        handlers::dashboard::get_stats,
        handlers::uploads::presigned_upload,
    ),
    components(
        schemas(
            models::Brand, models::ProductOption, models::Product, models::InventoryRecord,
            models::StockStatus, models::Campaign, models::Coupon, models::CouponQuote,
            models::Review, models::Wallet, models::WalletTransaction, models::WalletMovement,
            models::PaymentMethod, models::SupportTicket, models::TicketReply,
            models::TicketDetail, models::Cart, models::CartItem, models::AdminDashboardStats,
            models::UserProfile, models::LoginResponse, models::CsrfTokenResponse,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            response::MessageResponse, response::Pagination,
        )
    ),
    tags(
        (name = "commerce", description = "Store and admin dashboard API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared, immutable services handed to every request. Handlers pull what they need
/// directly or through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: Postgres in production, in-memory in tests.
    pub repo: RepositoryState,
    /// Object storage for presigned image uploads.
    pub storage: StorageState,
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for the customer and admin routers. Extracting `AuthUser` runs the full token
/// and profile check; a failure short-circuits with the extractor's 401 before any
/// handler runs. The resolved user is stored in the request extensions for the handler.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Mounts the three tiers under `/api/v1`, the docs and `/health`, then wraps
/// everything in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        .merge(customer::customer_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        )))
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        );

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(public::health))
        .nest("/api/v1", api)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for each request carrying the method, URI and `x-request-id`, so every log
/// line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
