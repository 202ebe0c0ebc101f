use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Liveness check for the load balancer.
pub async fn health() -> &'static str {
    "ok"
}

/// Public Router
///
/// Unauthenticated endpoints. Catalogue reads only ever expose active products,
/// active brands and payment methods, and approved reviews.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // Auth gateway. Register/login verify `x-csrf-token` when it is sent.
        .route("/auth/csrf-token", get(handlers::auth::csrf_token))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // Storefront catalogue.
        .route("/products", get(handlers::products::list_products))
        .route("/products/{id}", get(handlers::products::get_product))
        .route(
            "/products/{id}/reviews",
            get(handlers::reviews::list_product_reviews),
        )
        .route("/brands", get(handlers::brands::list_public_brands))
        .route(
            "/payment-methods",
            get(handlers::payment_methods::list_public_payment_methods),
        )
}
