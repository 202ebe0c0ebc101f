use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Customer Router
///
/// Store features for signed-in shoppers. Everything here is scoped to the caller
/// resolved by the `AuthUser` extractor; other customers' data is never reachable.
pub fn customer_routes() -> Router<AppState> {
    use handlers::{auth, cart, coupons, reviews, tickets, wallets};

    Router::<AppState>::new()
        .route("/me", get(auth::me))
        // Cart: one open cart per customer, created on first access.
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_cart_item))
        .route(
            "/cart/items/{product_id}",
            put(cart::update_cart_item).delete(cart::remove_cart_item),
        )
        // Coupons: validate is a dry run, redeem consumes a use.
        .route("/coupons/validate", post(coupons::validate_coupon))
        .route("/coupons/redeem", post(coupons::redeem_coupon))
        .route("/reviews", post(reviews::create_review))
        .route("/wallet", get(wallets::my_wallet))
        .route("/wallet/transactions", get(wallets::my_wallet_transactions))
        // Support tickets; foreign ticket ids answer 404.
        .route(
            "/tickets",
            get(tickets::list_my_tickets).post(tickets::create_ticket),
        )
        .route("/tickets/{id}", get(tickets::get_my_ticket))
        .route("/tickets/{id}/replies", post(tickets::reply_my_ticket))
}
