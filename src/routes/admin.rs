use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Admin Router
///
/// Dashboard management endpoints, nested under `/api/v1/admin`. The router is
/// wrapped in the authentication layer and every handler starts with
/// `require_admin`, so customers receive a 403.
pub fn admin_routes() -> Router<AppState> {
    use handlers::{
        brands, campaigns, coupons, dashboard, inventory, options, payment_methods, products,
        reviews, tickets, uploads, wallets,
    };

    Router::new()
        .route("/stats", get(dashboard::get_stats))
        .route("/uploads/presigned", post(uploads::presigned_upload))
        // --- Catalogue ---
        .route("/brands", get(brands::list_brands).post(brands::create_brand))
        .route(
            "/brands/{id}",
            get(brands::get_brand)
                .put(brands::update_brand)
                .delete(brands::delete_brand),
        )
        .route("/brands/{id}/activate", patch(brands::activate_brand))
        .route("/brands/{id}/deactivate", patch(brands::deactivate_brand))
        .route("/options", get(options::list_options).post(options::create_option))
        .route(
            "/options/{id}",
            get(options::get_option)
                .put(options::update_option)
                .delete(options::delete_option),
        )
        .route("/options/{id}/activate", patch(options::activate_option))
        .route("/options/{id}/deactivate", patch(options::deactivate_option))
        .route(
            "/products",
            get(products::list_admin_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_admin_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/products/{id}/activate", patch(products::activate_product))
        .route("/products/{id}/deactivate", patch(products::deactivate_product))
        // --- Stock ---
        .route(
            "/inventory",
            get(inventory::list_inventory).post(inventory::create_inventory),
        )
        .route(
            "/inventory/{id}",
            get(inventory::get_inventory)
                .put(inventory::update_inventory)
                .delete(inventory::delete_inventory),
        )
        .route("/inventory/{id}/adjust", post(inventory::adjust_stock))
        // --- Promotions ---
        .route(
            "/campaigns",
            get(campaigns::list_campaigns).post(campaigns::create_campaign),
        )
        .route(
            "/campaigns/{id}",
            get(campaigns::get_campaign)
                .patch(campaigns::update_campaign)
                .delete(campaigns::delete_campaign),
        )
        .route("/campaigns/{id}/activate", patch(campaigns::activate_campaign))
        .route("/campaigns/{id}/deactivate", patch(campaigns::deactivate_campaign))
        .route("/campaigns/{id}/coupons", post(campaigns::generate_coupons))
        .route("/coupons", get(coupons::list_coupons).post(coupons::create_coupon))
        .route(
            "/coupons/{id}",
            get(coupons::get_coupon).delete(coupons::delete_coupon),
        )
        .route("/coupons/{id}/activate", patch(coupons::activate_coupon))
        .route("/coupons/{id}/deactivate", patch(coupons::deactivate_coupon))
        // --- Moderation ---
        .route("/reviews", get(reviews::list_reviews))
        .route(
            "/reviews/{id}",
            get(reviews::get_review).delete(reviews::delete_review),
        )
        .route("/reviews/{id}/approve", patch(reviews::approve_review))
        .route("/reviews/{id}/reject", patch(reviews::reject_review))
        // --- Wallets ---
        .route("/wallets", get(wallets::list_wallets).post(wallets::create_wallet))
        .route("/wallets/{id}", get(wallets::get_wallet))
        .route("/wallets/{id}/credit", post(wallets::credit_wallet))
        .route("/wallets/{id}/debit", post(wallets::debit_wallet))
        .route("/wallets/{id}/status", patch(wallets::set_wallet_status))
        .route(
            "/wallets/{id}/transactions",
            get(wallets::list_wallet_transactions),
        )
        // --- Checkout configuration ---
        .route(
            "/payment-methods",
            get(payment_methods::list_payment_methods)
                .post(payment_methods::create_payment_method),
        )
        .route(
            "/payment-methods/{id}",
            get(payment_methods::get_payment_method)
                .put(payment_methods::update_payment_method)
                .delete(payment_methods::delete_payment_method),
        )
        .route(
            "/payment-methods/{id}/activate",
            patch(payment_methods::activate_payment_method),
        )
        .route(
            "/payment-methods/{id}/deactivate",
            patch(payment_methods::deactivate_payment_method),
        )
        // --- Support ---
        .route("/tickets", get(tickets::list_tickets))
        .route(
            "/tickets/{id}",
            get(tickets::get_ticket).patch(tickets::update_ticket),
        )
        .route("/tickets/{id}/replies", post(tickets::reply_ticket))
}
