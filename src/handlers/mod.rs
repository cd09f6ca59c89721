use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{auth, AppState};

pub mod admin_auth;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;

/// Assembles the full HTTP surface. Admin routes sit behind the bearer
/// token middleware; everything else is public.
pub fn app_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/:id/fulfill", put(orders::fulfill_order))
        .route("/api/orders/:id/payment", put(orders::update_payment_flag))
        .route_layer(middleware::from_fn_with_state(
            state.services.auth.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health::health))
        .route("/api/products", get(products::list_products))
        .route("/api/checkout", post(checkout::initiate_checkout))
        .route("/api/verify-payment", get(payments::verify_payment))
        .route("/api/orders/status", get(payments::order_status))
        .route("/api/admin/login", post(admin_auth::login))
        .merge(admin_routes)
        .with_state(state)
}

async fn root() -> &'static str {
    "storefront-api up"
}
