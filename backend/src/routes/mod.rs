//! Route definitions for the POS inventory server

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes; everything under here requires a bearer token
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Order engine
        .nest("/orders", order_routes())
        // Catalog
        .nest("/categories", category_routes())
        .nest("/items", item_routes())
        .nest("/inventory", supply_routes())
        // Audit trail and overview
        .route("/activities", get(handlers::list_activities))
        .route("/activities/:activity_id/remarks", post(handlers::save_remarks))
        .route("/dashboard", get(handlers::dashboard))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Order routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order).put(handlers::edit_order),
        )
        .route("/:order_id/complete", put(handlers::complete_order))
        .route("/:order_id/cancel", put(handlers::cancel_order))
        .route("/:order_id/transition", post(handlers::transition_order))
}

/// Category routes
fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:category_id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
}

/// Item routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/low-stock", get(handlers::low_stock_items))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
}

/// Supplier inventory routes
fn supply_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_supplies).post(handlers::create_supply))
        .route(
            "/:supply_id",
            put(handlers::update_supply).delete(handlers::delete_supply),
        )
}
