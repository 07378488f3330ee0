//! HTTP handlers for order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{Order, OrderDetail, PaginatedResponse, StatusTransition};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::{CancelInput, CreateOrderInput, EditOrderInput, OrderFilter, OrderService};
use crate::AppState;

fn service(state: &AppState) -> OrderService {
    OrderService::new(state.db.clone(), state.config.inventory.orders_per_page)
}

/// List orders
pub async fn list_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    let orders = service(&state).list_orders(filter).await?;
    Ok(Json(orders))
}

/// Get an order with its lines
pub async fn get_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderDetail>> {
    let order = service(&state).get_order(order_id).await?;
    Ok(Json(order))
}

/// Create an order
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    let order = service(&state)
        .create_order(&current_user.0.actor(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Edit an order's customer, type, lines and payment
pub async fn edit_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<EditOrderInput>,
) -> AppResult<Json<OrderDetail>> {
    let order = service(&state)
        .edit_order(&current_user.0.actor(), order_id, input)
        .await?;
    Ok(Json(order))
}

/// Apply a status transition
pub async fn transition_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(transition): Json<StatusTransition>,
) -> AppResult<Json<Order>> {
    let order = service(&state)
        .transition_status(&current_user.0.actor(), order_id, transition)
        .await?;
    Ok(Json(order))
}

/// Complete a pending order
pub async fn complete_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = service(&state)
        .complete_order(&current_user.0.actor(), order_id)
        .await?;
    Ok(Json(order))
}

/// Cancel an order
pub async fn cancel_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<CancelInput>,
) -> AppResult<Json<Order>> {
    let order = service(&state)
        .cancel_order(&current_user.0.actor(), order_id, input.wastage)
        .await?;
    Ok(Json(order))
}
