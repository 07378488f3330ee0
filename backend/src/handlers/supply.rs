//! HTTP handlers for supplier inventory (Super Admin only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{PaginatedResponse, Supply};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::supply::{SupplyInput, SupplyQuery, SupplyService};
use crate::AppState;

fn service(state: &AppState) -> SupplyService {
    SupplyService::new(state.db.clone(), state.config.inventory.orders_per_page)
}

pub async fn list_supplies(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SupplyQuery>,
) -> AppResult<Json<PaginatedResponse<Supply>>> {
    current_user.0.require_super_admin()?;
    let supplies = service(&state).list_supplies(query).await?;
    Ok(Json(supplies))
}

pub async fn create_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SupplyInput>,
) -> AppResult<(StatusCode, Json<Supply>)> {
    current_user.0.require_super_admin()?;
    let supply = service(&state)
        .create_supply(&current_user.0.actor(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(supply)))
}

pub async fn update_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
    Json(input): Json<SupplyInput>,
) -> AppResult<Json<Supply>> {
    current_user.0.require_super_admin()?;
    let supply = service(&state)
        .update_supply(&current_user.0.actor(), supply_id, input)
        .await?;
    Ok(Json(supply))
}

pub async fn delete_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require_super_admin()?;
    service(&state)
        .delete_supply(&current_user.0.actor(), supply_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
