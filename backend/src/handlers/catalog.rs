//! HTTP handlers for categories and items

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{Category, Item};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, MANAGE_INVENTORY};
use crate::services::category::{CategoryInput, CategoryService};
use crate::services::item::{ItemInput, ItemService};
use crate::AppState;

// ============================================================================
// Categories
// ============================================================================

pub async fn list_categories(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Category>>> {
    let categories = CategoryService::new(state.db).list_categories().await?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    current_user.0.require_permission(MANAGE_INVENTORY)?;
    let category = CategoryService::new(state.db)
        .create_category(&current_user.0.actor(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> AppResult<Json<Category>> {
    current_user.0.require_permission(MANAGE_INVENTORY)?;
    let category = CategoryService::new(state.db)
        .update_category(&current_user.0.actor(), category_id, input)
        .await?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require_permission(MANAGE_INVENTORY)?;
    CategoryService::new(state.db)
        .delete_category(&current_user.0.actor(), category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Items
// ============================================================================

pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Item>>> {
    let items = ItemService::new(state.db).list_items().await?;
    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Item>> {
    let item = ItemService::new(state.db).get_item(item_id).await?;
    Ok(Json(item))
}

/// Items at or below the configured low-stock threshold
pub async fn low_stock_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Item>>> {
    let threshold = state.config.inventory.low_stock_threshold;
    let items = ItemService::new(state.db).low_stock_items(threshold).await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ItemInput>,
) -> AppResult<(StatusCode, Json<Item>)> {
    current_user.0.require_permission(MANAGE_INVENTORY)?;
    let item = ItemService::new(state.db)
        .create_item(&current_user.0.actor(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<ItemInput>,
) -> AppResult<Json<Item>> {
    current_user.0.require_permission(MANAGE_INVENTORY)?;
    let item = ItemService::new(state.db)
        .update_item(&current_user.0.actor(), item_id, input)
        .await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require_permission(MANAGE_INVENTORY)?;
    ItemService::new(state.db)
        .delete_item(&current_user.0.actor(), item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
