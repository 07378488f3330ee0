//! HTTP handlers for the activity log and dashboard

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::Activity;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::activity::{RecentQuery, RemarksInput, DEFAULT_RECENT_LIMIT};
use crate::services::dashboard::DashboardStats;
use crate::services::{ActivityRecorder, DashboardService};
use crate::AppState;

/// Most recent activity entries
pub async fn list_activities(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<Activity>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let activities = ActivityRecorder::new(state.db).recent(limit).await?;
    Ok(Json(activities))
}

/// Attach remarks to an activity entry
pub async fn save_remarks(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(activity_id): Path<Uuid>,
    Json(input): Json<RemarksInput>,
) -> AppResult<Json<Activity>> {
    let activity = ActivityRecorder::new(state.db)
        .save_remarks(activity_id, input)
        .await?;
    Ok(Json(activity))
}

/// Dashboard counters and the latest orders
pub async fn dashboard(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<DashboardStats>> {
    let inventory = &state.config.inventory;
    let stats = DashboardService::new(state.db.clone())
        .stats(inventory.low_stock_threshold, inventory.orders_per_page)
        .await?;
    Ok(Json(stats))
}
