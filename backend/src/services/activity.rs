//! Activity log service
//!
//! Records "what changed" events after a mutation has committed. A failed
//! write is logged and dropped; it never fails or rolls back the caller.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{validate_remarks, Activity, ActivityEvent};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Default number of entries on the activity feed
pub const DEFAULT_RECENT_LIMIT: i64 = 20;

#[derive(Clone)]
pub struct ActivityRecorder {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ActivityRow {
    id: Uuid,
    causer_id: Option<Uuid>,
    subject_type: String,
    subject_id: Option<Uuid>,
    action: String,
    description: String,
    properties: serde_json::Value,
    remarks: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Activity {
            id: row.id,
            causer_id: row.causer_id,
            subject_type: row.subject_type,
            subject_id: row.subject_id,
            action: row.action,
            description: row.description,
            properties: row.properties,
            remarks: row.remarks,
            created_at: row.created_at,
        }
    }
}

/// Input for annotating an activity entry
#[derive(Debug, Deserialize, Validate)]
pub struct RemarksInput {
    #[validate(length(min = 1, max = 1000, message = "Remarks must be between 1 and 1000 characters"))]
    pub remarks: String,
}

/// Query string of the activity feed
#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

const ACTIVITY_COLUMNS: &str =
    "id, causer_id, subject_type, subject_id, action, description, properties, remarks, created_at";

impl ActivityRecorder {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Store an event; errors are logged, not returned
    pub async fn record(&self, event: ActivityEvent) {
        if let Err(e) = self.insert(&event).await {
            tracing::warn!(
                subject_type = event.subject_type.as_str(),
                subject_id = %event.subject_id,
                action = event.action.as_str(),
                error = %e,
                "Failed to record activity"
            );
        }
    }

    async fn insert(&self, event: &ActivityEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (causer_id, subject_type, subject_id, action, description, properties)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.actor_id)
        .bind(event.subject_type.as_str())
        .bind(event.subject_id)
        .bind(event.action.as_str())
        .bind(&event.description)
        .bind(&event.properties)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<Activity>> {
        let limit = limit.clamp(1, 100);

        let rows = sqlx::query_as::<_, ActivityRow>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activity_log ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Activity::from).collect())
    }

    /// Attach a user note to an existing entry
    pub async fn save_remarks(&self, activity_id: Uuid, input: RemarksInput) -> AppResult<Activity> {
        input.validate()?;
        let remarks = input.remarks.trim().to_string();
        validate_remarks(&remarks)?;

        let row = sqlx::query_as::<_, ActivityRow>(&format!(
            "UPDATE activity_log SET remarks = $2 WHERE id = $1 RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(activity_id)
        .bind(&remarks)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Activity".to_string()))?;

        tracing::info!(activity_id = %activity_id, "Activity remarks saved");

        Ok(row.into())
    }
}
