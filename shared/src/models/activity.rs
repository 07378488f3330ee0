//! Actor context and audit trail models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// The authenticated user an operation runs on behalf of
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_super_admin: bool,
}

impl Actor {
    pub fn new(user_id: Uuid, is_super_admin: bool) -> Self {
        Self {
            user_id,
            is_super_admin,
        }
    }

    /// Privileged actors may edit orders that are otherwise frozen
    pub fn is_privileged(&self) -> bool {
        self.is_super_admin
    }
}

/// Kind of record an activity refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubjectType {
    Order,
    Item,
    Category,
    Supply,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Order => "Order",
            SubjectType::Item => "Item",
            SubjectType::Category => "Category",
            SubjectType::Supply => "Supply",
        }
    }
}

/// What happened to the subject
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Completed,
    Cancelled,
    Deleted,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Created => "created",
            ActivityAction::Updated => "updated",
            ActivityAction::Completed => "completed",
            ActivityAction::Cancelled => "cancelled",
            ActivityAction::Deleted => "deleted",
        }
    }
}

/// A "what changed" event handed to the activity recorder
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub actor_id: Uuid,
    pub subject_type: SubjectType,
    pub subject_id: Uuid,
    pub action: ActivityAction,
    pub description: String,
    pub properties: Value,
}

impl ActivityEvent {
    pub fn new(actor: &Actor, subject_type: SubjectType, subject_id: Uuid, action: ActivityAction) -> Self {
        Self {
            actor_id: actor.user_id,
            subject_type,
            subject_id,
            action,
            description: format!("{} {}", subject_type.as_str(), action.as_str()),
            properties: json!({}),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach before/after snapshots; `None` sides are omitted
    pub fn with_change<B: Serialize, A: Serialize>(mut self, before: Option<&B>, after: Option<&A>) -> Self {
        if let Some(before) = before.and_then(|b| serde_json::to_value(b).ok()) {
            self.properties["before"] = before;
        }
        if let Some(after) = after.and_then(|a| serde_json::to_value(a).ok()) {
            self.properties["after"] = after;
        }
        self
    }

    pub fn with_property(mut self, key: &str, value: Value) -> Self {
        self.properties[key] = value;
        self
    }
}

/// A stored audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub causer_id: Option<Uuid>,
    pub subject_type: String,
    pub subject_id: Option<Uuid>,
    pub action: String,
    pub description: String,
    pub properties: Value,
    /// Free-text note added by a user after the fact
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}
