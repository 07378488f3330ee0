//! Category management service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{validate_name, ActivityAction, ActivityEvent, Actor, Category, SubjectType};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use super::activity::ActivityRecorder;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
    activity: ActivityRecorder,
}

/// Input for creating or renaming a category
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl CategoryService {
    pub fn new(db: PgPool) -> Self {
        Self {
            activity: ActivityRecorder::new(db.clone()),
            db,
        }
    }

    /// List categories by name
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, created_at, updated_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn create_category(&self, actor: &Actor, input: CategoryInput) -> AppResult<Category> {
        input.validate()?;
        validate_name("name", &input.name)?;

        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await?;
        let category = Category::from(row);

        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Category, category.id, ActivityAction::Created)
                    .with_description(format!("Created category {}", category.name))
                    .with_change::<Category, _>(None, Some(&category)),
            )
            .await;

        Ok(category)
    }

    pub async fn update_category(
        &self,
        actor: &Actor,
        category_id: Uuid,
        input: CategoryInput,
    ) -> AppResult<Category> {
        input.validate()?;
        validate_name("name", &input.name)?;

        let before = self.get_category(category_id).await?;

        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE categories
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(category_id)
        .bind(input.name.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;
        let category = Category::from(row);

        tracing::info!(category_id = %category.id, "Category updated");
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Category, category.id, ActivityAction::Updated)
                    .with_description(format!("Renamed category {} to {}", before.name, category.name))
                    .with_change(Some(&before), Some(&category)),
            )
            .await;

        Ok(category)
    }

    /// Delete a category that owns no items
    pub async fn delete_category(&self, actor: &Actor, category_id: Uuid) -> AppResult<()> {
        let category = self.get_category(category_id).await?;

        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM items WHERE category_id = $1)",
        )
        .bind(category_id)
        .fetch_one(&self.db)
        .await?;

        if in_use {
            return Err(AppError::Conflict {
                resource: "category".to_string(),
                message: "Cannot delete a category that still has items".to_string(),
            });
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.db)
            .await?;

        tracing::info!(category_id = %category_id, "Category deleted");
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Category, category_id, ActivityAction::Deleted)
                    .with_description(format!("Deleted category {}", category.name))
                    .with_change::<Category, Category>(Some(&category), None),
            )
            .await;

        Ok(())
    }

    async fn get_category(&self, category_id: Uuid) -> AppResult<Category> {
        sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, created_at, updated_at FROM categories WHERE id = $1",
        )
        .bind(category_id)
        .fetch_optional(&self.db)
        .await?
        .map(Category::from)
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }
}
