//! Stock item management service
//!
//! Direct administrative edits of item quantity and price. Order-driven
//! stock movements never pass through here; they go through the order
//! engine and `services::stock`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    validate_name, validate_price, validate_stock_quantity, ActivityAction, ActivityEvent, Actor,
    Item, SubjectType,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use super::activity::ActivityRecorder;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
    activity: ActivityRecorder,
}

/// Input for creating or updating an item
#[derive(Debug, Deserialize, Validate)]
pub struct ItemInput {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    pub category_id: Uuid,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    pub price: Decimal,
}

impl ItemInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        validate_name("name", &self.name)?;
        validate_stock_quantity(self.quantity)?;
        validate_price(self.price)?;
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    category_id: Uuid,
    category_name: Option<String>,
    quantity: i32,
    price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            category_name: row.category_name,
            quantity: row.quantity,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ITEM_SELECT: &str = r#"
    SELECT i.id, i.name, i.category_id, c.name AS category_name,
           i.quantity, i.price, i.created_at, i.updated_at
    FROM items i
    LEFT JOIN categories c ON c.id = i.category_id
"#;

impl ItemService {
    pub fn new(db: PgPool) -> Self {
        Self {
            activity: ActivityRecorder::new(db.clone()),
            db,
        }
    }

    /// List items by name with their category
    pub async fn list_items(&self) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!("{ITEM_SELECT} ORDER BY i.name"))
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    pub async fn get_item(&self, item_id: Uuid) -> AppResult<Item> {
        sqlx::query_as::<_, ItemRow>(&format!("{ITEM_SELECT} WHERE i.id = $1"))
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .map(Item::from)
            .ok_or_else(|| AppError::NotFound("Item".to_string()))
    }

    /// Items at or below the low-stock threshold, scarcest first
    pub async fn low_stock_items(&self, threshold: i32) -> AppResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "{ITEM_SELECT} WHERE i.quantity <= $1 ORDER BY i.quantity, i.name"
        ))
        .bind(threshold)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    pub async fn create_item(&self, actor: &Actor, input: ItemInput) -> AppResult<Item> {
        input.check()?;
        self.ensure_category(input.category_id).await?;

        let item_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO items (name, category_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(input.category_id)
        .bind(input.quantity)
        .bind(input.price.round_dp(2))
        .fetch_one(&self.db)
        .await?;

        let item = self.get_item(item_id).await?;

        tracing::info!(item_id = %item.id, quantity = item.quantity, "Item created");
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Item, item.id, ActivityAction::Created)
                    .with_description(format!("Created item {}", item.name))
                    .with_change::<Item, _>(None, Some(&item)),
            )
            .await;

        Ok(item)
    }

    /// Update an item, including a direct stock correction
    pub async fn update_item(&self, actor: &Actor, item_id: Uuid, input: ItemInput) -> AppResult<Item> {
        input.check()?;
        self.ensure_category(input.category_id).await?;

        let before = self.get_item(item_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = $2, category_id = $3, quantity = $4, price = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .bind(input.name.trim())
        .bind(input.category_id)
        .bind(input.quantity)
        .bind(input.price.round_dp(2))
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Item".to_string()));
        }

        let item = self.get_item(item_id).await?;

        tracing::info!(
            item_id = %item_id,
            quantity_before = before.quantity,
            quantity_after = item.quantity,
            "Item updated"
        );
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Item, item_id, ActivityAction::Updated)
                    .with_description(format!("Updated item {}", item.name))
                    .with_change(Some(&before), Some(&item)),
            )
            .await;

        Ok(item)
    }

    /// Delete an item no order line refers to
    pub async fn delete_item(&self, actor: &Actor, item_id: Uuid) -> AppResult<()> {
        let item = self.get_item(item_id).await?;

        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM order_items WHERE item_id = $1)",
        )
        .bind(item_id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::Conflict {
                resource: "item".to_string(),
                message: "Cannot delete an item that appears on orders".to_string(),
            });
        }

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;

        tracing::info!(item_id = %item_id, "Item deleted");
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Item, item_id, ActivityAction::Deleted)
                    .with_description(format!("Deleted item {}", item.name))
                    .with_change::<Item, Item>(Some(&item), None),
            )
            .await;

        Ok(())
    }

    async fn ensure_category(&self, category_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(category_id)
            .fetch_one(&self.db)
            .await?;

        if !exists {
            return Err(AppError::Validation {
                field: "category_id".to_string(),
                message: "Selected category does not exist".to_string(),
            });
        }
        Ok(())
    }
}
