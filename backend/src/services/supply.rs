//! Supplier inventory service
//!
//! Raw supplies bought from suppliers. These are counted separately from
//! sellable items and orders never move them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    validate_name, validate_supply_figures, ActivityAction, ActivityEvent, Actor,
    PaginatedResponse, Pagination, PaginationMeta, SubjectType, Supply,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use super::activity::ActivityRecorder;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct SupplyService {
    db: PgPool,
    activity: ActivityRecorder,
    per_page: u32,
}

/// Input for creating or updating a supply record
#[derive(Debug, Deserialize, Validate)]
pub struct SupplyInput {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Supplier must be between 1 and 255 characters"))]
    pub supplier: String,
    pub quantity: Decimal,
    pub cost_per_unit: Decimal,
    pub reorder_level: Option<Decimal>,
}

impl SupplyInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        validate_name("name", &self.name)?;
        validate_name("supplier", &self.supplier)?;
        validate_supply_figures(self.quantity, self.cost_per_unit, self.reorder_level)?;
        Ok(())
    }
}

/// Supply list paging
#[derive(Debug, Default, Deserialize)]
pub struct SupplyQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, FromRow)]
struct SupplyRow {
    id: Uuid,
    name: String,
    supplier: String,
    quantity: Decimal,
    cost_per_unit: Decimal,
    reorder_level: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SupplyRow> for Supply {
    fn from(row: SupplyRow) -> Self {
        Supply {
            id: row.id,
            name: row.name,
            supplier: row.supplier,
            quantity: row.quantity,
            cost_per_unit: row.cost_per_unit,
            reorder_level: row.reorder_level,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SUPPLY_COLUMNS: &str =
    "id, name, supplier, quantity, cost_per_unit, reorder_level, created_at, updated_at";

impl SupplyService {
    pub fn new(db: PgPool, per_page: u32) -> Self {
        Self {
            activity: ActivityRecorder::new(db.clone()),
            db,
            per_page,
        }
    }

    /// List supplies, newest first
    pub async fn list_supplies(&self, query: SupplyQuery) -> AppResult<PaginatedResponse<Supply>> {
        let pagination = Pagination::new(query.page, query.per_page, self.per_page);

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inventory_supplies")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, SupplyRow>(&format!(
            "SELECT {SUPPLY_COLUMNS} FROM inventory_supplies ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Supply::from).collect(),
            pagination: PaginationMeta::new(&pagination, total.max(0) as u64),
        })
    }

    pub async fn get_supply(&self, supply_id: Uuid) -> AppResult<Supply> {
        sqlx::query_as::<_, SupplyRow>(&format!(
            "SELECT {SUPPLY_COLUMNS} FROM inventory_supplies WHERE id = $1"
        ))
        .bind(supply_id)
        .fetch_optional(&self.db)
        .await?
        .map(Supply::from)
        .ok_or_else(|| AppError::NotFound("Inventory supply".to_string()))
    }

    pub async fn create_supply(&self, actor: &Actor, input: SupplyInput) -> AppResult<Supply> {
        input.check()?;

        let supply: Supply = sqlx::query_as::<_, SupplyRow>(&format!(
            r#"
            INSERT INTO inventory_supplies (name, supplier, quantity, cost_per_unit, reorder_level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUPPLY_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.supplier.trim())
        .bind(input.quantity.round_dp(2))
        .bind(input.cost_per_unit.round_dp(2))
        .bind(input.reorder_level.map(|l| l.round_dp(2)))
        .fetch_one(&self.db)
        .await?
        .into();

        tracing::info!(supply_id = %supply.id, supplier = %supply.supplier, "Inventory supply created");
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Supply, supply.id, ActivityAction::Created)
                    .with_description(format!("Created inventory supply {}", supply.name))
                    .with_change::<Supply, _>(None, Some(&supply)),
            )
            .await;

        Ok(supply)
    }

    pub async fn update_supply(
        &self,
        actor: &Actor,
        supply_id: Uuid,
        input: SupplyInput,
    ) -> AppResult<Supply> {
        input.check()?;

        let before = self.get_supply(supply_id).await?;

        let supply: Supply = sqlx::query_as::<_, SupplyRow>(&format!(
            r#"
            UPDATE inventory_supplies
            SET name = $2, supplier = $3, quantity = $4, cost_per_unit = $5,
                reorder_level = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {SUPPLY_COLUMNS}
            "#
        ))
        .bind(supply_id)
        .bind(input.name.trim())
        .bind(input.supplier.trim())
        .bind(input.quantity.round_dp(2))
        .bind(input.cost_per_unit.round_dp(2))
        .bind(input.reorder_level.map(|l| l.round_dp(2)))
        .fetch_optional(&self.db)
        .await?
        .map(Supply::from)
        .ok_or_else(|| AppError::NotFound("Inventory supply".to_string()))?;

        if supply.needs_reorder() {
            tracing::warn!(supply_id = %supply_id, quantity = %supply.quantity, "Inventory supply at reorder level");
        }
        tracing::info!(supply_id = %supply_id, "Inventory supply updated");
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Supply, supply_id, ActivityAction::Updated)
                    .with_description(format!("Updated inventory supply {}", supply.name))
                    .with_change(Some(&before), Some(&supply)),
            )
            .await;

        Ok(supply)
    }

    pub async fn delete_supply(&self, actor: &Actor, supply_id: Uuid) -> AppResult<()> {
        let supply = self.get_supply(supply_id).await?;

        let result = sqlx::query("DELETE FROM inventory_supplies WHERE id = $1")
            .bind(supply_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory supply".to_string()));
        }

        tracing::info!(supply_id = %supply_id, "Inventory supply deleted");
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Supply, supply_id, ActivityAction::Deleted)
                    .with_description(format!("Deleted inventory supply {}", supply.name))
                    .with_change::<Supply, Supply>(Some(&supply), None),
            )
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(body: serde_json::Value) -> SupplyInput {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_supply_input_accepts_fractional_quantities() {
        let supply = input(serde_json::json!({
            "name": "Espresso beans",
            "supplier": "Benguet Growers",
            "quantity": "12.5",
            "cost_per_unit": "450.00"
        }));
        assert!(supply.check().is_ok());
        assert_eq!(supply.reorder_level, None);
    }

    #[test]
    fn test_supply_input_rejects_negative_figures() {
        for (field, value) in [("quantity", "-1"), ("cost_per_unit", "-0.01"), ("reorder_level", "-5")] {
            let mut body = serde_json::json!({
                "name": "Paper cups",
                "supplier": "PackRight",
                "quantity": "100",
                "cost_per_unit": "2.50",
                "reorder_level": "20"
            });
            body[field] = serde_json::json!(value);
            match input(body).check() {
                Err(AppError::Validation { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected validation error on {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_supply_input_requires_supplier() {
        let supply = input(serde_json::json!({
            "name": "Oat milk",
            "supplier": "   ",
            "quantity": "6",
            "cost_per_unit": "180"
        }));
        assert!(supply.check().is_err());
    }
}
