//! Stock ledger persistence
//!
//! Row-level locking and replay of planned stock movements. Every function
//! here runs on the caller's transaction connection; locks taken by
//! `lock_items` are held until that transaction commits or rolls back.

use rust_decimal::Decimal;
use shared::{MovementDirection, StockLedger, StockLevel, StockMovement};
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Row for the locking read
#[derive(Debug, FromRow)]
struct StockRow {
    id: Uuid,
    name: String,
    quantity: i32,
    price: Decimal,
}

impl From<StockRow> for StockLevel {
    fn from(row: StockRow) -> Self {
        StockLevel {
            item_id: row.id,
            name: row.name,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

/// Lock the given item rows `FOR UPDATE` and load them into a ledger
///
/// Rows are locked in id order so two transactions touching overlapping
/// item sets always queue instead of deadlocking. Unknown ids are simply
/// absent from the ledger; the planner reports them.
pub async fn lock_items(conn: &mut PgConnection, item_ids: &[Uuid]) -> AppResult<StockLedger> {
    let mut ids = item_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(StockLedger::default());
    }

    let rows = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT id, name, quantity, price
        FROM items
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    tracing::debug!(requested = ids.len(), locked = rows.len(), "Locked item rows");

    Ok(StockLedger::new(rows.into_iter().map(StockLevel::from)))
}

/// Write planned movements to the items table
pub async fn apply_movements(conn: &mut PgConnection, movements: &[StockMovement]) -> AppResult<()> {
    for movement in movements {
        match movement.direction {
            MovementDirection::Reserve => {
                // Guarded decrement; the CHECK (quantity >= 0) constraint backs it up
                let result = sqlx::query(
                    r#"
                    UPDATE items
                    SET quantity = quantity - $2, updated_at = NOW()
                    WHERE id = $1 AND quantity >= $2
                    "#,
                )
                .bind(movement.item_id)
                .bind(movement.quantity)
                .execute(&mut *conn)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::Conflict {
                        resource: "items".to_string(),
                        message: "Stock changed while the order was being saved, please retry"
                            .to_string(),
                    });
                }
            }
            MovementDirection::Release => {
                sqlx::query(
                    r#"
                    UPDATE items
                    SET quantity = quantity + $2, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(movement.item_id)
                .bind(movement.quantity)
                .execute(&mut *conn)
                .await?;
            }
        }
    }

    Ok(())
}
