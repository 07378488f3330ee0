//! Order engine service
//!
//! Every mutating operation runs in one database transaction:
//! lock the order row (when there is one), lock the touched item rows in
//! id order, plan against that snapshot, write the plan, commit. Any error
//! before the commit drops the transaction and nothing is persisted. The
//! activity entry is written only after the commit succeeded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    payment::{self, Settlement},
    reconcile, validate_customer_name, validate_lines, ActivityAction, ActivityEvent, Actor,
    LineRequest, Order, OrderDetail, OrderLine, OrderPlan, OrderStatus, OrderType,
    PaginatedResponse, Pagination, PaginationMeta, PaymentMethod, StatusTransition, SubjectType,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use super::activity::ActivityRecorder;
use super::stock;
use crate::error::{AppError, AppResult};

/// Order engine: create, edit, transition and read orders
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    activity: ActivityRecorder,
    per_page: u32,
}

/// Input for creating an order
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    #[validate(length(max = 255, message = "Customer name must be at most 255 characters"))]
    pub customer_name: Option<String>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[validate(length(min = 1, message = "An order needs at least one item"))]
    pub items: Vec<LineRequest>,
    pub payment: Option<PaymentInput>,
}

/// Input for editing an order
///
/// Status is not part of an edit; unknown fields such as `status` are
/// rejected so a status change cannot slip through here.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EditOrderInput {
    #[validate(length(max = 255, message = "Customer name must be at most 255 characters"))]
    pub customer_name: Option<String>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[validate(length(min = 1, message = "An order needs at least one item"))]
    pub items: Vec<LineRequest>,
    pub payment: Option<PaymentInput>,
}

/// Payment block of a create or edit request
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
    pub method: PaymentMethod,
    pub amount_paid: Option<Decimal>,
    pub reference: Option<String>,
}

impl PaymentInput {
    fn settle(&self, total: Decimal) -> AppResult<Settlement> {
        Ok(payment::settle(
            self.method,
            self.amount_paid,
            self.reference.as_deref(),
            total,
        )?)
    }

    fn settle_edit(&self, current: &Settlement, total: Decimal) -> AppResult<Settlement> {
        Ok(payment::settle_edit(
            current,
            self.method,
            self.amount_paid,
            self.reference.as_deref(),
            total,
        )?)
    }
}

/// Order list filters
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Cancel request body
///
/// `wastage` must be given explicitly; cancelling is one-way and decides
/// whether stock comes back.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CancelInput {
    pub wastage: bool,
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    customer_name: Option<String>,
    order_type: String,
    status: String,
    total_amount: Decimal,
    payment_method: String,
    amount_paid: Decimal,
    change_due: Decimal,
    payment_reference: Option<String>,
    wastage: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order_type = OrderType::from_str(&row.order_type)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Unknown order type '{}'", row.order_type)))?;
        let status = OrderStatus::from_str(&row.status)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Unknown order status '{}'", row.status)))?;
        let payment_method = PaymentMethod::from_str(&row.payment_method).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Unknown payment method '{}'", row.payment_method))
        })?;

        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            customer_name: row.customer_name,
            order_type,
            status,
            total_amount: row.total_amount,
            payment_method,
            amount_paid: row.amount_paid,
            change_due: row.change_due,
            payment_reference: row.payment_reference,
            wastage: row.wastage,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderLineRow {
    id: Uuid,
    order_id: Uuid,
    item_id: Uuid,
    item_name: Option<String>,
    quantity: i32,
    price: Decimal,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            order_id: row.order_id,
            item_id: row.item_id,
            item_name: row.item_name,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, customer_name, order_type, status, total_amount, \
     payment_method, amount_paid, change_due, payment_reference, wastage, created_at, updated_at";

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool, per_page: u32) -> Self {
        Self {
            activity: ActivityRecorder::new(db.clone()),
            db,
            per_page,
        }
    }

    /// Create an order, reserving stock for every line
    pub async fn create_order(&self, actor: &Actor, input: CreateOrderInput) -> AppResult<OrderDetail> {
        input.validate()?;
        validate_lines(&input.items)?;
        let customer_name = normalize_customer_name(input.customer_name);
        validate_customer_name(customer_name.as_deref())?;

        let mut tx = self.db.begin().await?;

        let item_ids: Vec<Uuid> = input.items.iter().map(|l| l.item_id).collect();
        let ledger = stock::lock_items(&mut tx, &item_ids).await?;
        let plan = reconcile::plan_create(ledger, &input.items).inspect_err(|e| {
            tracing::warn!(user_id = %actor.user_id, error = %e, "Order creation rejected");
        })?;

        let settlement = match &input.payment {
            Some(p) => p.settle(plan.total_amount)?,
            None => Settlement::unpaid(),
        };

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders (
                user_id, customer_name, order_type, status, total_amount,
                payment_method, amount_paid, change_due, payment_reference
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(actor.user_id)
        .bind(&customer_name)
        .bind(input.order_type.as_str())
        .bind(input.status.as_str())
        .bind(plan.total_amount)
        .bind(settlement.method.as_str())
        .bind(settlement.amount_paid)
        .bind(settlement.change_due)
        .bind(&settlement.reference)
        .fetch_one(&mut *tx)
        .await?;
        let order = Order::try_from(row)?;

        write_lines(&mut tx, order.id, &plan).await?;
        stock::apply_movements(&mut tx, &plan.movements).await?;
        let lines = fetch_lines(&mut tx, order.id).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            total = %order.total_amount,
            lines = lines.len(),
            "Order created"
        );

        let detail = OrderDetail { order, lines };
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Order, detail.order.id, ActivityAction::Created)
                    .with_description(format!(
                        "Created {} order totalling {} ({})",
                        detail.order.order_type, detail.order.total_amount, detail.order.status
                    ))
                    .with_change::<OrderDetail, _>(None, Some(&detail)),
            )
            .await;

        Ok(detail)
    }

    /// Replace an order's lines, moving only the stock difference
    pub async fn edit_order(
        &self,
        actor: &Actor,
        order_id: Uuid,
        input: EditOrderInput,
    ) -> AppResult<OrderDetail> {
        input.validate()?;
        validate_lines(&input.items)?;
        let customer_name = normalize_customer_name(input.customer_name);
        validate_customer_name(customer_name.as_deref())?;

        let mut tx = self.db.begin().await?;

        let before = lock_order(&mut tx, order_id).await?;
        reconcile::ensure_editable(&before, actor).inspect_err(|_| {
            tracing::warn!(order_id = %order_id, user_id = %actor.user_id, "Edit of cancelled order refused");
        })?;

        let current = fetch_lines(&mut tx, order_id).await?;
        let ledger = stock::lock_items(&mut tx, &reconcile::lock_set(&current, &input.items)).await?;
        let plan = reconcile::plan_edit(ledger, &current, &input.items).inspect_err(|e| {
            tracing::warn!(order_id = %order_id, error = %e, "Order edit rejected");
        })?;

        let stored = settlement_of(&before);
        let settlement = match &input.payment {
            Some(p) => p.settle_edit(&stored, plan.total_amount)?,
            None => payment::resettle(&stored, plan.total_amount),
        };

        write_lines(&mut tx, order_id, &plan).await?;
        stock::apply_movements(&mut tx, &plan.movements).await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET customer_name = $2, order_type = $3, total_amount = $4,
                payment_method = $5, amount_paid = $6, change_due = $7,
                payment_reference = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(&customer_name)
        .bind(input.order_type.as_str())
        .bind(plan.total_amount)
        .bind(settlement.method.as_str())
        .bind(settlement.amount_paid)
        .bind(settlement.change_due)
        .bind(&settlement.reference)
        .fetch_one(&mut *tx)
        .await?;
        let order = Order::try_from(row)?;
        let lines = fetch_lines(&mut tx, order_id).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            total = %order.total_amount,
            movements = plan.movements.len(),
            removed = plan.removed.len(),
            "Order updated"
        );

        let before = OrderDetail {
            order: before,
            lines: current,
        };
        let after = OrderDetail { order, lines };
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Order, order_id, ActivityAction::Updated)
                    .with_description(format!(
                        "Updated order, total {} -> {}",
                        before.order.total_amount, after.order.total_amount
                    ))
                    .with_change(Some(&before), Some(&after)),
            )
            .await;

        Ok(after)
    }

    /// Move an order to completed or cancelled
    pub async fn transition_status(
        &self,
        actor: &Actor,
        order_id: Uuid,
        transition: StatusTransition,
    ) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;

        let before = lock_order(&mut tx, order_id).await?;
        let lines = fetch_lines(&mut tx, order_id).await?;

        let ledger = match transition {
            StatusTransition::Cancelled { wastage: false } if before.status != OrderStatus::Cancelled => {
                let item_ids: Vec<Uuid> = lines.iter().map(|l| l.item_id).collect();
                stock::lock_items(&mut tx, &item_ids).await?
            }
            _ => Default::default(),
        };

        let plan = reconcile::plan_transition(ledger, &before, &lines, transition).inspect_err(|e| {
            tracing::warn!(order_id = %order_id, error = %e, "Status transition rejected");
        })?;

        stock::apply_movements(&mut tx, &plan.movements).await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE orders
            SET status = $2, wastage = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(plan.status.as_str())
        .bind(plan.wastage)
        .fetch_one(&mut *tx)
        .await?;
        let order = Order::try_from(row)?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            from = %before.status,
            to = %order.status,
            wastage = order.wastage,
            released = plan.movements.len(),
            "Order status changed"
        );

        let (action, description) = match transition {
            StatusTransition::Completed => (ActivityAction::Completed, "Completed order".to_string()),
            StatusTransition::Cancelled { wastage: true } => (
                ActivityAction::Cancelled,
                "Cancelled order as wastage, stock not returned".to_string(),
            ),
            StatusTransition::Cancelled { wastage: false } => (
                ActivityAction::Cancelled,
                "Cancelled order, stock returned".to_string(),
            ),
        };
        self.activity
            .record(
                ActivityEvent::new(actor, SubjectType::Order, order_id, action)
                    .with_description(description)
                    .with_property("from", serde_json::json!(before.status.as_str()))
                    .with_property("to", serde_json::json!(order.status.as_str()))
                    .with_property("wastage", serde_json::json!(order.wastage)),
            )
            .await;

        Ok(order)
    }

    /// Complete a pending order
    pub async fn complete_order(&self, actor: &Actor, order_id: Uuid) -> AppResult<Order> {
        self.transition_status(actor, order_id, StatusTransition::Completed)
            .await
    }

    /// Cancel an order, returning its stock unless it is wastage
    pub async fn cancel_order(&self, actor: &Actor, order_id: Uuid, wastage: bool) -> AppResult<Order> {
        self.transition_status(actor, order_id, StatusTransition::Cancelled { wastage })
            .await
    }

    /// Get an order with its lines
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<OrderDetail> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let mut conn = self.db.acquire().await?;
        let lines = fetch_lines(&mut conn, order_id).await?;

        Ok(OrderDetail {
            order: row.try_into()?,
            lines,
        })
    }

    /// List orders, newest first
    pub async fn list_orders(&self, filter: OrderFilter) -> AppResult<PaginatedResponse<Order>> {
        let pagination = Pagination::new(filter.page, filter.per_page, self.per_page);
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);
        let status = filter.status.map(|s| s.as_str());
        let order_type = filter.order_type.map(|t| t.as_str());

        const FILTER: &str = r#"
            WHERE ($1::text IS NULL OR id::text ILIKE $1 OR customer_name ILIKE $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR order_type = $3)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM orders {FILTER}"))
            .bind(&search)
            .bind(status)
            .bind(order_type)
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders {FILTER} ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        ))
        .bind(&search)
        .bind(status)
        .bind(order_type)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let data = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(&pagination, total.max(0) as u64),
        })
    }

    /// Latest orders for the dashboard
    pub async fn recent_orders(&self, limit: i64) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}

/// Lock an order row for the rest of the transaction
async fn lock_order(conn: &mut PgConnection, order_id: Uuid) -> AppResult<Order> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    row.try_into()
}

async fn fetch_lines(conn: &mut PgConnection, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
    let rows = sqlx::query_as::<_, OrderLineRow>(
        r#"
        SELECT oi.id, oi.order_id, oi.item_id, i.name AS item_name, oi.quantity, oi.price
        FROM order_items oi
        JOIN items i ON i.id = oi.item_id
        WHERE oi.order_id = $1
        ORDER BY oi.created_at, oi.id
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(OrderLine::from).collect())
}

/// Write the planned line set: drop removed lines, update kept ones, insert new ones
async fn write_lines(conn: &mut PgConnection, order_id: Uuid, plan: &OrderPlan) -> AppResult<()> {
    for item_id in &plan.removed {
        sqlx::query("DELETE FROM order_items WHERE order_id = $1 AND item_id = $2")
            .bind(order_id)
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
    }

    for line in &plan.lines {
        if line.existing {
            sqlx::query(
                r#"
                UPDATE order_items
                SET quantity = $3, price = $4, updated_at = NOW()
                WHERE order_id = $1 AND item_id = $2
                "#,
            )
            .bind(order_id)
            .bind(line.item_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *conn)
            .await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, item_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(line.item_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

fn settlement_of(order: &Order) -> Settlement {
    Settlement {
        method: order.payment_method,
        amount_paid: order.amount_paid,
        change_due: order.change_due,
        reference: order.payment_reference.clone(),
    }
}

/// Trimmed customer name; blank means no name
fn normalize_customer_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// `%term%` with LIKE wildcards in the term escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
