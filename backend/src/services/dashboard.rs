//! Dashboard statistics

use serde::Serialize;
use shared::Order;
use sqlx::PgPool;

use super::order::OrderService;
use crate::error::AppResult;

const RECENT_ORDERS: i64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_items: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub low_stock_items: i64,
    pub recent_orders: Vec<Order>,
}

impl DashboardService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn stats(&self, low_stock_threshold: i32, per_page: u32) -> AppResult<DashboardStats> {
        let (total_items, low_stock_items) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE quantity <= $1)
            FROM items
            "#,
        )
        .bind(low_stock_threshold)
        .fetch_one(&self.db)
        .await?;

        let (total_orders, pending_orders) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'pending')
            FROM orders
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let recent_orders = OrderService::new(self.db.clone(), per_page)
            .recent_orders(RECENT_ORDERS)
            .await?;

        Ok(DashboardStats {
            total_items,
            total_orders,
            pending_orders,
            low_stock_items,
            recent_orders,
        })
    }
}
