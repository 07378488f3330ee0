//! Category and stock item models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A grouping of sellable items (e.g. "Drinks", "Pastries")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stock item that can be sold through orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    /// Joined for list views; absent when the item was loaded on its own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// On-hand quantity, never negative
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether the item is at or below the given low-stock threshold
    pub fn is_low_stock(&self, threshold: i32) -> bool {
        self.quantity <= threshold
    }
}

/// Supplier-side stock (beans, milk, cups) tracked apart from sellable items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supply {
    pub id: Uuid,
    pub name: String,
    pub supplier: String,
    pub quantity: Decimal,
    pub cost_per_unit: Decimal,
    pub reorder_level: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supply {
    /// At or below its reorder level; never true without one
    pub fn needs_reorder(&self) -> bool {
        self.reorder_level.is_some_and(|level| self.quantity <= level)
    }

    /// Value of the stock on hand at cost
    pub fn stock_value(&self) -> Decimal {
        (self.quantity * self.cost_per_unit).round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supply(quantity: i64, reorder_level: Option<i64>) -> Supply {
        Supply {
            id: Uuid::new_v4(),
            name: "Whole milk".to_string(),
            supplier: "Dairy Co".to_string(),
            quantity: Decimal::from(quantity),
            cost_per_unit: Decimal::new(8525, 2),
            reorder_level: reorder_level.map(Decimal::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_needs_reorder() {
        assert!(supply(5, Some(5)).needs_reorder());
        assert!(!supply(6, Some(5)).needs_reorder());
        assert!(!supply(0, None).needs_reorder());
    }

    #[test]
    fn test_stock_value() {
        assert_eq!(supply(4, None).stock_value(), Decimal::new(34100, 2));
    }
}
