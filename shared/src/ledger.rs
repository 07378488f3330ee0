//! Stock ledger working set
//!
//! A `StockLedger` holds the stock levels of the items one order operation
//! touches, as read under row locks, and records every reserve/release
//! applied to them. The database layer replays the recorded movements in
//! the same transaction, so the checks made here are the checks that hold
//! at commit time.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;

/// Current stock and price of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    /// Decrement stock to fulfil an order line
    Reserve,
    /// Return previously reserved stock
    Release,
}

/// A single change to an item's stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub item_id: Uuid,
    pub direction: MovementDirection,
    pub quantity: i32,
}

impl StockMovement {
    /// Change in on-hand quantity caused by this movement
    pub fn signed_delta(&self) -> i32 {
        match self.direction {
            MovementDirection::Reserve => -self.quantity,
            MovementDirection::Release => self.quantity,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StockLedger {
    levels: HashMap<Uuid, StockLevel>,
    movements: Vec<StockMovement>,
}

impl StockLedger {
    pub fn new(levels: impl IntoIterator<Item = StockLevel>) -> Self {
        Self {
            levels: levels.into_iter().map(|l| (l.item_id, l)).collect(),
            movements: Vec::new(),
        }
    }

    pub fn contains(&self, item_id: Uuid) -> bool {
        self.levels.contains_key(&item_id)
    }

    pub fn level(&self, item_id: Uuid) -> Result<&StockLevel, OrderError> {
        self.levels
            .get(&item_id)
            .ok_or_else(|| OrderError::NotFound("Item".to_string()))
    }

    pub fn available(&self, item_id: Uuid) -> Result<i32, OrderError> {
        self.level(item_id).map(|l| l.quantity)
    }

    /// Decrement stock by `quantity` iff at least that much is on hand
    pub fn reserve(&mut self, item_id: Uuid, quantity: i32) -> Result<(), OrderError> {
        ensure_positive(quantity)?;
        let level = self
            .levels
            .get_mut(&item_id)
            .ok_or_else(|| OrderError::NotFound("Item".to_string()))?;

        if level.quantity < quantity {
            return Err(OrderError::InsufficientStock {
                item_name: level.name.clone(),
                requested: quantity,
                available: level.quantity,
            });
        }

        level.quantity -= quantity;
        self.movements.push(StockMovement {
            item_id,
            direction: MovementDirection::Reserve,
            quantity,
        });
        Ok(())
    }

    /// Increment stock by `quantity`; there is no upper bound
    pub fn release(&mut self, item_id: Uuid, quantity: i32) -> Result<(), OrderError> {
        ensure_positive(quantity)?;
        let level = self
            .levels
            .get_mut(&item_id)
            .ok_or_else(|| OrderError::NotFound("Item".to_string()))?;

        level.quantity = level
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| OrderError::validation("quantity", "Stock quantity is out of range"))?;
        self.movements.push(StockMovement {
            item_id,
            direction: MovementDirection::Release,
            quantity,
        });
        Ok(())
    }

    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }

    pub fn into_movements(self) -> Vec<StockMovement> {
        self.movements
    }
}

fn ensure_positive(quantity: i32) -> Result<(), OrderError> {
    if quantity <= 0 {
        return Err(OrderError::validation("quantity", "Quantity must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(quantity: i32) -> StockLevel {
        StockLevel {
            item_id: Uuid::new_v4(),
            name: "Iced Coffee".to_string(),
            quantity,
            price: Decimal::from(100),
        }
    }

    #[test]
    fn test_reserve_decrements() {
        let item = level(10);
        let id = item.item_id;
        let mut ledger = StockLedger::new([item]);

        ledger.reserve(id, 2).unwrap();
        assert_eq!(ledger.available(id).unwrap(), 8);
        assert_eq!(ledger.movements().len(), 1);
        assert_eq!(ledger.movements()[0].signed_delta(), -2);
    }

    #[test]
    fn test_reserve_whole_stock_reaches_zero() {
        let item = level(3);
        let id = item.item_id;
        let mut ledger = StockLedger::new([item]);

        ledger.reserve(id, 3).unwrap();
        assert_eq!(ledger.available(id).unwrap(), 0);
    }

    #[test]
    fn test_reserve_insufficient_leaves_stock() {
        let item = level(1);
        let id = item.item_id;
        let mut ledger = StockLedger::new([item]);

        let err = ledger.reserve(id, 2).unwrap_err();
        assert_eq!(
            err,
            OrderError::InsufficientStock {
                item_name: "Iced Coffee".to_string(),
                requested: 2,
                available: 1,
            }
        );
        assert_eq!(ledger.available(id).unwrap(), 1);
        assert!(ledger.movements().is_empty());
    }

    #[test]
    fn test_release_is_unbounded() {
        let item = level(0);
        let id = item.item_id;
        let mut ledger = StockLedger::new([item]);

        ledger.release(id, 50).unwrap();
        ledger.release(id, 50).unwrap();
        assert_eq!(ledger.available(id).unwrap(), 100);
    }

    #[test]
    fn test_release_overflow_rejected() {
        let item = level(i32::MAX);
        let id = item.item_id;
        let mut ledger = StockLedger::new([item]);

        assert!(matches!(ledger.release(id, 1), Err(OrderError::Validation { .. })));
        assert_eq!(ledger.available(id).unwrap(), i32::MAX);
    }

    #[test]
    fn test_non_positive_quantities_rejected() {
        let item = level(5);
        let id = item.item_id;
        let mut ledger = StockLedger::new([item]);

        assert!(ledger.reserve(id, 0).is_err());
        assert!(ledger.release(id, -1).is_err());
        assert!(ledger.movements().is_empty());
    }

    #[test]
    fn test_unknown_item() {
        let mut ledger = StockLedger::default();
        assert_eq!(
            ledger.reserve(Uuid::new_v4(), 1),
            Err(OrderError::NotFound("Item".to_string()))
        );
    }
}
