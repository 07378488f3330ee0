//! POS cart arithmetic
//!
//! Mirrors the engine's stock rules on the client side: while creating an
//! order a line is capped at the item's stock; while editing, the quantity
//! the order already holds counts as available too.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartMode {
    Create,
    Edit,
}

/// One cart row as the POS screen holds it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub item_id: Uuid,
    pub price: Decimal,
    /// Quantity in the cart
    pub quantity: i32,
    /// Stock currently on hand
    pub stock: i32,
    /// Quantity the order held before this edit session
    #[serde(default)]
    pub original_quantity: i32,
}

/// Largest quantity the cart may hold for an item
pub fn max_quantity(mode: CartMode, stock: i32, original_quantity: i32) -> i32 {
    match mode {
        CartMode::Create => stock,
        CartMode::Edit => stock.saturating_add(original_quantity),
    }
}

/// How many more units may still be added
pub fn remaining(mode: CartMode, entry: &CartEntry) -> i32 {
    max_quantity(mode, entry.stock, entry.original_quantity).saturating_sub(entry.quantity)
}

/// Cart quantity after applying `delta`, or `None` when the row should be
/// removed; increases past the cap leave the quantity unchanged
pub fn adjust_quantity(mode: CartMode, entry: &CartEntry, delta: i32) -> Option<i32> {
    let next = entry.quantity.saturating_add(delta);
    if next <= 0 {
        return None;
    }
    if next <= max_quantity(mode, entry.stock, entry.original_quantity) {
        Some(next)
    } else {
        Some(entry.quantity)
    }
}

pub fn cart_total(entries: &[CartEntry]) -> Decimal {
    entries
        .iter()
        .map(|e| e.price * Decimal::from(e.quantity))
        .sum()
}

pub fn cart_item_count(entries: &[CartEntry]) -> i32 {
    entries
        .iter()
        .fold(0i32, |count, e| count.saturating_add(e.quantity))
}
