//! WebAssembly module for the POS screen
//!
//! Client-side arithmetic for the cart and the payment panel, built on the
//! same `shared` functions the server uses:
//! - Cart totals and item counts
//! - Per-item quantity caps while creating or editing an order
//! - Change due and quick cash suggestions
//!
//! Money crosses the boundary as decimal strings so nothing is rounded
//! through `f64`.

use std::str::FromStr;

use rust_decimal::Decimal;
use shared::cart::{self, CartEntry, CartMode};
use shared::payment;
use shared::PaymentMethod;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("POS helpers loaded"));
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|_| format!("Invalid {}: {}", field, value))
}

fn parse_mode(mode: &str) -> Result<CartMode, String> {
    match mode {
        "create" => Ok(CartMode::Create),
        "edit" => Ok(CartMode::Edit),
        other => Err(format!("Unknown cart mode: {}", other)),
    }
}

fn parse_entries(entries_json: &str) -> Result<Vec<CartEntry>, String> {
    serde_json::from_str(entries_json).map_err(|e| format!("Invalid cart JSON: {}", e))
}

fn js_error(message: String) -> JsValue {
    JsValue::from_str(&message)
}

/// Cart total as a 2dp decimal string
#[wasm_bindgen]
pub fn cart_total(entries_json: &str) -> Result<String, JsValue> {
    let entries = parse_entries(entries_json).map_err(js_error)?;
    Ok(cart::cart_total(&entries).round_dp(2).to_string())
}

/// Number of units in the cart
#[wasm_bindgen]
pub fn cart_item_count(entries_json: &str) -> Result<i32, JsValue> {
    let entries = parse_entries(entries_json).map_err(js_error)?;
    Ok(cart::cart_item_count(&entries))
}

/// Largest quantity allowed for one item; `mode` is "create" or "edit"
#[wasm_bindgen]
pub fn max_cart_quantity(mode: &str, stock: i32, original_quantity: i32) -> Result<i32, JsValue> {
    let mode = parse_mode(mode).map_err(js_error)?;
    Ok(cart::max_quantity(mode, stock, original_quantity))
}

/// Quantity after a +/- button press; `undefined` means remove the row
#[wasm_bindgen]
pub fn adjust_cart_quantity(mode: &str, entry_json: &str, delta: i32) -> Result<Option<i32>, JsValue> {
    let mode = parse_mode(mode).map_err(js_error)?;
    let entry: CartEntry = serde_json::from_str(entry_json)
        .map_err(|e| js_error(format!("Invalid cart entry JSON: {}", e)))?;
    Ok(cart::adjust_quantity(mode, &entry, delta))
}

/// Change owed for a tender; `method` is "cash" or "gcash"
#[wasm_bindgen]
pub fn change_due(method: &str, amount_paid: &str, total: &str) -> Result<String, JsValue> {
    let method = PaymentMethod::from_str(method)
        .ok_or_else(|| js_error(format!("Unknown payment method: {}", method)))?;
    let paid = parse_decimal("amount paid", amount_paid).map_err(js_error)?;
    let total = parse_decimal("total", total).map_err(js_error)?;
    Ok(payment::change_due(method, paid, total).to_string())
}

/// Suggested cash tenders as a JSON array of decimal strings
#[wasm_bindgen]
pub fn quick_cash_options(total: &str) -> Result<String, JsValue> {
    let total = parse_decimal("total", total).map_err(js_error)?;
    let options: Vec<String> = payment::quick_cash_options(total)
        .iter()
        .map(|d| d.round_dp(2).to_string())
        .collect();
    serde_json::to_string(&options).map_err(|e| js_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CART: &str = r#"[
        {"item_id": "7d7c2c4e-2f1a-4b8e-9a53-0c3e4a1b2c3d", "price": "45.50", "quantity": 2, "stock": 10},
        {"item_id": "1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed", "price": "120.00", "quantity": 1, "stock": 3, "original_quantity": 1}
    ]"#;

    #[test]
    fn test_cart_total_and_count() {
        assert_eq!(cart_total(CART).unwrap(), "211.00");
        assert_eq!(cart_item_count(CART).unwrap(), 3);
        assert!(parse_entries("not json").is_err());
    }

    #[test]
    fn test_cart_item_count_extreme_quantities() {
        let cart = r#"[
            {"item_id": "7d7c2c4e-2f1a-4b8e-9a53-0c3e4a1b2c3d", "price": "1", "quantity": 2147483647, "stock": 0},
            {"item_id": "1b9d6bcd-bbfd-4b2d-9b5d-ab8dfbbd4bed", "price": "1", "quantity": 2147483647, "stock": 0}
        ]"#;
        assert_eq!(cart_item_count(cart).unwrap(), i32::MAX);
    }

    #[test]
    fn test_max_cart_quantity() {
        assert_eq!(max_cart_quantity("create", 5, 3).unwrap(), 5);
        assert_eq!(max_cart_quantity("edit", 5, 3).unwrap(), 8);
        assert!(parse_mode("refund").is_err());
    }

    #[test]
    fn test_adjust_cart_quantity() {
        let entry = r#"{"item_id": "7d7c2c4e-2f1a-4b8e-9a53-0c3e4a1b2c3d", "price": "10", "quantity": 2, "stock": 2, "original_quantity": 1}"#;
        assert_eq!(adjust_cart_quantity("create", entry, 1).unwrap(), Some(2));
        assert_eq!(adjust_cart_quantity("edit", entry, 1).unwrap(), Some(3));
        assert_eq!(adjust_cart_quantity("edit", entry, -2).unwrap(), None);
    }

    #[test]
    fn test_change_due() {
        assert_eq!(change_due("cash", "500", "211.00").unwrap(), "289.00");
        assert_eq!(change_due("cash", "100", "211.00").unwrap(), "0");
        assert_eq!(change_due("gcash", "500", "211.00").unwrap(), "0");
    }

    #[test]
    fn test_quick_cash_options() {
        let json = quick_cash_options("211").unwrap();
        let options: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(options, vec!["300", "311", "400", "411"]);
        assert_eq!(quick_cash_options("0").unwrap(), "[]");
    }
}
