//! Validation utilities for the POS inventory platform

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::error::OrderError;
use crate::models::LineRequest;

/// Longest name accepted for customers, items and categories
pub const MAX_NAME_LENGTH: usize = 255;

/// Longest remark accepted on an activity entry
pub const MAX_REMARKS_LENGTH: usize = 1000;

/// Largest price a NUMERIC(10,2) column holds
pub fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Largest amount a NUMERIC(12,2) order column holds
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

// ============================================================================
// Order Validations
// ============================================================================

/// Validate the requested line set of an order
///
/// Lines must be non-empty, each quantity at least 1, and an item may
/// appear only once.
pub fn validate_lines(lines: &[LineRequest]) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::validation("items", "An order needs at least one item"));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.quantity < 1 {
            return Err(OrderError::validation("items", "Quantity must be at least 1"));
        }
        if !seen.insert(line.item_id) {
            return Err(OrderError::validation("items", "Each item may appear only once per order"));
        }
    }
    Ok(())
}

/// Validate a non-negative figure stored as NUMERIC(12,2)
pub fn validate_amount(field: &str, amount: Decimal) -> Result<(), OrderError> {
    if amount < Decimal::ZERO {
        return Err(OrderError::validation(field, format!("{} cannot be negative", field)));
    }
    if amount > max_amount() {
        return Err(OrderError::validation(field, format!("{} is too large", field)));
    }
    Ok(())
}

/// Validate an optional customer name
pub fn validate_customer_name(name: Option<&str>) -> Result<(), OrderError> {
    match name {
        Some(n) if n.chars().count() > MAX_NAME_LENGTH => Err(OrderError::validation(
            "customer_name",
            format!("Customer name must be at most {} characters", MAX_NAME_LENGTH),
        )),
        _ => Ok(()),
    }
}

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a required display name (trimmed, 1..=255 characters)
pub fn validate_name(field: &str, name: &str) -> Result<(), OrderError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(OrderError::validation(field, format!("{} is required", field)));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(OrderError::validation(
            field,
            format!("{} must be at most {} characters", field, MAX_NAME_LENGTH),
        ));
    }
    Ok(())
}

/// Validate a stock quantity set directly by an administrator
pub fn validate_stock_quantity(quantity: i32) -> Result<(), OrderError> {
    if quantity < 0 {
        return Err(OrderError::validation("quantity", "Quantity cannot be negative"));
    }
    Ok(())
}

/// Validate an item price
pub fn validate_price(price: Decimal) -> Result<(), OrderError> {
    if price < Decimal::ZERO {
        return Err(OrderError::validation("price", "Price cannot be negative"));
    }
    if price > max_price() {
        return Err(OrderError::validation("price", "Price is too large"));
    }
    Ok(())
}

/// Validate the numeric fields of a supply record
pub fn validate_supply_figures(
    quantity: Decimal,
    cost_per_unit: Decimal,
    reorder_level: Option<Decimal>,
) -> Result<(), OrderError> {
    validate_amount("quantity", quantity)?;
    validate_amount("cost_per_unit", cost_per_unit)?;
    if let Some(level) = reorder_level {
        validate_amount("reorder_level", level)?;
    }
    Ok(())
}

/// Validate activity remarks (1..=1000 characters)
pub fn validate_remarks(remarks: &str) -> Result<(), OrderError> {
    if remarks.trim().is_empty() {
        return Err(OrderError::validation("remarks", "Remarks are required"));
    }
    if remarks.chars().count() > MAX_REMARKS_LENGTH {
        return Err(OrderError::validation(
            "remarks",
            format!("Remarks must be at most {} characters", MAX_REMARKS_LENGTH),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_validate_lines_valid() {
        let lines = vec![
            LineRequest::new(Uuid::new_v4(), 1),
            LineRequest::new(Uuid::new_v4(), 5),
        ];
        assert!(validate_lines(&lines).is_ok());
    }

    #[test]
    fn test_validate_lines_empty() {
        assert!(validate_lines(&[]).is_err());
    }

    #[test]
    fn test_validate_lines_zero_quantity() {
        let lines = vec![LineRequest::new(Uuid::new_v4(), 0)];
        assert!(validate_lines(&lines).is_err());
    }

    #[test]
    fn test_validate_lines_duplicate_item() {
        let id = Uuid::new_v4();
        let lines = vec![LineRequest::new(id, 1), LineRequest::new(id, 2)];
        let err = validate_lines(&lines).unwrap_err();
        assert!(matches!(err, OrderError::Validation { ref field, .. } if field == "items"));
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_amount("total_amount", Decimal::ZERO).is_ok());
        assert!(validate_amount("total_amount", max_amount()).is_ok());
        let err = validate_amount("total_amount", max_amount() + Decimal::new(1, 2)).unwrap_err();
        assert!(matches!(err, OrderError::Validation { ref field, .. } if field == "total_amount"));
        assert!(validate_amount("amount_paid", Decimal::new(-1, 2)).is_err());
    }

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name(None).is_ok());
        assert!(validate_customer_name(Some("Juan")).is_ok());
        assert!(validate_customer_name(Some(&"x".repeat(255))).is_ok());
        assert!(validate_customer_name(Some(&"x".repeat(256))).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Pastries").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"a".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(12050, 2)).is_ok());
        assert!(validate_price(Decimal::new(-1, 2)).is_err());
        assert!(validate_price(max_price()).is_ok());
        assert!(validate_price(max_price() + Decimal::new(1, 2)).is_err());
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_supply_figures() {
        assert!(validate_supply_figures(Decimal::ZERO, Decimal::ZERO, None).is_ok());
        assert!(validate_supply_figures(Decimal::new(125, 1), Decimal::new(4500, 2), Some(Decimal::from(5))).is_ok());

        let err = validate_supply_figures(Decimal::new(-1, 0), Decimal::ZERO, None).unwrap_err();
        assert!(matches!(err, OrderError::Validation { ref field, .. } if field == "quantity"));
        let err = validate_supply_figures(Decimal::ZERO, Decimal::new(-1, 2), None).unwrap_err();
        assert!(matches!(err, OrderError::Validation { ref field, .. } if field == "cost_per_unit"));
        let err = validate_supply_figures(Decimal::ZERO, Decimal::ZERO, Some(Decimal::new(-1, 0))).unwrap_err();
        assert!(matches!(err, OrderError::Validation { ref field, .. } if field == "reorder_level"));
    }

    #[test]
    fn test_validate_remarks() {
        assert!(validate_remarks("Spilled during delivery").is_ok());
        assert!(validate_remarks("").is_err());
        assert!(validate_remarks(&"r".repeat(1001)).is_err());
    }
}
