//! Payment settlement arithmetic
//!
//! Cash tenders get change back; GCash is always paid in full against the
//! order total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;
use crate::models::PaymentMethod;
use crate::validation::{validate_amount, MAX_NAME_LENGTH};

/// Round-up steps for quick cash suggestions (typical PHP bill sizes)
const QUICK_CASH_STEPS: [i64; 4] = [100, 200, 500, 1000];

/// Flat add-ons offered on top of the total
const QUICK_CASH_ADD_ONS: [i64; 2] = [100, 200];

/// Payment fields as persisted on the order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub method: PaymentMethod,
    pub amount_paid: Decimal,
    pub change_due: Decimal,
    pub reference: Option<String>,
}

impl Settlement {
    /// Unpaid cash settlement, the default for a fresh order
    pub fn unpaid() -> Self {
        Self {
            method: PaymentMethod::Cash,
            amount_paid: Decimal::ZERO,
            change_due: Decimal::ZERO,
            reference: None,
        }
    }
}

/// Change owed to the customer
pub fn change_due(method: PaymentMethod, amount_paid: Decimal, total: Decimal) -> Decimal {
    match method {
        PaymentMethod::Cash => (amount_paid - total).max(Decimal::ZERO).round_dp(2),
        PaymentMethod::Gcash => Decimal::ZERO,
    }
}

/// Settle a payment against an order total
///
/// Cash needs an explicit tender; GCash settles the total itself.
pub fn settle(
    method: PaymentMethod,
    amount_paid: Option<Decimal>,
    reference: Option<&str>,
    total: Decimal,
) -> Result<Settlement, OrderError> {
    match method {
        PaymentMethod::Cash => {
            let paid = amount_paid
                .ok_or_else(|| OrderError::validation("amount_paid", "Amount paid is required for cash"))?
                .round_dp(2);
            if paid < Decimal::ZERO {
                return Err(OrderError::validation("amount_paid", "Amount paid cannot be negative"));
            }
            validate_amount("amount_paid", paid)?;
            Ok(Settlement {
                method,
                amount_paid: paid,
                change_due: change_due(method, paid, total),
                reference: None,
            })
        }
        PaymentMethod::Gcash => {
            let reference = reference.map(str::trim).filter(|r| !r.is_empty());
            if reference.is_some_and(|r| r.chars().count() > MAX_NAME_LENGTH) {
                return Err(OrderError::validation(
                    "payment_reference",
                    format!("Payment reference must be at most {} characters", MAX_NAME_LENGTH),
                ));
            }
            Ok(Settlement {
                method,
                amount_paid: total.round_dp(2),
                change_due: Decimal::ZERO,
                reference: reference.map(str::to_string),
            })
        }
    }
}

/// Settle an edit's payment block against the stored settlement
///
/// A cash block without an amount keeps the tender already recorded on a
/// cash order.
pub fn settle_edit(
    current: &Settlement,
    method: PaymentMethod,
    amount_paid: Option<Decimal>,
    reference: Option<&str>,
    total: Decimal,
) -> Result<Settlement, OrderError> {
    let amount_paid = match (method, amount_paid) {
        (PaymentMethod::Cash, None) if current.method == PaymentMethod::Cash => Some(current.amount_paid),
        (_, paid) => paid,
    };
    settle(method, amount_paid, reference, total)
}

/// Re-settle an existing payment after the order total changed
pub fn resettle(current: &Settlement, total: Decimal) -> Settlement {
    match current.method {
        PaymentMethod::Cash => Settlement {
            change_due: change_due(current.method, current.amount_paid, total),
            ..current.clone()
        },
        PaymentMethod::Gcash => Settlement {
            amount_paid: total.round_dp(2),
            change_due: Decimal::ZERO,
            ..current.clone()
        },
    }
}

fn round_up(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    (value / step).ceil() * step
}

/// Suggested cash tenders for a total, ascending, at most four
pub fn quick_cash_options(total: Decimal) -> Vec<Decimal> {
    if total <= Decimal::ZERO {
        return Vec::new();
    }

    let mut rounded: Vec<Decimal> = Vec::new();
    for step in QUICK_CASH_STEPS {
        let target = round_up(total, Decimal::from(step));
        if target > total && !rounded.contains(&target) {
            rounded.push(target);
        }
    }
    rounded.truncate(3);

    let mut options = rounded;
    for add_on in QUICK_CASH_ADD_ONS {
        let target = (total + Decimal::from(add_on)).round_dp(2);
        if !options.contains(&target) {
            options.push(target);
        }
    }

    options.sort();
    options.truncate(4);
    options
}
