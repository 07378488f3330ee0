//! Order reconciliation planner
//!
//! Given the stock levels read under lock and the order's current lines,
//! computes everything an order operation has to write: the final line
//! set with price snapshots, the order total, and the stock movements.
//! Any rule violation is returned before a single write happens, and the
//! caller drops its transaction.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::OrderError;
use crate::ledger::{StockLedger, StockMovement};
use crate::models::{Actor, LineRequest, Order, OrderLine, OrderStatus, StatusTransition};
use crate::validation::{validate_amount, validate_lines};

/// A line as it will exist after the operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedLine {
    pub item_id: Uuid,
    pub quantity: i32,
    /// Item price at planning time
    pub price: Decimal,
    /// The order already had a line for this item
    pub existing: bool,
}

impl PlannedLine {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Result of planning a create or an edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPlan {
    /// Final line set, in request order
    pub lines: Vec<PlannedLine>,
    /// Items whose existing lines are deleted
    pub removed: Vec<Uuid>,
    pub total_amount: Decimal,
    pub movements: Vec<StockMovement>,
}

/// Result of planning a status transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionPlan {
    pub status: OrderStatus,
    pub wastage: bool,
    pub movements: Vec<StockMovement>,
}

/// Sum of `price * quantity` over planned lines
pub fn plan_total(lines: &[PlannedLine]) -> Decimal {
    lines.iter().map(PlannedLine::subtotal).sum()
}

/// Item ids whose rows an edit has to lock, sorted for a stable lock order
pub fn lock_set(current: &[OrderLine], requested: &[LineRequest]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = current
        .iter()
        .map(|l| l.item_id)
        .chain(requested.iter().map(|l| l.item_id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    ids.sort_unstable();
    ids
}

/// Plan a new order: reserve every requested quantity at the current price
pub fn plan_create(mut ledger: StockLedger, requested: &[LineRequest]) -> Result<OrderPlan, OrderError> {
    validate_lines(requested)?;
    ensure_known_items(&ledger, requested)?;

    let mut lines = Vec::with_capacity(requested.len());
    for line in requested {
        let price = ledger.level(line.item_id)?.price;
        ledger.reserve(line.item_id, line.quantity)?;
        lines.push(PlannedLine {
            item_id: line.item_id,
            quantity: line.quantity,
            price,
            existing: false,
        });
    }

    let total_amount = plan_total(&lines);
    validate_amount("total_amount", total_amount)?;

    Ok(OrderPlan {
        total_amount,
        lines,
        removed: Vec::new(),
        movements: ledger.into_movements(),
    })
}

/// Plan an edit by diffing the current lines against the requested set
///
/// Kept lines reserve or release the quantity difference and take the
/// item's current price; new lines reserve their full quantity; dropped
/// lines release theirs.
pub fn plan_edit(
    mut ledger: StockLedger,
    current: &[OrderLine],
    requested: &[LineRequest],
) -> Result<OrderPlan, OrderError> {
    validate_lines(requested)?;
    ensure_known_items(&ledger, requested)?;

    let current_by_item: HashMap<Uuid, &OrderLine> =
        current.iter().map(|l| (l.item_id, l)).collect();
    let requested_ids: HashSet<Uuid> = requested.iter().map(|l| l.item_id).collect();

    let mut lines = Vec::with_capacity(requested.len());
    for line in requested {
        let price = ledger.level(line.item_id)?.price;
        let existing = match current_by_item.get(&line.item_id) {
            Some(old) => {
                let diff = line.quantity - old.quantity;
                if diff > 0 {
                    ledger.reserve(line.item_id, diff)?;
                } else if diff < 0 {
                    ledger.release(line.item_id, -diff)?;
                }
                true
            }
            None => {
                ledger.reserve(line.item_id, line.quantity)?;
                false
            }
        };
        lines.push(PlannedLine {
            item_id: line.item_id,
            quantity: line.quantity,
            price,
            existing,
        });
    }

    let mut removed = Vec::new();
    for old in current {
        if !requested_ids.contains(&old.item_id) {
            ledger.release(old.item_id, old.quantity)?;
            removed.push(old.item_id);
        }
    }

    let total_amount = plan_total(&lines);
    validate_amount("total_amount", total_amount)?;

    Ok(OrderPlan {
        total_amount,
        lines,
        removed,
        movements: ledger.into_movements(),
    })
}

/// Plan a status transition
///
/// Completing only works from pending and touches no stock. Cancelling
/// works from any non-cancelled status; without wastage every line is
/// released, with wastage the stock is forfeited.
pub fn plan_transition(
    mut ledger: StockLedger,
    order: &Order,
    lines: &[OrderLine],
    transition: StatusTransition,
) -> Result<TransitionPlan, OrderError> {
    let to = transition.target();
    if order.status.is_terminal() && to == OrderStatus::Cancelled {
        return Err(OrderError::AlreadyCancelled);
    }
    if !order.status.can_transition_to(to) {
        return Err(OrderError::InvalidTransition {
            from: order.status,
            to,
        });
    }

    match transition {
        StatusTransition::Completed => Ok(TransitionPlan {
            status: OrderStatus::Completed,
            wastage: order.wastage,
            movements: Vec::new(),
        }),
        StatusTransition::Cancelled { wastage } => {
            if !wastage {
                for line in lines {
                    ledger.release(line.item_id, line.quantity)?;
                }
            }
            Ok(TransitionPlan {
                status: OrderStatus::Cancelled,
                wastage,
                movements: ledger.into_movements(),
            })
        }
    }
}

/// Cancelled orders without wastage are frozen for non-privileged actors
pub fn ensure_editable(order: &Order, actor: &Actor) -> Result<(), OrderError> {
    if order.status == OrderStatus::Cancelled && !order.wastage && !actor.is_privileged() {
        return Err(OrderError::EditForbidden);
    }
    Ok(())
}

fn ensure_known_items(ledger: &StockLedger, requested: &[LineRequest]) -> Result<(), OrderError> {
    match requested.iter().find(|l| !ledger.contains(l.item_id)) {
        Some(line) => Err(OrderError::validation(
            "items",
            format!("Selected item {} does not exist", line.item_id),
        )),
        None => Ok(()),
    }
}
