//! Payment settlement tests
//!
//! Unit and property tests for:
//! - Cash change and GCash full settlement
//! - Re-settlement after an order edit changes the total
//! - Quick cash suggestions

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::payment::{change_due, quick_cash_options, resettle, settle, settle_edit, Settlement};
use shared::{OrderError, PaymentMethod};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn test_new_orders_start_unpaid_cash() {
        let s = Settlement::unpaid();
        assert_eq!(s.method, PaymentMethod::Cash);
        assert_eq!(s.amount_paid, Decimal::ZERO);
        assert_eq!(s.change_due, Decimal::ZERO);
    }

    #[test]
    fn test_cash_without_amount_is_rejected() {
        let err = settle(PaymentMethod::Cash, None, None, dec("120.00")).unwrap_err();
        assert!(matches!(err, OrderError::Validation { ref field, .. } if field == "amount_paid"));
    }

    #[test]
    fn test_edit_without_amount_keeps_tender() {
        let paid = settle(PaymentMethod::Cash, Some(dec("500")), None, dec("120.00")).unwrap();
        let edited = settle_edit(&paid, PaymentMethod::Cash, None, None, dec("450.00")).unwrap();
        assert_eq!(edited.amount_paid, dec("500"));
        assert_eq!(edited.change_due, dec("50.00"));
    }

    #[test]
    fn test_cash_amount_rounded_to_centavos() {
        let s = settle(PaymentMethod::Cash, Some(dec("200.456")), None, dec("150")).unwrap();
        assert_eq!(s.amount_paid, dec("200.46"));
        assert_eq!(s.change_due, dec("50.46"));
    }

    #[test]
    fn test_negative_cash_reports_field() {
        let err = settle(PaymentMethod::Cash, Some(dec("-5")), None, dec("10")).unwrap_err();
        assert!(matches!(err, OrderError::Validation { ref field, .. } if field == "amount_paid"));
    }

    #[test]
    fn test_gcash_reference_limits() {
        let blank = settle(PaymentMethod::Gcash, None, Some("   "), dec("99")).unwrap();
        assert_eq!(blank.reference, None);

        let long = "R".repeat(256);
        let err = settle(PaymentMethod::Gcash, None, Some(&long), dec("99")).unwrap_err();
        assert!(matches!(err, OrderError::Validation { ref field, .. } if field == "payment_reference"));
    }

    #[test]
    fn test_resettle_cash_when_total_drops() {
        let paid = settle(PaymentMethod::Cash, Some(dec("1000")), None, dec("850")).unwrap();
        assert_eq!(paid.change_due, dec("150"));

        let edited = resettle(&paid, dec("600"));
        assert_eq!(edited.amount_paid, dec("1000"));
        assert_eq!(edited.change_due, dec("400"));
    }

    #[test]
    fn test_quick_cash_small_total() {
        assert_eq!(
            quick_cash_options(dec("45")),
            vec![dec("100"), dec("145"), dec("200"), dec("245")]
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn money() -> impl Strategy<Value = Decimal> {
        (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Change is never negative and never more than the overpayment
        #[test]
        fn prop_cash_change_bounds(paid in money(), total in money()) {
            let change = change_due(PaymentMethod::Cash, paid, total);
            prop_assert!(change >= Decimal::ZERO);
            prop_assert!(change <= paid);
            if paid >= total {
                prop_assert_eq!(change, paid - total);
            }
        }

        /// GCash always settles the exact total with no change
        #[test]
        fn prop_gcash_settles_total(paid in money(), total in money()) {
            let s = settle(PaymentMethod::Gcash, Some(paid), None, total).unwrap();
            prop_assert_eq!(s.amount_paid, total);
            prop_assert_eq!(s.change_due, Decimal::ZERO);
        }

        /// Suggestions are ascending, above the total, and at most four
        #[test]
        fn prop_quick_cash_shape(total in money()) {
            let options = quick_cash_options(total);
            prop_assert!(options.len() <= 4);
            prop_assert!(options.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(options.iter().all(|o| *o > total));
            if total > Decimal::ZERO {
                prop_assert!(!options.is_empty());
            }
        }
    }
}
