//! Payment allocation tests
//!
//! Tests for payment reconciliation including:
//! - Allocation sum validation (exact equality with the payment amount)
//! - Derived payment status as a pure function of active allocations
//! - Partial payment accumulation across multiple payments

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{derive_payment_status, validate_allocation_amounts, PaymentStatus};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod allocation_validation {
    use super::*;

    #[test]
    fn test_exact_sum_is_accepted() {
        let amounts = vec![dec("400"), dec("600")];
        assert!(validate_allocation_amounts(dec("1000"), &amounts).is_ok());
    }

    #[test]
    fn test_single_allocation_covers_whole_payment() {
        assert!(validate_allocation_amounts(dec("99.99"), &[dec("99.99")]).is_ok());
    }

    #[test]
    fn test_empty_allocation_list_is_rejected() {
        assert!(validate_allocation_amounts(dec("1000"), &[]).is_err());
    }

    #[test]
    fn test_sum_below_total_is_rejected() {
        let amounts = vec![dec("400"), dec("500")];
        assert!(validate_allocation_amounts(dec("1000"), &amounts).is_err());
    }

    #[test]
    fn test_sum_above_total_is_rejected() {
        let amounts = vec![dec("400"), dec("700")];
        assert!(validate_allocation_amounts(dec("1000"), &amounts).is_err());
    }

    #[test]
    fn test_zero_and_negative_amounts_are_rejected() {
        assert!(validate_allocation_amounts(dec("100"), &[dec("100"), dec("0")]).is_err());
        assert!(validate_allocation_amounts(dec("50"), &[dec("100"), dec("-50")]).is_err());
    }

    #[test]
    fn test_cent_precision_must_match_exactly() {
        assert!(validate_allocation_amounts(dec("100.00"), &[dec("99.99")]).is_err());
        assert!(validate_allocation_amounts(dec("100.00"), &[dec("99.99"), dec("0.01")]).is_ok());
    }
}

#[cfg(test)]
mod status_derivation {
    use super::*;

    #[test]
    fn test_nothing_allocated_is_unpaid() {
        assert_eq!(
            derive_payment_status(Decimal::ZERO, dec("1000")),
            PaymentStatus::Unpaid
        );
    }

    #[test]
    fn test_partial_allocation() {
        assert_eq!(
            derive_payment_status(dec("400"), dec("1000")),
            PaymentStatus::PartiallyPaid
        );
        assert_eq!(
            derive_payment_status(dec("999.99"), dec("1000")),
            PaymentStatus::PartiallyPaid
        );
    }

    #[test]
    fn test_full_allocation_is_paid() {
        assert_eq!(
            derive_payment_status(dec("1000"), dec("1000")),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_over_allocation_still_reads_paid() {
        assert_eq!(
            derive_payment_status(dec("1200"), dec("1000")),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_zero_total_document_stays_unpaid_without_allocations() {
        assert_eq!(
            derive_payment_status(Decimal::ZERO, Decimal::ZERO),
            PaymentStatus::Unpaid
        );
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let first = derive_payment_status(dec("400"), dec("1000"));
        let second = derive_payment_status(dec("400"), dec("1000"));
        assert_eq!(first, second);
    }
}

#[cfg(test)]
mod partial_payment_accumulation {
    use super::*;

    /// Document with total 1000: a 400 payment leaves it partially paid,
    /// a further 600 pays it off; allocations across both payments sum
    /// to the document total.
    #[test]
    fn test_two_payments_pay_off_a_document() {
        let total = dec("1000");

        let first_allocation = dec("400");
        assert!(validate_allocation_amounts(first_allocation, &[first_allocation]).is_ok());
        let allocated = first_allocation;
        assert_eq!(
            derive_payment_status(allocated, total),
            PaymentStatus::PartiallyPaid
        );

        let second_allocation = dec("600");
        assert!(validate_allocation_amounts(second_allocation, &[second_allocation]).is_ok());
        let allocated = allocated + second_allocation;
        assert_eq!(derive_payment_status(allocated, total), PaymentStatus::Paid);

        assert_eq!(allocated, total);
    }

    /// One payment split across two documents: each document's status is
    /// derived from its own allocation only.
    #[test]
    fn test_one_payment_across_two_documents() {
        let amounts = vec![dec("250"), dec("750")];
        assert!(validate_allocation_amounts(dec("1000"), &amounts).is_ok());

        assert_eq!(
            derive_payment_status(amounts[0], dec("250")),
            PaymentStatus::Paid
        );
        assert_eq!(
            derive_payment_status(amounts[1], dec("2000")),
            PaymentStatus::PartiallyPaid
        );
    }

    /// Voiding an allocation walks the status back on recomputation
    #[test]
    fn test_voided_allocation_reverts_status() {
        let total = dec("1000");
        let active = dec("400") + dec("600");
        assert_eq!(derive_payment_status(active, total), PaymentStatus::Paid);

        // Void the 600 allocation: only 400 remains active
        let active = active - dec("600");
        assert_eq!(
            derive_payment_status(active, total),
            PaymentStatus::PartiallyPaid
        );

        // Void the rest: back to unpaid
        let active = active - dec("400");
        assert_eq!(derive_payment_status(active, total), PaymentStatus::Unpaid);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for money amounts in cents (0.01 .. 100000.00)
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        /// A list of positive amounts always validates against its own
        /// sum, and fails against any different total.
        #[test]
        fn allocations_validate_against_their_sum(
            amounts in prop::collection::vec(amount_strategy(), 1..10),
            perturbation in 1i64..=1_000_000
        ) {
            let sum: Decimal = amounts.iter().sum();
            prop_assert!(validate_allocation_amounts(sum, &amounts).is_ok());

            let wrong_total = sum + Decimal::new(perturbation, 2);
            prop_assert!(validate_allocation_amounts(wrong_total, &amounts).is_err());
        }

        /// Derived status matches the defining conditions exactly.
        #[test]
        fn status_matches_allocation_conditions(
            allocated_cents in 0i64..=10_000_000,
            total_cents in 1i64..=10_000_000
        ) {
            let allocated = Decimal::new(allocated_cents, 2);
            let total = Decimal::new(total_cents, 2);

            let status = derive_payment_status(allocated, total);
            match status {
                PaymentStatus::Unpaid => prop_assert!(allocated <= Decimal::ZERO),
                PaymentStatus::PartiallyPaid => {
                    prop_assert!(allocated > Decimal::ZERO && allocated < total)
                }
                PaymentStatus::Paid => prop_assert!(allocated >= total),
            }
        }

        /// Adding a further allocation never moves a document away from
        /// paid: status progresses monotonically toward paid.
        #[test]
        fn status_progression_is_monotonic(
            first_cents in 0i64..=10_000_000,
            additional_cents in 1i64..=10_000_000,
            total_cents in 1i64..=10_000_000
        ) {
            let total = Decimal::new(total_cents, 2);
            let first = Decimal::new(first_cents, 2);
            let more = first + Decimal::new(additional_cents, 2);

            let rank = |s: PaymentStatus| match s {
                PaymentStatus::Unpaid => 0,
                PaymentStatus::PartiallyPaid => 1,
                PaymentStatus::Paid => 2,
            };

            prop_assert!(
                rank(derive_payment_status(more, total))
                    >= rank(derive_payment_status(first, total))
            );
        }
    }
}
