//! Validation utilities for the Stock Ledger & Payment Reconciliation Engine

use rust_decimal::Decimal;

// ============================================================================
// Stock Ledger Validations
// ============================================================================

/// Validate a movement quantity: zero moves nothing and is rejected
pub fn validate_movement_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity == 0 {
        return Err("Movement quantity cannot be zero");
    }
    Ok(())
}

/// Project the on-hand quantity after a movement. Outbound movements that
/// would drive the position below zero are rejected unless the movement is
/// explicitly flagged as allowing backorder.
pub fn project_on_hand(
    quantity_on_hand: i64,
    quantity: i64,
    allow_backorder: bool,
) -> Result<i64, &'static str> {
    let projected = quantity_on_hand + quantity;
    if quantity < 0 && projected < 0 && !allow_backorder {
        return Err("Movement would drive on-hand quantity below zero");
    }
    Ok(projected)
}

// ============================================================================
// Payment Allocation Validations
// ============================================================================

/// Validate an allocation set against the payment total: non-empty, every
/// amount positive, and the sum exactly equal to the payment amount.
pub fn validate_allocation_amounts(
    total_payment_amount: Decimal,
    amounts: &[Decimal],
) -> Result<(), &'static str> {
    if amounts.is_empty() {
        return Err("A payment must allocate to at least one document");
    }
    for amount in amounts {
        if *amount <= Decimal::ZERO {
            return Err("Allocation amounts must be positive");
        }
    }
    let sum: Decimal = amounts.iter().sum();
    if sum != total_payment_amount {
        return Err("Allocation amounts must sum exactly to the payment amount");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate a document number (non-empty, at most 40 characters)
pub fn validate_document_no(document_no: &str) -> Result<(), &'static str> {
    if document_no.trim().is_empty() {
        return Err("Document number cannot be empty");
    }
    if document_no.len() > 40 {
        return Err("Document number must be at most 40 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ========================================================================
    // Stock Ledger Validation Tests
    // ========================================================================

    #[test]
    fn test_movement_quantity_nonzero() {
        assert!(validate_movement_quantity(1).is_ok());
        assert!(validate_movement_quantity(-1).is_ok());
        assert!(validate_movement_quantity(0).is_err());
    }

    #[test]
    fn test_project_on_hand_inbound() {
        assert_eq!(project_on_hand(100, 50, false), Ok(150));
        assert_eq!(project_on_hand(0, 10, false), Ok(10));
    }

    #[test]
    fn test_project_on_hand_outbound() {
        assert_eq!(project_on_hand(100, -20, false), Ok(80));
        assert_eq!(project_on_hand(20, -20, false), Ok(0));
    }

    #[test]
    fn test_project_on_hand_insufficient() {
        assert!(project_on_hand(10, -11, false).is_err());
        assert!(project_on_hand(0, -1, false).is_err());
    }

    #[test]
    fn test_project_on_hand_backorder() {
        assert_eq!(project_on_hand(10, -15, true), Ok(-5));
    }

    // ========================================================================
    // Payment Allocation Validation Tests
    // ========================================================================

    #[test]
    fn test_allocation_amounts_exact_sum() {
        let amounts = vec![dec("400"), dec("600")];
        assert!(validate_allocation_amounts(dec("1000"), &amounts).is_ok());
    }

    #[test]
    fn test_allocation_amounts_single() {
        assert!(validate_allocation_amounts(dec("250.50"), &[dec("250.50")]).is_ok());
    }

    #[test]
    fn test_allocation_amounts_empty() {
        assert!(validate_allocation_amounts(dec("100"), &[]).is_err());
    }

    #[test]
    fn test_allocation_amounts_mismatch() {
        let amounts = vec![dec("400"), dec("500")];
        assert!(validate_allocation_amounts(dec("1000"), &amounts).is_err());
    }

    #[test]
    fn test_allocation_amounts_nonpositive() {
        assert!(validate_allocation_amounts(dec("100"), &[dec("100"), dec("0")]).is_err());
        assert!(validate_allocation_amounts(dec("50"), &[dec("100"), dec("-50")]).is_err());
    }

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_document_no() {
        assert!(validate_document_no("INV-2025-0001").is_ok());
        assert!(validate_document_no("").is_err());
        assert!(validate_document_no("   ").is_err());
    }
}
