//! Payment reconciliation models: outstanding documents, payments, allocations

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kinds of documents that carry an outstanding balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Receivable from a customer
    SalesInvoice,
    /// Payable to a supplier
    GoodsReceivedNote,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::SalesInvoice => "sales_invoice",
            DocumentKind::GoodsReceivedNote => "goods_received_note",
        }
    }
}

/// Payment status of a document. Always derived from the active
/// allocation set, never incremented in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PartiallyPaid => "partially_paid",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// Accepted payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Cheque,
    Other,
}

/// A sales invoice or goods-received-note as the reconciliation engine
/// sees it. The document itself is created by the sales/purchasing flow;
/// `payment_status` is owned by the payment allocation engine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OutstandingDocument {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub counterparty_id: Uuid,
    pub document_no: String,
    pub document_date: NaiveDate,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A payment event. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub counterparty_id: Uuid,
    pub payment_method: PaymentMethod,
    pub reference_number: Option<String>,
    pub total_payment_amount: Decimal,
    pub payment_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Assignment of a portion of one payment to one document.
/// Soft-voided, never deleted, so recomputation keeps its audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentAllocation {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub document_id: Uuid,
    pub allocation_amount: Decimal,
    pub is_voided: bool,
    pub voided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Derive a document's payment status from the sum of its active
/// allocations. Recomputation is idempotent: the same allocation set
/// always yields the same status.
pub fn derive_payment_status(allocated: Decimal, total_amount: Decimal) -> PaymentStatus {
    if allocated <= Decimal::ZERO {
        PaymentStatus::Unpaid
    } else if allocated < total_amount {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Paid
    }
}
