//! Stock ledger models: positions, transactions, and the status classifier

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ledger transaction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "inventory_transaction_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    OpeningStock,
    Grn,
    Sale,
    SaleReturn,
    PurchaseReturn,
    AdjustmentIn,
    AdjustmentOut,
    SaleReversal,
    GrnReversal,
}

/// Transaction direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    In,
    Out,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::OpeningStock => "opening_stock",
            TransactionKind::Grn => "grn",
            TransactionKind::Sale => "sale",
            TransactionKind::SaleReturn => "sale_return",
            TransactionKind::PurchaseReturn => "purchase_return",
            TransactionKind::AdjustmentIn => "adjustment_in",
            TransactionKind::AdjustmentOut => "adjustment_out",
            TransactionKind::SaleReversal => "sale_reversal",
            TransactionKind::GrnReversal => "grn_reversal",
        }
    }

    /// Inherent direction of the kind. The signed quantity on a
    /// transaction must agree with this.
    pub fn direction(&self) -> TransactionDirection {
        match self {
            TransactionKind::OpeningStock
            | TransactionKind::Grn
            | TransactionKind::SaleReturn
            | TransactionKind::AdjustmentIn
            | TransactionKind::SaleReversal => TransactionDirection::In,
            TransactionKind::Sale
            | TransactionKind::PurchaseReturn
            | TransactionKind::AdjustmentOut
            | TransactionKind::GrnReversal => TransactionDirection::Out,
        }
    }

    /// The compensating kind emitted when a transaction of this kind is
    /// reversed. Only document-driven movements (sale, GRN) are
    /// reversible; everything else is corrected with an adjustment.
    pub fn reversal_kind(&self) -> Option<TransactionKind> {
        match self {
            TransactionKind::Sale => Some(TransactionKind::SaleReversal),
            TransactionKind::Grn => Some(TransactionKind::GrnReversal),
            _ => None,
        }
    }

    pub fn is_reversal(&self) -> bool {
        matches!(
            self,
            TransactionKind::SaleReversal | TransactionKind::GrnReversal
        )
    }

    /// Kinds that represent stock arriving from a supplier; these refresh
    /// `last_restock_date` on the position.
    pub fn is_restock(&self) -> bool {
        matches!(self, TransactionKind::OpeningStock | TransactionKind::Grn)
    }

    /// Document-driven kinds must carry a reference to the originating
    /// document.
    pub fn requires_reference(&self) -> bool {
        matches!(
            self,
            TransactionKind::Grn
                | TransactionKind::Sale
                | TransactionKind::SaleReturn
                | TransactionKind::PurchaseReturn
        )
    }
}

/// Current on-hand quantity for one (item, store) pair.
/// Mutated only by the stock ledger; created on first movement and never
/// hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockPosition {
    pub item_id: Uuid,
    pub store_id: Uuid,
    pub quantity_on_hand: i64,
    pub reserved_quantity: i64,
    pub last_restock_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

/// One immutable ledger entry. Corrections are compensating entries
/// (`reversal_of` points at the original), never edits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub item_id: Uuid,
    pub store_id: Uuid,
    pub kind: TransactionKind,
    /// Signed quantity; the sign encodes direction.
    pub quantity: i64,
    pub batch_no: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reversal_of: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

/// Stock health buckets, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Critical,
    Low,
    Ok,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Critical => "critical",
            StockStatus::Low => "low",
            StockStatus::Ok => "ok",
        }
    }
}

/// Derived valuation and health for one position joined with item pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockHealth {
    pub status: StockStatus,
    pub available_quantity: i64,
    pub cost_valuation: Decimal,
    pub retail_valuation: Decimal,
    pub profit_margin_total: Decimal,
}

/// Classify on-hand quantity against the item's reorder level.
/// Ties favor the more severe bucket.
pub fn classify_stock_status(quantity_on_hand: i64, reorder_level: i64) -> StockStatus {
    if quantity_on_hand <= 0 {
        StockStatus::OutOfStock
    } else if quantity_on_hand <= reorder_level / 2 {
        StockStatus::Critical
    } else if quantity_on_hand <= reorder_level {
        StockStatus::Low
    } else {
        StockStatus::Ok
    }
}

/// Pure valuation over a position snapshot joined with item pricing.
/// Safe to run repeatedly for reporting; no side effects.
pub fn compute_stock_health(
    quantity_on_hand: i64,
    reserved_quantity: i64,
    cost_price: Decimal,
    retail_price: Decimal,
    reorder_level: i64,
) -> StockHealth {
    let available_quantity = quantity_on_hand - reserved_quantity;
    StockHealth {
        status: classify_stock_status(quantity_on_hand, reorder_level),
        available_quantity,
        cost_valuation: Decimal::from(quantity_on_hand) * cost_price,
        retail_valuation: Decimal::from(quantity_on_hand) * retail_price,
        profit_margin_total: Decimal::from(available_quantity) * (retail_price - cost_price),
    }
}
