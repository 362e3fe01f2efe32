//! Reporting service: read-only snapshots for the reporting/UI layer
//!
//! Exposes the stock snapshot (positions joined with item metadata plus
//! derived health) and dashboard metrics. All reads run over the current
//! committed state; nothing here mutates.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{compute_stock_health, StockHealth};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    item_id: Uuid,
    store_id: Uuid,
    sku: String,
    item_name: String,
    store_code: String,
    quantity_on_hand: i64,
    reserved_quantity: i64,
    last_restock_date: Option<NaiveDate>,
    cost_price: Decimal,
    retail_price: Decimal,
    reorder_level: i64,
}

/// One stock position with item metadata and derived health
#[derive(Debug, Serialize)]
pub struct StockSnapshotEntry {
    pub item_id: Uuid,
    pub store_id: Uuid,
    pub sku: String,
    pub item_name: String,
    pub store_code: String,
    pub quantity_on_hand: i64,
    pub reserved_quantity: i64,
    pub last_restock_date: Option<NaiveDate>,
    pub reorder_level: i64,
    #[serde(flatten)]
    pub health: StockHealth,
}

/// Dashboard metrics
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub tracked_positions: i64,
    pub out_of_stock_positions: i64,
    pub below_reorder_positions: i64,
    pub total_cost_valuation: Decimal,
    pub total_retail_valuation: Decimal,
    pub open_documents: i64,
    pub receivable_outstanding: Decimal,
    pub payable_outstanding: Decimal,
}

impl ReportingService {
    /// Create a new ReportingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock snapshot: every position joined with item pricing, plus the
    /// derived status and valuation, optionally restricted to one store
    pub async fn stock_snapshot(
        &self,
        store_id: Option<Uuid>,
    ) -> AppResult<Vec<StockSnapshotEntry>> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT sp.item_id, sp.store_id, i.sku, i.name AS item_name, s.code AS store_code,
                   sp.quantity_on_hand, sp.reserved_quantity, sp.last_restock_date,
                   i.cost_price, i.retail_price, i.reorder_level
            FROM stock_positions sp
            JOIN items i ON i.id = sp.item_id
            JOIN stores s ON s.id = sp.store_id
            WHERE $1::uuid IS NULL OR sp.store_id = $1
            ORDER BY s.code, i.sku
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StockSnapshotEntry {
                health: compute_stock_health(
                    r.quantity_on_hand,
                    r.reserved_quantity,
                    r.cost_price,
                    r.retail_price,
                    r.reorder_level,
                ),
                item_id: r.item_id,
                store_id: r.store_id,
                sku: r.sku,
                item_name: r.item_name,
                store_code: r.store_code,
                quantity_on_hand: r.quantity_on_hand,
                reserved_quantity: r.reserved_quantity,
                last_restock_date: r.last_restock_date,
                reorder_level: r.reorder_level,
            })
            .collect())
    }

    /// Dashboard metrics over ledger and reconciliation state
    pub async fn dashboard_metrics(&self) -> AppResult<DashboardMetrics> {
        let (tracked_positions, out_of_stock_positions, below_reorder_positions) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE sp.quantity_on_hand <= 0),
                       COUNT(*) FILTER (WHERE sp.quantity_on_hand > 0
                                          AND sp.quantity_on_hand <= i.reorder_level)
                FROM stock_positions sp
                JOIN items i ON i.id = sp.item_id
                "#,
            )
            .fetch_one(&self.db)
            .await?;

        let (total_cost_valuation, total_retail_valuation) =
            sqlx::query_as::<_, (Decimal, Decimal)>(
                r#"
                SELECT COALESCE(SUM(sp.quantity_on_hand * i.cost_price), 0),
                       COALESCE(SUM(sp.quantity_on_hand * i.retail_price), 0)
                FROM stock_positions sp
                JOIN items i ON i.id = sp.item_id
                "#,
            )
            .fetch_one(&self.db)
            .await?;

        let (open_documents, receivable_outstanding, payable_outstanding) =
            sqlx::query_as::<_, (i64, Decimal, Decimal)>(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(o.outstanding) FILTER (WHERE o.kind = 'sales_invoice'), 0),
                       COALESCE(SUM(o.outstanding) FILTER (WHERE o.kind = 'goods_received_note'), 0)
                FROM (
                    SELECT d.kind,
                           d.total_amount
                               - COALESCE(SUM(pa.allocation_amount)
                                              FILTER (WHERE NOT pa.is_voided), 0)
                               AS outstanding
                    FROM documents d
                    LEFT JOIN payment_allocations pa ON pa.document_id = d.id
                    WHERE d.is_active AND d.payment_status <> 'paid'
                    GROUP BY d.id, d.kind, d.total_amount
                ) o
                "#,
            )
            .fetch_one(&self.db)
            .await?;

        Ok(DashboardMetrics {
            tracked_positions,
            out_of_stock_positions,
            below_reorder_positions,
            total_cost_valuation,
            total_retail_valuation,
            open_documents,
            receivable_outstanding,
            payable_outstanding,
        })
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record).map_err(|e| {
                crate::error::AppError::Internal(format!("CSV serialization error: {}", e))
            })?;
        }
        let csv_data = String::from_utf8(wtr.into_inner().map_err(|e| {
            crate::error::AppError::Internal(format!("CSV writer error: {}", e))
        })?)
        .map_err(|e| crate::error::AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
