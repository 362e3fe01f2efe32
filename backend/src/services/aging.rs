//! Aging report service
//!
//! Buckets currently-outstanding documents by days elapsed since the
//! document date, summed per counterparty. The outstanding basis is the
//! exact unpaid remainder (total minus active allocations).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{build_aging, AgingInput, AgingReport, DocumentKind};

/// Aging report service
#[derive(Clone)]
pub struct AgingService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct AgingSourceRow {
    counterparty_id: Uuid,
    document_date: NaiveDate,
    total_amount: Decimal,
    allocated_amount: Decimal,
}

impl AgingService {
    /// Create a new AgingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Build the aging report as of a date, optionally restricted to one
    /// document kind (receivable vs payable aging)
    pub async fn build_report(
        &self,
        as_of: NaiveDate,
        kind: Option<DocumentKind>,
    ) -> AppResult<AgingReport> {
        let rows = sqlx::query_as::<_, AgingSourceRow>(
            r#"
            SELECT d.counterparty_id, d.document_date, d.total_amount,
                   COALESCE(SUM(pa.allocation_amount) FILTER (WHERE NOT pa.is_voided), 0)
                       AS allocated_amount
            FROM documents d
            LEFT JOIN payment_allocations pa ON pa.document_id = d.id
            WHERE d.is_active
              AND d.payment_status <> 'paid'
              AND ($1::document_kind IS NULL OR d.kind = $1)
            GROUP BY d.id, d.counterparty_id, d.document_date, d.total_amount
            "#,
        )
        .bind(kind)
        .fetch_all(&self.db)
        .await?;

        let inputs: Vec<AgingInput> = rows
            .into_iter()
            .map(|r| AgingInput {
                counterparty_id: r.counterparty_id,
                document_date: r.document_date,
                outstanding: r.total_amount - r.allocated_amount,
            })
            .collect();

        Ok(build_aging(&inputs, as_of))
    }
}
