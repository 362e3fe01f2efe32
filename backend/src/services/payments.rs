//! Payment allocation engine
//!
//! Owns payment creation, the distribution of a payment across
//! outstanding documents, and the derived payment status of each
//! document. Status is always recomputed from the full active
//! allocation set inside the same transaction as the status write;
//! it is never incremented in place.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    derive_payment_status, DocumentKind, OutstandingDocument, Payment, PaymentAllocation,
    PaymentMethod, PaymentStatus,
};
use shared::validation::{validate_allocation_amounts, validate_document_no};

/// Payment allocation service
#[derive(Clone)]
pub struct PaymentService {
    db: PgPool,
}

/// Input for registering an outstanding document. Called by the
/// sale/purchase recording logic when the originating document is
/// created.
#[derive(Debug, Deserialize)]
pub struct RegisterDocumentInput {
    pub kind: DocumentKind,
    pub counterparty_id: Uuid,
    pub document_no: String,
    pub document_date: NaiveDate,
    pub total_amount: Decimal,
}

/// One allocation entry of a payment
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationInput {
    pub document_id: Uuid,
    pub amount: Decimal,
}

/// Input for creating a payment with its allocations
#[derive(Debug, Deserialize)]
pub struct CreatePaymentInput {
    pub counterparty_id: Uuid,
    pub payment_method: PaymentMethod,
    pub reference_number: Option<String>,
    pub total_amount: Decimal,
    pub payment_date: Option<NaiveDate>,
    pub allocations: Vec<AllocationInput>,
}

/// Derived state of one document after recomputation
#[derive(Debug, Clone, Serialize)]
pub struct DocumentStatusUpdate {
    pub document_id: Uuid,
    pub payment_status: PaymentStatus,
    pub allocated_amount: Decimal,
    pub outstanding_amount: Decimal,
}

/// A created payment with its allocations and the documents it touched
#[derive(Debug, Serialize)]
pub struct PaymentWithAllocations {
    #[serde(flatten)]
    pub payment: Payment,
    pub allocations: Vec<PaymentAllocation>,
    pub updated_documents: Vec<DocumentStatusUpdate>,
}

/// An outstanding document with its allocation sums
#[derive(Debug, Serialize)]
pub struct OutstandingDocumentView {
    #[serde(flatten)]
    pub document: OutstandingDocument,
    pub allocated_amount: Decimal,
    pub outstanding_amount: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct OutstandingRow {
    id: Uuid,
    kind: DocumentKind,
    counterparty_id: Uuid,
    document_no: String,
    document_date: NaiveDate,
    total_amount: Decimal,
    payment_status: PaymentStatus,
    is_active: bool,
    created_at: chrono::DateTime<Utc>,
    allocated_amount: Decimal,
}

impl PaymentService {
    /// Create a new PaymentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register an outstanding document; documents start unpaid
    pub async fn register_document(
        &self,
        input: RegisterDocumentInput,
    ) -> AppResult<OutstandingDocument> {
        validate_document_no(&input.document_no).map_err(|msg| AppError::Validation {
            field: "document_no".to_string(),
            message: msg.to_string(),
        })?;

        if input.total_amount < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "total_amount".to_string(),
                message: "Document total cannot be negative".to_string(),
            });
        }

        let document = sqlx::query_as::<_, OutstandingDocument>(
            r#"
            INSERT INTO documents (kind, counterparty_id, document_no, document_date, total_amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, kind, counterparty_id, document_no, document_date,
                      total_amount, payment_status, is_active, created_at
            "#,
        )
        .bind(input.kind)
        .bind(input.counterparty_id)
        .bind(&input.document_no)
        .bind(input.document_date)
        .bind(input.total_amount)
        .fetch_one(&self.db)
        .await?;

        Ok(document)
    }

    /// Create a payment and allocate it across outstanding documents.
    ///
    /// The allocation set is validated up front: a sum that does not
    /// match the payment amount fails before any record is written. All
    /// inserts and the per-document status recomputations happen in one
    /// database transaction, each document locked while its full active
    /// allocation sum is read and its status written.
    pub async fn create_payment(
        &self,
        input: CreatePaymentInput,
        created_by: Uuid,
    ) -> AppResult<PaymentWithAllocations> {
        let amounts: Vec<Decimal> = input.allocations.iter().map(|a| a.amount).collect();
        validate_allocation_amounts(input.total_amount, &amounts)
            .map_err(|msg| AppError::AllocationMismatch(msg.to_string()))?;

        let payment_date = input
            .payment_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let mut tx = self.db.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                counterparty_id, payment_method, reference_number,
                total_payment_amount, payment_date, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, counterparty_id, payment_method, reference_number,
                      total_payment_amount, payment_date, created_at, created_by
            "#,
        )
        .bind(input.counterparty_id)
        .bind(input.payment_method)
        .bind(&input.reference_number)
        .bind(input.total_amount)
        .bind(payment_date)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        // Lock documents in ascending id order so concurrent payments
        // acquire locks deterministically
        let mut entries = input.allocations.clone();
        entries.sort_by_key(|a| a.document_id);

        let mut allocations = Vec::with_capacity(entries.len());
        let mut updated_documents: Vec<DocumentStatusUpdate> = Vec::new();

        for entry in &entries {
            let allocation = sqlx::query_as::<_, PaymentAllocation>(
                r#"
                INSERT INTO payment_allocations (payment_id, document_id, allocation_amount)
                VALUES ($1, $2, $3)
                RETURNING id, payment_id, document_id, allocation_amount,
                          is_voided, voided_at, created_at
                "#,
            )
            .bind(payment.id)
            .bind(entry.document_id)
            .bind(entry.amount)
            .fetch_one(&mut *tx)
            .await?;
            allocations.push(allocation);

            let update = Self::recompute_status_locked(&mut tx, entry.document_id).await?;
            // Keep one entry per document even when a payment allocates
            // to the same document twice
            updated_documents.retain(|u| u.document_id != update.document_id);
            updated_documents.push(update);
        }

        tx.commit().await?;

        info!(
            payment_id = %payment.id,
            counterparty_id = %payment.counterparty_id,
            total = %payment.total_payment_amount,
            documents = updated_documents.len(),
            "Created payment"
        );

        Ok(PaymentWithAllocations {
            payment,
            allocations,
            updated_documents,
        })
    }

    /// Recompute one document's derived payment status from its full
    /// active allocation set. Idempotent: running it twice yields the
    /// same status.
    pub async fn recompute_document_status(
        &self,
        document_id: Uuid,
    ) -> AppResult<DocumentStatusUpdate> {
        let mut tx = self.db.begin().await?;
        let update = Self::recompute_status_locked(&mut tx, document_id).await?;
        tx.commit().await?;
        Ok(update)
    }

    /// Lock the document row, re-sum ALL active allocations, and write
    /// the freshly derived status. The sum read and the status write
    /// share the transaction, so concurrent allocations against the same
    /// document cannot both observe a stale state.
    async fn recompute_status_locked(
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> AppResult<DocumentStatusUpdate> {
        let document = sqlx::query_as::<_, OutstandingDocument>(
            r#"
            SELECT id, kind, counterparty_id, document_no, document_date,
                   total_amount, payment_status, is_active, created_at
            FROM documents
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(document_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Document".to_string()))?;

        if !document.is_active {
            return Err(AppError::ValidationError(format!(
                "Document {} is not active",
                document.document_no
            )));
        }

        let allocated = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(allocation_amount), 0)
            FROM payment_allocations
            WHERE document_id = $1 AND NOT is_voided
            "#,
        )
        .bind(document_id)
        .fetch_one(&mut **tx)
        .await?;

        if allocated > document.total_amount {
            return Err(AppError::AllocationMismatch(format!(
                "Allocations of {} would exceed document total {}",
                allocated, document.total_amount
            )));
        }

        let payment_status = derive_payment_status(allocated, document.total_amount);

        sqlx::query("UPDATE documents SET payment_status = $2 WHERE id = $1")
            .bind(document_id)
            .bind(payment_status)
            .execute(&mut **tx)
            .await?;

        Ok(DocumentStatusUpdate {
            document_id,
            payment_status,
            allocated_amount: allocated,
            outstanding_amount: document.total_amount - allocated,
        })
    }

    /// Soft-void an allocation and recompute the document's status in
    /// the same transaction. Allocation rows are never deleted; the flag
    /// preserves the recomputation audit trail.
    pub async fn void_allocation(&self, allocation_id: Uuid) -> AppResult<DocumentStatusUpdate> {
        let mut tx = self.db.begin().await?;

        let allocation = sqlx::query_as::<_, PaymentAllocation>(
            r#"
            SELECT id, payment_id, document_id, allocation_amount,
                   is_voided, voided_at, created_at
            FROM payment_allocations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(allocation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Allocation".to_string()))?;

        if allocation.is_voided {
            return Err(AppError::ValidationError(
                "Allocation is already voided".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE payment_allocations SET is_voided = TRUE, voided_at = now() WHERE id = $1",
        )
        .bind(allocation_id)
        .execute(&mut *tx)
        .await?;

        let update = Self::recompute_status_locked(&mut tx, allocation.document_id).await?;
        tx.commit().await?;

        info!(
            allocation_id = %allocation_id,
            document_id = %allocation.document_id,
            status = update.payment_status.as_str(),
            "Voided allocation and recomputed document status"
        );

        Ok(update)
    }

    /// Fetch a payment with its allocations
    pub async fn get_payment(&self, payment_id: Uuid) -> AppResult<PaymentWithAllocations> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, counterparty_id, payment_method, reference_number,
                   total_payment_amount, payment_date, created_at, created_by
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment".to_string()))?;

        let allocations = sqlx::query_as::<_, PaymentAllocation>(
            r#"
            SELECT id, payment_id, document_id, allocation_amount,
                   is_voided, voided_at, created_at
            FROM payment_allocations
            WHERE payment_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(payment_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PaymentWithAllocations {
            payment,
            allocations,
            updated_documents: Vec::new(),
        })
    }

    /// Outstanding documents (active, not fully paid) with allocation
    /// sums, optionally filtered by counterparty
    pub async fn list_outstanding(
        &self,
        counterparty_id: Option<Uuid>,
    ) -> AppResult<Vec<OutstandingDocumentView>> {
        let rows = sqlx::query_as::<_, OutstandingRow>(
            r#"
            SELECT d.id, d.kind, d.counterparty_id, d.document_no, d.document_date,
                   d.total_amount, d.payment_status, d.is_active, d.created_at,
                   COALESCE(SUM(pa.allocation_amount) FILTER (WHERE NOT pa.is_voided), 0)
                       AS allocated_amount
            FROM documents d
            LEFT JOIN payment_allocations pa ON pa.document_id = d.id
            WHERE d.is_active
              AND d.payment_status <> 'paid'
              AND ($1::uuid IS NULL OR d.counterparty_id = $1)
            GROUP BY d.id
            ORDER BY d.document_date, d.document_no
            "#,
        )
        .bind(counterparty_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| OutstandingDocumentView {
                outstanding_amount: r.total_amount - r.allocated_amount,
                allocated_amount: r.allocated_amount,
                document: OutstandingDocument {
                    id: r.id,
                    kind: r.kind,
                    counterparty_id: r.counterparty_id,
                    document_no: r.document_no,
                    document_date: r.document_date,
                    total_amount: r.total_amount,
                    payment_status: r.payment_status,
                    is_active: r.is_active,
                    created_at: r.created_at,
                },
            })
            .collect())
    }
}
