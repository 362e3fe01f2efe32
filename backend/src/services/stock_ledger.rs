//! Stock ledger service: the single source of truth for inventory movement
//!
//! Owns the per-(item, store) on-hand quantity and the append-only
//! transaction log. Every mutation locks the position row, so concurrent
//! movements on the same key serialize while different keys proceed
//! independently.

use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    InventoryTransaction, Pagination, PaginatedResponse, PaginationMeta, StockPosition,
    TransactionDirection, TransactionKind,
};
use shared::validation::{project_on_hand, validate_movement_quantity};

/// Stock ledger service
#[derive(Clone)]
pub struct StockLedgerService {
    db: PgPool,
}

/// Input for recording a stock movement
#[derive(Debug, Clone, Deserialize)]
pub struct MoveStockInput {
    pub item_id: Uuid,
    pub store_id: Uuid,
    pub kind: TransactionKind,
    /// Signed quantity; the sign must agree with the kind's direction
    pub quantity: i64,
    pub batch_no: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    /// Allow an outbound movement to drive on-hand below zero
    pub allow_backorder: Option<bool>,
}

/// One movement as applied inside an open transaction
struct ApplyMovement {
    item_id: Uuid,
    store_id: Uuid,
    kind: TransactionKind,
    quantity: i64,
    batch_no: Option<String>,
    reference_type: Option<String>,
    reference_id: Option<Uuid>,
    reversal_of: Option<Uuid>,
    allow_backorder: bool,
    created_by: Uuid,
}

impl StockLedgerService {
    /// Create a new StockLedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock movement: append one transaction and update the
    /// position as a single atomic step.
    pub async fn move_stock(
        &self,
        input: MoveStockInput,
        created_by: Uuid,
    ) -> AppResult<InventoryTransaction> {
        validate_movement_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        if input.kind.is_reversal() {
            return Err(AppError::Validation {
                field: "kind".to_string(),
                message: "Reversal entries are created through the reverse operation".to_string(),
            });
        }

        let direction = if input.quantity > 0 {
            TransactionDirection::In
        } else {
            TransactionDirection::Out
        };
        if direction != input.kind.direction() {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: format!(
                    "Quantity sign does not match direction of {} transactions",
                    input.kind.as_str()
                ),
            });
        }

        if input.kind.requires_reference()
            && (input.reference_type.is_none() || input.reference_id.is_none())
        {
            return Err(AppError::Validation {
                field: "reference_id".to_string(),
                message: format!(
                    "{} movements must reference their originating document",
                    input.kind.as_str()
                ),
            });
        }

        let mut tx = self.db.begin().await?;
        let transaction = self
            .apply_movement(
                &mut tx,
                ApplyMovement {
                    item_id: input.item_id,
                    store_id: input.store_id,
                    kind: input.kind,
                    quantity: input.quantity,
                    batch_no: input.batch_no,
                    reference_type: input.reference_type,
                    reference_id: input.reference_id,
                    reversal_of: None,
                    allow_backorder: input.allow_backorder.unwrap_or(false),
                    created_by,
                },
            )
            .await?;
        tx.commit().await?;

        info!(
            transaction_id = %transaction.id,
            item_id = %transaction.item_id,
            store_id = %transaction.store_id,
            kind = transaction.kind.as_str(),
            quantity = transaction.quantity,
            "Recorded stock movement"
        );

        Ok(transaction)
    }

    /// Reverse a prior transaction by appending a compensating entry with
    /// the opposite sign. The original row is never edited, and each
    /// transaction may be reversed at most once.
    pub async fn reverse(
        &self,
        transaction_id: Uuid,
        created_by: Uuid,
    ) -> AppResult<InventoryTransaction> {
        let mut tx = self.db.begin().await?;

        let original = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT id, item_id, store_id, kind, quantity, batch_no,
                   reference_type, reference_id, reversal_of, created_at, created_by
            FROM inventory_transactions
            WHERE id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction".to_string()))?;

        let reversal_kind = original.kind.reversal_kind().ok_or_else(|| {
            AppError::ValidationError(format!(
                "{} transactions cannot be reversed",
                original.kind.as_str()
            ))
        })?;

        // Take the position lock before the already-reversed check so two
        // concurrent reversals of the same transaction serialize. A unique
        // index on reversal_of backs this at the schema level.
        sqlx::query(
            "SELECT quantity_on_hand FROM stock_positions WHERE item_id = $1 AND store_id = $2 FOR UPDATE",
        )
        .bind(original.item_id)
        .bind(original.store_id)
        .execute(&mut *tx)
        .await?;

        let already_reversed = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_transactions WHERE reversal_of = $1)",
        )
        .bind(original.id)
        .fetch_one(&mut *tx)
        .await?;

        if already_reversed {
            return Err(AppError::AlreadyReversed(original.id));
        }

        let reversal = self
            .apply_movement(
                &mut tx,
                ApplyMovement {
                    item_id: original.item_id,
                    store_id: original.store_id,
                    kind: reversal_kind,
                    quantity: -original.quantity,
                    batch_no: original.batch_no.clone(),
                    reference_type: original.reference_type.clone(),
                    reference_id: original.reference_id,
                    reversal_of: Some(original.id),
                    allow_backorder: false,
                    created_by,
                },
            )
            .await?;
        tx.commit().await?;

        info!(
            transaction_id = %reversal.id,
            reversal_of = %original.id,
            kind = reversal.kind.as_str(),
            "Reversed stock movement"
        );

        Ok(reversal)
    }

    /// Shared apply path for movements and reversals: verify the key,
    /// lock the position row, guard the on-hand projection, append the
    /// transaction, and update the position.
    async fn apply_movement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        movement: ApplyMovement,
    ) -> AppResult<InventoryTransaction> {
        let item_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)",
        )
        .bind(movement.item_id)
        .fetch_one(&mut **tx)
        .await?;

        let store_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1)",
        )
        .bind(movement.store_id)
        .fetch_one(&mut **tx)
        .await?;

        if !item_exists || !store_exists {
            return Err(AppError::UnknownItemOrStore {
                item_id: movement.item_id,
                store_id: movement.store_id,
            });
        }

        // Position rows come into existence on first movement
        sqlx::query(
            r#"
            INSERT INTO stock_positions (item_id, store_id)
            VALUES ($1, $2)
            ON CONFLICT (item_id, store_id) DO NOTHING
            "#,
        )
        .bind(movement.item_id)
        .bind(movement.store_id)
        .execute(&mut **tx)
        .await?;

        // Serialize all mutation on this (item, store) key
        let quantity_on_hand = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT quantity_on_hand FROM stock_positions
            WHERE item_id = $1 AND store_id = $2
            FOR UPDATE
            "#,
        )
        .bind(movement.item_id)
        .bind(movement.store_id)
        .fetch_one(&mut **tx)
        .await?;

        let new_on_hand =
            project_on_hand(quantity_on_hand, movement.quantity, movement.allow_backorder)
                .map_err(|_| {
                    AppError::InsufficientStock(format!(
                        "On-hand quantity {} cannot cover a movement of {}",
                        quantity_on_hand, movement.quantity
                    ))
                })?;

        let transaction = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            INSERT INTO inventory_transactions (
                item_id, store_id, kind, quantity, batch_no,
                reference_type, reference_id, reversal_of, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, item_id, store_id, kind, quantity, batch_no,
                      reference_type, reference_id, reversal_of, created_at, created_by
            "#,
        )
        .bind(movement.item_id)
        .bind(movement.store_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(&movement.batch_no)
        .bind(&movement.reference_type)
        .bind(movement.reference_id)
        .bind(movement.reversal_of)
        .bind(movement.created_by)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE stock_positions
            SET quantity_on_hand = $3,
                last_restock_date = CASE WHEN $4 THEN CURRENT_DATE ELSE last_restock_date END,
                updated_at = now()
            WHERE item_id = $1 AND store_id = $2
            "#,
        )
        .bind(movement.item_id)
        .bind(movement.store_id)
        .bind(new_on_hand)
        .bind(movement.kind.is_restock())
        .execute(&mut **tx)
        .await?;

        Ok(transaction)
    }

    /// Reserve stock against future allocation. Reservations are not
    /// ledger transactions; they only adjust the reserved counter under
    /// the same row lock as movements.
    pub async fn reserve(
        &self,
        item_id: Uuid,
        store_id: Uuid,
        quantity: i64,
    ) -> AppResult<StockPosition> {
        if quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Reservation quantity must be positive".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let position = self.lock_position(&mut tx, item_id, store_id).await?;

        let available = position.quantity_on_hand - position.reserved_quantity;
        if quantity > available {
            return Err(AppError::InsufficientStock(format!(
                "Only {} of {} on hand is available to reserve",
                available, position.quantity_on_hand
            )));
        }

        let position = sqlx::query_as::<_, StockPosition>(
            r#"
            UPDATE stock_positions
            SET reserved_quantity = reserved_quantity + $3, updated_at = now()
            WHERE item_id = $1 AND store_id = $2
            RETURNING item_id, store_id, quantity_on_hand, reserved_quantity,
                      last_restock_date, updated_at
            "#,
        )
        .bind(item_id)
        .bind(store_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(position)
    }

    /// Release previously reserved stock
    pub async fn release(
        &self,
        item_id: Uuid,
        store_id: Uuid,
        quantity: i64,
    ) -> AppResult<StockPosition> {
        if quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Release quantity must be positive".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;
        let position = self.lock_position(&mut tx, item_id, store_id).await?;

        if quantity > position.reserved_quantity {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: format!(
                    "Cannot release {} when only {} is reserved",
                    quantity, position.reserved_quantity
                ),
            });
        }

        let position = sqlx::query_as::<_, StockPosition>(
            r#"
            UPDATE stock_positions
            SET reserved_quantity = reserved_quantity - $3, updated_at = now()
            WHERE item_id = $1 AND store_id = $2
            RETURNING item_id, store_id, quantity_on_hand, reserved_quantity,
                      last_restock_date, updated_at
            "#,
        )
        .bind(item_id)
        .bind(store_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(position)
    }

    async fn lock_position(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item_id: Uuid,
        store_id: Uuid,
    ) -> AppResult<StockPosition> {
        sqlx::query_as::<_, StockPosition>(
            r#"
            SELECT item_id, store_id, quantity_on_hand, reserved_quantity,
                   last_restock_date, updated_at
            FROM stock_positions
            WHERE item_id = $1 AND store_id = $2
            FOR UPDATE
            "#,
        )
        .bind(item_id)
        .bind(store_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::UnknownItemOrStore { item_id, store_id })
    }

    /// Get the current position for an (item, store) pair
    pub async fn get_position(&self, item_id: Uuid, store_id: Uuid) -> AppResult<StockPosition> {
        sqlx::query_as::<_, StockPosition>(
            r#"
            SELECT item_id, store_id, quantity_on_hand, reserved_quantity,
                   last_restock_date, updated_at
            FROM stock_positions
            WHERE item_id = $1 AND store_id = $2
            "#,
        )
        .bind(item_id)
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock position".to_string()))
    }

    /// Transaction history for an (item, store) pair, newest first
    pub async fn list_transactions(
        &self,
        item_id: Uuid,
        store_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<InventoryTransaction>> {
        let total_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inventory_transactions WHERE item_id = $1 AND store_id = $2",
        )
        .bind(item_id)
        .bind(store_id)
        .fetch_one(&self.db)
        .await?;

        let transactions = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT id, item_id, store_id, kind, quantity, batch_no,
                   reference_type, reference_id, reversal_of, created_at, created_by
            FROM inventory_transactions
            WHERE item_id = $1 AND store_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(item_id)
        .bind(store_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total_items as u64),
            data: transactions,
        })
    }
}
