//! HTTP handlers for stock ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::Actor;
use crate::models::{InventoryTransaction, PaginatedResponse, Pagination, StockPosition};
use crate::services::reporting::StockSnapshotEntry;
use crate::services::stock_ledger::MoveStockInput;
use crate::services::{ReportingService, StockLedgerService};
use crate::AppState;

/// Record a stock movement
pub async fn record_movement(
    State(state): State<AppState>,
    actor: Actor,
    Json(mut input): Json<MoveStockInput>,
) -> AppResult<Json<InventoryTransaction>> {
    if input.allow_backorder.is_none() {
        input.allow_backorder = Some(state.config.ledger.allow_backorder_default);
    }
    let service = StockLedgerService::new(state.db);
    let transaction = service.move_stock(input, actor.0).await?;
    Ok(Json(transaction))
}

/// Reverse a prior stock movement
pub async fn reverse_movement(
    State(state): State<AppState>,
    actor: Actor,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<InventoryTransaction>> {
    let service = StockLedgerService::new(state.db);
    let reversal = service.reverse(transaction_id, actor.0).await?;
    Ok(Json(reversal))
}

/// Get the stock position for an (item, store) pair
pub async fn get_position(
    State(state): State<AppState>,
    Path((item_id, store_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<StockPosition>> {
    let service = StockLedgerService::new(state.db);
    let position = service.get_position(item_id, store_id).await?;
    Ok(Json(position))
}

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PaginationQuery {
    fn into_pagination(self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            per_page: self.per_page.unwrap_or(default.per_page),
        }
    }
}

/// Transaction history for an (item, store) pair
pub async fn list_position_transactions(
    State(state): State<AppState>,
    Path((item_id, store_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<PaginationQuery>,
) -> AppResult<Json<PaginatedResponse<InventoryTransaction>>> {
    let service = StockLedgerService::new(state.db);
    let transactions = service
        .list_transactions(item_id, store_id, query.into_pagination())
        .await?;
    Ok(Json(transactions))
}

/// Input for reserving or releasing stock
#[derive(Debug, Deserialize)]
pub struct ReservationInput {
    pub quantity: i64,
}

/// Reserve stock on a position
pub async fn reserve_stock(
    State(state): State<AppState>,
    _actor: Actor,
    Path((item_id, store_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ReservationInput>,
) -> AppResult<Json<StockPosition>> {
    let service = StockLedgerService::new(state.db);
    let position = service.reserve(item_id, store_id, input.quantity).await?;
    Ok(Json(position))
}

/// Release previously reserved stock
pub async fn release_stock(
    State(state): State<AppState>,
    _actor: Actor,
    Path((item_id, store_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ReservationInput>,
) -> AppResult<Json<StockPosition>> {
    let service = StockLedgerService::new(state.db);
    let position = service.release(item_id, store_id, input.quantity).await?;
    Ok(Json(position))
}

/// Snapshot filter parameters
#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    pub store_id: Option<Uuid>,
}

/// Read-only stock snapshot with item metadata and derived health
pub async fn stock_snapshot(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> AppResult<Json<Vec<StockSnapshotEntry>>> {
    let service = ReportingService::new(state.db);
    let snapshot = service.stock_snapshot(query.store_id).await?;
    Ok(Json(snapshot))
}
