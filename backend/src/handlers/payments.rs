//! HTTP handlers for payment reconciliation endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::Actor;
use crate::models::OutstandingDocument;
use crate::services::payments::{
    CreatePaymentInput, DocumentStatusUpdate, OutstandingDocumentView, PaymentWithAllocations,
    RegisterDocumentInput,
};
use crate::services::PaymentService;
use crate::AppState;

/// Create a payment and allocate it across outstanding documents
pub async fn create_payment(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<CreatePaymentInput>,
) -> AppResult<Json<PaymentWithAllocations>> {
    let service = PaymentService::new(state.db);
    let payment = service.create_payment(input, actor.0).await?;
    Ok(Json(payment))
}

/// Fetch a payment with its allocations
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<PaymentWithAllocations>> {
    let service = PaymentService::new(state.db);
    let payment = service.get_payment(payment_id).await?;
    Ok(Json(payment))
}

/// Register an outstanding document (called by the recording logic when
/// the originating sale/purchase is created)
pub async fn register_document(
    State(state): State<AppState>,
    _actor: Actor,
    Json(input): Json<RegisterDocumentInput>,
) -> AppResult<Json<OutstandingDocument>> {
    let service = PaymentService::new(state.db);
    let document = service.register_document(input).await?;
    Ok(Json(document))
}

/// Recompute one document's derived payment status
pub async fn recompute_document_status(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> AppResult<Json<DocumentStatusUpdate>> {
    let service = PaymentService::new(state.db);
    let update = service.recompute_document_status(document_id).await?;
    Ok(Json(update))
}

/// Soft-void an allocation and recompute the document's status
pub async fn void_allocation(
    State(state): State<AppState>,
    _actor: Actor,
    Path(allocation_id): Path<Uuid>,
) -> AppResult<Json<DocumentStatusUpdate>> {
    let service = PaymentService::new(state.db);
    let update = service.void_allocation(allocation_id).await?;
    Ok(Json(update))
}

/// Outstanding documents filter
#[derive(Debug, Deserialize)]
pub struct OutstandingQuery {
    pub counterparty_id: Option<Uuid>,
}

/// List outstanding documents with allocation sums
pub async fn list_outstanding(
    State(state): State<AppState>,
    Query(query): Query<OutstandingQuery>,
) -> AppResult<Json<Vec<OutstandingDocumentView>>> {
    let service = PaymentService::new(state.db);
    let documents = service.list_outstanding(query.counterparty_id).await?;
    Ok(Json(documents))
}
