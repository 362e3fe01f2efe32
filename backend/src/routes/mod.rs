//! Route definitions for the Stock Ledger & Payment Reconciliation Engine

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Stock ledger
        .nest("/stock", stock_routes())
        // Payment reconciliation
        .nest("/payments", payment_routes())
        // Reports
        .nest("/reports", report_routes())
}

/// Stock ledger routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        // Movements (append-only ledger)
        .route("/movements", post(handlers::record_movement))
        .route(
            "/movements/:transaction_id/reverse",
            post(handlers::reverse_movement),
        )
        // Positions
        .route("/positions/:item_id/:store_id", get(handlers::get_position))
        .route(
            "/positions/:item_id/:store_id/transactions",
            get(handlers::list_position_transactions),
        )
        .route(
            "/positions/:item_id/:store_id/reserve",
            post(handlers::reserve_stock),
        )
        .route(
            "/positions/:item_id/:store_id/release",
            post(handlers::release_stock),
        )
        // Snapshot for the reporting/UI layer
        .route("/snapshot", get(handlers::stock_snapshot))
}

/// Payment reconciliation routes
fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_payment))
        .route("/:payment_id", get(handlers::get_payment))
        .route(
            "/allocations/:allocation_id/void",
            post(handlers::void_allocation),
        )
        // Outstanding documents
        .route("/documents", post(handlers::register_document))
        .route(
            "/documents/:document_id/recompute",
            post(handlers::recompute_document_status),
        )
        .route("/documents/outstanding", get(handlers::list_outstanding))
}

/// Reporting routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/aging", get(handlers::aging_report))
        .route("/dashboard", get(handlers::dashboard_metrics))
}
