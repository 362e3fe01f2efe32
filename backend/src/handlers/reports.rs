//! HTTP handlers for reporting endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::DocumentKind;
use crate::services::reporting::DashboardMetrics;
use crate::services::{AgingService, ReportingService};
use crate::AppState;

/// Aging report query parameters
#[derive(Debug, Deserialize)]
pub struct AgingQuery {
    pub as_of: Option<NaiveDate>,
    pub kind: Option<DocumentKind>,
    pub format: Option<String>, // "json" or "csv"
}

/// Aging report: outstanding balances bucketed by days since document
/// date, per counterparty
pub async fn aging_report(
    State(state): State<AppState>,
    Query(query): Query<AgingQuery>,
) -> AppResult<impl IntoResponse> {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let service = AgingService::new(state.db);
    let report = service.build_report(as_of, query.kind).await?;

    if query.format.as_deref() == Some("csv") {
        let csv = ReportingService::export_to_csv(&report.rows)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"aging_report.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(report).into_response())
    }
}

/// Dashboard metrics over ledger and reconciliation state
pub async fn dashboard_metrics(
    State(state): State<AppState>,
) -> AppResult<Json<DashboardMetrics>> {
    let service = ReportingService::new(state.db);
    let metrics = service.dashboard_metrics().await?;
    Ok(Json(metrics))
}
