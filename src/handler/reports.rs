// handler/reports.rs
//
// Mounted at the admin root rather than under a /reports prefix, matching
// the paths existing dashboards call.
use std::sync::Arc;

use axum::{extract::Query, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde_json::json;

use crate::{
    db::reportdb::ReportExt,
    dtos::transactiondtos::ReportQueryDto,
    error::HttpError,
    AppState,
};

pub async fn daily_summary(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<ReportQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let summary = app_state
        .db_client
        .daily_summary(date)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "summary": summary,
    })))
}

pub async fn dashboard_statistics(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let statistics = app_state
        .db_client
        .dashboard_statistics()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "statistics": statistics,
    })))
}
