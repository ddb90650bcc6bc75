// handler/transactions.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::{NaiveTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::transactiondb::{TransactionExt, TransactionFilter, VerifyOutcome},
    dtos::{
        transactiondtos::*,
        walletdtos::TransactionDto,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::error::ServiceError,
    utils::currency::pesewas_to_cedis,
    AppState,
};

pub fn transactions_handler() -> Router {
    Router::new()
        .route("/", get(get_transactions))
        .route("/:transaction_id", get(get_transaction))
        .route(
            "/:transaction_id/update-status",
            put(update_transaction_status),
        )
}

fn parse_transaction_id(raw: &str) -> Result<Uuid, HttpError> {
    Uuid::parse_str(raw).map_err(|_| HttpError::not_found("Transaction not found"))
}

pub async fn get_transactions(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<TransactionQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let transaction_type = query
        .transaction_type
        .as_deref()
        .map(|s| {
            s.parse()
                .map_err(|_| ServiceError::InvalidStatus(s.to_string()))
        })
        .transpose()?;
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse()
                .map_err(|_| ServiceError::InvalidStatus(s.to_string()))
        })
        .transpose()?;

    // Date filters are inclusive whole days.
    let start_date = query
        .start_date
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)));
    let end_date = query.end_date.map(|d| {
        Utc.from_utc_datetime(&d.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap()))
    });

    let filter = TransactionFilter {
        transaction_type,
        status,
        gateway: query.gateway,
        reference: query.reference,
        user_id: query.user_id,
        start_date,
        end_date,
    };

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);

    let (transactions, total, totals) = app_state
        .db_client
        .get_transactions(&filter, page, limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let totals: Vec<_> = totals
        .iter()
        .map(|t| {
            json!({
                "type": t.transaction_type.to_str(),
                "count": t.count,
                "totalAmount": pesewas_to_cedis(t.total_amount),
            })
        })
        .collect();

    Ok(Json(json!({
        "status": "success",
        "transactions": TransactionDto::filter_transactions(&transactions),
        "results": total,
        "page": page,
        "totalPages": (total + limit as i64 - 1) / limit as i64,
        "totals": totals,
    })))
}

pub async fn get_transaction(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let transaction_id = parse_transaction_id(&transaction_id)?;

    let transaction = app_state
        .db_client
        .get_transaction(transaction_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Transaction not found"))?;

    Ok(Json(json!({
        "status": "success",
        "transaction": TransactionDto::filter_transaction(&transaction),
    })))
}

pub async fn update_transaction_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(transaction_id): Path<String>,
    Json(body): Json<UpdateTransactionStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let transaction_id = parse_transaction_id(&transaction_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = body
        .status
        .parse()
        .map_err(|_| ServiceError::InvalidStatus(body.status.clone()))?;

    let transaction = app_state
        .db_client
        .update_transaction_status(transaction_id, status, body.admin_notes, auth.user.id)
        .await?;

    Ok(Json(json!({
        "status": "success",
        "msg": format!("Transaction status updated to {}", transaction.status.to_str()),
        "transaction": TransactionDto::filter_transaction(&transaction),
    })))
}

/// Re-checks a pending Paystack deposit against the gateway. A confirmed
/// charge marks the deposit completed; a rejected one marks it failed.
/// Verifying an already completed deposit changes nothing, and no path here
/// touches the wallet balance.
pub async fn verify_paystack_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    if reference.trim().is_empty() {
        return Err(HttpError::bad_request("Reference is required"));
    }

    let verification = app_state
        .paystack
        .verify(&reference)
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let charge_succeeded = verification.status == "success";

    let outcome = app_state
        .db_client
        .reconcile_paystack_deposit(&reference, charge_succeeded, verification.raw)
        .await?;

    match outcome {
        VerifyOutcome::AlreadyCompleted(transaction) => Ok(Json(json!({
            "status": "success",
            "msg": "Transaction already verified",
            "transaction": TransactionDto::filter_transaction(&transaction),
        }))),
        VerifyOutcome::Completed(transaction) => Ok(Json(json!({
            "status": "success",
            "msg": "Payment verified; transaction marked as completed",
            "transaction": TransactionDto::filter_transaction(&transaction),
        }))),
        VerifyOutcome::MarkedFailed(transaction) => Ok(Json(json!({
            "status": "success",
            "msg": "Payment was not successful; transaction marked as failed",
            "transaction": TransactionDto::filter_transaction(&transaction),
        }))),
    }
}
