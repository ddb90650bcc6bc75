// handler/orders.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{NaiveTime, TimeZone, Utc};
use serde_json::json;
use validator::Validate;

use crate::{
    db::orderdb::{OrderExt, OrderFilter, RefundNotice},
    dtos::orderdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::ordermodel::OrderStatus,
    service::error::ServiceError,
    service::sms::{self, SmsService},
    utils::currency::pesewas_to_cedis,
    AppState,
};

pub fn orders_handler() -> Router {
    Router::new()
        .route("/", get(get_orders))
        .route("/bulk-status-update", post(bulk_update_order_status))
        .route("/:order_id", get(get_order))
        .route("/:order_id/status", put(update_order_status))
}

fn parse_status(raw: &str) -> Result<OrderStatus, HttpError> {
    raw.parse()
        .map_err(|_| ServiceError::InvalidStatus(raw.to_string()).into())
}

fn notify_refund(sms_service: SmsService, notice: RefundNotice) {
    let message = sms::refund_message(
        &notice.name,
        notice.price,
        notice.capacity,
        &notice.network,
        notice.new_balance,
    );
    tokio::spawn(async move {
        sms_service.notify(&notice.phone_number, &message).await;
    });
}

pub async fn get_orders(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<OrderQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = query.status.as_deref().map(parse_status).transpose()?;
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);

    // Inclusive whole days.
    let start_date = query
        .start_date
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)));
    let end_date = query.end_date.map(|d| {
        Utc.from_utc_datetime(&d.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap()))
    });

    let filter = OrderFilter {
        status,
        network: query.network,
        search: query.search,
        start_date,
        end_date,
    };

    let (orders, total, revenue) = app_state
        .db_client
        .get_orders(page, limit, &filter)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "orders": OrderDto::filter_orders(&orders),
        "results": total,
        "page": page,
        "totalPages": (total + limit as i64 - 1) / limit as i64,
        "totalRevenue": pesewas_to_cedis(revenue),
    })))
}

pub async fn get_order(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let order = app_state
        .db_client
        .find_order(&order_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| ServiceError::OrderNotFound(order_id.clone()))?;

    let history = app_state
        .db_client
        .get_order_history(order.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "order": OrderDto::filter_order(&order),
        "statusHistory": history,
    })))
}

pub async fn update_order_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(order_id): Path<String>,
    Json(body): Json<UpdateOrderStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    let status = parse_status(&body.status)?;

    let transition = app_state
        .db_client
        .set_order_status(&order_id, status, auth.user.id)
        .await?;

    if let Some(notice) = transition.refund {
        notify_refund(app_state.sms.clone(), notice);
    }

    Ok(Json(OrderStatusResponseDto {
        success: true,
        msg: format!("Order status updated to {}", status),
        order: OrderTransitionDto {
            id: transition.order.id.to_string(),
            geonet_reference: transition.order.vendor_reference.clone(),
            status: transition.order.status.to_str().to_string(),
            previous_status: transition.previous_status.to_str().to_string(),
            updated_at: transition.order.updated_at,
        },
    }))
}

pub async fn bulk_update_order_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<BulkStatusUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    let status = parse_status(&body.status)?;

    let (results, notices) = app_state
        .db_client
        .bulk_set_order_status(&body.order_ids, status, auth.user.id)
        .await?;

    for notice in notices {
        notify_refund(app_state.sms.clone(), notice);
    }

    Ok(Json(json!({
        "msg": format!(
            "Bulk update completed: {} successful, {} failed, {} not found",
            results.success.len(),
            results.failed.len(),
            results.not_found.len()
        ),
        "results": results,
    })))
}
