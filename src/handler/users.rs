// handler/users.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        orderdb::OrderExt,
        userdb::{UpdateUserFields, UserExt},
        walletdb::WalletExt,
    },
    dtos::{
        orderdtos::OrderDto,
        userdtos::*,
        walletdtos::{AddMoneyDto, DeductMoneyDto, TransactionDto, WalletChangeResponseDto},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::error::ServiceError,
    service::sms,
    utils::currency::{cedis_to_pesewas, pesewas_to_cedis},
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/", get(get_users))
        .route(
            "/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/:user_id/add-money", put(add_money))
        .route("/:user_id/deduct-money", put(deduct_money))
        .route("/:user_id/toggle-status", put(toggle_user_status))
        .route("/:user_id/orders", get(get_user_orders))
}

/// Path ids arrive as raw strings; anything that is not a UUID resolves to
/// not-found rather than a routing error.
fn parse_user_id(raw: &str) -> Result<Uuid, HttpError> {
    Uuid::parse_str(raw).map_err(|_| HttpError::not_found("User not found"))
}

/// The list sorts by wallet balance, highest first, unless the caller asks
/// for signup order with `sortBy=createdAt`.
fn sorts_by_balance(sort_by: Option<&str>) -> bool {
    sort_by != Some("createdAt")
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);

    let sort_by_balance = sorts_by_balance(query.sort_by.as_deref());

    let (users, total) = app_state
        .db_client
        .get_users(page, limit, query.search, sort_by_balance)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        users: FilterUserDto::filter_users(&users),
        results: total,
        page,
        total_pages: (total + limit as i64 - 1) / limit as i64,
    }))
}

pub async fn get_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_user_id(&user_id)?;

    let user = app_state
        .db_client
        .get_user(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        user: FilterUserDto::filter_user(&user),
    }))
}

pub async fn update_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_user_id(&user_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .update_user(
            user_id,
            UpdateUserFields {
                name: body.name,
                email: body.email,
                phone_number: body.phone_number,
                role: body.role,
                referral_code: body.referral_code,
            },
        )
        .await?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        user: FilterUserDto::filter_user(&user),
    }))
}

pub async fn delete_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_user_id(&user_id)?;

    app_state.db_client.delete_user(user_id).await?;

    Ok(Json(json!({
        "status": "success",
        "msg": "User and associated data deleted successfully"
    })))
}

pub async fn add_money(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<String>,
    Json(body): Json<AddMoneyDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_user_id(&user_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let amount = cedis_to_pesewas(body.amount);

    let mutation = app_state
        .db_client
        .credit_wallet(user_id, amount, auth.user.id)
        .await?;

    let message = sms::credit_message(&mutation.user.name, amount, mutation.user.wallet_balance);
    let sms_service = app_state.sms.clone();
    let phone = mutation.user.phone_number.clone();
    tokio::spawn(async move {
        sms_service.notify(&phone, &message).await;
    });

    Ok(Json(WalletChangeResponseDto {
        msg: "Money added successfully".to_string(),
        current_balance: mutation.user.wallet_balance_in_cedis(),
        previous_balance: pesewas_to_cedis(mutation.previous_balance),
        transaction: TransactionDto::filter_transaction(&mutation.transaction),
    }))
}

pub async fn deduct_money(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<String>,
    Json(body): Json<DeductMoneyDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_user_id(&user_id)?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let amount = cedis_to_pesewas(body.amount);

    let mutation = match app_state
        .db_client
        .debit_wallet(user_id, amount, body.reason.clone(), auth.user.id)
        .await
    {
        Ok(mutation) => mutation,
        Err(ServiceError::InsufficientBalance { current, requested }) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "fail",
                    "message": "Insufficient balance",
                    "currentBalance": pesewas_to_cedis(current),
                    "requestedDeduction": pesewas_to_cedis(requested),
                })),
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let message = sms::debit_message(
        amount,
        mutation.user.wallet_balance,
        body.reason.as_deref(),
    );
    let sms_service = app_state.sms.clone();
    let phone = mutation.user.phone_number.clone();
    tokio::spawn(async move {
        sms_service.notify(&phone, &message).await;
    });

    Ok(Json(WalletChangeResponseDto {
        msg: "Money deducted successfully".to_string(),
        current_balance: mutation.user.wallet_balance_in_cedis(),
        previous_balance: pesewas_to_cedis(mutation.previous_balance),
        transaction: TransactionDto::filter_transaction(&mutation.transaction),
    })
    .into_response())
}

pub async fn toggle_user_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<String>,
    Json(body): Json<ToggleUserStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_user_id(&user_id)?;

    let (user, disabled) = app_state
        .db_client
        .toggle_user_status(user_id, body.disable_reason, auth.user.id)
        .await?;

    let message = if disabled {
        sms::account_disabled_message(
            user.disable_reason.as_deref().unwrap_or("Administrative action"),
        )
    } else {
        sms::account_enabled_message()
    };
    let sms_service = app_state.sms.clone();
    let phone = user.phone_number.clone();
    tokio::spawn(async move {
        sms_service.notify(&phone, &message).await;
    });

    Ok(Json(json!({
        "status": "success",
        "msg": if disabled { "User disabled successfully" } else { "User enabled successfully" },
        "user": FilterUserDto::filter_user(&user),
    })))
}

pub async fn get_user_orders(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = parse_user_id(&user_id)?;
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state
        .db_client
        .get_user(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(20);

    let (orders, total, total_spent) = app_state
        .db_client
        .get_user_orders(user_id, page, limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "orders": OrderDto::filter_orders(&orders),
        "results": total,
        "page": page,
        "totalPages": (total + limit as i64 - 1) / limit as i64,
        "totalSpent": pesewas_to_cedis(total_spent),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn wallet_mutations_are_put_routes() {
        let id = Uuid::new_v4();
        for path in [format!("/{id}/add-money"), format!("/{id}/deduct-money")] {
            let put_request = Request::builder()
                .method("PUT")
                .uri(&path)
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap();
            let response = users_handler().oneshot(put_request).await.unwrap();
            assert_ne!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

            let post_request = Request::builder()
                .method("POST")
                .uri(&path)
                .body(Body::empty())
                .unwrap();
            let response = users_handler().oneshot(post_request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[test]
    fn user_list_sorts_by_balance_by_default() {
        assert!(sorts_by_balance(None));
        assert!(sorts_by_balance(Some("balance")));
        assert!(!sorts_by_balance(Some("createdAt")));
    }
}
