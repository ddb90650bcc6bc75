// handler/inventory.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use serde_json::json;

use crate::{
    db::inventorydb::InventoryExt,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::inventorymodel::{DataInventory, StockChannel, NETWORKS},
    AppState,
};

pub fn inventory_handler() -> Router {
    Router::new()
        .route("/", get(get_inventory))
        .route("/:network", get(get_network_inventory))
        .route("/:network/toggle-web", put(toggle_web_stock))
        .route("/:network/toggle-api", put(toggle_api_stock))
        .route("/:network/toggle-geonettech-web", put(toggle_web_vendor))
        .route("/:network/toggle-geonettech-api", put(toggle_api_vendor))
        // Deprecated unified toggles, kept for old admin clients.
        .route("/:network/toggle", put(toggle_stock_unified))
        .route("/:network/toggle-geonettech", put(toggle_vendor_unified))
}

fn validate_network(network: &str) -> Result<(), HttpError> {
    if NETWORKS.contains(&network) {
        Ok(())
    } else {
        Err(HttpError::bad_request(format!(
            "Invalid network: {}. Valid networks: {}",
            network,
            NETWORKS.join(", ")
        )))
    }
}

fn toggle_response(msg: String, inventory: DataInventory) -> Json<serde_json::Value> {
    Json(json!({
        "status": "success",
        "msg": msg,
        "inventory": inventory,
    }))
}

pub async fn get_inventory(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let inventory = app_state
        .db_client
        .get_inventory()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "inventory": inventory,
    })))
}

pub async fn get_network_inventory(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(network): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    validate_network(&network)?;

    let inventory = app_state
        .db_client
        .get_network_inventory(&network)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .unwrap_or_else(|| DataInventory::defaults(&network));

    Ok(Json(json!({
        "status": "success",
        "inventory": inventory,
    })))
}

pub async fn toggle_web_stock(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(network): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    validate_network(&network)?;

    let inventory = app_state
        .db_client
        .toggle_stock(&network, StockChannel::Web, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let msg = format!(
        "{} is now {} on the web store",
        network,
        if inventory.web_in_stock { "in stock" } else { "out of stock" }
    );
    Ok(toggle_response(msg, inventory))
}

pub async fn toggle_api_stock(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(network): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    validate_network(&network)?;

    let inventory = app_state
        .db_client
        .toggle_stock(&network, StockChannel::Api, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let msg = format!(
        "{} is now {} on the API",
        network,
        if inventory.api_in_stock { "in stock" } else { "out of stock" }
    );
    Ok(toggle_response(msg, inventory))
}

pub async fn toggle_web_vendor(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(network): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    validate_network(&network)?;

    let inventory = app_state
        .db_client
        .toggle_vendor(&network, StockChannel::Web, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let msg = format!(
        "Vendor fulfillment for {} web orders is now {}",
        network,
        if inventory.web_skip_vendor { "skipped" } else { "active" }
    );
    Ok(toggle_response(msg, inventory))
}

pub async fn toggle_api_vendor(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(network): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    validate_network(&network)?;

    let inventory = app_state
        .db_client
        .toggle_vendor(&network, StockChannel::Api, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let msg = format!(
        "Vendor fulfillment for {} API orders is now {}",
        network,
        if inventory.api_skip_vendor { "skipped" } else { "active" }
    );
    Ok(toggle_response(msg, inventory))
}

pub async fn toggle_stock_unified(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(network): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    validate_network(&network)?;

    let inventory = app_state
        .db_client
        .toggle_stock_unified(&network, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let msg = format!(
        "{} is now {} on all channels",
        network,
        if inventory.in_stock { "in stock" } else { "out of stock" }
    );
    Ok(toggle_response(msg, inventory))
}

pub async fn toggle_vendor_unified(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(network): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    validate_network(&network)?;

    let inventory = app_state
        .db_client
        .toggle_vendor_unified(&network, auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let msg = format!(
        "Vendor fulfillment for {} is now {} on all channels",
        network,
        if inventory.skip_vendor { "skipped" } else { "active" }
    );
    Ok(toggle_response(msg, inventory))
}
