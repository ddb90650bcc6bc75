// dtos/orderdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::ordermodel::DataPurchase;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderStatusDto {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusUpdateDto {
    #[validate(length(min = 1, message = "orderIds array is required"))]
    pub order_ids: Vec<String>,
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub network: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
}

/// Order as exposed to admin clients; the vendor reference keeps its
/// historical wire name `geonetReference`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub user_id: String,
    pub phone_number: String,
    pub network: String,
    pub capacity: f64,
    /// Price in cedis.
    pub price: f64,
    pub status: String,
    pub geonet_reference: Option<String>,
    pub processed_by: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDto {
    pub fn filter_order(order: &DataPurchase) -> Self {
        OrderDto {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            phone_number: order.phone_number.clone(),
            network: order.network.clone(),
            capacity: order.capacity,
            price: order.price_in_cedis(),
            status: order.status.to_str().to_string(),
            geonet_reference: order.vendor_reference.clone(),
            processed_by: order.processed_by.map(|id| id.to_string()),
            refunded_at: order.refunded_at,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }

    pub fn filter_orders(orders: &[DataPurchase]) -> Vec<Self> {
        orders.iter().map(Self::filter_order).collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTransitionDto {
    pub id: String,
    pub geonet_reference: Option<String>,
    pub status: String,
    pub previous_status: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponseDto {
    pub success: bool,
    pub msg: String,
    pub order: OrderTransitionDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ordermodel::OrderStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_order() -> DataPurchase {
        DataPurchase {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            phone_number: "0241234567".to_string(),
            network: "YELLO".to_string(),
            capacity: 5.0,
            price: 1950,
            status: OrderStatus::Processing,
            vendor_reference: Some("GEO-12345".to_string()),
            processed_by: None,
            refunded_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn order_dto_reports_price_in_cedis() {
        let dto = OrderDto::filter_order(&sample_order());
        assert_eq!(dto.price, 19.50);
        assert_eq!(dto.status, "processing");
    }

    #[test]
    fn vendor_reference_keeps_its_wire_name() {
        let value = serde_json::to_value(OrderDto::filter_order(&sample_order())).unwrap();
        assert_eq!(value["geonetReference"], "GEO-12345");
        assert!(value.get("vendor_reference").is_none());
    }
}
