// models/ordermodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Waiting,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn to_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Waiting => "waiting",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "waiting" => Ok(OrderStatus::Waiting),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            _ => Err(()),
        }
    }
}

/// One customer data-bundle order, tracked through the status lifecycle.
/// `vendor_reference` is the upstream vendor's identifier and the primary
/// lookup key; the internal id is the fallback for admin tooling.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct DataPurchase {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Recipient of the bundle; may differ from the owning user's number.
    pub phone_number: String,
    pub network: String,
    pub capacity: f64,
    /// Price in pesewas.
    pub price: i64,
    pub status: OrderStatus,
    pub vendor_reference: Option<String>,
    pub processed_by: Option<Uuid>,
    /// One-time refund marker: set when the failed-transition refund fires,
    /// never cleared. Guards against refunding twice across
    /// failed -> reopened -> failed cycles.
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DataPurchase {
    pub fn price_in_cedis(&self) -> f64 {
        self.price as f64 / 100.0
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusHistory {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub previous_status: Option<OrderStatus>,
    pub changed_by: Option<Uuid>,
    pub bulk_update: bool,
    pub changed_at: DateTime<Utc>,
}

/// Whether moving `previous -> target` owes the customer a wallet refund.
/// Fires only on a transition into `failed` from a non-failed status, and only
/// if the order has never been refunded before.
pub fn refund_due(
    previous: OrderStatus,
    target: OrderStatus,
    refunded_at: Option<DateTime<Utc>>,
) -> bool {
    target == OrderStatus::Failed && previous != OrderStatus::Failed && refunded_at.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_status_values() {
        for s in [
            "pending",
            "waiting",
            "processing",
            "shipped",
            "delivered",
            "completed",
            "failed",
        ] {
            let status: OrderStatus = s.parse().unwrap();
            assert_eq!(status.to_str(), s);
        }
        assert!("cancelled".parse::<OrderStatus>().is_err());
        assert!("FAILED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn refund_fires_on_first_transition_to_failed() {
        assert!(refund_due(OrderStatus::Processing, OrderStatus::Failed, None));
        assert!(refund_due(OrderStatus::Pending, OrderStatus::Failed, None));
        assert!(refund_due(OrderStatus::Delivered, OrderStatus::Failed, None));
    }

    #[test]
    fn refund_skipped_when_already_failed() {
        assert!(!refund_due(OrderStatus::Failed, OrderStatus::Failed, None));
    }

    #[test]
    fn refund_skipped_for_non_failed_targets() {
        assert!(!refund_due(
            OrderStatus::Processing,
            OrderStatus::Completed,
            None
        ));
        assert!(!refund_due(OrderStatus::Failed, OrderStatus::Processing, None));
    }

    #[test]
    fn refund_fires_at_most_once_per_order() {
        // failed -> processing -> failed again must not refund a second time
        let first_refund_at = Some(chrono::Utc::now());
        assert!(!refund_due(
            OrderStatus::Processing,
            OrderStatus::Failed,
            first_refund_at
        ));
    }
}
