// models/inventorymodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Networks the storefront sells bundles for. Inventory rows are created
/// lazily, so listings report defaults for networks without a row yet.
pub const NETWORKS: [&str; 5] = ["YELLO", "TELECEL", "AT_PREMIUM", "airteltigo", "at"];

/// The two independent availability surfaces for the same network: the web
/// storefront and the reseller API.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StockChannel {
    Web,
    Api,
}

impl FromStr for StockChannel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(StockChannel::Web),
            "api" => Ok(StockChannel::Api),
            _ => Err(()),
        }
    }
}

/// Per-network availability flags. The `in_stock` / `skip_vendor` pair are the
/// deprecated unified fields kept for old clients; the channel toggles mirror
/// into them on the legacy endpoints only.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct DataInventory {
    pub network: String,
    pub web_in_stock: bool,
    pub api_in_stock: bool,
    pub web_skip_vendor: bool,
    pub api_skip_vendor: bool,
    pub in_stock: bool,
    pub skip_vendor: bool,
    pub web_last_updated_by: Option<Uuid>,
    pub web_last_updated_at: Option<DateTime<Utc>>,
    pub api_last_updated_by: Option<Uuid>,
    pub api_last_updated_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DataInventory {
    /// Row shape reported for networks that have never been toggled.
    pub fn defaults(network: &str) -> Self {
        DataInventory {
            network: network.to_string(),
            web_in_stock: true,
            api_in_stock: true,
            web_skip_vendor: false,
            api_skip_vendor: false,
            in_stock: true,
            skip_vendor: false,
            web_last_updated_by: None,
            web_last_updated_at: None,
            api_last_updated_by: None,
            api_last_updated_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_parses_from_path_segment() {
        assert_eq!("web".parse::<StockChannel>().unwrap(), StockChannel::Web);
        assert_eq!("api".parse::<StockChannel>().unwrap(), StockChannel::Api);
        assert!("sms".parse::<StockChannel>().is_err());
    }

    #[test]
    fn defaults_are_in_stock_with_vendor_enabled() {
        let inv = DataInventory::defaults("YELLO");
        assert!(inv.web_in_stock && inv.api_in_stock);
        assert!(!inv.web_skip_vendor && !inv.api_skip_vendor);
        assert!(inv.updated_at.is_none());
    }
}
