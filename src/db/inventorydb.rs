// db/inventorydb.rs
//
// Per-network availability flags. Rows are created lazily on first toggle;
// a network with no row reports defaults. A fresh row toggles FROM the
// default, so the first web stock toggle lands as out-of-stock on web while
// the other channel keeps its default.
use async_trait::async_trait;
use uuid::Uuid;

use crate::db::db::DBClient;
use crate::models::inventorymodel::{DataInventory, StockChannel, NETWORKS};

const COLUMNS: &str = "network, web_in_stock, api_in_stock, web_skip_vendor, api_skip_vendor, \
                       in_stock, skip_vendor, web_last_updated_by, web_last_updated_at, \
                       api_last_updated_by, api_last_updated_at, updated_at";

#[async_trait]
pub trait InventoryExt {
    /// One row per known network, defaults filled in for networks never
    /// toggled.
    async fn get_inventory(&self) -> Result<Vec<DataInventory>, sqlx::Error>;

    async fn get_network_inventory(
        &self,
        network: &str,
    ) -> Result<Option<DataInventory>, sqlx::Error>;

    async fn toggle_stock(
        &self,
        network: &str,
        channel: StockChannel,
        admin_id: Uuid,
    ) -> Result<DataInventory, sqlx::Error>;

    async fn toggle_vendor(
        &self,
        network: &str,
        channel: StockChannel,
        admin_id: Uuid,
    ) -> Result<DataInventory, sqlx::Error>;

    /// Deprecated unified toggle: flips both channels and the legacy
    /// `in_stock` field together.
    async fn toggle_stock_unified(
        &self,
        network: &str,
        admin_id: Uuid,
    ) -> Result<DataInventory, sqlx::Error>;

    /// Deprecated unified toggle for vendor routing.
    async fn toggle_vendor_unified(
        &self,
        network: &str,
        admin_id: Uuid,
    ) -> Result<DataInventory, sqlx::Error>;
}

#[async_trait]
impl InventoryExt for DBClient {
    async fn get_inventory(&self) -> Result<Vec<DataInventory>, sqlx::Error> {
        let rows = sqlx::query_as::<_, DataInventory>(&format!(
            "SELECT {COLUMNS} FROM data_inventory ORDER BY network"
        ))
        .fetch_all(&self.pool)
        .await?;

        let inventory = NETWORKS
            .iter()
            .map(|network| {
                rows.iter()
                    .find(|row| row.network == *network)
                    .cloned()
                    .unwrap_or_else(|| DataInventory::defaults(network))
            })
            .collect();

        Ok(inventory)
    }

    async fn get_network_inventory(
        &self,
        network: &str,
    ) -> Result<Option<DataInventory>, sqlx::Error> {
        sqlx::query_as::<_, DataInventory>(&format!(
            "SELECT {COLUMNS} FROM data_inventory WHERE network = $1"
        ))
        .bind(network)
        .fetch_optional(&self.pool)
        .await
    }

    async fn toggle_stock(
        &self,
        network: &str,
        channel: StockChannel,
        admin_id: Uuid,
    ) -> Result<DataInventory, sqlx::Error> {
        let sql = match channel {
            // A missing row mirrors the first web toggle into the legacy
            // in_stock field; the api variant leaves it at its default.
            StockChannel::Web => format!(
                r#"INSERT INTO data_inventory
                       (network, web_in_stock, api_in_stock, web_skip_vendor, api_skip_vendor,
                        in_stock, skip_vendor, web_last_updated_by, web_last_updated_at, updated_at)
                   VALUES ($1, FALSE, TRUE, FALSE, FALSE, FALSE, FALSE, $2, NOW(), NOW())
                   ON CONFLICT (network) DO UPDATE SET
                       web_in_stock = NOT data_inventory.web_in_stock,
                       web_last_updated_by = $2,
                       web_last_updated_at = NOW(),
                       updated_at = NOW()
                   RETURNING {COLUMNS}"#
            ),
            StockChannel::Api => format!(
                r#"INSERT INTO data_inventory
                       (network, web_in_stock, api_in_stock, web_skip_vendor, api_skip_vendor,
                        in_stock, skip_vendor, api_last_updated_by, api_last_updated_at, updated_at)
                   VALUES ($1, TRUE, FALSE, FALSE, FALSE, TRUE, FALSE, $2, NOW(), NOW())
                   ON CONFLICT (network) DO UPDATE SET
                       api_in_stock = NOT data_inventory.api_in_stock,
                       api_last_updated_by = $2,
                       api_last_updated_at = NOW(),
                       updated_at = NOW()
                   RETURNING {COLUMNS}"#
            ),
        };

        sqlx::query_as::<_, DataInventory>(&sql)
            .bind(network)
            .bind(admin_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn toggle_vendor(
        &self,
        network: &str,
        channel: StockChannel,
        admin_id: Uuid,
    ) -> Result<DataInventory, sqlx::Error> {
        let sql = match channel {
            StockChannel::Web => format!(
                r#"INSERT INTO data_inventory
                       (network, web_in_stock, api_in_stock, web_skip_vendor, api_skip_vendor,
                        in_stock, skip_vendor, web_last_updated_by, web_last_updated_at, updated_at)
                   VALUES ($1, TRUE, TRUE, TRUE, FALSE, TRUE, TRUE, $2, NOW(), NOW())
                   ON CONFLICT (network) DO UPDATE SET
                       web_skip_vendor = NOT data_inventory.web_skip_vendor,
                       web_last_updated_by = $2,
                       web_last_updated_at = NOW(),
                       updated_at = NOW()
                   RETURNING {COLUMNS}"#
            ),
            StockChannel::Api => format!(
                r#"INSERT INTO data_inventory
                       (network, web_in_stock, api_in_stock, web_skip_vendor, api_skip_vendor,
                        in_stock, skip_vendor, api_last_updated_by, api_last_updated_at, updated_at)
                   VALUES ($1, TRUE, TRUE, FALSE, TRUE, TRUE, FALSE, $2, NOW(), NOW())
                   ON CONFLICT (network) DO UPDATE SET
                       api_skip_vendor = NOT data_inventory.api_skip_vendor,
                       api_last_updated_by = $2,
                       api_last_updated_at = NOW(),
                       updated_at = NOW()
                   RETURNING {COLUMNS}"#
            ),
        };

        sqlx::query_as::<_, DataInventory>(&sql)
            .bind(network)
            .bind(admin_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn toggle_stock_unified(
        &self,
        network: &str,
        admin_id: Uuid,
    ) -> Result<DataInventory, sqlx::Error> {
        sqlx::query_as::<_, DataInventory>(&format!(
            r#"INSERT INTO data_inventory
                   (network, web_in_stock, api_in_stock, web_skip_vendor, api_skip_vendor,
                    in_stock, skip_vendor, web_last_updated_by, web_last_updated_at,
                    api_last_updated_by, api_last_updated_at, updated_at)
               VALUES ($1, FALSE, FALSE, FALSE, FALSE, FALSE, FALSE, $2, NOW(), $2, NOW(), NOW())
               ON CONFLICT (network) DO UPDATE SET
                   in_stock = NOT data_inventory.in_stock,
                   web_in_stock = NOT data_inventory.in_stock,
                   api_in_stock = NOT data_inventory.in_stock,
                   web_last_updated_by = $2,
                   web_last_updated_at = NOW(),
                   api_last_updated_by = $2,
                   api_last_updated_at = NOW(),
                   updated_at = NOW()
               RETURNING {COLUMNS}"#
        ))
        .bind(network)
        .bind(admin_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn toggle_vendor_unified(
        &self,
        network: &str,
        admin_id: Uuid,
    ) -> Result<DataInventory, sqlx::Error> {
        sqlx::query_as::<_, DataInventory>(&format!(
            r#"INSERT INTO data_inventory
                   (network, web_in_stock, api_in_stock, web_skip_vendor, api_skip_vendor,
                    in_stock, skip_vendor, web_last_updated_by, web_last_updated_at,
                    api_last_updated_by, api_last_updated_at, updated_at)
               VALUES ($1, TRUE, TRUE, TRUE, TRUE, TRUE, TRUE, $2, NOW(), $2, NOW(), NOW())
               ON CONFLICT (network) DO UPDATE SET
                   skip_vendor = NOT data_inventory.skip_vendor,
                   web_skip_vendor = NOT data_inventory.skip_vendor,
                   api_skip_vendor = NOT data_inventory.skip_vendor,
                   web_last_updated_by = $2,
                   web_last_updated_at = NOW(),
                   api_last_updated_by = $2,
                   api_last_updated_at = NOW(),
                   updated_at = NOW()
               RETURNING {COLUMNS}"#
        ))
        .bind(network)
        .bind(admin_id)
        .fetch_one(&self.pool)
        .await
    }
}
